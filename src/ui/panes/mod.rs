//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`requests`]: Request script with the current request highlighted
//! - [`partitions`]: Address-ordered heap layout with a proportional bar
//! - [`free_index`]: Free partitions in worst-fit selection order
//! - [`status`]: Status bar with keybindings and simulation state
//! - `utils`: Shared border and scroll helpers
//!
//! Each pane module exports a `render_*` function taking the frame, its area,
//! the data to draw, whether the pane has focus, and its scroll offset.

mod utils;

pub mod free_index;
pub mod partitions;
pub mod requests;
pub mod status;

pub use free_index::render_free_index_pane;
pub use partitions::render_partitions_pane;
pub use requests::render_requests_pane;
pub use status::{render_status_bar, StatusRenderData};
