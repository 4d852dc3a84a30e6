//! Shared helpers for pane rendering

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders},
};

/// Bordered block whose border highlights when focused
pub fn pane_block(title: &str, is_focused: bool) -> Block<'_> {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Rows available inside a bordered pane (min 1)
pub fn visible_height(area: Rect) -> usize {
    area.height.saturating_sub(2).max(1) as usize
}

/// Clamp a scroll offset so the last page stays full
pub fn clamp_scroll(scroll_offset: &mut usize, total_items: usize, visible: usize) {
    if total_items > visible {
        *scroll_offset = (*scroll_offset).min(total_items - visible);
    } else {
        *scroll_offset = 0;
    }
}

/// Scroll just enough to keep `row` on screen
pub fn follow_row(scroll_offset: &mut usize, row: usize, visible: usize) {
    if row < *scroll_offset {
        *scroll_offset = row;
    } else if row >= *scroll_offset + visible {
        *scroll_offset = row + 1 - visible;
    }
}
