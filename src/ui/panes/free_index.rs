//! Free index pane rendering
//!
//! Lists free partitions in the order worst-fit selection visits them:
//! largest first, lowest address on ties. The head of the list is the
//! partition the next allocation will split (or find too small and grow past).

use super::utils::{clamp_scroll, pane_block, visible_height};
use crate::allocator::Allocator;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Render the free index pane
pub fn render_free_index_pane(
    frame: &mut Frame,
    area: Rect,
    allocator: &Allocator,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let title = format!(" Free Index ({}) ", allocator.free_count());
    let block = pane_block(&title, is_focused);

    let all_items: Vec<ListItem> = allocator
        .free_partitions()
        .enumerate()
        .map(|(rank, (_, partition))| {
            let rank_style = if rank == 0 {
                Style::default()
                    .fg(DEFAULT_THEME.candidate)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("#{:<3}", rank + 1), rank_style),
                Span::styled(
                    format!("{:>8} bytes", partition.size),
                    Style::default().fg(DEFAULT_THEME.free),
                ),
                Span::styled(" @ ", Style::default().fg(DEFAULT_THEME.comment)),
                Span::styled(
                    format!("0x{:08x}", partition.address),
                    Style::default().fg(DEFAULT_THEME.fg),
                ),
            ]))
        })
        .collect();

    let visible = visible_height(area);
    clamp_scroll(scroll_offset, all_items.len(), visible);

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
