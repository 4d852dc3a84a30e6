//! Partition layout pane rendering
//!
//! This module renders the heap as the allocator sees it: every partition in
//! address order, free or tagged, plus a one-line bar showing how the address
//! space is split between occupied and free bytes.
//!
//! # Features
//!
//! - Proportional occupancy bar across the full heap
//! - Address, size and owner of each partition
//! - Partitions owned by the current request's tag are emphasized
//! - The next worst-fit candidate is marked

use super::utils::{clamp_scroll, pane_block, visible_height};
use crate::allocator::{Allocator, Tag};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Render the partition layout pane
pub fn render_partitions_pane(
    frame: &mut Frame,
    area: Rect,
    allocator: &Allocator,
    focus_tag: Option<Tag>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let title = format!(
        " Partitions ({} bytes, {} pages) ",
        allocator.total_heap_size(),
        allocator.total_heap_size() / allocator.page_size()
    );
    let block = pane_block(&title, is_focused);

    let content_width = area.width.saturating_sub(2) as usize; // borders
    let mut all_items = Vec::new();

    // Occupancy bar
    let bar: Vec<Span> = occupancy_cells(allocator, content_width)
        .into_iter()
        .map(|free| {
            if free {
                Span::styled("░", Style::default().fg(DEFAULT_THEME.free))
            } else {
                Span::styled("█", Style::default().fg(DEFAULT_THEME.occupied))
            }
        })
        .collect();
    all_items.push(ListItem::new(Line::from(bar)));

    let candidate = allocator.free_partitions().next().map(|(id, _)| id);
    let address_width = format!("{:x}", allocator.total_heap_size()).len().max(8);

    for (id, partition) in allocator.partitions() {
        let owner = match partition.tag {
            Some(tag) => Span::styled(
                format!("tag {}", tag),
                Style::default().fg(DEFAULT_THEME.occupied),
            ),
            None => Span::styled("free", Style::default().fg(DEFAULT_THEME.free)),
        };

        let mut spans = vec![
            Span::styled(
                format!("#{:<4}", id.index()),
                Style::default().fg(DEFAULT_THEME.secondary),
            ),
            Span::styled(
                format!("0x{:0width$x}", partition.address, width = address_width),
                Style::default().fg(DEFAULT_THEME.comment),
            ),
            Span::raw(" | "),
            Span::styled(
                format!("{:>8} bytes", partition.size),
                Style::default().fg(DEFAULT_THEME.primary),
            ),
            Span::raw(" | "),
            owner,
        ];

        if Some(id) == candidate {
            spans.push(Span::styled(
                "  ◆ next fit",
                Style::default().fg(DEFAULT_THEME.candidate),
            ));
        }

        let item = ListItem::new(Line::from(spans));
        let highlighted = focus_tag.is_some() && partition.tag == focus_tag;
        all_items.push(if highlighted {
            item.style(
                Style::default()
                    .bg(DEFAULT_THEME.current_line_bg)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            item
        });
    }

    let visible = visible_height(area);
    clamp_scroll(scroll_offset, all_items.len(), visible);

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

/// Split the heap into `width` equal cells; `true` where the cell's first
/// byte is free. An empty heap yields no cells.
pub fn occupancy_cells(allocator: &Allocator, width: usize) -> Vec<bool> {
    let total = allocator.total_heap_size();
    if total == 0 || width == 0 {
        return Vec::new();
    }

    let mut partitions = allocator.partitions().map(|(_, p)| p).peekable();
    let mut cells = Vec::with_capacity(width);

    for column in 0..width as u64 {
        let address = (column as u128 * total as u128 / width as u128) as u64;
        while let Some(partition) = partitions.peek() {
            if partition.end() > address {
                break;
            }
            partitions.next();
        }
        cells.push(partitions.peek().is_some_and(|p| p.is_free()));
    }

    cells
}
