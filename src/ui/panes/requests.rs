//! Request list pane rendering
//!
//! Shows the request script in input order. The request that produced the
//! current allocator state is marked with an arrow; requests not yet applied
//! are dimmed. The view follows the current request as the user steps.

use super::utils::{clamp_scroll, follow_row, pane_block, visible_height};
use crate::request::Request;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

/// Render the request list pane
pub fn render_requests_pane(
    frame: &mut Frame,
    area: Rect,
    requests: &[Request],
    current: Option<usize>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(" Requests ", is_focused);

    if requests.is_empty() {
        let paragraph = Paragraph::new("(no requests)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let number_width = requests.len().to_string().len();
    let visible = visible_height(area);

    if let Some(row) = current {
        if !is_focused {
            follow_row(scroll_offset, row, visible);
        }
    }
    clamp_scroll(scroll_offset, requests.len(), visible);

    let items: Vec<ListItem> = requests
        .iter()
        .enumerate()
        .skip(*scroll_offset)
        .take(visible)
        .map(|(index, request)| {
            let is_current = Some(index) == current;
            let applied = current.is_some_and(|c| index <= c);

            let marker = if is_current { "▶ " } else { "  " };
            let number_style = Style::default().fg(DEFAULT_THEME.comment);
            let request_style = match (applied, request) {
                (false, _) => Style::default().fg(DEFAULT_THEME.comment),
                (true, Request::Allocate { .. }) => Style::default().fg(DEFAULT_THEME.occupied),
                (true, Request::Free { .. }) => Style::default().fg(DEFAULT_THEME.free),
            };

            let line = Line::from(vec![
                Span::styled(marker, Style::default().fg(DEFAULT_THEME.candidate)),
                Span::styled(
                    format!("{:>width$} ", index + 1, width = number_width),
                    number_style,
                ),
                Span::styled(request.to_string(), request_style),
            ]);

            let item = ListItem::new(line);
            if is_current {
                item.style(
                    Style::default()
                        .bg(DEFAULT_THEME.current_line_bg)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                item
            }
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
