//! Main TUI application state and logic

use crate::engine::Simulation;
use crate::errors::SimError;
use crate::request::Request;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Requests,
    Partitions,
    FreeIndex,
}

impl FocusedPane {
    /// Move focus to the next pane (requests -> partitions -> free index)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Requests => FocusedPane::Partitions,
            FocusedPane::Partitions => FocusedPane::FreeIndex,
            FocusedPane::FreeIndex => FocusedPane::Requests,
        }
    }

    /// Move focus to the previous pane
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Requests => FocusedPane::FreeIndex,
            FocusedPane::Partitions => FocusedPane::Requests,
            FocusedPane::FreeIndex => FocusedPane::Partitions,
        }
    }
}

/// The main application state
pub struct App {
    /// The replayed simulation
    pub simulation: Simulation,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub requests_scroll: usize,
    pub partitions_scroll: usize,
    pub free_index_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Instant,
}

impl App {
    /// Create a new app over a simulation that has already run
    pub fn new(simulation: Simulation) -> Self {
        App {
            simulation,
            focused_pane: FocusedPane::Requests,
            requests_scroll: 0,
            partitions_scroll: 0,
            free_index_scroll: 0,
            should_quit: false,
            status_message: String::from("Ready!"),
            is_playing: false,
            last_play_time: Instant::now(),
            last_space_press: Instant::now()
                .checked_sub(Duration::from_secs(1))
                .unwrap_or(Instant::now()),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            // Handle auto-play mode
            if self.is_playing && self.last_play_time.elapsed() >= Duration::from_millis(500) {
                if self.simulation.step_forward().is_ok() {
                    self.status_message = "Playing...".to_string();
                } else {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                }
                self.last_play_time = Instant::now();
            }

            // Use poll with timeout to allow auto-play to work
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Panes on top, status bar at bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(main_chunks[0]);

        // Right column: Partitions (top) | Free Index (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(columns[1]);

        let current_request = self.simulation.current_request_index();
        let focus_tag = self.simulation.current_request().map(Request::tag);
        let allocator = self.simulation.allocator();

        super::panes::render_requests_pane(
            frame,
            columns[0],
            self.simulation.requests(),
            current_request,
            self.focused_pane == FocusedPane::Requests,
            &mut self.requests_scroll,
        );

        super::panes::render_partitions_pane(
            frame,
            right_rows[0],
            allocator,
            focus_tag,
            self.focused_pane == FocusedPane::Partitions,
            &mut self.partitions_scroll,
        );

        super::panes::render_free_index_pane(
            frame,
            right_rows[1],
            allocator,
            self.focused_pane == FocusedPane::FreeIndex,
            &mut self.free_index_scroll,
        );

        super::panes::render_status_bar(
            frame,
            main_chunks[1],
            super::panes::StatusRenderData {
                message: &self.status_message,
                current_step: self.simulation.history_position(),
                total_steps: self.simulation.total_snapshots(),
                stats: allocator.stats(),
                is_playing: self.is_playing,
            },
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            // Number keys step forward N times directly
            KeyCode::Char(c @ '1'..='9') => {
                self.is_playing = false;
                let n = c.to_digit(10).unwrap_or(1) as usize;
                let mut stepped = 0;
                for _ in 0..n {
                    if self.simulation.step_forward().is_ok() {
                        stepped += 1;
                    } else {
                        break;
                    }
                }
                self.status_message = format!("Stepped forward {} step(s)", stepped);
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Left => {
                self.is_playing = false;
                let result = self.simulation.step_backward();
                self.report_step(result, "Stepped backward", "Cannot step backward");
            }
            KeyCode::Right => {
                self.is_playing = false;
                let result = self.simulation.step_forward();
                self.report_step(result, "Stepped forward", "Cannot step forward");
            }
            KeyCode::Up => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_add(1);
            }
            KeyCode::Char(' ') => {
                // Toggle auto-play mode (with 200ms debounce to prevent key repeat spam)
                if self.last_space_press.elapsed() >= Duration::from_millis(200) {
                    self.last_space_press = Instant::now();
                    self.is_playing = !self.is_playing;
                    if self.is_playing {
                        self.last_play_time = Instant::now()
                            .checked_sub(Duration::from_secs(1))
                            .unwrap_or(Instant::now());
                        self.status_message = "Playing...".to_string();
                    } else {
                        self.status_message = "Paused".to_string();
                    }
                }
            }
            KeyCode::Enter => {
                self.is_playing = false;
                let result = self.simulation.jump_to_end();
                self.report_step(result, "Jumped to end", "Cannot jump to end");
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                let result = self.simulation.rewind_to_start();
                self.report_step(result, "Jumped to start", "Cannot jump to start");
            }
            _ => {}
        }
    }

    fn focused_scroll(&mut self) -> &mut usize {
        match self.focused_pane {
            FocusedPane::Requests => &mut self.requests_scroll,
            FocusedPane::Partitions => &mut self.partitions_scroll,
            FocusedPane::FreeIndex => &mut self.free_index_scroll,
        }
    }

    fn report_step(&mut self, result: Result<(), SimError>, done: &str, failed: &str) {
        self.status_message = match result {
            Ok(()) => done.to_string(),
            Err(SimError::History { message }) => format!("{}: {}", failed, message),
            Err(e) => format!("Error: {}", e),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn app() -> App {
        let requests = vec![
            Request::Allocate { tag: 1, size: 50 },
            Request::Allocate { tag: 2, size: 10 },
            Request::Free { tag: 1 },
        ];
        let mut simulation = Simulation::new(100, requests, 1024 * 1024).unwrap();
        simulation.run().unwrap();
        simulation.rewind_to_start().unwrap();
        App::new(simulation)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_focus_cycles() {
        let pane = FocusedPane::Requests;
        assert_eq!(pane.next().next().next(), pane);
        assert_eq!(pane.next().prev(), pane);
    }

    #[test]
    fn test_arrow_keys_step_history() {
        let mut app = app();
        press(&mut app, KeyCode::Right);
        assert_eq!(app.simulation.history_position(), 1);
        assert_eq!(app.status_message, "Stepped forward");

        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.simulation.history_position(), 0);
        assert!(app.status_message.starts_with("Cannot step backward"));
    }

    #[test]
    fn test_number_and_jump_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('9'));
        assert_eq!(app.simulation.history_position(), 3);
        assert_eq!(app.status_message, "Stepped forward 3 step(s)");

        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.simulation.history_position(), 0);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.simulation.history_position(), 3);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_scroll_follows_focus() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.partitions_scroll, 1);
        assert_eq!(app.requests_scroll, 0);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.partitions_scroll, 0);
    }

    #[test]
    fn test_render_lists_partition_slots() {
        let mut app = app();
        app.simulation.jump_to_end().unwrap();

        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(140, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();

        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        // Sentinel slot 0 became tag 1 and is free again; tag 2 took slot 2
        assert!(screen.contains("#0"));
        assert!(screen.contains("#2"));
        assert!(screen.contains("tag 2"));
    }
}
