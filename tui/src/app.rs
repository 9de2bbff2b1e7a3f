//! Main Application
//!
//! The App owns the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize) driven by `tokio::select!`
//! - ChatController for session orchestration
//! - DisplayState for rendering
//!
//! Every pass of the loop drains pending stream events through the
//! controller, applies the resulting updates to display state, and redraws.
//! That single sequential loop is what guarantees each re-render completes
//! before the next chunk's events are processed.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;

use shellway_core::{
    ChatController, ClientConfig, HttpApiClient, SessionUpdate, SettingsView,
};

use crate::display::{DisplayRole, DisplayState};
use crate::render;
use crate::theme;

/// Input box height (lines)
const INPUT_HEIGHT: u16 = 4;

/// Settings overlay state
#[derive(Default)]
struct SettingsPanel {
    open: bool,
    view: Option<SettingsView>,
    input: String,
    note: Option<String>,
}

/// Main application state
pub struct App {
    /// Is the app still running?
    running: bool,
    /// Session orchestration
    controller: ChatController<HttpApiClient>,
    /// Updates from the controller
    updates: mpsc::Receiver<SessionUpdate>,
    /// Display state derived from updates
    display: DisplayState,
    /// User input buffer
    input_buffer: String,
    /// Scroll offset (lines from bottom, 0 = latest)
    scroll_offset: usize,
    /// Total rendered conversation lines (for scroll bounds)
    total_lines: usize,
    /// Settings overlay
    settings: SettingsPanel,
    /// Terminal size
    size: (u16, u16),
}

impl App {
    /// Create a new App instance
    pub fn new() -> anyhow::Result<Self> {
        let size = crossterm::terminal::size()?;
        let config = ClientConfig::from_env();
        tracing::info!(server = %config.server_url, "starting shellway client");

        let (tx, rx) = mpsc::channel(100);
        let controller = ChatController::new(HttpApiClient::new(&config), tx);

        Ok(Self {
            running: true,
            controller,
            updates: rx,
            display: DisplayState::new(),
            input_buffer: String::new(),
            scroll_offset: 0,
            total_lines: 0,
            settings: SettingsPanel::default(),
            size,
        })
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();

        // Render initial frame immediately so the user sees the UI.
        self.render(terminal)?;

        while self.running {
            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        match event {
                            // Only handle Press events (not Release or Repeat)
                            Event::Key(key) if key.kind == KeyEventKind::Press => {
                                self.handle_key(key).await;
                            }
                            Event::Resize(w, h) => self.size = (w, h),
                            _ => {}
                        }
                    }
                }

                // Frame tick - keeps streaming updates flowing even when
                // the keyboard is silent.
                () = tokio::time::sleep(Duration::from_millis(50)) => {}
            }

            // Drain pending stream events, then apply resulting updates.
            self.controller.poll_streaming().await;
            while let Ok(update) = self.updates.try_recv() {
                self.display.apply_update(update);
            }

            self.render(terminal)?;
        }

        Ok(())
    }

    /// Handle keyboard input
    async fn handle_key(&mut self, key: KeyEvent) {
        if self.settings.open {
            self.handle_settings_key(key).await;
            return;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }
            KeyCode::Esc => {
                if self.display.busy {
                    // The stop affordance: ask the server to stop, revert
                    // the send control immediately.
                    self.controller.interrupt().await;
                } else {
                    self.running = false;
                }
            }
            KeyCode::Enter => self.submit_input().await,
            KeyCode::F(2) => self.open_settings().await,
            KeyCode::PageUp => {
                let page = (self.conversation_height() / 2).max(1);
                let max_scroll = self.total_lines.saturating_sub(1);
                self.scroll_offset = (self.scroll_offset + page).min(max_scroll);
            }
            KeyCode::PageDown => {
                let page = (self.conversation_height() / 2).max(1);
                self.scroll_offset = self.scroll_offset.saturating_sub(page);
            }
            KeyCode::Char(c) => self.input_buffer.push(c),
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            _ => {}
        }
    }

    /// Submit the input line: a command, or a user turn
    async fn submit_input(&mut self) {
        let text = self.input_buffer.trim().to_string();
        if text.is_empty() {
            return;
        }

        if let Some(path) = text.strip_prefix("/attach ") {
            self.controller.stage_attachment(PathBuf::from(path.trim()));
            self.display.status_note = Some(format!(
                "{} attachment(s) staged for the next message",
                self.controller.staged_attachments()
            ));
            self.input_buffer.clear();
            return;
        }
        if text == "/new" {
            self.controller.start_new_conversation();
            self.display.conversation_id = None;
            self.display.status_note = Some("next message starts a new conversation".to_string());
            self.input_buffer.clear();
            return;
        }
        if text == "/delete" {
            match self.controller.delete_conversation().await {
                Ok(()) => {
                    self.display.conversation_id = None;
                    self.display.messages.clear();
                    self.display.status_note = Some("conversation deleted".to_string());
                }
                Err(err) => {
                    tracing::warn!(error = %err, "conversation delete failed");
                    self.display.status_note = Some("delete failed".to_string());
                }
            }
            self.input_buffer.clear();
            return;
        }

        if self.display.busy {
            self.display.status_note = Some("still replying - Esc to stop".to_string());
            return;
        }
        if self.controller.submit(&text).await {
            self.input_buffer.clear();
            self.scroll_offset = 0;
        }
    }

    /// Open the settings overlay, loading current values
    async fn open_settings(&mut self) {
        self.settings.open = true;
        self.settings.note = None;
        match self.controller.fetch_settings().await {
            Ok(view) => self.settings.view = Some(view),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load settings");
                self.settings.note = Some("failed to load settings".to_string());
            }
        }
    }

    /// Keyboard handling while the settings overlay is open
    async fn handle_settings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.settings.open = false,
            KeyCode::Enter => {
                let api_key = self.settings.input.trim().to_string();
                if api_key.is_empty() {
                    self.settings.note = Some("enter a key, or Esc to close".to_string());
                    return;
                }
                match self.controller.update_settings(api_key).await {
                    Ok(()) => {
                        self.settings.note = Some("saved".to_string());
                        self.settings.input.clear();
                        if let Some(view) = self.settings.view.as_mut() {
                            view.api_key_set = true;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to save settings");
                        self.settings.note = Some("save failed".to_string());
                    }
                }
            }
            KeyCode::Char(c) => self.settings.input.push(c),
            KeyCode::Backspace => {
                self.settings.input.pop();
            }
            _ => {}
        }
    }

    fn conversation_height(&self) -> usize {
        self.size
            .1
            .saturating_sub(INPUT_HEIGHT + 1)
            .max(1) as usize
    }

    /// Render the UI
    fn render(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        terminal.draw(|frame| {
            let [conversation_area, input_area, status_area] = Layout::vertical([
                Constraint::Min(3),
                Constraint::Length(INPUT_HEIGHT),
                Constraint::Length(1),
            ])
            .areas(frame.area());

            self.render_conversation(frame, conversation_area);
            self.render_input(frame, input_area);
            self.render_status(frame, status_area);
            if self.settings.open {
                self.render_settings(frame);
            }
        })?;
        Ok(())
    }

    /// Render the conversation, bottom-anchored with scrollback
    fn render_conversation(&mut self, frame: &mut Frame, area: Rect) {
        if area.width < 10 || area.height < 3 {
            return;
        }
        let width = area.width.saturating_sub(1);

        let mut lines: Vec<Line<'static>> = Vec::new();
        for msg in &self.display.messages {
            match msg.role {
                DisplayRole::User => {
                    lines.push(Line::from(Span::styled(
                        msg.role.header(),
                        Style::default()
                            .fg(theme::USER_GREEN)
                            .add_modifier(Modifier::BOLD),
                    )));
                    for wrapped in textwrap::wrap(&msg.content, width as usize) {
                        lines.push(Line::from(Span::styled(
                            wrapped.to_string(),
                            Style::default().fg(theme::USER_GREEN),
                        )));
                    }
                }
                DisplayRole::Assistant => {
                    lines.push(Line::from(Span::styled(
                        msg.role.header(),
                        Style::default()
                            .fg(theme::ASSISTANT_CYAN)
                            .add_modifier(Modifier::BOLD),
                    )));
                    render::render_message(&msg.content, width, &mut lines);
                    if msg.streaming {
                        lines.push(Line::from(Span::styled(
                            "▌",
                            Style::default().fg(theme::ASSISTANT_CYAN),
                        )));
                    }
                }
            }
            lines.push(Line::default());
        }

        self.total_lines = lines.len();
        let height = area.height as usize;
        let max_scroll = self.total_lines.saturating_sub(height);
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }
        let top = self
            .total_lines
            .saturating_sub(height + self.scroll_offset);

        let paragraph = Paragraph::new(Text::from(lines)).scroll((top as u16, 0));
        frame.render_widget(paragraph, area);
    }

    /// Render the input box
    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let title = if self.controller.staged_attachments() > 0 {
            format!("Message ({} attached)", self.controller.staged_attachments())
        } else {
            "Message".to_string()
        };
        let input = Paragraph::new(format!("{}_", self.input_buffer))
            .style(Style::default().fg(theme::USER_GREEN))
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title(title));
        frame.render_widget(input, area);
    }

    /// Render the status bar
    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let mut parts: Vec<String> = Vec::new();
        if self.display.busy {
            parts.push("streaming… Esc to stop".to_string());
        } else {
            parts.push("Enter send | Esc quit | F2 settings | PgUp/PgDn scroll".to_string());
        }
        if let Some(id) = &self.display.conversation_id {
            parts.push(format!("conversation {id}"));
        }
        if self.scroll_offset > 0 {
            parts.push(format!("^{} lines", self.scroll_offset));
        }
        if let Some(note) = &self.display.status_note {
            parts.push(note.clone());
        }

        let style = if self.display.busy {
            Style::default().fg(theme::ASSISTANT_CYAN)
        } else {
            Style::default().fg(theme::DIM_GRAY)
        };
        let status = Paragraph::new(format!(" {}", parts.join("  ·  "))).style(style);
        frame.render_widget(status, area);
    }

    /// Render the settings overlay
    fn render_settings(&self, frame: &mut Frame) {
        let area = centered_rect(frame.area(), 56, 8);
        frame.render_widget(Clear, area);

        let key_state = match &self.settings.view {
            Some(view) if view.api_key_set => {
                format!("API key: set ({})", view.api_key_masked)
            }
            Some(_) => "API key: not set".to_string(),
            None => "API key: unknown".to_string(),
        };

        let mut lines = vec![
            Line::from(key_state),
            Line::from(format!("New key: {}_", self.settings.input)),
            Line::default(),
            Line::from(Span::styled(
                "Enter save · Esc close",
                Style::default().fg(theme::DIM_GRAY),
            )),
        ];
        if let Some(note) = &self.settings.note {
            lines.insert(2, Line::from(Span::styled(
                note.clone(),
                Style::default().fg(theme::ERROR_RED),
            )));
        }

        let panel = Paragraph::new(Text::from(lines)).block(Block::bordered().title("Settings"));
        frame.render_widget(panel, area);
    }
}

/// A centered rectangle of at most `width` x `height` inside `area`
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}
