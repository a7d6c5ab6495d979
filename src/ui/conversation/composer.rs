use crate::ui::conversation::commands::{command_entries, parse_slash_command, CommandEntry, SlashCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use std::cell::{Cell, RefCell};

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ConversationResult {
    /// Trimmed, non-empty message text
    Submitted(String),
    Command(SlashCommand),
    None,
}

/// State for the text area within the composer
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    /// Byte offset into `content`, always on a char boundary
    pub cursor_position: usize,
}

/// Conversation composer for user input
#[derive(Clone)]
pub struct ConversationComposer {
    state: RefCell<TextAreaState>,
    placeholder: String,
    has_focus: bool,
    /// Set while a response is streaming; all input is refused
    disabled: bool,
    command_entries: Vec<CommandEntry>,
    filtered_commands: RefCell<Vec<CommandEntry>>,
    show_command_palette: Cell<bool>,
    selected_command: Cell<Option<usize>>,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            state: RefCell::new(TextAreaState::default()),
            placeholder: placeholder.into(),
            has_focus: false,
            disabled: false,
            command_entries: command_entries(),
            filtered_commands: RefCell::new(Vec::new()),
            show_command_palette: Cell::new(false),
            selected_command: Cell::new(None),
        }
    }

    /// Handle key input
    pub fn handle_key(&self, key: KeyEvent) -> ConversationResult {
        if key.kind != KeyEventKind::Press || self.disabled {
            return ConversationResult::None;
        }

        let mut state = self.state.borrow_mut();

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.insert_char(&mut state, '\n');
                } else if self.show_command_palette.get() && self.apply_selected_command(&mut state) {
                    return ConversationResult::None;
                } else {
                    let content = state.content.trim().to_string();
                    if content.is_empty() {
                        return ConversationResult::None;
                    }
                    state.content.clear();
                    state.cursor_position = 0;
                    self.close_command_palette();
                    drop(state);
                    return match parse_slash_command(&content) {
                        Some(command) => ConversationResult::Command(command),
                        None => ConversationResult::Submitted(content),
                    };
                }
            }
            KeyCode::Up => {
                if self.show_command_palette.get() {
                    self.move_command_selection(-1);
                }
            }
            KeyCode::Down => {
                if self.show_command_palette.get() {
                    self.move_command_selection(1);
                }
            }
            KeyCode::Esc => {
                self.close_command_palette();
            }
            KeyCode::Tab => {
                if self.show_command_palette.get() {
                    self.apply_selected_command(&mut state);
                }
            }
            KeyCode::Char(c) => {
                self.insert_char(&mut state, c);
                self.sync_command_palette(&state);
            }
            KeyCode::Backspace => {
                if self.backspace(&mut state) {
                    self.sync_command_palette(&state);
                }
            }
            KeyCode::Delete => {
                if self.delete(&mut state) {
                    self.sync_command_palette(&state);
                }
            }
            KeyCode::Left => {
                state.cursor_position = prev_boundary(&state.content, state.cursor_position);
            }
            KeyCode::Right => {
                state.cursor_position = next_boundary(&state.content, state.cursor_position);
            }
            KeyCode::Home => {
                state.cursor_position = 0;
            }
            KeyCode::End => {
                state.cursor_position = state.content.len();
            }
            _ => {}
        }

        ConversationResult::None
    }

    /// Insert a character at the cursor position
    fn insert_char(&self, state: &mut TextAreaState, c: char) {
        state.content.insert(state.cursor_position, c);
        state.cursor_position += c.len_utf8();
    }

    /// Delete character before cursor
    fn backspace(&self, state: &mut TextAreaState) -> bool {
        if state.cursor_position == 0 {
            return false;
        }
        state.cursor_position = prev_boundary(&state.content, state.cursor_position);
        state.content.remove(state.cursor_position);
        true
    }

    /// Delete character at cursor
    fn delete(&self, state: &mut TextAreaState) -> bool {
        if state.cursor_position >= state.content.len() {
            return false;
        }
        state.content.remove(state.cursor_position);
        true
    }

    /// Open, refresh or close the palette to match a leading `/word`
    fn sync_command_palette(&self, state: &TextAreaState) {
        let typing_command = state.content.starts_with('/')
            && !state.content.chars().any(char::is_whitespace);
        if !typing_command {
            self.close_command_palette();
        } else if self.show_command_palette.get() {
            self.refresh_command_palette(state);
        } else {
            self.show_command_palette.set(true);
            self.selected_command.set(Some(0));
            self.refresh_command_palette(state);
        }
    }

    fn close_command_palette(&self) {
        self.show_command_palette.set(false);
        self.filtered_commands.borrow_mut().clear();
        self.selected_command.set(None);
    }

    fn refresh_command_palette(&self, state: &TextAreaState) {
        let query = state.content.trim_start_matches('/').to_lowercase();
        let mut filtered = self.filtered_commands.borrow_mut();
        filtered.clear();

        for entry in &self.command_entries {
            if query.is_empty() || entry.keyword.starts_with(&query) {
                filtered.push(*entry);
            }
        }

        if filtered.is_empty() {
            self.selected_command.set(None);
        } else {
            let index = self.selected_command.get().unwrap_or(0);
            self.selected_command.set(Some(index.min(filtered.len() - 1)));
        }
    }

    fn move_command_selection(&self, delta: isize) {
        let filtered = self.filtered_commands.borrow();
        if filtered.is_empty() {
            self.selected_command.set(None);
            return;
        }

        let len = filtered.len() as isize;
        let current = self.selected_command.get().unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len);
        self.selected_command.set(Some(next as usize));
    }

    /// Replace the input with the highlighted command. Returns whether
    /// anything was applied.
    fn apply_selected_command(&self, state: &mut TextAreaState) -> bool {
        let entry = {
            let filtered = self.filtered_commands.borrow();
            match self.selected_command.get().and_then(|i| filtered.get(i)) {
                Some(entry) => *entry,
                None => return false,
            }
        };

        state.content = format!("/{}", entry.keyword);
        state.cursor_position = state.content.len();
        self.close_command_palette();
        true
    }

    /// Set focus state
    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.close_command_palette();
        }
    }

    /// Whether the command palette is showing; Esc closes it first
    pub fn has_command_palette(&self) -> bool {
        self.show_command_palette.get()
    }

    /// Get current content
    pub fn get_content(&self) -> String {
        self.state.borrow().content.clone()
    }

    /// Clear content
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.content.clear();
        state.cursor_position = 0;
        drop(state);
        self.close_command_palette();
    }
}

fn prev_boundary(text: &str, pos: usize) -> usize {
    text[..pos].char_indices().next_back().map(|(i, _)| i).unwrap_or(0)
}

fn next_boundary(text: &str, pos: usize) -> usize {
    text[pos..].chars().next().map(|c| pos + c.len_utf8()).unwrap_or(pos)
}

impl Widget for ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.state.borrow();

        let (title, style) = if self.disabled {
            ("Waiting for response...", Style::default().fg(Color::DarkGray))
        } else if self.has_focus {
            ("Message (Enter to send, Shift+Enter for newline)", Style::default().fg(Color::Green))
        } else {
            ("Message", Style::default().fg(Color::Gray))
        };

        let block = Block::default().borders(Borders::ALL).title(title).style(style);
        let inner_area = block.inner(area);
        block.render(area, buf);
        if inner_area.height == 0 {
            return;
        }

        if state.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                &self.placeholder,
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = state.content.clone();
            if self.has_focus && !self.disabled {
                content.insert(state.cursor_position.min(content.len()), '▌');
            }

            // Keep the cursor line visible when the input outgrows the box
            let lines: Vec<&str> = content.split('\n').collect();
            let height = inner_area.height as usize;
            let start = lines.len().saturating_sub(height);
            for (i, line_text) in lines[start..].iter().enumerate() {
                let line = Line::from(vec![Span::raw(*line_text)]);
                buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
            }
        }

        if self.show_command_palette.get() {
            let filtered = self.filtered_commands.borrow();
            if filtered.is_empty() {
                return;
            }
            let palette_height = (filtered.len().min(5) + 2) as u16;
            let palette_area = Rect {
                x: area.x,
                y: area.y.saturating_sub(palette_height),
                width: area.width,
                height: palette_height.min(area.y),
            };
            if palette_area.height < 3 {
                return;
            }

            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            let selected = self.selected_command.get();
            for (index, entry) in filtered.iter().enumerate().take(inner.height as usize) {
                let style = if selected == Some(index) {
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled("  ", Style::default()),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);

                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(composer: &ConversationComposer, text: &str) {
        for c in text.chars() {
            composer.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_submits_trimmed_text() {
        let composer = ConversationComposer::new("Type your message...");
        type_text(&composer, "  hello there ");
        assert_eq!(
            composer.handle_key(key(KeyCode::Enter)),
            ConversationResult::Submitted("hello there".into())
        );
        assert_eq!(composer.get_content(), "");
    }

    #[test]
    fn blank_input_is_never_submitted() {
        let composer = ConversationComposer::new("");
        assert_eq!(composer.handle_key(key(KeyCode::Enter)), ConversationResult::None);
        type_text(&composer, " \t ");
        assert_eq!(composer.handle_key(key(KeyCode::Enter)), ConversationResult::None);
    }

    #[test]
    fn disabled_composer_refuses_input() {
        let mut composer = ConversationComposer::new("");
        type_text(&composer, "queued");
        composer.set_disabled(true);
        type_text(&composer, "more");
        assert_eq!(composer.handle_key(key(KeyCode::Enter)), ConversationResult::None);
        assert_eq!(composer.get_content(), "queued");

        composer.set_disabled(false);
        assert_eq!(
            composer.handle_key(key(KeyCode::Enter)),
            ConversationResult::Submitted("queued".into())
        );
    }

    #[test]
    fn shift_enter_inserts_newline() {
        let composer = ConversationComposer::new("");
        type_text(&composer, "a");
        composer.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        type_text(&composer, "b");
        assert_eq!(composer.get_content(), "a\nb");
    }

    #[test]
    fn editing_handles_multibyte_chars() {
        let composer = ConversationComposer::new("");
        type_text(&composer, "héé");
        composer.handle_key(key(KeyCode::Left));
        composer.handle_key(key(KeyCode::Backspace));
        assert_eq!(composer.get_content(), "hé");
        composer.handle_key(key(KeyCode::Home));
        composer.handle_key(key(KeyCode::Delete));
        assert_eq!(composer.get_content(), "é");
    }

    #[test]
    fn slash_input_becomes_command() {
        let composer = ConversationComposer::new("");
        type_text(&composer, "/quit");
        // Palette is open; Enter applies the highlighted entry first
        assert_eq!(composer.handle_key(key(KeyCode::Enter)), ConversationResult::None);
        match composer.handle_key(key(KeyCode::Enter)) {
            ConversationResult::Command(command) => assert_eq!(command, SlashCommand::Quit),
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn command_word_with_text_is_submitted_as_message() {
        let composer = ConversationComposer::new("");
        type_text(&composer, "/c is my favourite language, explain pointers");
        assert!(!composer.has_command_palette());
        assert_eq!(
            composer.handle_key(key(KeyCode::Enter)),
            ConversationResult::Submitted("/c is my favourite language, explain pointers".into())
        );
    }

    #[test]
    fn esc_closes_palette_and_keeps_text() {
        let composer = ConversationComposer::new("");
        type_text(&composer, "/he");
        assert!(composer.has_command_palette());
        assert_eq!(composer.handle_key(key(KeyCode::Esc)), ConversationResult::None);
        assert!(!composer.has_command_palette());
        assert_eq!(composer.get_content(), "/he");
    }
}
