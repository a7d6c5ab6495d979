//! Conversation history display component

use crate::store::{Message, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Shown in place of an assistant message that has not received text yet
const PENDING_CONTENT: &str = "...";

/// Conversation history display component.
///
/// Always shows the newest lines; older ones scroll off the top.
#[derive(Clone)]
pub struct ConversationHistory {
    messages: Vec<Message>,
    welcome_title: String,
}

impl ConversationHistory {
    pub fn new(messages: Vec<Message>, welcome_title: impl Into<String>) -> Self {
        Self {
            messages,
            welcome_title: welcome_title.into(),
        }
    }

    /// Render a single message into lines
    fn render_message(&self, message: &Message, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let (role_icon, role_label) = match message.role {
            Role::User => ("👤", "You"),
            Role::Assistant => ("🤖", "Agent"),
        };
        let timestamp = message.timestamp.format("%H:%M:%S").to_string();
        let header = format!("{} {} {} {}", role_icon, role_label, timestamp, "─".repeat(20));

        lines.push(Line::from(vec![Span::styled(
            header,
            Style::default().fg(Color::DarkGray),
        )]));

        let content = if message.content.is_empty() && message.role == Role::Assistant {
            PENDING_CONTENT
        } else {
            message.content.as_str()
        };

        for content_line in wrap_text(content, width.saturating_sub(2) as usize) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, content_style(message.role)),
            ]));
        }

        lines
    }
}

impl Widget for ConversationHistory {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("Conversation");

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() {
            let welcome_lines = vec![
                Line::from(vec![Span::styled(
                    format!("Welcome to {}", self.welcome_title),
                    Style::default().fg(Color::Green),
                )]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Start a conversation by typing a message below",
                    Style::default().fg(Color::Gray),
                )]),
            ];

            for (i, line) in welcome_lines.iter().enumerate().take(inner_area.height as usize) {
                buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
            }
            return;
        }

        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.messages.iter() {
            all_lines.extend(self.render_message(message, inner_area.width));
            all_lines.push(Line::from(vec![Span::raw("")]));
        }
        // No spacer after the newest message
        all_lines.pop();

        let height = inner_area.height as usize;
        let start = all_lines.len().saturating_sub(height);
        for (i, line) in all_lines[start..].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

fn content_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Blue),
        Role::Assistant => Style::default().fg(Color::Green),
    }
}

/// Word-wrap `text` to `width` columns, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = word.chars().count();
            if current_width > 0 && current_width + word_width + 1 > width {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }
            if current_width > 0 {
                current_line.push(' ');
                current_width += 1;
            }
            current_line.push_str(word);
            current_width += word_width;
        }

        lines.push(current_line);
    }

    lines
}
