use crate::config::UiConfig;
use crate::ui::conversation::streaming::StreamingIndicator;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Title bar: name, subtitle, loading state and a status/hint line
pub struct ChatHeader<'a> {
    ui: &'a UiConfig,
    indicator: StreamingIndicator,
    status: Option<&'a str>,
}

impl<'a> ChatHeader<'a> {
    pub fn new(ui: &'a UiConfig, indicator: StreamingIndicator, status: Option<&'a str>) -> Self {
        Self {
            ui,
            indicator,
            status,
        }
    }
}

impl Widget for ChatHeader<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::BOTTOM);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 {
            return;
        }

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(16)])
            .split(inner);

        let title = Line::from(vec![
            Span::styled(
                self.ui.title.as_str(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(self.ui.subtitle.as_str(), Style::default().fg(Color::Gray)),
        ]);
        buf.set_line(columns[0].x, columns[0].y, &title, columns[0].width);

        if columns[0].height > 1 {
            let hint = self.status.unwrap_or("/help for commands · Ctrl+L clears · Esc quits");
            let hint = Line::from(vec![Span::styled(hint, Style::default().fg(Color::DarkGray))]);
            buf.set_line(columns[0].x, columns[0].y + 1, &hint, columns[0].width);
        }

        self.indicator.render(columns[1], buf);
    }
}
