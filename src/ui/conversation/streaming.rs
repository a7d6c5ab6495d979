use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};
use std::time::Duration;

/// Animated "thinking" line shown while a turn is in flight
#[derive(Debug, Clone, Copy)]
pub struct StreamingIndicator {
    is_streaming: bool,
    /// Time since the application started, drives the animation
    elapsed: Duration,
}

impl StreamingIndicator {
    pub fn new(is_streaming: bool, elapsed: Duration) -> Self {
        Self {
            is_streaming,
            elapsed,
        }
    }

    fn dots(&self) -> &'static str {
        match (self.elapsed.as_millis() / 300) % 4 {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "   ",
        }
    }

    pub fn line(&self) -> Line<'static> {
        if !self.is_streaming {
            return Line::from(vec![Span::styled("● ready", Style::default().fg(Color::DarkGray))]);
        }
        Line::from(vec![
            Span::styled("● thinking", Style::default().fg(Color::Green)),
            Span::styled(self.dots(), Style::default().fg(Color::Yellow)),
        ])
    }
}

impl Widget for StreamingIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_line(area.x, area.y, &self.line(), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn idle_indicator_reads_ready() {
        let indicator = StreamingIndicator::new(false, Duration::from_millis(700));
        assert_eq!(text(&indicator.line()), "● ready");
    }

    #[test]
    fn dots_cycle_with_time() {
        let at = |ms| text(&StreamingIndicator::new(true, Duration::from_millis(ms)).line());
        assert_eq!(at(0), "● thinking.");
        assert_eq!(at(350), "● thinking..");
        assert_eq!(at(650), "● thinking...");
        assert_eq!(at(950), "● thinking   ");
    }
}
