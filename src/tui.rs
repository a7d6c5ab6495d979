use crate::ui::conversation::{ConversationAction, ConversationManager};
use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Redraw interval; also paces the loading animation
const TICK_RATE: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum TuiEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<TuiEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let tx_events = tx.clone();
        tokio::spawn(async move {
            let mut reader = EventStream::new();
            while let Some(event) = reader.next().await {
                let event = match event {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => TuiEvent::Key(key),
                    Ok(Event::Resize(w, h)) => TuiEvent::Resize(w, h),
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::warn!(error = %e, "terminal event stream failed");
                        break;
                    }
                };
                if tx_events.send(event).is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_rate);
            loop {
                interval.tick().await;
                if tx.send(TuiEvent::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }

    pub async fn next(&mut self) -> Option<TuiEvent> {
        self.rx.recv().await
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    execute!(io::stdout(), EnterAlternateScreen).context("Failed to enter alternate screen")?;

    // Put the terminal back before a panic message is printed
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore();
        previous_hook(info);
    }));

    let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("Failed to create terminal")?;
    Ok(terminal)
}

pub fn restore() -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(io::stdout(), LeaveAlternateScreen).context("Failed to leave alternate screen")?;
    Ok(())
}

/// Draw and dispatch events until the user quits
pub async fn run(terminal: &mut Tui, manager: &mut ConversationManager) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    loop {
        manager.tick();
        terminal
            .draw(|frame| {
                let area = frame.size();
                manager.render(area, frame.buffer_mut());
            })
            .context("Failed to draw frame")?;

        match events.next().await {
            Some(TuiEvent::Key(key)) => {
                if manager.handle_key(key) == ConversationAction::Exit {
                    break;
                }
            }
            Some(TuiEvent::Resize(w, h)) => tracing::debug!(w, h, "terminal resized"),
            Some(TuiEvent::Tick) => {}
            None => break,
        }
    }

    manager.shutdown();
    Ok(())
}
