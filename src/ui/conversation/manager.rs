use crate::client::ChatClient;
use crate::config::UiConfig;
use crate::store::ConversationStore;
use crate::ui::conversation::{
    get_help_text, ChatHeader, ConversationComposer, ConversationHistory, SlashCommand,
    StreamingIndicator,
};
use crate::ui::conversation::composer::ConversationResult;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Widget,
};
use std::time::Instant;
use tokio::task::JoinHandle;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Ties the store, the streaming client and the widgets together.
///
/// The manager never mutates messages itself during a turn: it spawns
/// [`ChatClient::send_message`] and reads the store on every frame.
pub struct ConversationManager {
    store: ConversationStore,
    client: ChatClient,
    composer: ConversationComposer,
    ui: UiConfig,
    status: Option<String>,
    started: Instant,
    turn: Option<JoinHandle<()>>,
}

impl ConversationManager {
    pub fn new(store: ConversationStore, client: ChatClient, ui: UiConfig) -> Self {
        let mut composer = ConversationComposer::new("Type your message...");
        composer.set_focus(true);

        Self {
            store,
            client,
            composer,
            ui,
            status: None,
            started: Instant::now(),
            turn: None,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// A turn is loading, or spawned and not yet finished
    pub fn is_busy(&self) -> bool {
        self.store.is_loading() || self.turn.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start a turn for `content` on a background task.
    ///
    /// Refused while a previous turn is still running.
    pub fn handle_input(&mut self, content: String) -> bool {
        let content = content.trim().to_string();
        if content.is_empty() || self.is_busy() {
            return false;
        }

        self.status = None;

        let client = self.client.clone();
        let store = self.store.clone();
        self.turn = Some(tokio::spawn(async move {
            client.send_message(&store, &content).await;
        }));
        true
    }

    /// Sync widget state with the store; call once per frame
    pub fn tick(&mut self) {
        if self.turn.as_ref().is_some_and(JoinHandle::is_finished) {
            self.turn = None;
        }
        self.composer.set_disabled(self.is_busy());
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return ConversationAction::Exit,
                KeyCode::Char('l') => {
                    self.run_command(SlashCommand::Clear);
                    return ConversationAction::None;
                }
                _ => {}
            }
        }
        if key.code == KeyCode::Esc && !self.composer.has_command_palette() {
            return ConversationAction::Exit;
        }

        self.tick();
        match self.composer.handle_key(key) {
            ConversationResult::Submitted(input) => {
                self.handle_input(input);
                ConversationAction::None
            }
            ConversationResult::Command(command) => self.run_command(command),
            ConversationResult::None => ConversationAction::None,
        }
    }

    fn run_command(&mut self, command: SlashCommand) -> ConversationAction {
        if self.is_busy() && !command.available_during_streaming() {
            self.status = Some(format!("/{} is unavailable while a response is streaming", command.command()));
            return ConversationAction::None;
        }

        match command {
            SlashCommand::Clear => {
                self.store.clear();
                self.composer.clear();
                self.status = None;
                ConversationAction::None
            }
            SlashCommand::Help => {
                self.status = Some(get_help_text());
                ConversationAction::None
            }
            SlashCommand::Quit => ConversationAction::Exit,
        }
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Stop waiting on a running turn. The connection is dropped with the task.
    pub fn shutdown(&mut self) {
        if let Some(turn) = self.turn.take() {
            turn.abort();
        }
    }

    /// Render the conversation UI components
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(5),    // History
                Constraint::Length(5), // Composer
            ])
            .split(area);

        let state = self.store.snapshot();
        let indicator = StreamingIndicator::new(state.is_loading, self.started.elapsed());

        ChatHeader::new(&self.ui, indicator, self.status.as_deref()).render(chunks[0], buf);
        ConversationHistory::new(state.messages, self.ui.title.clone()).render(chunks[1], buf);
        self.composer.clone().render(chunks[2], buf);
    }
}
