use std::sync::Arc;

use zuvia_ai::CompletionBackend;

use crate::canned::{self, CannedCategory};
use crate::completion::{
    CompletionClient, CompletionResult, DEFAULT_CONTEXT_WINDOW, DEFAULT_SYSTEM_DIRECTIVE,
};
use crate::escalation::EscalationConfig;
use crate::events::{
    follow_up_actions, starter_actions, ComposeState, QuickAction, SessionEvent, Visibility,
};
use crate::persistence::{TranscriptPersistence, DEFAULT_STORAGE_KEY};
use crate::storage::KeyValueStore;
use crate::transcript::{TranscriptStore, Turn};

pub const DEFAULT_WELCOME_MESSAGE: &str = "Hi! I'm Zuvia's assistant 👋 How can I help today?";
pub const DEFAULT_ESCALATION_MESSAGE: &str = "Sorry, I don't have that info right now. Would you like me to connect you to our sales team on WhatsApp?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub storage_key: String,
    pub system_directive: String,
    pub context_window: usize,
    pub welcome_message: String,
    pub escalation_message: String,
    pub escalation: EscalationConfig,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            system_directive: DEFAULT_SYSTEM_DIRECTIVE.to_string(),
            context_window: DEFAULT_CONTEXT_WINDOW,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            escalation_message: DEFAULT_ESCALATION_MESSAGE.to_string(),
            escalation: EscalationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which strategy produced the bot turn for one input.
pub enum ReplySource {
    Remote,
    Canned(CannedCategory),
    Escalation,
}

type EventHandler = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// One widget instance: transcript, persistence, reply policy and view state.
pub struct ConversationSession {
    config: WidgetConfig,
    transcript: TranscriptStore,
    persistence: TranscriptPersistence,
    completion: CompletionClient,
    visibility: Visibility,
    compose_state: ComposeState,
    handlers: Vec<EventHandler>,
}

impl ConversationSession {
    /// `backend` of `None` runs on canned replies only.
    pub fn new(
        config: WidgetConfig,
        backend: Option<Arc<dyn CompletionBackend>>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let completion = match backend {
            Some(backend) => CompletionClient::new(
                backend,
                config.system_directive.clone(),
                config.context_window,
            ),
            None => CompletionClient::disabled(),
        };
        let persistence = TranscriptPersistence::new(store, config.storage_key.clone());

        Self {
            config,
            transcript: TranscriptStore::new(),
            persistence,
            completion,
            visibility: Visibility::Closed,
            compose_state: ComposeState::Idle,
            handlers: Vec::new(),
        }
    }

    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(handler));
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn transcript(&self) -> &TranscriptStore {
        &self.transcript
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn compose_state(&self) -> ComposeState {
        self.compose_state
    }

    pub fn completion_enabled(&self) -> bool {
        self.completion.is_enabled()
    }

    /// Restores the stored conversation, or greets a first-time visitor.
    pub fn boot(&mut self) {
        self.reconcile_from_storage();
        if !self.transcript.is_empty() {
            return;
        }

        let welcome = Turn::bot(self.config.welcome_message.clone());
        self.append_turn(welcome);
        self.emit(SessionEvent::QuickActionsOffered {
            actions: starter_actions(),
        });
        self.persist();
    }

    /// Drops the stored record and starts over with a fresh greeting.
    pub fn reset(&mut self) {
        self.persistence.reset();
        self.transcript.clear();
        self.emit(SessionEvent::TranscriptRestored { turns: Vec::new() });
        self.boot();
    }

    pub fn toggle(&mut self) {
        match self.visibility {
            Visibility::Closed => self.open(),
            Visibility::Open => self.close(),
        }
    }

    pub fn open(&mut self) {
        if self.visibility == Visibility::Open {
            return;
        }
        self.visibility = Visibility::Open;
        self.emit(SessionEvent::VisibilityChanged {
            visibility: Visibility::Open,
        });
        self.reconcile_from_storage();
    }

    pub fn close(&mut self) {
        if self.visibility == Visibility::Closed {
            return;
        }
        self.visibility = Visibility::Closed;
        self.persist();
        self.emit(SessionEvent::VisibilityChanged {
            visibility: Visibility::Closed,
        });
    }

    /// Appends the user turn and exactly one bot turn; blank input is ignored.
    pub async fn handle_user_input(&mut self, text: &str) -> Option<ReplySource> {
        if text.trim().is_empty() {
            return None;
        }

        self.append_turn(Turn::user(text));
        self.persist();

        self.set_compose_state(ComposeState::Composing);
        let result = self.completion.complete(text, &self.transcript).await;
        self.set_compose_state(ComposeState::Idle);

        let source = match result {
            CompletionResult::Reply(reply) => {
                self.append_turn(Turn::bot(reply));
                self.emit(SessionEvent::QuickActionsOffered {
                    actions: follow_up_actions(),
                });
                ReplySource::Remote
            }
            CompletionResult::Unavailable => match canned::resolve(text) {
                Some(scripted) => {
                    self.append_turn(Turn::bot(scripted.text));
                    self.emit(SessionEvent::QuickActionsOffered {
                        actions: follow_up_actions(),
                    });
                    ReplySource::Canned(scripted.category)
                }
                None => {
                    self.append_turn(Turn::bot(self.config.escalation_message.clone()));
                    self.emit(SessionEvent::EscalationOffered {
                        link: self.config.escalation.link(),
                    });
                    ReplySource::Escalation
                }
            },
        };
        self.persist();

        tracing::debug!(
            source = reply_source_label(source),
            turns = self.transcript.len(),
            "handled user input"
        );
        Some(source)
    }

    pub async fn activate_quick_action(&mut self, action: &QuickAction) -> Option<ReplySource> {
        self.handle_user_input(&action.payload).await
    }

    fn reconcile_from_storage(&mut self) {
        match self.persistence.try_load() {
            Ok(Some(turns)) => self.transcript.replace(turns),
            Ok(None) => {
                if !self.transcript.is_empty() {
                    self.persist();
                }
            }
            Err(error) => {
                tracing::warn!(
                    storage_key = self.persistence.key(),
                    error = %error,
                    "stored transcript unreadable; keeping in-memory conversation"
                );
                self.persist();
            }
        }
        self.emit(SessionEvent::TranscriptRestored {
            turns: self.transcript.all().to_vec(),
        });
    }

    fn append_turn(&mut self, turn: Turn) {
        self.transcript.append(turn.clone());
        self.emit(SessionEvent::TurnAppended { turn });
    }

    fn set_compose_state(&mut self, state: ComposeState) {
        if self.compose_state == state {
            return;
        }
        self.compose_state = state;
        self.emit(SessionEvent::ComposeStateChanged { state });
    }

    fn persist(&self) {
        self.persistence.save(self.transcript.all());
    }

    fn emit(&self, event: SessionEvent) {
        for handler in &self.handlers {
            handler(&event);
        }
    }
}

pub fn reply_source_label(source: ReplySource) -> &'static str {
    match source {
        ReplySource::Remote => "remote",
        ReplySource::Canned(category) => category.as_str(),
        ReplySource::Escalation => "escalation",
    }
}
