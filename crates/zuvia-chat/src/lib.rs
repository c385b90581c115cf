//! Conversation core of the Zuvia chat widget.
//!
//! A [`ConversationSession`] owns the transcript and its persisted copy and decides,
//! for each user message, whether the reply comes from the completion proxy, the
//! canned keyword rules, or a hand-off to a human channel. Presentation layers
//! subscribe to [`SessionEvent`]s and feed user input back in.

mod canned;
mod completion;
mod escalation;
mod events;
mod persistence;
mod session;
mod storage;
mod transcript;

pub use canned::{
    resolve as resolve_canned_reply, CannedCategory, CannedReply, CannedRule, CANNED_RULES,
};
pub use completion::{
    CompletionClient, CompletionResult, DEFAULT_CONTEXT_WINDOW, DEFAULT_SYSTEM_DIRECTIVE,
};
pub use escalation::{
    whatsapp_deep_link, EscalationConfig, EscalationLink, DEFAULT_WHATSAPP_MESSAGE,
    DEFAULT_WHATSAPP_NUMBER,
};
pub use events::{
    follow_up_actions, starter_actions, ComposeState, QuickAction, SessionEvent, Visibility,
};
pub use persistence::{PersistenceError, TranscriptPersistence, DEFAULT_STORAGE_KEY};
pub use session::{
    reply_source_label, ConversationSession, ReplySource, WidgetConfig,
    DEFAULT_ESCALATION_MESSAGE, DEFAULT_WELCOME_MESSAGE,
};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use transcript::{Speaker, TranscriptStore, Turn};
