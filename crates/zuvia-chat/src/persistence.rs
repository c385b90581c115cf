use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::KeyValueStore;
use crate::transcript::{Speaker, Turn};

pub const DEFAULT_STORAGE_KEY: &str = "zuvia_chat_history_v1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// On-disk shape of one turn: `{ "who": "user" | "bot", "text": ... }`.
struct PersistedTurn {
    who: String,
    #[serde(default)]
    text: String,
}

impl From<&Turn> for PersistedTurn {
    fn from(turn: &Turn) -> Self {
        Self {
            who: turn.speaker().as_str().to_string(),
            text: turn.text().to_string(),
        }
    }
}

impl From<PersistedTurn> for Turn {
    fn from(record: PersistedTurn) -> Self {
        // Anything not explicitly "user" renders as a bot bubble.
        let speaker = if record.who == Speaker::User.as_str() {
            Speaker::User
        } else {
            Speaker::Bot
        };
        Turn::new(speaker, record.text)
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage unavailable: {0:#}")]
    Storage(#[from] anyhow::Error),
    #[error("stored transcript is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Clone)]
/// Serializes the whole transcript under one fixed key.
pub struct TranscriptPersistence {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl TranscriptPersistence {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Overwrites the stored record. Failures are logged, never returned.
    pub fn save(&self, turns: &[Turn]) {
        if let Err(error) = self.try_save(turns) {
            tracing::warn!(
                storage_key = self.key.as_str(),
                error = %error,
                "failed to persist chat transcript"
            );
        }
    }

    pub fn try_save(&self, turns: &[Turn]) -> Result<(), PersistenceError> {
        let records: Vec<PersistedTurn> = turns.iter().map(PersistedTurn::from).collect();
        let payload = serde_json::to_string(&records)?;
        self.store.set(&self.key, &payload)?;
        Ok(())
    }

    /// Returns the stored transcript, or an empty one when absent or unreadable.
    pub fn load(&self) -> Vec<Turn> {
        match self.try_load() {
            Ok(Some(turns)) => turns,
            Ok(None) => Vec::new(),
            Err(error) => {
                tracing::warn!(
                    storage_key = self.key.as_str(),
                    error = %error,
                    "failed to restore chat transcript"
                );
                Vec::new()
            }
        }
    }

    /// `Ok(None)` distinguishes a never-saved record from an empty one.
    pub fn try_load(&self) -> Result<Option<Vec<Turn>>, PersistenceError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        let records: Vec<PersistedTurn> = serde_json::from_str(&raw)?;
        Ok(Some(records.into_iter().map(Turn::from).collect()))
    }

    pub fn reset(&self) {
        if let Err(error) = self.store.remove(&self.key) {
            tracing::warn!(
                storage_key = self.key.as_str(),
                error = %error,
                "failed to clear stored chat transcript"
            );
        }
    }
}

impl std::fmt::Debug for TranscriptPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptPersistence")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
