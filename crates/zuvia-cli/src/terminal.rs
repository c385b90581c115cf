//! Line-oriented rendering of a conversation session.

use std::sync::Mutex;

use zuvia_chat::{ComposeState, QuickAction, SessionEvent, Speaker, Turn, Visibility};

pub(crate) const TYPING_INDICATOR: &str = "Zuvia is typing…";

pub(crate) const HELP_TEXT: &str = "commands: /1../n pick a quick action, /toggle open or close the chat, /reset start over, /help, /quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReplCommand {
    Empty,
    Message(String),
    QuickAction(usize),
    Toggle,
    Reset,
    Help,
    Quit,
    Unknown(String),
}

pub(crate) fn parse_repl_command(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ReplCommand::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return ReplCommand::Message(trimmed.to_string());
    };

    match command {
        "quit" | "exit" => ReplCommand::Quit,
        "toggle" => ReplCommand::Toggle,
        "reset" => ReplCommand::Reset,
        "help" => ReplCommand::Help,
        other => match other.parse::<usize>() {
            Ok(index) if index > 0 => ReplCommand::QuickAction(index),
            _ => ReplCommand::Unknown(trimmed.to_string()),
        },
    }
}

#[derive(Debug, Default)]
struct PresenterState {
    shown_turns: Vec<Turn>,
    offered_actions: Vec<QuickAction>,
}

/// Turns session events into printable lines and remembers the offered actions.
#[derive(Debug, Default)]
pub(crate) struct TerminalPresenter {
    state: Mutex<PresenterState>,
}

impl TerminalPresenter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// `index` is 1-based, as typed after the slash.
    pub(crate) fn offered_action(&self, index: usize) -> Option<QuickAction> {
        let state = self.state.lock().ok()?;
        index
            .checked_sub(1)
            .and_then(|position| state.offered_actions.get(position))
            .cloned()
    }

    pub(crate) fn render(&self, event: &SessionEvent) -> Vec<String> {
        let Ok(mut state) = self.state.lock() else {
            return Vec::new();
        };

        match event {
            SessionEvent::TurnAppended { turn } => {
                state.shown_turns.push(turn.clone());
                if turn.speaker() == Speaker::User {
                    state.offered_actions.clear();
                }
                vec![render_turn(turn)]
            }
            SessionEvent::ComposeStateChanged {
                state: ComposeState::Composing,
            } => vec![TYPING_INDICATOR.to_string()],
            SessionEvent::ComposeStateChanged {
                state: ComposeState::Idle,
            } => Vec::new(),
            SessionEvent::QuickActionsOffered { actions } => {
                state.offered_actions = actions.clone();
                actions
                    .iter()
                    .enumerate()
                    .map(|(index, action)| format!("  /{} {}", index + 1, action.label))
                    .collect()
            }
            SessionEvent::EscalationOffered { link } => {
                vec![format!("{} {} -> {}", link.prompt, link.label, link.url)]
            }
            SessionEvent::TranscriptRestored { turns } => {
                if *turns == state.shown_turns {
                    return Vec::new();
                }
                state.shown_turns = turns.clone();
                state.offered_actions.clear();
                let mut lines = vec![format!("-- conversation ({} messages) --", turns.len())];
                lines.extend(turns.iter().map(render_turn));
                lines
            }
            SessionEvent::VisibilityChanged { visibility } => match visibility {
                Visibility::Open => vec!["[chat opened]".to_string()],
                Visibility::Closed => vec!["[chat closed]".to_string()],
            },
        }
    }
}

pub(crate) fn render_turn(turn: &Turn) -> String {
    match turn.speaker() {
        Speaker::User => format!("you   > {}", turn.text()),
        Speaker::Bot => format!("zuvia > {}", turn.text()),
    }
}
