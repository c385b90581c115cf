use crate::escalation::EscalationLink;
use crate::transcript::Turn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeState {
    Idle,
    Composing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Closed,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A tappable prompt; activating it sends `payload` as user input.
pub struct QuickAction {
    pub label: String,
    pub payload: String,
}

impl QuickAction {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }

    /// An action whose payload is its own label.
    pub fn echo(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            payload: label.clone(),
            label,
        }
    }
}

/// Offered after every scripted or remote bot reply.
pub fn follow_up_actions() -> Vec<QuickAction> {
    vec![
        QuickAction::new("Place an order", "I want to place an order"),
        QuickAction::new("Become a distributor", "I want to become a distributor"),
        QuickAction::new("Contact details", "What are your contact details?"),
    ]
}

/// Offered under the welcome message of a fresh conversation.
pub fn starter_actions() -> Vec<QuickAction> {
    [
        "Place an order",
        "Become a distributor",
        "Product sizes & price",
        "Contact details",
    ]
    .into_iter()
    .map(QuickAction::echo)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Everything a presentation layer needs to mirror the session.
pub enum SessionEvent {
    TurnAppended { turn: Turn },
    ComposeStateChanged { state: ComposeState },
    QuickActionsOffered { actions: Vec<QuickAction> },
    EscalationOffered { link: EscalationLink },
    TranscriptRestored { turns: Vec<Turn> },
    VisibilityChanged { visibility: Visibility },
}
