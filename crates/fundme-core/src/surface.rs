//! Display/interaction abstraction.
//!
//! The dispatcher never touches a concrete UI; it reports through this
//! trait. Frontends implement the UX (and own the transient message box's
//! 5000 ms self-clear).

use serde::{Deserialize, Serialize};

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

/// The four user-triggered actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Connect,
    Fund,
    Withdraw,
    Balance,
}

impl ActionKind {
    /// Human-readable action name, used in busy/progress messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connect => "Connect",
            Self::Fund => "Fund",
            Self::Withdraw => "Withdraw",
            Self::Balance => "Balance",
        }
    }
}

/// Injected display surface.
///
/// Implementations must be cheap and non-blocking: the dispatcher calls
/// these inline between suspension points.
pub trait Surface: Send + Sync {
    /// Show a transient message.
    fn message(&self, kind: MessageKind, text: &str);

    /// Update the connected/not-connected status badge.
    fn connection_changed(&self, connected: bool);

    /// Push a freshly formatted balance to the readout.
    fn balance_updated(&self, formatted: &str);

    /// Replace the label of an action's trigger element.
    fn action_label(&self, action: ActionKind, label: &str);

    /// Clear the fund amount input field.
    fn clear_amount(&self);
}
