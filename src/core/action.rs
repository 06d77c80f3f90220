//! Actions that command handlers return to the app

use crate::infrastructure::runtime::RuntimeCommand;

/// What the app should do after handling a command
#[derive(Debug, Clone)]
pub enum Action {
    /// No action needed
    None,

    /// Hand a request to the async worker
    Dispatch(RuntimeCommand),

    /// Show notification in status bar
    Notify(String, NotifyLevel),

    /// Request quit
    Quit,
}

/// Notification levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}
