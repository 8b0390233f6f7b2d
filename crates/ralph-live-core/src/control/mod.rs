//! Control commands and their audit trail.

mod history;
mod service;

pub use history::ActionHistoryLog;
pub use service::{OrchestratorControlService, StopConfirmation};
