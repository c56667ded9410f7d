//! Confirmation gate in front of the destructive reset.

use crate::error::ChassisError;

/// Asked once before existing pieces are deleted. `Ok(false)` cancels the
/// regeneration before anything is touched.
pub trait ConfirmationGate: Send + Sync {
    fn confirm(&self, prompt: &str) -> Result<bool, ChassisError>;
}

/// Interactive yes/no prompt on the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirmation;

impl ConfirmationGate for TerminalConfirmation {
    fn confirm(&self, prompt: &str) -> Result<bool, ChassisError> {
        use dialoguer::Confirm;
        Ok(Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }
}

/// Non-interactive callers that have already obtained consent.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl ConfirmationGate for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> Result<bool, ChassisError> {
        Ok(true)
    }
}

/// Refuses every reset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decline;

impl ConfirmationGate for Decline {
    fn confirm(&self, _prompt: &str) -> Result<bool, ChassisError> {
        Ok(false)
    }
}
