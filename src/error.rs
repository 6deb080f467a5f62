//! Error types for the onboarding chat.

use uuid::Uuid;

use crate::onboarding::FlowStep;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Terminal channel errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while driving an onboarding session.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    /// A bot response is still being generated; input is disabled.
    #[error("Session is busy generating a response")]
    Busy,

    #[error("No response defined for step {step}")]
    NoResponse { step: FlowStep },

    #[error("Session {id} not found")]
    SessionNotFound { id: Uuid },

    #[error("Response generation failed: {0}")]
    Generation(String),
}
