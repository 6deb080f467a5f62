//! Presentation channels that render onboarding sessions.

pub mod cli;

pub use cli::CliChannel;
