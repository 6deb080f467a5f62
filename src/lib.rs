//! Onboarding Chat: scripted conversational onboarding.

pub mod channels;
pub mod config;
pub mod error;
pub mod onboarding;
