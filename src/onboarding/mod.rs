//! Onboarding system: conversational sign-up flow.
//!
//! A new user is walked through email entry, an optional company ID (for
//! consumer email domains), password creation, and three profile questions,
//! ending with a confirmation. Bot turns come from a static response catalog;
//! the step logic lives in a pure reducer so it can be tested without any
//! front end.

pub mod machine;
pub mod manager;
pub mod model;
pub mod prompts;
pub mod routes;
pub mod sessions;
pub mod state;
pub mod validation;

pub use machine::{ChatEvent, Outcome, Rejection, reduce};
pub use manager::{OnboardingSession, OnboardingStatus, TurnResult};
pub use model::{ButtonOption, ChatSnapshot, ChatState, Message, UserData};
pub use prompts::{BotResponse, CannedCatalog, ResponseCatalog};
pub use routes::{OnboardingRouteState, onboarding_routes};
pub use sessions::{SessionRegistry, spawn_prune_task};
pub use state::{FlowStep, InputKind};
