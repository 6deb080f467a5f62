//! Onboarding steps: which question the user is currently answering.

use serde::{Deserialize, Serialize};

/// The steps of the onboarding conversation.
///
/// Progresses linearly: Welcome → EmailInput → (CompanyCheck) →
/// PasswordInput → BusinessType → CompanySize → UseCase → Confirmation →
/// Complete. `CompanyCheck` is only visited for consumer email domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    Welcome,
    /// Declared for a separate login/signup chooser that no transition
    /// produces. Kept so serialized step names stay stable.
    AuthChoice,
    EmailInput,
    CompanyCheck,
    PasswordInput,
    BusinessType,
    CompanySize,
    UseCase,
    Confirmation,
    Complete,
}

/// What kind of input the presentation layer should offer at a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    /// Free text that should be masked when echoed.
    Password,
    Buttons,
    /// No input is accepted.
    None,
}

impl FlowStep {
    /// Check if moving from `self` to `target` is a transition the flow defines.
    pub fn can_transition_to(&self, target: FlowStep) -> bool {
        use FlowStep::*;
        matches!(
            (self, target),
            (Welcome, EmailInput)
                | (EmailInput, CompanyCheck)
                | (EmailInput, PasswordInput)
                | (CompanyCheck, PasswordInput)
                | (PasswordInput, BusinessType)
                | (BusinessType, CompanySize)
                | (CompanySize, UseCase)
                | (UseCase, Confirmation)
                | (Confirmation, Complete)
        )
    }

    /// Whether this step is terminal (onboarding is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// The input the user is expected to provide at this step.
    pub fn input_kind(&self) -> InputKind {
        use FlowStep::*;
        match self {
            Welcome | BusinessType | CompanySize | UseCase | Confirmation => InputKind::Buttons,
            EmailInput | CompanyCheck => InputKind::Text,
            PasswordInput => InputKind::Password,
            AuthChoice | Complete => InputKind::None,
        }
    }

    /// Whether free-text submissions are handled (rather than just echoed).
    pub fn accepts_text(&self) -> bool {
        matches!(self.input_kind(), InputKind::Text | InputKind::Password)
    }
}

impl Default for FlowStep {
    fn default() -> Self {
        Self::Welcome
    }
}

impl std::fmt::Display for FlowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::AuthChoice => "auth_choice",
            Self::EmailInput => "email_input",
            Self::CompanyCheck => "company_check",
            Self::PasswordInput => "password_input",
            Self::BusinessType => "business_type",
            Self::CompanySize => "company_size",
            Self::UseCase => "use_case",
            Self::Confirmation => "confirmation",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Password => "password",
            Self::Buttons => "buttons",
            Self::None => "none",
        };
        write!(f, "{s}")
    }
}
