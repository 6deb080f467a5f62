//! Canned bot responses for each onboarding step.
//!
//! Responses are selected by an explicit match on the step being entered.
//! The [`ResponseCatalog`] trait is the seam where a generated (for example
//! LLM-backed) catalog could replace [`CannedCatalog`].

use async_trait::async_trait;
use serde::Serialize;

use super::model::{ButtonOption, UserData};
use super::state::{FlowStep, InputKind};
use crate::error::OnboardingError;

/// Shown when a response cannot be produced for an entered step.
pub const APOLOGY_MESSAGE: &str = "I apologize, but I encountered an issue. Please try again.";

pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address.";
pub const WEAK_PASSWORD_MESSAGE: &str = "Please use at least 6 characters with a number or symbol.";
pub const LOGIN_STUB_MESSAGE: &str =
    "Login functionality will be available soon! For now, let's create your account.";
pub const EDIT_NOTICE_MESSAGE: &str =
    "What would you like to change? You can restart by refreshing the page.";

/// Whether the user asked to sign up or to log in at the welcome step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    Login,
    Signup,
}

/// A bot turn: the text plus how the user is expected to answer it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotResponse {
    pub message: String,
    pub needs_input: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<ButtonOption>>,
}

impl BotResponse {
    fn text(message: &str) -> Self {
        Self {
            message: message.to_string(),
            needs_input: true,
            input_type: Some(InputKind::Text),
            buttons: None,
        }
    }

    fn password(message: &str) -> Self {
        Self {
            input_type: Some(InputKind::Password),
            ..Self::text(message)
        }
    }

    fn buttons(message: impl Into<String>, buttons: Vec<ButtonOption>) -> Self {
        Self {
            message: message.into(),
            needs_input: true,
            input_type: Some(InputKind::Buttons),
            buttons: Some(buttons),
        }
    }

    fn closing(message: &str) -> Self {
        Self {
            message: message.to_string(),
            needs_input: false,
            input_type: None,
            buttons: None,
        }
    }
}

/// Produces the bot message shown when a step is entered.
#[async_trait]
pub trait ResponseCatalog: Send + Sync {
    /// Build the response for `step`, given what has been collected so far.
    async fn respond(&self, step: FlowStep, user: &UserData)
        -> Result<BotResponse, OnboardingError>;
}

/// Static, keyed response table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedCatalog;

#[async_trait]
impl ResponseCatalog for CannedCatalog {
    async fn respond(
        &self,
        step: FlowStep,
        user: &UserData,
    ) -> Result<BotResponse, OnboardingError> {
        response_for(step, user)
    }
}

/// Synchronous dispatch behind [`CannedCatalog`].
pub fn response_for(step: FlowStep, user: &UserData) -> Result<BotResponse, OnboardingError> {
    let response = match step {
        FlowStep::Welcome => welcome_message(),
        FlowStep::EmailInput => email_prompt(AuthType::Signup),
        FlowStep::CompanyCheck => company_prompt(user.email.as_deref().unwrap_or_default()),
        FlowStep::PasswordInput => password_prompt(false),
        FlowStep::BusinessType => business_type_prompt(),
        FlowStep::CompanySize => company_size_prompt(),
        FlowStep::UseCase => use_case_prompt(),
        FlowStep::Confirmation => confirmation_message(user),
        FlowStep::Complete => completion_message(user),
        FlowStep::AuthChoice => return Err(OnboardingError::NoResponse { step }),
    };
    Ok(response)
}

pub fn welcome_message() -> BotResponse {
    BotResponse::buttons(
        "👋 Hi there! Welcome to our business platform. I'm here to help you get started.",
        welcome_buttons(),
    )
}

pub fn email_prompt(auth: AuthType) -> BotResponse {
    match auth {
        AuthType::Signup => BotResponse::text(
            "Great choice! Please enter your work email address so I can set up your account.",
        ),
        AuthType::Login => {
            BotResponse::text("Welcome back! Please enter your work email address to log in.")
        }
    }
}

/// Asks a consumer-domain user for their company. The address itself is not echoed.
pub fn company_prompt(_email: &str) -> BotResponse {
    BotResponse::text(
        "I see you're using a personal email address. Could you provide your company ID or \
         company domain? This helps us connect you to the right organization.",
    )
}

pub fn password_prompt(is_login: bool) -> BotResponse {
    if is_login {
        BotResponse::password("Please enter your current password to log in.")
    } else {
        BotResponse::password(
            "Now let's set up a secure password for your account. It should be at least 6 \
             characters and include a number or symbol.",
        )
    }
}

pub fn business_type_prompt() -> BotResponse {
    BotResponse::buttons(
        "Perfect! Now tell me about your business type so I can personalize your experience.",
        business_type_buttons(),
    )
}

pub fn company_size_prompt() -> BotResponse {
    BotResponse::buttons(
        "Great! What's your company size? This helps me tailor the platform features for you.",
        company_size_buttons(),
    )
}

pub fn use_case_prompt() -> BotResponse {
    BotResponse::buttons(
        "Almost done! What's your primary use case for our platform?",
        use_case_buttons(),
    )
}

/// Summarize the collected answers and ask for confirmation.
pub fn confirmation_message(user: &UserData) -> BotResponse {
    let missing = "—";
    let mut lines = vec![
        "Here's what I have:".to_string(),
        String::new(),
        format!("📧 Email: {}", user.email.as_deref().unwrap_or(missing)),
    ];
    if let Some(ref company) = user.company_id {
        lines.push(format!("🏢 Company ID: {company}"));
    }
    lines.push(format!(
        "💼 Business Type: {}",
        label_for(&business_type_buttons(), user.business_type.as_deref()).unwrap_or(missing)
    ));
    lines.push(format!(
        "👥 Company Size: {}",
        label_for(&company_size_buttons(), user.company_size.as_deref()).unwrap_or(missing)
    ));
    lines.push(format!(
        "🎯 Use Case: {}",
        label_for(&use_case_buttons(), user.use_case.as_deref()).unwrap_or(missing)
    ));
    lines.push(String::new());
    lines.push("Does everything look correct?".to_string());

    BotResponse::buttons(lines.join("\n"), confirmation_buttons())
}

pub fn completion_message(_user: &UserData) -> BotResponse {
    BotResponse::closing("🎉 Perfect! You're all set up and ready to go. Welcome aboard!")
}

/// Button set offered at `step`, empty for text and terminal steps.
pub fn buttons_for(step: FlowStep) -> Vec<ButtonOption> {
    match step {
        FlowStep::Welcome => welcome_buttons(),
        FlowStep::BusinessType => business_type_buttons(),
        FlowStep::CompanySize => company_size_buttons(),
        FlowStep::UseCase => use_case_buttons(),
        FlowStep::Confirmation => confirmation_buttons(),
        _ => Vec::new(),
    }
}

/// Find the button at `step` whose value is `value`.
pub fn find_button(step: FlowStep, value: &str) -> Option<ButtonOption> {
    buttons_for(step).into_iter().find(|b| b.value == value)
}

fn label_for<'a>(buttons: &'a [ButtonOption], value: Option<&'a str>) -> Option<&'a str> {
    let value = value?;
    Some(
        buttons
            .iter()
            .find(|b| b.value == value)
            .map(|b| b.label.as_str())
            .unwrap_or(value),
    )
}

fn welcome_buttons() -> Vec<ButtonOption> {
    vec![
        ButtonOption::new("login", "🔑 Log In", "login"),
        ButtonOption::new("signup", "✨ Sign Up", "signup"),
    ]
}

fn business_type_buttons() -> Vec<ButtonOption> {
    vec![
        ButtonOption::new("tech", "💻 Tech", "tech"),
        ButtonOption::new("finance", "💰 Finance", "finance"),
        ButtonOption::new("retail", "🛍️ Retail", "retail"),
        ButtonOption::new("healthcare", "🏥 Healthcare", "healthcare"),
    ]
}

fn company_size_buttons() -> Vec<ButtonOption> {
    vec![
        ButtonOption::new("small", "1–10", "1-10"),
        ButtonOption::new("medium", "11–50", "11-50"),
        ButtonOption::new("large", "51–200", "51-200"),
        ButtonOption::new("enterprise", "200+", "200+"),
    ]
}

fn use_case_buttons() -> Vec<ButtonOption> {
    vec![
        ButtonOption::new("data", "📊 Data Collection", "data-collection"),
        ButtonOption::new("support", "🎧 Customer Support", "customer-support"),
        ButtonOption::new("internal", "🛠️ Internal Tools", "internal-tools"),
        ButtonOption::new("analytics", "📈 Analytics", "analytics"),
    ]
}

fn confirmation_buttons() -> Vec<ButtonOption> {
    vec![
        ButtonOption::new("confirm", "✅ Confirm", "confirm"),
        ButtonOption::new("edit", "✏️ Edit", "edit"),
    ]
}
