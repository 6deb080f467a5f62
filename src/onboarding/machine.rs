//! Pure transition function for the onboarding conversation.
//!
//! [`reduce`] takes the current [`ChatState`] and one user event and returns
//! the next state plus the step that was entered, if any. Fetching the bot
//! response for an entered step is left to the caller (see
//! [`super::manager::OnboardingSession`]), which then calls
//! [`begin_response`] and [`finish_response`].

use secrecy::SecretString;
use serde::Serialize;

use super::model::{ChatState, Message};
use super::prompts::{
    self, BotResponse, APOLOGY_MESSAGE, EDIT_NOTICE_MESSAGE, INVALID_EMAIL_MESSAGE,
    LOGIN_STUB_MESSAGE, WEAK_PASSWORD_MESSAGE,
};
use super::state::{FlowStep, InputKind};
use super::validation::{is_generic_domain, is_valid_email, is_valid_password};
use crate::error::OnboardingError;

/// Something the user (or the presentation layer) did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// First activation of an empty conversation.
    Start,
    /// Free-text submission.
    Text(String),
    /// Button click, carrying the button's `value`.
    Button(String),
}

/// Why an event did not advance the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// A response is being generated; nothing was changed.
    Busy,
    /// `Start` on a conversation that already has messages.
    AlreadyStarted,
    /// Blank text; nothing was logged.
    EmptyInput,
    /// Bad email format; the user was re-prompted.
    InvalidEmail,
    /// Password too weak; the user was re-prompted.
    WeakPassword,
    /// Button value not offered at the current step; nothing was changed.
    UnknownButton,
    /// Text at a button step, or a button at a text step.
    UnexpectedInput,
    /// The conversation is complete; nothing was changed.
    Terminal,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Busy => "busy",
            Self::AlreadyStarted => "already_started",
            Self::EmptyInput => "empty_input",
            Self::InvalidEmail => "invalid_email",
            Self::WeakPassword => "weak_password",
            Self::UnknownButton => "unknown_button",
            Self::UnexpectedInput => "unexpected_input",
            Self::Terminal => "terminal",
        };
        write!(f, "{s}")
    }
}

/// Result of applying one event.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub state: ChatState,
    /// Step that was entered and still needs its bot response.
    pub entered: Option<FlowStep>,
    pub rejection: Option<Rejection>,
}

impl Outcome {
    fn entered(state: ChatState, step: FlowStep) -> Self {
        Self {
            state,
            entered: Some(step),
            rejection: None,
        }
    }

    fn stayed(state: ChatState) -> Self {
        Self {
            state,
            entered: None,
            rejection: None,
        }
    }

    fn rejected(state: ChatState, rejection: Rejection) -> Self {
        Self {
            state,
            entered: None,
            rejection: Some(rejection),
        }
    }
}

/// Apply `event` to `state`.
///
/// User data fields are recorded exactly when their step is passed, the
/// message log is only appended to, and no step is ever revisited.
pub fn reduce(state: ChatState, event: ChatEvent) -> Outcome {
    if state.is_loading {
        return Outcome::rejected(state, Rejection::Busy);
    }
    if state.current_step.is_terminal() {
        return Outcome::rejected(state, Rejection::Terminal);
    }

    match event {
        ChatEvent::Start => {
            if state.messages.is_empty() && state.current_step == FlowStep::Welcome {
                Outcome::entered(state, FlowStep::Welcome)
            } else {
                Outcome::rejected(state, Rejection::AlreadyStarted)
            }
        }
        ChatEvent::Text(text) => handle_text(state, text.trim()),
        ChatEvent::Button(value) => handle_button(state, value.trim()),
    }
}

fn handle_text(mut state: ChatState, text: &str) -> Outcome {
    if text.is_empty() {
        return Outcome::rejected(state, Rejection::EmptyInput);
    }

    let step = state.current_step;
    if step == FlowStep::PasswordInput {
        state.push(Message::user(mask(text)));
    } else {
        state.push(Message::user(text));
    }

    match step {
        FlowStep::EmailInput => {
            if !is_valid_email(text) {
                state.push(Message::bot(INVALID_EMAIL_MESSAGE));
                return Outcome::rejected(state, Rejection::InvalidEmail);
            }
            state.user_data.email = Some(text.to_string());
            let next = if is_generic_domain(text) {
                FlowStep::CompanyCheck
            } else {
                FlowStep::PasswordInput
            };
            advance(state, next)
        }
        FlowStep::CompanyCheck => {
            state.user_data.company_id = Some(text.to_string());
            advance(state, FlowStep::PasswordInput)
        }
        FlowStep::PasswordInput => {
            if !is_valid_password(text) {
                state.push(Message::bot(WEAK_PASSWORD_MESSAGE));
                return Outcome::rejected(state, Rejection::WeakPassword);
            }
            state.user_data.password = Some(SecretString::from(text.to_string()));
            advance(state, FlowStep::BusinessType)
        }
        // Button-driven steps: the text stays in the log but changes nothing.
        _ => Outcome::rejected(state, Rejection::UnexpectedInput),
    }
}

fn handle_button(mut state: ChatState, value: &str) -> Outcome {
    let step = state.current_step;
    if step.input_kind() != InputKind::Buttons {
        return Outcome::rejected(state, Rejection::UnexpectedInput);
    }
    let Some(button) = prompts::find_button(step, value) else {
        return Outcome::rejected(state, Rejection::UnknownButton);
    };

    state.push(Message::user(button.label.as_str()));

    match step {
        FlowStep::Welcome => {
            if button.value == "login" {
                state.push(Message::bot(LOGIN_STUB_MESSAGE));
            }
            advance(state, FlowStep::EmailInput)
        }
        FlowStep::BusinessType => {
            state.user_data.business_type = Some(button.value);
            advance(state, FlowStep::CompanySize)
        }
        FlowStep::CompanySize => {
            state.user_data.company_size = Some(button.value);
            advance(state, FlowStep::UseCase)
        }
        FlowStep::UseCase => {
            state.user_data.use_case = Some(button.value);
            advance(state, FlowStep::Confirmation)
        }
        FlowStep::Confirmation if button.value == "confirm" => {
            state.user_data.is_complete = true;
            advance(state, FlowStep::Complete)
        }
        FlowStep::Confirmation => {
            state.push(Message::bot(EDIT_NOTICE_MESSAGE));
            Outcome::stayed(state)
        }
        _ => Outcome::rejected(state, Rejection::UnexpectedInput),
    }
}

fn advance(mut state: ChatState, next: FlowStep) -> Outcome {
    debug_assert!(
        state.current_step.can_transition_to(next),
        "undefined transition {} -> {}",
        state.current_step,
        next
    );
    state.current_step = next;
    Outcome::entered(state, next)
}

fn mask(text: &str) -> String {
    "•".repeat(text.chars().count())
}

/// Mark the state as waiting on a bot response.
pub fn begin_response(state: &mut ChatState) {
    state.is_loading = true;
}

/// Append the fetched bot response, or the apology if fetching failed, and
/// re-enable input.
pub fn finish_response(state: &mut ChatState, result: Result<BotResponse, OnboardingError>) {
    let message = match result {
        Ok(response) => Message::bot_with_buttons(response.message, response.buttons),
        Err(_) => Message::bot(APOLOGY_MESSAGE),
    };
    state.push(message);
    state.is_loading = false;
}
