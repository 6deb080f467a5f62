//! Chat message and user data models.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use super::state::{FlowStep, InputKind};
use super::validation::generate_message_id;

/// A selectable reply offered alongside a bot message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonOption {
    pub id: String,
    /// Display text.
    pub label: String,
    /// Token sent back when the button is clicked.
    pub value: String,
}

impl ButtonOption {
    pub fn new(id: &str, label: &str, value: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

/// One entry in the chat log. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: String,
    pub is_bot: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<ButtonOption>>,
}

impl Message {
    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(content.into(), true, None)
    }

    pub fn bot_with_buttons(
        content: impl Into<String>,
        buttons: Option<Vec<ButtonOption>>,
    ) -> Self {
        Self::new(content.into(), true, buttons)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content.into(), false, None)
    }

    fn new(content: String, is_bot: bool, buttons: Option<Vec<ButtonOption>>) -> Self {
        Self {
            id: generate_message_id(),
            content,
            is_bot,
            timestamp: Utc::now(),
            buttons,
        }
    }
}

/// Answers collected during onboarding.
///
/// Each field is filled once, when its step is passed. The password is kept
/// as a secret: it is never serialized, only its presence (`hasPassword`).
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "hasPassword", serialize_with = "serialize_presence")]
    pub password: Option<SecretString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_case: Option<String>,
    pub is_complete: bool,
}

fn serialize_presence<S: Serializer>(
    value: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_bool(value.is_some())
}

impl Clone for UserData {
    fn clone(&self) -> Self {
        Self {
            email: self.email.clone(),
            password: self
                .password
                .as_ref()
                .map(|p| SecretString::from(p.expose_secret().to_string())),
            company_id: self.company_id.clone(),
            business_type: self.business_type.clone(),
            company_size: self.company_size.clone(),
            use_case: self.use_case.clone(),
            is_complete: self.is_complete,
        }
    }
}

/// The whole state of one onboarding conversation.
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    /// Append-only log, in insertion order.
    pub messages: Vec<Message>,
    pub current_step: FlowStep,
    pub user_data: UserData,
    /// True while a bot response is being generated; input is refused.
    pub is_loading: bool,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

/// Read-only view of a session handed to presentation layers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSnapshot {
    pub session_id: uuid::Uuid,
    pub messages: Vec<Message>,
    pub current_step: FlowStep,
    pub input_kind: InputKind,
    pub user_data: UserData,
    pub is_loading: bool,
}

impl ChatSnapshot {
    pub fn from_state(session_id: uuid::Uuid, state: &ChatState) -> Self {
        Self {
            session_id,
            messages: state.messages.clone(),
            current_step: state.current_step,
            input_kind: state.current_step.input_kind(),
            user_data: state.user_data.clone(),
            is_loading: state.is_loading,
        }
    }

    /// The buttons on the most recent bot message, if any.
    pub fn active_buttons(&self) -> &[ButtonOption] {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_bot)
            .and_then(|m| m.buttons.as_deref())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_camel_case() {
        let msg = Message::bot_with_buttons(
            "Pick one",
            Some(vec![ButtonOption::new("tech", "💻 Tech", "tech")]),
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["isBot"], true);
        assert_eq!(json["content"], "Pick one");
        assert_eq!(json["buttons"][0]["value"], "tech");
        assert!(json["id"].as_str().unwrap().starts_with("msg_"));
    }

    #[test]
    fn message_without_buttons_omits_field() {
        let json = serde_json::to_value(Message::user("hello")).unwrap();
        assert_eq!(json["isBot"], false);
        assert!(json.get("buttons").is_none());
    }

    #[test]
    fn user_data_never_serializes_password() {
        let data = UserData {
            email: Some("bob@acme.io".to_string()),
            password: Some(SecretString::from("hunter2!".to_string())),
            ..Default::default()
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(!json.contains("hunter2"));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["hasPassword"], true);
        assert_eq!(value["email"], "bob@acme.io");
        assert_eq!(value["isComplete"], false);
        assert!(value.get("companyId").is_none());
    }

    #[test]
    fn user_data_debug_redacts_password() {
        let data = UserData {
            password: Some(SecretString::from("hunter2!".to_string())),
            ..Default::default()
        };
        assert!(!format!("{data:?}").contains("hunter2"));
    }

    #[test]
    fn user_data_clone_keeps_password() {
        let data = UserData {
            password: Some(SecretString::from("abc123".to_string())),
            ..Default::default()
        };
        let cloned = data.clone();
        assert_eq!(cloned.password.unwrap().expose_secret(), "abc123");
    }

    #[test]
    fn active_buttons_follow_latest_bot_message() {
        let id = uuid::Uuid::new_v4();
        let mut state = ChatState::new();
        assert!(ChatSnapshot::from_state(id, &state).active_buttons().is_empty());

        state.push(Message::bot_with_buttons(
            "choose",
            Some(vec![ButtonOption::new("a", "A", "a")]),
        ));
        state.push(Message::user("A"));
        assert_eq!(ChatSnapshot::from_state(id, &state).active_buttons().len(), 1);

        state.push(Message::bot("no buttons now"));
        assert!(ChatSnapshot::from_state(id, &state).active_buttons().is_empty());
    }
}
