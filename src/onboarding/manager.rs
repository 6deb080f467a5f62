//! OnboardingSession: owns one conversation's state and drives it through
//! the reducer and the response catalog.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::machine::{self, ChatEvent, Rejection};
use super::model::{ChatSnapshot, ChatState, UserData};
use super::prompts::ResponseCatalog;
use super::state::FlowStep;
use crate::error::OnboardingError;

/// Result of one user turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    #[serde(flatten)]
    pub snapshot: ChatSnapshot,
    /// Set when the input did not advance the conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

/// Compact status for listings and health output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStatus {
    pub session_id: Uuid,
    pub current_step: FlowStep,
    pub onboarding_completed: bool,
    pub message_count: usize,
}

/// A single onboarding conversation.
///
/// At most one bot response is generated at a time: while one is pending the
/// state is flagged as loading and further submissions fail with
/// [`OnboardingError::Busy`]. The pending response is produced by a spawned
/// task, so dropping a caller mid-turn still clears the flag.
pub struct OnboardingSession {
    id: Uuid,
    catalog: Arc<dyn ResponseCatalog>,
    state: Arc<RwLock<ChatState>>,
    last_active: RwLock<Instant>,
}

impl OnboardingSession {
    pub fn new(catalog: Arc<dyn ResponseCatalog>) -> Self {
        Self {
            id: Uuid::new_v4(),
            catalog,
            state: Arc::new(RwLock::new(ChatState::new())),
            last_active: RwLock::new(Instant::now()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Render the welcome message if the conversation is still empty.
    pub async fn start(&self) -> Result<TurnResult, OnboardingError> {
        self.dispatch(ChatEvent::Start).await
    }

    pub async fn submit_text(&self, text: &str) -> Result<TurnResult, OnboardingError> {
        self.dispatch(ChatEvent::Text(text.to_string())).await
    }

    pub async fn submit_button(&self, value: &str) -> Result<TurnResult, OnboardingError> {
        self.dispatch(ChatEvent::Button(value.to_string())).await
    }

    pub async fn snapshot(&self) -> ChatSnapshot {
        let state = self.state.read().await;
        ChatSnapshot::from_state(self.id, &state)
    }

    pub async fn current_step(&self) -> FlowStep {
        self.state.read().await.current_step
    }

    pub async fn status(&self) -> OnboardingStatus {
        let state = self.state.read().await;
        OnboardingStatus {
            session_id: self.id,
            current_step: state.current_step,
            onboarding_completed: state.user_data.is_complete,
            message_count: state.messages.len(),
        }
    }

    /// Time since the last submission (or creation).
    pub async fn idle_for(&self) -> std::time::Duration {
        self.last_active.read().await.elapsed()
    }

    /// Apply one event and, if a step was entered, append its bot response.
    async fn dispatch(&self, event: ChatEvent) -> Result<TurnResult, OnboardingError> {
        *self.last_active.write().await = Instant::now();

        // Reduce under the lock, then release it while the response is fetched
        // so readers can observe `is_loading`.
        let (entered, rejection) = {
            let mut state = self.state.write().await;
            let current = std::mem::take(&mut *state);
            let outcome = machine::reduce(current, event);
            *state = outcome.state;

            if outcome.rejection == Some(Rejection::Busy) {
                return Err(OnboardingError::Busy);
            }
            if let Some(rejection) = outcome.rejection {
                debug!(
                    session_id = %self.id,
                    step = %state.current_step,
                    %rejection,
                    "Input did not advance onboarding"
                );
            }

            let entered = outcome.entered.map(|step| {
                machine::begin_response(&mut state);
                (step, state.user_data.clone())
            });
            (entered, outcome.rejection)
        };

        if let Some((step, user_data)) = entered {
            info!(session_id = %self.id, %step, "Entered onboarding step");
            // No await between `begin_response` and the spawn: once loading is
            // set, the task below is the only thing that clears it.
            let pending = tokio::spawn(respond_and_finish(
                self.id,
                Arc::clone(&self.catalog),
                Arc::clone(&self.state),
                step,
                user_data,
            ));
            if let Err(e) = pending.await {
                // Panicked; clear the flag if nothing was appended.
                warn!(session_id = %self.id, %step, "Response task failed: {}", e);
                let mut state = self.state.write().await;
                if state.is_loading {
                    machine::finish_response(
                        &mut state,
                        Err(OnboardingError::Generation(e.to_string())),
                    );
                }
            }
        }

        Ok(TurnResult {
            snapshot: self.snapshot().await,
            rejection,
        })
    }
}

/// Fetch the response for `step` and append it, re-enabling input.
async fn respond_and_finish(
    session_id: Uuid,
    catalog: Arc<dyn ResponseCatalog>,
    state: Arc<RwLock<ChatState>>,
    step: FlowStep,
    user_data: UserData,
) {
    let result = catalog.respond(step, &user_data).await;
    if let Err(ref e) = result {
        warn!(%session_id, %step, "Failed to build bot response: {}", e);
    }
    let mut state = state.write().await;
    machine::finish_response(&mut state, result);
    if state.current_step.is_terminal() {
        info!(%session_id, "Onboarding complete");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::onboarding::prompts::{BotResponse, CannedCatalog, APOLOGY_MESSAGE};

    fn session() -> OnboardingSession {
        OnboardingSession::new(Arc::new(CannedCatalog))
    }

    /// Catalog that fails for one step and defers to the canned table otherwise.
    struct FailingAt(FlowStep);

    #[async_trait]
    impl ResponseCatalog for FailingAt {
        async fn respond(
            &self,
            step: FlowStep,
            user: &UserData,
        ) -> Result<BotResponse, OnboardingError> {
            if step == self.0 {
                return Err(OnboardingError::Generation("catalog offline".into()));
            }
            CannedCatalog.respond(step, user).await
        }
    }

    /// Catalog that blocks until released, to observe the loading flag.
    struct Gated {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ResponseCatalog for Gated {
        async fn respond(
            &self,
            step: FlowStep,
            user: &UserData,
        ) -> Result<BotResponse, OnboardingError> {
            self.release.notified().await;
            CannedCatalog.respond(step, user).await
        }
    }

    #[tokio::test]
    async fn start_renders_welcome_once() {
        let s = session();
        let first = s.start().await.unwrap();
        assert_eq!(first.snapshot.messages.len(), 1);
        assert_eq!(first.snapshot.current_step, FlowStep::Welcome);

        let second = s.start().await.unwrap();
        assert_eq!(second.rejection, Some(Rejection::AlreadyStarted));
        assert_eq!(second.snapshot.messages.len(), 1);
    }

    #[tokio::test]
    async fn signup_then_generic_email() {
        let s = session();
        s.start().await.unwrap();
        s.submit_button("signup").await.unwrap();
        assert_eq!(s.current_step().await, FlowStep::EmailInput);

        let turn = s.submit_text("bob@gmail.com").await.unwrap();
        assert_eq!(turn.snapshot.current_step, FlowStep::CompanyCheck);
        assert!(turn.rejection.is_none());
    }

    #[tokio::test]
    async fn full_flow_completes() {
        let s = session();
        s.start().await.unwrap();
        s.submit_button("signup").await.unwrap();
        s.submit_text("bob@acme.io").await.unwrap();
        let weak = s.submit_text("abc").await.unwrap();
        assert_eq!(weak.rejection, Some(Rejection::WeakPassword));
        assert_eq!(weak.snapshot.current_step, FlowStep::PasswordInput);
        s.submit_text("abc123").await.unwrap();
        s.submit_button("tech").await.unwrap();
        s.submit_button("11-50").await.unwrap();
        s.submit_button("analytics").await.unwrap();
        let done = s.submit_button("confirm").await.unwrap();

        assert_eq!(done.snapshot.current_step, FlowStep::Complete);
        assert!(done.snapshot.user_data.is_complete);
        let status = s.status().await;
        assert!(status.onboarding_completed);
        assert_eq!(status.message_count, done.snapshot.messages.len());
    }

    #[tokio::test]
    async fn catalog_failure_yields_apology() {
        let s = OnboardingSession::new(Arc::new(FailingAt(FlowStep::PasswordInput)));
        s.start().await.unwrap();
        s.submit_button("signup").await.unwrap();
        let turn = s.submit_text("bob@acme.io").await.unwrap();

        let last = turn.snapshot.messages.last().unwrap();
        assert!(last.is_bot);
        assert_eq!(last.content, APOLOGY_MESSAGE);
        assert_eq!(turn.snapshot.current_step, FlowStep::PasswordInput);
        assert!(!turn.snapshot.is_loading);

        // The step still accepts input after the apology.
        let next = s.submit_text("abc123").await.unwrap();
        assert_eq!(next.snapshot.current_step, FlowStep::BusinessType);
    }

    #[tokio::test]
    async fn submissions_refused_while_loading() {
        let release = Arc::new(Notify::new());
        let s = Arc::new(OnboardingSession::new(Arc::new(Gated {
            release: Arc::clone(&release),
        })));

        let starter = {
            let s = Arc::clone(&s);
            tokio::spawn(async move { s.start().await })
        };

        // Wait for the start call to reach the catalog.
        while !s.snapshot().await.is_loading {
            tokio::task::yield_now().await;
        }
        let busy = s.submit_button("signup").await;
        assert!(matches!(busy, Err(OnboardingError::Busy)));

        release.notify_one();
        let started = starter.await.unwrap().unwrap();
        assert!(!started.snapshot.is_loading);
        assert_eq!(started.snapshot.messages.len(), 1);
    }

    #[tokio::test]
    async fn dropped_caller_does_not_leave_session_busy() {
        let release = Arc::new(Notify::new());
        let s = Arc::new(OnboardingSession::new(Arc::new(Gated {
            release: Arc::clone(&release),
        })));

        let starter = {
            let s = Arc::clone(&s);
            tokio::spawn(async move { s.start().await })
        };
        while !s.snapshot().await.is_loading {
            tokio::task::yield_now().await;
        }

        // Abandon the turn while its response is pending, like a disconnected
        // HTTP client, then let the catalog answer.
        starter.abort();
        assert!(starter.await.unwrap_err().is_cancelled());
        release.notify_one();

        tokio::time::timeout(Duration::from_secs(5), async {
            while s.snapshot().await.is_loading {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("loading flag never cleared");

        let snapshot = s.snapshot().await;
        assert_eq!(snapshot.messages.len(), 1);
        assert!(snapshot.messages[0].is_bot);

        // Next turn goes through normally.
        release.notify_one();
        let turn = s.submit_button("signup").await.unwrap();
        assert_eq!(turn.snapshot.current_step, FlowStep::EmailInput);
        assert!(!turn.snapshot.is_loading);
    }

    #[tokio::test]
    async fn snapshot_hides_password() {
        let s = session();
        s.start().await.unwrap();
        s.submit_button("signup").await.unwrap();
        s.submit_text("bob@acme.io").await.unwrap();
        s.submit_text("s3cret-pass").await.unwrap();

        let json = serde_json::to_string(&s.snapshot().await).unwrap();
        assert!(!json.contains("s3cret-pass"));
        assert!(json.contains("\"hasPassword\":true"));
    }
}
