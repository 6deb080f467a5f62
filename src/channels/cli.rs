//! CLI channel: stdin/stdout REPL that renders one onboarding session.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{ChannelError, OnboardingError};
use crate::onboarding::{ButtonOption, ChatSnapshot, InputKind, OnboardingSession};

/// A terminal front end for a single onboarding session.
///
/// Buttons are listed as `[1] label`; at a button step the user may type the
/// number, the value, or the label. `/quit` or EOF ends the loop.
pub struct CliChannel {
    session: Arc<OnboardingSession>,
}

impl CliChannel {
    pub fn new(session: Arc<OnboardingSession>) -> Self {
        Self { session }
    }

    /// Run against the process's stdin and stdout.
    pub async fn run(&self) -> Result<(), ChannelError> {
        let stdin = BufReader::new(tokio::io::stdin());
        self.run_with(stdin, tokio::io::stdout()).await
    }

    /// Run against arbitrary input and output streams.
    pub async fn run_with<R, W>(&self, reader: R, mut writer: W) -> Result<(), ChannelError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        let mut snapshot = match self.session.start().await {
            Ok(turn) => turn.snapshot,
            Err(e) => {
                tracing::warn!("Failed to start onboarding session: {}", e);
                self.session.snapshot().await
            }
        };
        let mut shown = render_new(&mut writer, &snapshot, 0).await?;

        while !snapshot.current_step.is_terminal() {
            writer.write_all(b"> ").await?;
            writer.flush().await?;

            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break, // EOF
                Err(e) => {
                    tracing::error!("Error reading input: {}", e);
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "/quit" {
                break;
            }

            let result = if snapshot.input_kind == InputKind::Buttons {
                match resolve_button(line, snapshot.active_buttons()) {
                    Some(value) => self.session.submit_button(&value).await,
                    None => {
                        writer
                            .write_all(b"Please pick one of the options above.\n")
                            .await?;
                        continue;
                    }
                }
            } else {
                self.session.submit_text(line).await
            };

            match result {
                Ok(turn) => snapshot = turn.snapshot,
                Err(OnboardingError::Busy) => {
                    writer.write_all(b"Still thinking, one moment...\n").await?;
                    continue;
                }
                Err(e) => {
                    writer.write_all(format!("Error: {e}\n").as_bytes()).await?;
                    continue;
                }
            }
            shown = render_new(&mut writer, &snapshot, shown).await?;
        }

        writer.flush().await?;
        Ok(())
    }
}

/// Write messages from index `shown` onward. Returns the new count shown.
async fn render_new<W>(
    writer: &mut W,
    snapshot: &ChatSnapshot,
    shown: usize,
) -> Result<usize, ChannelError>
where
    W: AsyncWrite + Unpin,
{
    for message in snapshot.messages.iter().skip(shown) {
        // The user's own turns are already on screen as typed input.
        if !message.is_bot {
            continue;
        }
        let mut out = format!("\n🤖 {}\n", message.content);
        if let Some(ref buttons) = message.buttons {
            for (i, button) in buttons.iter().enumerate() {
                out.push_str(&format!("   [{}] {}\n", i + 1, button.label));
            }
        }
        out.push('\n');
        writer.write_all(out.as_bytes()).await?;
    }
    writer.flush().await?;
    Ok(snapshot.messages.len())
}

/// Map typed input to a button value: a 1-based index, the value itself, or
/// the label (case-insensitive).
fn resolve_button(input: &str, buttons: &[ButtonOption]) -> Option<String> {
    if let Ok(index) = input.parse::<usize>() {
        if index >= 1 && index <= buttons.len() {
            return Some(buttons[index - 1].value.clone());
        }
    }
    buttons
        .iter()
        .find(|b| b.value.eq_ignore_ascii_case(input) || b.label.eq_ignore_ascii_case(input))
        .map(|b| b.value.clone())
}
