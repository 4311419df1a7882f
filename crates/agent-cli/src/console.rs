//! Terminal input and transcript rendering

use async_trait::async_trait;
use serde_json::Value;
use std::io::{BufRead, Write};
use tokio::sync::mpsc;

use agent_core::{Message, MessageContent, Notice, Role, TranscriptSink, UserInput};

/// Reads user lines from stdin, printing a prompt before each.
///
/// Lines are read on a dedicated thread, so nothing on the runtime ever blocks
/// on the terminal and an interrupted run can shut down while a read is pending.
pub struct StdinInput {
    lines: mpsc::Receiver<String>,
    prompt: bool,
}

impl StdinInput {
    pub fn new() -> Self {
        Self {
            prompt: true,
            ..Self::from_reader(std::io::BufReader::new(std::io::stdin()))
        }
    }

    /// Feed lines from any blocking reader. No prompt is printed.
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let spawned = std::thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || {
                for line in reader.lines() {
                    match line {
                        Ok(line) => {
                            if tx.blocking_send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to read user input");
                            break;
                        }
                    }
                }
            });
        // without a reader the receiver just reports end of input
        if let Err(e) = spawned {
            tracing::error!(error = %e, "Failed to start input reader");
        }

        Self {
            lines: rx,
            prompt: false,
        }
    }
}

#[async_trait]
impl UserInput for StdinInput {
    async fn next_line(&mut self) -> Option<String> {
        if self.prompt {
            print!("\nUser: ");
            let _ = std::io::stdout().flush();
        }
        self.lines.recv().await
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints the conversation as it grows
pub struct ConsoleTranscript;

impl ConsoleTranscript {
    fn render(message: &Message) -> Option<String> {
        match (&message.role, &message.content) {
            (Role::User, _) => None,
            (Role::SystemError, MessageContent::Text { text }) => Some(format!("[error] {text}")),
            (_, MessageContent::Text { text }) => Some(format!("\nAssistant: {text}")),
            (_, MessageContent::ToolUse { request }) => Some(format!(
                "[tool] {}({})",
                request.name,
                Value::Object(request.arguments.clone())
            )),
            (_, MessageContent::ToolResult { payload, .. }) => {
                let label = if payload.is_error { "tool error" } else { "result" };
                Some(format!("[{label}] {}", payload.text_content()))
            }
        }
    }
}

impl TranscriptSink for ConsoleTranscript {
    fn message(&self, message: &Message) {
        if let Some(line) = Self::render(message) {
            println!("{line}");
        }
    }

    fn notice(&self, notice: &Notice) {
        match notice {
            Notice::FollowUp(note) => println!("\nFollow-up: {note}"),
            Notice::LoopLimit { max } => println!(
                "\nReached maximum number of consecutive responses ({max}). Waiting for your input."
            ),
            Notice::Error(text) => println!("\nError: {text}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{ToolResultPayload, ToolUseRequest};
    use serde_json::json;

    #[tokio::test]
    async fn test_reader_lines_then_end() {
        let mut input = StdinInput::from_reader(std::io::Cursor::new("hi\n\nquit\n"));
        assert_eq!(input.next_line().await.as_deref(), Some("hi"));
        assert_eq!(input.next_line().await.as_deref(), Some(""));
        assert_eq!(input.next_line().await.as_deref(), Some("quit"));
        assert_eq!(input.next_line().await, None);
    }

    #[test]
    fn test_render() {
        assert_eq!(ConsoleTranscript::render(&Message::user("hi")), None);
        assert_eq!(
            ConsoleTranscript::render(&Message::assistant("Done.")).as_deref(),
            Some("\nAssistant: Done.")
        );

        let call = ToolUseRequest::new(
            "get_order_by_id",
            json!({"order_id": "24601"}).as_object().cloned().unwrap(),
        );
        assert_eq!(
            ConsoleTranscript::render(&Message::tool_use(call)).as_deref(),
            Some(r#"[tool] get_order_by_id({"order_id":"24601"})"#)
        );

        let failed = Message::tool_result("t1", ToolResultPayload::error("Tool not found: x"));
        assert_eq!(
            ConsoleTranscript::render(&failed).as_deref(),
            Some("[tool error] Tool not found: x")
        );
    }
}
