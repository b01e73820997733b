//! Confirm/prompt dialogs as request-response messages
//!
//! Code that needs an answer holds a `Dialogs` handle and awaits it; whoever
//! presents dialogs drains the `DialogReceiver` and answers each request
//! through its `oneshot` responder. A dropped responder counts as cancel.

use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub enum DialogRequest {
    Confirm {
        message: String,
        respond: oneshot::Sender<bool>,
    },
    Prompt {
        message: String,
        default: String,
        respond: oneshot::Sender<Option<String>>,
    },
}

impl DialogRequest {
    pub fn message(&self) -> &str {
        match self {
            DialogRequest::Confirm { message, .. } | DialogRequest::Prompt { message, .. } => {
                message
            }
        }
    }

    /// Answer with the raw text typed by the user.
    ///
    /// Confirm accepts `y`/`yes`; a prompt takes the text, falling back to
    /// the default when blank.
    pub fn answer(self, input: &str) {
        let input = input.trim();
        match self {
            DialogRequest::Confirm { respond, .. } => {
                let yes = matches!(input.to_ascii_lowercase().as_str(), "y" | "yes");
                let _ = respond.send(yes);
            }
            DialogRequest::Prompt {
                default, respond, ..
            } => {
                let value = if input.is_empty() {
                    default
                } else {
                    input.to_string()
                };
                let _ = respond.send(Some(value));
            }
        }
    }

    pub fn cancel(self) {
        match self {
            DialogRequest::Confirm { respond, .. } => {
                let _ = respond.send(false);
            }
            DialogRequest::Prompt { respond, .. } => {
                let _ = respond.send(None);
            }
        }
    }
}

pub type DialogReceiver = mpsc::UnboundedReceiver<DialogRequest>;

#[derive(Debug, Clone)]
pub struct Dialogs {
    tx: mpsc::UnboundedSender<DialogRequest>,
}

impl Dialogs {
    pub fn channel() -> (Self, DialogReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub async fn confirm(&self, message: impl Into<String>) -> bool {
        let (respond, answer) = oneshot::channel();
        let request = DialogRequest::Confirm {
            message: message.into(),
            respond,
        };
        if self.tx.send(request).is_err() {
            return false;
        }
        answer.await.unwrap_or(false)
    }

    pub async fn prompt(&self, message: impl Into<String>, default: impl Into<String>) -> Option<String> {
        let (respond, answer) = oneshot::channel();
        let request = DialogRequest::Prompt {
            message: message.into(),
            default: default.into(),
            respond,
        };
        if self.tx.send(request).is_err() {
            return None;
        }
        answer.await.ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_confirm_roundtrip() {
        let (dialogs, mut rx) = Dialogs::channel();
        let waiter = tokio::spawn(async move { dialogs.confirm("Clear playlist?").await });

        let request = rx.recv().await.unwrap();
        assert_eq!(request.message(), "Clear playlist?");
        request.answer("Yes");
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_prompt_default_and_cancel() {
        let (dialogs, mut rx) = Dialogs::channel();
        let d = dialogs.clone();
        let waiter = tokio::spawn(async move { d.prompt("Title", "Old").await });
        rx.recv().await.unwrap().answer("  ");
        assert_eq!(waiter.await.unwrap().as_deref(), Some("Old"));

        let d = dialogs.clone();
        let waiter = tokio::spawn(async move { d.prompt("Title", "Old").await });
        rx.recv().await.unwrap().cancel();
        assert_eq!(waiter.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_dropped_responder_is_cancel() {
        let (dialogs, mut rx) = Dialogs::channel();
        let waiter = tokio::spawn(async move { dialogs.confirm("Sure?").await });
        drop(rx.recv().await.unwrap());
        assert!(!waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_no_presenter() {
        let (dialogs, rx) = Dialogs::channel();
        drop(rx);
        assert!(!dialogs.confirm("Anyone?").await);
        assert_eq!(dialogs.prompt("Name", "x").await, None);
    }
}
