use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Role / Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A role-tagged prompt segment sent to the evaluation capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// CompletionRequest
// ---------------------------------------------------------------------------

/// One request to the evaluation capability: a role-tagged prompt plus
/// generation parameters. The response is a single completion slot.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Transport timeout for this request. A timeout is treated like any
    /// other transport failure by the caller.
    pub timeout: Duration,
}

impl CompletionRequest {
    /// Single user-prompt request with the given generation parameters.
    pub fn user_prompt(
        prompt: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
            max_tokens,
            temperature,
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let msg = Message::system("You are a reviewer.");
        assert_eq!(msg.role, Role::System);
        assert_eq!(msg.content, "You are a reviewer.");

        let msg = Message::user("Review this.");
        assert_eq!(msg.role, Role::User);
    }

    #[test]
    fn role_serializes_to_snake_case() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn user_prompt_builds_single_message() {
        let req = CompletionRequest::user_prompt("hi", 400, 0.2, Duration::from_secs(60));
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].role, Role::User);
        assert_eq!(req.max_tokens, 400);
        assert_eq!(req.timeout, Duration::from_secs(60));
    }
}
