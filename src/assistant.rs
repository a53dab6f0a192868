//! Conversational client for an OpenAI-compatible chat completions API.
//!
//! Each call is a single exchange: the channel's instruction plus the user's
//! text. Nothing else from earlier calls is sent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::RemoteServiceError;
use crate::http::{join, read_json, session, transport};

pub const SERVICE: &str = "openai";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Shown instead of a reply whenever the service fails.
pub const APOLOGY: &str =
    "Sorry, I can't answer right now. Please try again in a little while, or use /text and /search to study directly.";

pub const DEFAULT_INSTRUCTION: &str = "You are a knowledgeable and respectful study companion for Jewish texts. \
Answer questions about Torah, Talmud, Mishnah, halacha and Jewish thought clearly and concisely. \
Cite sources by their Sefaria reference (for example Genesis 1:1 or Berakhot 2a) when you can. \
If you are unsure, say so and suggest asking a rabbi. Keep answers under 1500 characters.";

const MAX_TOKENS: u32 = 500;

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct Client {
    api_key: String,
    base_url: String,
    model: String,
    http: reqwest::Client,
    /// Per-channel instruction overrides. In memory only.
    instructions: RwLock<HashMap<u64, String>>,
}

impl Client {
    pub fn new(api_key: String, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            model: model.into(),
            http: session(),
            instructions: RwLock::new(HashMap::new()),
        }
    }

    /// The instruction in effect for a channel.
    pub async fn instruction(&self, channel_id: u64) -> String {
        self.instructions
            .read()
            .await
            .get(&channel_id)
            .cloned()
            .unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string())
    }

    pub async fn set_instruction(&self, channel_id: u64, instruction: impl Into<String>) {
        let instruction = instruction.into();
        info!("📝 New instruction for channel {channel_id} ({} chars)", instruction.chars().count());
        self.instructions.write().await.insert(channel_id, instruction);
    }

    /// Send the channel's instruction and `user_text`, returning the reply text.
    pub async fn converse(&self, channel_id: u64, user_text: &str) -> Result<String, RemoteServiceError> {
        let instruction = self.instruction(channel_id).await;

        let request = ApiRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![
                ApiMessage {
                    role: "system",
                    content: &instruction,
                },
                ApiMessage {
                    role: "user",
                    content: user_text,
                },
            ],
        };

        debug!("Conversing in channel {channel_id}: {} chars", user_text.chars().count());

        let response = self
            .http
            .post(join(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport(SERVICE))?;

        let api_response: ApiResponse = read_json(SERVICE, response).await?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(RemoteServiceError::Empty { service: SERVICE })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(server: &mockito::Server) -> Client {
        Client::new("test-key".to_string(), server.url(), DEFAULT_MODEL)
    }

    fn completion(text: &str) -> String {
        serde_json::json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_converse_sends_instruction_and_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": DEFAULT_MODEL,
                "messages": [
                    {"role": "system", "content": DEFAULT_INSTRUCTION},
                    {"role": "user", "content": "What is Shabbat?"}
                ]
            })))
            .with_status(200)
            .with_body(completion("  A day of rest.  "))
            .create_async()
            .await;

        let reply = client(&server).converse(1, "What is Shabbat?").await.unwrap();
        assert_eq!(reply, "A day of rest.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_instruction_is_per_channel() {
        let server = mockito::Server::new_async().await;
        let client = client(&server);

        client.set_instruction(7, "Answer in rhyme.").await;
        assert_eq!(client.instruction(7).await, "Answer in rhyme.");
        assert_eq!(client.instruction(8).await, DEFAULT_INSTRUCTION);
    }

    #[tokio::test]
    async fn test_custom_instruction_is_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "hi"}
                ]
            })))
            .with_status(200)
            .with_body(completion("ok"))
            .create_async()
            .await;

        let client = client(&server);
        client.set_instruction(42, "Be brief.").await;
        client.converse(42, "hi").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_quota_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error": {"message": "quota exceeded"}}"#)
            .create_async()
            .await;

        let err = client(&server).converse(1, "hi").await.unwrap_err();
        assert_eq!(err.status(), Some(429));
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let err = client(&server).converse(1, "hi").await.unwrap_err();
        assert!(matches!(err, RemoteServiceError::Empty { .. }));
    }
}
