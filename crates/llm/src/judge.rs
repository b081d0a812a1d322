//! Chat-completions clause judge.

use crate::prompt::{build_prompt, interpret_reply, SYSTEM_PROMPT};
use crate::{LlmError, LlmResult, DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use trialmatch_core::{ClauseJudge, ClinicalFacts, Judgment, MatchResult};

const TEMPERATURE: f32 = 0.3;

/// Connection settings for [`ChatJudge`].
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// API root; `/chat/completions` is appended.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChoiceWire>,
}

#[derive(Deserialize)]
struct ChoiceWire {
    message: MessageWire,
}

#[derive(Deserialize)]
struct MessageWire {
    #[serde(default)]
    content: Option<String>,
}

/// Judge that asks a chat model whether the patient meets each exclusion clause.
#[derive(Debug, Clone)]
pub struct ChatJudge {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
}

impl ChatJudge {
    pub fn new(cfg: ChatConfig) -> LlmResult<Self> {
        let root = cfg.base_url.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{root}/chat/completions"))
            .map_err(|e| LlmError::InvalidUrl(format!("{}: {e}", cfg.base_url)))?;

        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| LlmError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            model: cfg.model,
            api_key: cfg.api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends one prompt and returns the first choice's text.
    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
        };

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;
        reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or(LlmError::EmptyReply)
    }
}

#[async_trait]
impl ClauseJudge for ChatJudge {
    async fn judge(&self, clause: &str, facts: ClinicalFacts<'_>) -> MatchResult<Judgment> {
        let prompt = build_prompt(clause, facts);
        let reply = self.complete(&prompt).await?;
        let judgment = interpret_reply(&reply);
        tracing::debug!(clause, ?judgment, "model judged clause");
        Ok(judgment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_chat_completions() {
        let judge = ChatJudge::new(ChatConfig {
            base_url: "http://localhost:11434/v1/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            judge.endpoint().as_str(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn rejects_unparsable_base_url() {
        let err = ChatJudge::new(ChatConfig {
            base_url: "not a url".into(),
            ..Default::default()
        });
        assert!(matches!(err, Err(LlmError::InvalidUrl(_))));
    }

    #[test]
    fn request_body_matches_chat_completions_shape() {
        let body = ChatRequest {
            model: "gpt-4-0613",
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: "is the patient a smoker?",
                },
            ],
            temperature: TEMPERATURE,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "gpt-4-0613");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "is the patient a smoker?");
        assert!((value["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }
}
