//! # trialmatch llm
//!
//! [`ClauseJudge`](trialmatch_core::ClauseJudge) backed by an OpenAI-compatible chat
//! completions endpoint.

pub mod judge;
pub mod prompt;
pub mod select;

pub use judge::{ChatConfig, ChatJudge};
pub use prompt::{build_prompt, interpret_reply};
pub use select::{build_judge, JudgeKind};

use thiserror::Error;

/// Default chat completions API root.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model name.
pub const DEFAULT_LLM_MODEL: &str = "gpt-4-0613";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("model endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode model reply: {0}")]
    Decode(String),
    #[error("reply had no choices")]
    EmptyReply,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<LlmError> for trialmatch_core::MatchError {
    fn from(err: LlmError) -> Self {
        trialmatch_core::MatchError::JudgmentUnavailable(err.to_string())
    }
}

pub type LlmResult<T> = std::result::Result<T, LlmError>;
