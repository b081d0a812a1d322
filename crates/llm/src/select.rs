//! Judge selection by name.

use crate::judge::{ChatConfig, ChatJudge};
use crate::LlmResult;
use std::sync::Arc;
use std::time::Duration;
use trialmatch_core::{AbstainingJudge, ClauseJudge, KeywordJudge};

pub const ENV_JUDGE: &str = "TRIALMATCH_JUDGE";
pub const ENV_LLM_URL: &str = "TRIALMATCH_LLM_URL";
pub const ENV_LLM_MODEL: &str = "TRIALMATCH_LLM_MODEL";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

/// Which [`ClauseJudge`] evaluates exclusion clauses. Defaults to abstaining.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JudgeKind {
    Keyword,
    #[default]
    None,
    Llm,
}

impl std::str::FromStr for JudgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "none" => Ok(Self::None),
            "llm" => Ok(Self::Llm),
            other => Err(format!("unknown judge {other:?}; expected keyword, none or llm")),
        }
    }
}

impl ChatConfig {
    /// Reads the endpoint, model and API key by variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, timeout: Duration) -> Self {
        let defaults = Self::default();
        let non_blank = |name: &str| lookup(name).filter(|v: &String| !v.trim().is_empty());
        Self {
            base_url: non_blank(ENV_LLM_URL).unwrap_or(defaults.base_url),
            model: non_blank(ENV_LLM_MODEL).unwrap_or(defaults.model),
            api_key: non_blank(ENV_API_KEY),
            timeout,
        }
    }
}

/// Builds the judge for `kind`. Only [`JudgeKind::Llm`] uses `chat`.
pub fn build_judge(kind: JudgeKind, chat: ChatConfig) -> LlmResult<Arc<dyn ClauseJudge>> {
    let judge: Arc<dyn ClauseJudge> = match kind {
        JudgeKind::Keyword => Arc::new(KeywordJudge),
        JudgeKind::None => Arc::new(AbstainingJudge),
        JudgeKind::Llm => {
            if chat.api_key.is_none() {
                tracing::warn!("no API key configured for the model endpoint");
            }
            Arc::new(ChatJudge::new(chat)?)
        }
    };
    tracing::info!(judge = ?kind, "clause judge selected");
    Ok(judge)
}
