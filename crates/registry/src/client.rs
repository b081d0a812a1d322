//! HTTP client for the ClinicalTrials.gov v2 API.

use crate::error::{RegistryError, RegistryResult};
use crate::studies::decode_studies;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Url;
use trialmatch_core::{
    MatchConfig, MatchError, MatchResult, RegistryQuery, RetryPolicy, TrialRecord, TrialRegistry,
};

/// User agent string for registry requests.
const USER_AGENT_VALUE: &str = concat!("trialmatch/", env!("CARGO_PKG_VERSION"));

/// Registry backed by the ClinicalTrials.gov `studies` endpoint.
#[derive(Debug, Clone)]
pub struct ClinicalTrialsClient {
    client: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
    page_size: Option<u32>,
}

impl ClinicalTrialsClient {
    /// Creates a client using the registry URL, timeout, retry policy and page size in
    /// `cfg`.
    pub fn new(cfg: &MatchConfig) -> RegistryResult<Self> {
        let base_url = Url::parse(cfg.registry_base_url())
            .map_err(|e| RegistryError::InvalidUrl(format!("{}: {e}", cfg.registry_base_url())))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| RegistryError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            retry: cfg.retry(),
            page_size: cfg.page_size(),
        })
    }

    /// Full request URL for `query`.
    pub fn search_url(&self, query: &RegistryQuery) -> RegistryResult<Url> {
        let page_size = self.page_size.map(|n| n.to_string());
        let mut params = vec![
            ("format", "json"),
            ("query.cond", query.condition.as_str()),
            ("filter.overallStatus", query.overall_status),
            ("countTotal", "true"),
        ];
        if let Some(size) = page_size.as_deref() {
            params.push(("pageSize", size));
        }

        Url::parse_with_params(self.base_url.as_str(), &params)
            .map_err(|e| RegistryError::InvalidUrl(e.to_string()))
    }

    /// Single attempt: send, check the status, decode.
    async fn fetch_once(&self, url: &Url) -> RegistryResult<Vec<TrialRecord>> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        decode_studies(&body)
    }

    /// Runs the query under the retry policy.
    pub async fn fetch(&self, query: &RegistryQuery) -> RegistryResult<Vec<TrialRecord>> {
        let url = self.search_url(query)?;
        tracing::debug!(condition = %query.condition, url = %url, "querying registry");

        let url = &url;
        self.retry
            .run(
                "registry query",
                RegistryError::is_retryable,
                move |_attempt| self.fetch_once(url),
            )
            .await
    }
}

#[async_trait]
impl TrialRegistry for ClinicalTrialsClient {
    async fn search(&self, query: &RegistryQuery) -> MatchResult<Vec<TrialRecord>> {
        self.fetch(query)
            .await
            .map_err(|e| MatchError::RegistryUnavailable {
                condition: query.condition.clone(),
                reason: e.to_string(),
            })
    }
}
