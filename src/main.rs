use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trialmatch_core::{
    ClauseJudge, MatchConfig, MatchConfigValues, Matcher, MatchingSummary, PatientProfile,
    TrialRegistry,
};
use trialmatch_llm::select::ENV_JUDGE;
use trialmatch_llm::{ChatConfig, JudgeKind, build_judge};
use trialmatch_registry::ClinicalTrialsClient;

const ENV_REST_ADDR: &str = "TRIALMATCH_REST_ADDR";
const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Application state shared across REST API handlers
#[derive(Clone)]
struct AppState {
    matcher: Matcher<dyn TrialRegistry, dyn ClauseJudge>,
}

#[derive(Debug, Serialize)]
struct HealthRes {
    ok: bool,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorRes {
    error: String,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Main entry point for the trialmatch REST service
///
/// # Environment Variables
/// - `TRIALMATCH_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `TRIALMATCH_JUDGE`: exclusion clause judge, `keyword`, `none` or `llm` (default: none)
/// - `TRIALMATCH_REGISTRY_URL` and the other `TRIALMATCH_*` matcher settings
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trialmatch=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(MatchConfig::from_env_values(
        MatchConfigValues::from_lookup(env_var),
    )?);
    let kind = env_var(ENV_JUDGE)
        .map(|v| v.parse::<JudgeKind>())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or_default();
    let judge = build_judge(kind, ChatConfig::from_lookup(env_var, cfg.request_timeout()))?;
    let registry: Arc<dyn TrialRegistry> = Arc::new(ClinicalTrialsClient::new(&cfg)?);

    let rest_addr = env_var(ENV_REST_ADDR).unwrap_or_else(|| DEFAULT_REST_ADDR.into());
    tracing::info!("++ Starting trialmatch REST on {}", rest_addr);

    let app = router(AppState {
        matcher: Matcher::new(registry, judge, cfg),
    });

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/matches", post(match_patient))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for the REST API
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "trialmatch is alive".into(),
    })
}

/// Match one patient profile against recruiting trials for each of its conditions
///
/// # Returns
/// * `Ok(Json<MatchingSummary>)` - Eligible trials with the criteria each one met
/// * `Err((StatusCode, Json<ErrorRes>))` - Bad request if the profile is malformed or invalid
async fn match_patient(
    State(state): State<AppState>,
    body: Result<Json<PatientProfile>, JsonRejection>,
) -> Result<Json<MatchingSummary>, (StatusCode, Json<ErrorRes>)> {
    let Json(profile) = body.map_err(|e| {
        tracing::warn!("Rejected patient profile: {}", e.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorRes {
                error: e.body_text(),
            }),
        )
    })?;

    Ok(Json(state.matcher.match_patient(&profile).await))
}
