use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use finassist_core::domain::profile::UserProfile;
use finassist_core::llm::GeminiClient;
use finassist_core::market::FmpClient;
use finassist_core::recommend::ThreadRngSampler;
use finassist_core::router::QueryRouter;
use finassist_core::storage::ConversationLog;

const DEFAULT_PORT: u16 = 5000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = finassist_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let market = FmpClient::from_settings(&settings)?;
    let llm = GeminiClient::from_settings(&settings)?;
    let router = QueryRouter::new(Arc::new(market), Arc::new(llm), Arc::new(ThreadRngSampler));
    let log = ConversationLog::from_settings(&settings);
    tracing::info!(log_dir = %log.dir().display(), "conversation log configured");

    let state = AppState {
        router: Arc::new(router),
        log,
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/chat", post(chat))
        .route("/predict_stock", post(predict_stock))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    router: Arc<QueryRouter>,
    log: ConversationLog,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
    #[serde(default)]
    profile: Option<UserProfile>,
    #[serde(default)]
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct PredictStockRequest {
    #[serde(default)]
    ticker: String,
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    risk: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(ChatRequest {
        message,
        profile,
        api_key,
    }) = payload.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("chat", %request_id);

    // Run the router on its own task so a panic inside it becomes a 500 instead of a dropped
    // connection.
    let router = state.router.clone();
    let query = message.clone();
    let handle = tokio::spawn(
        async move {
            router
                .respond(&query, profile.as_ref(), api_key.as_deref())
                .await
        }
        .instrument(span.clone()),
    );

    let response = match handle.await {
        Ok(text) => text,
        Err(join_err) => {
            let err = anyhow::Error::new(join_err).context("chat handler failed");
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(parent: &span, error = %err, "chat request failed");
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{err:#}"),
            ));
        }
    };

    if let Err(err) = state.log.append(&message, &response).await {
        tracing::warn!(parent: &span, error = %err, "failed to write conversation log");
    }

    Ok(Json(ChatResponse { response }))
}

/// Single-ticker prediction has no implementation behind it; the route exists so clients get a
/// structured error rather than a 404.
async fn predict_stock(
    payload: Result<Json<PredictStockRequest>, JsonRejection>,
) -> ApiError {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, e.body_text()),
    };
    tracing::warn!(
        ticker = %req.ticker,
        age = ?req.age,
        risk = ?req.risk,
        "predict_stock called but single-ticker prediction is not available"
    );
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "single-ticker prediction is not available",
    )
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &finassist_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
