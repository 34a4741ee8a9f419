mod api;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{ApiError, ChatRequest};
use steward_core::catalog;
use steward_core::client::{CallerIdentity, HttpUserClient, DEFAULT_TIMEOUT};
use steward_core::llm::Planner;
use steward_core::router::{Invocation, Router as OperationRouter};

// Application state: the Planner (which operation?) and the operation Router
// (is it valid, and against which store?). Both are read-only after startup.
#[derive(Clone)]
struct AppState {
    planner: Arc<Planner>,
    router: Arc<OperationRouter<HttpUserClient>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging setup
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .compact()
        .init();
    dotenvy::dotenv().ok();

    info!("Steward gateway initializing...");

    // The Planner talks to the model service; config comes from the env.
    let planner = Arc::new(Planner::from_env()?);

    // The store client. Identity and target are deployment concerns, so both
    // arrive from outside rather than being baked into the client.
    let base_url = std::env::var("USER_SERVICE_URL")
        .unwrap_or_else(|_| "http://localhost:8000".to_string());
    let agent_id = std::env::var("STEWARD_AGENT_ID")
        .unwrap_or_else(|_| "spiffe://example.org/agent/steward".to_string());
    let timeout = std::env::var("REQUEST_TIMEOUT_SECS")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT);

    info!("User store at {base_url}, calling as {agent_id}");
    let client = HttpUserClient::new(&base_url, CallerIdentity::new(agent_id), timeout)?;

    let router = Arc::new(OperationRouter::new(client));
    info!("Operation catalog holds {} entries", catalog::CATALOG.len());

    let state = AppState { planner, router };

    let app = Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let bind = std::env::var("STEWARD_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind).await?;
    info!("Gateway listening on {bind}");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "steward-gateway: operational"
}

/// The single inbound entry point: free text in, one routed operation out.
async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<Invocation>, ApiError> {
    info!("Routing request: {}", payload.text);

    let proposal = state.planner.plan(&payload.text, catalog::CATALOG).await?;
    match &proposal {
        Some(p) => info!("Model proposed operation '{}'", p.name),
        None => info!("Model selected no operation"),
    }

    let invocation = state.router.route(proposal).await?;
    Ok(Json(invocation))
}
