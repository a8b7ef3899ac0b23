use crate::config::DispatchServerConfig;
use crate::directory::{MemoryTokenDirectory, RedisTokenDirectory, TokenDirectory};
use crate::dispatch::{DispatchError, DispatchService};
use crate::gateway::{HttpPushGateway, PushGateway};
use shared::models::{CallRequest, CallResponse, TokenRegisterRequest};

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, instrument};

#[derive(Clone)]
struct AppState {
    service: Arc<DispatchService>,
    directory: Arc<dyn TokenDirectory>,
    config: Arc<DispatchServerConfig>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

pub async fn run_server(config: DispatchServerConfig) -> anyhow::Result<()> {
    let directory: Arc<dyn TokenDirectory> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.clone())?;
            let conn = client.get_connection_manager().await?;
            Arc::new(RedisTokenDirectory::new(conn, config.redis_key_prefix.clone()))
        }
        None => {
            info!("No DISPATCH_REDIS_URL set, using in-memory token directory");
            Arc::new(MemoryTokenDirectory::default())
        }
    };

    let gateway: Arc<dyn PushGateway> = Arc::new(HttpPushGateway::new(
        config.gateway_url.clone(),
        config.gateway_api_key.clone(),
        config.send_timeout,
    )?);

    let listen_addr = config.listen_addr;
    let router = app(directory, gateway, Arc::new(config));

    let listener = TcpListener::bind(listen_addr).await?;
    info!(address = %listen_addr, "Starting dispatch server");
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}

/// Builds the HTTP surface over explicit collaborators so tests can
/// inject their own directory and gateway.
pub fn app(
    directory: Arc<dyn TokenDirectory>,
    gateway: Arc<dyn PushGateway>,
    config: Arc<DispatchServerConfig>,
) -> Router {
    let service = Arc::new(DispatchService::new(
        directory.clone(),
        gateway,
        config.app_bundle_id.clone(),
    ));
    let state = AppState {
        service,
        directory,
        config,
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(healthcheck))
        .route("/call", post(make_call))
        .route("/tokens", post(register_tokens))
        .with_state(state)
}

async fn healthcheck(State(state): State<AppState>) -> impl IntoResponse {
    let body = DispatchServerInfo {
        public_base_url: state.config.public_base_url.clone(),
        gateway_url: state.config.gateway_url.clone(),
    };
    (StatusCode::OK, Json(body))
}

#[derive(Serialize)]
struct DispatchServerInfo {
    public_base_url: String,
    gateway_url: String,
}

#[instrument(skip(state, payload))]
async fn make_call(
    State(state): State<AppState>,
    Json(payload): Json<CallRequest>,
) -> Result<(StatusCode, Json<CallResponse>), (StatusCode, Json<ErrorResponse>)> {
    let result = state
        .service
        .dispatch(&payload)
        .await
        .map_err(dispatch_err)?;

    Ok((
        StatusCode::OK,
        Json(CallResponse {
            success: true,
            outcomes: result.outcomes,
        }),
    ))
}

#[instrument(skip(state, payload))]
async fn register_tokens(
    State(state): State<AppState>,
    Json(payload): Json<TokenRegisterRequest>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    if payload.user_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                message: "missing userId".to_string(),
            }),
        ));
    }

    // Merge so a voip-token update never clobbers the messaging token.
    let mut tokens = state
        .directory
        .lookup(&payload.user_id)
        .await
        .map_err(internal_err)?
        .unwrap_or_default();
    if let Some(token) = payload.messaging_token {
        tokens.messaging_token = Some(token);
    }
    if let Some(token) = payload.voice_token {
        tokens.voice_token = Some(token);
    }

    state
        .directory
        .save(&payload.user_id, tokens)
        .await
        .map_err(internal_err)?;
    info!(user = %payload.user_id, "updated device tokens");
    Ok(StatusCode::NO_CONTENT)
}

fn dispatch_err(err: DispatchError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        DispatchError::InvalidRequest => StatusCode::BAD_REQUEST,
        DispatchError::UserNotFound => StatusCode::NOT_FOUND,
        DispatchError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            message: err.to_string(),
        }),
    )
}

fn internal_err(err: anyhow::Error) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            message: err.to_string(),
        }),
    )
}

// Root handler for "/"
async fn root() -> impl IntoResponse {
    (StatusCode::OK, "Server OK!")
}
