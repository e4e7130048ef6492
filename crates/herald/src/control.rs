//! HTTP control API for the connection supervisor.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use herald_bot::{ConnectionSupervisor, ProfileUpdate, SessionHandle};
use herald_config::{ActivityKind, ConfigRecord, ConfigStore};
use herald_error::{HeraldError, HeraldErrorKind, HeraldResult};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Control API state.
#[derive(Clone)]
pub struct ControlState {
    supervisor: Arc<ConnectionSupervisor>,
    store: Option<Arc<dyn ConfigStore>>,
}

impl ControlState {
    /// State driving `supervisor`, with no persisted configuration.
    pub fn new(supervisor: Arc<ConnectionSupervisor>) -> Self {
        Self {
            supervisor,
            store: None,
        }
    }

    /// Persist configuration submitted to `PUT /config` in `store`.
    pub fn with_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// The supervisor behind the API.
    pub fn supervisor(&self) -> &Arc<ConnectionSupervisor> {
        &self.supervisor
    }
}

/// Body of `POST /activity`.
#[derive(Debug, Deserialize)]
pub struct ActivityRequest {
    /// Activity type code
    #[serde(rename = "type", default)]
    pub kind: ActivityKind,
    /// Activity text, may contain placeholders
    #[serde(default)]
    pub text: String,
}

/// Query of `GET /invite`.
#[derive(Debug, Deserialize)]
pub struct InviteQuery {
    /// Permission mask overriding the configured one
    pub permissions: Option<String>,
}

/// Creates the control router.
pub fn create_router(state: ControlState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(get_status))
        .route("/start", post(start))
        .route("/stop", post(stop))
        .route("/restart", post(restart))
        .route("/activity", post(set_activity))
        .route("/profile", post(update_profile))
        .route("/config", put(update_config))
        .route("/invite", get(get_invite))
        .with_state(state)
}

/// Health check endpoint.
#[instrument(skip_all)]
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

#[instrument(skip(state))]
async fn get_status(State(state): State<ControlState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.supervisor.status().await))
}

#[instrument(skip(state))]
async fn start(State(state): State<ControlState>) -> Response {
    let started = state.supervisor.start().await;
    session_response(&state, started)
}

#[instrument(skip(state))]
async fn stop(State(state): State<ControlState>) -> Response {
    state.supervisor.stop().await;
    (
        StatusCode::OK,
        Json(json!({ "state": state.supervisor.state() })),
    )
        .into_response()
}

#[instrument(skip(state))]
async fn restart(State(state): State<ControlState>) -> Response {
    let restarted = state.supervisor.restart().await;
    session_response(&state, restarted)
}

#[instrument(skip(state))]
async fn set_activity(
    State(state): State<ControlState>,
    Json(request): Json<ActivityRequest>,
) -> Response {
    match state
        .supervisor
        .set_activity(request.kind, &request.text)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "updated": true }))).into_response(),
        Err(e) => error_response(&e),
    }
}

#[instrument(skip_all)]
async fn update_profile(
    State(state): State<ControlState>,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    match state.supervisor.update_profile(&update).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "updated": true }))).into_response(),
        Err(e) => error_response(&e),
    }
}

#[instrument(skip_all)]
async fn update_config(
    State(state): State<ControlState>,
    Json(submitted): Json<ConfigRecord>,
) -> Response {
    let record = match persist(&state, submitted).await {
        Ok(record) => record,
        Err(e) => return error_response(&e),
    };
    let outcome = state.supervisor.apply_config(&record).await;
    if outcome.restart_required {
        info!("Configuration saved, restart the bot to apply credential changes");
    }
    (StatusCode::OK, Json(outcome)).into_response()
}

#[instrument(skip(state))]
async fn get_invite(
    State(state): State<ControlState>,
    Query(query): Query<InviteQuery>,
) -> Response {
    match state.supervisor.invite_link(query.permissions.as_deref()) {
        Ok(url) => (StatusCode::OK, Json(json!({ "url": url }))).into_response(),
        Err(e) => error_response(&e.into()),
    }
}

/// Merge `submitted` onto the stored document and save it.
async fn persist(state: &ControlState, submitted: ConfigRecord) -> HeraldResult<ConfigRecord> {
    let Some(store) = &state.store else {
        return Ok(submitted);
    };
    let mut record = store.find_one().await?.unwrap_or_default();
    record.merge(&submitted);
    store.save(&record).await?;
    Ok(record)
}

fn session_response(state: &ControlState, result: HeraldResult<SessionHandle>) -> Response {
    match result {
        Ok(handle) => (
            StatusCode::OK,
            Json(json!({
                "state": state.supervisor.state(),
                "sessionId": handle.id(),
            })),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(err: &HeraldError) -> Response {
    let status = match err.kind() {
        HeraldErrorKind::Config(_) => StatusCode::BAD_REQUEST,
        HeraldErrorKind::Connection(_)
        | HeraldErrorKind::Registration(_)
        | HeraldErrorKind::Gateway(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!(error = %err, status = status.as_u16(), "Control request failed");
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
