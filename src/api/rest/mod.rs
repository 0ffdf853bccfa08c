pub mod drivers;
pub mod rides;
pub mod ws;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::auth::CallerIdentity;
use crate::engine::settlement;
use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(drivers::router())
        .merge(rides::router())
        .route("/fee", get(get_fee).put(set_fee))
        .route("/accounts/:identity", get(get_balance))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    drivers: usize,
    rides: usize,
    escrow_held: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        drivers: state.drivers.len(),
        rides: state.rides.len(),
        escrow_held: state.ledger.escrow_held(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}

async fn get_fee(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "fee_basis_points": state.fee_basis_points() }))
}

#[derive(serde::Deserialize)]
struct SetFeeRequest {
    fee_basis_points: u32,
}

async fn set_fee(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Json(payload): Json<SetFeeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let value = settlement::set_fee_basis_points(&state, &caller, payload.fee_basis_points)?;
    Ok(Json(json!({ "fee_basis_points": value })))
}

async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(identity): Path<String>,
) -> Json<serde_json::Value> {
    Json(json!({
        "identity": identity,
        "balance": state.ledger.balance(&identity)
    }))
}
