use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::auth::CallerIdentity;
use crate::engine::{matching, rides, settlement};
use crate::error::AppError;
use crate::geo::Location;
use crate::models::ride::Ride;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rides", post(create_ride))
        .route("/rides/:id", get(get_ride))
        .route("/rides/:id/match", post(match_ride))
        .route("/rides/:id/start", post(start_ride))
        .route("/rides/:id/complete", post(complete_ride))
        .route("/rides/:id/cancel", post(cancel_ride))
        .route("/riders/:identity/rides", get(rider_rides))
}

#[derive(Deserialize)]
pub struct CreateRideRequest {
    pub pickup: Location,
    pub destination: Location,
    pub fare: u64,
}

async fn create_ride(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Json(payload): Json<CreateRideRequest>,
) -> Result<Json<Ride>, AppError> {
    rides::create(
        &state,
        &caller,
        payload.pickup,
        payload.destination,
        payload.fare,
    )
    .map(Json)
}

async fn get_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Ride>, AppError> {
    rides::get(&state, id).map(Json)
}

async fn match_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    caller: CallerIdentity,
) -> Result<Json<Ride>, AppError> {
    matching::match_ride(&state, id, &caller).map(Json)
}

async fn start_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    caller: CallerIdentity,
) -> Result<Json<Ride>, AppError> {
    rides::start(&state, id, &caller).map(Json)
}

async fn complete_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    caller: CallerIdentity,
) -> Result<Json<Ride>, AppError> {
    settlement::complete(&state, id, &caller).map(Json)
}

async fn cancel_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    caller: CallerIdentity,
) -> Result<Json<Ride>, AppError> {
    rides::cancel(&state, id, &caller).map(Json)
}

async fn rider_rides(
    State(state): State<Arc<AppState>>,
    Path(identity): Path<String>,
) -> Json<Vec<u64>> {
    Json(rides::rides_for_requester(&state, &identity))
}
