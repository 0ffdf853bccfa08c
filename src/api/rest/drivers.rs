use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::auth::CallerIdentity;
use crate::engine::{pathcost, registry};
use crate::error::AppError;
use crate::geo::Location;
use crate::models::driver::Driver;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(register_driver).get(list_drivers))
        .route("/drivers/:id", get(get_driver))
        .route("/drivers/:id/location", patch(update_location))
        .route("/drivers/:id/availability", patch(set_availability))
        .route("/drivers/:id/rides", get(driver_rides))
        .route("/path-cost", get(path_cost))
}

#[derive(Deserialize)]
pub struct RegisterDriverRequest {
    pub name: String,
    pub vehicle_model: String,
    pub license_plate: String,
    pub location: Location,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: Location,
}

#[derive(Deserialize)]
pub struct SetAvailabilityRequest {
    pub available: bool,
}

async fn register_driver(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Json(payload): Json<RegisterDriverRequest>,
) -> Json<Driver> {
    let driver = registry::register(
        &state,
        &caller,
        payload.name,
        payload.vehicle_model,
        payload.license_plate,
        payload.location,
    );
    Json(driver)
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Json<Vec<Driver>> {
    Json(registry::list(&state))
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Driver>, AppError> {
    registry::get(&state, id).map(Json)
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    caller: CallerIdentity,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Driver>, AppError> {
    registry::update_location(&state, id, &caller, payload.location).map(Json)
}

async fn set_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    caller: CallerIdentity,
    Json(payload): Json<SetAvailabilityRequest>,
) -> Result<Json<Driver>, AppError> {
    registry::set_availability(&state, id, &caller, payload.available).map(Json)
}

async fn driver_rides(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<u64>>, AppError> {
    registry::ride_history(&state, id).map(Json)
}

#[derive(Deserialize)]
pub struct PathCostQuery {
    pub from: u64,
    pub to: u64,
    pub max_nodes: Option<u64>,
}

#[derive(Serialize)]
pub struct PathCostResponse {
    pub cost: Option<u64>,
    pub reachable: bool,
}

async fn path_cost(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathCostQuery>,
) -> Result<Json<PathCostResponse>, AppError> {
    let max_nodes = query.max_nodes.unwrap_or(u64::MAX);
    let cost = pathcost::estimate(&state, query.from, query.to, max_nodes)?;

    Ok(Json(if cost == pathcost::NO_PATH {
        PathCostResponse {
            cost: None,
            reachable: false,
        }
    } else {
        PathCostResponse {
            cost: Some(cost),
            reachable: true,
        }
    }))
}
