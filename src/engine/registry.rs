use chrono::Utc;
use tracing::info;

use crate::auth::{require_driver_owner, CallerIdentity};
use crate::error::AppError;
use crate::geo::Location;
use crate::models::driver::{Driver, DEFAULT_RATING};
use crate::models::event::Notification;
use crate::state::AppState;

/// Registers a new driver owned by the caller. Registration is open to any
/// identity and always succeeds; the new driver starts available with the
/// default rating.
pub fn register(
    state: &AppState,
    caller: &CallerIdentity,
    name: String,
    vehicle_model: String,
    license_plate: String,
    location: Location,
) -> Driver {
    let now = Utc::now();
    let driver = Driver {
        id: state.allocate_driver_id(),
        owner: caller.as_str().to_string(),
        name,
        vehicle_model,
        license_plate,
        location,
        rating: DEFAULT_RATING,
        available: true,
        registered_at: now,
        updated_at: now,
    };

    state.drivers.insert(driver.id, driver.clone());
    state.metrics.drivers_registered_total.inc();

    state.emit(Notification::DriverRegistered {
        driver_id: driver.id,
        owner: driver.owner.clone(),
        name: driver.name.clone(),
    });

    info!(driver_id = driver.id, owner = %driver.owner, "driver registered");

    driver
}

/// Overwrites the driver's reported location. Owner only.
pub fn update_location(
    state: &AppState,
    driver_id: u64,
    caller: &CallerIdentity,
    location: Location,
) -> Result<Driver, AppError> {
    let mut driver = state
        .drivers
        .get_mut(&driver_id)
        .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;

    require_driver_owner(&driver, caller)?;

    driver.location = location;
    driver.updated_at = Utc::now();
    let updated = driver.clone();
    drop(driver);

    state.emit(Notification::DriverLocationUpdated {
        driver_id,
        location,
    });

    Ok(updated)
}

/// Flips the availability flag. Owner only; no notification is emitted for
/// availability changes.
pub fn set_availability(
    state: &AppState,
    driver_id: u64,
    caller: &CallerIdentity,
    available: bool,
) -> Result<Driver, AppError> {
    let mut driver = state
        .drivers
        .get_mut(&driver_id)
        .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;

    require_driver_owner(&driver, caller)?;

    driver.available = available;
    driver.updated_at = Utc::now();

    Ok(driver.clone())
}

pub fn get(state: &AppState, driver_id: u64) -> Result<Driver, AppError> {
    state
        .drivers
        .get(&driver_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))
}

pub fn list(state: &AppState) -> Vec<Driver> {
    let mut drivers: Vec<Driver> = state
        .drivers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    drivers.sort_by_key(|driver| driver.id);
    drivers
}

/// Ride ids ever assigned to this driver, oldest first.
pub fn ride_history(state: &AppState, driver_id: u64) -> Result<Vec<u64>, AppError> {
    if !state.drivers.contains_key(&driver_id) {
        return Err(AppError::NotFound(format!("driver {driver_id} not found")));
    }

    Ok(state
        .driver_rides
        .get(&driver_id)
        .map(|entry| entry.value().clone())
        .unwrap_or_default())
}
