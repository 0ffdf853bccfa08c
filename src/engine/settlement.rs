use tracing::info;

use crate::auth::{require_driver_owner, require_platform, CallerIdentity};
use crate::error::AppError;
use crate::models::event::Notification;
use crate::models::ride::{Ride, RideStatus};
use crate::state::AppState;

/// Fee ceiling: 10% of the fare.
pub const MAX_FEE_BASIS_POINTS: u32 = 1000;

const BASIS_POINT_DENOMINATOR: u128 = 10_000;

/// Splits a fare into `(platform_fee, driver_payment)`. The fee floors, the
/// driver payment absorbs the remainder, and the two always sum to the fare
/// exactly.
pub fn split_fare(fare: u64, fee_basis_points: u32) -> (u64, u64) {
    let fee = (fare as u128 * fee_basis_points as u128 / BASIS_POINT_DENOMINATOR) as u64;
    (fee, fare - fee)
}

/// Completes an `InProgress` ride: splits the escrowed fare at the current
/// fee level, pays the driver and the platform, and marks the ride
/// `Completed`. Only the assigned driver's owner may complete. The transfers
/// and the status change commit together under the ride entry's lock; a
/// ledger failure aborts the whole operation with no state change.
pub fn complete(state: &AppState, ride_id: u64, caller: &CallerIdentity) -> Result<Ride, AppError> {
    let mut ride = state
        .rides
        .get_mut(&ride_id)
        .ok_or_else(|| AppError::NotFound(format!("ride {ride_id} not found")))?;

    if ride.status != RideStatus::InProgress {
        return Err(AppError::InvalidState(format!(
            "ride {ride_id} cannot complete from {:?}",
            ride.status
        )));
    }

    let driver_owner = {
        let driver = state.drivers.get(&ride.driver_id).ok_or_else(|| {
            AppError::Internal(format!("assigned driver {} missing", ride.driver_id))
        })?;
        require_driver_owner(&driver, caller)?;
        driver.owner.clone()
    };

    let (platform_fee, driver_payment) = split_fare(ride.fare, state.fee_basis_points());

    state.ledger.settle(
        ride_id,
        &driver_owner,
        driver_payment,
        &state.platform_account,
        platform_fee,
    )?;

    ride.status = RideStatus::Completed;
    let completed = ride.clone();
    drop(ride);

    state
        .metrics
        .rides_total
        .with_label_values(&[RideStatus::Completed.as_label()])
        .inc();
    state.metrics.escrow_held.sub(completed.fare as i64);

    state.emit(Notification::RideCompleted {
        ride_id,
        fare: completed.fare,
    });

    info!(
        ride_id,
        fare = completed.fare,
        platform_fee,
        driver_payment,
        "ride completed and settled"
    );

    Ok(completed)
}

/// Adjusts the platform fee. Platform owner only; capped at 10%.
pub fn set_fee_basis_points(
    state: &AppState,
    caller: &CallerIdentity,
    value: u32,
) -> Result<u32, AppError> {
    require_platform(&state.platform_account, caller)?;

    if value > MAX_FEE_BASIS_POINTS {
        return Err(AppError::InvalidAmount(format!(
            "fee {value} exceeds the {MAX_FEE_BASIS_POINTS} basis point ceiling"
        )));
    }

    state.set_fee_basis_points(value);
    info!(fee_basis_points = value, "fee level updated");

    Ok(value)
}
