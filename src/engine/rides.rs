use chrono::Utc;
use tracing::info;

use crate::auth::{require_driver_owner, require_requester, CallerIdentity};
use crate::error::AppError;
use crate::geo::Location;
use crate::models::event::Notification;
use crate::models::ride::{Ride, RideStatus};
use crate::state::AppState;

/// Creates a ride in `Requested` and escrows the fare. The escrow is held
/// until the ride is either completed (split settlement) or cancelled (full
/// refund).
pub fn create(
    state: &AppState,
    caller: &CallerIdentity,
    pickup: Location,
    destination: Location,
    fare: u64,
) -> Result<Ride, AppError> {
    if fare == 0 {
        return Err(AppError::InvalidAmount(
            "fare must be positive".to_string(),
        ));
    }

    let ride = Ride {
        id: state.allocate_ride_id(),
        requester: caller.as_str().to_string(),
        pickup,
        destination,
        fare,
        status: RideStatus::Requested,
        driver_id: 0,
        created_at: Utc::now(),
    };

    state.ledger.escrow(ride.id, fare);
    state.rides.insert(ride.id, ride.clone());
    state
        .rider_rides
        .entry(ride.requester.clone())
        .or_default()
        .push(ride.id);

    state
        .metrics
        .rides_total
        .with_label_values(&[RideStatus::Requested.as_label()])
        .inc();
    state.metrics.escrow_held.add(fare as i64);

    state.emit(Notification::RideRequested {
        ride_id: ride.id,
        requester: ride.requester.clone(),
        pickup,
    });

    info!(ride_id = ride.id, requester = %ride.requester, fare, "ride requested");

    Ok(ride)
}

/// Cancels a `Requested` or `Matched` ride. Requester only. The refund and
/// the status change commit together under the ride entry's lock; a refund
/// failure leaves the ride untouched.
pub fn cancel(state: &AppState, ride_id: u64, caller: &CallerIdentity) -> Result<Ride, AppError> {
    let mut ride = state
        .rides
        .get_mut(&ride_id)
        .ok_or_else(|| AppError::NotFound(format!("ride {ride_id} not found")))?;

    require_requester(&ride, caller)?;

    if !matches!(ride.status, RideStatus::Requested | RideStatus::Matched) {
        return Err(AppError::InvalidState(format!(
            "ride {ride_id} cannot be cancelled from {:?}",
            ride.status
        )));
    }

    let refunded = state.ledger.refund(ride_id, &ride.requester)?;

    ride.status = RideStatus::Cancelled;
    ride.driver_id = 0;
    let cancelled = ride.clone();
    drop(ride);

    state
        .metrics
        .rides_total
        .with_label_values(&[RideStatus::Cancelled.as_label()])
        .inc();
    state.metrics.escrow_held.sub(refunded as i64);

    state.emit(Notification::RideCancelled { ride_id });

    info!(ride_id, refunded, "ride cancelled");

    Ok(cancelled)
}

/// Moves a `Matched` ride to `InProgress`. Only the assigned driver's owner
/// may start the ride. No notification is emitted.
pub fn start(state: &AppState, ride_id: u64, caller: &CallerIdentity) -> Result<Ride, AppError> {
    let mut ride = state
        .rides
        .get_mut(&ride_id)
        .ok_or_else(|| AppError::NotFound(format!("ride {ride_id} not found")))?;

    if ride.status != RideStatus::Matched {
        return Err(AppError::InvalidState(format!(
            "ride {ride_id} cannot start from {:?}",
            ride.status
        )));
    }

    {
        let driver = state.drivers.get(&ride.driver_id).ok_or_else(|| {
            AppError::Internal(format!("assigned driver {} missing", ride.driver_id))
        })?;
        require_driver_owner(&driver, caller)?;
    }

    ride.status = RideStatus::InProgress;
    let started = ride.clone();
    drop(ride);

    state
        .metrics
        .rides_total
        .with_label_values(&[RideStatus::InProgress.as_label()])
        .inc();

    info!(ride_id, driver_id = started.driver_id, "ride started");

    Ok(started)
}

pub fn get(state: &AppState, ride_id: u64) -> Result<Ride, AppError> {
    state
        .rides
        .get(&ride_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("ride {ride_id} not found")))
}

/// Ride ids ever submitted by this requester, oldest first. Unknown
/// identities simply have no rides.
pub fn rides_for_requester(state: &AppState, requester: &str) -> Vec<u64> {
    state
        .rider_rides
        .get(requester)
        .map(|entry| entry.value().clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CallerIdentity;
    use crate::engine::{matching, registry};

    fn test_state() -> AppState {
        AppState::new(16, "platform".to_string(), 250)
    }

    fn caller(id: &str) -> CallerIdentity {
        CallerIdentity(id.to_string())
    }

    fn point(lat_e6: i64, lng_e6: i64) -> Location {
        Location { lat_e6, lng_e6 }
    }

    fn request_ride(state: &AppState, requester: &str, fare: u64) -> Ride {
        create(state, &caller(requester), point(0, 0), point(100, 100), fare).unwrap()
    }

    #[test]
    fn create_rejects_zero_fare() {
        let state = test_state();
        let result = create(&state, &caller("bob"), point(0, 0), point(1, 1), 0);
        assert!(matches!(result, Err(AppError::InvalidAmount(_))));
    }

    #[test]
    fn create_escrows_the_fare_and_indexes_the_requester() {
        let state = test_state();
        let ride = request_ride(&state, "bob", 1000);

        assert_eq!(ride.id, 1);
        assert_eq!(ride.status, RideStatus::Requested);
        assert_eq!(ride.driver_id, 0);
        assert_eq!(state.ledger.escrow_held(), 1000);
        assert_eq!(rides_for_requester(&state, "bob"), vec![1]);
    }

    #[test]
    fn cancel_refunds_the_full_fare() {
        let state = test_state();
        let ride = request_ride(&state, "bob", 1000);

        let cancelled = cancel(&state, ride.id, &caller("bob")).unwrap();

        assert_eq!(cancelled.status, RideStatus::Cancelled);
        assert_eq!(state.ledger.balance("bob"), 1000);
        assert_eq!(state.ledger.escrow_held(), 0);
    }

    #[test]
    fn second_cancel_is_an_invalid_state() {
        let state = test_state();
        let ride = request_ride(&state, "bob", 1000);

        cancel(&state, ride.id, &caller("bob")).unwrap();
        let result = cancel(&state, ride.id, &caller("bob"));

        assert!(matches!(result, Err(AppError::InvalidState(_))));
        assert_eq!(state.ledger.balance("bob"), 1000);
    }

    #[test]
    fn only_the_requester_may_cancel() {
        let state = test_state();
        let ride = request_ride(&state, "bob", 1000);

        let result = cancel(&state, ride.id, &caller("mallory"));

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
        assert_eq!(get(&state, ride.id).unwrap().status, RideStatus::Requested);
    }

    #[test]
    fn cancel_after_match_clears_the_assignment() {
        let state = test_state();
        registry::register(
            &state,
            &caller("alice"),
            "Ana".to_string(),
            "sedan".to_string(),
            "PLT-001".to_string(),
            point(10, 0),
        );
        let ride = request_ride(&state, "bob", 1000);
        matching::match_ride(&state, ride.id, &caller("bob")).unwrap();

        let cancelled = cancel(&state, ride.id, &caller("bob")).unwrap();

        assert_eq!(cancelled.status, RideStatus::Cancelled);
        assert_eq!(cancelled.driver_id, 0);
        assert_eq!(state.ledger.balance("bob"), 1000);
    }

    #[test]
    fn start_requires_a_matched_ride() {
        let state = test_state();
        let ride = request_ride(&state, "bob", 1000);

        let result = start(&state, ride.id, &caller("alice"));

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[test]
    fn start_requires_the_assigned_drivers_owner() {
        let state = test_state();
        registry::register(
            &state,
            &caller("alice"),
            "Ana".to_string(),
            "sedan".to_string(),
            "PLT-001".to_string(),
            point(10, 0),
        );
        let ride = request_ride(&state, "bob", 1000);
        matching::match_ride(&state, ride.id, &caller("bob")).unwrap();

        let result = start(&state, ride.id, &caller("mallory"));
        assert!(matches!(result, Err(AppError::Unauthorized(_))));

        let started = start(&state, ride.id, &caller("alice")).unwrap();
        assert_eq!(started.status, RideStatus::InProgress);
    }
}
