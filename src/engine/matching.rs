use std::time::Instant;

use tracing::info;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::geo::{squared_distance, Location};
use crate::models::event::Notification;
use crate::models::ride::{Ride, RideStatus};
use crate::state::AppState;

/// Scans every registered driver in id order and returns the available driver
/// nearest to `pickup` by squared planar distance. The comparison is a strict
/// less-than, so exact distance ties keep the earliest-registered driver.
/// Returns 0 when no driver is available.
pub fn find_nearest_available(state: &AppState, pickup: &Location) -> u64 {
    let mut best: Option<(u64, u64)> = None;

    for id in 1..=state.registered_driver_count() {
        let Some(driver) = state.drivers.get(&id) else {
            continue;
        };
        if !driver.available {
            continue;
        }

        let distance = squared_distance(&driver.location, pickup);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((id, distance)),
        }
    }

    best.map(|(id, _)| id).unwrap_or(0)
}

/// Assigns the nearest available driver to a `Requested` ride and moves it to
/// `Matched`. Any caller identity may trigger a match. The ride entry is held
/// exclusively across the scan and the assignment write, so concurrent match
/// attempts on the same ride serialize.
///
/// The winning driver's `available` flag is left untouched, so a driver can
/// be matched to several rides at once (see the double-assignment test).
pub fn match_ride(
    state: &AppState,
    ride_id: u64,
    _caller: &CallerIdentity,
) -> Result<Ride, AppError> {
    let started = Instant::now();
    let outcome = do_match(state, ride_id);

    let label = match &outcome {
        Ok(_) => "success",
        Err(AppError::NoAvailableDriver) => "no_driver",
        Err(_) => "error",
    };
    state
        .metrics
        .match_latency_seconds
        .with_label_values(&[label])
        .observe(started.elapsed().as_secs_f64());
    state.metrics.matches_total.with_label_values(&[label]).inc();

    outcome
}

fn do_match(state: &AppState, ride_id: u64) -> Result<Ride, AppError> {
    let mut ride = state
        .rides
        .get_mut(&ride_id)
        .ok_or_else(|| AppError::NotFound(format!("ride {ride_id} not found")))?;

    if ride.status != RideStatus::Requested {
        return Err(AppError::InvalidState(format!(
            "ride {ride_id} cannot be matched from {:?}",
            ride.status
        )));
    }

    let driver_id = find_nearest_available(state, &ride.pickup);
    if driver_id == 0 {
        return Err(AppError::NoAvailableDriver);
    }

    ride.driver_id = driver_id;
    ride.status = RideStatus::Matched;
    let matched = ride.clone();
    drop(ride);

    state
        .driver_rides
        .entry(driver_id)
        .or_default()
        .push(ride_id);

    state
        .metrics
        .rides_total
        .with_label_values(&[RideStatus::Matched.as_label()])
        .inc();

    state.emit(Notification::RideMatched {
        ride_id,
        driver_id,
        fare: matched.fare,
    });

    info!(ride_id, driver_id, fare = matched.fare, "ride matched");

    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{registry, rides};
    use crate::models::driver::Driver;

    fn test_state() -> AppState {
        AppState::new(16, "platform".to_string(), 250)
    }

    fn caller(id: &str) -> CallerIdentity {
        CallerIdentity(id.to_string())
    }

    fn point(lat_e6: i64, lng_e6: i64) -> Location {
        Location { lat_e6, lng_e6 }
    }

    fn register_at(state: &AppState, owner: &str, lat_e6: i64, lng_e6: i64) -> Driver {
        registry::register(
            state,
            &caller(owner),
            "driver".to_string(),
            "sedan".to_string(),
            "PLT-001".to_string(),
            point(lat_e6, lng_e6),
        )
    }

    #[test]
    fn picks_the_nearest_available_driver() {
        let state = test_state();
        register_at(&state, "alice", 10, 0);
        let near = register_at(&state, "bob", 5, 0);

        assert_eq!(find_nearest_available(&state, &point(0, 0)), near.id);
    }

    #[test]
    fn exact_ties_keep_the_lowest_id() {
        let state = test_state();
        let first = register_at(&state, "alice", 5, 0);
        register_at(&state, "bob", 0, 5);
        register_at(&state, "carol", -5, 0);

        assert_eq!(find_nearest_available(&state, &point(0, 0)), first.id);
    }

    #[test]
    fn unavailable_drivers_are_skipped() {
        let state = test_state();
        let near = register_at(&state, "alice", 1, 0);
        let far = register_at(&state, "bob", 100, 0);
        registry::set_availability(&state, near.id, &caller("alice"), false).unwrap();

        assert_eq!(find_nearest_available(&state, &point(0, 0)), far.id);
    }

    #[test]
    fn returns_zero_with_no_drivers() {
        let state = test_state();
        assert_eq!(find_nearest_available(&state, &point(0, 0)), 0);
    }

    #[test]
    fn match_with_no_available_driver_leaves_the_ride_requested() {
        let state = test_state();
        let ride = rides::create(&state, &caller("bob"), point(0, 0), point(9, 9), 500).unwrap();

        let result = match_ride(&state, ride.id, &caller("bob"));

        assert!(matches!(result, Err(AppError::NoAvailableDriver)));
        let unchanged = rides::get(&state, ride.id).unwrap();
        assert_eq!(unchanged.status, RideStatus::Requested);
        assert_eq!(unchanged.driver_id, 0);
    }

    #[test]
    fn match_assigns_and_records_driver_history() {
        let state = test_state();
        let driver = register_at(&state, "alice", 10, 10);
        let ride = rides::create(&state, &caller("bob"), point(0, 0), point(9, 9), 500).unwrap();

        let matched = match_ride(&state, ride.id, &caller("anyone")).unwrap();

        assert_eq!(matched.status, RideStatus::Matched);
        assert_eq!(matched.driver_id, driver.id);
        assert_eq!(registry::ride_history(&state, driver.id).unwrap(), vec![ride.id]);
    }

    #[test]
    fn matching_twice_is_an_invalid_state() {
        let state = test_state();
        register_at(&state, "alice", 10, 10);
        let ride = rides::create(&state, &caller("bob"), point(0, 0), point(9, 9), 500).unwrap();

        match_ride(&state, ride.id, &caller("bob")).unwrap();
        let result = match_ride(&state, ride.id, &caller("bob"));

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    // Matching never flips the winning driver's available flag, so the same
    // driver can be assigned to two live rides. This documents the current
    // behavior rather than endorsing it.
    #[test]
    fn the_same_driver_can_be_matched_to_two_rides() {
        let state = test_state();
        let driver = register_at(&state, "alice", 10, 10);
        let first = rides::create(&state, &caller("bob"), point(0, 0), point(9, 9), 500).unwrap();
        let second = rides::create(&state, &caller("carl"), point(1, 1), point(8, 8), 700).unwrap();

        let first = match_ride(&state, first.id, &caller("bob")).unwrap();
        let second = match_ride(&state, second.id, &caller("carl")).unwrap();

        assert_eq!(first.driver_id, driver.id);
        assert_eq!(second.driver_id, driver.id);
        assert!(registry::get(&state, driver.id).unwrap().available);
    }
}
