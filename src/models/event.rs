use serde::Serialize;

use crate::geo::Location;

/// One notification per successful mutating operation, broadcast in the order
/// the operations committed. Availability toggles and ride starts emit
/// nothing.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Notification {
    DriverRegistered {
        driver_id: u64,
        owner: String,
        name: String,
    },
    DriverLocationUpdated {
        driver_id: u64,
        location: Location,
    },
    RideRequested {
        ride_id: u64,
        requester: String,
        pickup: Location,
    },
    RideMatched {
        ride_id: u64,
        driver_id: u64,
        fare: u64,
    },
    RideCompleted {
        ride_id: u64,
        fare: u64,
    },
    RideCancelled {
        ride_id: u64,
    },
}
