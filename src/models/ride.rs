use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RideStatus {
    Requested,
    Matched,
    InProgress,
    Completed,
    Cancelled,
}

impl RideStatus {
    /// Metric label for this lifecycle state.
    pub fn as_label(&self) -> &'static str {
        match self {
            RideStatus::Requested => "requested",
            RideStatus::Matched => "matched",
            RideStatus::InProgress => "in_progress",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }
}

/// A ride record. `driver_id` is 0 until the ride is matched; records are
/// never deleted, terminal rides stay queryable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub id: u64,
    pub requester: String,
    pub pickup: Location,
    pub destination: Location,
    pub fare: u64,
    pub status: RideStatus,
    pub driver_id: u64,
    pub created_at: DateTime<Utc>,
}
