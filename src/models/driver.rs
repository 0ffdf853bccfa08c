use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Location;

/// Rating on a scaled integer axis; registration always starts here and no
/// current operation mutates it.
pub const DEFAULT_RATING: u32 = 4500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: u64,
    pub owner: String,
    pub name: String,
    pub vehicle_model: String,
    pub license_plate: String,
    pub location: Location,
    pub rating: u32,
    pub available: bool,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
