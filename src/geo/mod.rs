use serde::{Deserialize, Serialize};

/// Fixed-point coordinates in microdegrees (degrees scaled by 10^6).
/// All distance math stays in integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub lat_e6: i64,
    pub lng_e6: i64,
}

/// Squared planar distance between two points: the sum of squared coordinate
/// deltas. Monotonic with true distance, so it preserves nearness ordering
/// without ever taking a square root. Saturates at u64::MAX, which doubles as
/// the "unreachably far" sentinel in the path estimator.
pub fn squared_distance(a: &Location, b: &Location) -> u64 {
    let d_lat = a.lat_e6.abs_diff(b.lat_e6);
    let d_lng = a.lng_e6.abs_diff(b.lng_e6);

    d_lat
        .saturating_mul(d_lat)
        .saturating_add(d_lng.saturating_mul(d_lng))
}

#[cfg(test)]
mod tests {
    use super::{squared_distance, Location};

    #[test]
    fn zero_distance_for_same_point() {
        let p = Location {
            lat_e6: 53_551_100,
            lng_e6: 9_993_700,
        };
        assert_eq!(squared_distance(&p, &p), 0);
    }

    #[test]
    fn sums_squared_deltas() {
        let a = Location { lat_e6: 3, lng_e6: 0 };
        let b = Location { lat_e6: 0, lng_e6: 4 };
        assert_eq!(squared_distance(&a, &b), 25);
    }

    #[test]
    fn symmetric_across_negative_coordinates() {
        let a = Location {
            lat_e6: -10,
            lng_e6: -20,
        };
        let b = Location { lat_e6: 10, lng_e6: 20 };
        assert_eq!(squared_distance(&a, &b), squared_distance(&b, &a));
        assert_eq!(squared_distance(&a, &b), 400 + 1600);
    }

    #[test]
    fn preserves_nearness_ordering() {
        let pickup = Location { lat_e6: 0, lng_e6: 0 };
        let near = Location { lat_e6: 5, lng_e6: 0 };
        let far = Location { lat_e6: 10, lng_e6: 0 };
        assert!(squared_distance(&pickup, &near) < squared_distance(&pickup, &far));
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let a = Location {
            lat_e6: i64::MIN,
            lng_e6: i64::MIN,
        };
        let b = Location {
            lat_e6: i64::MAX,
            lng_e6: i64::MAX,
        };
        assert_eq!(squared_distance(&a, &b), u64::MAX);
    }
}
