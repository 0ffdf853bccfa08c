use crate::error::AppError;
use crate::geo::{squared_distance, Location};
use crate::state::AppState;

/// Sentinel tentative distance: the destination was not reached within the
/// scanned subset. Callers must treat this as "no path found", never as a
/// numeric cost.
pub const NO_PATH: u64 = u64::MAX;

/// Bounded single-source shortest-path cost between two drivers.
///
/// The graph is fully connected over all registered drivers, with squared
/// planar distance as the edge weight. The search is a minimum-distance-first
/// relaxation restricted to the first `max_nodes` driver ids (clamped to the
/// registered count), giving the query a caller-controlled cost ceiling. It
/// exits the moment the destination is selected, or when no unvisited node
/// has a finite distance.
pub fn estimate(
    state: &AppState,
    source: u64,
    dest: u64,
    max_nodes: u64,
) -> Result<u64, AppError> {
    if source == dest {
        return Ok(0);
    }

    let count = state.registered_driver_count();
    if source == 0 || source > count {
        return Err(AppError::InvalidDriver(source));
    }
    if dest == 0 || dest > count {
        return Err(AppError::InvalidDriver(dest));
    }

    let scan = max_nodes.min(count) as usize;

    let mut locations: Vec<Location> = Vec::with_capacity(scan);
    for id in 1..=scan as u64 {
        let driver = state
            .drivers
            .get(&id)
            .ok_or_else(|| AppError::Internal(format!("driver {id} missing from registry")))?;
        locations.push(driver.location);
    }

    let src = (source - 1) as usize;
    let dst = (dest - 1) as usize;

    let mut tentative = vec![NO_PATH; scan];
    let mut visited = vec![false; scan];
    if src < scan {
        tentative[src] = 0;
    }

    loop {
        // Lowest unvisited tentative distance; ties keep the lowest id.
        let mut current: Option<usize> = None;
        for node in 0..scan {
            if visited[node] || tentative[node] == NO_PATH {
                continue;
            }
            match current {
                Some(best) if tentative[node] >= tentative[best] => {}
                _ => current = Some(node),
            }
        }

        let Some(node) = current else {
            break;
        };
        if node == dst {
            return Ok(tentative[node]);
        }
        visited[node] = true;

        for neighbor in 0..scan {
            if visited[neighbor] {
                continue;
            }
            let through = tentative[node]
                .saturating_add(squared_distance(&locations[node], &locations[neighbor]));
            if through < tentative[neighbor] {
                tentative[neighbor] = through;
            }
        }
    }

    Ok(if dst < scan { tentative[dst] } else { NO_PATH })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CallerIdentity;
    use crate::engine::registry;

    fn test_state() -> AppState {
        AppState::new(16, "platform".to_string(), 250)
    }

    fn register_at(state: &AppState, lat_e6: i64, lng_e6: i64) -> u64 {
        registry::register(
            state,
            &CallerIdentity("owner".to_string()),
            "driver".to_string(),
            "sedan".to_string(),
            "PLT-001".to_string(),
            Location { lat_e6, lng_e6 },
        )
        .id
    }

    #[test]
    fn same_source_and_destination_is_free_regardless_of_budget() {
        let state = test_state();
        let id = register_at(&state, 10, 10);

        assert_eq!(estimate(&state, id, id, 0).unwrap(), 0);
        assert_eq!(estimate(&state, id, id, u64::MAX).unwrap(), 0);
    }

    #[test]
    fn out_of_range_ids_are_invalid() {
        let state = test_state();
        register_at(&state, 0, 0);
        register_at(&state, 5, 0);

        assert!(matches!(
            estimate(&state, 0, 2, 10),
            Err(AppError::InvalidDriver(0))
        ));
        assert!(matches!(
            estimate(&state, 1, 3, 10),
            Err(AppError::InvalidDriver(3))
        ));
    }

    #[test]
    fn zero_budget_finds_no_path() {
        let state = test_state();
        let a = register_at(&state, 0, 0);
        let b = register_at(&state, 5, 0);

        assert_eq!(estimate(&state, a, b, 0).unwrap(), NO_PATH);
    }

    #[test]
    fn two_nodes_cost_their_squared_distance() {
        let state = test_state();
        let a = register_at(&state, 0, 0);
        let b = register_at(&state, 3, 4);

        assert_eq!(estimate(&state, a, b, 2).unwrap(), 25);
    }

    #[test]
    fn a_midpoint_hop_is_cheaper_than_the_direct_edge() {
        let state = test_state();
        let a = register_at(&state, 0, 0);
        let b = register_at(&state, 10, 0);
        register_at(&state, 5, 0);

        // Squared-distance weights make the detour through the midpoint
        // (25 + 25) cheaper than the direct edge (100).
        assert_eq!(estimate(&state, a, b, 3).unwrap(), 50);
    }

    #[test]
    fn the_scan_budget_excludes_later_drivers() {
        let state = test_state();
        let a = register_at(&state, 0, 0);
        let b = register_at(&state, 10, 0);
        register_at(&state, 5, 0);

        // With only the first two ids in scope the midpoint is invisible.
        assert_eq!(estimate(&state, a, b, 2).unwrap(), 100);
    }

    #[test]
    fn destination_outside_the_scanned_subset_is_unreachable() {
        let state = test_state();
        let a = register_at(&state, 0, 0);
        register_at(&state, 5, 0);
        let c = register_at(&state, 10, 0);

        assert_eq!(estimate(&state, a, c, 2).unwrap(), NO_PATH);
    }

    #[test]
    fn budget_larger_than_the_registry_is_clamped() {
        let state = test_state();
        let a = register_at(&state, 0, 0);
        let b = register_at(&state, 6, 8);

        assert_eq!(estimate(&state, a, b, u64::MAX).unwrap(), 100);
    }
}
