use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::ledger::Ledger;
use crate::models::driver::Driver;
use crate::models::event::Notification;
use crate::models::ride::Ride;
use crate::observability::metrics::Metrics;

/// Sole owner of the driver and ride tables. Records are append-only (never
/// removed, only status-updated); ids are allocated from monotonic counters
/// starting at 1, with 0 reserved as the universal "absent" sentinel.
pub struct AppState {
    pub drivers: DashMap<u64, Driver>,
    pub rides: DashMap<u64, Ride>,
    pub rider_rides: DashMap<String, Vec<u64>>,
    pub driver_rides: DashMap<u64, Vec<u64>>,
    pub ledger: Ledger,
    pub platform_account: String,
    pub events_tx: broadcast::Sender<Notification>,
    pub metrics: Metrics,
    next_driver_id: AtomicU64,
    next_ride_id: AtomicU64,
    fee_basis_points: AtomicU32,
}

impl AppState {
    pub fn new(event_buffer_size: usize, platform_account: String, fee_basis_points: u32) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            drivers: DashMap::new(),
            rides: DashMap::new(),
            rider_rides: DashMap::new(),
            driver_rides: DashMap::new(),
            ledger: Ledger::new(),
            platform_account,
            events_tx,
            metrics: Metrics::new(),
            next_driver_id: AtomicU64::new(1),
            next_ride_id: AtomicU64::new(1),
            fee_basis_points: AtomicU32::new(fee_basis_points),
        }
    }

    pub fn allocate_driver_id(&self) -> u64 {
        self.next_driver_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn allocate_ride_id(&self) -> u64 {
        self.next_ride_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Highest driver id handed out so far. Ids are contiguous from 1, so
    /// this doubles as the registered-driver count.
    pub fn registered_driver_count(&self) -> u64 {
        self.next_driver_id.load(Ordering::SeqCst) - 1
    }

    pub fn fee_basis_points(&self) -> u32 {
        self.fee_basis_points.load(Ordering::SeqCst)
    }

    pub fn set_fee_basis_points(&self, value: u32) {
        self.fee_basis_points.store(value, Ordering::SeqCst);
    }

    /// Send errors only mean nobody is subscribed right now.
    pub fn emit(&self, notification: Notification) {
        let _ = self.events_tx.send(notification);
    }
}
