//! Dispatch: the single entry point for booking requests.
//!
//! Owns the shared idle-driver pool, the global pending counter, and the
//! region registry (fixed at construction). Regions receive the shared state
//! by reference at construction; nothing here is a process-wide singleton,
//! so independent dispatch instances can coexist.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::agents::{Driver, Passenger};
use crate::booking::{Booking, BookingHandle, BookingId};
use crate::config::DispatchParams;
use crate::log::EventLog;
use crate::pool::DriverPool;
use crate::region::{Admission, Region};

/// State shared between a dispatch instance and its regions.
pub(crate) struct DispatchContext {
    pub(crate) pool: DriverPool,
    pub(crate) log: EventLog,
    /// Bookings accepted but not yet given a driver. Never negative.
    pending: AtomicUsize,
    next_booking_id: AtomicU64,
}

impl DispatchContext {
    pub(crate) fn new(pool_capacity: usize, log: EventLog) -> Self {
        Self {
            pool: DriverPool::new(pool_capacity),
            log,
            pending: AtomicUsize::new(0),
            next_booking_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn next_booking_id(&self) -> BookingId {
        self.next_booking_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Blocks until a driver is idle. Handing out a driver resolves one
    /// pending unit, if any exist. `None` only once the pool is closed.
    pub(crate) fn take_driver(&self) -> Option<Driver> {
        let driver = self.pool.take()?;
        let _ = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        Some(driver)
    }

    /// Puts a driver back into the idle pool after a trip. The pool is sized
    /// so this cannot realistically fail; a refusal is logged and the driver
    /// retired rather than blocking a worker.
    pub(crate) fn return_driver(&self, driver: Driver) {
        let name = driver.name.clone();
        if self.pool.offer(driver).is_err() {
            self.log
                .event(None, &format!("driver {name} could not re-enter the idle pool"));
        }
    }

    pub(crate) fn note_accepted(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    /// Gives an accepted-but-driverless booking's pending unit back (region
    /// rejection or overflow discard at shutdown).
    pub(crate) fn booking_discarded(&self) {
        let _ = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

/// The ride-dispatch coordinator.
///
/// Dropping a dispatch stops admission and closes the driver pool so worker
/// threads terminate; bookings still waiting for a driver at that point are
/// abandoned (slot released, driver never lost, handle resolves empty).
/// Callers that want every result should collect their handles first.
pub struct Dispatch {
    shared: Arc<DispatchContext>,
    regions: HashMap<String, Region>,
    is_shutdown: AtomicBool,
}

impl Dispatch {
    /// Builds a dispatch with one region per `(name, max-simultaneous-jobs)`
    /// entry. Region names are arbitrary and caller-supplied.
    pub fn new(region_jobs: HashMap<String, usize>, log_events: bool) -> Self {
        Self::with_params(
            DispatchParams::new(region_jobs).with_log_events(log_events),
        )
    }

    pub fn with_params(params: DispatchParams) -> Self {
        let shared = Arc::new(DispatchContext::new(
            params.max_idle_drivers,
            EventLog::new(params.log_events),
        ));
        let regions = params
            .regions
            .into_iter()
            .map(|(name, max_jobs)| {
                let region = Region::new(name.clone(), max_jobs, Arc::clone(&shared));
                (name, region)
            })
            .collect();
        Self {
            shared,
            regions,
            is_shutdown: AtomicBool::new(false),
        }
    }

    /// Makes a driver available to any region. Safe to call from many
    /// threads; hands the driver back instead of blocking when the idle pool
    /// is full.
    pub fn add_driver(&self, driver: Driver) -> Result<(), Driver> {
        self.shared.pool.offer(driver)
    }

    /// Blocks the calling worker until a driver is available. Decrements the
    /// pending counter when it is above zero. No timeout; returns `None` only
    /// at process teardown.
    pub fn take_driver(&self) -> Option<Driver> {
        self.shared.take_driver()
    }

    /// Books a passenger into the named region. Returns `None` after
    /// shutdown, for unknown regions (no state is mutated), and when the
    /// region queues or rejects the passenger. Never blocks on trip
    /// completion.
    pub fn book(&self, passenger: Passenger, region_name: &str) -> Option<BookingHandle> {
        if self.is_shutdown.load(Ordering::SeqCst) {
            return None;
        }
        let region = self.regions.get(region_name)?;
        self.shared.note_accepted();
        match region.book_passenger(passenger) {
            Admission::Admitted(handle) => Some(handle),
            Admission::Queued => None,
            Admission::Rejected => {
                self.shared.booking_discarded();
                None
            }
        }
    }

    /// Bookings accepted but not yet given a driver, across all regions.
    pub fn pending_count(&self) -> usize {
        self.shared.pending()
    }

    pub fn idle_driver_count(&self) -> usize {
        self.shared.pool.idle_count()
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    /// Stops accepting new bookings everywhere; in-flight bookings run to
    /// completion. Idempotent.
    pub fn shutdown(&self) {
        if self.is_shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        for region in self.regions.values() {
            region.shutdown();
            self.shared
                .log
                .event(None, &format!("region {} shut down", region.name()));
        }
    }

    /// Pass-through to the event log; `None` is valid for region-level and
    /// system messages.
    pub fn log_event(&self, booking: Option<&Booking>, message: &str) {
        self.shared.log.event(booking, message);
    }
}

impl Drop for Dispatch {
    fn drop(&mut self) {
        self.shutdown();
        self.shared.pool.close();
        for region in self.regions.values_mut() {
            region.join();
        }
    }
}
