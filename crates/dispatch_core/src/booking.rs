//! Booking: one passenger bound to (eventually) one driver.
//!
//! A booking is created the moment a region admits a passenger, executed by
//! exactly one region worker, and immutable once its result exists. Result
//! delivery is a one-shot channel so the admitting caller never blocks on
//! trip completion.

use std::fmt;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::agents::{Driver, DriverId, Passenger};
use crate::dispatch::DispatchContext;

pub type BookingId = u64;

#[derive(Debug)]
pub struct Booking {
    id: BookingId,
    passenger: Passenger,
    driver: Option<Driver>,
}

impl Booking {
    pub(crate) fn new(id: BookingId, passenger: Passenger) -> Self {
        Self {
            id,
            passenger,
            driver: None,
        }
    }

    pub fn id(&self) -> BookingId {
        self.id
    }

    pub fn passenger(&self) -> &Passenger {
        &self.passenger
    }

    /// Runs the full trip on the calling worker: waits for a driver from the
    /// shared pool, picks the passenger up, drives to the destination, and
    /// returns the driver to the pool.
    ///
    /// Returns `None` when the pool closed mid-wait (process teardown): the
    /// booking counts as abandoned, the driver was never removed, and the
    /// caller's slot accounting is corrected by its RAII ticket.
    pub(crate) fn execute(mut self, ctx: &DispatchContext) -> Option<BookingResult> {
        let started = Instant::now();
        ctx.log.event(Some(&self), "waiting for an idle driver");

        let Some(mut driver) = ctx.take_driver() else {
            ctx.log.event(Some(&self), "abandoned while waiting for a driver");
            return None;
        };

        driver.pick_up(self.passenger.clone());
        self.driver = Some(driver);
        ctx.log.event(Some(&self), "passenger collected, driving to destination");

        if let Some(driver) = self.driver.as_mut() {
            driver.drive_to_destination();
        }
        let elapsed = started.elapsed();
        ctx.log.event(
            Some(&self),
            &format!("trip completed in {} ms, driver released", elapsed.as_millis()),
        );

        let Some(driver) = self.driver.take() else {
            return None;
        };
        let result = BookingResult {
            booking_id: self.id,
            driver_id: driver.id,
            driver_name: driver.name.clone(),
            elapsed,
        };
        ctx.return_driver(driver);
        Some(result)
    }
}

impl fmt::Display for Booking {
    /// `<id>:<driver-or-dash>:<passenger>`, the prefix of every logged event
    /// line for this booking.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let driver = self
            .driver
            .as_ref()
            .map(|driver| driver.name.as_str())
            .unwrap_or("-");
        write!(f, "{}:{}:{}", self.id, driver, self.passenger.name)
    }
}

/// Write-once outcome of a completed booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingResult {
    pub booking_id: BookingId,
    pub driver_id: DriverId,
    pub driver_name: String,
    pub elapsed: Duration,
}

/// Awaitable handle for an admitted booking's eventual result.
///
/// Bookings that were queued or rejected never produce a handle. A handle
/// that resolves to `None` means the booking was abandoned at teardown.
#[derive(Debug)]
pub struct BookingHandle {
    booking_id: BookingId,
    rx: mpsc::Receiver<BookingResult>,
}

impl BookingHandle {
    pub(crate) fn channel(booking_id: BookingId) -> (mpsc::Sender<BookingResult>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { booking_id, rx })
    }

    pub fn booking_id(&self) -> BookingId {
        self.booking_id
    }

    /// Blocks until the booking finishes.
    pub fn wait(self) -> Option<BookingResult> {
        self.rx.recv().ok()
    }

    /// Blocks up to `timeout`; `None` on timeout or abandonment.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<BookingResult> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_dash_until_a_driver_is_bound() {
        let mut booking = Booking::new(3, Passenger::new(1, "alma", Duration::ZERO));
        assert_eq!(booking.to_string(), "3:-:alma");

        booking.driver = Some(Driver::new(9, "dara", Duration::ZERO));
        assert_eq!(booking.to_string(), "3:dara:alma");
    }

    #[test]
    fn handle_resolves_with_the_delivered_result() {
        let (tx, handle) = BookingHandle::channel(7);
        let result = BookingResult {
            booking_id: 7,
            driver_id: 2,
            driver_name: "dara".into(),
            elapsed: Duration::from_millis(5),
        };
        tx.send(result.clone()).expect("send result");
        assert_eq!(handle.wait(), Some(result));
    }

    #[test]
    fn handle_resolves_empty_when_the_producer_is_dropped() {
        let (tx, handle) = BookingHandle::channel(7);
        drop(tx);
        assert_eq!(handle.wait(), None);
    }
}
