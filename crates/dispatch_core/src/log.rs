//! Event log: one text line per event, `<booking-or-blank>: <message>`.
//!
//! Not a structured protocol; emission is gated by the flag passed at
//! dispatch construction.

use crate::booking::Booking;

#[derive(Debug, Clone, Copy, Default)]
pub struct EventLog {
    enabled: bool,
}

impl EventLog {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Logs one event line. A `None` booking is valid and logs with a blank
    /// prefix (region-level and system messages).
    pub fn event(&self, booking: Option<&Booking>, message: &str) {
        if !self.enabled {
            return;
        }
        match booking {
            Some(booking) => println!("{booking}: {message}"),
            None => println!(": {message}"),
        }
    }
}
