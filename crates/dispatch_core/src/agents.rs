//! Passengers and drivers: the people the coordination layer moves around.
//!
//! Both are plain data holders. The driver's pick-up and drive operations
//! block the calling worker for a simulated duration, which is what makes a
//! region's worker-pool size a real concurrency limit.

use std::fmt;
use std::thread;
use std::time::Duration;

use rand::Rng;

pub type PassengerId = u64;
pub type DriverId = u64;

/// A passenger waiting to be booked. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passenger {
    pub id: PassengerId,
    pub name: String,
    travel_time: Duration,
}

impl Passenger {
    pub fn new(id: PassengerId, name: impl Into<String>, travel_time: Duration) -> Self {
        Self {
            id,
            name: name.into(),
            travel_time,
        }
    }

    /// How long the drive to this passenger's destination takes.
    pub fn travel_time(&self) -> Duration {
        self.travel_time
    }
}

impl fmt::Display for Passenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A driver cycling between the shared idle pool and in-flight bookings.
///
/// Exactly one booking holds a given driver at a time; the pool enforces this
/// by removing drivers before assignment. Drivers are reused, not destroyed.
#[derive(Debug)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    max_pickup_delay: Duration,
    current_passenger: Option<Passenger>,
}

impl Driver {
    pub fn new(id: DriverId, name: impl Into<String>, max_pickup_delay: Duration) -> Self {
        Self {
            id,
            name: name.into(),
            max_pickup_delay,
            current_passenger: None,
        }
    }

    /// Stores the passenger, then blocks for a randomized `0..=max_pickup_delay`
    /// arrival time.
    pub fn pick_up(&mut self, passenger: Passenger) {
        self.current_passenger = Some(passenger);
        sleep_random(self.max_pickup_delay);
    }

    /// Blocks for the current passenger's travel time, then drops them off.
    /// No-op when nobody is on board.
    pub fn drive_to_destination(&mut self) {
        if let Some(passenger) = self.current_passenger.take() {
            let travel_time = passenger.travel_time();
            if !travel_time.is_zero() {
                thread::sleep(travel_time);
            }
        }
    }

    pub fn current_passenger(&self) -> Option<&Passenger> {
        self.current_passenger.as_ref()
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn sleep_random(max: Duration) {
    if max.is_zero() {
        return;
    }
    let millis = rand::thread_rng().gen_range(0..=max.as_millis() as u64);
    if millis > 0 {
        thread::sleep(Duration::from_millis(millis));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_up_stores_the_passenger() {
        let mut driver = Driver::new(1, "dara", Duration::ZERO);
        let passenger = Passenger::new(7, "alma", Duration::ZERO);
        driver.pick_up(passenger.clone());
        assert_eq!(driver.current_passenger(), Some(&passenger));
    }

    #[test]
    fn drive_clears_the_passenger() {
        let mut driver = Driver::new(1, "dara", Duration::ZERO);
        driver.pick_up(Passenger::new(7, "alma", Duration::from_millis(1)));
        driver.drive_to_destination();
        assert_eq!(driver.current_passenger(), None);
    }

    #[test]
    fn drive_without_passenger_is_a_noop() {
        let mut driver = Driver::new(1, "dara", Duration::ZERO);
        driver.drive_to_destination();
        assert_eq!(driver.current_passenger(), None);
    }
}
