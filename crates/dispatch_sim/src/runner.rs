//! Runs one simulation: seeds the fleet, books the passenger load, and
//! collects per-booking records.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use dispatch_core::agents::{Driver, Passenger};
use dispatch_core::config::DispatchParams;
use dispatch_core::dispatch::Dispatch;
use rand::Rng;

use crate::report::BookingRecord;
use crate::scenario::SimulationConfig;

/// Queued overflow is given this long to settle before shutdown.
const QUIESCENCE_DEADLINE: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct SimulationOutcome {
    /// One record per booking that resolved through a handle.
    pub records: Vec<BookingRecord>,
    pub requested: u64,
    /// Bookings admitted with a handle.
    pub admitted: u64,
    /// Bookings accepted but queued (they complete without a handle).
    pub deferred: u64,
    pub elapsed: Duration,
}

pub fn run_simulation(config: &SimulationConfig) -> SimulationOutcome {
    let params = DispatchParams::new(config.regions.clone()).with_log_events(config.log_events);
    let dispatch = Arc::new(Dispatch::with_params(params));
    let started = Instant::now();

    // Drivers arrive from multiple concurrent fleet sources.
    let pickup_delay = Duration::from_millis(config.max_pickup_delay_ms);
    let half = config.drivers / 2;
    let fleet_sources: Vec<_> = [(0, half), (half, config.drivers)]
        .into_iter()
        .map(|(from, to)| {
            let dispatch = Arc::clone(&dispatch);
            thread::spawn(move || {
                for id in from..to {
                    if dispatch
                        .add_driver(Driver::new(id, format!("driver-{id}"), pickup_delay))
                        .is_err()
                    {
                        eprintln!("driver-{id} refused: idle pool full");
                    }
                }
            })
        })
        .collect();

    let mut rng = config.rng();
    let region_names = config.region_names();
    let max_travel = config.max_travel_ms.max(config.min_travel_ms);

    let mut handles = Vec::new();
    let mut deferred = 0;
    for id in 0..config.passengers {
        let region = &region_names[rng.gen_range(0..region_names.len())];
        let travel = rng.gen_range(config.min_travel_ms..=max_travel);
        let passenger = Passenger::new(
            id,
            format!("passenger-{id}"),
            Duration::from_millis(travel),
        );
        match dispatch.book(passenger, region) {
            Some(handle) => handles.push((region.clone(), handle)),
            None => deferred += 1,
        }
    }

    for source in fleet_sources {
        source.join().expect("fleet source thread panicked");
    }

    let admitted = handles.len() as u64;
    let mut records = Vec::new();
    for (region, handle) in handles {
        if let Some(result) = handle.wait() {
            records.push(BookingRecord {
                region,
                booking_id: result.booking_id,
                driver_id: result.driver_id,
                driver_name: result.driver_name,
                trip_ms: result.elapsed.as_millis() as u64,
            });
        }
    }

    // Queued passengers complete without handles; wait for the regions to
    // settle before shutting admission down.
    wait_for_quiescence(&dispatch, QUIESCENCE_DEADLINE);
    dispatch.shutdown();

    SimulationOutcome {
        records,
        requested: config.passengers,
        admitted,
        deferred,
        elapsed: started.elapsed(),
    }
}

fn wait_for_quiescence(dispatch: &Dispatch, deadline: Duration) {
    let start = Instant::now();
    while start.elapsed() < deadline {
        let busy = dispatch.pending_count() > 0
            || dispatch.region_names().any(|name| {
                dispatch
                    .region(name)
                    .map(|region| region.active_count() > 0 || region.queued_count() > 0)
                    .unwrap_or(false)
            });
        if !busy {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn a_small_seeded_simulation_settles() {
        let config = SimulationConfig {
            regions: HashMap::from([("north".to_string(), 2), ("south".to_string(), 2)]),
            drivers: 3,
            passengers: 10,
            max_pickup_delay_ms: 0,
            min_travel_ms: 1,
            max_travel_ms: 5,
            seed: Some(42),
            log_events: false,
        };

        let outcome = run_simulation(&config);
        assert_eq!(outcome.requested, 10);
        assert_eq!(outcome.admitted + outcome.deferred, 10);
        assert_eq!(outcome.records.len() as u64, outcome.admitted);
        for record in &outcome.records {
            assert!(record.driver_id < 3);
        }
    }
}
