//! Per-booking records: CSV export and printed summaries.

use std::collections::BTreeMap;
use std::error::Error;
use std::io::Write;

use crate::runner::SimulationOutcome;
use crate::scenario::SimulationConfig;

#[derive(Debug, Clone)]
pub struct BookingRecord {
    pub region: String,
    pub booking_id: u64,
    pub driver_id: u64,
    pub driver_name: String,
    pub trip_ms: u64,
}

pub fn write_csv<W: Write>(records: &[BookingRecord], writer: W) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["region", "booking_id", "driver_id", "driver_name", "trip_ms"])?;
    for record in records {
        wtr.write_record(&[
            record.region.clone(),
            record.booking_id.to_string(),
            record.driver_id.to_string(),
            record.driver_name.clone(),
            record.trip_ms.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RegionSummary {
    pub completed: usize,
    pub total_trip_ms: u64,
    pub max_trip_ms: u64,
}

impl RegionSummary {
    pub fn mean_trip_ms(&self) -> f64 {
        if self.completed == 0 {
            return 0.0;
        }
        self.total_trip_ms as f64 / self.completed as f64
    }
}

pub fn summarize(records: &[BookingRecord]) -> BTreeMap<String, RegionSummary> {
    let mut summaries: BTreeMap<String, RegionSummary> = BTreeMap::new();
    for record in records {
        let summary = summaries.entry(record.region.clone()).or_default();
        summary.completed += 1;
        summary.total_trip_ms += record.trip_ms;
        summary.max_trip_ms = summary.max_trip_ms.max(record.trip_ms);
    }
    summaries
}

pub fn print_summary(config: &SimulationConfig, outcome: &SimulationOutcome) {
    println!("SIMULATION SUMMARY");
    println!(
        "regions={} drivers={} passengers={}",
        config.regions.len(),
        config.drivers,
        config.passengers
    );
    println!(
        "requested={} admitted={} deferred={} elapsed_ms={}",
        outcome.requested,
        outcome.admitted,
        outcome.deferred,
        outcome.elapsed.as_millis()
    );
    for (region, summary) in summarize(&outcome.records) {
        println!(
            "region {region}: completed={} mean_trip_ms={:.1} max_trip_ms={}",
            summary.completed,
            summary.mean_trip_ms(),
            summary.max_trip_ms
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(region: &str, id: u64, trip_ms: u64) -> BookingRecord {
        BookingRecord {
            region: region.to_string(),
            booking_id: id,
            driver_id: 1,
            driver_name: "driver-1".to_string(),
            trip_ms,
        }
    }

    #[test]
    fn csv_has_a_header_and_one_row_per_record() {
        let records = vec![record("north", 1, 20), record("south", 2, 35)];
        let mut buffer = Vec::new();
        write_csv(&records, &mut buffer).expect("write csv");

        let text = String::from_utf8(buffer).expect("utf8 csv");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "region,booking_id,driver_id,driver_name,trip_ms");
        assert_eq!(lines[1], "north,1,1,driver-1,20");
    }

    #[test]
    fn summaries_aggregate_per_region() {
        let records = vec![
            record("north", 1, 20),
            record("north", 2, 40),
            record("south", 3, 10),
        ];
        let summaries = summarize(&records);
        assert_eq!(summaries["north"].completed, 2);
        assert_eq!(summaries["north"].mean_trip_ms(), 30.0);
        assert_eq!(summaries["north"].max_trip_ms, 40);
        assert_eq!(summaries["south"].completed, 1);
    }
}
