//! Ride-dispatch simulation CLI.
//!
//! `run` executes one scenario (from a JSON config file or defaults) and can
//! export per-booking records as CSV; `stress` sweeps passenger loads against
//! a fixed fleet and prints one CSV row per run.

mod report;
mod runner;
mod scenario;

use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::report::{print_summary, write_csv};
use crate::scenario::SimulationConfig;

#[derive(Parser)]
#[command(
    name = "dispatch_sim",
    about = "Ride-dispatch coordinator simulation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation scenario
    Run {
        /// JSON scenario config; defaults are used when absent
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write per-booking records to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,
        /// Print one line per booking event
        #[arg(long)]
        log_events: bool,
    },
    /// Sweep passenger loads against a fixed fleet
    Stress {
        /// Passenger loads to sweep
        #[arg(long, value_delimiter = ',', default_value = "20,50,100")]
        passengers: Vec<u64>,
        #[arg(long, default_value_t = 8)]
        drivers: u64,
        #[arg(long, default_value_t = 3)]
        regions: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    match Cli::parse().command {
        Commands::Run {
            config,
            csv,
            seed,
            log_events,
        } => {
            let mut config = match config {
                Some(path) => SimulationConfig::from_file(&path)?,
                None => SimulationConfig::default(),
            };
            if let Some(seed) = seed {
                config.seed = Some(seed);
            }
            if log_events {
                config.log_events = true;
            }

            let outcome = runner::run_simulation(&config);
            print_summary(&config, &outcome);
            if let Some(path) = csv {
                write_csv(&outcome.records, File::create(&path)?)?;
                println!("records written to {}", path.display());
            }
            Ok(())
        }
        Commands::Stress {
            passengers,
            drivers,
            regions,
            seed,
        } => {
            println!("passengers,admitted,deferred,completed,elapsed_ms");
            for load in passengers {
                let config = SimulationConfig {
                    regions: (0..regions).map(|i| (format!("region-{i}"), 4)).collect(),
                    drivers,
                    passengers: load,
                    max_pickup_delay_ms: 10,
                    min_travel_ms: 5,
                    max_travel_ms: 25,
                    seed,
                    log_events: false,
                };
                let outcome = runner::run_simulation(&config);
                println!(
                    "{},{},{},{},{}",
                    load,
                    outcome.admitted,
                    outcome.deferred,
                    outcome.records.len(),
                    outcome.elapsed.as_millis()
                );
            }
            Ok(())
        }
    }
}
