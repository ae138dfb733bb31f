//! Simulation scenario configuration.
//!
//! A scenario describes the fleet (drivers and their pickup-delay bound),
//! the passenger load, and the regions to book into. Configs are plain JSON
//! and every field has a default, so partial files are fine.

use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Region name -> max simultaneous jobs.
    pub regions: HashMap<String, usize>,
    pub drivers: u64,
    pub passengers: u64,
    /// Upper bound on a driver's randomized pickup delay.
    pub max_pickup_delay_ms: u64,
    /// Passenger travel times are sampled uniformly from this range.
    pub min_travel_ms: u64,
    pub max_travel_ms: u64,
    /// Seed for reproducible passenger generation; entropy when absent.
    pub seed: Option<u64>,
    /// Print one line per booking event.
    pub log_events: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            regions: HashMap::from([
                ("north".to_string(), 4),
                ("south".to_string(), 4),
            ]),
            drivers: 10,
            passengers: 50,
            max_pickup_delay_ms: 30,
            min_travel_ms: 10,
            max_travel_ms: 60,
            seed: None,
            log_events: false,
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Region names in a stable order for reproducible passenger placement.
    pub fn region_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.regions.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_partial_config_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"regions": {{"harbor": 2}}, "passengers": 7, "seed": 42}}"#
        )
        .expect("write config");

        let config = SimulationConfig::from_file(file.path()).expect("load config");
        assert_eq!(config.regions["harbor"], 2);
        assert_eq!(config.passengers, 7);
        assert_eq!(config.seed, Some(42));
        // Untouched fields fall back to defaults.
        assert_eq!(config.drivers, SimulationConfig::default().drivers);
    }

    #[test]
    fn region_names_are_sorted() {
        let config = SimulationConfig::default();
        assert_eq!(config.region_names(), vec!["north", "south"]);
    }
}
