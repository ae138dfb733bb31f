//! Construction parameters for a dispatch instance.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::pool::DEFAULT_MAX_IDLE_DRIVERS;

/// Parameters for building a [`Dispatch`](crate::dispatch::Dispatch).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchParams {
    /// Region name -> maximum simultaneous jobs. Names must be unique within
    /// one dispatch instance; an arbitrary count and arbitrary names are
    /// supported. Zero job limits are clamped to 1 at region construction.
    pub regions: HashMap<String, usize>,
    /// Whether `log_event` prints anything.
    pub log_events: bool,
    /// Idle-driver pool capacity.
    pub max_idle_drivers: usize,
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            regions: HashMap::new(),
            log_events: false,
            max_idle_drivers: DEFAULT_MAX_IDLE_DRIVERS,
        }
    }
}

impl DispatchParams {
    pub fn new(regions: HashMap<String, usize>) -> Self {
        Self {
            regions,
            ..Self::default()
        }
    }

    pub fn with_region(mut self, name: impl Into<String>, max_jobs: usize) -> Self {
        self.regions.insert(name.into(), max_jobs);
        self
    }

    pub fn with_log_events(mut self, enabled: bool) -> Self {
        self.log_events = enabled;
        self
    }

    pub fn with_max_idle_drivers(mut self, capacity: usize) -> Self {
        self.max_idle_drivers = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_regions() {
        let params = DispatchParams::default()
            .with_region("north", 4)
            .with_region("south", 2)
            .with_log_events(true);
        assert_eq!(params.regions.len(), 2);
        assert_eq!(params.regions["north"], 4);
        assert!(params.log_events);
        assert_eq!(params.max_idle_drivers, DEFAULT_MAX_IDLE_DRIVERS);
    }

    #[test]
    fn deserializes_with_defaults_for_missing_fields() {
        let params: DispatchParams =
            serde_json::from_str(r#"{"regions": {"north": 3}}"#).expect("valid config");
        assert_eq!(params.regions["north"], 3);
        assert!(!params.log_events);
        assert_eq!(params.max_idle_drivers, DEFAULT_MAX_IDLE_DRIVERS);
    }
}
