// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scenario-level timing parameters.
//!
//! All durations are in nanoseconds of simulated time. The defaults
//! image a 10 MHz serial clock (100 ns full period) against a
//! simulation stepped at the same 100 ns granularity.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Simulation step, i.e. the polling granularity of all waits.
const CLOCK_PERIOD_NS: u64 = 100;
/// Half of the serial clock period.
const SCLK_HALF_PERIOD_NS: u64 = 50;
/// Idle time after deasserting chip select, so the peripheral can act
/// on the transaction before the next one begins.
const DWELL_NS: u64 = 600;
/// Observation window for a single edge wait; longer than any pulse
/// period the scenarios expect to see.
const EDGE_TIMEOUT_NS: u64 = 1_000_000;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    pub clock_period_ns: u64,
    pub sclk_half_period_ns: u64,
    pub dwell_ns: u64,
    pub edge_timeout_ns: u64,
    /// Allowed relative error for frequency checks.
    pub frequency_tolerance: f64,
    /// Allowed relative error for duty-cycle checks.
    pub duty_tolerance: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            clock_period_ns: CLOCK_PERIOD_NS,
            sclk_half_period_ns: SCLK_HALF_PERIOD_NS,
            dwell_ns: DWELL_NS,
            edge_timeout_ns: EDGE_TIMEOUT_NS,
            frequency_tolerance: 0.01,
            duty_tolerance: 0.10,
        }
    }
}

impl TimingConfig {
    pub fn from_file(file_name: &str) -> anyhow::Result<Self> {
        let file = File::open(Path::new(file_name))
            .with_context(|| format!("Timing config {} not found", file_name))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader)
            .with_context(|| format!("Failed to parse timing config {}", file_name))
    }

    pub fn from_str(config: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(config).context("Failed to parse timing config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TimingConfig::default();
        assert_eq!(config.clock_period_ns, 100);
        assert_eq!(config.sclk_half_period_ns, 50);
        assert_eq!(config.dwell_ns, 600);
        assert!((config.frequency_tolerance - 0.01).abs() < f64::EPSILON);
        assert!((config.duty_tolerance - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn test_read_yaml_config() {
        let conf_str = "---
sclk_half_period_ns: 5000
dwell_ns: 60000
";
        let config = TimingConfig::from_str(conf_str).unwrap();
        // Overridden fields.
        assert_eq!(config.sclk_half_period_ns, 5000);
        assert_eq!(config.dwell_ns, 60000);
        // Everything else keeps its default.
        assert_eq!(config.clock_period_ns, 100);
        assert_eq!(config.edge_timeout_ns, 1_000_000);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = TimingConfig::default();
        let serialized = serde_yaml::to_string(&config).unwrap();
        let parsed = TimingConfig::from_str(&serialized).unwrap();
        assert_eq!(parsed.edge_timeout_ns, config.edge_timeout_ns);
    }
}
