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

//! Edge timing analysis of one monitored output bit.
//!
//! Purely observational: the analyzer reads an output word each polling
//! step and never writes wire state. Edge detection is two-phase; a
//! rising-edge wait first waits out any pulse already in progress, so
//! the returned timestamp is always a genuine 0 -> 1 transition and
//! never a false positive on an already-high signal. Every wait is
//! bounded by an observation window; a signal that never toggles is a
//! hard `NoEdgeDetected` failure, not a hang.

use crate::error::Error;
use crate::sim::Simulation;
use log::debug;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputWord {
    Primary,
    Secondary,
}

/// One monitored bit of one output word.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Probe {
    pub word: OutputWord,
    pub bit: u8,
}

impl Probe {
    pub fn primary(bit: u8) -> Self {
        Self {
            word: OutputWord::Primary,
            bit,
        }
    }

    pub fn secondary(bit: u8) -> Self {
        Self {
            word: OutputWord::Secondary,
            bit,
        }
    }

    pub fn level(&self, sim: &Simulation) -> bool {
        let word = match self.word {
            OutputWord::Primary => sim.primary_out(),
            OutputWord::Secondary => sim.secondary_out(),
        };
        word & (1 << self.bit) != 0
    }

    /// Sample the monitored bit together with the current timestamp.
    pub fn observe(&self, sim: &Simulation) -> EdgeObservation {
        EdgeObservation {
            timestamp_ns: sim.now_ns(),
            level: self.level(sim),
        }
    }
}

/// The signal level of one monitored bit at one point in simulated
/// time; the unit the edge waits operate on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EdgeObservation {
    pub timestamp_ns: u64,
    pub level: bool,
}

/// Timing characteristics derived from consecutive edges of one pulse.
/// `high_ns` is only known when a falling edge was captured between the
/// two rising edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingMeasurement {
    pub period_ns: u64,
    pub high_ns: Option<u64>,
    pub frequency_hz: f64,
}

impl TimingMeasurement {
    /// Fraction of the period the signal was high, in [0, 1].
    pub fn duty_cycle(&self) -> Option<f64> {
        self.high_ns
            .map(|high| high as f64 / self.period_ns as f64)
    }
}

fn wait_for_level(
    sim: &mut Simulation,
    probe: Probe,
    level: bool,
    deadline_ns: u64,
    window_ns: u64,
) -> Result<(), Error> {
    loop {
        let observation = probe.observe(sim);
        if observation.level == level {
            return Ok(());
        }
        if observation.timestamp_ns >= deadline_ns {
            return Err(Error::NoEdgeDetected(window_ns));
        }
        sim.step();
    }
}

/// Suspend until the monitored bit transitions from 0 to 1, returning
/// the timestamp of the transition.
pub fn await_rising_edge(
    sim: &mut Simulation,
    probe: Probe,
    timeout_ns: u64,
) -> Result<u64, Error> {
    let deadline = sim.now_ns() + timeout_ns;
    wait_for_level(sim, probe, false, deadline, timeout_ns)?;
    wait_for_level(sim, probe, true, deadline, timeout_ns)?;
    Ok(sim.now_ns())
}

/// Suspend until the monitored bit transitions from 1 to 0, returning
/// the timestamp of the transition.
pub fn await_falling_edge(
    sim: &mut Simulation,
    probe: Probe,
    timeout_ns: u64,
) -> Result<u64, Error> {
    let deadline = sim.now_ns() + timeout_ns;
    wait_for_level(sim, probe, true, deadline, timeout_ns)?;
    wait_for_level(sim, probe, false, deadline, timeout_ns)?;
    Ok(sim.now_ns())
}

/// Period and frequency from two consecutive rising edges.
pub fn measure_frequency(
    sim: &mut Simulation,
    probe: Probe,
    timeout_ns: u64,
) -> Result<TimingMeasurement, Error> {
    let t0 = await_rising_edge(sim, probe, timeout_ns)?;
    let t1 = await_rising_edge(sim, probe, timeout_ns)?;
    let period_ns = t1 - t0;
    let measurement = TimingMeasurement {
        period_ns,
        high_ns: None,
        frequency_hz: 1e9 / period_ns as f64,
    };
    debug!("analyzer: {:?}", measurement);
    Ok(measurement)
}

/// Period, high time and frequency from a rising, falling, rising edge
/// sequence.
pub fn measure_duty_cycle(
    sim: &mut Simulation,
    probe: Probe,
    timeout_ns: u64,
) -> Result<TimingMeasurement, Error> {
    let t0 = await_rising_edge(sim, probe, timeout_ns)?;
    let t1 = await_falling_edge(sim, probe, timeout_ns)?;
    let t2 = await_rising_edge(sim, probe, timeout_ns)?;
    let period_ns = t2 - t0;
    let measurement = TimingMeasurement {
        period_ns,
        high_ns: Some(t1 - t0),
        frequency_hz: 1e9 / period_ns as f64,
    };
    debug!("analyzer: {:?}", measurement);
    Ok(measurement)
}

/// `|measured - expected| / expected`, the tolerance metric for all
/// timing comparisons.
pub fn relative_error(measured: f64, expected: f64) -> f64 {
    (measured - expected).abs() / expected
}

/// A measurement strictly outside tolerance is a hard failure carrying
/// both values for diagnosis.
pub fn check_tolerance(measured: f64, expected: f64, tolerance: f64) -> Result<(), Error> {
    if relative_error(measured, expected) > tolerance {
        return Err(Error::ToleranceExceeded(measured, expected, tolerance));
    }
    Ok(())
}
