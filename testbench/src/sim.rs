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

//! Discrete-time simulation context.
//!
//! One `Simulation` is created per scenario and owns everything the
//! scenario mutates: the monotonic clock, the peripheral's input word,
//! the peripheral itself, and the optional waveform trace. The driver
//! writes the input wires and the analyzer reads the output words; the
//! two never share state beyond this context.
//!
//! All waits are cooperative: callers advance the simulation one clock
//! cycle at a time (`step`) or until a deadline (`wait_ns`) instead of
//! spinning on wall-clock time.

use crate::config::TimingConfig;
use crate::dut::Peripheral;
use crate::vcd::VcdTrace;
use crate::wires::WireState;
use crate::Cycle;

/// Cycles the peripheral is held in reset, then released, before a
/// scenario starts driving transactions.
const RESET_CYCLES: Cycle = 10;

pub struct Simulation {
    time_ns: u64,
    clock_period_ns: u64,
    input: u8,
    dut: Box<dyn Peripheral>,
    trace: Option<VcdTrace>,
}

impl Simulation {
    pub fn new(dut: Box<dyn Peripheral>, config: &TimingConfig) -> Self {
        Self {
            time_ns: 0,
            clock_period_ns: config.clock_period_ns,
            input: WireState::idle().pack(),
            dut,
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: VcdTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Monotonic simulated time.
    pub fn now_ns(&self) -> u64 {
        self.time_ns
    }

    pub fn clock_period_ns(&self) -> u64 {
        self.clock_period_ns
    }

    /// Set the wire states the peripheral will see on subsequent steps.
    pub fn drive(&mut self, wires: WireState) {
        self.input = wires.pack();
    }

    pub fn wires(&self) -> WireState {
        WireState::unpack(self.input)
    }

    /// Advance one clock cycle: the peripheral observes the current
    /// input word and time moves forward by one period.
    pub fn step(&mut self) {
        self.dut.step(self.input);
        self.time_ns += self.clock_period_ns;
        if let Some(trace) = &mut self.trace {
            trace.record_cycle(
                self.time_ns,
                WireState::unpack(self.input),
                self.dut.primary_out(),
                self.dut.secondary_out(),
            );
        }
    }

    pub fn step_cycles(&mut self, cycles: Cycle) {
        for _ in 0..cycles {
            self.step();
        }
    }

    /// Suspend until `duration` of simulated time has elapsed, polling
    /// one clock cycle at a time.
    pub fn wait_ns(&mut self, duration: u64) {
        let deadline = self.time_ns + duration;
        while self.time_ns < deadline {
            self.step();
        }
    }

    pub fn primary_out(&self) -> u8 {
        self.dut.primary_out()
    }

    pub fn secondary_out(&self) -> u8 {
        self.dut.secondary_out()
    }

    /// Reset sequencing: bus idle, peripheral reset, then a short hold
    /// so the peripheral comes up in a known state.
    pub fn reset(&mut self) {
        self.drive(WireState::idle());
        self.dut.reset();
        self.step_cycles(RESET_CYCLES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dut::PwmPeripheral;

    #[test]
    fn test_time_advances_by_clock_period() {
        let config = TimingConfig::default();
        let mut sim = Simulation::new(Box::new(PwmPeripheral::new()), &config);
        assert_eq!(sim.now_ns(), 0);
        sim.step();
        assert_eq!(sim.now_ns(), config.clock_period_ns);
        sim.step_cycles(9);
        assert_eq!(sim.now_ns(), 10 * config.clock_period_ns);
    }

    #[test]
    fn test_wait_ns_rounds_up_to_whole_cycles() {
        let config = TimingConfig::default();
        let mut sim = Simulation::new(Box::new(PwmPeripheral::new()), &config);
        // 50 ns requested, but the polling granularity is 100 ns.
        sim.wait_ns(config.sclk_half_period_ns);
        assert_eq!(sim.now_ns(), 100);
        sim.wait_ns(250);
        assert_eq!(sim.now_ns(), 400);
    }

    #[test]
    fn test_reset_returns_outputs_to_zero() {
        let config = TimingConfig::default();
        let mut sim = Simulation::new(Box::new(PwmPeripheral::new()), &config);
        sim.reset();
        assert_eq!(sim.primary_out(), 0);
        assert_eq!(sim.secondary_out(), 0);
        assert!(sim.wires().chip_select);
    }
}
