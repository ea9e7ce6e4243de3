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

//! Verification testbench for a register-mapped PWM peripheral driven
//! over a three-wire synchronous serial interface.
//!
//! Two independent components do the real work: the transaction driver
//! serializes read/write frames onto the wires with explicit
//! half-period timing, and the edge timing analyzer measures the
//! frequency and duty cycle of the peripheral's pulse output. Both run
//! against a per-scenario `Simulation` context in discrete time.

mod analyzer;
mod config;
mod driver;
mod dut;
mod error;
mod sim;
mod vcd;
mod wires;

// Public types
// type to use for clock cycles
pub type Cycle = usize;

pub use crate::analyzer::{
    await_falling_edge, await_rising_edge, check_tolerance, measure_duty_cycle,
    measure_frequency, relative_error,
};
pub use crate::analyzer::{EdgeObservation, OutputWord, Probe, TimingMeasurement};
pub use crate::config::TimingConfig;
pub use crate::driver::{Direction, SerialFrame, SpiDriver, FRAME_BITS};
pub use crate::dut::{Peripheral, PwmPeripheral, PWM_PERIOD_CYCLES};
pub use crate::dut::{
    REG_OUT_ENABLE_HI, REG_OUT_ENABLE_LO, REG_PWM_DUTY, REG_PWM_ENABLE_HI, REG_PWM_ENABLE_LO,
};
pub use crate::error::Error;
pub use crate::sim::Simulation;
pub use crate::vcd::VcdTrace;
pub use crate::wires::{WireState, COPI_BIT, NCS_BIT, SCLK_BIT};
