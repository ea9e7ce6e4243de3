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

//! Serial transaction encoding and wire-level driving.
//!
//! A transaction is a fixed 16-bit frame, sent most-significant-bit
//! first as two 8-bit groups: a control byte (direction bit in position
//! 7, 7-bit register address below it) followed by the 8-bit payload.
//! The receiver samples the data line on each rising clock edge, so the
//! driver changes data only while the clock is low and holds each
//! half-period against the simulation's monotonic clock.

use crate::config::TimingConfig;
use crate::error::Error;
use crate::sim::Simulation;
use crate::wires::WireState;
use log::{debug, trace};

pub const FRAME_BITS: usize = 16;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Read,
    Write,
}

impl Direction {
    fn bit(self) -> u16 {
        match self {
            Self::Write => 1,
            Self::Read => 0,
        }
    }
}

/// One validated transaction: direction, 7-bit address, 8-bit payload.
///
/// Construction is the only place range checks happen; a frame that
/// exists is sendable. The wider integer parameters make the
/// out-of-range cases representable so they can be rejected explicitly
/// instead of silently truncated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SerialFrame {
    direction: Direction,
    address: u8,
    payload: u8,
}

impl SerialFrame {
    pub fn new(direction: Direction, address: u16, payload: u16) -> Result<Self, Error> {
        if address > 0x7F {
            return Err(Error::InvalidAddress(address));
        }
        if payload > 0xFF {
            return Err(Error::InvalidData(payload));
        }
        Ok(Self {
            direction,
            address: address as u8,
            payload: payload as u8,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn payload(&self) -> u8 {
        self.payload
    }

    pub fn control_byte(&self) -> u8 {
        ((self.direction.bit() as u8) << 7) | self.address
    }

    /// The full frame as it appears on the wire, bit 15 first.
    pub fn word(&self) -> u16 {
        ((self.control_byte() as u16) << 8) | self.payload as u16
    }

    /// Frame bit by transmission order: index 0 is the direction bit.
    fn bit(&self, index: usize) -> bool {
        debug_assert!(index < FRAME_BITS);
        self.word() & (1 << (FRAME_BITS - 1 - index)) != 0
    }
}

/// Drives frames onto the three-wire interface with explicit
/// half-period timing.
pub struct SpiDriver {
    half_period_ns: u64,
    dwell_ns: u64,
}

impl SpiDriver {
    pub fn new(config: &TimingConfig) -> Self {
        Self {
            half_period_ns: config.sclk_half_period_ns,
            dwell_ns: config.dwell_ns,
        }
    }

    /// Validate and send in one call; on a range violation no wire
    /// activity takes place.
    pub fn send_transaction(
        &self,
        sim: &mut Simulation,
        direction: Direction,
        address: u16,
        payload: u16,
    ) -> Result<WireState, Error> {
        let frame = SerialFrame::new(direction, address, payload)?;
        Ok(self.send(sim, &frame))
    }

    /// Serialize `frame` onto the wires and return the final wire
    /// state (chip select high, clock and data low).
    pub fn send(&self, sim: &mut Simulation, frame: &SerialFrame) -> WireState {
        debug!(
            "driver: {:?} address {:#04x} payload {:#04x}",
            frame.direction(),
            frame.address(),
            frame.payload()
        );
        // Assert chip select one cycle before the first bit.
        sim.drive(WireState::start());
        sim.step();
        for index in 0..FRAME_BITS {
            let data = frame.bit(index);
            trace!("driver: bit {} = {}", index, data as u8);
            // Data changes while the clock is low...
            sim.drive(WireState {
                chip_select: false,
                clock: false,
                data,
            });
            sim.wait_ns(self.half_period_ns);
            // ...and is held across the rising edge, where the
            // peripheral samples it.
            sim.drive(WireState {
                chip_select: false,
                clock: true,
                data,
            });
            sim.wait_ns(self.half_period_ns);
        }
        // Release chip select with clock and data low, then dwell so
        // the peripheral can act on the frame.
        let end = WireState::idle();
        sim.drive(end);
        sim.wait_ns(self.dwell_ns);
        end
    }
}
