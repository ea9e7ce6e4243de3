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

//! The three logical control lines of the serial interface, multiplexed
//! onto the peripheral's 8-bit input word.
//!
//! Bit positions are fixed by the peripheral's pinout: the serial clock
//! on bit 0, the data line (controller-out) on bit 1, and the active-low
//! chip-select on bit 2. All remaining bits of the input word are held
//! at zero for the duration of a transaction.

/// Serial clock line, input word bit 0.
pub const SCLK_BIT: u8 = 0;
/// Data line to the peripheral, input word bit 1.
pub const COPI_BIT: u8 = 1;
/// Active-low chip select, input word bit 2.
pub const NCS_BIT: u8 = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WireState {
    /// Active low: the transaction is in progress while this is false.
    pub chip_select: bool,
    pub clock: bool,
    pub data: bool,
}

impl WireState {
    /// Bus at rest: chip select deasserted, clock and data low.
    pub fn idle() -> Self {
        Self {
            chip_select: true,
            clock: false,
            data: false,
        }
    }

    /// Chip select asserted, clock and data low; the state driven one
    /// step before the first bit of a frame.
    pub fn start() -> Self {
        Self {
            chip_select: false,
            clock: false,
            data: false,
        }
    }

    pub fn pack(&self) -> u8 {
        ((self.chip_select as u8) << NCS_BIT)
            | ((self.data as u8) << COPI_BIT)
            | ((self.clock as u8) << SCLK_BIT)
    }

    pub fn unpack(word: u8) -> Self {
        Self {
            chip_select: word & (1 << NCS_BIT) != 0,
            data: word & (1 << COPI_BIT) != 0,
            clock: word & (1 << SCLK_BIT) != 0,
        }
    }
}

impl std::fmt::Display for WireState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "ncs={} copi={} sclk={}",
            self.chip_select as u8, self.data as u8, self.clock as u8
        )
    }
}
