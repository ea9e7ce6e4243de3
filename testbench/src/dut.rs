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

//! Device-under-test modeling.
//!
//! The harness only ever talks to the peripheral through its packed
//! input word and observes it through its two output words; the
//! `Peripheral` trait is that seam. `PwmPeripheral` is the reference
//! model used by the scenarios: a register file written over the serial
//! interface, gating a shared fixed-rate pulse generator onto the
//! output bits.

use crate::wires::WireState;
use log::{debug, trace};

/// One addressable peripheral stepped by the simulation clock.
pub trait Peripheral {
    fn reset(&mut self);

    /// Advance internal state by one clock cycle with the given input
    /// word applied.
    fn step(&mut self, input: u8);

    /// Primary 8-bit output word; bit 0 carries the monitored pulse.
    fn primary_out(&self) -> u8;

    /// Secondary 8-bit (bidirectional-output) word.
    fn secondary_out(&self) -> u8;
}

/// Number of registers the peripheral decodes; writes above this range
/// are silently dropped by the device.
pub const REGISTER_COUNT: usize = 5;

pub const REG_OUT_ENABLE_LO: u8 = 0x00;
pub const REG_OUT_ENABLE_HI: u8 = 0x01;
pub const REG_PWM_ENABLE_LO: u8 = 0x02;
pub const REG_PWM_ENABLE_HI: u8 = 0x03;
pub const REG_PWM_DUTY: u8 = 0x04;

/// Pulse generator period in clock cycles. 3333 cycles at the 100 ns
/// clock is a 3000.3 Hz pulse, within the 1% calibration tolerance of
/// the nominal 3 kHz output.
pub const PWM_PERIOD_CYCLES: u32 = 3333;

pub struct PwmPeripheral {
    regs: [u8; REGISTER_COUNT],
    /// Serial receiver: bits sampled since chip select went low.
    shift: u16,
    bits_sampled: u8,
    prev_wires: WireState,
    pwm_counter: u32,
    pwm_level: bool,
}

impl PwmPeripheral {
    pub fn new() -> Self {
        Self {
            regs: [0; REGISTER_COUNT],
            shift: 0,
            bits_sampled: 0,
            prev_wires: WireState::idle(),
            pwm_counter: 0,
            pwm_level: false,
        }
    }

    /// High-time threshold of the pulse generator for the current duty
    /// register value, in clock cycles.
    fn duty_threshold(&self) -> u32 {
        self.regs[REG_PWM_DUTY as usize] as u32 * PWM_PERIOD_CYCLES / 255
    }

    /// Latch a completed 16-bit frame into the register file. Read
    /// frames and writes outside the register map are ignored; the
    /// controller cannot observe the difference except through the
    /// output words.
    fn commit_frame(&mut self) {
        let write = self.shift & 0x8000 != 0;
        let address = ((self.shift >> 8) & 0x7F) as u8;
        let data = (self.shift & 0xFF) as u8;
        if write && (address as usize) < REGISTER_COUNT {
            debug!("peripheral: reg {:#04x} <- {:#04x}", address, data);
            self.regs[address as usize] = data;
        } else {
            debug!(
                "peripheral: dropping frame (write={}, address={:#04x})",
                write, address
            );
        }
    }

    fn output_word(&self, enables: u8, pwm_enables: u8) -> u8 {
        let mut word = 0u8;
        for bit in 0..8 {
            let enabled = enables & (1 << bit) != 0;
            let pwm_gated = pwm_enables & (1 << bit) != 0;
            let level = enabled && (!pwm_gated || self.pwm_level);
            word |= (level as u8) << bit;
        }
        word
    }
}

impl Default for PwmPeripheral {
    fn default() -> Self {
        Self::new()
    }
}

impl Peripheral for PwmPeripheral {
    fn reset(&mut self) {
        self.regs = [0; REGISTER_COUNT];
        self.shift = 0;
        self.bits_sampled = 0;
        self.prev_wires = WireState::idle();
        self.pwm_counter = 0;
        self.pwm_level = false;
    }

    fn step(&mut self, input: u8) {
        let wires = WireState::unpack(input);

        if self.prev_wires.chip_select && !wires.chip_select {
            // Transaction start: clear the receiver.
            self.shift = 0;
            self.bits_sampled = 0;
        }
        if !wires.chip_select && wires.clock && !self.prev_wires.clock {
            // Data is sampled on the rising clock edge.
            self.shift = (self.shift << 1) | wires.data as u16;
            self.bits_sampled = self.bits_sampled.saturating_add(1);
            trace!(
                "peripheral: sampled bit {} ({})",
                self.bits_sampled,
                wires.data as u8
            );
        }
        if !self.prev_wires.chip_select && wires.chip_select {
            // Chip select released: act on the frame if it is complete.
            if self.bits_sampled == 16 {
                self.commit_frame();
            } else {
                debug!(
                    "peripheral: chip select released after {} bits, frame dropped",
                    self.bits_sampled
                );
            }
            self.shift = 0;
            self.bits_sampled = 0;
        }
        self.prev_wires = wires;

        self.pwm_counter = (self.pwm_counter + 1) % PWM_PERIOD_CYCLES;
        self.pwm_level = self.pwm_counter < self.duty_threshold();
    }

    fn primary_out(&self) -> u8 {
        self.output_word(
            self.regs[REG_OUT_ENABLE_LO as usize],
            self.regs[REG_PWM_ENABLE_LO as usize],
        )
    }

    fn secondary_out(&self) -> u8 {
        self.output_word(
            self.regs[REG_OUT_ENABLE_HI as usize],
            self.regs[REG_PWM_ENABLE_HI as usize],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Clock one full serial frame into the model, the way the driver
    /// would: data set with the clock low, then a rising clock edge.
    fn clock_in_frame(dut: &mut PwmPeripheral, word: u16) {
        dut.step(WireState::start().pack());
        for i in (0..16).rev() {
            let data = word & (1 << i) != 0;
            let low = WireState {
                chip_select: false,
                clock: false,
                data,
            };
            let high = WireState {
                chip_select: false,
                clock: true,
                data,
            };
            dut.step(low.pack());
            dut.step(high.pack());
        }
        let end = WireState::idle();
        dut.step(end.pack());
    }

    #[test]
    fn test_write_sets_register_and_output() {
        let mut dut = PwmPeripheral::new();
        clock_in_frame(&mut dut, 0x80F0); // write 0xF0 to 0x00
        assert_eq!(dut.primary_out(), 0xF0);
        assert_eq!(dut.secondary_out(), 0x00);
    }

    #[test]
    fn test_secondary_word_register() {
        let mut dut = PwmPeripheral::new();
        clock_in_frame(&mut dut, 0x81CC); // write 0xCC to 0x01
        assert_eq!(dut.secondary_out(), 0xCC);
        assert_eq!(dut.primary_out(), 0x00);
    }

    #[test]
    fn test_read_frame_changes_nothing() {
        let mut dut = PwmPeripheral::new();
        clock_in_frame(&mut dut, 0x80F0);
        clock_in_frame(&mut dut, 0x00BE); // read direction, same address
        assert_eq!(dut.primary_out(), 0xF0);
    }

    #[test]
    fn test_out_of_map_write_ignored() {
        let mut dut = PwmPeripheral::new();
        clock_in_frame(&mut dut, 0x80F0);
        clock_in_frame(&mut dut, 0xB0AA); // write 0xAA to 0x30
        assert_eq!(dut.primary_out(), 0xF0);
    }

    #[test]
    fn test_short_frame_dropped() {
        let mut dut = PwmPeripheral::new();
        // Only 8 bits before chip select is released.
        dut.step(WireState::start().pack());
        for _ in 0..8 {
            dut.step(0b010); // data high, clock low
            dut.step(0b011); // data high, clock high
        }
        dut.step(WireState::idle().pack());
        assert_eq!(dut.primary_out(), 0x00);
        assert_eq!(dut.secondary_out(), 0x00);
    }

    #[test]
    fn test_pwm_gates_enabled_bit() {
        let mut dut = PwmPeripheral::new();
        clock_in_frame(&mut dut, 0x8201); // pwm enable bit 0
        clock_in_frame(&mut dut, 0x8001); // out enable bit 0
        clock_in_frame(&mut dut, 0x8480); // duty 0x80, roughly half
        let mut high = 0u32;
        for _ in 0..PWM_PERIOD_CYCLES {
            dut.step(WireState::idle().pack());
            high += (dut.primary_out() & 1) as u32;
        }
        let expected = 0x80 as u32 * PWM_PERIOD_CYCLES / 255;
        // One full period contains exactly threshold high cycles.
        assert_eq!(high, expected);
    }

    #[test]
    fn test_pwm_duty_extremes() {
        let mut dut = PwmPeripheral::new();
        clock_in_frame(&mut dut, 0x8201);
        clock_in_frame(&mut dut, 0x8001);
        // Duty 0: output never rises.
        for _ in 0..2 * PWM_PERIOD_CYCLES {
            dut.step(WireState::idle().pack());
            assert_eq!(dut.primary_out() & 1, 0);
        }
        clock_in_frame(&mut dut, 0x84FF);
        // Duty 255: output never falls.
        for _ in 0..2 * PWM_PERIOD_CYCLES {
            dut.step(WireState::idle().pack());
            assert_eq!(dut.primary_out() & 1, 1);
        }
    }
}
