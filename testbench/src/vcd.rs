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

//! VCD waveform dumps of the wire-level interface.
//!
//! Every simulation cycle records the three input wires and the two
//! output words; values are deduplicated so the file only grows when a
//! signal actually changes. Once a write fails the trace goes into an
//! error state and further recording is a no-op, so a full disk cannot
//! take the simulation down with it.

use crate::wires::WireState;
use bitvec::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

const DEFAULT_VCD_HEADER: &str = "testbench VCD";
const TOP_MODULE: &str = "testbench";

const WIRE_VARS: [(&str, usize); 5] = [
    ("ncs", 1),
    ("copi", 1),
    ("sclk", 1),
    ("uo_out", 8),
    ("uio_out", 8),
];

pub struct VcdTrace {
    writer: vcd::Writer<fs::File>,
    is_error_state: bool,
    id_map: HashMap<&'static str, vcd::IdCode>,
    last_value_map: HashMap<vcd::IdCode, BitBox<usize, Lsb0>>,
}

impl VcdTrace {
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = fs::File::create(path.as_ref())?;
        let mut writer = vcd::Writer::new(file);
        writer.comment(DEFAULT_VCD_HEADER)?;
        writer.date(chrono::Utc::now().to_string().as_str())?;
        writer.timescale(1, vcd::TimescaleUnit::NS)?;
        writer.add_module(TOP_MODULE)?;
        let mut id_map = HashMap::new();
        for (name, width) in WIRE_VARS.iter() {
            let id = writer.add_var(vcd::VarType::Wire, *width as u32, name, None)?;
            id_map.insert(*name, id);
        }
        writer.upscope()?;
        writer.enddefinitions()?;
        log::debug!("VCD file: {:?}", path.as_ref());
        Ok(Self {
            writer,
            is_error_state: false,
            id_map,
            last_value_map: HashMap::new(),
        })
    }

    fn vcd_error_handler(&mut self, err: io::Error) {
        if !self.is_error_state {
            self.is_error_state = true;
            log::error!("VCD writing failed with error {:?}", err);
        }
    }

    pub fn record_cycle(&mut self, time_ns: u64, wires: WireState, primary: u8, secondary: u8) {
        if self.is_error_state {
            return;
        }
        self._record_cycle(time_ns, wires, primary, secondary)
            .unwrap_or_else(|err| self.vcd_error_handler(err));
    }

    fn _record_cycle(
        &mut self,
        time_ns: u64,
        wires: WireState,
        primary: u8,
        secondary: u8,
    ) -> io::Result<()> {
        let values = vec![
            ("ncs", to_bits(wires.chip_select as u8, 1)),
            ("copi", to_bits(wires.data as u8, 1)),
            ("sclk", to_bits(wires.clock as u8, 1)),
            ("uo_out", to_bits(primary, 8)),
            ("uio_out", to_bits(secondary, 8)),
        ];
        let changes: Vec<(vcd::IdCode, BitBox<usize, Lsb0>)> = values
            .into_iter()
            .filter_map(|(name, bits)| {
                let id_code = self.id_map[name];
                if self.last_value_map.get(&id_code) == Some(&bits) {
                    None
                } else {
                    Some((id_code, bits))
                }
            })
            .collect();
        if changes.is_empty() {
            return Ok(());
        }
        self.writer.timestamp(time_ns)?;
        for (id_code, bits) in changes {
            self.writer.change_vector(
                id_code,
                bits.iter()
                    .rev()
                    .map(|b| (*b).into())
                    .collect::<Vec<_>>()
                    .as_slice(),
            )?;
            self.last_value_map.insert(id_code, bits);
        }
        Ok(())
    }
}

fn to_bits(value: u8, width: usize) -> BitBox<usize, Lsb0> {
    let mut bits = BitVec::repeat(false, width);
    for i in 0..width {
        bits.set(i, value & (1 << i) != 0);
    }
    bits.into_boxed_bitslice()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_bits() {
        let bits = to_bits(0b1010_0001, 8);
        assert!(bits[0]);
        assert!(!bits[1]);
        assert!(bits[5]);
        assert!(bits[7]);
    }

    #[test]
    fn test_trace_dedupes_unchanged_cycles() {
        let path = std::env::temp_dir().join("testbench_vcd_dedupe.vcd");
        let mut trace = VcdTrace::create(&path).unwrap();
        let wires = WireState::idle();
        for cycle in 0..10u64 {
            trace.record_cycle(cycle * 100, wires, 0, 0);
        }
        drop(trace);
        let contents = std::fs::read_to_string(&path).unwrap();
        // Only the first cycle produces a timestamp; the rest change nothing.
        let timestamps = contents.lines().filter(|l| l.starts_with('#')).count();
        assert_eq!(timestamps, 1);
        std::fs::remove_file(&path).ok();
    }
}
