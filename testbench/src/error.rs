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

use std::fmt;

#[derive(Debug, PartialEq)]
pub enum Error {
    /// Address does not fit in 7 bits; no wire activity took place.
    InvalidAddress(u16),
    /// Payload does not fit in 8 bits; no wire activity took place.
    InvalidData(u16),
    /// The monitored signal never produced the expected transition
    /// within the observation window (value in nanoseconds).
    NoEdgeDetected(u64),
    /// Measured value deviates from the expected one by more than the
    /// allowed relative error: (measured, expected, tolerance).
    ToleranceExceeded(f64, f64, f64),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidAddress(addr) => {
                write!(f, "ERROR: Address {:#x} does not fit in 7 bits", addr)
            }
            Self::InvalidData(data) => {
                write!(f, "ERROR: Payload {:#x} does not fit in 8 bits", data)
            }
            Self::NoEdgeDetected(window) => {
                write!(f, "ERROR: No edge detected within {} ns", window)
            }
            Self::ToleranceExceeded(measured, expected, tolerance) => {
                write!(
                    f,
                    "ERROR: Measured {} vs expected {} exceeds relative error {}",
                    measured, expected, tolerance
                )
            }
        }
    }
}

// this is needed to allow `anyhow::Result` to accept our definition of
// errors; the scenario runner composes everything through anyhow.
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}
