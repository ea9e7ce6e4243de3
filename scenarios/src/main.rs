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

//! End-to-end verification scenarios against the reference peripheral:
//! register round trips over the serial interface, then frequency and
//! duty-cycle measurements of the pulse output.
//!
//! Usage: scenarios [--config timing.yaml] [--vcd <basename>]
//!
//! With `--vcd`, each scenario dumps its waveforms to
//! `<basename>_<scenario>.vcd`.

use anyhow::{bail, ensure, Context};
use log::info;
use testbench::{
    check_tolerance, measure_duty_cycle, measure_frequency, Direction, Probe, PwmPeripheral,
    Simulation, SpiDriver, TimingConfig, VcdTrace, REG_OUT_ENABLE_LO, REG_PWM_DUTY,
    REG_PWM_ENABLE_LO,
};

const EXPECTED_FREQ_HZ: f64 = 3000.0;
const DUTY_TEST_VALUES: [u16; 2] = [0x0F, 0xD1];

struct Options {
    config: TimingConfig,
    vcd_base: Option<String>,
}

fn parse_args() -> anyhow::Result<Options> {
    let mut config = None;
    let mut vcd_base = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config requires a path")?;
                config = Some(TimingConfig::from_file(&path)?);
            }
            "--vcd" => {
                vcd_base = Some(args.next().context("--vcd requires a basename")?);
            }
            other => bail!("Unknown argument: {}", other),
        }
    }
    Ok(Options {
        config: config.unwrap_or_default(),
        vcd_base,
    })
}

fn new_simulation(options: &Options, scenario: &str) -> anyhow::Result<Simulation> {
    let mut sim = Simulation::new(Box::new(PwmPeripheral::new()), &options.config);
    if let Some(base) = &options.vcd_base {
        let path = format!("{}_{}.vcd", base, scenario);
        sim = sim.with_trace(VcdTrace::create(&path)?);
    }
    sim.reset();
    Ok(sim)
}

/// Write both output-word registers and read them back through the
/// output pins; exercise invalid addresses and read-direction frames.
fn run_register_scenario(options: &Options) -> anyhow::Result<()> {
    info!("Start register scenario");
    let mut sim = new_simulation(options, "register")?;
    let driver = SpiDriver::new(&options.config);

    info!("Write transaction, address 0x00, data 0xF0");
    driver.send_transaction(&mut sim, Direction::Write, 0x00, 0xF0)?;
    ensure!(
        sim.primary_out() == 0xF0,
        "Expected 0xF0, got {:#04x}",
        sim.primary_out()
    );

    info!("Write transaction, address 0x01, data 0xCC");
    driver.send_transaction(&mut sim, Direction::Write, 0x01, 0xCC)?;
    ensure!(
        sim.secondary_out() == 0xCC,
        "Expected 0xCC, got {:#04x}",
        sim.secondary_out()
    );

    info!("Write transaction, address 0x30 (out of map), data 0xAA");
    driver.send_transaction(&mut sim, Direction::Write, 0x30, 0xAA)?;

    info!("Read transaction, address 0x30, data 0xBE");
    driver.send_transaction(&mut sim, Direction::Read, 0x30, 0xBE)?;
    ensure!(
        sim.primary_out() == 0xF0,
        "Register 0x00 was disturbed: {:#04x}",
        sim.primary_out()
    );

    info!("Register scenario completed successfully");
    Ok(())
}

/// Route the pulse generator to primary bit 0.
fn enable_pwm(sim: &mut Simulation, driver: &SpiDriver) -> anyhow::Result<()> {
    driver.send_transaction(sim, Direction::Write, REG_PWM_ENABLE_LO as u16, 0x01)?;
    driver.send_transaction(sim, Direction::Write, REG_OUT_ENABLE_LO as u16, 0x01)?;
    Ok(())
}

fn run_frequency_scenario(options: &Options) -> anyhow::Result<()> {
    info!("Start pulse frequency scenario");
    let mut sim = new_simulation(options, "frequency")?;
    let driver = SpiDriver::new(&options.config);
    enable_pwm(&mut sim, &driver)?;

    for duty in DUTY_TEST_VALUES.iter() {
        driver.send_transaction(&mut sim, Direction::Write, REG_PWM_DUTY as u16, *duty)?;
        let m = measure_frequency(&mut sim, Probe::primary(0), options.config.edge_timeout_ns)?;
        info!("Measured frequency: {} Hz", m.frequency_hz);
        check_tolerance(
            m.frequency_hz,
            EXPECTED_FREQ_HZ,
            options.config.frequency_tolerance,
        )?;
    }

    info!("Pulse frequency scenario completed successfully");
    Ok(())
}

fn run_duty_scenario(options: &Options) -> anyhow::Result<()> {
    info!("Start duty cycle scenario");
    let mut sim = new_simulation(options, "duty")?;
    let driver = SpiDriver::new(&options.config);
    enable_pwm(&mut sim, &driver)?;

    for duty in DUTY_TEST_VALUES.iter() {
        driver.send_transaction(&mut sim, Direction::Write, REG_PWM_DUTY as u16, *duty)?;
        let m = measure_duty_cycle(&mut sim, Probe::primary(0), options.config.edge_timeout_ns)?;
        let measured = m
            .duty_cycle()
            .context("duty measurement lacks a high time")?;
        let expected = *duty as f64 / 255.0;
        info!("Measured duty cycle: {} (expected {})", measured, expected);
        check_tolerance(measured, expected, options.config.duty_tolerance)?;
    }

    info!("Duty cycle scenario completed successfully");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let options = parse_args()?;
    run_register_scenario(&options)?;
    run_frequency_scenario(&options)?;
    run_duty_scenario(&options)?;
    info!("All scenarios completed successfully");
    Ok(())
}
