// HartSim - RISC-V Firmware Simulator
// Copyright (C) 2026 HartSim Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use clap::Parser;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use hartsim_core::bus::SystemBus;
use hartsim_core::cpu::Rv32;
use hartsim_core::disasm::Tracer;
use hartsim_core::metrics::PerformanceMetrics;
use hartsim_core::peripherals::uart::Uart;
use hartsim_core::{Cpu, Machine};

/// HartSim RISC-V firmware simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the firmware ELF file
    firmware: PathBuf,

    /// Path to a board description (YAML)
    #[arg(short, long)]
    board: Option<PathBuf>,

    /// Print a disassembly line for every executed instruction
    #[arg(short, long)]
    trace: bool,

    /// Maximum number of instructions to execute
    #[arg(long, default_value = "5000")]
    max_steps: u64,

    /// Write the final machine state as JSON
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Do not echo UART output to stdout
    #[arg(long)]
    no_uart_stdout: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.trace {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting HartSim");

    let bus = if let Some(board_path) = &args.board {
        info!("Loading board description: {:?}", board_path);
        let board = hartsim_config::BoardConfig::from_file(board_path)?;
        SystemBus::from_config(&board)?
    } else {
        info!("Using the built-in board");
        SystemBus::new()
    };

    let mut machine: Machine<Rv32> = Machine::with_bus(bus);

    if !args.no_uart_stdout {
        for entry in machine.bus.peripherals.iter_mut() {
            if let Some(uart) = entry
                .dev
                .as_any_mut()
                .and_then(|dev| dev.downcast_mut::<Uart>())
            {
                uart.set_stdout_echo(true);
            }
        }
    }

    machine.observers.push(Arc::new(PerformanceMetrics::new()));
    if args.trace {
        machine.observers.push(Arc::new(Tracer::new()));
    }

    info!("Loading firmware: {:?}", args.firmware);
    let raw = std::fs::read(&args.firmware)
        .with_context(|| format!("Failed to read firmware at {:?}", args.firmware))?;
    let digest = Sha256::digest(&raw);
    let digest_hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    info!("Firmware SHA-256: {}", digest_hex);

    let program = hartsim_loader::parse_elf(&raw)?;
    info!("Entry point: {:#x}", program.entry_point);

    machine.load_firmware(&program);

    info!("Running for up to {} steps...", args.max_steps);
    for step in 0..args.max_steps {
        if let Err(e) = machine.step() {
            error!("Simulation stopped at step {}: {}", step, e);
            break;
        }
    }
    machine.finish();

    if let Some(path) = &args.snapshot {
        let snapshot = machine.snapshot();
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot to {:?}", path))?;
        info!("Snapshot written to {:?}", path);
    }

    // The firmware reports its exit status through gp (x3): 1 means success.
    let gp = machine.cpu.register(3);
    info!("Final PC: {:#010x}, gp = {}", machine.cpu.pc(), gp);

    if gp == 1 {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
