// Rivet - RISC-V Firmware Emulation Toolkit
// Copyright (C) 2026 Rivet Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use rivet_core::bus::SystemBus;
use rivet_core::cpu::Rv32;
use rivet_core::metrics::PerformanceMetrics;
use rivet_core::{Cpu, StopReason, System};

/// Rivet RISC-V firmware emulator
#[derive(Parser, Debug)]
#[command(name = "rivet", author, version, about, long_about = None)]
struct Args {
    /// Path to the firmware ELF file
    #[arg(short, long)]
    firmware: PathBuf,

    /// Path to a machine descriptor (YAML)
    #[arg(short, long)]
    machine: Option<PathBuf>,

    /// Enable instruction-level execution tracing
    #[arg(short, long)]
    trace: bool,

    /// Maximum number of steps to execute
    #[arg(long, default_value = "20000")]
    max_steps: u64,

    /// Write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.trace {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("Starting Rivet emulator");

    let bus = if let Some(machine_path) = &args.machine {
        info!("Loading machine descriptor: {:?}", machine_path);
        let machine = rivet_config::MachineDescriptor::from_file(machine_path)?;
        info!("Machine: {}", machine.name);
        SystemBus::from_config(&machine)?
    } else {
        info!(
            "Using default machine (256 MB RAM, TTY at {:#x})",
            SystemBus::DEFAULT_TTY_BASE
        );
        SystemBus::new()
    };

    info!("Loading firmware: {:?}", args.firmware);
    let program = rivet_loader::load_elf(&args.firmware)?;
    info!("Entry point: {:#x}", program.entry_point);

    let metrics = Arc::new(PerformanceMetrics::new());
    let mut system = System::new(Rv32::new(), bus);
    system.observers.push(metrics.clone());
    system
        .load_image(&program)
        .map_err(|e| anyhow::anyhow!("Failed to load firmware into memory: {e}"))?;

    info!("Running for up to {} steps...", args.max_steps);
    let report = system.run(args.max_steps);

    info!(
        "Run finished: {:?} after {} steps ({:.0} inst/s), final PC {:#010x}",
        report.stop_reason,
        report.steps,
        metrics.instructions_per_second(),
        system.cpu.pc()
    );
    if let Some(fault) = &report.fault {
        error!("{fault}");
    }

    if let Some(path) = &args.summary {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .map_err(|e| anyhow::anyhow!("Failed to write run summary: {e}"))?;
        info!("Wrote run summary to {:?}", path);
    }

    match report.stop_reason {
        StopReason::Halt | StopReason::MaxSteps => Ok(()),
        StopReason::BusFault | StopReason::IllegalInstruction => anyhow::bail!(
            "Emulation stopped on a fault: {}",
            report.fault.as_deref().unwrap_or("unknown")
        ),
    }
}
