pub mod bus;
pub mod cpu;
pub mod decoder;
pub mod memory;
pub mod metrics;
pub mod peripherals;

use std::any::Any;
use std::sync::Arc;

use serde::Serialize;


#[derive(Debug, thiserror::Error)]
pub enum EmulationError {
    #[error("Bus fault: no device mapped at {0:#010x}")]
    BusFault(u64),
    #[error("Illegal instruction {word:#010x} at {pc:#010x}")]
    IllegalInstruction { word: u32, pc: u32 },
}

pub type EmuResult<T> = Result<T, EmulationError>;

/// Outcome of a single executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// The program signalled completion (ECALL/EBREAK).
    Halted,
}

/// Why a run loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Halt,
    MaxSteps,
    BusFault,
    IllegalInstruction,
}

/// Trait for observing emulation events in a modular way.
pub trait EmulationObserver: std::fmt::Debug + Send + Sync {
    fn on_run_start(&self) {}
    fn on_run_stop(&self) {}
    fn on_step_start(&self, _pc: u32, _word: u32) {}
    fn on_step_end(&self) {}
}

/// Trait representing a CPU architecture
pub trait Cpu {
    fn reset(&mut self);
    fn step(
        &mut self,
        bus: &mut dyn Bus,
        observers: &[Arc<dyn EmulationObserver>],
    ) -> EmuResult<StepOutcome>;
    fn set_pc(&mut self, val: u32);
    fn pc(&self) -> u32;
    fn register(&self, n: u8) -> u32;
    fn set_register(&mut self, n: u8, val: u32);
}

/// Trait representing a memory-mapped peripheral
pub trait Peripheral: std::fmt::Debug + Send {
    fn read(&self, offset: u64) -> EmuResult<u8>;
    fn write(&mut self, offset: u64, value: u8) -> EmuResult<()>;
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
}

/// Trait representing the system bus
pub trait Bus {
    fn read_u8(&self, addr: u64) -> EmuResult<u8>;
    fn write_u8(&mut self, addr: u64, value: u8) -> EmuResult<()>;

    fn read_u16(&self, addr: u64) -> EmuResult<u16> {
        let b0 = self.read_u8(addr)? as u16;
        let b1 = self.read_u8(addr + 1)? as u16;
        // Little Endian
        Ok(b0 | (b1 << 8))
    }

    fn read_u32(&self, addr: u64) -> EmuResult<u32> {
        let b0 = self.read_u8(addr)? as u32;
        let b1 = self.read_u8(addr + 1)? as u32;
        let b2 = self.read_u8(addr + 2)? as u32;
        let b3 = self.read_u8(addr + 3)? as u32;
        Ok(b0 | (b1 << 8) | (b2 << 16) | (b3 << 24))
    }

    fn write_u16(&mut self, addr: u64, value: u16) -> EmuResult<()> {
        self.write_u8(addr, (value & 0xFF) as u8)?;
        self.write_u8(addr + 1, ((value >> 8) & 0xFF) as u8)?;
        Ok(())
    }

    fn write_u32(&mut self, addr: u64, value: u32) -> EmuResult<()> {
        self.write_u8(addr, (value & 0xFF) as u8)?;
        self.write_u8(addr + 1, ((value >> 8) & 0xFF) as u8)?;
        self.write_u8(addr + 2, ((value >> 16) & 0xFF) as u8)?;
        self.write_u8(addr + 3, ((value >> 24) & 0xFF) as u8)?;
        Ok(())
    }
}

/// Result of running a [`System`] until it stopped.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub steps: u64,
    pub stop_reason: StopReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

impl RunReport {
    fn stopped(steps: u64, stop_reason: StopReason) -> Self {
        Self {
            steps,
            stop_reason,
            fault: None,
        }
    }

    fn faulted(steps: u64, err: EmulationError) -> Self {
        let stop_reason = match err {
            EmulationError::BusFault(_) => StopReason::BusFault,
            EmulationError::IllegalInstruction { .. } => StopReason::IllegalInstruction,
        };
        Self {
            steps,
            stop_reason,
            fault: Some(err.to_string()),
        }
    }
}

/// A CPU wired to a bus, plus any registered observers.
pub struct System<C: Cpu> {
    pub cpu: C,
    pub bus: bus::SystemBus,
    pub observers: Vec<Arc<dyn EmulationObserver>>,
}

impl<C: Cpu> System<C> {
    pub fn new(mut cpu: C, bus: bus::SystemBus) -> Self {
        cpu.reset();
        Self {
            cpu,
            bus,
            observers: Vec::new(),
        }
    }

    /// Copies every segment of the image into bus memory and points the PC
    /// at the entry point.
    pub fn load_image(&mut self, image: &memory::ProgramImage) -> EmuResult<()> {
        for segment in &image.segments {
            for (i, byte) in segment.data.iter().enumerate() {
                self.bus.write_u8(segment.start_addr + i as u64, *byte)?;
            }
        }
        self.cpu.set_pc(image.entry_point as u32);
        Ok(())
    }

    pub fn step(&mut self) -> EmuResult<StepOutcome> {
        self.cpu.step(&mut self.bus, &self.observers)
    }

    /// Executes until the program halts, a fault occurs, or `max_steps`
    /// instructions have retired.
    ///
    /// A step that leaves the PC unchanged is a jump-to-self, the idle spin
    /// bare-metal firmware parks in after its useful work. It is reported as
    /// [`StopReason::Halt`], not as an error or a timeout.
    pub fn run(&mut self, max_steps: u64) -> RunReport {
        for observer in &self.observers {
            observer.on_run_start();
        }

        let mut steps = 0u64;
        let report = loop {
            if steps >= max_steps {
                break RunReport::stopped(steps, StopReason::MaxSteps);
            }
            let pc_before = self.cpu.pc();
            match self.step() {
                Ok(StepOutcome::Halted) => {
                    break RunReport::stopped(steps + 1, StopReason::Halt);
                }
                Ok(StepOutcome::Continue) => {
                    steps += 1;
                    if self.cpu.pc() == pc_before {
                        tracing::debug!("PC stuck at {:#010x}, treating as halt", pc_before);
                        break RunReport::stopped(steps, StopReason::Halt);
                    }
                }
                Err(e) => break RunReport::faulted(steps, e),
            }
        };

        for observer in &self.observers {
            observer.on_run_stop();
        }
        report
    }
}
