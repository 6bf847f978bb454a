// HartSim - RISC-V Firmware Simulator
// Copyright (C) 2026 HartSim Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod bus;
pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod memory;
pub mod metrics;
pub mod peripherals;
pub mod snapshot;

use std::any::Any;
use std::sync::Arc;


#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("memory access violation at {0:#010x}")]
    MemoryViolation(u64),
    #[error("trap (mcause {cause}) at {pc:#010x} with no handler installed")]
    UnhandledTrap { pc: u32, cause: u32 },
}

pub type SimResult<T> = Result<T, SimulationError>;

/// Trait for observing simulation events in a modular way.
pub trait SimulationObserver: std::fmt::Debug + Send + Sync {
    fn on_simulation_start(&self) {}
    fn on_simulation_stop(&self) {}
    /// Called after fetch, before the instruction takes effect.
    fn on_step_start(&self, _pc: u32, _opcode: u32) {}
    /// Called once the instruction has retired.
    fn on_step_end(&self) {}
}

/// Trait representing a CPU core.
pub trait Cpu {
    fn reset(&mut self);
    fn step(
        &mut self,
        bus: &mut dyn Bus,
        observers: &[Arc<dyn SimulationObserver>],
    ) -> SimResult<()>;
    fn pc(&self) -> u32;
    fn set_pc(&mut self, val: u32);
    fn register(&self, n: u8) -> u32;
    fn set_register(&mut self, n: u8, val: u32);
    fn snapshot(&self) -> snapshot::CpuSnapshot;
}

/// Trait representing a memory-mapped peripheral.
///
/// Peripherals see bus addresses relative to their own base. Wider accesses
/// arrive as byte-lane reads/writes, matching the register-file granularity
/// of the modeled hardware.
pub trait Peripheral: std::fmt::Debug + Send {
    fn read(&self, offset: u64) -> SimResult<u8>;
    fn write(&mut self, offset: u64, value: u8) -> SimResult<()>;
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
}

/// Trait representing the system bus.
pub trait Bus {
    fn read_u8(&self, addr: u64) -> SimResult<u8>;
    fn write_u8(&mut self, addr: u64, value: u8) -> SimResult<()>;

    // Little endian
    fn read_u16(&self, addr: u64) -> SimResult<u16> {
        let b0 = self.read_u8(addr)? as u16;
        let b1 = self.read_u8(addr + 1)? as u16;
        Ok(b0 | (b1 << 8))
    }

    fn read_u32(&self, addr: u64) -> SimResult<u32> {
        let b0 = self.read_u8(addr)? as u32;
        let b1 = self.read_u8(addr + 1)? as u32;
        let b2 = self.read_u8(addr + 2)? as u32;
        let b3 = self.read_u8(addr + 3)? as u32;
        Ok(b0 | (b1 << 8) | (b2 << 16) | (b3 << 24))
    }

    fn write_u16(&mut self, addr: u64, value: u16) -> SimResult<()> {
        self.write_u8(addr, (value & 0xFF) as u8)?;
        self.write_u8(addr + 1, ((value >> 8) & 0xFF) as u8)?;
        Ok(())
    }

    fn write_u32(&mut self, addr: u64, value: u32) -> SimResult<()> {
        self.write_u8(addr, (value & 0xFF) as u8)?;
        self.write_u8(addr + 1, ((value >> 8) & 0xFF) as u8)?;
        self.write_u8(addr + 2, ((value >> 16) & 0xFF) as u8)?;
        self.write_u8(addr + 3, ((value >> 24) & 0xFF) as u8)?;
        Ok(())
    }
}

/// A CPU wired to a bus, plus any attached observers.
pub struct Machine<C: Cpu> {
    pub cpu: C,
    pub bus: bus::SystemBus,
    pub observers: Vec<Arc<dyn SimulationObserver>>,
}

impl<C: Cpu + Default> Machine<C> {
    pub fn new() -> Self {
        Self::with_bus(bus::SystemBus::new())
    }

    pub fn with_bus(bus: bus::SystemBus) -> Self {
        Self {
            cpu: C::default(),
            bus,
            observers: Vec::new(),
        }
    }
}

impl<C: Cpu + Default> Default for Machine<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Cpu> Machine<C> {
    /// Copy a program image into RAM and point the CPU at its entry point.
    pub fn load_firmware(&mut self, image: &memory::ProgramImage) {
        self.reset();

        for segment in &image.segments {
            if !self.bus.ram.load_from_segment(segment) {
                tracing::warn!(
                    "segment at {:#010x} ({} bytes) lies outside of RAM, skipped",
                    segment.start_addr,
                    segment.data.len()
                );
            }
        }

        for observer in &self.observers {
            observer.on_simulation_start();
        }

        self.cpu.set_pc(image.entry_point as u32);
    }

    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    pub fn step(&mut self) -> SimResult<()> {
        self.cpu.step(&mut self.bus, &self.observers)
    }

    /// Notify observers that the run is over.
    pub fn finish(&self) {
        for observer in &self.observers {
            observer.on_simulation_stop();
        }
    }

    pub fn snapshot(&self) -> snapshot::MachineSnapshot {
        snapshot::MachineSnapshot {
            cpu: self.cpu.snapshot(),
        }
    }
}
