// HartSim - RISC-V Firmware Simulator
// Copyright (C) 2026 HartSim Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::memory::LinearMemory;
use crate::peripherals::uart::Uart;
use crate::{Peripheral, SimResult, SimulationError};
use hartsim_config::BoardConfig;

// Default memory map:
// - Reserved : 0x0000_0000 - 0x1fff_ffff
// - UART     : 0x2000_0000 - 0x2000_0fff
// - Reserved : 0x2000_1000 - 0x7fff_ffff
// - RAM      : 0x8000_0000 - 0x800f_ffff
// - Reserved : 0x8010_0000 - 0xffff_ffff
pub const UART0_BASE: u64 = 0x2000_0000;
pub const UART0_SIZE: u64 = 0x1000;
pub const RAM_BASE: u64 = 0x8000_0000;
pub const RAM_SIZE: usize = 0x10_0000;

/// A peripheral mounted at a window of the address space.
pub struct PeripheralEntry {
    pub name: String,
    pub base: u64,
    pub size: u64,
    pub dev: Box<dyn Peripheral>,
}

impl PeripheralEntry {
    fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.base + self.size
    }
}

pub struct SystemBus {
    pub ram: LinearMemory,
    pub peripherals: Vec<PeripheralEntry>,
}

impl SystemBus {
    /// The built-in board: 1 MiB of RAM and one transmit-only UART.
    pub fn new() -> Self {
        Self {
            ram: LinearMemory::new(RAM_SIZE, RAM_BASE),
            peripherals: vec![PeripheralEntry {
                name: "uart0".to_string(),
                base: UART0_BASE,
                size: UART0_SIZE,
                dev: Box::new(Uart::new()),
            }],
        }
    }

    /// Build the address space a board file describes.
    pub fn from_config(board: &BoardConfig) -> anyhow::Result<Self> {
        board.validate()?;

        let ram_size = hartsim_config::parse_size(&board.ram.size)?;
        let mut peripherals = Vec::new();
        for p in &board.peripherals {
            let size = match &p.size {
                Some(s) => hartsim_config::parse_size(s)?,
                None => UART0_SIZE,
            };
            match p.r#type.as_str() {
                "uart" => peripherals.push(PeripheralEntry {
                    name: p.id.clone(),
                    base: p.base_address,
                    size,
                    dev: Box::new(Uart::new()),
                }),
                other => anyhow::bail!("unsupported peripheral type '{}'", other),
            }
        }

        Ok(Self {
            ram: LinearMemory::new(ram_size as usize, board.ram.base),
            peripherals,
        })
    }

    /// Look up a mounted peripheral by name, downcast to its concrete type.
    pub fn peripheral<T: 'static>(&self, name: &str) -> Option<&T> {
        self.peripherals
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.dev.as_any())
            .and_then(|dev| dev.downcast_ref::<T>())
    }

    pub fn peripheral_mut<T: 'static>(&mut self, name: &str) -> Option<&mut T> {
        self.peripherals
            .iter_mut()
            .find(|p| p.name == name)
            .and_then(|p| p.dev.as_any_mut())
            .and_then(|dev| dev.downcast_mut::<T>())
    }
}

impl Default for SystemBus {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::Bus for SystemBus {
    fn read_u8(&self, addr: u64) -> SimResult<u8> {
        if let Some(byte) = self.ram.read_u8(addr) {
            return Ok(byte);
        }
        if let Some(entry) = self.peripherals.iter().find(|p| p.contains(addr)) {
            return entry.dev.read(addr - entry.base);
        }
        Err(SimulationError::MemoryViolation(addr))
    }

    fn write_u8(&mut self, addr: u64, value: u8) -> SimResult<()> {
        if self.ram.write_u8(addr, value) {
            return Ok(());
        }
        if let Some(entry) = self.peripherals.iter_mut().find(|p| p.contains(addr)) {
            return entry.dev.write(addr - entry.base, value);
        }
        Err(SimulationError::MemoryViolation(addr))
    }
}
