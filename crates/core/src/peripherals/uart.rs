// HartSim - RISC-V Firmware Simulator
// Copyright (C) 2026 HartSim Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::SimResult;
use bitflags::bitflags;
use std::any::Any;
use std::io::{self, Write};

/// Transmit data register. A byte stored in lane 0 goes out on the line.
pub const TXDATA: u64 = 0x000;
/// Transmit control register. Bit 0 enables the transmitter.
pub const TXCTRL: u64 = 0x008;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TxControl: u8 {
        const TXEN = 0b0000_0001;
    }
}

/// Transmit-only UART.
///
/// The register file is 32 bits wide and byte-lane addressable; the bus
/// delivers wider stores as four lane writes. Only a store to lane 0 of
/// txdata transmits, and only while `TXEN` is set. Disabled stores still
/// latch the register value but emit nothing.
#[derive(Debug, Default)]
pub struct Uart {
    txdata: u32,
    txctrl: u32,
    tx_log: Vec<u8>,
    echo_stdout: bool,
}

impl Uart {
    pub fn new() -> Self {
        Self::default()
    }

    /// A UART that mirrors every transmitted byte to the host's stdout.
    pub fn with_stdout_echo() -> Self {
        Self {
            echo_stdout: true,
            ..Self::default()
        }
    }

    pub fn set_stdout_echo(&mut self, echo: bool) {
        self.echo_stdout = echo;
    }

    pub fn tx_enabled(&self) -> bool {
        TxControl::from_bits_truncate(self.txctrl as u8).contains(TxControl::TXEN)
    }

    /// Every byte transmitted so far, in wire order.
    pub fn transmitted(&self) -> &[u8] {
        &self.tx_log
    }

    fn read_reg(&self, reg: u64) -> u32 {
        match reg {
            TXDATA => self.txdata,
            TXCTRL => self.txctrl,
            _ => 0,
        }
    }

    fn write_reg(&mut self, reg: u64, value: u32) {
        match reg {
            TXDATA => self.txdata = value,
            TXCTRL => self.txctrl = value,
            _ => {}
        }
    }

    fn emit(&mut self, byte: u8) {
        self.tx_log.push(byte);
        if self.echo_stdout {
            let mut out = io::stdout();
            let _ = out.write_all(&[byte]);
            let _ = out.flush();
        }
    }
}

impl crate::Peripheral for Uart {
    fn read(&self, offset: u64) -> SimResult<u8> {
        let lane = (offset & 0x3) as u32;
        let word = self.read_reg(offset & !0x3);
        Ok(((word >> (lane * 8)) & 0xFF) as u8)
    }

    fn write(&mut self, offset: u64, value: u8) -> SimResult<()> {
        let reg = offset & !0x3;
        let lane = (offset & 0x3) as u32;

        let mut word = self.read_reg(reg);
        word &= !(0xFF << (lane * 8));
        word |= (value as u32) << (lane * 8);
        self.write_reg(reg, word);

        if reg == TXDATA && lane == 0 {
            if self.tx_enabled() {
                self.emit(value);
            } else {
                tracing::warn!("txdata store {:#04x} while transmitter is disabled", value);
            }
        }
        Ok(())
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}
