// HartSim - RISC-V Firmware Simulator
// Copyright (C) 2026 HartSim Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! ELF32 firmware loading.

use anyhow::{anyhow, Context, Result};
use goblin::elf::header::EM_RISCV;
use goblin::elf::program_header::PT_LOAD;
use goblin::elf::Elf;
use hartsim_core::memory::ProgramImage;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub fn load_elf(path: &Path) -> Result<ProgramImage> {
    let buffer = fs::read(path).with_context(|| format!("Failed to read ELF file: {:?}", path))?;
    parse_elf(&buffer)
}

/// Parse an in-memory ELF image. Only 32-bit little-endian RISC-V binaries
/// are accepted; everything else is a configuration mistake worth naming.
pub fn parse_elf(buffer: &[u8]) -> Result<ProgramImage> {
    let elf = Elf::parse(buffer).context("Failed to parse ELF binary")?;

    if elf.is_64 {
        return Err(anyhow!("64-bit ELF: the simulated hart is rv32i"));
    }
    if !elf.little_endian {
        return Err(anyhow!("big-endian ELF is not supported"));
    }
    if elf.header.e_machine != EM_RISCV {
        return Err(anyhow!(
            "not a RISC-V binary (e_machine = {})",
            elf.header.e_machine
        ));
    }

    info!("ELF entry point: {:#x}", elf.entry);

    let mut image = ProgramImage::new(elf.entry);

    for ph in &elf.program_headers {
        if ph.p_type != PT_LOAD {
            continue;
        }
        // The physical address (LMA) is where the image gets programmed.
        let start_addr = ph.p_paddr;
        let size = ph.p_filesz as usize;
        let offset = ph.p_offset as usize;

        if size == 0 {
            continue;
        }

        debug!(
            "loadable segment: addr={:#x}, size={} bytes, offset={:#x}",
            start_addr, size, offset
        );

        if offset + size > buffer.len() {
            return Err(anyhow!("segment out of bounds in ELF file"));
        }

        image.add_segment(start_addr, buffer[offset..offset + size].to_vec());
    }

    if image.segments.is_empty() {
        warn!("no loadable segments found in ELF file");
    }

    Ok(image)
}
