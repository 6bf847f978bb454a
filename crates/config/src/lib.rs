// HartSim - RISC-V Firmware Simulator
// Copyright (C) 2026 HartSim Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Board descriptions: which memory and which peripherals live where.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MemoryRange {
    pub base: u64,
    pub size: String, // e.g. "1 MiB"
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PeripheralConfig {
    pub id: String,
    pub r#type: String, // only "uart" today
    pub base_address: u64,
    #[serde(default)]
    pub size: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BoardConfig {
    pub name: String,
    pub arch: String, // e.g. "rv32i"
    pub ram: MemoryRange,
    #[serde(default)]
    pub peripherals: Vec<PeripheralConfig>,
}

impl Default for BoardConfig {
    /// The built-in board: the memory map the bundled firmware is linked for.
    fn default() -> Self {
        Self {
            name: "hartsim-default".to_string(),
            arch: "rv32i".to_string(),
            ram: MemoryRange {
                base: 0x8000_0000,
                size: "1 MiB".to_string(),
            },
            peripherals: vec![PeripheralConfig {
                id: "uart0".to_string(),
                r#type: "uart".to_string(),
                base_address: 0x2000_0000,
                size: Some("4 KiB".to_string()),
            }],
        }
    }
}

impl BoardConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open board file at {:?}", path.as_ref()))?;
        let board: Self = serde_yaml::from_reader(f).context("Failed to parse board YAML")?;
        board.validate()?;
        Ok(board)
    }

    pub fn validate(&self) -> Result<()> {
        if self.arch != "rv32i" {
            anyhow::bail!(
                "Unsupported arch '{}'. Supported architectures: 'rv32i'",
                self.arch
            );
        }

        let ram_size = parse_size(&self.ram.size)?;
        if ram_size == 0 {
            anyhow::bail!("RAM size must be greater than zero");
        }

        for p in &self.peripherals {
            if p.id.trim().is_empty() {
                anyhow::bail!("Peripheral at {:#x} needs a non-empty id", p.base_address);
            }
        }

        Ok(())
    }
}

/// Parse a human-readable size string ("4 KiB", "1 MB") into bytes.
pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    let s: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}
