// Rivet - RISC-V Firmware Emulation Toolkit
// Copyright (C) 2026 Rivet Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! YAML machine descriptors: where RAM lives and which peripherals are
//! mounted where.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MemoryRange {
    pub base: u64,
    pub size: String, // e.g. "256MB"
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PeripheralConfig {
    pub id: String,
    pub r#type: String, // only "tty" is defined
    pub base_address: u64,
    #[serde(default)]
    pub size: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct MachineDescriptor {
    pub name: String,
    pub ram: MemoryRange,
    #[serde(default)]
    pub peripherals: Vec<PeripheralConfig>,
}

impl MachineDescriptor {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open machine descriptor at {:?}", path.as_ref()))?;
        let descriptor: Self =
            serde_yaml::from_reader(f).context("Failed to parse machine descriptor YAML")?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn validate(&self) -> Result<()> {
        parse_size(&self.ram.size)
            .with_context(|| format!("Invalid RAM size '{}'", self.ram.size))?;

        for peripheral in &self.peripherals {
            if peripheral.r#type != "tty" {
                anyhow::bail!(
                    "Peripheral '{}' has unknown type '{}'",
                    peripheral.id,
                    peripheral.r#type
                );
            }
            if let Some(size) = &peripheral.size {
                parse_size(size).with_context(|| {
                    format!("Peripheral '{}' has invalid size '{}'", peripheral.id, size)
                })?;
            }
        }
        Ok(())
    }
}

pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    let s: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_descriptor() {
        let yaml = r#"
name: rv32-default
ram:
  base: 0x80000000
  size: "256MB"
peripherals:
  - id: tty0
    type: tty
    base_address: 0x10000000
    size: "16B"
"#;
        let descriptor: MachineDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert!(descriptor.validate().is_ok());
        assert_eq!(descriptor.name, "rv32-default");
        assert_eq!(descriptor.ram.base, 0x8000_0000);
        assert_eq!(descriptor.peripherals.len(), 1);
        assert_eq!(descriptor.peripherals[0].base_address, 0x1000_0000);
    }

    #[test]
    fn peripherals_default_to_empty() {
        let yaml = r#"
name: bare
ram:
  base: 0x80000000
  size: "4KiB"
"#;
        let descriptor: MachineDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert!(descriptor.validate().is_ok());
        assert!(descriptor.peripherals.is_empty());
    }

    #[test]
    fn unknown_peripheral_type_is_rejected() {
        let yaml = r#"
name: bad
ram:
  base: 0x80000000
  size: "4KiB"
peripherals:
  - id: spi0
    type: spi
    base_address: 0x2000
"#;
        let descriptor: MachineDescriptor = serde_yaml::from_str(yaml).unwrap();
        let err = descriptor.validate().unwrap_err();
        assert!(err.to_string().contains("unknown type"));
    }

    #[test]
    fn bad_ram_size_is_rejected() {
        let yaml = r#"
name: bad
ram:
  base: 0x80000000
  size: "lots"
"#;
        let descriptor: MachineDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn parse_size_handles_common_units() {
        assert_eq!(parse_size("16B").unwrap(), 16);
        assert_eq!(parse_size("4KiB").unwrap(), 4096);
        assert_eq!(parse_size("256MB").unwrap(), 256_000_000);
    }
}
