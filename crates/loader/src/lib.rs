// Rivet - RISC-V Firmware Emulation Toolkit
// Copyright (C) 2026 Rivet Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Turns firmware ELF files into [`ProgramImage`]s the core can load.

use anyhow::{anyhow, Context, Result};
use goblin::elf::program_header::PT_LOAD;
use goblin::elf::Elf;
use rivet_core::memory::ProgramImage;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const EM_RISCV: u16 = 243;

pub fn load_elf(path: &Path) -> Result<ProgramImage> {
    let buffer = fs::read(path).with_context(|| format!("Failed to read ELF file: {:?}", path))?;

    let elf = Elf::parse(&buffer).context("Failed to parse ELF binary")?;

    if elf.header.e_machine != EM_RISCV {
        warn!(
            "ELF machine type {:#x} is not RISC-V; loading anyway",
            elf.header.e_machine
        );
    }
    info!("ELF entry point: {:#x}", elf.entry);

    let mut image = ProgramImage::new(elf.entry);

    for ph in &elf.program_headers {
        if ph.p_type != PT_LOAD {
            continue;
        }
        let size = ph.p_filesz as usize;
        if size == 0 {
            continue;
        }
        let offset = ph.p_offset as usize;

        debug!(
            "Loadable segment: vaddr={:#x}, {} bytes at offset {:#x}",
            ph.p_vaddr, size, offset
        );

        // A p_offset near usize::MAX must not wrap the bounds check.
        match offset.checked_add(size) {
            Some(end) if end <= buffer.len() => {}
            _ => return Err(anyhow!("Segment out of bounds in ELF file")),
        }

        image.add_segment(ph.p_vaddr, buffer[offset..offset + size].to_vec());
    }

    if image.segments.is_empty() {
        warn!("No loadable segments found in ELF file");
    }

    Ok(image)
}
