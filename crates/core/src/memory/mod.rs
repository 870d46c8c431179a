use serde::{Deserialize, Serialize};

/// One loadable chunk of a firmware image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start_addr: u64,
    pub data: Vec<u8>,
}

/// Entry point plus loadable segments, as produced by the ELF loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramImage {
    pub entry_point: u64,
    pub segments: Vec<Segment>,
}

impl ProgramImage {
    pub fn new(entry_point: u64) -> Self {
        Self {
            entry_point,
            segments: Vec::new(),
        }
    }

    pub fn add_segment(&mut self, start_addr: u64, data: Vec<u8>) {
        self.segments.push(Segment { start_addr, data });
    }
}

/// A flat byte store mapped at a fixed base address.
pub struct LinearMemory {
    data: Vec<u8>,
    base_addr: u64,
}

impl LinearMemory {
    pub fn new(size: usize, base_addr: u64) -> Self {
        Self {
            data: vec![0; size],
            base_addr,
        }
    }

    pub fn base_addr(&self) -> u64 {
        self.base_addr
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.base_addr && addr < self.base_addr + self.data.len() as u64
    }

    pub fn read_u8(&self, addr: u64) -> Option<u8> {
        if self.contains(addr) {
            Some(self.data[(addr - self.base_addr) as usize])
        } else {
            None
        }
    }

    pub fn write_u8(&mut self, addr: u64, value: u8) -> bool {
        if self.contains(addr) {
            self.data[(addr - self.base_addr) as usize] = value;
            true
        } else {
            false
        }
    }
}
