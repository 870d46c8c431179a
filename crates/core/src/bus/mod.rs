use crate::memory::LinearMemory;
use crate::peripherals::tty::Tty;
use crate::{EmuResult, EmulationError, Peripheral};

/// A peripheral mounted on the bus at a `(base, size)` window.
#[derive(Debug)]
pub struct PeripheralEntry {
    pub name: String,
    pub base: u64,
    pub size: u64,
    pub dev: Box<dyn Peripheral>,
}

pub struct SystemBus {
    pub ram: LinearMemory,
    pub peripherals: Vec<PeripheralEntry>,
}

impl SystemBus {
    pub const DEFAULT_RAM_BASE: u64 = 0x8000_0000;
    pub const DEFAULT_RAM_SIZE: usize = 0x1000_0000; // 256 MB
    pub const DEFAULT_TTY_BASE: u64 = 0x1000_0000;

    /// Default machine: 256 MB of RAM and a console port at `0x1000_0000`.
    pub fn new() -> Self {
        let mut bus = Self::with_ram(Self::DEFAULT_RAM_SIZE, Self::DEFAULT_RAM_BASE);
        bus.attach("tty0", Self::DEFAULT_TTY_BASE, 0x10, Box::new(Tty::echoing()));
        bus
    }

    pub fn with_ram(size: usize, base_addr: u64) -> Self {
        Self {
            ram: LinearMemory::new(size, base_addr),
            peripherals: Vec::new(),
        }
    }

    /// Builds a bus from a machine descriptor.
    pub fn from_config(machine: &rivet_config::MachineDescriptor) -> anyhow::Result<Self> {
        let ram_size = rivet_config::parse_size(&machine.ram.size)?;
        let mut bus = Self::with_ram(ram_size as usize, machine.ram.base);

        for peripheral in &machine.peripherals {
            let size = match &peripheral.size {
                Some(s) => rivet_config::parse_size(s)?,
                None => 0x10,
            };
            match peripheral.r#type.as_str() {
                "tty" => {
                    bus.attach(
                        &peripheral.id,
                        peripheral.base_address,
                        size,
                        Box::new(Tty::echoing()),
                    );
                }
                other => anyhow::bail!("Unknown peripheral type '{}'", other),
            }
        }

        Ok(bus)
    }

    pub fn attach(&mut self, name: &str, base: u64, size: u64, dev: Box<dyn Peripheral>) {
        self.peripherals.push(PeripheralEntry {
            name: name.to_string(),
            base,
            size,
            dev,
        });
    }

    pub fn peripheral(&self, name: &str) -> Option<&PeripheralEntry> {
        self.peripherals.iter().find(|p| p.name == name)
    }

    fn peripheral_index_at(&self, addr: u64) -> Option<usize> {
        self.peripherals
            .iter()
            .position(|p| addr >= p.base && addr < p.base + p.size)
    }
}

impl Default for SystemBus {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::Bus for SystemBus {
    fn read_u8(&self, addr: u64) -> EmuResult<u8> {
        if let Some(idx) = self.peripheral_index_at(addr) {
            let entry = &self.peripherals[idx];
            return entry.dev.read(addr - entry.base);
        }
        self.ram
            .read_u8(addr)
            .ok_or(EmulationError::BusFault(addr))
    }

    fn write_u8(&mut self, addr: u64, value: u8) -> EmuResult<()> {
        if let Some(idx) = self.peripheral_index_at(addr) {
            let entry = &mut self.peripherals[idx];
            return entry.dev.write(addr - entry.base, value);
        }
        if self.ram.write_u8(addr, value) {
            return Ok(());
        }
        Err(EmulationError::BusFault(addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bus;

    #[test]
    fn ram_round_trip() {
        let mut bus = SystemBus::with_ram(0x100, 0x8000_0000);
        bus.write_u32(0x8000_0000, 0xDEAD_BEEF).unwrap();
        assert_eq!(bus.read_u32(0x8000_0000).unwrap(), 0xDEAD_BEEF);
        // Little endian byte order
        assert_eq!(bus.read_u8(0x8000_0000).unwrap(), 0xEF);
        assert_eq!(bus.read_u8(0x8000_0003).unwrap(), 0xDE);
    }

    #[test]
    fn unmapped_access_is_a_bus_fault() {
        let mut bus = SystemBus::with_ram(0x100, 0x8000_0000);
        assert!(matches!(
            bus.read_u8(0x4000),
            Err(EmulationError::BusFault(0x4000))
        ));
        assert!(matches!(
            bus.write_u8(0x4000, 1),
            Err(EmulationError::BusFault(0x4000))
        ));
    }

    #[test]
    fn writes_dispatch_to_mounted_peripheral() {
        let mut bus = SystemBus::with_ram(0x100, 0x8000_0000);
        bus.attach("tty0", 0x1000, 0x10, Box::new(Tty::new()));

        bus.write_u8(0x1000, b'R').unwrap();
        bus.write_u8(0x1005, b'V').unwrap();

        let entry = bus.peripheral("tty0").unwrap();
        let tty = entry
            .dev
            .as_any()
            .and_then(|a| a.downcast_ref::<Tty>())
            .unwrap();
        assert_eq!(tty.transcript(), b"RV");

        // One past the window is RAM territory, and unmapped here.
        assert!(bus.write_u8(0x1010, 0).is_err());
    }

    #[test]
    fn from_config_builds_described_machine() {
        let machine = rivet_config::MachineDescriptor {
            name: "probe".to_string(),
            ram: rivet_config::MemoryRange {
                base: 0x8000_0000,
                size: "64KiB".to_string(),
            },
            peripherals: vec![rivet_config::PeripheralConfig {
                id: "probe0".to_string(),
                r#type: "tty".to_string(),
                base_address: 0x1000,
                size: Some("1B".to_string()),
            }],
        };

        let mut bus = SystemBus::from_config(&machine).unwrap();
        assert!(bus.write_u8(0x1000, 0x41).is_ok());
        assert!(bus.write_u8(0x1001, 0x41).is_err());
        assert!(bus.write_u8(0x8000_0000, 0).is_ok());
    }

    #[test]
    fn from_config_rejects_unknown_peripheral_type() {
        let machine = rivet_config::MachineDescriptor {
            name: "bad".to_string(),
            ram: rivet_config::MemoryRange {
                base: 0x8000_0000,
                size: "4KiB".to_string(),
            },
            peripherals: vec![rivet_config::PeripheralConfig {
                id: "x".to_string(),
                r#type: "dma".to_string(),
                base_address: 0x2000,
                size: None,
            }],
        };
        assert!(SystemBus::from_config(&machine).is_err());
    }
}
