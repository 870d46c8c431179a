// Rivet - RISC-V Firmware Emulation Toolkit
// Copyright (C) 2026 Rivet Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

#![no_std]
#![no_main]

use panic_halt as _;
use riscv_rt::entry;

/// Write-only byte port at a fixed MMIO address. The device consumes each
/// byte as it is stored; nothing is ever read back.
struct TxPort(usize);

impl TxPort {
    const fn new(addr: usize) -> Self {
        Self(addr)
    }

    fn write(&self, byte: u8) {
        unsafe { core::ptr::write_volatile(self.0 as *mut u8, byte) }
    }
}

// Matches the default machine's `tty0` base.
const TTY: TxPort = TxPort::new(0x1000_0000);

#[entry]
fn main() -> ! {
    let message = "Hello, World!";

    for byte in message.bytes() {
        TTY.write(byte);
    }

    halt()
}

/// Terminal idle state once the message has been sent. Compiles to a
/// self-jump, which the emulator recognizes as an intended halt.
fn halt() -> ! {
    loop {}
}
