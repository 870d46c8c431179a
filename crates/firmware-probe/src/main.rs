// Rivet - RISC-V Firmware Emulation Toolkit
// Copyright (C) 2026 Rivet Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

#![no_std]
#![no_main]

use panic_halt as _;
use riscv_rt::entry;

// Matches the `rv32-probe` machine's `probe0` port.
const PROBE_PORT: *mut u8 = 0x1000 as *mut u8;

#[entry]
fn main() -> ! {
    unsafe {
        core::ptr::write_volatile(PROBE_PORT, b'A');
    }

    // Completion signal. The hosting emulator treats EBREAK as a clean
    // halt, the freestanding stand-in for returning success.
    unsafe { riscv::asm::ebreak() };

    loop {}
}
