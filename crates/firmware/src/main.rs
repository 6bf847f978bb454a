// HartSim - RISC-V Firmware Simulator
// Copyright (C) 2026 HartSim Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

#![no_std]
#![no_main]

use panic_halt as _;
use riscv_rt::entry;

mod uart;

#[entry]
fn main() -> ! {
    uart::init();
    uart::print("hello riscv!\n");

    exit(0)
}

/// Report the exit status and park the hart. The host reads the status from
/// gp: 1 means success, anything else is a failure.
fn exit(code: i32) -> ! {
    let verdict: u32 = if code == 0 { 1 } else { 0 };
    unsafe {
        core::arch::asm!("mv gp, {0}", in(reg) verdict);
    }

    loop {
        continue;
    }
}
