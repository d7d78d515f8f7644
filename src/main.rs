//! tonga-gpu-top: live per-engine utilization bars for an AMD Tonga GPU
//!
//! Locates the GPU once at startup, maps its register window, then samples
//! and redraws forever. Runs until killed; every startup failure prints one
//! line to stderr and exits with status 1.
//!
//! Requires permission to map PCI resources (normally root).

use std::io;
use std::process;

use tonga_gpu_stats::{counters, pci, Monitor, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let gpu = pci::find_tonga()?;
    // The device info and mapping live until the process is killed; nothing
    // below ever releases them.
    let regs = gpu.map_registers()?;

    let stdout = io::stdout();
    let mut monitor = Monitor::new(regs, counters::TONGA_COUNTERS);
    monitor.run(&mut stdout.lock())
}
