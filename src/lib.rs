//! Tonga GPU Statistics
//!
//! A Linux utility library for sampling per-engine busy/idle status bits
//! from the MMIO registers of an AMD Tonga GPU (PCI 1002:6939) and rendering
//! live utilization bars in a terminal.
//!
//! # How it works
//!
//! The GRBM/SRBM status registers of this chip expose one busy (or idle) bit
//! per execution engine. The sampler polls a fixed table of ten such bits 100
//! times over each one-second window, evenly paced, and reports the hit rate
//! as an integer percentage per engine. There is no generality here: the
//! register table is hard-coded for this one chip revision.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::io;
//! use tonga_gpu_stats::{counters, pci, Monitor};
//!
//! let gpu = pci::find_tonga()?;
//! let regs = gpu.map_registers()?;
//!
//! let mut monitor = Monitor::new(regs, counters::TONGA_COUNTERS);
//! monitor.run(&mut io::stdout().lock())?;
//! # Ok::<(), tonga_gpu_stats::Error>(())
//! ```
//!
//! # Permissions
//!
//! Mapping a PCI resource file from user space normally requires root.
//!
//! # Testing without hardware
//!
//! The sampler and monitor are generic over [`RegisterRead`], so any fake
//! register file works in place of the mapped window.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod counters;
pub mod error;
pub mod mmio;
pub mod monitor;
pub mod pci;
pub mod render;
pub mod sampler;

// Re-export main types at crate root
pub use counters::Counter;
pub use error::{Error, Result};
pub use mmio::{MmioRegion, RegisterRead};
pub use monitor::Monitor;
pub use sampler::SamplerConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
