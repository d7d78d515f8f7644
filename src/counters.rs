//! The fixed busy/idle counter table for the Tonga register map
//!
//! Each entry names one execution engine (or front-end block) and the status
//! bit that reports it busy. Offsets are 32-bit-word indices into the mapped
//! MMIO window, taken from the GRBM/SRBM status registers of this chip
//! revision only; they are not valid for any other GPU family.

/// Describes one busy/idle status bit in the register space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    /// Short engine/block label shown in the display
    pub name: &'static str,
    /// Offset into the mapped window, in 32-bit-word units
    pub offset: u32,
    /// Bitmask selecting the status bit(s) within the register value
    pub mask: u32,
    /// Polarity: when true the masked bit reports *idle*, so the engine is
    /// busy only while the bit is clear
    pub idle: bool,
}

impl Counter {
    /// Create a counter descriptor
    pub const fn new(name: &'static str, offset: u32, mask: u32, idle: bool) -> Self {
        Self {
            name,
            offset,
            mask,
            idle,
        }
    }

    /// Interpret one raw register read under this counter's polarity
    ///
    /// Busy-high counters (`idle == false`) count when any masked bit is set;
    /// idle-high counters count only when the masked bits are all clear.
    pub fn is_busy(&self, raw: u32) -> bool {
        if self.idle {
            raw & self.mask == 0
        } else {
            raw & self.mask != 0
        }
    }
}

/// Status bits sampled on Tonga, in fixed display-fallback order
///
/// The table order never changes at runtime; all per-window state (sample
/// accumulators, the display permutation) is indexed positionally against it.
pub const TONGA_COUNTERS: &[Counter] = &[
    Counter::new("CL", 0x2284, 1 << 31, false),
    Counter::new("SU", 0x2294, 1 << 31, false),
    Counter::new("GDS", 0x25c1, 1 << 0, false),
    Counter::new("IA", 0x2237, 1 << 0, false),
    Counter::new("WD", 0x223f, 1 << 0, false),
    Counter::new("VGT", 0x223c, 1 << 0, false),
    Counter::new("TD", 0x2526, 1 << 31, false),
    Counter::new("CP", 0x21a0, 1 << 31, false),
    Counter::new("SDMA0", 0x340d, 1 << 0, true),
    Counter::new("SDMA1", 0x360d, 1 << 0, true),
];
