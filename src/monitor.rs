//! The monitor loop: sample a window, sort, redraw, repeat
//!
//! The display permutation persists across windows and is re-sorted stably by
//! descending utilization each refresh, so counters with equal percentages
//! keep their previous relative position instead of flickering around.

use std::io::Write;

use crate::counters::Counter;
use crate::error::Result;
use crate::mmio::RegisterRead;
use crate::render;
use crate::sampler::{self, SamplerConfig};

/// Continuously measures and displays per-engine utilization
pub struct Monitor<R> {
    regs: R,
    counters: &'static [Counter],
    config: SamplerConfig,
    /// Display permutation, carried over between windows
    order: Vec<usize>,
}

impl<R: RegisterRead> Monitor<R> {
    /// Create a monitor over a register space and counter table
    pub fn new(regs: R, counters: &'static [Counter]) -> Self {
        Self::with_config(regs, counters, SamplerConfig::default())
    }

    /// Create a monitor with explicit sampling parameters
    pub fn with_config(regs: R, counters: &'static [Counter], config: SamplerConfig) -> Self {
        Self {
            regs,
            counters,
            config,
            order: (0..counters.len()).collect(),
        }
    }

    /// Sample one window and redraw the display into `out`
    pub fn refresh<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let counts = sampler::sample_window(&self.regs, self.counters, self.config);
        let percentages = sampler::to_percentages(&counts, self.config.sample_count);

        sort_by_utilization(&mut self.order, &percentages);

        let names: Vec<&str> = self.counters.iter().map(|c| c.name).collect();
        render::render_frame(out, &names, &percentages, &self.order)?;
        Ok(())
    }

    /// Run forever, refreshing once per sampling window
    ///
    /// Never returns Ok; ends only on an output error or external
    /// termination.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<()> {
        loop {
            self.refresh(out)?;
        }
    }

    /// The display permutation from the most recent refresh
    pub fn display_order(&self) -> &[usize] {
        &self.order
    }
}

/// Re-sort a display permutation by descending percentage
///
/// The sort is stable: entries with equal percentages keep the relative order
/// they already had, which is what keeps the display steady between windows.
fn sort_by_utilization(order: &mut [usize], percentages: &[u32]) {
    order.sort_by(|&a, &b| percentages[b].cmp(&percentages[a]));
}
