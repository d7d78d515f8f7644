//! The sampling window
//!
//! A window polls every counter N times at evenly spaced instants, then
//! converts hit counts into integer percentages. Pacing is anchored at the
//! window start: each tick sleeps until its absolute deadline
//! `(i + 1) * interval`, so per-tick overhead is corrected every tick rather
//! than accumulating as drift. A tick that misses its deadline skips the
//! sleep and carries on — the window just runs a little long.

use std::thread;
use std::time::{Duration, Instant};

use crate::counters::Counter;
use crate::mmio::RegisterRead;

/// Samples taken per window
pub const SAMPLE_COUNT: u32 = 100;

/// Duration of one sampling window
pub const WINDOW: Duration = Duration::from_micros(1_000_000);

/// Sampling window parameters
///
/// Production always runs the defaults; tests shrink the window so they
/// finish in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    /// Number of polls per window
    pub sample_count: u32,
    /// Total window duration
    pub window: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sample_count: SAMPLE_COUNT,
            window: WINDOW,
        }
    }
}

impl SamplerConfig {
    /// Nominal spacing between consecutive ticks
    pub fn interval(&self) -> Duration {
        self.window / self.sample_count
    }
}

/// Run one sampling window over `counters`, returning per-counter hit counts
///
/// Each returned count is in `0..=sample_count` and positionally matches the
/// counter table.
pub fn sample_window<R: RegisterRead>(
    regs: &R,
    counters: &[Counter],
    config: SamplerConfig,
) -> Vec<u32> {
    let mut counts = vec![0u32; counters.len()];
    let interval = config.interval();
    let start = Instant::now();

    for tick in 0..config.sample_count {
        for (counter, count) in counters.iter().zip(counts.iter_mut()) {
            if counter.is_busy(regs.read_register(counter.offset)) {
                *count += 1;
            }
        }

        // Sleep until this tick's absolute deadline. checked_sub clamps a
        // missed deadline to "don't sleep" instead of wrapping negative.
        let deadline = interval * (tick + 1);
        if let Some(remaining) = deadline.checked_sub(start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    counts
}

/// Convert raw hit counts into integer percentages (floor division)
pub fn to_percentages(counts: &[u32], sample_count: u32) -> Vec<u32> {
    counts.iter().map(|c| c * 100 / sample_count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Fake register file returning fixed values per offset (0 if unset)
    struct FixedRegisters(HashMap<u32, u32>);

    impl FixedRegisters {
        fn new(values: &[(u32, u32)]) -> Self {
            Self(values.iter().copied().collect())
        }
    }

    impl RegisterRead for FixedRegisters {
        fn read_register(&self, offset: u32) -> u32 {
            self.0.get(&offset).copied().unwrap_or(0)
        }
    }

    /// Fake register file replaying a per-offset sequence of reads,
    /// repeating the final value once the sequence is exhausted
    struct ScriptedRegisters(RefCell<HashMap<u32, Vec<u32>>>);

    impl RegisterRead for ScriptedRegisters {
        fn read_register(&self, offset: u32) -> u32 {
            let mut scripts = self.0.borrow_mut();
            let script = scripts.get_mut(&offset).expect("unscripted register");
            if script.len() > 1 {
                script.remove(0)
            } else {
                script[0]
            }
        }
    }

    fn fast_config(sample_count: u32) -> SamplerConfig {
        SamplerConfig {
            sample_count,
            window: Duration::from_millis(20),
        }
    }

    #[test]
    fn test_constantly_busy_and_idle() {
        let counters = [
            Counter::new("busy-high", 0x10, 1 << 31, false),
            Counter::new("idle-high", 0x20, 1 << 0, true),
            Counter::new("quiet", 0x30, 1 << 0, false),
        ];
        // busy-high saturated, idle-high bit clear (so busy), quiet all zero
        let regs = FixedRegisters::new(&[(0x10, 0xffff_ffff), (0x20, 0)]);

        let counts = sample_window(&regs, &counters, fast_config(100));
        assert_eq!(counts, vec![100, 100, 0]);

        let percentages = to_percentages(&counts, 100);
        assert_eq!(percentages, vec![100, 100, 0]);
    }

    #[test]
    fn test_partial_busy_counts_exact_ticks() {
        let counters = [Counter::new("CP", 0x21a0, 1 << 31, false)];
        // Busy for exactly the first 37 of 100 ticks
        let mut script = vec![1u32 << 31; 37];
        script.push(0);
        let regs = ScriptedRegisters(RefCell::new(
            [(0x21a0, script)].into_iter().collect(),
        ));

        let counts = sample_window(&regs, &counters, fast_config(100));
        assert_eq!(counts, vec![37]);
        assert_eq!(to_percentages(&counts, 100), vec![37]);
    }

    #[test]
    fn test_percentage_bounds() {
        let n = SAMPLE_COUNT;
        for count in 0..=n {
            let p = to_percentages(&[count], n)[0];
            assert!(p <= 100, "count {} gave {}%", count, p);
        }
        assert_eq!(to_percentages(&[0, 50, 99, 100], n), vec![0, 50, 99, 100]);
    }

    #[test]
    fn test_window_pacing_is_deadline_anchored() {
        let counters = [Counter::new("quiet", 0x10, 1, false)];
        let regs = FixedRegisters::new(&[]);
        let config = SamplerConfig {
            sample_count: 10,
            window: Duration::from_millis(100),
        };

        let start = Instant::now();
        sample_window(&regs, &counters, config);
        let elapsed = start.elapsed();

        // Deadlines are absolute from window start, so the window never
        // finishes early; scheduler slop can only make it late.
        assert!(elapsed >= config.window, "window ended at {:?}", elapsed);
        assert!(
            elapsed < config.window + Duration::from_millis(250),
            "window overran badly: {:?}",
            elapsed
        );
    }

    #[test]
    fn test_interval_division() {
        let config = SamplerConfig::default();
        assert_eq!(config.interval(), Duration::from_micros(10_000));
    }
}
