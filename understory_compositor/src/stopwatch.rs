// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rolling per-frame cost samples.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of laps a [`Stopwatch`] retains.
pub const SAMPLE_COUNT: usize = 120;

/// Time budget of one frame at 60 Hz.
pub const FRAME_BUDGET: Duration = Duration::from_nanos(16_666_667);

/// Records the duration of the most recent frames.
///
/// Laps are either timed with [`start`](Self::start)/[`stop`](Self::stop)
/// against the wall clock, or pushed directly with
/// [`add_sample`](Self::add_sample) when another component measured them.
#[derive(Clone, Debug, Default)]
pub struct Stopwatch {
    laps: VecDeque<Duration>,
    started: Option<Instant>,
}

impl Stopwatch {
    /// Create a stopwatch with no samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin timing a lap.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Finish the running lap and record it. Does nothing if not started.
    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.add_sample(started.elapsed());
        }
    }

    /// Record an externally measured lap.
    pub fn add_sample(&mut self, lap: Duration) {
        if self.laps.len() == SAMPLE_COUNT {
            self.laps.pop_front();
        }
        self.laps.push_back(lap);
    }

    /// The most recent lap, or zero.
    pub fn last_lap(&self) -> Duration {
        self.laps.back().copied().unwrap_or_default()
    }

    /// The longest retained lap, or zero.
    pub fn max_lap(&self) -> Duration {
        self.laps.iter().copied().max().unwrap_or_default()
    }

    /// Mean of the retained laps, or zero.
    pub fn average_lap(&self) -> Duration {
        let count = u32::try_from(self.laps.len()).unwrap_or(u32::MAX);
        if count == 0 {
            return Duration::ZERO;
        }
        self.laps.iter().sum::<Duration>() / count
    }

    /// Retained laps, oldest first.
    pub fn samples(&self) -> impl ExactSizeIterator<Item = Duration> + '_ {
        self.laps.iter().copied()
    }

    /// Returns `true` while a lap is being timed.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_a_bounded_window() {
        let mut sw = Stopwatch::new();
        for ms in 0..(SAMPLE_COUNT as u64 + 10) {
            sw.add_sample(Duration::from_millis(ms));
        }
        assert_eq!(sw.samples().len(), SAMPLE_COUNT);
        assert_eq!(sw.samples().next(), Some(Duration::from_millis(10)));
        assert_eq!(sw.last_lap(), Duration::from_millis(SAMPLE_COUNT as u64 + 9));
    }

    #[test]
    fn statistics() {
        let mut sw = Stopwatch::new();
        assert_eq!(sw.average_lap(), Duration::ZERO);
        sw.add_sample(Duration::from_millis(2));
        sw.add_sample(Duration::from_millis(6));
        assert_eq!(sw.max_lap(), Duration::from_millis(6));
        assert_eq!(sw.average_lap(), Duration::from_millis(4));
    }

    #[test]
    fn stop_without_start_is_ignored() {
        let mut sw = Stopwatch::new();
        sw.stop();
        assert_eq!(sw.samples().len(), 0);
        sw.start();
        assert!(sw.is_running());
        sw.stop();
        assert!(!sw.is_running());
        assert_eq!(sw.samples().len(), 1);
    }
}
