//! Per-call work budget shared by the search stages.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Wall-clock and iteration limits for one detection call.
///
/// Stages call [`Budget::tick`] once per unit of work (a traced component, a
/// grid placement) and truncate their search when it returns `false`. Once
/// exhausted, a budget stays exhausted.
#[derive(Debug)]
pub struct Budget {
    deadline: Option<Instant>,
    max_iterations: Option<usize>,
    iterations: AtomicUsize,
    exhausted: AtomicBool,
}

impl Budget {
    pub fn new(time_limit: Option<Duration>, max_iterations: Option<usize>) -> Self {
        Self {
            deadline: time_limit.map(|d| Instant::now() + d),
            max_iterations,
            iterations: AtomicUsize::new(0),
            exhausted: AtomicBool::new(false),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None, None)
    }

    /// Account one unit of work; `false` means the caller must stop.
    pub fn tick(&self) -> bool {
        if self.exhausted.load(Ordering::Relaxed) {
            return false;
        }
        let n = self.iterations.fetch_add(1, Ordering::Relaxed) + 1;
        let over_iterations = self.max_iterations.is_some_and(|max| n > max);
        let over_time = self.deadline.is_some_and(|d| Instant::now() >= d);
        if over_iterations || over_time {
            self.exhausted.store(true, Ordering::Relaxed);
            return false;
        }
        true
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn iterations(&self) -> usize {
        self.iterations.load(Ordering::Relaxed)
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::unlimited()
    }
}
