use crate::EmulationObserver;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counts instructions attempted across a run.
///
/// The count is taken at step start, so a step that ends in a fault is
/// included and the total can run one ahead of [`crate::RunReport::steps`]
/// on a faulting run.
#[derive(Debug)]
pub struct PerformanceMetrics {
    instruction_count: AtomicU64,
    start_time: Instant,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self {
            instruction_count: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn instructions(&self) -> u64 {
        self.instruction_count.load(Ordering::SeqCst)
    }

    pub fn instructions_per_second(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.instructions() as f64 / elapsed
        } else {
            0.0
        }
    }
}

impl EmulationObserver for PerformanceMetrics {
    fn on_step_start(&self, _pc: u32, _word: u32) {
        self.instruction_count.fetch_add(1, Ordering::SeqCst);
    }
}
