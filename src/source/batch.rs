//! Adaptive batch-size controller shared by all workers
//!
//! Additive-increase/multiplicative-decrease on a single global chunk size:
//! grow by 25% after a streak of successes longer than the endpoint's
//! concurrency budget, shrink by 25% on a timeout. Feedback carries the
//! size the caller actually requested, and feedback based on a size the
//! controller has already moved away from is ignored, so one slow worker
//! cannot undo a peer's adjustment.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

const GROWTH_FACTOR: f64 = 1.25;
const SHRINK_FACTOR: f64 = 0.75;

#[derive(Debug)]
struct BatchState {
    current_size: usize,
    success_streak: usize,
}

#[derive(Debug)]
pub struct BatchController {
    state: Mutex<BatchState>,
    concurrency_budget: usize,
}

impl BatchController {
    /// `concurrency_budget` is the number of requests the remote endpoint
    /// tolerates in flight; the success streak must exceed it to grow.
    pub fn new(initial_size: usize, concurrency_budget: usize) -> Self {
        Self {
            state: Mutex::new(BatchState {
                current_size: initial_size.max(1),
                success_streak: 0,
            }),
            concurrency_budget,
        }
    }

    fn state(&self) -> MutexGuard<'_, BatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_chunk_size(&self) -> usize {
        self.state().current_size
    }

    pub fn success_streak(&self) -> usize {
        self.state().success_streak
    }

    pub fn concurrency_budget(&self) -> usize {
        self.concurrency_budget
    }

    /// A request of `observed_size` entities returned relations.
    pub fn report_success(&self, observed_size: usize) {
        let mut state = self.state();
        if observed_size < state.current_size {
            // Request was smaller than the current size; says nothing about it
            return;
        }

        state.success_streak += 1;
        if state.success_streak > self.concurrency_budget {
            let grown = ((state.current_size as f64 * GROWTH_FACTOR) as usize)
                .max(state.current_size + 1);
            state.current_size = grown;
            state.success_streak = 0;
            info!(chunk_size = grown, "Increased chunk size");
        }
    }

    /// A request of `observed_size` entities timed out.
    ///
    /// Only a timeout at exactly the current size shrinks it. A smaller
    /// request says nothing about the current size. A larger one is ignored
    /// on purpose, not as an off-by-one: it was made before a peer already
    /// shrank the size for the same congestion, and shrinking again would
    /// count that one event twice.
    pub fn report_timeout(&self, observed_size: usize) {
        let mut state = self.state();
        if observed_size != state.current_size {
            return;
        }

        let shrunk = ((state.current_size as f64 * SHRINK_FACTOR) as usize).max(1);
        state.current_size = shrunk;
        state.success_streak = 0;
        info!(chunk_size = shrunk, "Decreased chunk size");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn initial_size_is_at_least_one() {
        assert_eq!(BatchController::new(0, 2).current_chunk_size(), 1);
        assert_eq!(BatchController::new(500, 2).current_chunk_size(), 500);
    }

    #[test]
    fn grows_after_streak_exceeds_budget() {
        let controller = BatchController::new(100, 2);

        controller.report_success(100);
        controller.report_success(100);
        assert_eq!(controller.current_chunk_size(), 100);

        controller.report_success(100);
        assert_eq!(controller.current_chunk_size(), 125);
        assert_eq!(controller.success_streak(), 0);
    }

    #[test]
    fn grows_from_size_one() {
        let controller = BatchController::new(1, 0);
        controller.report_success(1);
        assert_eq!(controller.current_chunk_size(), 2);
    }

    #[test]
    fn sustained_success_keeps_growing() {
        let controller = BatchController::new(10, 1);
        let mut previous = controller.current_chunk_size();
        for _ in 0..5 {
            let size = controller.current_chunk_size();
            controller.report_success(size);
            controller.report_success(size);
            assert!(controller.current_chunk_size() > previous);
            previous = controller.current_chunk_size();
        }
    }

    #[test]
    fn timeout_shrinks_and_resets_streak() {
        let controller = BatchController::new(100, 5);
        controller.report_success(100);
        controller.report_timeout(100);

        assert_eq!(controller.current_chunk_size(), 75);
        assert_eq!(controller.success_streak(), 0);
    }

    #[test]
    fn timeout_never_goes_below_one() {
        let controller = BatchController::new(2, 5);
        controller.report_timeout(2);
        assert_eq!(controller.current_chunk_size(), 1);
        controller.report_timeout(1);
        assert_eq!(controller.current_chunk_size(), 1);
    }

    #[test]
    fn stale_feedback_is_ignored() {
        let controller = BatchController::new(100, 0);
        controller.report_timeout(100);
        assert_eq!(controller.current_chunk_size(), 75);

        // Two workers still holding sizes smaller than the current one
        controller.report_timeout(50);
        controller.report_success(60);

        assert_eq!(controller.current_chunk_size(), 75);
        assert_eq!(controller.success_streak(), 0);
    }

    #[test]
    fn timeout_from_before_a_peer_shrink_is_ignored() {
        let controller = BatchController::new(100, 0);
        controller.report_timeout(100);
        controller.report_timeout(100);
        assert_eq!(controller.current_chunk_size(), 75);
    }

    #[test]
    fn concurrent_stale_reports_leave_size_unchanged() {
        let controller = Arc::new(BatchController::new(200, 0));

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let controller = Arc::clone(&controller);
                scope.spawn(move || {
                    for _ in 0..100 {
                        controller.report_timeout(150);
                        controller.report_success(199);
                    }
                });
            }
        });

        assert_eq!(controller.current_chunk_size(), 200);
    }

    #[test]
    fn concurrent_timeouts_on_same_size_shrink_once() {
        let controller = Arc::new(BatchController::new(100, 3));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let controller = Arc::clone(&controller);
                scope.spawn(move || controller.report_timeout(100));
            }
        });

        assert_eq!(controller.current_chunk_size(), 75);
    }
}
