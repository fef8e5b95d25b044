// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress reporting and cooperative cancellation for long-running page
// operations (large merges, splits, redactions).
//
// Engines call `JobControl::checkpoint` between page-level steps and
// `JobControl::report` after each step. Cancellation never leaves partial
// output behind: the engine returns `PagewerkError::Cancelled` and drops its
// working copy.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{PagewerkError, Result};

/// A progress snapshot: `completed` of `total` page-level steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Completion as a fraction in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            (self.completed as f32 / self.total as f32).min(1.0)
        }
    }
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

type ProgressFn = Arc<dyn Fn(Progress) + Send + Sync>;

/// Progress callback plus cancellation flag handed to an engine call.
#[derive(Clone, Default)]
pub struct JobControl {
    progress: Option<ProgressFn>,
    cancel: CancelFlag,
    /// Highest `completed` delivered so far. Held while the callback runs so
    /// deliveries from parallel workers cannot overtake each other.
    high_water: Arc<Mutex<usize>>,
}

impl JobControl {
    /// A control with no callback and a fresh flag.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, callback: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = flag;
        self
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Return `Err(Cancelled)` if cancellation was requested.
    pub fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(PagewerkError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Report progress. Reports that would move backwards are dropped, so
    /// callers always observe a monotonic sequence. The callback must not
    /// report on the same control.
    pub fn report(&self, completed: usize, total: usize) {
        let Some(callback) = &self.progress else {
            return;
        };
        let mut high_water = self.high_water.lock().unwrap_or_else(PoisonError::into_inner);
        if completed > *high_water || (completed == 0 && *high_water == 0) {
            *high_water = completed;
            callback(Progress { completed, total });
        }
    }
}

impl fmt::Debug for JobControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobControl")
            .field("has_progress", &self.progress.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_reflects_cancel_flag() {
        let flag = CancelFlag::new();
        let job = JobControl::new().with_cancel_flag(flag.clone());
        assert!(job.checkpoint().is_ok());

        flag.cancel();
        assert!(matches!(job.checkpoint(), Err(PagewerkError::Cancelled)));
    }

    #[test]
    fn progress_is_monotonic() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let job = JobControl::new().with_progress(move |p| sink.lock().unwrap().push(p.completed));

        job.report(1, 4);
        job.report(3, 4);
        job.report(2, 4); // stale, dropped
        job.report(4, 4);

        assert_eq!(*seen.lock().unwrap(), vec![1, 3, 4]);
    }

    #[test]
    fn parallel_reports_arrive_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let job = JobControl::new().with_progress(move |p| sink.lock().unwrap().push(p.completed));

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let job = job.clone();
                scope.spawn(move || {
                    for step in 0..500 {
                        job.report(step * 8 + worker + 1, 4000);
                    }
                });
            }
        });

        let seen = seen.lock().unwrap();
        assert!(seen.windows(2).all(|pair| pair[0] < pair[1]), "{seen:?}");
        assert_eq!(seen.last(), Some(&4000));
    }

    #[test]
    fn fraction_handles_empty_jobs() {
        assert_eq!(Progress { completed: 0, total: 0 }.fraction(), 1.0);
        assert_eq!(Progress { completed: 1, total: 4 }.fraction(), 0.25);
    }
}
