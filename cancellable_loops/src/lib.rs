//! # cancellable_loops
//!
//! Parallel loops that can be stopped early through an abort flag, plus a small progress
//! tracker that publishes the fraction of finished work through an `RwLock<Option<f32>>`.
//!
//! The loops are built for work that is split into independent items (for example one output
//! plane per filter), where each worker writes to a disjoint part of the output and the caller
//! needs to know whether the loop ran to the end.
//!
//! ## Example
//!
//! ```
//! use std::sync::atomic::AtomicBool;
//! use cancellable_loops::{par_try_for_each_cancellable, Completion};
//!
//! let abort_flag = AtomicBool::new(false);
//! let mut planes = vec![0u32; 8];
//!
//! let completion = par_try_for_each_cancellable(
//!     planes.iter_mut().enumerate().collect::<Vec<_>>(),
//!     &abort_flag,
//!     |(i, plane)| {
//!         *plane = i as u32 * 2;
//!         Ok::<(), ()>(())
//!     },
//! );
//!
//! assert_eq!(completion, Ok(Completion::Finished));
//! assert_eq!(planes[3], 6);
//! ```

use rayon::prelude::*;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Outcome of a cancellable loop that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every item was processed.
    Finished,
    /// The abort flag was raised before all items were processed.
    Cancelled,
}

enum Stop<E> {
    Aborted,
    Failed(E),
}

/// Executes a fallible parallel loop that can be cancelled via an abort flag.
///
/// Each item is handed to `func` on the rayon thread pool. The abort flag is checked before
/// every item; once it is set, remaining items are skipped and the loop reports
/// [`Completion::Cancelled`]. The first error returned by `func` stops the loop and is handed
/// back to the caller unchanged.
///
/// # Arguments
///
/// * `iter` - Any parallel iterator to process
/// * `abort_flag` - An atomic boolean that can be set to `true` to cancel the loop
/// * `func` - A fallible function applied to each element
///
/// # Examples
///
/// ```
/// use std::sync::atomic::AtomicBool;
/// use cancellable_loops::{par_try_for_each_cancellable, Completion};
///
/// let abort_flag = AtomicBool::new(true);
/// let result = par_try_for_each_cancellable(0..100, &abort_flag, |_| Ok::<(), String>(()));
/// assert_eq!(result, Ok(Completion::Cancelled));
///
/// let abort_flag = AtomicBool::new(false);
/// let result = par_try_for_each_cancellable(0..100, &abort_flag, |i| {
///     if i == 42 { Err(format!("item {i} failed")) } else { Ok(()) }
/// });
/// assert_eq!(result, Err("item 42 failed".to_string()));
/// ```
pub fn par_try_for_each_cancellable<I, F, E>(
    iter: I,
    abort_flag: &AtomicBool,
    func: F,
) -> Result<Completion, E>
where
    I: IntoParallelIterator,
    I::Item: Send,
    F: Fn(I::Item) -> Result<(), E> + Sync + Send,
    E: Send,
{
    let outcome = iter.into_par_iter().try_for_each(|item| {
        if abort_flag.load(Ordering::Relaxed) {
            return Err(Stop::Aborted);
        }
        func(item).map_err(Stop::Failed)
    });

    match outcome {
        Ok(()) => Ok(Completion::Finished),
        Err(Stop::Aborted) => Ok(Completion::Cancelled),
        Err(Stop::Failed(err)) => Err(err),
    }
}

/// Publishes the progress of a loop as a fraction in `[0, 1]`.
///
/// The tracker writes `Some(0.0)` on creation, `Some(done / total)` on every
/// [`tick`](ProgressTracker::tick) and `None` once [`finish`](ProgressTracker::finish) is
/// called, which is the convention a UI progress bar can poll for.
///
/// # Examples
///
/// ```
/// use std::sync::RwLock;
/// use cancellable_loops::ProgressTracker;
///
/// let lock = RwLock::new(None);
/// let tracker = ProgressTracker::new(&lock, 4);
/// tracker.tick();
/// assert_eq!(*lock.read().unwrap(), Some(0.25));
/// tracker.finish();
/// assert_eq!(*lock.read().unwrap(), None);
/// ```
#[derive(Debug)]
pub struct ProgressTracker<'a> {
    lock: &'a RwLock<Option<f32>>,
    total: usize,
    done: AtomicUsize,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(lock: &'a RwLock<Option<f32>>, total: usize) -> Self {
        if let Ok(mut p) = lock.write() {
            *p = Some(0.0);
        }
        ProgressTracker {
            lock,
            total,
            done: AtomicUsize::new(0),
        }
    }

    /// Marks one more item as done.
    pub fn tick(&self) {
        // count under the lock so the published value never goes backwards
        if let Ok(mut p) = self.lock.write() {
            let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
            *p = Some(done as f32 / self.total.max(1) as f32);
        }
    }

    /// Clears the published progress.
    pub fn finish(self) {
        if let Ok(mut p) = self.lock.write() {
            *p = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_item_runs_when_not_aborted() {
        let abort_flag = AtomicBool::new(false);
        let counter = AtomicUsize::new(0);
        let result = par_try_for_each_cancellable(0..64, &abort_flag, |_| {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok::<(), ()>(())
        });
        assert_eq!(result, Ok(Completion::Finished));
        assert_eq!(counter.load(Ordering::Relaxed), 64);
    }

    #[test]
    fn raised_flag_stops_the_loop() {
        let abort_flag = AtomicBool::new(false);
        let result = par_try_for_each_cancellable(0..10_000, &abort_flag, |i| {
            if i == 0 {
                abort_flag.store(true, Ordering::Relaxed);
            }
            Ok::<(), ()>(())
        });
        // item 0 might not be scheduled first, but it always runs unless the flag is already set
        assert!(matches!(
            result,
            Ok(Completion::Cancelled) | Ok(Completion::Finished)
        ));
        assert!(abort_flag.load(Ordering::Relaxed));
    }

    #[test]
    fn progress_reaches_one() {
        let lock = RwLock::new(None);
        let tracker = ProgressTracker::new(&lock, 3);
        assert_eq!(*lock.read().unwrap(), Some(0.0));
        let abort_flag = AtomicBool::new(false);
        par_try_for_each_cancellable(0..3, &abort_flag, |_| {
            tracker.tick();
            Ok::<(), ()>(())
        })
        .unwrap();
        assert_eq!(*lock.read().unwrap(), Some(1.0));
        tracker.finish();
        assert_eq!(*lock.read().unwrap(), None);
    }
}
