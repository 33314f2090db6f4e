use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, TryLockError};

/// Cells per work chunk. Progress is reported and cancellation checked once
/// per chunk.
pub const PROGRESS_INTERVAL: usize = 60;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cooperative cancellation shared between a caller and a running job.
///
/// Cancellation is sticky: once [`cancel`](Self::cancel) is called, every
/// calculation or render using the token stops picking up new chunks, even
/// one that starts afterwards, until [`reset`](Self::reset) re-arms it. A
/// chunk already in flight always runs to completion. The generation counts
/// cancel requests so observers can tell them apart.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
    generation: AtomicU64,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the current job and any job started before the next reset.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Re-arm the token for a new job.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Number of cancel requests so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub(crate) fn guard(&self) -> CancelGuard<'_> {
        CancelGuard {
            token: self,
            tripped: AtomicBool::new(false),
        }
    }
}

/// Per-job view of a [`CancelToken`]: remembers whether any chunk was skipped.
pub(crate) struct CancelGuard<'a> {
    token: &'a CancelToken,
    tripped: AtomicBool,
}

impl CancelGuard<'_> {
    /// Returns `true` (and records the skip) if the job has been cancelled.
    pub(crate) fn should_stop(&self) -> bool {
        if self.token.is_cancelled() {
            self.tripped.store(true, Ordering::Relaxed);
            return true;
        }
        false
    }

    /// `true` if at least one chunk was skipped because of cancellation.
    pub(crate) fn tripped(&self) -> bool {
        self.tripped.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

struct Sink<P> {
    reported: usize,
    callback: P,
}

/// Funnels chunk completions from worker threads into a single callback.
///
/// The callback runs under a mutex and only sees the shared counter when it
/// has grown since the last report, so values are strictly increasing no
/// matter which thread finishes first. A worker that finds another one
/// reporting skips its report instead of waiting; the total still arrives
/// with the next report or with [`finish`](Self::finish).
pub(crate) struct Progress<P> {
    done: AtomicUsize,
    sink: Mutex<Sink<P>>,
}

impl<P: FnMut(usize) + Send> Progress<P> {
    pub(crate) fn new(callback: P) -> Self {
        Self {
            done: AtomicUsize::new(0),
            sink: Mutex::new(Sink {
                reported: 0,
                callback,
            }),
        }
    }

    /// Record `cells` more completed cells and report the running total.
    pub(crate) fn advance(&self, cells: usize) {
        self.done.fetch_add(cells, Ordering::SeqCst);
        let mut sink = match self.sink.try_lock() {
            Ok(sink) => sink,
            Err(TryLockError::WouldBlock) => return,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
        };
        let done = self.done.load(Ordering::SeqCst);
        if done > sink.reported {
            sink.reported = done;
            (sink.callback)(done);
        }
    }

    /// Deliver the final, exact count. Always invokes the callback.
    pub(crate) fn finish(self) -> usize {
        let done = self.done.into_inner();
        let mut sink = self.sink.into_inner().unwrap_or_else(PoisonError::into_inner);
        (sink.callback)(done);
        done
    }
}
