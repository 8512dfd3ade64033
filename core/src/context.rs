//! Per-call cancellation and deadlines.
//!
//! A `Context` travels with every request. Clones share the cancellation
//! signal, so a clone handed to another thread can cancel a call in flight.
//! Blocking work passed to [`Context::run`] is raced against cancellation
//! and the deadline; the caller is released as soon as either fires.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Why a context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation flag plus the condition variable waiters park on. Also
/// notified whenever a `run` worker finishes.
#[derive(Debug, Default)]
struct Signal {
    canceled: Mutex<bool>,
    changed: Condvar,
}

impl Signal {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.canceled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        let _guard = self.lock();
        self.changed.notify_all();
    }
}

#[derive(Debug, Clone, Default)]
pub struct Context {
    signal: Arc<Signal>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never done unless canceled.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            signal: Arc::default(),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Marks the context canceled and wakes every call waiting on it.
    pub fn cancel(&self) {
        let mut canceled = self.signal.lock();
        *canceled = true;
        self.signal.changed.notify_all();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// `Some` once the context is canceled or past its deadline.
    /// Cancellation wins when both hold.
    pub fn err(&self) -> Option<ContextError> {
        let canceled = *self.signal.lock();
        self.check(canceled)
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    fn check(&self, canceled: bool) -> Option<ContextError> {
        if canceled {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Runs `work` on a worker thread and waits until it finishes, the
    /// context is canceled or the deadline passes.
    ///
    /// A result that is ready is returned even if the context is done by
    /// then. Abandoned work keeps running on its thread and its result is
    /// dropped.
    pub fn run<T, F>(&self, work: F) -> Result<T, ContextError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }

        let slot: Arc<Mutex<Option<T>>> = Arc::default();
        let result = Arc::clone(&slot);
        let signal = Arc::clone(&self.signal);
        thread::spawn(move || {
            let value = work();
            *result.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
            signal.notify();
        });

        let mut canceled = self.signal.lock();
        loop {
            if let Some(value) = slot.lock().unwrap_or_else(PoisonError::into_inner).take() {
                return Ok(value);
            }
            if let Some(err) = self.check(*canceled) {
                return Err(err);
            }
            canceled = match self.remaining() {
                Some(remaining) => {
                    let (guard, _) = self
                        .signal
                        .changed
                        .wait_timeout(canceled, remaining)
                        .unwrap_or_else(PoisonError::into_inner);
                    guard
                }
                None => self
                    .signal
                    .changed
                    .wait(canceled)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }
}
