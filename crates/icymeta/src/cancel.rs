//! Cooperative cancellation
//!
//! A `CancelToken` is passed to every blocking operation. Readers check it
//! between waits and fail with [`Cancelled`] once it fires.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Why an operation was aborted by its token
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancelled {
    #[error("operation cancelled")]
    Requested,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl Cancelled {
    /// Wrap into an `io::Error` so it can travel through `Read` implementations.
    pub fn into_io(self) -> io::Error {
        io::Error::other(self)
    }

    /// Recover the cancellation reason carried by an `io::Error`, if any.
    pub fn from_io(err: &io::Error) -> Option<Self> {
        err.get_ref()
            .and_then(|inner| inner.downcast_ref::<Cancelled>())
            .copied()
    }
}

/// Cancellation token with an optional deadline.
///
/// Clones and derived tokens share one flag: cancelling any of them cancels
/// all of them.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a token that also expires `timeout` from now.
    ///
    /// A timeout too large to represent as an `Instant` adds no deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Derive a token that also expires at `deadline`.
    ///
    /// An earlier deadline already set on `self` is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        };
        Self {
            flag: self.flag.clone(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.check().is_err()
    }

    /// `Err` once the token has been cancelled or its deadline has passed.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.flag.load(Ordering::SeqCst) {
            return Err(Cancelled::Requested);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Cancelled::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
