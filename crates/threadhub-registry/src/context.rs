//! Per-call cancellation and deadline.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::RegistryError;

/// Cancellation signal plus optional deadline for a registry call.
///
/// Clones share the same cancellation token; [`Context::child`] derives a
/// context that is canceled with its parent but can also be canceled alone.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never canceled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Wrap an existing cancellation token.
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Tighten the deadline to at most `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Tighten the deadline to at most `deadline`.  An earlier deadline
    /// already on the context wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The error this context would fail with right now, if it is done.
    pub fn err(&self) -> Option<RegistryError> {
        if self.cancel.is_cancelled() {
            return Some(RegistryError::Canceled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(RegistryError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the context is canceled or its deadline passes.
    pub async fn done(&self) -> RegistryError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.cancel.cancelled() => RegistryError::Canceled,
                _ = tokio::time::sleep_until(deadline) => RegistryError::DeadlineExceeded,
            },
            None => {
                self.cancel.cancelled().await;
                RegistryError::Canceled
            }
        }
    }
}
