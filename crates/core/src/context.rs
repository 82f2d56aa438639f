use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::status::Status;

/// Why a call stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// The caller canceled the call or disconnected.
    Canceled,
    /// The call's deadline elapsed.
    DeadlineExceeded,
}

impl From<Interrupt> for Status {
    fn from(interrupt: Interrupt) -> Self {
        match interrupt {
            Interrupt::Canceled => Self::canceled("request is canceled"),
            Interrupt::DeadlineExceeded => Self::deadline_exceeded("deadline is exceeded"),
        }
    }
}

/// Per-call cancellation and deadline signal.
///
/// Long-running loops call [`check`](Self::check) at every iteration boundary
/// and race [`done`](Self::done) against their next suspension point.
/// Clones share the same cancellation token.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context around an existing token, e.g. a child of a server-wide one.
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The interrupt that has already fired, if any. Cancellation wins over
    /// an elapsed deadline.
    pub fn interrupted(&self) -> Option<Interrupt> {
        if self.cancel.is_cancelled() {
            return Some(Interrupt::Canceled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(Interrupt::DeadlineExceeded);
        }
        None
    }

    pub fn check(&self) -> Result<(), Interrupt> {
        self.interrupted().map_or(Ok(()), Err)
    }

    /// Resolves once the call is canceled or its deadline elapses.
    pub async fn done(&self) -> Interrupt {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.cancel.cancelled() => Interrupt::Canceled,
                    () = tokio::time::sleep_until(deadline) => Interrupt::DeadlineExceeded,
                }
            }
            None => {
                self.cancel.cancelled().await;
                Interrupt::Canceled
            }
        }
    }
}
