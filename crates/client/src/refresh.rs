//! Background access token refresh.
//!
//! A [`TokenRefresher`] logs in once up front, then keeps logging in on a
//! fixed interval so the client's token never expires mid-session.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{Error, VitrineClient};

/// Default time between successful refreshes.
const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Default time before retrying a failed refresh.
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Keeps a [`VitrineClient`]'s access token fresh.
pub struct TokenRefresher {
    client: VitrineClient,
    username: String,
    password: SecretString,
    interval: Duration,
    retry_interval: Duration,
}

/// Handle to a running [`TokenRefresher`].
///
/// Dropping the handle leaves the task running; call [`stop`](Self::stop).
pub struct RefreshHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Token that stops the refresher when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop refreshing and wait for the task to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "token refresher task failed");
        }
    }
}

impl TokenRefresher {
    /// Create a refresher that logs `client` in as `username`.
    pub fn new(client: VitrineClient, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            client,
            username: username.into(),
            password,
            interval: DEFAULT_INTERVAL,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Override the time between successful refreshes.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Override the time before retrying a failed refresh.
    #[must_use]
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Log in once, then spawn the refresh loop.
    ///
    /// Fails without spawning anything when the first login fails.
    pub async fn start(self) -> Result<RefreshHandle, Error> {
        self.refresh().await?;
        info!(username = %self.username, "token refresher started");

        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(cancel.clone()));
        Ok(RefreshHandle { cancel, task })
    }

    async fn refresh(&self) -> Result<(), Error> {
        self.client
            .login(&self.username, self.password.expose_secret())
            .await
            .map(|_| ())
    }

    async fn run(self, cancel: CancellationToken) {
        let mut wait = self.interval;
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("token refresher stopped");
                    return;
                }
                () = tokio::time::sleep(wait) => {}
            }

            wait = match self.refresh().await {
                Ok(()) => {
                    debug!(username = %self.username, "token refreshed");
                    self.interval
                }
                Err(e) => {
                    warn!(
                        username = %self.username,
                        error = %e,
                        retry_in_ms = self.retry_interval.as_millis(),
                        "token refresh failed"
                    );
                    self.retry_interval
                }
            };
        }
    }
}
