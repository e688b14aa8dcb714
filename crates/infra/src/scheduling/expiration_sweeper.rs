//! Expiration sweeper for instance reclamation
//!
//! Recurring background task that calls `ProvisionService::reap_expired`
//! on a fixed interval. Runs in its own tokio task so a sweep never blocks
//! a foreground creation; per-record failures stay inside `reap_expired`
//! and never stop the loop.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chalforge_infra::scheduling::{ExpirationSweeper, SweeperConfig};
//!
//! # async fn example(service: Arc<chalforge_core::ProvisionService>) -> Result<(), String> {
//! let mut sweeper = ExpirationSweeper::new(service, SweeperConfig::default());
//! sweeper.start().await.map_err(|e| e.to_string())?;
//! // ... application runs ...
//! sweeper.stop().await.map_err(|e| e.to_string())?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use chalforge_core::ProvisionService;
use chalforge_domain::constants::EXPIRATION_SWEEP_INTERVAL_SECS;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::{SweeperError, SweeperResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the expiration sweeper
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Interval between sweeps
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(EXPIRATION_SWEEP_INTERVAL_SECS) }
    }
}

/// Background expiration sweeper with lifecycle management
pub struct ExpirationSweeper {
    service: Arc<ProvisionService>,
    config: SweeperConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl ExpirationSweeper {
    /// Create a new sweeper
    pub fn new(service: Arc<ProvisionService>, config: SweeperConfig) -> Self {
        Self {
            service,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the sweeper
    ///
    /// Spawns a background task that reaps expired instances periodically.
    ///
    /// # Errors
    /// Returns error if the sweeper is already running.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SweeperResult<()> {
        if self.is_running() {
            return Err(SweeperError::AlreadyRunning);
        }

        info!(interval_secs = self.config.interval.as_secs(), "Starting expiration sweeper");

        // New token on each start so the sweeper can be restarted after stop
        self.cancellation_token = CancellationToken::new();

        let service = Arc::clone(&self.service);
        let interval = self.config.interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::sweep_loop(service, interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        info!("Expiration sweeper started");
        Ok(())
    }

    /// Stop the sweeper gracefully
    ///
    /// Cancels the background task and awaits completion.
    ///
    /// # Errors
    /// Returns error if the sweeper is not running.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SweeperResult<()> {
        if !self.is_running() {
            return Err(SweeperError::NotRunning);
        }

        info!("Stopping expiration sweeper");

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SweeperError::Timeout { duration: join_timeout, source })?
                .map_err(|e| SweeperError::TaskJoinFailed(e.to_string()))?;
        }

        info!("Expiration sweeper stopped");
        Ok(())
    }

    /// Check if the sweeper is running
    ///
    /// The sweeper is considered running if it has an active task handle
    /// that hasn't finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Background sweep loop
    async fn sweep_loop(
        service: Arc<ProvisionService>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Sweep loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    let reaped = service.reap_expired().await;
                    if reaped > 0 {
                        info!(reaped, "Expired instances reclaimed");
                    } else {
                        debug!("No expired instances");
                    }
                }
            }
        }
    }
}

/// Ensure the sweeper is stopped when dropped
impl Drop for ExpirationSweeper {
    fn drop(&mut self) {
        // Can't await the task handle here; cancelling the token is the
        // best-effort cleanup available in Drop.
        if !self.cancellation_token.is_cancelled() {
            warn!("ExpirationSweeper dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}
