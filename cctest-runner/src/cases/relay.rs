//! Relay chain cases.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cctest_core::{CaseError, ChainKind, Framework, TestCase, wait_for_height};

/// Relay height is above genesis.
pub struct RelayHeight;

impl RelayHeight {
    pub const NAME: &'static str = "relay_height";
}

impl TestCase for RelayHeight {
    async fn execute(&self, ctx: &Framework) -> Result<(), CaseError> {
        let height = ctx.relay().current_height().await?;
        tracing::info!(height, "relay height");
        if height == 0 {
            return Err(CaseError::Assertion(
                "relay chain has not produced a block past genesis".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Relay chain produces a block within `timeout`.
pub struct RelayProgress {
    poll: Duration,
    timeout: Duration,
}

impl RelayProgress {
    pub const NAME: &'static str = "relay_progress";

    /// Poll every `poll` for at most `timeout`.
    pub fn new(poll: Duration, timeout: Duration) -> Self {
        Self { poll, timeout }
    }
}

impl Default for RelayProgress {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60))
    }
}

impl TestCase for RelayProgress {
    async fn execute(&self, ctx: &Framework) -> Result<(), CaseError> {
        let relay = ctx.relay();
        let start = relay.current_height().await?;
        let reached = wait_for_height(relay, start + 1, self.poll, self.timeout).await?;
        tracing::info!(start, reached, "relay chain progressed");
        Ok(())
    }
}

/// Starts a background listener logging new relay heights until shutdown.
///
/// Only the first successful execution starts a listener; later iterations
/// find it already running.
pub struct RelayWatch {
    interval: Duration,
    started: AtomicBool,
}

impl RelayWatch {
    pub const NAME: &'static str = "relay_watch";

    /// Check the relay height every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: AtomicBool::new(false),
        }
    }
}

impl Default for RelayWatch {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl TestCase for RelayWatch {
    async fn execute(&self, ctx: &Framework) -> Result<(), CaseError> {
        if self.started.load(Ordering::SeqCst) {
            tracing::debug!("relay watcher already running");
            return Ok(());
        }

        let relay = ctx.handle(ChainKind::Relay);
        let shutdown = ctx.shutdown_token();
        let interval = self.interval;
        // a failed query leaves the watcher unstarted for the next iteration
        let mut last = relay.current_height().await?;

        ctx.spawn_listener(Self::NAME, async move {
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    () = tokio::time::sleep(interval) => {}
                }
                match relay.current_height().await {
                    Ok(height) if height > last => {
                        tracing::info!(height, previous = last, "new relay block");
                        last = height;
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "relay height query failed"),
                }
            }
            tracing::debug!(last, "relay watcher stopped");
        });
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }
}
