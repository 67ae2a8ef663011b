//! Lifecycle controller: startup ordering, the run and shutdown.
//!
//! ```text
//! Init -> Constructing -> Running -> WaitingForShutdown -> Terminated
//! ```
//!
//! # Startup order
//!
//! 1. Configuration (loaded before the controller exists)
//! 2. Relay chain bootstrap
//! 3. BTC, ETH, ONT, Cosmos invokers, in that order
//! 4. Context freeze and case registration
//!
//! Any construction error aborts startup before a single case runs.
//!
//! # Shutdown
//!
//! The signal listener cancels a shared [`CancellationToken`]. Cancellation
//! during construction abandons startup; during the run it stops the loop at
//! the next case boundary; afterwards it releases
//! [`wait_for_shutdown`](Lifecycle::wait_for_shutdown), which then stops the
//! background listeners started by cases.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cctest_core::metrics as m;
use cctest_core::{
    CaseDescriptor, CctestConfig, ChainError, ChainInvoker, ChainKind, Framework,
    FrameworkBuilder, InvokerFactory, RunReport, RunRequest,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::RunnerError;

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Configuration loaded, nothing constructed
    Init,
    /// Relay bootstrap and invoker construction
    Constructing,
    /// Run loop in progress
    Running,
    /// Run finished, waiting for a signal
    WaitingForShutdown,
    /// Shutdown complete
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Constructing => "constructing",
            Self::Running => "running",
            Self::WaitingForShutdown => "waiting_for_shutdown",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Drives one process lifetime of the harness.
pub struct Lifecycle<F: InvokerFactory> {
    config: Arc<CctestConfig>,
    factory: F,
    phase: Phase,
    shutdown: CancellationToken,
}

impl<F: InvokerFactory> Lifecycle<F> {
    /// Load configuration from `path` and create the controller.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Config`] if the file cannot be read, parsed
    /// or validated.
    pub async fn load(path: &Path, factory: F) -> Result<Self, RunnerError> {
        let config = CctestConfig::load(path).await?;
        Self::from_config(config, factory)
    }

    /// Create the controller from an already-loaded configuration.
    pub fn from_config(config: CctestConfig, factory: F) -> Result<Self, RunnerError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            factory,
            phase: Phase::Init,
            shutdown: CancellationToken::new(),
        })
    }

    /// Use an externally owned shutdown token, typically the one handed to
    /// [`spawn_signal_listener`].
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Loaded configuration.
    pub fn config(&self) -> &CctestConfig {
        &self.config
    }

    /// Token that requests shutdown when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Construct every invoker and freeze the execution context.
    ///
    /// # Errors
    ///
    /// - [`RunnerError::Construction`] on the first failing invoker
    /// - [`RunnerError::Context`] if a case name is registered twice
    /// - [`RunnerError::Interrupted`] if shutdown is requested first
    pub async fn construct(
        &mut self,
        cases: impl IntoIterator<Item = CaseDescriptor>,
    ) -> Result<Arc<Framework>, RunnerError> {
        self.phase = Phase::Constructing;
        tracing::info!("constructing chain invokers");

        let mut builder =
            FrameworkBuilder::new(Arc::clone(&self.config)).shutdown_token(self.shutdown.clone());

        let relay = self
            .interruptible(self.factory.bootstrap_relay(&self.config))
            .await?;
        tracing::info!(chain = %ChainKind::Relay, endpoint = relay.endpoint(), "invoker constructed");
        builder.set_handle(ChainKind::Relay, relay)?;

        for chain in ChainKind::SIDE_CHAINS {
            let invoker = self
                .interruptible(self.factory.construct(chain, &self.config))
                .await?;
            tracing::info!(chain = %chain, endpoint = invoker.endpoint(), "invoker constructed");
            builder.set_handle(chain, invoker)?;
        }
        metrics::gauge!(m::INVOKERS_CONSTRUCTED).set(ChainKind::ALL.len() as f64);

        builder.register_all(cases)?;
        let framework = Arc::new(builder.build()?);

        tracing::info!(
            cases = framework.registry().count(),
            "execution context ready"
        );
        Ok(framework)
    }

    /// Run the request and log its report.
    pub async fn run(&mut self, framework: &Arc<Framework>, request: &RunRequest) -> RunReport {
        self.phase = Phase::Running;
        let report = framework.run(request).await;

        for record in report.failures() {
            tracing::warn!(
                case = %record.case,
                iteration = record.iteration,
                outcome = %record.outcome,
                "case did not pass"
            );
        }
        tracing::info!(
            run_id = %report.run_id,
            executed = report.records.len(),
            passed = report.passed(),
            failed = report.failed(),
            interrupted = report.interrupted,
            "run report"
        );

        report
    }

    /// Block until shutdown is requested, then stop background listeners.
    ///
    /// Returns `false` if a listener outlived `general.shutdown_grace_secs`.
    pub async fn wait_for_shutdown(&mut self, framework: &Framework) -> bool {
        self.phase = Phase::WaitingForShutdown;
        if !self.shutdown.is_cancelled() {
            tracing::info!(
                listeners = framework.listener_count(),
                "run finished, waiting for shutdown signal"
            );
        }
        self.shutdown.cancelled().await;

        self.terminate(framework).await
    }

    /// Stop background listeners without waiting for a signal.
    pub async fn terminate(&mut self, framework: &Framework) -> bool {
        let grace = Duration::from_secs(self.config.general.shutdown_grace_secs);
        let clean = framework.stop_listeners(grace).await;
        self.phase = Phase::Terminated;
        tracing::info!("cctest shut down");
        clean
    }

    async fn interruptible(
        &self,
        construct: impl Future<Output = Result<Arc<dyn ChainInvoker>, ChainError>>,
    ) -> Result<Arc<dyn ChainInvoker>, RunnerError> {
        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => {
                tracing::warn!(phase = %self.phase, "shutdown requested, abandoning startup");
                Err(RunnerError::Interrupted { phase: self.phase })
            }
            result = construct => Ok(result?),
        }
    }
}

/// Spawn the task that turns SIGINT, SIGTERM or SIGHUP into cancellation
/// of `token`.
///
/// Handlers are installed before this returns. The task also ends when
/// `token` is cancelled by someone else.
///
/// # Errors
///
/// Returns [`RunnerError::Signal`] if a handler cannot be installed.
#[cfg(unix)]
pub fn spawn_signal_listener(token: CancellationToken) -> Result<JoinHandle<()>, RunnerError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).map_err(RunnerError::Signal)?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(RunnerError::Signal)?;
    let mut sighup = signal(SignalKind::hangup()).map_err(RunnerError::Signal)?;

    Ok(tokio::spawn(async move {
        let received = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
            _ = sighup.recv() => "SIGHUP",
            () = token.cancelled() => return,
        };
        tracing::info!(signal = received, "shutdown signal received");
        token.cancel();
    }))
}

/// Spawn the task that turns Ctrl-C into cancellation of `token`.
#[cfg(not(unix))]
pub fn spawn_signal_listener(token: CancellationToken) -> Result<JoinHandle<()>, RunnerError> {
    Ok(tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "failed to listen for ctrl-c");
                    return;
                }
                tracing::info!(signal = "ctrl-c", "shutdown signal received");
                token.cancel();
            }
            () = token.cancelled() => {}
        }
    }))
}
