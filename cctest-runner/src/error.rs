//! Runner error types and exit code mapping

use cctest_core::{CctestError, ChainError, ContextError};

use crate::lifecycle::Phase;

/// Runner error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(#[from] CctestError),

    /// Relay bootstrap or invoker construction failure.
    #[error("invoker construction failed: {0}")]
    Construction(#[from] ChainError),

    /// The execution context could not be assembled.
    #[error("context error: {0}")]
    Context(#[from] ContextError),

    /// Signal handlers could not be installed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),

    /// Logging or metrics setup failed.
    #[error("setup error: {0}")]
    Setup(String),

    /// The run finished with failed cases and `--no-wait` was given.
    #[error("{failed} of {executed} case executions failed")]
    CasesFailed {
        /// Failed executions
        failed: usize,
        /// All executions
        executed: usize,
    },

    /// Shutdown was requested before the run loop started.
    #[error("shutdown requested during {phase}")]
    Interrupted {
        /// Phase the signal arrived in
        phase: Phase,
    },
}

impl RunnerError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 0    | Interrupted by a signal before the run   |
    /// | 1    | Failed cases (`--no-wait`) / setup error |
    /// | 2    | Configuration error                      |
    /// | 3    | Invoker construction error               |
    /// | 4    | Context assembly error                   |
    /// | 10   | Signal handler installation error        |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Interrupted { .. } => 0,
            Self::CasesFailed { .. } | Self::Setup(_) => 1,
            Self::Config(_) => 2,
            Self::Construction(_) => 3,
            Self::Context(_) => 4,
            Self::Signal(_) => 10,
        }
    }
}
