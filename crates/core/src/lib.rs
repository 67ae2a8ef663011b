//! Core types for cctest: configuration, chain invoker traits, the execution
//! context and the run loop.
//!
//! Chain clients live in `cctest-chains`; the binary that wires everything
//! together is `cctest-runner`.

pub mod case;
pub mod chain;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod runner;

// --- re-exports ---

// errors
pub use error::{CaseError, CctestError, ChainError, ConfigError, ContextError};

// configuration
pub use config::{CctestConfig, Secret};

// chains
pub use chain::{BoxFuture, ChainInvoker, ChainKind, InvokerFactory, wait_for_height};

// cases and context
pub use case::{CaseDescriptor, CaseFailure, CaseOutcome, DynTestCase, TestCase};
pub use context::{Framework, FrameworkBuilder};
pub use registry::CaseRegistry;
pub use runner::{CaseRecord, RunReport, RunRequest};
