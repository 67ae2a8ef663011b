//! Test cases and their outcomes.
//!
//! A test case implements [`TestCase`] and is handed to the framework as a
//! [`CaseDescriptor`] carrying its unique name. [`TestCase`] uses RPITIT and
//! is therefore not dyn-compatible; every implementor automatically gets
//! [`DynTestCase`], which the registry stores as `Box<dyn DynTestCase>`.
//!
//! # Example
//! ```ignore
//! struct RelayHeight;
//!
//! impl TestCase for RelayHeight {
//!     async fn execute(&self, ctx: &Framework) -> Result<(), CaseError> {
//!         let height = ctx.relay().current_height().await?;
//!         if height == 0 {
//!             return Err(CaseError::Assertion("relay chain has no blocks".to_owned()));
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let descriptor = CaseDescriptor::new("relay_height", "relay chain produces blocks", RelayHeight);
//! ```

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::chain::BoxFuture;
use crate::context::Framework;
use crate::error::CaseError;

// ─── TestCase ────────────────────────────────────────────────────────

/// A test case body.
pub trait TestCase: Send + Sync {
    /// Run the case against the frozen execution context.
    fn execute(&self, ctx: &Framework) -> impl Future<Output = Result<(), CaseError>> + Send;
}

/// dyn-compatible form of [`TestCase`].
pub trait DynTestCase: Send + Sync {
    /// Run the case against the frozen execution context.
    fn execute<'a>(&'a self, ctx: &'a Framework) -> BoxFuture<'a, Result<(), CaseError>>;
}

impl<T: TestCase> DynTestCase for T {
    fn execute<'a>(&'a self, ctx: &'a Framework) -> BoxFuture<'a, Result<(), CaseError>> {
        Box::pin(TestCase::execute(self, ctx))
    }
}

// ─── CaseDescriptor ──────────────────────────────────────────────────

/// A named test case, ready for registration.
pub struct CaseDescriptor {
    name: String,
    description: String,
    case: Box<dyn DynTestCase>,
}

impl CaseDescriptor {
    /// Describe `case` under a unique `name`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        case: impl TestCase + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            case: Box::new(case),
        }
    }

    /// Unique case name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line human readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Run the case.
    pub fn execute<'a>(&'a self, ctx: &'a Framework) -> BoxFuture<'a, Result<(), CaseError>> {
        self.case.execute(ctx)
    }
}

impl fmt::Debug for CaseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

// ─── CaseOutcome ─────────────────────────────────────────────────────

/// Why an execution failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseFailure {
    /// The requested name is not registered
    NotFound,
    /// The case returned an error
    Error(String),
    /// The case panicked
    Panicked(String),
}

impl fmt::Display for CaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Error(reason) => write!(f, "{reason}"),
            Self::Panicked(msg) => write!(f, "panicked: {msg}"),
        }
    }
}

/// Result of one execution of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseOutcome {
    /// The case completed without error
    Success,
    /// The case failed
    Failure(CaseFailure),
}

impl CaseOutcome {
    /// Whether this outcome is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Label used for logs and the `result` metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure(CaseFailure::NotFound) => "not_found",
            Self::Failure(CaseFailure::Error(_)) => "failure",
            Self::Failure(CaseFailure::Panicked(_)) => "panic",
        }
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure(failure) => write!(f, "failure: {failure}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl TestCase for Noop {
        async fn execute(&self, _ctx: &Framework) -> Result<(), CaseError> {
            Ok(())
        }
    }

    #[test]
    fn descriptor_exposes_metadata() {
        let descriptor = CaseDescriptor::new("noop", "does nothing", Noop);
        assert_eq!(descriptor.name(), "noop");
        assert_eq!(descriptor.description(), "does nothing");
        assert!(format!("{descriptor:?}").contains("noop"));
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(CaseOutcome::Success.label(), "success");
        assert_eq!(
            CaseOutcome::Failure(CaseFailure::NotFound).label(),
            "not_found"
        );
        assert_eq!(
            CaseOutcome::Failure(CaseFailure::Error("x".to_owned())).label(),
            "failure"
        );
        assert_eq!(
            CaseOutcome::Failure(CaseFailure::Panicked("x".to_owned())).label(),
            "panic"
        );
    }

    #[test]
    fn outcome_display() {
        assert_eq!(CaseOutcome::Success.to_string(), "success");
        assert_eq!(
            CaseOutcome::Failure(CaseFailure::Panicked("boom".to_owned())).to_string(),
            "failure: panicked: boom"
        );
        assert!(CaseOutcome::Success.is_success());
        assert!(!CaseOutcome::Failure(CaseFailure::NotFound).is_success());
    }
}
