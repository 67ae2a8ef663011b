//! Test case registry.
//!
//! Registration order is preserved: it is the order in which cases run when
//! a run request names no cases.

use crate::case::CaseDescriptor;
use crate::error::ContextError;

/// Ordered set of uniquely named test cases.
#[derive(Debug, Default)]
pub struct CaseRegistry {
    cases: Vec<CaseDescriptor>,
}

impl CaseRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { cases: Vec::new() }
    }

    /// Register a case.
    ///
    /// Returns an error if a case with the same name is already registered.
    pub fn register(&mut self, descriptor: CaseDescriptor) -> Result<(), ContextError> {
        if self.contains(descriptor.name()) {
            return Err(ContextError::DuplicateCase {
                name: descriptor.name().to_owned(),
            });
        }
        self.cases.push(descriptor);
        Ok(())
    }

    /// Look up a case by name.
    pub fn get(&self, name: &str) -> Option<&CaseDescriptor> {
        self.cases.iter().find(|c| c.name() == name)
    }

    /// Registration index of a case.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.cases.iter().position(|c| c.name() == name)
    }

    /// Case at a registration index.
    pub fn at(&self, index: usize) -> Option<&CaseDescriptor> {
        self.cases.get(index)
    }

    /// Whether a case with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.cases.iter().any(|c| c.name() == name)
    }

    /// Every registered name, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.cases.iter().map(|c| c.name().to_owned()).collect()
    }

    /// Every registered case, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CaseDescriptor> {
        self.cases.iter()
    }

    /// Number of registered cases.
    pub fn count(&self) -> usize {
        self.cases.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
