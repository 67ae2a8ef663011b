//! Error types for each domain.

use crate::chain::ChainKind;

/// Top-level cctest error type.
#[derive(Debug, thiserror::Error)]
pub enum CctestError {
    /// Configuration error
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Chain invoker error
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Execution context error
    #[error("context error: {0}")]
    Context(#[from] ContextError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file does not exist
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// Configuration file could not be parsed
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// A configuration value is out of range or malformed
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Errors raised by chain invokers, during construction or at run time.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// A required configuration field is empty
    #[error("{chain}: missing required field '{field}'")]
    MissingField { chain: ChainKind, field: String },

    /// The endpoint address is not a valid URL
    #[error("{chain}: invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        chain: ChainKind,
        endpoint: String,
        reason: String,
    },

    /// A wallet or key file could not be loaded
    #[error("{chain}: cannot load wallet '{path}': {reason}")]
    Wallet {
        chain: ChainKind,
        path: String,
        reason: String,
    },

    /// A compiled contract or the contract directory could not be read
    #[error("{chain}: cannot load contract '{path}': {reason}")]
    Contract {
        chain: ChainKind,
        path: String,
        reason: String,
    },

    /// A credential value is malformed
    #[error("{chain}: invalid credential '{field}': {reason}")]
    Credential {
        chain: ChainKind,
        field: String,
        reason: String,
    },

    /// The chain could not be reached during construction
    #[error("{chain}: endpoint {endpoint} unreachable: {reason}")]
    Unreachable {
        chain: ChainKind,
        endpoint: String,
        reason: String,
    },

    /// HTTP transport failure
    #[error("{chain}: transport error calling '{method}': {reason}")]
    Transport {
        chain: ChainKind,
        method: String,
        reason: String,
    },

    /// The node answered with an RPC error
    #[error("{chain}: rpc '{method}' failed with code {code}: {message}")]
    Rpc {
        chain: ChainKind,
        method: String,
        code: i64,
        message: String,
    },

    /// The node answered with something we could not interpret
    #[error("{chain}: unexpected response to '{method}': {reason}")]
    UnexpectedResponse {
        chain: ChainKind,
        method: String,
        reason: String,
    },

    /// The node reports a different network than configured
    #[error("{chain}: chain id mismatch (expected {expected}, node reports {actual})")]
    ChainIdMismatch {
        chain: ChainKind,
        expected: String,
        actual: String,
    },

    /// A wait on chain state did not complete in time
    #[error("{chain}: timed out after {waited_secs}s waiting for {what}")]
    Timeout {
        chain: ChainKind,
        what: String,
        waited_secs: u64,
    },
}

impl ChainError {
    /// The chain the error originated from.
    pub fn chain(&self) -> ChainKind {
        match self {
            Self::MissingField { chain, .. }
            | Self::InvalidEndpoint { chain, .. }
            | Self::Wallet { chain, .. }
            | Self::Contract { chain, .. }
            | Self::Credential { chain, .. }
            | Self::Unreachable { chain, .. }
            | Self::Transport { chain, .. }
            | Self::Rpc { chain, .. }
            | Self::UnexpectedResponse { chain, .. }
            | Self::ChainIdMismatch { chain, .. }
            | Self::Timeout { chain, .. } => *chain,
        }
    }
}

/// Errors raised while populating the execution context.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// A handle slot was set twice
    #[error("handle for {chain} is already set")]
    SlotAlreadySet { chain: ChainKind },

    /// The context was frozen before every handle was set
    #[error("handle for {chain} was never set")]
    MissingHandle { chain: ChainKind },

    /// A handle was stored in the slot of a different chain
    #[error("handle for {actual} cannot be stored in the {slot} slot")]
    WrongChain { slot: ChainKind, actual: ChainKind },

    /// A test case name was registered twice
    #[error("test case already registered: {name}")]
    DuplicateCase { name: String },
}

/// Errors returned by test case bodies.
///
/// The run loop turns any of these into a failed case outcome.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    /// A chain call failed
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// An expectation about chain state did not hold
    #[error("assertion failed: {0}")]
    Assertion(String),
}
