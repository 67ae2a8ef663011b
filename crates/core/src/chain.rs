//! Chain invoker abstractions.
//!
//! Every chain the harness talks to is reached through a [`ChainInvoker`]:
//! a read-only capability handle that is constructed once at startup and
//! shared with every test case for the rest of the process.
//!
//! [`InvokerFactory`] is the construction seam used by the lifecycle
//! controller. Concrete JSON-RPC invokers live in the `cctest-chains` crate;
//! tests substitute their own factories.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::CctestConfig;
use crate::error::ChainError;

/// Boxed, `Send` future used by the dyn-compatible traits in this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ─── ChainKind ───────────────────────────────────────────────────────

/// The chains known to the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    /// Poly relay chain
    Relay,
    /// Bitcoin-style UTXO chain
    Btc,
    /// Ethereum-style account chain
    Eth,
    /// Ontology chain
    Ont,
    /// Cosmos/Tendermint chain
    Cosmos,
}

impl ChainKind {
    /// Construction order: the relay chain first, then every side chain.
    pub const ALL: [ChainKind; 5] = [
        ChainKind::Relay,
        ChainKind::Btc,
        ChainKind::Eth,
        ChainKind::Ont,
        ChainKind::Cosmos,
    ];

    /// Side chains, in construction order.
    pub const SIDE_CHAINS: [ChainKind; 4] = [
        ChainKind::Btc,
        ChainKind::Eth,
        ChainKind::Ont,
        ChainKind::Cosmos,
    ];

    /// Lowercase name used in logs, config sections and env variables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relay => "relay",
            Self::Btc => "btc",
            Self::Eth => "eth",
            Self::Ont => "ont",
            Self::Cosmos => "cosmos",
        }
    }
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── ChainInvoker ────────────────────────────────────────────────────

/// Capability surface of a chain client.
///
/// Implementations must be usable through `&self` from any test case;
/// the run loop never executes two cases at once, so implementations
/// need no internal ordering beyond what their transport provides.
pub trait ChainInvoker: Send + Sync {
    /// Which chain this invoker talks to.
    fn chain(&self) -> ChainKind;

    /// Endpoint address the invoker was constructed with.
    fn endpoint(&self) -> &str;

    /// Address of the account the invoker signs with, if it has one.
    fn account(&self) -> Option<&str>;

    /// Latest block height reported by the node.
    fn current_height(&self) -> BoxFuture<'_, Result<u64, ChainError>>;

    /// Raw RPC call, used by test cases to submit transactions and query state.
    fn call<'a>(
        &'a self,
        method: &'a str,
        params: serde_json::Value,
    ) -> BoxFuture<'a, Result<serde_json::Value, ChainError>>;
}

/// Poll `invoker` until it reports a height of at least `target`.
///
/// Returns the first height observed at or above `target`.
///
/// # Errors
///
/// Returns [`ChainError::Timeout`] if `timeout` elapses first, or the
/// first error returned by [`ChainInvoker::current_height`].
pub async fn wait_for_height(
    invoker: &dyn ChainInvoker,
    target: u64,
    poll: Duration,
    timeout: Duration,
) -> Result<u64, ChainError> {
    let wait = async {
        loop {
            let height = invoker.current_height().await?;
            if height >= target {
                return Ok::<u64, ChainError>(height);
            }
            tracing::trace!(chain = %invoker.chain(), height, target, "waiting for height");
            tokio::time::sleep(poll).await;
        }
    };

    match tokio::time::timeout(timeout, wait).await {
        Ok(result) => result,
        Err(_) => Err(ChainError::Timeout {
            chain: invoker.chain(),
            what: format!("height {target}"),
            waited_secs: timeout.as_secs(),
        }),
    }
}

// ─── InvokerFactory ──────────────────────────────────────────────────

/// Constructs invoker handles from configuration.
///
/// The lifecycle controller calls [`bootstrap_relay`](Self::bootstrap_relay)
/// first and then [`construct`](Self::construct) once per side chain, in
/// [`ChainKind::SIDE_CHAINS`] order. Any error is fatal to startup.
pub trait InvokerFactory: Send + Sync {
    /// Connect to the relay chain and prepare it for side-chain registration.
    fn bootstrap_relay(
        &self,
        config: &CctestConfig,
    ) -> impl Future<Output = Result<Arc<dyn ChainInvoker>, ChainError>> + Send;

    /// Construct the invoker for one side chain.
    fn construct(
        &self,
        chain: ChainKind,
        config: &CctestConfig,
    ) -> impl Future<Output = Result<Arc<dyn ChainInvoker>, ChainError>> + Send;
}
