//! Side chain cases.

use cctest_chains::parse_quantity;
use cctest_core::{CaseError, ChainKind, Framework, TestCase};
use serde_json::json;

/// Every invoker answers a height query.
pub struct ChainHeights;

impl ChainHeights {
    pub const NAME: &'static str = "chain_heights";
}

impl TestCase for ChainHeights {
    async fn execute(&self, ctx: &Framework) -> Result<(), CaseError> {
        for invoker in ctx.invokers() {
            let height = invoker.current_height().await?;
            tracing::info!(chain = %invoker.chain(), endpoint = invoker.endpoint(), height, "chain height");
        }
        Ok(())
    }
}

/// The Ethereum node reports the configured chain id.
///
/// Passes without a query when `eth.chain_id` is 0.
pub struct EthChainId;

impl EthChainId {
    pub const NAME: &'static str = "eth_chain_id";
}

impl TestCase for EthChainId {
    async fn execute(&self, ctx: &Framework) -> Result<(), CaseError> {
        let expected = ctx.config().eth.chain_id;
        if expected == 0 {
            tracing::info!("eth.chain_id not configured, skipping check");
            return Ok(());
        }

        let reply = ctx.eth().call("eth_chainId", json!([])).await?;
        let actual = parse_quantity(ChainKind::Eth, "eth_chainId", &reply)?;
        if actual != expected {
            return Err(CaseError::Assertion(format!(
                "eth chain id is {actual}, expected {expected}"
            )));
        }
        Ok(())
    }
}
