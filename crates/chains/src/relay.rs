//! Poly relay chain invoker.

use std::time::Duration;

use cctest_core::{BoxFuture, CctestConfig, ChainError, ChainInvoker, ChainKind};
use serde_json::{Value, json};

use crate::rpc::{JsonRpcClient, parse_quantity, require};
use crate::wallet::Wallet;

/// Invoker for the relay chain every side chain registers against.
#[derive(Debug)]
pub struct PolyInvoker {
    rpc: JsonRpcClient,
    wallet: Wallet,
}

impl PolyInvoker {
    /// Connect to the relay chain.
    ///
    /// Loads the relay wallet, then asks the node for its height so that an
    /// unreachable relay fails startup before any side chain is touched.
    pub async fn bootstrap(config: &CctestConfig) -> Result<Self, ChainError> {
        let relay = &config.relay;
        require(ChainKind::Relay, "relay.rpc_address", &relay.rpc_address)?;
        require(ChainKind::Relay, "relay.wallet", &relay.wallet)?;

        let rpc = JsonRpcClient::new(
            ChainKind::Relay,
            &relay.rpc_address,
            Duration::from_secs(config.general.rpc_timeout_secs),
        )?;
        let wallet = Wallet::load(ChainKind::Relay, &relay.wallet, &relay.wallet_password).await?;

        let count = rpc.probe("getblockcount", json!([])).await?;
        let height = block_count_to_height(ChainKind::Relay, &count)?;

        tracing::info!(
            endpoint = %relay.rpc_address,
            account = %wallet.address(),
            height,
            "relay chain bootstrapped"
        );

        Ok(Self { rpc, wallet })
    }

    /// Relay wallet.
    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }
}

impl ChainInvoker for PolyInvoker {
    fn chain(&self) -> ChainKind {
        ChainKind::Relay
    }

    fn endpoint(&self) -> &str {
        self.rpc.endpoint()
    }

    fn account(&self) -> Option<&str> {
        Some(self.wallet.address())
    }

    fn current_height(&self) -> BoxFuture<'_, Result<u64, ChainError>> {
        Box::pin(async move {
            let count = self.rpc.call("getblockcount", json!([])).await?;
            block_count_to_height(ChainKind::Relay, &count)
        })
    }

    fn call<'a>(
        &'a self,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, Result<Value, ChainError>> {
        Box::pin(self.rpc.call(method, params))
    }
}

/// Ontology-family `getblockcount` counts the genesis block.
pub(crate) fn block_count_to_height(chain: ChainKind, count: &Value) -> Result<u64, ChainError> {
    Ok(parse_quantity(chain, "getblockcount", count)?.saturating_sub(1))
}
