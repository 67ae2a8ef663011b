//! Cosmos invoker, over Tendermint RPC.

use std::time::Duration;

use cctest_core::{BoxFuture, CctestConfig, ChainError, ChainInvoker, ChainKind};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::rpc::{JsonRpcClient, parse_quantity, require};
use crate::wallet::load_key_file;

/// Subset of the Tendermint `status` result.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeStatus {
    /// Node identity
    pub node_info: NodeInfo,
    /// Sync progress
    pub sync_info: SyncInfo,
}

/// `status.node_info`: who the node is.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeInfo {
    /// Chain id
    pub network: String,
    /// Operator-chosen node name, empty if absent
    #[serde(default)]
    pub moniker: String,
}

/// `status.sync_info`: how far the node has synced.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncInfo {
    /// Decimal string
    pub latest_block_height: Value,
    /// Node is still replaying blocks from peers
    #[serde(default)]
    pub catching_up: bool,
}

/// Invoker for a Cosmos SDK node.
#[derive(Debug)]
pub struct CosmosInvoker {
    rpc: JsonRpcClient,
    chain_id: String,
}

impl CosmosInvoker {
    /// Construct from the Cosmos section of the configuration.
    ///
    /// The node's `status.node_info.network` must equal `cosmos.chain_id`.
    pub async fn new(config: &CctestConfig) -> Result<Self, ChainError> {
        let cosmos = &config.cosmos;
        require(ChainKind::Cosmos, "cosmos.rpc_address", &cosmos.rpc_address)?;
        require(ChainKind::Cosmos, "cosmos.wallet", &cosmos.wallet)?;
        require(ChainKind::Cosmos, "cosmos.chain_id", &cosmos.chain_id)?;
        if cosmos.wallet_password.is_empty() {
            return Err(ChainError::Credential {
                chain: ChainKind::Cosmos,
                field: "cosmos.wallet_password".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        load_key_file(ChainKind::Cosmos, &cosmos.wallet).await?;

        let rpc = JsonRpcClient::new(
            ChainKind::Cosmos,
            &cosmos.rpc_address,
            Duration::from_secs(config.general.rpc_timeout_secs),
        )?;
        let status = rpc.probe("status", json!({})).await?;
        let status = decode_status(status)?;

        if status.node_info.network != cosmos.chain_id {
            return Err(ChainError::ChainIdMismatch {
                chain: ChainKind::Cosmos,
                expected: cosmos.chain_id.clone(),
                actual: status.node_info.network,
            });
        }
        if status.sync_info.catching_up {
            tracing::warn!(endpoint = %cosmos.rpc_address, "cosmos node is still catching up");
        }

        tracing::info!(
            endpoint = %cosmos.rpc_address,
            chain_id = %cosmos.chain_id,
            moniker = %status.node_info.moniker,
            "cosmos invoker ready"
        );

        Ok(Self {
            rpc,
            chain_id: cosmos.chain_id.clone(),
        })
    }

    /// Configured chain id.
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Current node status.
    pub async fn status(&self) -> Result<NodeStatus, ChainError> {
        decode_status(self.rpc.call("status", json!({})).await?)
    }
}

impl ChainInvoker for CosmosInvoker {
    fn chain(&self) -> ChainKind {
        ChainKind::Cosmos
    }

    fn endpoint(&self) -> &str {
        self.rpc.endpoint()
    }

    fn account(&self) -> Option<&str> {
        None
    }

    fn current_height(&self) -> BoxFuture<'_, Result<u64, ChainError>> {
        Box::pin(async move {
            let status = self.status().await?;
            parse_quantity(
                ChainKind::Cosmos,
                "status",
                &status.sync_info.latest_block_height,
            )
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

fn decode_status(value: Value) -> Result<NodeStatus, ChainError> {
    serde_json::from_value(value).map_err(|e| ChainError::UnexpectedResponse {
        chain: ChainKind::Cosmos,
        method: "status".to_owned(),
        reason: e.to_string(),
    })
}
