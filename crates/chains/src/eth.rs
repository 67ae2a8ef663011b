//! Ethereum invoker.

use std::time::Duration;

use cctest_core::{BoxFuture, CctestConfig, ChainError, ChainInvoker, ChainKind, Secret};
use serde_json::{Value, json};

use crate::rpc::{JsonRpcClient, parse_quantity, require};

/// Invoker for an Ethereum JSON-RPC node.
#[derive(Debug)]
pub struct EthInvoker {
    rpc: JsonRpcClient,
    private_key: Secret,
    chain_id: u64,
}

impl EthInvoker {
    /// Construct from the ETH section of the configuration.
    ///
    /// When `eth.chain_id` is non-zero the node must report the same id.
    pub async fn new(config: &CctestConfig) -> Result<Self, ChainError> {
        let eth = &config.eth;
        require(ChainKind::Eth, "eth.rpc_address", &eth.rpc_address)?;
        require(ChainKind::Eth, "eth.private_key", eth.private_key.expose())?;
        validate_private_key(eth.private_key.expose())?;

        let rpc = JsonRpcClient::new(
            ChainKind::Eth,
            &eth.rpc_address,
            Duration::from_secs(config.general.rpc_timeout_secs),
        )?;
        let height = parse_quantity(
            ChainKind::Eth,
            "eth_blockNumber",
            &rpc.probe("eth_blockNumber", json!([])).await?,
        )?;

        let invoker = Self {
            rpc,
            private_key: eth.private_key.clone(),
            chain_id: eth.chain_id,
        };

        if eth.chain_id != 0 {
            let actual = invoker.node_chain_id().await?;
            if actual != eth.chain_id {
                return Err(ChainError::ChainIdMismatch {
                    chain: ChainKind::Eth,
                    expected: eth.chain_id.to_string(),
                    actual: actual.to_string(),
                });
            }
        }

        tracing::info!(
            endpoint = %eth.rpc_address,
            chain_id = eth.chain_id,
            height,
            "eth invoker ready"
        );

        Ok(invoker)
    }

    /// Chain id the node reports.
    pub async fn node_chain_id(&self) -> Result<u64, ChainError> {
        let id = self.rpc.call("eth_chainId", json!([])).await?;
        parse_quantity(ChainKind::Eth, "eth_chainId", &id)
    }

    /// Configured chain id; 0 when unchecked.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Signing key.
    pub fn private_key(&self) -> &Secret {
        &self.private_key
    }
}

impl ChainInvoker for EthInvoker {
    fn chain(&self) -> ChainKind {
        ChainKind::Eth
    }

    fn endpoint(&self) -> &str {
        self.rpc.endpoint()
    }

    fn account(&self) -> Option<&str> {
        None
    }

    fn current_height(&self) -> BoxFuture<'_, Result<u64, ChainError>> {
        Box::pin(async move {
            let number = self.rpc.call("eth_blockNumber", json!([])).await?;
            parse_quantity(ChainKind::Eth, "eth_blockNumber", &number)
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

/// 32 bytes of hex, optionally `0x`-prefixed.
fn validate_private_key(key: &str) -> Result<(), ChainError> {
    let hex = key.strip_prefix("0x").unwrap_or(key);
    let invalid = |reason: &str| ChainError::Credential {
        chain: ChainKind::Eth,
        field: "eth.private_key".to_owned(),
        reason: reason.to_owned(),
    };

    if hex.len() != 64 {
        return Err(invalid("expected 32 bytes of hex"));
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("not a hex string"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "4cbb3e2ac1c4ad84ca6ad3bd4e1bfa3d4bd96f2a6dd0c8d7aa38cb3f8e9c3c1a";

    #[test]
    fn private_key_validation() {
        assert!(validate_private_key(KEY).is_ok());
        assert!(validate_private_key(&format!("0x{KEY}")).is_ok());
        assert!(validate_private_key(&KEY[2..]).is_err());
        assert!(validate_private_key(&KEY.replace('a', "g")).is_err());
    }

    #[tokio::test]
    async fn new_requires_private_key() {
        let mut config = CctestConfig::default();
        config.eth.rpc_address = "http://127.0.0.1:8545".to_owned();
        let err = EthInvoker::new(&config).await.unwrap_err();
        assert!(matches!(
            err,
            ChainError::MissingField { chain: ChainKind::Eth, ref field } if field == "eth.private_key"
        ));
    }

    #[tokio::test]
    async fn new_rejects_bad_endpoint_before_connecting() {
        let mut config = CctestConfig::default();
        config.eth.rpc_address = "localhost:8545".to_owned();
        config.eth.private_key = Secret::new(KEY);
        let err = EthInvoker::new(&config).await.unwrap_err();
        assert!(matches!(err, ChainError::InvalidEndpoint { .. }));
    }
}
