//! Bitcoin invoker.
//!
//! Talks to bitcoind over authenticated JSON-RPC. Bitcoin headers and
//! multisig unlocks are relayed through the Poly chain, so the invoker also
//! carries its own relay client and relay wallet.

use std::time::Duration;

use cctest_core::config::{BtcConfig, RelayConfig};
use cctest_core::{BoxFuture, CctestConfig, ChainError, ChainInvoker, ChainKind, Secret};
use serde_json::{Value, json};

use crate::rpc::{JsonRpcClient, parse_quantity, require};
use crate::wallet::Wallet;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Invoker for a bitcoind node.
#[derive(Debug)]
pub struct BtcInvoker {
    rpc: JsonRpcClient,
    relay: JsonRpcClient,
    relay_wallet: Wallet,
    signer: Secret,
}

impl BtcInvoker {
    /// Construct from the relay and BTC sections of the configuration.
    pub async fn new(config: &CctestConfig) -> Result<Self, ChainError> {
        let timeout = Duration::from_secs(config.general.rpc_timeout_secs);
        Self::with_sections(&config.relay, &config.btc, timeout).await
    }

    async fn with_sections(
        relay: &RelayConfig,
        btc: &BtcConfig,
        timeout: Duration,
    ) -> Result<Self, ChainError> {
        require(ChainKind::Btc, "btc.rpc_address", &btc.rpc_address)?;
        require(ChainKind::Btc, "btc.rpc_user", &btc.rpc_user)?;
        require(ChainKind::Btc, "btc.signer_private_key", btc.signer_private_key.expose())?;
        validate_wif(btc.signer_private_key.expose())?;
        require(ChainKind::Btc, "relay.rpc_address", &relay.rpc_address)?;
        require(ChainKind::Btc, "relay.wallet", &relay.wallet)?;

        let rpc = JsonRpcClient::new(ChainKind::Btc, &btc.rpc_address, timeout)?
            .with_basic_auth(btc.rpc_user.clone(), btc.rpc_password.clone());
        let relay_client = JsonRpcClient::new(ChainKind::Relay, &relay.rpc_address, timeout)?;
        let relay_wallet =
            Wallet::load(ChainKind::Relay, &relay.wallet, &relay.wallet_password).await?;

        let height = parse_quantity(
            ChainKind::Btc,
            "getblockcount",
            &rpc.probe("getblockcount", json!([])).await?,
        )?;

        tracing::info!(
            endpoint = %btc.rpc_address,
            relay = %relay.rpc_address,
            height,
            "btc invoker ready"
        );

        Ok(Self {
            rpc,
            relay: relay_client,
            relay_wallet,
            signer: btc.signer_private_key.clone(),
        })
    }

    /// Call a method on the relay chain on behalf of the BTC side.
    pub async fn call_relay(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        self.relay.call(method, params).await
    }

    /// Relay account that submits BTC headers.
    pub fn relay_account(&self) -> &str {
        self.relay_wallet.address()
    }

    /// Multisig signer key.
    pub fn signer(&self) -> &Secret {
        &self.signer
    }
}

impl ChainInvoker for BtcInvoker {
    fn chain(&self) -> ChainKind {
        ChainKind::Btc
    }

    fn endpoint(&self) -> &str {
        self.rpc.endpoint()
    }

    fn account(&self) -> Option<&str> {
        None
    }

    fn current_height(&self) -> BoxFuture<'_, Result<u64, ChainError>> {
        Box::pin(async move {
            let count = self.rpc.call("getblockcount", json!([])).await?;
            parse_quantity(ChainKind::Btc, "getblockcount", &count)
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

/// Check that `key` looks like a WIF private key.
fn validate_wif(key: &str) -> Result<(), ChainError> {
    let invalid = |reason: String| ChainError::Credential {
        chain: ChainKind::Btc,
        field: "btc.signer_private_key".to_owned(),
        reason,
    };

    if !(51..=52).contains(&key.len()) {
        return Err(invalid(format!("expected 51 or 52 characters, got {}", key.len())));
    }
    if let Some(c) = key.chars().find(|c| !BASE58_ALPHABET.contains(*c)) {
        return Err(invalid(format!("'{c}' is not a base58 character")));
    }
    Ok(())
}
