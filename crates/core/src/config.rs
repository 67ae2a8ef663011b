//! Configuration loading, environment overrides and validation.
//!
//! [`CctestConfig`] is the top-level structure holding the settings of every
//! chain the harness talks to. It is loaded once at startup and then shared
//! read-only (`Arc<CctestConfig>`) for the life of the process.
//!
//! # Load order
//! 1. CLI flags (applied by the runner, highest priority)
//! 2. Environment variables (`CCTEST_ETH_RPC_ADDRESS=...`)
//! 3. Configuration file (`config.json`, or TOML when the path ends in `.toml`)
//! 4. Defaults (`Default` implementations)
//!
//! Only the `general` and `metrics` sections are validated here. Per-chain
//! required fields are checked by the invoker constructors, so a missing
//! endpoint fails startup at construction time.
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), cctest_core::error::CctestError> {
//! use cctest_core::config::CctestConfig;
//!
//! let config = CctestConfig::load("config.json").await?;
//! let config = CctestConfig::parse_toml("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CctestError, ConfigError};

/// Accepted `general.log_level` values.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Accepted `general.log_format` values.
const LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// Harness configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CctestConfig {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Poly relay chain
    #[serde(default)]
    pub relay: RelayConfig,
    /// Bitcoin node
    #[serde(default)]
    pub btc: BtcConfig,
    /// Ethereum node
    #[serde(default)]
    pub eth: EthConfig,
    /// Ontology node
    #[serde(default)]
    pub ont: OntConfig,
    /// Cosmos node
    #[serde(default)]
    pub cosmos: CosmosConfig,
    /// Prometheus exporter
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl CctestConfig {
    /// Load the file at `path`, apply environment overrides and validate.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CctestError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load the file at `path` without environment overrides.
    ///
    /// Files ending in `.toml` are parsed as TOML, everything else as JSON.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, CctestError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CctestError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                CctestError::Io(e)
            }
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::parse_toml(&content)
        } else {
            Self::parse_json(&content)
        }
    }

    /// Parse a JSON document.
    pub fn parse_json(json_str: &str) -> Result<Self, CctestError> {
        serde_json::from_str(json_str).map_err(|e| {
            CctestError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// Parse a TOML document.
    pub fn parse_toml(toml_str: &str) -> Result<Self, CctestError> {
        toml::from_str(toml_str).map_err(|e| {
            CctestError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// Override values from the environment.
    ///
    /// Variable naming: `CCTEST_{SECTION}_{FIELD}`, e.g. `CCTEST_ONT_WALLET`.
    /// Unparseable numeric or boolean values are logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "CCTEST_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "CCTEST_GENERAL_LOG_FORMAT");
        override_u64(
            &mut self.general.rpc_timeout_secs,
            "CCTEST_GENERAL_RPC_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.general.shutdown_grace_secs,
            "CCTEST_GENERAL_SHUTDOWN_GRACE_SECS",
        );

        // Relay
        override_string(&mut self.relay.rpc_address, "CCTEST_RELAY_RPC_ADDRESS");
        override_string(&mut self.relay.wallet, "CCTEST_RELAY_WALLET");
        override_secret(
            &mut self.relay.wallet_password,
            "CCTEST_RELAY_WALLET_PASSWORD",
        );

        // BTC
        override_string(&mut self.btc.rpc_address, "CCTEST_BTC_RPC_ADDRESS");
        override_string(&mut self.btc.rpc_user, "CCTEST_BTC_RPC_USER");
        override_secret(&mut self.btc.rpc_password, "CCTEST_BTC_RPC_PASSWORD");
        override_secret(
            &mut self.btc.signer_private_key,
            "CCTEST_BTC_SIGNER_PRIVATE_KEY",
        );

        // ETH
        override_string(&mut self.eth.rpc_address, "CCTEST_ETH_RPC_ADDRESS");
        override_secret(&mut self.eth.private_key, "CCTEST_ETH_PRIVATE_KEY");
        override_u64(&mut self.eth.chain_id, "CCTEST_ETH_CHAIN_ID");

        // ONT
        override_string(&mut self.ont.rpc_address, "CCTEST_ONT_RPC_ADDRESS");
        override_string(&mut self.ont.wallet, "CCTEST_ONT_WALLET");
        override_secret(&mut self.ont.wallet_password, "CCTEST_ONT_WALLET_PASSWORD");
        override_string(
            &mut self.ont.contracts_avm_path,
            "CCTEST_ONT_CONTRACTS_AVM_PATH",
        );

        // Cosmos
        override_string(&mut self.cosmos.rpc_address, "CCTEST_COSMOS_RPC_ADDRESS");
        override_string(&mut self.cosmos.wallet, "CCTEST_COSMOS_WALLET");
        override_secret(
            &mut self.cosmos.wallet_password,
            "CCTEST_COSMOS_WALLET_PASSWORD",
        );
        override_string(&mut self.cosmos.chain_id, "CCTEST_COSMOS_CHAIN_ID");

        // Metrics
        override_bool(&mut self.metrics.enabled, "CCTEST_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "CCTEST_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "CCTEST_METRICS_PORT");
    }

    /// Validate harness-wide settings.
    pub fn validate(&self) -> Result<(), CctestError> {
        if !LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", LOG_LEVELS.join(", ")),
            }
            .into());
        }

        if !LOG_FORMATS.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", LOG_FORMATS.join(", ")),
            }
            .into());
        }

        if self.general.rpc_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.rpc_timeout_secs".to_owned(),
                reason: "must be greater than zero".to_owned(),
            }
            .into());
        }

        if self.metrics.enabled {
            if self.metrics.listen_addr.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "metrics.listen_addr".to_owned(),
                    reason: "must not be empty when metrics are enabled".to_owned(),
                }
                .into());
            }
            if self.metrics.port == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "metrics.port".to_owned(),
                    reason: "must be greater than zero when metrics are enabled".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }
}

// ─── Secret ──────────────────────────────────────────────────────────

/// A configuration string that must never be logged.
///
/// `Debug` prints `"***"` (or `""` when empty); the value is only reachable
/// through [`Secret::expose`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The wrapped value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret is unset.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("\"\"")
        } else {
            f.write_str("\"***\"")
        }
    }
}

// ─── Sections ────────────────────────────────────────────────────────

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log format (json, pretty)
    pub log_format: String,
    /// Per-request timeout for every chain RPC call
    pub rpc_timeout_secs: u64,
    /// How long background listeners get to finish after shutdown
    pub shutdown_grace_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            rpc_timeout_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// Poly relay chain settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// JSON-RPC endpoint
    pub rpc_address: String,
    /// Path to the relay wallet file
    pub wallet: String,
    /// Relay wallet password
    pub wallet_password: Secret,
}

/// Bitcoin node settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BtcConfig {
    /// bitcoind JSON-RPC endpoint
    pub rpc_address: String,
    /// RPC basic-auth user
    pub rpc_user: String,
    /// RPC basic-auth password
    pub rpc_password: Secret,
    /// WIF-encoded key of the multisig signer
    pub signer_private_key: Secret,
}

/// Ethereum node settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EthConfig {
    /// JSON-RPC endpoint
    pub rpc_address: String,
    /// Hex-encoded 32-byte signing key
    pub private_key: Secret,
    /// Expected `eth_chainId`; 0 skips the check
    pub chain_id: u64,
}

/// Ontology node settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OntConfig {
    /// JSON-RPC endpoint
    pub rpc_address: String,
    /// Path to the wallet file
    pub wallet: String,
    /// Wallet password
    pub wallet_password: Secret,
    /// Directory holding the compiled `.avm` contracts
    pub contracts_avm_path: String,
}

/// Cosmos node settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CosmosConfig {
    /// Tendermint RPC endpoint
    pub rpc_address: String,
    /// Path to the armored key file
    pub wallet: String,
    /// Key file password
    pub wallet_password: Secret,
    /// Expected network id
    pub chain_id: String,
}

/// Prometheus exporter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether to expose metrics
    pub enabled: bool,
    /// Listen address
    pub listen_addr: String,
    /// Listen port
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9108,
        }
    }
}

// --- environment override helpers ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_secret(target: &mut Secret, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = Secret(val);
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
