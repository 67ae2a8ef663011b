//! Ontology invoker.
//!
//! Besides the node connection, the invoker indexes the compiled contracts
//! (`*.avm`) that test cases deploy, keyed by file stem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cctest_core::{BoxFuture, CctestConfig, ChainError, ChainInvoker, ChainKind};
use serde_json::{Value, json};

use crate::relay::block_count_to_height;
use crate::rpc::{JsonRpcClient, require};
use crate::wallet::Wallet;

/// Invoker for an Ontology node.
#[derive(Debug)]
pub struct OntInvoker {
    rpc: JsonRpcClient,
    wallet: Wallet,
    contracts_dir: PathBuf,
    contracts: BTreeMap<String, PathBuf>,
}

impl OntInvoker {
    /// Construct from the ONT section of the configuration.
    pub async fn new(config: &CctestConfig) -> Result<Self, ChainError> {
        let ont = &config.ont;
        require(ChainKind::Ont, "ont.rpc_address", &ont.rpc_address)?;
        require(ChainKind::Ont, "ont.wallet", &ont.wallet)?;
        require(ChainKind::Ont, "ont.contracts_avm_path", &ont.contracts_avm_path)?;

        let rpc = JsonRpcClient::new(
            ChainKind::Ont,
            &ont.rpc_address,
            Duration::from_secs(config.general.rpc_timeout_secs),
        )?;
        let wallet = Wallet::load(ChainKind::Ont, &ont.wallet, &ont.wallet_password).await?;
        let contracts = index_contracts(Path::new(&ont.contracts_avm_path)).await?;
        if contracts.is_empty() {
            tracing::warn!(
                path = %ont.contracts_avm_path,
                "no .avm contracts found"
            );
        }

        let count = rpc.probe("getblockcount", json!([])).await?;
        let height = block_count_to_height(ChainKind::Ont, &count)?;

        tracing::info!(
            endpoint = %ont.rpc_address,
            account = %wallet.address(),
            contracts = contracts.len(),
            height,
            "ont invoker ready"
        );

        Ok(Self {
            rpc,
            wallet,
            contracts_dir: PathBuf::from(&ont.contracts_avm_path),
            contracts,
        })
    }

    /// Directory the contracts were indexed from.
    pub fn contracts_dir(&self) -> &Path {
        &self.contracts_dir
    }

    /// Contract names, sorted.
    pub fn contract_names(&self) -> impl Iterator<Item = &str> {
        self.contracts.keys().map(String::as_str)
    }

    /// Path of the `.avm` file for `name`.
    pub fn contract_path(&self, name: &str) -> Option<&Path> {
        self.contracts.get(name).map(PathBuf::as_path)
    }

    /// Read the compiled contract `name` as the hex string the node expects.
    pub async fn contract_code(&self, name: &str) -> Result<String, ChainError> {
        let path = self.contract_path(name).ok_or_else(|| ChainError::Contract {
            chain: ChainKind::Ont,
            path: self.contracts_dir.join(format!("{name}.avm")).display().to_string(),
            reason: "contract not indexed".to_owned(),
        })?;
        let code = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ChainError::Contract {
                chain: ChainKind::Ont,
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(code.trim().to_owned())
    }

    /// Signing wallet.
    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }
}

impl ChainInvoker for OntInvoker {
    fn chain(&self) -> ChainKind {
        ChainKind::Ont
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
            block_count_to_height(ChainKind::Ont, &count)
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

/// Map every `*.avm` file in `dir` by stem.
pub async fn index_contracts(dir: &Path) -> Result<BTreeMap<String, PathBuf>, ChainError> {
    let dir_err = |reason: String| ChainError::Contract {
        chain: ChainKind::Ont,
        path: dir.display().to_string(),
        reason,
    };

    let metadata = tokio::fs::metadata(dir)
        .await
        .map_err(|e| dir_err(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(dir_err("contracts_avm_path is not a directory".to_owned()));
    }

    let mut contracts = BTreeMap::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| dir_err(e.to_string()))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| dir_err(e.to_string()))?
    {
        let path = entry.path();
        let is_avm = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("avm"));
        if !is_avm {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            contracts.insert(stem.to_owned(), path.clone());
        }
    }

    Ok(contracts)
}
