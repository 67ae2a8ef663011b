//! [`InvokerFactory`] over the JSON-RPC invokers.

use std::sync::Arc;

use cctest_core::{CctestConfig, ChainError, ChainInvoker, ChainKind, InvokerFactory};

use crate::btc::BtcInvoker;
use crate::cosmos::CosmosInvoker;
use crate::eth::EthInvoker;
use crate::ont::OntInvoker;
use crate::relay::PolyInvoker;

/// Builds live invokers from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpcInvokerFactory;

impl RpcInvokerFactory {
    /// Create the factory.
    pub fn new() -> Self {
        Self
    }
}

impl InvokerFactory for RpcInvokerFactory {
    async fn bootstrap_relay(
        &self,
        config: &CctestConfig,
    ) -> Result<Arc<dyn ChainInvoker>, ChainError> {
        Ok(Arc::new(PolyInvoker::bootstrap(config).await?))
    }

    async fn construct(
        &self,
        chain: ChainKind,
        config: &CctestConfig,
    ) -> Result<Arc<dyn ChainInvoker>, ChainError> {
        let invoker: Arc<dyn ChainInvoker> = match chain {
            ChainKind::Relay => Arc::new(PolyInvoker::bootstrap(config).await?),
            ChainKind::Btc => Arc::new(BtcInvoker::new(config).await?),
            ChainKind::Eth => Arc::new(EthInvoker::new(config).await?),
            ChainKind::Ont => Arc::new(OntInvoker::new(config).await?),
            ChainKind::Cosmos => Arc::new(CosmosInvoker::new(config).await?),
        };
        Ok(invoker)
    }
}
