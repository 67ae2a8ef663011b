//! Execution context: invoker handles and registered test cases.
//!
//! The context is built in two phases:
//!
//! ```text
//! FrameworkBuilder (mutable, startup only) --build()--> Framework (frozen)
//! ```
//!
//! Handle slots and the case registry can only be written through the
//! builder. [`FrameworkBuilder::build`] refuses to freeze a context with an
//! empty slot, so every getter on [`Framework`] is infallible and no test
//! case can observe a slot before it is set. Once frozen the context is
//! shared as `Arc<Framework>` and read without locking.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::case::CaseDescriptor;
use crate::chain::{ChainInvoker, ChainKind};
use crate::config::CctestConfig;
use crate::error::ContextError;
use crate::registry::CaseRegistry;

/// Mutable startup-phase view of the execution context.
pub struct FrameworkBuilder {
    config: Arc<CctestConfig>,
    relay: Option<Arc<dyn ChainInvoker>>,
    btc: Option<Arc<dyn ChainInvoker>>,
    eth: Option<Arc<dyn ChainInvoker>>,
    ont: Option<Arc<dyn ChainInvoker>>,
    cosmos: Option<Arc<dyn ChainInvoker>>,
    registry: CaseRegistry,
    shutdown: CancellationToken,
}

impl FrameworkBuilder {
    /// Start an empty context over a loaded configuration.
    pub fn new(config: Arc<CctestConfig>) -> Self {
        Self {
            config,
            relay: None,
            btc: None,
            eth: None,
            ont: None,
            cosmos: None,
            registry: CaseRegistry::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Use an externally owned shutdown token.
    ///
    /// Cancelling it stops the run loop at the next case boundary and
    /// signals every background listener.
    pub fn shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Store the handle for `chain`.
    ///
    /// Fails if the slot is already set or if the handle reports a
    /// different chain.
    pub fn set_handle(
        &mut self,
        chain: ChainKind,
        handle: Arc<dyn ChainInvoker>,
    ) -> Result<(), ContextError> {
        if handle.chain() != chain {
            return Err(ContextError::WrongChain {
                slot: chain,
                actual: handle.chain(),
            });
        }
        let slot = self.slot_mut(chain);
        if slot.is_some() {
            return Err(ContextError::SlotAlreadySet { chain });
        }
        *slot = Some(handle);
        tracing::debug!(chain = %chain, "invoker handle set");
        Ok(())
    }

    /// Whether the slot for `chain` has been set.
    pub fn is_set(&self, chain: ChainKind) -> bool {
        match chain {
            ChainKind::Relay => self.relay.is_some(),
            ChainKind::Btc => self.btc.is_some(),
            ChainKind::Eth => self.eth.is_some(),
            ChainKind::Ont => self.ont.is_some(),
            ChainKind::Cosmos => self.cosmos.is_some(),
        }
    }

    /// Register a test case.
    pub fn register(&mut self, descriptor: CaseDescriptor) -> Result<(), ContextError> {
        tracing::debug!(case = descriptor.name(), "registering test case");
        self.registry.register(descriptor)
    }

    /// Register every descriptor, stopping at the first duplicate.
    pub fn register_all(
        &mut self,
        descriptors: impl IntoIterator<Item = CaseDescriptor>,
    ) -> Result<(), ContextError> {
        for descriptor in descriptors {
            self.register(descriptor)?;
        }
        Ok(())
    }

    /// Freeze the context.
    ///
    /// Fails with [`ContextError::MissingHandle`] naming the first empty
    /// slot, in [`ChainKind::ALL`] order.
    pub fn build(self) -> Result<Framework, ContextError> {
        let Self {
            config,
            relay,
            btc,
            eth,
            ont,
            cosmos,
            registry,
            shutdown,
        } = self;

        let relay = relay.ok_or(ContextError::MissingHandle {
            chain: ChainKind::Relay,
        })?;
        let btc = btc.ok_or(ContextError::MissingHandle {
            chain: ChainKind::Btc,
        })?;
        let eth = eth.ok_or(ContextError::MissingHandle {
            chain: ChainKind::Eth,
        })?;
        let ont = ont.ok_or(ContextError::MissingHandle {
            chain: ChainKind::Ont,
        })?;
        let cosmos = cosmos.ok_or(ContextError::MissingHandle {
            chain: ChainKind::Cosmos,
        })?;

        tracing::info!(cases = registry.count(), "execution context frozen");

        Ok(Framework {
            config,
            relay,
            btc,
            eth,
            ont,
            cosmos,
            registry,
            shutdown,
            listeners: TaskTracker::new(),
        })
    }

    fn slot_mut(&mut self, chain: ChainKind) -> &mut Option<Arc<dyn ChainInvoker>> {
        match chain {
            ChainKind::Relay => &mut self.relay,
            ChainKind::Btc => &mut self.btc,
            ChainKind::Eth => &mut self.eth,
            ChainKind::Ont => &mut self.ont,
            ChainKind::Cosmos => &mut self.cosmos,
        }
    }
}

/// Frozen execution context shared with every test case.
pub struct Framework {
    config: Arc<CctestConfig>,
    relay: Arc<dyn ChainInvoker>,
    btc: Arc<dyn ChainInvoker>,
    eth: Arc<dyn ChainInvoker>,
    ont: Arc<dyn ChainInvoker>,
    cosmos: Arc<dyn ChainInvoker>,
    registry: CaseRegistry,
    shutdown: CancellationToken,
    listeners: TaskTracker,
}

impl Framework {
    /// The loaded configuration.
    pub fn config(&self) -> &CctestConfig {
        &self.config
    }

    /// Relay chain invoker.
    pub fn relay(&self) -> &dyn ChainInvoker {
        &*self.relay
    }

    /// BTC invoker.
    pub fn btc(&self) -> &dyn ChainInvoker {
        &*self.btc
    }

    /// ETH invoker.
    pub fn eth(&self) -> &dyn ChainInvoker {
        &*self.eth
    }

    /// ONT invoker.
    pub fn ont(&self) -> &dyn ChainInvoker {
        &*self.ont
    }

    /// Cosmos invoker.
    pub fn cosmos(&self) -> &dyn ChainInvoker {
        &*self.cosmos
    }

    /// Invoker for any chain.
    pub fn invoker(&self, chain: ChainKind) -> &dyn ChainInvoker {
        &**self.slot(chain)
    }

    /// Owned handle for `chain`, for work that outlives a case (listeners).
    pub fn handle(&self, chain: ChainKind) -> Arc<dyn ChainInvoker> {
        Arc::clone(self.slot(chain))
    }

    /// Every invoker, relay first.
    pub fn invokers(&self) -> impl Iterator<Item = &dyn ChainInvoker> {
        ChainKind::ALL.into_iter().map(|chain| self.invoker(chain))
    }

    /// Registered test cases.
    pub fn registry(&self) -> &CaseRegistry {
        &self.registry
    }

    /// Token cancelled when shutdown is requested.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Whether shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Spawn a background listener that keeps running after the run loop.
    ///
    /// The future should watch [`shutdown_token`](Self::shutdown_token) and
    /// return once it is cancelled.
    pub fn spawn_listener<F>(&self, name: &str, listener: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(listener = name, "spawning background listener");
        let span = tracing::info_span!("listener", name = %name);
        self.listeners.spawn(listener.instrument(span));
    }

    /// Number of listeners still running.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Cancel the shutdown token and wait up to `grace` for listeners.
    ///
    /// Returns `true` if every listener finished in time.
    pub async fn stop_listeners(&self, grace: Duration) -> bool {
        self.shutdown.cancel();
        self.listeners.close();
        let pending = self.listeners.len();
        if pending == 0 {
            return true;
        }
        tracing::info!(pending, "waiting for background listeners");
        match tokio::time::timeout(grace, self.listeners.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    pending = self.listeners.len(),
                    grace_secs = grace.as_secs(),
                    "background listeners did not stop in time"
                );
                false
            }
        }
    }

    fn slot(&self, chain: ChainKind) -> &Arc<dyn ChainInvoker> {
        match chain {
            ChainKind::Relay => &self.relay,
            ChainKind::Btc => &self.btc,
            ChainKind::Eth => &self.eth,
            ChainKind::Ont => &self.ont,
            ChainKind::Cosmos => &self.cosmos,
        }
    }
}
