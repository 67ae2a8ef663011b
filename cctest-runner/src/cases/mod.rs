//! Built-in test cases.
//!
//! Smoke checks that need nothing but the invokers themselves. Cross-chain
//! transfer cases register alongside these through [`builtin`].

mod chains;
mod relay;

pub use chains::{ChainHeights, EthChainId};
pub use relay::{RelayHeight, RelayProgress, RelayWatch};

use cctest_core::CaseDescriptor;

/// Every built-in case, in registration order.
pub fn builtin() -> Vec<CaseDescriptor> {
    vec![
        CaseDescriptor::new(
            RelayHeight::NAME,
            "relay chain reports a height above genesis",
            RelayHeight,
        ),
        CaseDescriptor::new(
            ChainHeights::NAME,
            "every chain answers a height query",
            ChainHeights,
        ),
        CaseDescriptor::new(
            RelayProgress::NAME,
            "relay chain produces a new block within 60s",
            RelayProgress::default(),
        ),
        CaseDescriptor::new(
            EthChainId::NAME,
            "ethereum node reports the configured chain id",
            EthChainId,
        ),
        CaseDescriptor::new(
            RelayWatch::NAME,
            "log new relay blocks in the background until shutdown",
            RelayWatch::default(),
        ),
    ]
}
