//! cctest chain invokers.
//!
//! Thin JSON-RPC clients for the Poly relay chain and the BTC, ETH, ONT and
//! Cosmos side chains. Each constructor validates its configuration
//! section, loads credentials and probes the node, so a misconfigured chain
//! fails startup rather than the first test case.
//!
//! Transaction building and signing are left to the test cases, which
//! reach the nodes through [`ChainInvoker::call`](cctest_core::ChainInvoker::call).

pub mod btc;
pub mod cosmos;
pub mod eth;
pub mod factory;
pub mod ont;
pub mod relay;
pub mod rpc;
pub mod wallet;

pub use btc::BtcInvoker;
pub use cosmos::CosmosInvoker;
pub use eth::EthInvoker;
pub use factory::RpcInvokerFactory;
pub use ont::OntInvoker;
pub use relay::PolyInvoker;
pub use rpc::{JsonRpcClient, parse_quantity};
pub use wallet::Wallet;
