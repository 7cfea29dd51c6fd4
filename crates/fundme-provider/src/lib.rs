//! JSON-RPC wallet provider implementation.
//!
//! Provides:
//! - `RpcClient` - JSON-RPC 2.0 over HTTP
//! - `HttpProvider` - `WalletProvider` backed by an RPC endpoint
//! - `HttpPendingTx` - confirmation waiting by receipt polling

pub mod http;
pub mod rpc;

pub use http::HttpProvider;
pub use rpc::RpcClient;
