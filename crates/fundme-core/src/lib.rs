//! Core abstractions for the fundme wallet action dispatcher.
//!
//! This crate provides the fundamental building blocks:
//! - `Address`, `Wei`, `TxHash` - primitive chain types
//! - `units` - decimal ether to base-unit conversion
//! - `Endpoint` - the fixed remote endpoint reference (address + interface)
//! - `WalletProvider` / `PendingTransaction` - injected wallet capability traits
//! - `Surface` - injected display/interaction abstraction

pub mod endpoint;
pub mod provider;
pub mod surface;
pub mod types;
pub mod units;

pub use endpoint::{CallRequest, Endpoint, EndpointError, Interface, Operation};
pub use provider::{PendingTransaction, ProviderError, TxReceipt, WalletProvider};
pub use surface::{ActionKind, MessageKind, Surface};
pub use types::{Address, ParseError, TxHash, Wei};
