//! Wallet action dispatcher.
//!
//! Provides:
//! - `Dispatcher` - the four user-triggered actions (connect, fund,
//!   withdraw, get balance) over injected provider and surface capabilities
//! - `contract` - the fixed FundMe endpoint constants

pub mod contract;
pub mod dispatcher;

pub use dispatcher::Dispatcher;
