//! Wallet provider capability traits.
//!
//! The provider is an external collaborator: it brokers account access,
//! transaction signing/submission, and balance queries. The dispatcher only
//! sees these traits, so real providers and test doubles are
//! interchangeable.

use async_trait::async_trait;
use thiserror::Error;

use crate::endpoint::CallRequest;
use crate::types::{Address, TxHash, Wei};

/// Provider error.
///
/// The dispatcher collapses all of these into one generic user-facing
/// message per action; the variants exist for logs and for callers that
/// want the distinction.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Provider rejected request ({code}): {message}")]
    Rpc { code: i64, message: String },
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
    #[error("Transaction {0} reverted")]
    TransactionFailed(TxHash),
}

/// Receipt for a confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    /// Whether execution succeeded.
    pub status: bool,
}

/// An awaitable handle for a submitted transaction.
#[async_trait]
pub trait PendingTransaction: Send {
    /// Hash of the submitted transaction.
    fn hash(&self) -> TxHash;

    /// Resolve once the transaction has the requested number of
    /// confirmations.
    ///
    /// # Errors
    /// Returns error if the transaction reverted or the provider failed
    /// while waiting.
    async fn confirmed(self: Box<Self>, confirmations: u64) -> Result<TxReceipt, ProviderError>;
}

/// The injected wallet capability.
///
/// Mirrors what a browser-injected wallet object exposes: an
/// account-access request, a passive account listing, a read-only balance
/// query, and contract-call submission yielding an awaitable handle.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Request account access. May prompt the user and may be rejected.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// List accounts already exposed to this client. Never prompts.
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Query an address's balance. Read-only; needs no account access.
    async fn get_balance(&self, address: Address) -> Result<Wei, ProviderError>;

    /// Submit a contract call for signing and broadcast.
    async fn send_transaction(
        &self,
        call: CallRequest,
    ) -> Result<Box<dyn PendingTransaction>, ProviderError>;
}
