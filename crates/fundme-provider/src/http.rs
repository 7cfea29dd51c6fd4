//! `WalletProvider` backed by a JSON-RPC endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fundme_core::{
    Address, CallRequest, PendingTransaction, ProviderError, TxHash, TxReceipt, Wei,
    WalletProvider,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::rpc::RpcClient;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Wallet provider over HTTP JSON-RPC.
///
/// Signing is delegated to the endpoint (`eth_sendTransaction`), so this
/// works against a node or wallet service holding the accounts, the same
/// division of labor a browser-injected provider gives a page.
pub struct HttpProvider {
    rpc: Arc<RpcClient>,
    poll_interval: Duration,
}

impl HttpProvider {
    /// Create a provider for the given endpoint URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            rpc: Arc::new(RpcClient::new(url)),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the receipt poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Wire shape of a transaction request.
#[derive(Debug, Serialize)]
struct TransactionObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<Address>,
    to: Address,
    data: String,
    value: String,
}

impl From<&CallRequest> for TransactionObject {
    fn from(call: &CallRequest) -> Self {
        Self {
            from: call.from,
            to: call.to,
            data: call.data_hex(),
            value: call.value.to_quantity(),
        }
    }
}

/// Wire shape of a transaction receipt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptObject {
    transaction_hash: TxHash,
    block_number: String,
    status: String,
}

impl ReceiptObject {
    fn into_receipt(self) -> Result<TxReceipt, ProviderError> {
        let block_number = Wei::from_quantity(&self.block_number)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?
            .0 as u64;
        let status = match self.status.as_str() {
            "0x1" => true,
            "0x0" => false,
            other => {
                return Err(ProviderError::InvalidResponse(format!(
                    "receipt status {other}"
                )));
            }
        };
        Ok(TxReceipt {
            transaction_hash: self.transaction_hash,
            block_number,
            status,
        })
    }
}

#[async_trait]
impl WalletProvider for HttpProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.rpc.call("eth_requestAccounts", json!([])).await
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.rpc.call("eth_accounts", json!([])).await
    }

    async fn get_balance(&self, address: Address) -> Result<Wei, ProviderError> {
        let quantity: String = self
            .rpc
            .call("eth_getBalance", json!([address, "latest"]))
            .await?;
        Wei::from_quantity(&quantity).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    async fn send_transaction(
        &self,
        call: CallRequest,
    ) -> Result<Box<dyn PendingTransaction>, ProviderError> {
        let tx = TransactionObject::from(&call);
        tracing::debug!(operation = call.operation, to = %call.to, "submitting transaction");
        let hash: TxHash = self.rpc.call("eth_sendTransaction", json!([tx])).await?;
        Ok(Box::new(HttpPendingTx {
            rpc: Arc::clone(&self.rpc),
            hash,
            poll_interval: self.poll_interval,
        }))
    }
}

/// Pending transaction that waits by polling for its receipt.
///
/// No timeout: if the endpoint never mines the transaction the wait
/// suspends indefinitely, the same behavior a browser-injected provider
/// gives its page.
pub struct HttpPendingTx {
    rpc: Arc<RpcClient>,
    hash: TxHash,
    poll_interval: Duration,
}

#[async_trait]
impl PendingTransaction for HttpPendingTx {
    fn hash(&self) -> TxHash {
        self.hash
    }

    async fn confirmed(self: Box<Self>, confirmations: u64) -> Result<TxReceipt, ProviderError> {
        loop {
            let receipt: Option<ReceiptObject> = self
                .rpc
                .call("eth_getTransactionReceipt", json!([self.hash]))
                .await?;

            if let Some(wire) = receipt {
                let receipt = wire.into_receipt()?;
                if !receipt.status {
                    return Err(ProviderError::TransactionFailed(self.hash));
                }
                if confirmations <= 1 {
                    return Ok(receipt);
                }
                let head: String = self.rpc.call("eth_blockNumber", json!([])).await?;
                let head = Wei::from_quantity(&head)
                    .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?
                    .0 as u64;
                if head >= receipt.block_number + confirmations - 1 {
                    return Ok(receipt);
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
