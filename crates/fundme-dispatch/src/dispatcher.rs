//! The wallet action dispatcher.
//!
//! Each action runs guard → attempt → report: check the provider is
//! present, perform the remote interaction, surface one outcome message.
//! Failures are caught and reported generically; nothing is retried and
//! nothing is fatal. One invocation per action kind may be pending at a
//! time; overlapping invocations of the same kind are refused locally.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fundme_core::{
    ActionKind, Endpoint, EndpointError, MessageKind, ProviderError, Surface, TxReceipt,
    WalletProvider, Wei, units,
};
use thiserror::Error;

use crate::contract::{OP_FUND, OP_WITHDRAW};

/// Confirmations awaited before a transaction is reported successful.
const CONFIRMATIONS: u64 = 1;

/// Delay before the follow-up balance refresh after a withdraw.
const REFRESH_DELAY: Duration = Duration::from_millis(1000);

pub const MSG_INSTALL_PROMPT: &str = "No wallet provider detected. Install a wallet to continue.";
pub const LABEL_INSTALL_PROMPT: &str = "Install a wallet";
pub const LABEL_CONNECTED: &str = "Connected";
pub const MSG_CONNECTED: &str = "Wallet connected";
pub const MSG_CONNECT_FAILED: &str = "Failed to connect wallet";
pub const MSG_AWAITING_APPROVAL: &str = "Confirm the transaction in your wallet";
pub const MSG_AWAITING_CONFIRMATION: &str = "Transaction submitted, waiting for confirmation";
pub const MSG_WITHDRAW_OK: &str = "Withdraw successful";
pub const MSG_WITHDRAW_FAILED: &str = "Withdraw failed. Make sure you are the owner.";
pub const MSG_FUND_FAILED: &str = "Transaction failed";
pub const MSG_INVALID_AMOUNT: &str = "Please enter a valid ETH amount";
pub const MSG_BALANCE_UPDATED: &str = "Balance updated";
pub const MSG_BALANCE_FAILED: &str = "Failed to get balance";

/// Internal attempt error; every variant surfaces as the action's one
/// generic message.
#[derive(Debug, Error)]
enum ActionError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

/// Dispatches the four user-triggered wallet actions.
pub struct Dispatcher<P, S> {
    provider: Option<Arc<P>>,
    surface: Arc<S>,
    endpoint: Endpoint,
    in_flight: Mutex<HashSet<ActionKind>>,
}

impl<P, S> Dispatcher<P, S>
where
    P: WalletProvider + 'static,
    S: Surface + 'static,
{
    /// Create a dispatcher.
    ///
    /// `provider` is the detection result: `None` means no wallet provider
    /// is injected and every action will surface the install prompt.
    #[must_use]
    pub fn new(provider: Option<P>, surface: S, endpoint: Endpoint) -> Self {
        Self {
            provider: provider.map(Arc::new),
            surface: Arc::new(surface),
            endpoint,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// The endpoint this dispatcher targets.
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Request account access and report the connected state.
    pub async fn connect(&self) {
        let Some(_slot) = self.begin(ActionKind::Connect) else {
            return;
        };
        let Some(provider) = self.guard_provider(ActionKind::Connect) else {
            return;
        };

        match self.try_connect(&provider).await {
            Ok(accounts) => {
                let accounts: Vec<String> = accounts.iter().map(ToString::to_string).collect();
                tracing::info!(?accounts, "wallet connected");
                self.surface.action_label(ActionKind::Connect, LABEL_CONNECTED);
                self.surface.connection_changed(true);
                self.surface.message(MessageKind::Success, MSG_CONNECTED);
            }
            Err(e) => {
                tracing::warn!(error = %e, "connect failed");
                self.surface.message(MessageKind::Error, MSG_CONNECT_FAILED);
            }
        }
    }

    /// Invoke the endpoint's withdraw operation and await one
    /// confirmation, then schedule a single balance refresh.
    pub async fn withdraw(&self) {
        let Some(_slot) = self.begin(ActionKind::Withdraw) else {
            return;
        };
        let Some(provider) = self.guard_provider(ActionKind::Withdraw) else {
            return;
        };
        tracing::info!("withdrawing");

        match self.try_transact(&provider, OP_WITHDRAW, Wei::ZERO).await {
            Ok(receipt) => {
                tracing::info!(tx = %receipt.transaction_hash, "withdraw confirmed");
                self.surface.message(MessageKind::Success, MSG_WITHDRAW_OK);
                self.schedule_refresh(Arc::clone(&provider));
            }
            Err(e) => {
                tracing::warn!(error = %e, "withdraw failed");
                self.surface.message(MessageKind::Error, MSG_WITHDRAW_FAILED);
            }
        }
    }

    /// Convert the raw amount text to base units and invoke the funding
    /// operation with the value attached.
    ///
    /// Empty, unparsable, or non-positive amounts are rejected locally
    /// with no provider interaction of any kind.
    pub async fn fund(&self, amount: &str) {
        let value = match units::parse_ether(amount) {
            Ok(value) if !value.is_zero() => value,
            Ok(_) | Err(_) => {
                tracing::debug!(amount, "rejecting fund amount");
                self.surface.message(MessageKind::Error, MSG_INVALID_AMOUNT);
                return;
            }
        };

        let Some(_slot) = self.begin(ActionKind::Fund) else {
            return;
        };
        let Some(provider) = self.guard_provider(ActionKind::Fund) else {
            return;
        };
        let formatted = units::format_ether(value);
        tracing::info!(amount = %formatted, "funding");

        match self.try_transact(&provider, OP_FUND, value).await {
            Ok(receipt) => {
                tracing::info!(tx = %receipt.transaction_hash, "fund confirmed");
                self.surface.clear_amount();
                self.surface.message(
                    MessageKind::Success,
                    &format!("Successfully funded {formatted} ETH"),
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "fund failed");
                self.surface.message(MessageKind::Error, MSG_FUND_FAILED);
            }
        }
    }

    /// Query the endpoint's balance over the read-only path and display
    /// it. Never requests account access.
    pub async fn get_balance(&self) {
        let Some(_slot) = self.begin(ActionKind::Balance) else {
            return;
        };
        let Some(provider) = self.guard_provider(ActionKind::Balance) else {
            return;
        };

        refresh_balance(provider.as_ref(), self.surface.as_ref(), self.endpoint).await;
    }

    /// Claim the action's in-flight slot, refusing overlap.
    fn begin(&self, action: ActionKind) -> Option<InFlightSlot<'_>> {
        let mut slots = self.in_flight.lock().unwrap();
        if !slots.insert(action) {
            drop(slots);
            tracing::debug!(action = action.label(), "action already in flight");
            self.surface.message(
                MessageKind::Info,
                &format!("{} is already in progress", action.label()),
            );
            return None;
        }
        Some(InFlightSlot {
            slots: &self.in_flight,
            action,
        })
    }

    /// The guard every action shares: no provider means an install prompt
    /// on the triggering element plus an error message.
    fn guard_provider(&self, action: ActionKind) -> Option<Arc<P>> {
        match &self.provider {
            Some(provider) => Some(Arc::clone(provider)),
            None => {
                tracing::warn!(action = action.label(), "no wallet provider detected");
                self.surface.action_label(action, LABEL_INSTALL_PROMPT);
                self.surface.message(MessageKind::Error, MSG_INSTALL_PROMPT);
                None
            }
        }
    }

    async fn try_connect(
        &self,
        provider: &Arc<P>,
    ) -> Result<Vec<fundme_core::Address>, ActionError> {
        provider.request_accounts().await?;
        Ok(provider.accounts().await?)
    }

    /// Shared signer-bound transact path for withdraw and fund.
    async fn try_transact(
        &self,
        provider: &Arc<P>,
        operation: &str,
        value: Wei,
    ) -> Result<TxReceipt, ActionError> {
        let accounts = provider.request_accounts().await?;
        let mut call = self.endpoint.invoke_with_value(operation, value)?;
        if let Some(from) = accounts.first() {
            call = call.from_account(*from);
        }

        self.surface.message(MessageKind::Info, MSG_AWAITING_APPROVAL);
        let pending = provider.send_transaction(call).await?;
        self.surface
            .message(MessageKind::Info, MSG_AWAITING_CONFIRMATION);
        Ok(pending.confirmed(CONFIRMATIONS).await?)
    }

    /// Queue exactly one balance refresh after the fixed delay.
    ///
    /// Queries directly rather than re-entering the guarded balance
    /// action, so the refresh can neither starve a user-triggered query
    /// nor be lost to a busy slot.
    fn schedule_refresh(&self, provider: Arc<P>) {
        let surface = Arc::clone(&self.surface);
        let endpoint = self.endpoint;
        tokio::spawn(async move {
            tokio::time::sleep(REFRESH_DELAY).await;
            refresh_balance(provider.as_ref(), surface.as_ref(), endpoint).await;
        });
    }
}

/// Releases the action's in-flight slot when the action resolves.
struct InFlightSlot<'a> {
    slots: &'a Mutex<HashSet<ActionKind>>,
    action: ActionKind,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.remove(&self.action);
        }
    }
}

/// Query the endpoint balance and push the formatted result to the
/// surface.
async fn refresh_balance<P, S>(provider: &P, surface: &S, endpoint: Endpoint)
where
    P: WalletProvider + ?Sized,
    S: Surface + ?Sized,
{
    match provider.get_balance(endpoint.address).await {
        Ok(balance) => {
            let formatted = units::format_ether(balance);
            tracing::info!(balance = %formatted, "balance updated");
            surface.balance_updated(&formatted);
            surface.message(MessageKind::Success, MSG_BALANCE_UPDATED);
        }
        Err(e) => {
            tracing::warn!(error = %e, "balance query failed");
            surface.message(MessageKind::Error, MSG_BALANCE_FAILED);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use fundme_core::{Address, CallRequest, PendingTransaction, TxHash};

    use super::*;
    use crate::contract;

    const TEST_ACCOUNT: Address = Address::new([0xab; 20]);

    #[derive(Default)]
    struct Counters {
        request_accounts: AtomicUsize,
        accounts: AtomicUsize,
        balance: AtomicUsize,
        send: AtomicUsize,
    }

    #[derive(Clone, Copy, Default)]
    struct Behavior {
        reject_access: bool,
        fail_confirm: bool,
        hang_confirm: bool,
    }

    struct MockProvider {
        counters: Arc<Counters>,
        behavior: Behavior,
        balance: Wei,
    }

    impl MockProvider {
        fn new(behavior: Behavior) -> (Self, Arc<Counters>) {
            let counters = Arc::new(Counters::default());
            (
                Self {
                    counters: Arc::clone(&counters),
                    behavior,
                    balance: Wei(1_500_000_000_000_000_000),
                },
                counters,
            )
        }
    }

    fn rejected() -> ProviderError {
        ProviderError::Rpc {
            code: 4001,
            message: "User rejected the request.".to_string(),
        }
    }

    #[async_trait]
    impl WalletProvider for MockProvider {
        async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
            self.counters.request_accounts.fetch_add(1, Ordering::SeqCst);
            if self.behavior.reject_access {
                return Err(rejected());
            }
            Ok(vec![TEST_ACCOUNT])
        }

        async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
            self.counters.accounts.fetch_add(1, Ordering::SeqCst);
            Ok(vec![TEST_ACCOUNT])
        }

        async fn get_balance(&self, _address: Address) -> Result<Wei, ProviderError> {
            self.counters.balance.fetch_add(1, Ordering::SeqCst);
            Ok(self.balance)
        }

        async fn send_transaction(
            &self,
            call: CallRequest,
        ) -> Result<Box<dyn PendingTransaction>, ProviderError> {
            self.counters.send.fetch_add(1, Ordering::SeqCst);
            assert_eq!(call.from, Some(TEST_ACCOUNT));
            Ok(Box::new(MockPending {
                behavior: self.behavior,
            }))
        }
    }

    struct MockPending {
        behavior: Behavior,
    }

    #[async_trait]
    impl PendingTransaction for MockPending {
        fn hash(&self) -> TxHash {
            TxHash::new([0xcd; 32])
        }

        async fn confirmed(
            self: Box<Self>,
            confirmations: u64,
        ) -> Result<TxReceipt, ProviderError> {
            assert_eq!(confirmations, 1);
            if self.behavior.hang_confirm {
                std::future::pending::<()>().await;
            }
            if self.behavior.fail_confirm {
                return Err(rejected());
            }
            Ok(TxReceipt {
                transaction_hash: self.hash(),
                block_number: 1,
                status: true,
            })
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Message(MessageKind, String),
        Connection(bool),
        Balance(String),
        Label(ActionKind, String),
        ClearAmount,
    }

    #[derive(Clone, Default)]
    struct MockSurface {
        events: Arc<Mutex<Vec<Event>>>,
    }

    impl MockSurface {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        fn messages(&self) -> Vec<(MessageKind, String)> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::Message(kind, text) => Some((kind, text)),
                    _ => None,
                })
                .collect()
        }

        fn last_message(&self) -> (MessageKind, String) {
            self.messages().pop().expect("no message surfaced")
        }

        fn push(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl Surface for MockSurface {
        fn message(&self, kind: MessageKind, text: &str) {
            self.push(Event::Message(kind, text.to_string()));
        }

        fn connection_changed(&self, connected: bool) {
            self.push(Event::Connection(connected));
        }

        fn balance_updated(&self, formatted: &str) {
            self.push(Event::Balance(formatted.to_string()));
        }

        fn action_label(&self, action: ActionKind, label: &str) {
            self.push(Event::Label(action, label.to_string()));
        }

        fn clear_amount(&self) {
            self.push(Event::ClearAmount);
        }
    }

    fn dispatcher(
        behavior: Behavior,
    ) -> (Dispatcher<MockProvider, MockSurface>, Arc<Counters>, MockSurface) {
        let (provider, counters) = MockProvider::new(behavior);
        let surface = MockSurface::default();
        let dispatcher = Dispatcher::new(Some(provider), surface.clone(), contract::endpoint());
        (dispatcher, counters, surface)
    }

    fn absent_dispatcher() -> (Dispatcher<MockProvider, MockSurface>, MockSurface) {
        let surface = MockSurface::default();
        let dispatcher =
            Dispatcher::<MockProvider, _>::new(None, surface.clone(), contract::endpoint());
        (dispatcher, surface)
    }

    #[tokio::test]
    async fn fund_rejects_invalid_amounts_locally() {
        let (dispatcher, counters, surface) = dispatcher(Behavior::default());

        for bad in ["", "0", "0.0", "abc", "-1"] {
            dispatcher.fund(bad).await;
            assert_eq!(
                surface.last_message(),
                (MessageKind::Error, MSG_INVALID_AMOUNT.to_string()),
                "amount {bad:?}"
            );
        }

        assert_eq!(counters.request_accounts.load(Ordering::SeqCst), 0);
        assert_eq!(counters.send.load(Ordering::SeqCst), 0);
        assert_eq!(counters.balance.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn absent_provider_surfaces_install_prompt() {
        let (dispatcher, surface) = absent_dispatcher();

        dispatcher.connect().await;
        dispatcher.withdraw().await;
        dispatcher.fund("1").await;
        dispatcher.get_balance().await;

        let messages = surface.messages();
        assert_eq!(messages.len(), 4);
        for (kind, text) in messages {
            assert_eq!(kind, MessageKind::Error);
            assert_eq!(text, MSG_INSTALL_PROMPT);
        }

        let labels: Vec<Event> = surface
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Label(..)))
            .collect();
        assert_eq!(
            labels,
            vec![
                Event::Label(ActionKind::Connect, LABEL_INSTALL_PROMPT.to_string()),
                Event::Label(ActionKind::Withdraw, LABEL_INSTALL_PROMPT.to_string()),
                Event::Label(ActionKind::Fund, LABEL_INSTALL_PROMPT.to_string()),
                Event::Label(ActionKind::Balance, LABEL_INSTALL_PROMPT.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn connect_reports_connected_state() {
        let (dispatcher, counters, surface) = dispatcher(Behavior::default());

        dispatcher.connect().await;

        assert_eq!(counters.request_accounts.load(Ordering::SeqCst), 1);
        assert_eq!(counters.accounts.load(Ordering::SeqCst), 1);
        let events = surface.events();
        assert!(events.contains(&Event::Label(ActionKind::Connect, LABEL_CONNECTED.to_string())));
        assert!(events.contains(&Event::Connection(true)));
        assert_eq!(
            surface.last_message(),
            (MessageKind::Success, MSG_CONNECTED.to_string())
        );
    }

    #[tokio::test]
    async fn connect_rejection_is_generic() {
        let (dispatcher, _counters, surface) = dispatcher(Behavior {
            reject_access: true,
            ..Behavior::default()
        });

        dispatcher.connect().await;

        assert_eq!(
            surface.last_message(),
            (MessageKind::Error, MSG_CONNECT_FAILED.to_string())
        );
        assert!(!surface.events().contains(&Event::Connection(true)));
    }

    #[tokio::test(start_paused = true)]
    async fn withdraw_schedules_exactly_one_refresh() {
        let (dispatcher, counters, surface) = dispatcher(Behavior::default());

        dispatcher.withdraw().await;
        assert_eq!(
            surface.last_message(),
            (MessageKind::Success, MSG_WITHDRAW_OK.to_string())
        );
        assert_eq!(counters.balance.load(Ordering::SeqCst), 0);

        // Not yet due.
        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(counters.balance.load(Ordering::SeqCst), 0);

        // Due; runs once and only once.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(counters.balance.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counters.balance.load(Ordering::SeqCst), 1);

        assert!(surface.events().contains(&Event::Balance("1.5".to_string())));
    }

    #[tokio::test]
    async fn fund_success_clears_the_input() {
        let (dispatcher, counters, surface) = dispatcher(Behavior::default());

        dispatcher.fund("1.5").await;

        assert_eq!(counters.send.load(Ordering::SeqCst), 1);
        assert!(surface.events().contains(&Event::ClearAmount));
        let (kind, text) = surface.last_message();
        assert_eq!(kind, MessageKind::Success);
        assert_eq!(text, "Successfully funded 1.5 ETH");
    }

    #[tokio::test]
    async fn balance_is_read_only() {
        let (dispatcher, counters, surface) = dispatcher(Behavior::default());

        dispatcher.get_balance().await;

        assert_eq!(counters.request_accounts.load(Ordering::SeqCst), 0);
        assert_eq!(counters.balance.load(Ordering::SeqCst), 1);
        assert!(surface.events().contains(&Event::Balance("1.5".to_string())));
        assert_eq!(
            surface.last_message(),
            (MessageKind::Success, MSG_BALANCE_UPDATED.to_string())
        );
    }

    #[tokio::test]
    async fn signing_actions_request_account_access() {
        let (dispatcher, counters, _surface) = dispatcher(Behavior::default());

        dispatcher.connect().await;
        assert_eq!(counters.request_accounts.load(Ordering::SeqCst), 1);
        dispatcher.withdraw().await;
        assert_eq!(counters.request_accounts.load(Ordering::SeqCst), 2);
        dispatcher.fund("0.1").await;
        assert_eq!(counters.request_accounts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_confirmation_reports_generic_failure() {
        let (dispatcher, counters, surface) = dispatcher(Behavior {
            fail_confirm: true,
            ..Behavior::default()
        });

        dispatcher.withdraw().await;
        assert_eq!(
            surface.last_message(),
            (MessageKind::Error, MSG_WITHDRAW_FAILED.to_string())
        );

        dispatcher.fund("2").await;
        let (kind, text) = surface.last_message();
        assert_eq!(kind, MessageKind::Error);
        assert_eq!(text, MSG_FUND_FAILED);
        assert_ne!(text, MSG_INVALID_AMOUNT);

        // Failed withdraw schedules no refresh.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counters.balance.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_invocations_are_refused() {
        let (dispatcher, counters, surface) = dispatcher(Behavior {
            hang_confirm: true,
            ..Behavior::default()
        });
        let dispatcher = Arc::new(dispatcher);

        let hung = Arc::clone(&dispatcher);
        let task = tokio::spawn(async move { hung.withdraw().await });

        // Let the first invocation reach its confirmation wait.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counters.request_accounts.load(Ordering::SeqCst), 1);

        dispatcher.withdraw().await;
        assert_eq!(counters.request_accounts.load(Ordering::SeqCst), 1);
        let (kind, text) = surface.last_message();
        assert_eq!(kind, MessageKind::Info);
        assert_eq!(text, "Withdraw is already in progress");

        // A different action kind still proceeds.
        dispatcher.get_balance().await;
        assert_eq!(counters.balance.load(Ordering::SeqCst), 1);

        task.abort();
    }
}
