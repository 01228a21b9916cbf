//! A handle over an accepted bundle submission: await its resolution,
//! simulate it, or fetch its receipts.

use crate::{
    bundle::{BundleEntry, BundleOptions, SignedBundle},
    config::ChainProvider,
    relay::{RelayClient, RelayError},
    resolution::{BundleResolution, ResolutionWaiter},
};
use alloy::{
    providers::Provider,
    rpc::types::{TransactionReceipt, mev::EthCallBundleResponse},
    transports::TransportResult,
};

/// Tracks one bundle accepted by the relay for one target block.
///
/// Resolution is memoized: the first `wait` polls the chain, later calls
/// return the same outcome without polling past the original deadline.
#[derive(Debug)]
pub struct SubmissionHandle {
    bundle: SignedBundle,
    target_block: u64,
    options: BundleOptions,
    relay: RelayClient,
    provider: ChainProvider,
    waiter: ResolutionWaiter,
    resolution: tokio::sync::OnceCell<BundleResolution>,
}

impl SubmissionHandle {
    /// Create a handle for a bundle the relay has accepted.
    pub fn new(
        bundle: SignedBundle,
        target_block: u64,
        options: BundleOptions,
        relay: RelayClient,
        provider: ChainProvider,
        waiter: ResolutionWaiter,
    ) -> Self {
        Self {
            bundle,
            target_block,
            options,
            relay,
            provider,
            waiter,
            resolution: Default::default(),
        }
    }

    /// The bundle entries, in submission order.
    pub fn entries(&self) -> &[BundleEntry] {
        self.bundle.entries()
    }

    /// The block the bundle was submitted for.
    pub const fn target_block(&self) -> u64 {
        self.target_block
    }

    /// Wait for the bundle to resolve. Idempotent.
    pub async fn wait(&self) -> BundleResolution {
        *self
            .resolution
            .get_or_init(|| self.waiter.wait(self.bundle.entries(), self.target_block))
            .await
    }

    /// Simulate the bundle at the target block, relay side, on top of
    /// latest state.
    pub async fn simulate(&self) -> Result<EthCallBundleResponse, RelayError> {
        let call = self.bundle.to_call_bundle(self.target_block, &self.options);
        self.relay.call_bundle(&call).await
    }

    /// Fetch the receipt of each bundle transaction, in bundle order.
    /// Transactions that have not landed yield `None`.
    pub async fn receipts(&self) -> TransportResult<Vec<Option<TransactionReceipt>>> {
        let mut receipts = Vec::with_capacity(self.bundle.entries().len());
        for entry in self.bundle.entries() {
            receipts.push(self.provider.get_transaction_receipt(entry.hash).await?);
        }
        Ok(receipts)
    }
}
