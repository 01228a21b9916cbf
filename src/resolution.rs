//! Bundle resolution: poll the chain until a submitted bundle's fate is
//! known.

use crate::{bundle::BundleEntry, config::ChainProvider};
use alloy::{
    providers::Provider,
    rpc::types::Block,
    transports::TransportResult,
};
use std::{collections::HashSet, fmt, time::Duration};
use tracing::{debug, warn};

/// Terminal outcome of a bundle submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleResolution {
    /// Every bundle transaction appeared in the mined target block.
    Included,
    /// The target block was mined without the bundle.
    PassedWithoutInclusion,
    /// A sender's on-chain nonce passed one of the bundle's nonces, so
    /// the bundle can no longer be included as signed.
    AccountNonceTooHigh,
    /// The bundle did not resolve within the configured timeout.
    TimedOut,
}

impl BundleResolution {
    /// True if the bundle landed in its target block.
    pub const fn is_included(&self) -> bool {
        matches!(self, Self::Included)
    }
}

impl fmt::Display for BundleResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Included => "bundle included in target block",
            Self::PassedWithoutInclusion => "target block passed without inclusion",
            Self::AccountNonceTooHigh => "account nonce too high",
            Self::TimedOut => "timed out awaiting resolution",
        };
        f.write_str(s)
    }
}

/// True if every bundle transaction hash appears in the block.
fn contains_bundle(block: &Block, entries: &[BundleEntry]) -> bool {
    let mined: HashSet<_> = block.transactions.hashes().collect();
    entries.iter().all(|entry| mined.contains(&entry.hash))
}

/// Polls the chain at a fixed interval until a bundle targeting a
/// specific block resolves, bounded by a timeout.
///
/// All reads here are idempotent, so transient RPC errors are logged and
/// retried on the next tick. This is the only place in the system that
/// retries anything.
#[derive(Debug, Clone)]
pub struct ResolutionWaiter {
    provider: ChainProvider,
    poll_interval: Duration,
    timeout: Duration,
}

impl ResolutionWaiter {
    /// Create a waiter polling at `poll_interval`, giving up after
    /// `timeout`. The interval should be notably shorter than the
    /// chain's block interval.
    pub const fn new(provider: ChainProvider, poll_interval: Duration, timeout: Duration) -> Self {
        Self { provider, poll_interval, timeout }
    }

    /// Wait until the bundle resolves or the deadline lapses. Never
    /// blocks longer than the configured timeout.
    pub async fn wait(&self, entries: &[BundleEntry], target_block: u64) -> BundleResolution {
        match tokio::time::timeout(self.timeout, self.poll_until_resolved(entries, target_block))
            .await
        {
            Ok(resolution) => resolution,
            Err(_) => {
                warn!(target_block, timeout = ?self.timeout, "bundle did not resolve in time");
                BundleResolution::TimedOut
            }
        }
    }

    async fn poll_until_resolved(
        &self,
        entries: &[BundleEntry],
        target_block: u64,
    ) -> BundleResolution {
        loop {
            match self.check(entries, target_block).await {
                Ok(Some(resolution)) => return resolution,
                Ok(None) => debug!(target_block, "target block not yet mined"),
                Err(err) => warn!(%err, target_block, "chain read failed, retrying next tick"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// One resolution check. `None` means the fate of the bundle is not
    /// yet decidable.
    async fn check(
        &self,
        entries: &[BundleEntry],
        target_block: u64,
    ) -> TransportResult<Option<BundleResolution>> {
        if let Some(block) = self.provider.get_block_by_number(target_block.into()).await? {
            if contains_bundle(&block, entries) {
                return Ok(Some(BundleResolution::Included));
            }
            // Inclusion is ruled out. A consumed nonce outranks a plain
            // miss: the bundle lost its slot to a competing transaction.
            if self.any_nonce_consumed(entries).await? {
                return Ok(Some(BundleResolution::AccountNonceTooHigh));
            }
            return Ok(Some(BundleResolution::PassedWithoutInclusion));
        }

        // Not mined yet. A competing transaction may already have
        // consumed one of the bundle's nonces in an earlier block.
        if self.any_nonce_consumed(entries).await? {
            // The target block may have been mined between the two reads,
            // with the nonces consumed by our own bundle. Re-check before
            // concluding.
            if let Some(block) = self.provider.get_block_by_number(target_block.into()).await? {
                if contains_bundle(&block, entries) {
                    return Ok(Some(BundleResolution::Included));
                }
            }
            return Ok(Some(BundleResolution::AccountNonceTooHigh));
        }
        Ok(None)
    }

    async fn any_nonce_consumed(&self, entries: &[BundleEntry]) -> TransportResult<bool> {
        for entry in entries {
            let nonce = self.provider.get_transaction_count(entry.sender).await?;
            if nonce > entry.nonce {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
