//! Bundle submission task: runs one submission cycle per observed block.

use crate::{
    bundle::{BundleOptions, ConstructionError, TransactionIntent, sign_bundle},
    config::{ChainProvider, SubmitterConfig},
    relay::{RelayClient, RelayError},
    resolution::BundleResolution,
    submission::SubmissionHandle,
};
use init4_bin_base::{
    deps::metrics::{counter, histogram},
    utils::signer::LocalOrAws,
};
use std::time::Instant;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument};

/// The result of one submission cycle.
pub type CycleResult = Result<BundleResolution, SubmitError>;

/// Errors that end a submission cycle.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The bundle could not be constructed. Nothing reached the relay.
    #[error("failed to construct bundle: {0}")]
    Construction(#[from] ConstructionError),

    /// The relay rejected the bundle or could not be reached. Submissions
    /// are never retried.
    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Drives bundle submission cycles.
///
/// Each observed block starts one cycle: pick the target block, sign the
/// planned transactions into a bundle, submit it to the relay, and await
/// its resolution. A cycle runs to a terminal state before the next
/// observed block is considered. With `once` set the task stops after
/// the first terminal state, which is the reference single-shot
/// behavior; without it the task loops for the life of the process.
#[derive(Debug)]
pub struct SubmitTask {
    /// Submitter configuration.
    pub config: SubmitterConfig,
    /// Relay the bundles are submitted to.
    pub relay: RelayClient,
    /// Chain provider used to track resolution.
    pub provider: ChainProvider,
    /// The transactions bundled each cycle, each paired with the signer
    /// that owns it.
    pub transactions: Vec<(LocalOrAws, TransactionIntent)>,
    /// Optional relay params forwarded with each submission.
    pub options: BundleOptions,
    /// Stop after the first cycle reaches a terminal state.
    pub once: bool,
}

impl SubmitTask {
    /// The block a bundle targets when the head was observed at
    /// `observed_block`. Offsets below 1 are treated as 1, so the target
    /// is always strictly ahead of the observed block.
    pub fn target_block(&self, observed_block: u64) -> u64 {
        observed_block + self.config.target_block_offset.max(1)
    }

    /// Run one submission cycle. Returns a handle to the accepted
    /// submission; resolution is the caller's next step.
    #[instrument(skip(self))]
    async fn submit_cycle(&self, observed_block: u64) -> Result<SubmissionHandle, SubmitError> {
        let target_block = self.target_block(observed_block);

        let bundle = sign_bundle(&self.transactions).await?;
        debug!(target_block, txs = bundle.entries().len(), "signed bundle");

        let params = bundle.to_send_bundle(target_block, &self.options);
        let acceptance = self.relay.send_bundle(&params).await?;
        counter!("submitter.bundles_submitted").increment(1);
        info!(target_block, bundle_hash = %acceptance.bundle_hash, "bundle accepted by relay");

        Ok(SubmissionHandle::new(
            bundle,
            target_block,
            self.options.clone(),
            self.relay.clone(),
            self.provider.clone(),
            self.config.resolution_waiter(self.provider.clone()),
        ))
    }

    async fn task_future(
        self,
        mut blocks: watch::Receiver<Option<u64>>,
        outcomes: mpsc::UnboundedSender<CycleResult>,
    ) {
        loop {
            // Wait for the watcher to observe a block. Anything observed
            // while the previous cycle ran has coalesced to the latest.
            if blocks.changed().await.is_err() {
                debug!("block watcher dropped, stopping task");
                break;
            }
            let Some(observed_block) = *blocks.borrow_and_update() else { continue };

            let start = Instant::now();
            let result = match self.submit_cycle(observed_block).await {
                Ok(handle) => {
                    let resolution = handle.wait().await;
                    histogram!("submitter.resolution_time")
                        .record(start.elapsed().as_secs_f64());
                    info!(
                        %resolution,
                        target_block = handle.target_block(),
                        "submission cycle resolved"
                    );
                    Ok(resolution)
                }
                Err(err) => {
                    error!(%err, observed_block, "submission cycle failed");
                    Err(err)
                }
            };

            match &result {
                Ok(BundleResolution::Included) => {
                    counter!("submitter.bundles_included").increment(1)
                }
                Ok(BundleResolution::PassedWithoutInclusion) => {
                    counter!("submitter.blocks_passed").increment(1)
                }
                Ok(BundleResolution::AccountNonceTooHigh) => {
                    counter!("submitter.nonces_consumed").increment(1)
                }
                Ok(BundleResolution::TimedOut) => {
                    counter!("submitter.resolution_timeouts").increment(1)
                }
                Err(SubmitError::Relay(err)) if err.is_rejection() => {
                    counter!("submitter.relay_rejections").increment(1)
                }
                Err(_) => counter!("submitter.cycles_failed").increment(1),
            }

            if outcomes.send(result).is_err() {
                debug!("outcome receiver dropped, stopping task");
                break;
            }
            if self.once {
                debug!("single-shot cycle complete, stopping task");
                break;
            }
        }
    }

    /// Spawn the task. Returns a receiver for per-cycle outcomes and the
    /// task handle.
    pub fn spawn(
        self,
        blocks: watch::Receiver<Option<u64>>,
    ) -> (mpsc::UnboundedReceiver<CycleResult>, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let jh = tokio::spawn(self.task_future(blocks, sender));

        (receiver, jh)
    }
}
