//! Block watching task: follows the chain feed and publishes the most
//! recently observed block number.

use crate::config::ChainProvider;
use alloy::providers::Provider;
use tokio::{sync::watch, task::JoinHandle};
use tokio_stream::StreamExt;
use tracing::{debug, error};

/// Follows the chain's new-block feed over a pubsub provider.
///
/// Observed block numbers are published on a watch channel, so a
/// consumer that spends a whole submission cycle on one block sees only
/// the most recent block when it looks again; blocks observed in between
/// coalesce away.
#[derive(Debug)]
pub struct BlockWatcher {
    provider: ChainProvider,
}

impl BlockWatcher {
    /// Create a watcher over the given provider. The provider must be a
    /// pubsub (WebSocket) connection.
    pub const fn new(provider: ChainProvider) -> Self {
        Self { provider }
    }

    async fn task_fut(self, sender: watch::Sender<Option<u64>>) {
        let mut blocks = match self.provider.subscribe_blocks().await {
            Ok(subscription) => subscription,
            Err(err) => {
                error!(%err, "failed to subscribe to new blocks");
                return;
            }
        }
        .into_stream();

        while let Some(header) = blocks.next().await {
            debug!(number = header.number, "observed new block");
            if sender.send(Some(header.number)).is_err() {
                // The receiver has been dropped, so we can stop the task.
                debug!("receiver dropped, stopping task");
                break;
            }
        }
        // The stream only ends when the feed connection drops. The task
        // exits and the process treats the watcher as gone.
    }

    /// Spawn the task and return a watch::Receiver for observed block
    /// numbers.
    pub fn spawn(self) -> (watch::Receiver<Option<u64>>, JoinHandle<()>) {
        let (sender, receiver) = watch::channel(None);
        let jh = tokio::spawn(self.task_fut(sender));

        (receiver, jh)
    }
}
