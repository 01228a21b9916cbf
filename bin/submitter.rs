use alloy::{primitives::U256, providers::Provider as _, signers::Signer as _};
use bundle_submitter::{
    bundle::{BundleOptions, TransactionIntent},
    config::SubmitterConfig,
    constants::SELF_TRANSFER_VALUE_GAS_MULTIPLE,
    service::serve_healthcheck,
    tasks::{submit::SubmitTask, watch::BlockWatcher},
};
use init4_bin_base::{
    deps::tracing::{info, info_span},
    utils::from_env::FromEnv,
};
use tokio::select;

// Note: Must be set to `multi_thread` to support async tasks.
// See: https://docs.rs/tokio/latest/tokio/attr.main.html
#[tokio::main(flavor = "multi_thread")]
async fn main() -> eyre::Result<()> {
    let _guard = init4_bin_base::init4();
    let init_span_guard = info_span!("submitter initialization");

    // Pull the configuration from the environment
    let config = SubmitterConfig::from_env()?.clone();

    // Prep the chain provider, the bundle signer, and the relay client
    let (provider, sender, relay) = tokio::try_join!(
        config.connect_chain_provider(),
        config.connect_sender_signer(),
        config.connect_relay(),
    )?;

    // A self-transfer makes a harmless demonstration bundle. The value
    // covers the gas the transfer burns.
    let nonce = provider.get_transaction_count(sender.address()).await?;
    let value = U256::from(config.gas_price()) * U256::from(SELF_TRANSFER_VALUE_GAS_MULTIPLE);
    let intent = TransactionIntent::transfer(sender.address(), value, config.gas_price())
        .with_nonce(nonce);
    info!(sender = %sender.address(), nonce, "prepared self-transfer intent");

    // Spawn the block watcher
    let watcher = BlockWatcher::new(provider.clone());
    let (blocks, watcher_jh) = watcher.spawn();

    // Make a bundle submission task
    let submit = SubmitTask {
        config: config.clone(),
        relay,
        provider,
        transactions: vec![(sender.clone(), intent)],
        options: BundleOptions::default(),
        once: true,
    };
    let (mut outcomes, submit_jh) = submit.spawn(blocks);

    // Start the healthcheck server
    let server = serve_healthcheck(([0, 0, 0, 0], config.submitter_port));

    // We have finished initializing the submitter, so we can drop the init
    // span guard.
    drop(init_span_guard);

    select! {
        _ = watcher_jh => {
            info!("block watcher finished");
        },
        _ = submit_jh => {
            info!("submit finished");
        },
        _ = server => {
            info!("server finished");
        },
        outcome = outcomes.recv() => {
            match outcome {
                Some(Ok(resolution)) => info!(%resolution, "bundle cycle resolved"),
                Some(Err(err)) => return Err(err.into()),
                None => info!("outcome channel closed"),
            }
        },
    }

    info!("shutting down");

    Ok(())
}
