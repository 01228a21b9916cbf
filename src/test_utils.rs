//! Test utilities for testing submitter tasks
use crate::{
    bundle::{BundleOptions, TransactionIntent},
    config::SubmitterConfig,
    relay::RelayClient,
    tasks::submit::SubmitTask,
};
use alloy::{
    primitives::{Address, U256},
    providers::RootProvider,
    signers::local::PrivateKeySigner,
};
use init4_bin_base::{
    deps::tracing_subscriber::{
        EnvFilter, Layer, fmt, layer::SubscriberExt, registry, util::SubscriberInitExt,
    },
    utils::signer::LocalOrAws,
};

/// Sets up a submitter config with test values
pub fn setup_test_config() -> SubmitterConfig {
    SubmitterConfig {
        chain_rpc_url: "ws://localhost:8545".into(),
        relay_url: "http://localhost:8080".parse().unwrap(),
        chain_id: 1,
        sender_key: "0000000000000000000000000000000000000000000000000000000000000000".into(),
        relay_key: None,
        target_block_offset: 2,
        resolution_timeout_secs: 2,
        resolution_poll_interval_ms: 25,
        gas_price_gwei: 2,
        submitter_port: 8080,
    }
}

/// Sets up a submit task over throwaway local transports and signers.
pub fn setup_test_task(config: SubmitterConfig) -> SubmitTask {
    let relay = RelayClient::new(config.relay_url.clone(), test_signer());
    let provider = RootProvider::new_http("http://localhost:8545".parse().unwrap());
    SubmitTask {
        config,
        relay,
        provider,
        transactions: vec![],
        options: BundleOptions::default(),
        once: true,
    }
}

/// Returns a throwaway in-memory signer.
pub fn test_signer() -> LocalOrAws {
    LocalOrAws::Local(PrivateKeySigner::random())
}

/// Returns a plain transfer intent with the provided nonce and test-friendly
/// gas values.
pub fn test_intent(nonce: u64) -> TransactionIntent {
    TransactionIntent::transfer(Address::repeat_byte(0x22), U256::from(1_000u64), 2_000_000_000)
        .with_nonce(nonce)
}

/// Initializes a logger that prints during testing
pub fn setup_logging() {
    // Initialize logging
    let filter = EnvFilter::from_default_env();
    let fmt = fmt::layer().with_filter(filter);
    let registry = registry().with(fmt);
    let _ = registry.try_init();
}
