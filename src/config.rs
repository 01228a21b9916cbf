//! Configuration for the bundle submitter, pulled from the environment.

use crate::{relay::RelayClient, resolution::ResolutionWaiter};
use alloy::{network::Ethereum, providers::RootProvider};
use eyre::Result;
use init4_bin_base::utils::{from_env::FromEnv, signer::LocalOrAws};
use std::{borrow::Cow, time::Duration};

/// Type alias for the provider used to watch blocks and read chain state.
pub type ChainProvider = RootProvider<Ethereum>;

/// Configuration for a submitter targeting one chain and one relay.
#[derive(Debug, Clone, FromEnv)]
pub struct SubmitterConfig {
    /// URL for the chain RPC node.
    #[from_env(
        var = "CHAIN_RPC_URL",
        desc = "URL for the chain RPC node. This MUST be a valid WS url starting with ws:// or wss://, as block watching requires a subscription",
        infallible
    )]
    pub chain_rpc_url: Cow<'static, str>,

    /// The relay endpoint bundles are submitted to.
    #[from_env(var = "RELAY_URL", desc = "Flashbots-style relay endpoint for bundle submission")]
    pub relay_url: url::Url,

    /// Chain ID of the target chain.
    #[from_env(var = "CHAIN_ID", desc = "Chain ID of the target chain")]
    pub chain_id: u64,

    /// Key for the wallet whose transactions are bundled - AWS Key ID
    /// _OR_ local private key.
    #[from_env(
        var = "SENDER_KEY",
        desc = "Key for the wallet whose transactions are bundled - AWS Key ID _OR_ local private key",
        infallible
    )]
    pub sender_key: String,

    /// Key identifying the submitter to the relay - AWS Key ID _OR_ local
    /// private key. Falls back to the sender key when unset. This key
    /// only signs relay request headers, never transactions.
    #[from_env(
        var = "FLASHBOTS_SIGNER_KEY",
        desc = "Key identifying the submitter to the relay - AWS Key ID _OR_ local private key, falls back to SENDER_KEY when unset",
        infallible,
        optional
    )]
    pub relay_key: Option<String>,

    /// How many blocks past the observed head to target.
    #[from_env(
        var = "TARGET_BLOCK_OFFSET",
        desc = "How many blocks past the observed head a bundle targets. Must be at least 1",
        default = 2
    )]
    pub target_block_offset: u64,

    /// How long to await a bundle's resolution before giving up.
    #[from_env(
        var = "RESOLUTION_TIMEOUT_SECS",
        desc = "Seconds to await a bundle's resolution before giving up",
        default = 300
    )]
    pub resolution_timeout_secs: u64,

    /// Interval between chain polls while awaiting resolution. Should be
    /// notably shorter than the chain's block interval.
    #[from_env(
        var = "RESOLUTION_POLL_INTERVAL_MS",
        desc = "Milliseconds between chain polls while awaiting a bundle's resolution",
        default = 2000
    )]
    pub resolution_poll_interval_ms: u64,

    /// Gas price of the bundled transactions, in gwei.
    #[from_env(
        var = "GAS_PRICE_GWEI",
        desc = "Gas price of the bundled transactions, in gwei",
        default = 120
    )]
    pub gas_price_gwei: u64,

    /// Port for the submitter's healthcheck server.
    #[from_env(var = "SUBMITTER_PORT", desc = "Port for the submitter's healthcheck server")]
    pub submitter_port: u16,
}

impl SubmitterConfig {
    /// Connect to the chain RPC provider. Memoized; the block watcher and
    /// all chain reads share one connection.
    pub async fn connect_chain_provider(&self) -> Result<ChainProvider> {
        static ONCE: tokio::sync::OnceCell<ChainProvider> = tokio::sync::OnceCell::const_new();

        ONCE.get_or_try_init(|| async {
            RootProvider::connect(self.chain_rpc_url.as_ref()).await.map_err(Into::into)
        })
        .await
        .cloned()
    }

    /// Connect to the sender signer.
    pub async fn connect_sender_signer(&self) -> Result<LocalOrAws> {
        static ONCE: tokio::sync::OnceCell<LocalOrAws> = tokio::sync::OnceCell::const_new();

        ONCE.get_or_try_init(|| async {
            LocalOrAws::load(&self.sender_key, Some(self.chain_id)).await
        })
        .await
        .cloned()
        .map_err(Into::into)
    }

    /// Connect to the relay identity signer. Falls back to the sender
    /// signer when no dedicated identity key is configured.
    pub async fn connect_relay_signer(&self) -> Result<LocalOrAws> {
        match &self.relay_key {
            Some(key) => LocalOrAws::load(key, Some(self.chain_id)).await.map_err(Into::into),
            None => self.connect_sender_signer().await,
        }
    }

    /// Build the relay client.
    pub async fn connect_relay(&self) -> Result<RelayClient> {
        self.connect_relay_signer()
            .await
            .map(|signer| RelayClient::new(self.relay_url.clone(), signer))
    }

    /// Build a resolution waiter over the given provider.
    pub fn resolution_waiter(&self, provider: ChainProvider) -> ResolutionWaiter {
        ResolutionWaiter::new(provider, self.resolution_poll_interval(), self.resolution_timeout())
    }

    /// The resolution timeout as a duration.
    pub const fn resolution_timeout(&self) -> Duration {
        Duration::from_secs(self.resolution_timeout_secs)
    }

    /// The resolution poll interval as a duration.
    pub const fn resolution_poll_interval(&self) -> Duration {
        Duration::from_millis(self.resolution_poll_interval_ms)
    }

    /// The configured gas price in wei.
    pub const fn gas_price(&self) -> u128 {
        self.gas_price_gwei as u128 * 1_000_000_000
    }
}
