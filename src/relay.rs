//! A Flashbots-style relay client: signed JSON-RPC bundle submission.

use crate::constants::{ETH_CALL_BUNDLE, ETH_SEND_BUNDLE, FLASHBOTS_SIGNATURE_HEADER};
use alloy::{
    primitives::keccak256,
    rpc::{
        json_rpc::ErrorPayload,
        types::mev::{EthBundleHash, EthCallBundle, EthCallBundleResponse, EthSendBundle},
    },
    signers::Signer,
};
use init4_bin_base::utils::signer::LocalOrAws;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

type Result<T> = core::result::Result<T, RelayError>;

/// Errors that can occur when submitting a bundle to the relay.
///
/// Submissions are not idempotent, so no variant is ever retried by this
/// client.
#[derive(thiserror::Error, Debug)]
pub enum RelayError {
    /// The relay processed the request and rejected it. Carries the
    /// relay's JSON-RPC error verbatim.
    #[error("relay rejected request: {} (code {})", .0.message, .0.code)]
    Rejected(ErrorPayload),

    /// Error contacting the relay.
    #[error("error contacting relay: {0}")]
    Transport(#[from] reqwest::Error),

    /// The relay answered with a body that is not a JSON-RPC reply.
    #[error("malformed relay reply: {0}")]
    MalformedReply(#[from] serde_json::Error),

    /// The relay reply carried neither a result nor an error.
    #[error("relay reply carried neither result nor error")]
    EmptyReply,

    /// Signing the request payload failed.
    #[error("failed to sign relay request: {0}")]
    Signer(#[from] alloy::signers::Error),
}

impl RelayError {
    /// True if the relay itself rejected the request, as opposed to a
    /// failure reaching or reading it.
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// A minimal JSON-RPC reply envelope.
#[derive(Debug, serde::Deserialize)]
struct RelayReply<T> {
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<ErrorPayload>,
}

/// Client for a single Flashbots-style relay endpoint.
///
/// Every request body is signed with the identity signer and sent with
/// the `X-Flashbots-Signature` header. The identity signer authenticates
/// the submitter to the relay and never signs payload transactions.
#[derive(Debug, Clone)]
pub struct RelayClient {
    /// The relay endpoint.
    url: url::Url,
    /// Reused HTTP client.
    client: reqwest::Client,
    /// Identity signer, loaded once at startup.
    signer: LocalOrAws,
}

impl RelayClient {
    /// Create a client for the given relay endpoint and identity signer.
    pub fn new(url: url::Url, signer: LocalOrAws) -> Self {
        Self { url, client: reqwest::Client::new(), signer }
    }

    /// The relay endpoint this client talks to.
    pub const fn url(&self) -> &url::Url {
        &self.url
    }

    /// The address of the identity signer.
    pub fn identity(&self) -> alloy::primitives::Address {
        self.signer.address()
    }

    /// Submit a bundle via `eth_sendBundle`.
    pub async fn send_bundle(&self, bundle: &EthSendBundle) -> Result<EthBundleHash> {
        let params = serde_json::to_value(bundle)?;
        self.raw_call(ETH_SEND_BUNDLE, params).await
    }

    /// Simulate a bundle via `eth_callBundle`.
    pub async fn call_bundle(&self, bundle: &EthCallBundle) -> Result<EthCallBundleResponse> {
        let params = serde_json::to_value(bundle)?;
        self.raw_call(ETH_CALL_BUNDLE, params).await
    }

    /// Makes a signed JSON-RPC call to the relay. Params that are not
    /// already an array are wrapped in a one-element array.
    #[instrument(skip(self, params), fields(url = %self.url))]
    async fn raw_call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        let params = match params {
            serde_json::Value::Array(_) => params,
            other => serde_json::Value::Array(vec![other]),
        };

        let body = json!({"jsonrpc":"2.0","id":1,"method":method,"params":params});
        let body_bz = serde_json::to_vec(&body)?;

        // The signed bytes and the sent bytes must be identical.
        let signature = self.request_signature(&body_bz).await?;

        let resp = self
            .client
            .post(self.url.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(FLASHBOTS_SIGNATURE_HEADER, signature)
            .body(body_bz)
            .send()
            .await?;

        let text = resp.text().await?;
        let reply: RelayReply<T> = serde_json::from_str(&text)?;

        if let Some(err) = reply.error {
            return Err(RelayError::Rejected(err));
        }
        debug!(method, "relay accepted request");
        reply.result.ok_or(RelayError::EmptyReply)
    }

    /// Builds the `X-Flashbots-Signature` header value: the identity
    /// address and an EIP-191 signature of the hex-encoded keccak of the
    /// request body.
    async fn request_signature(&self, body_bz: &[u8]) -> Result<String> {
        let payload = format!("0x{:x}", keccak256(body_bz));
        let signature = self.signer.sign_message(payload.as_ref()).await?;
        let address = self.signer.address();
        Ok(format!("{address}:{signature}"))
    }
}
