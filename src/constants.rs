//! Constants used by the bundle submitter.

/// The Flashbots mainnet relay endpoint.
pub const FLASHBOTS_RELAY: &str = "https://relay.flashbots.net";
/// The JSON-RPC method for private bundle submission.
pub const ETH_SEND_BUNDLE: &str = "eth_sendBundle";
/// The JSON-RPC method for relay-side bundle simulation.
pub const ETH_CALL_BUNDLE: &str = "eth_callBundle";
/// The header carrying the relay request signature.
pub const FLASHBOTS_SIGNATURE_HEADER: &str = "X-Flashbots-Signature";
/// Gas limit of a plain value transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;
/// Value of the demo self-transfer, as a multiple of the gas price.
pub const SELF_TRANSFER_VALUE_GAS_MULTIPLE: u64 = 100_000;
