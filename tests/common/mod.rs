//! Shared mock relay and mock chain servers for integration tests.
//!
//! Both servers bind an ephemeral localhost port and answer JSON-RPC over
//! HTTP. Tests drive them through shared state handles, ticking chain
//! progress and relay behavior by hand.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use alloy::{
    primitives::{Address, B256, Bytes, U256, keccak256},
    providers::RootProvider,
    rpc::types::{Block, BlockTransactions, mev::EthCallBundleResponse},
};
use axum::{Json, Router, extract::State, http::HeaderMap, routing::post};
use bundle_submitter::{
    bundle::BundleEntry, config::ChainProvider, constants::FLASHBOTS_SIGNATURE_HEADER,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// What the mock relay has seen and how it should answer.
#[derive(Debug, Default)]
pub struct RelayState {
    /// Raw request bodies, in arrival order.
    pub bodies: Vec<Bytes>,
    /// Parsed request bodies, in arrival order.
    pub requests: Vec<Value>,
    /// Signature headers, in arrival order.
    pub signatures: Vec<String>,
    /// Reply with this error payload instead of a result.
    pub reject_with: Option<(i64, String)>,
    /// Reply with neither a result nor an error.
    pub empty_reply: bool,
}

/// The bundle hash the mock relay acknowledges submissions with.
pub const MOCK_BUNDLE_HASH: B256 = B256::repeat_byte(0xfb);

/// Serve a mock Flashbots relay on an ephemeral port.
pub async fn start_mock_relay(state: Arc<Mutex<RelayState>>) -> url::Url {
    let router = Router::new().route("/", post(relay_rpc)).with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap()).parse().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    url
}

async fn relay_rpc(
    State(state): State<Arc<Mutex<RelayState>>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Json<Value> {
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    let id = parsed["id"].clone();
    let method = parsed["method"].as_str().unwrap_or_default().to_owned();

    let mut state = state.lock().unwrap();
    if let Some(signature) = headers.get(FLASHBOTS_SIGNATURE_HEADER) {
        state.signatures.push(signature.to_str().unwrap().to_owned());
    }
    state.bodies.push(body.to_vec().into());
    state.requests.push(parsed);

    if let Some((code, message)) = &state.reject_with {
        return Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message },
        }));
    }
    if state.empty_reply {
        return Json(json!({ "jsonrpc": "2.0", "id": id }));
    }

    let result = match method.as_str() {
        "eth_callBundle" => serde_json::to_value(call_bundle_response()).unwrap(),
        _ => json!({ "bundleHash": MOCK_BUNDLE_HASH }),
    };
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

fn call_bundle_response() -> EthCallBundleResponse {
    EthCallBundleResponse {
        bundle_hash: MOCK_BUNDLE_HASH,
        bundle_gas_price: U256::from(2_000_000_000u64),
        gas_fees: U256::from(42_000_000_000_000u64),
        state_block_number: 100,
        total_gas_used: 21_000,
        ..Default::default()
    }
}

/// Chain state the mock execution node serves.
#[derive(Debug, Default)]
pub struct ChainState {
    /// Mined blocks by number.
    pub blocks: HashMap<u64, Block>,
    /// Transaction count per account.
    pub nonces: HashMap<Address, u64>,
    /// Answer this many block reads with null before serving `blocks`.
    pub hide_block_reads: u64,
    /// Requests served so far.
    pub requests: u64,
}

impl ChainState {
    /// Record a mined block holding the given transaction hashes.
    pub fn insert_block(&mut self, number: u64, tx_hashes: Vec<B256>) {
        let mut block = Block::default();
        block.header.hash = keccak256(number.to_be_bytes());
        block.header.inner.number = number;
        block.transactions = BlockTransactions::Hashes(tx_hashes);
        self.blocks.insert(number, block);
    }
}

/// Serve a mock execution node on an ephemeral port and return a provider
/// pointed at it.
pub async fn start_mock_chain(state: Arc<Mutex<ChainState>>) -> ChainProvider {
    let router = Router::new().route("/", post(chain_rpc)).with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap()).parse().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    RootProvider::new_http(url)
}

async fn chain_rpc(
    State(state): State<Arc<Mutex<ChainState>>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let method = body["method"].as_str().unwrap_or_default();
    let params = &body["params"];

    let mut state = state.lock().unwrap();
    state.requests += 1;

    let result = match method {
        "eth_getBlockByNumber" => {
            let number = parse_quantity(params[0].as_str().unwrap_or_default());
            if state.hide_block_reads > 0 {
                state.hide_block_reads -= 1;
                Value::Null
            } else {
                state
                    .blocks
                    .get(&number)
                    .map(|block| serde_json::to_value(block).unwrap())
                    .unwrap_or(Value::Null)
            }
        }
        "eth_getTransactionCount" => {
            let address: Address = params[0].as_str().unwrap_or_default().parse().unwrap();
            let nonce = state.nonces.get(&address).copied().unwrap_or_default();
            json!(format!("0x{nonce:x}"))
        }
        "eth_getTransactionReceipt" => Value::Null,
        other => panic!("mock chain does not serve {other}"),
    };
    Json(json!({ "jsonrpc": "2.0", "id": body["id"], "result": result }))
}

fn parse_quantity(quantity: &str) -> u64 {
    u64::from_str_radix(quantity.trim_start_matches("0x"), 16).unwrap()
}

/// Fabricate a bundle entry without signing anything real.
pub fn test_entry(seed: u8, nonce: u64) -> BundleEntry {
    BundleEntry {
        signed_transaction: Bytes::from(vec![seed]),
        hash: B256::repeat_byte(seed),
        sender: Address::repeat_byte(seed),
        nonce,
    }
}
