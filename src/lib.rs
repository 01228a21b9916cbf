//! Private transaction bundle submitter.
//!
//! Watches a chain for new blocks, signs a bundle of transactions targeting
//! a near-future block, submits it privately to a Flashbots-style relay
//! over authenticated JSON-RPC, and waits for the bundle to resolve.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod bundle;
pub mod config;
pub mod constants;
pub mod relay;
pub mod resolution;
pub mod service;
pub mod submission;
pub mod tasks;
pub mod test_utils;

use openssl as _;
