//! Bundle data model: transaction intents, signed entries, and the
//! conversion into relay wire params.

use alloy::{
    consensus::{SignableTransaction, TxEnvelope, TxLegacy},
    eips::{BlockNumberOrTag, eip2718::Encodable2718},
    primitives::{Address, Bytes, TxHash, TxKind, U256},
    rpc::types::mev::{EthCallBundle, EthSendBundle},
    signers::Signer,
};

/// Errors producing a signed bundle from transaction intents.
///
/// All of these occur before any network call and are fatal to the
/// submission cycle that hit them.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    /// The intent has no nonce set.
    #[error("transaction intent has no nonce")]
    MissingNonce,
    /// The intent has a zero gas limit.
    #[error("transaction intent has a zero gas limit")]
    ZeroGasLimit,
    /// The bundle contains no transactions.
    #[error("bundle contains no transactions")]
    EmptyBundle,
    /// The signer refused or failed to produce a signature.
    #[error("failed to sign transaction: {0}")]
    Signer(#[from] alloy::signers::Error),
}

/// A single transaction to be carried in a bundle, before signing.
///
/// Uses legacy gas pricing. The nonce must be set before the intent can
/// be signed; everything else is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    /// Recipient address.
    pub to: Address,
    /// Value in wei.
    pub value: U256,
    /// Gas price in wei.
    pub gas_price: u128,
    /// Gas limit.
    pub gas_limit: u64,
    /// Calldata.
    pub data: Bytes,
    /// Account nonce. Unset nonces are rejected at signing time.
    pub nonce: Option<u64>,
}

impl TransactionIntent {
    /// A plain value transfer with the standard 21k gas limit.
    pub fn transfer(to: Address, value: U256, gas_price: u128) -> Self {
        Self {
            to,
            value,
            gas_price,
            gas_limit: crate::constants::TRANSFER_GAS_LIMIT,
            data: Bytes::new(),
            nonce: None,
        }
    }

    /// Set the nonce.
    pub const fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set the gas limit.
    pub const fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Set the calldata.
    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = data;
        self
    }

    fn validate(&self) -> Result<u64, ConstructionError> {
        let nonce = self.nonce.ok_or(ConstructionError::MissingNonce)?;
        if self.gas_limit == 0 {
            return Err(ConstructionError::ZeroGasLimit);
        }
        Ok(nonce)
    }

    /// Sign this intent with its designated signer, producing a bundle
    /// entry. The chain id is taken from the signer, so EIP-155 replay
    /// protection applies whenever the signer carries one.
    pub async fn sign<S: Signer>(&self, signer: &S) -> Result<BundleEntry, ConstructionError> {
        let nonce = self.validate()?;
        let tx = TxLegacy {
            chain_id: signer.chain_id(),
            nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: TxKind::Call(self.to),
            value: self.value,
            input: self.data.clone(),
        };
        let signature = signer.sign_hash(&tx.signature_hash()).await?;
        let signed = tx.into_signed(signature);
        let hash = *signed.hash();
        let envelope = TxEnvelope::Legacy(signed);

        Ok(BundleEntry {
            signed_transaction: envelope.encoded_2718().into(),
            hash,
            sender: signer.address(),
            nonce,
        })
    }
}

/// A signed transaction together with the fields needed to track its
/// inclusion on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    /// EIP-2718 encoded signed transaction. Legacy transactions encode
    /// as plain RLP.
    pub signed_transaction: Bytes,
    /// Transaction hash, i.e. the keccak of the wire bytes.
    pub hash: TxHash,
    /// Address of the signing account.
    pub sender: Address,
    /// Account nonce the transaction consumes.
    pub nonce: u64,
}

/// Sign an ordered set of intents into a bundle.
///
/// Each intent is signed by the signer paired with it. Output order
/// matches input order and is preserved all the way into the relay
/// params.
pub async fn sign_bundle<S: Signer>(
    items: &[(S, TransactionIntent)],
) -> Result<SignedBundle, ConstructionError> {
    if items.is_empty() {
        return Err(ConstructionError::EmptyBundle);
    }

    let mut entries = Vec::with_capacity(items.len());
    for (signer, intent) in items {
        entries.push(intent.sign(signer).await?);
    }
    Ok(SignedBundle { entries })
}

/// An ordered bundle of signed transactions, ready for relay submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBundle {
    entries: Vec<BundleEntry>,
}

impl SignedBundle {
    /// The bundle entries, in submission order.
    pub fn entries(&self) -> &[BundleEntry] {
        &self.entries
    }

    /// The raw signed transactions, in submission order.
    pub fn raw_txs(&self) -> Vec<Bytes> {
        self.entries.iter().map(|entry| entry.signed_transaction.clone()).collect()
    }

    /// The transaction hashes, in submission order.
    pub fn tx_hashes(&self) -> Vec<TxHash> {
        self.entries.iter().map(|entry| entry.hash).collect()
    }

    /// Build `eth_sendBundle` params targeting the given block.
    pub fn to_send_bundle(&self, target_block: u64, options: &BundleOptions) -> EthSendBundle {
        EthSendBundle {
            txs: self.raw_txs(),
            block_number: target_block,
            min_timestamp: options.min_timestamp,
            max_timestamp: options.max_timestamp,
            reverting_tx_hashes: options.reverting_tx_hashes.clone().unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Build `eth_callBundle` params simulating the bundle at the given
    /// target block on top of latest state.
    pub fn to_call_bundle(&self, target_block: u64, options: &BundleOptions) -> EthCallBundle {
        EthCallBundle {
            txs: self.raw_txs(),
            block_number: target_block,
            state_block_number: BlockNumberOrTag::Latest,
            timestamp: options.min_timestamp,
            ..Default::default()
        }
    }
}

/// Optional relay params forwarded with a bundle submission.
///
/// Unset fields are omitted from the wire params entirely, never sent as
/// null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleOptions {
    /// Earliest inclusion timestamp.
    pub min_timestamp: Option<u64>,
    /// Latest inclusion timestamp.
    pub max_timestamp: Option<u64>,
    /// Transactions allowed to revert without invalidating the bundle.
    pub reverting_tx_hashes: Option<Vec<TxHash>>,
}
