//! Raw proxy API types.
//!
//! These types model the JSON returned by the proxy's
//! `hyperblock/by-nonce/{nonce}` and `hyperblock/by-hash/{hash}` endpoints.
//! They are read-only input to the [`crate::mapper`]; every field is kept in
//! its wire representation (hex hashes, decimal big-integer strings, base64
//! payloads) and normalized only during mapping.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a JSON `null` as `T::default()`.
///
/// The proxy serializes nil slices as `null`, which `#[serde(default)]` alone
/// does not accept.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// The `code` value the proxy uses for a successful response.
pub const CODE_SUCCESSFUL: &str = "successful";

/// Generic proxy response envelope: `{"data": ..., "error": "...", "code": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyResponse<T> {
    /// Payload, absent on error.
    pub data: Option<T>,

    /// Human-readable error message, empty on success.
    #[serde(default)]
    pub error: String,

    /// Machine-readable result code (`"successful"` on success).
    #[serde(default)]
    pub code: String,
}

impl<T> ProxyResponse<T> {
    /// Whether the proxy reported success.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.code == CODE_SUCCESSFUL && self.error.is_empty()
    }
}

/// `data` payload of the hyperblock endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HyperBlockData {
    /// The hyperblock itself.
    pub hyperblock: ApiHyperBlock,
}

impl HyperBlockData {
    /// Parse a full proxy response body and unwrap the hyperblock.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::Json`] for malformed bodies and
    /// [`ResponseError::Api`] when the proxy reports a failure or omits
    /// the payload.
    pub fn from_response_body(body: &[u8]) -> Result<ApiHyperBlock, ResponseError> {
        let response: ProxyResponse<Self> = serde_json::from_slice(body)?;
        match response.data {
            Some(data) if response.is_successful() => Ok(data.hyperblock),
            _ => Err(ResponseError::Api {
                code: response.code,
                message: response.error,
            }),
        }
    }
}

/// Failure to unwrap a proxy response envelope.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    /// The body is not valid JSON for the expected shape.
    #[error("malformed response body: {0}")]
    Json(#[from] serde_json::Error),

    /// The proxy answered with an error envelope.
    #[error("proxy returned code {code:?}: {message}")]
    Api {
        /// Proxy result code.
        code: String,
        /// Proxy error message.
        message: String,
    },
}

/// Aggregated metachain block plus the shard blocks and transactions it
/// finalizes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiHyperBlock {
    /// Block hash, hex.
    pub hash: String,
    /// Previous block hash, hex.
    pub prev_block_hash: String,
    /// State root hash, hex.
    pub state_root_hash: String,
    /// Block nonce.
    pub nonce: u64,
    /// Consensus round.
    pub round: u64,
    /// Epoch.
    pub epoch: u32,
    /// Number of transactions (not carried into the canonical schema).
    pub num_txs: u32,
    /// Fees accumulated in this block, decimal.
    pub accumulated_fees: String,
    /// Developer fees in this block, decimal.
    pub developer_fees: String,
    /// Fees accumulated in the epoch so far, decimal.
    pub accumulated_fees_in_epoch: String,
    /// Developer fees in the epoch so far, decimal.
    pub developer_fees_in_epoch: String,
    /// Unix timestamp (seconds).
    pub timestamp: u64,
    /// Economics data, only present on epoch-start blocks.
    pub epoch_start_info: Option<ApiEpochStartInfo>,
    /// Notarized shard blocks.
    #[serde(deserialize_with = "null_as_default")]
    pub shard_blocks: Vec<Option<ApiShardBlock>>,
    /// Transactions of every kind, in execution order.
    #[serde(deserialize_with = "null_as_default")]
    pub transactions: Vec<Option<ApiTransaction>>,
    /// Finality status (e.g. `"on-chain"`).
    pub status: String,
}

/// Epoch-start economics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiEpochStartInfo {
    /// Total supply, decimal.
    pub total_supply: String,
    /// Rewards to distribute, decimal.
    pub total_to_distribute: String,
    /// Newly minted amount, decimal.
    pub total_newly_minted: String,
    /// Rewards per block, decimal.
    pub rewards_per_block: String,
    /// Protocol sustainability rewards, decimal.
    pub rewards_for_protocol_sustainability: String,
    /// Node price, decimal.
    pub node_price: String,
    /// Round of the previous epoch start.
    pub prev_epoch_start_round: u64,
    /// Hash of the previous epoch start block, hex (may be empty).
    pub prev_epoch_start_hash: String,
}

/// A shard block notarized by the hyperblock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiShardBlock {
    /// Block hash, hex.
    pub hash: String,
    /// Block nonce.
    pub nonce: u64,
    /// Consensus round.
    pub round: u64,
    /// Shard identifier.
    pub shard: u32,
    /// State root hash, hex (may be empty).
    pub root_hash: String,
    /// Hashes of the miniblocks in the block, hex.
    #[serde(deserialize_with = "null_as_default")]
    pub mini_block_hashes: Vec<String>,
    /// Accounts whose state changed in this block.
    #[serde(deserialize_with = "null_as_default")]
    pub altered_accounts: Vec<Option<ApiAlteredAccount>>,
}

/// A transaction of any kind as reported by the proxy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiTransaction {
    /// `"normal"`, `"unsigned"`, `"reward"` or `"invalid"`.
    #[serde(rename = "type")]
    pub tx_type: String,
    /// Transaction hash, hex.
    pub hash: String,
    /// Sender nonce.
    pub nonce: u64,
    /// Round of inclusion.
    pub round: u64,
    /// Epoch of inclusion.
    pub epoch: u32,
    /// Transferred value, decimal.
    pub value: String,
    /// Receiver bech32 address.
    pub receiver: String,
    /// Sender bech32 address.
    pub sender: String,
    /// Gas price.
    pub gas_price: u64,
    /// Gas limit.
    pub gas_limit: u64,
    /// Gas used.
    pub gas_used: u64,
    /// Payload, base64.
    pub data: Option<String>,
    /// Signature, hex (empty for reward and unsigned transactions).
    pub signature: String,
    /// Source shard.
    pub source_shard: u32,
    /// Destination shard.
    pub destination_shard: u32,
    /// Unix timestamp (seconds).
    pub timestamp: u64,
    /// Execution status (dropped by the canonical schema).
    pub status: String,
    /// Fee paid up-front, decimal.
    pub initially_paid_fee: String,
    /// Final fee, decimal.
    pub fee: String,
    /// Relayer bech32 address, empty for non-relayed transactions.
    pub relayer: String,
    /// Value relayed on behalf of the sender, decimal.
    pub relayed_value: String,
    /// Parent transaction hash for smart contract results, hex.
    pub prev_tx_hash: String,
    /// Originating transaction hash for smart contract results, hex.
    pub original_tx_hash: String,
    /// Smart contract call type.
    pub call_type: String,
    /// Smart contract return message.
    pub return_message: String,
    /// Receipt produced by the transaction, if any.
    pub receipt: Option<ApiReceipt>,
    /// Logs produced by the transaction, if any.
    pub logs: Option<ApiLogs>,
}

/// A receipt attached to a transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiReceipt {
    /// Refunded value, decimal.
    pub value: String,
    /// Sender bech32 address.
    #[serde(rename = "sndAddr")]
    pub sender: String,
    /// Free-form data.
    pub data: String,
    /// Hash of the transaction the receipt belongs to, hex.
    pub tx_hash: String,
}

/// Logs emitted while executing a transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiLogs {
    /// Emitting address.
    pub address: String,
    /// Events, in emission order.
    #[serde(deserialize_with = "null_as_default")]
    pub events: Vec<Option<ApiEvent>>,
}

/// A single log event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEvent {
    /// Emitting address.
    pub address: String,
    /// Event identifier.
    pub identifier: String,
    /// Topics, base64 each.
    #[serde(deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
    /// Payload, base64.
    pub data: Option<String>,
}

/// An account whose state changed within the block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiAlteredAccount {
    /// Bech32 address.
    pub address: String,
    /// Account nonce after the block.
    pub nonce: u64,
    /// Balance after the block, decimal.
    pub balance: String,
    /// Token balances after the block.
    #[serde(deserialize_with = "null_as_default")]
    pub tokens: Vec<Option<ApiAccountTokenData>>,
}

/// A token balance held by an altered account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiAccountTokenData {
    /// Token nonce (non-zero for NFTs / SFTs).
    pub nonce: u64,
    /// Token identifier (e.g. `"WEGLD-bd4d79"`).
    pub identifier: String,
    /// Token balance, decimal.
    pub balance: String,
    /// Token properties, hex.
    pub properties: String,
}
