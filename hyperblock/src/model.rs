//! Canonical hyperblock records (schema version 2).
//!
//! Fixed-length fields (hashes, addresses, signatures) are stored as plain
//! byte vectors; their lengths are enforced by the [`crate::codec`], not by
//! the type system, so a malformed record can exist in memory but can never
//! be encoded. Big-integer fields hold minimal big-endian bytes where the
//! empty vector is zero.
#![allow(missing_docs, reason = "fields mirror the schema in codec::schema")]

/// Length of every hash field.
pub const HASH_LEN: usize = 32;

/// Length of every bech32 address field.
pub const ADDRESS_LEN: usize = 62;

/// Length of a transaction signature.
pub const SIGNATURE_LEN: usize = 64;

/// Version of the canonical schema these records implement.
pub const SCHEMA_VERSION: u32 = 2;

/// Root record: one metachain block with everything it finalizes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HyperBlock {
    pub hash: Vec<u8>,
    pub prev_block_hash: Vec<u8>,
    pub state_root_hash: Vec<u8>,
    pub nonce: i64,
    pub round: i64,
    pub epoch: i32,
    pub shard_blocks: Vec<ShardBlock>,
    pub transactions: Vec<Transaction>,
    pub sc_results: Vec<SmartContractResult>,
    pub receipts: Vec<Receipt>,
    /// Altered accounts of every notarized shard block, in shard-block order.
    pub state_changes: Vec<AccountBalanceUpdate>,
    pub accumulated_fees: Vec<u8>,
    pub developer_fees: Vec<u8>,
    pub accumulated_fees_in_epoch: Vec<u8>,
    pub developer_fees_in_epoch: Vec<u8>,
    pub timestamp: i64,
    /// Zero-valued unless the block starts an epoch.
    pub epoch_start_info: EpochStartInfo,
    pub status: String,
}

/// A shard block notarized by the hyperblock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardBlock {
    pub hash: Vec<u8>,
    pub shard_id: i32,
    pub nonce: i64,
    pub round: i64,
    pub root_hash: Vec<u8>,
    pub mini_block_hashes: Vec<Vec<u8>>,
}

/// A user, reward or invalid transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    pub hash: Vec<u8>,
    pub transaction_type: String,
    pub nonce: i64,
    pub round: i64,
    pub value: Vec<u8>,
    pub receiver: Vec<u8>,
    pub sender: Vec<u8>,
    pub sender_shard: i32,
    pub receiver_shard: i32,
    pub gas_price: i64,
    pub gas_limit: i64,
    pub gas_used: i64,
    pub data: Vec<u8>,
    /// Absent for transactions that are not user-signed.
    pub signature: Option<Vec<u8>>,
    pub timestamp: i64,
    pub initially_paid_fee: Vec<u8>,
    pub fee: Vec<u8>,
    /// Set only for relayed transactions.
    pub relayer: Option<Vec<u8>>,
    pub relayed_value: Vec<u8>,
    pub log: Log,
}

/// A smart contract result (an `unsigned` transaction).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmartContractResult {
    pub hash: Vec<u8>,
    pub nonce: i64,
    pub gas_limit: i64,
    pub gas_price: i64,
    pub value: Vec<u8>,
    pub sender: Vec<u8>,
    pub receiver: Vec<u8>,
    pub relayer: Option<Vec<u8>>,
    pub relayed_value: Vec<u8>,
    pub data: Vec<u8>,
    pub prev_tx_hash: Vec<u8>,
    pub original_tx_hash: Vec<u8>,
    pub call_type: String,
    pub return_message: String,
    pub timestamp: i64,
    pub log: Log,
}

/// A receipt emitted by a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: Vec<u8>,
    pub value: Vec<u8>,
    pub sender: Vec<u8>,
    pub data: Vec<u8>,
}

/// Transaction logs. The empty log (no address, no events) stands in for
/// transactions that produced none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Log {
    pub address: Vec<u8>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    pub address: Vec<u8>,
    pub identifier: Vec<u8>,
    pub topics: Vec<Vec<u8>>,
    pub data: Vec<u8>,
}

/// Post-block state of an altered account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountBalanceUpdate {
    pub address: Vec<u8>,
    pub balance: Vec<u8>,
    pub nonce: i64,
    /// `None` when the account holds no tokens; never `Some(vec![])`.
    pub tokens: Option<Vec<AccountTokenData>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountTokenData {
    pub nonce: i64,
    pub identifier: String,
    pub balance: Vec<u8>,
    pub properties: String,
}

/// Epoch-start economics. All-empty on blocks that do not start an epoch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpochStartInfo {
    pub total_supply: Vec<u8>,
    pub total_to_distribute: Vec<u8>,
    pub total_newly_minted: Vec<u8>,
    pub rewards_per_block: Vec<u8>,
    pub rewards_for_protocol_sustainability: Vec<u8>,
    pub node_price: Vec<u8>,
    pub prev_epoch_start_round: i64,
    pub prev_epoch_start_hash: Vec<u8>,
}
