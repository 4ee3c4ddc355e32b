//! Proxy hyperblock → canonical record mapping.
//!
//! The mapping is pure and order-preserving. It either produces a complete
//! [`HyperBlock`] or fails with a [`MapError`] naming the offending field;
//! there is no partial output. `null` list elements are skipped, except for
//! the single epoch-start slot, which falls back to a zero-valued record.

mod accounts;
mod fields;
mod transactions;

pub use accounts::map_altered_accounts;
pub use transactions::{MappedTransactions, TransactionItem, map_log, map_transactions};

use crate::api::{ApiEpochStartInfo, ApiHyperBlock, ApiShardBlock};
use crate::error::MapError;
use crate::model::{EpochStartInfo, HyperBlock, ShardBlock};

/// Map a proxy hyperblock into its canonical record.
///
/// # Errors
///
/// Returns the first [`MapError`] raised by any nested mapping.
pub fn map_hyperblock(raw: &ApiHyperBlock) -> Result<HyperBlock, MapError> {
    let mut state_changes = Vec::new();
    for block in raw.shard_blocks.iter().flatten() {
        state_changes.extend(map_altered_accounts(&block.altered_accounts)?);
    }
    let MappedTransactions {
        transactions,
        sc_results,
        receipts,
    } = map_transactions(&raw.transactions)?;

    Ok(HyperBlock {
        hash: fields::hash("hash", &raw.hash)?,
        prev_block_hash: fields::hash("prevBlockHash", &raw.prev_block_hash)?,
        state_root_hash: fields::hash("stateRootHash", &raw.state_root_hash)?,
        nonce: fields::long("nonce", raw.nonce)?,
        round: fields::long("round", raw.round)?,
        epoch: fields::int("epoch", raw.epoch)?,
        shard_blocks: map_shard_blocks(&raw.shard_blocks)?,
        transactions,
        sc_results,
        receipts,
        state_changes,
        accumulated_fees: fields::amount("accumulated fees", &raw.accumulated_fees)?,
        developer_fees: fields::amount("developer fees", &raw.developer_fees)?,
        accumulated_fees_in_epoch: fields::amount(
            "accumulated fees in epoch",
            &raw.accumulated_fees_in_epoch,
        )?,
        developer_fees_in_epoch: fields::amount(
            "developer fees in epoch",
            &raw.developer_fees_in_epoch,
        )?,
        timestamp: fields::long("timestamp", raw.timestamp)?,
        epoch_start_info: map_epoch_start_info(raw.epoch_start_info.as_ref())?,
        status: raw.status.clone(),
    })
}

/// Map epoch-start economics; absent info yields the zero-valued record.
///
/// # Errors
///
/// Returns [`MapError::InvalidAmount`] naming the economics field (e.g.
/// `"total supply"`) that failed to parse.
pub fn map_epoch_start_info(raw: Option<&ApiEpochStartInfo>) -> Result<EpochStartInfo, MapError> {
    let Some(info) = raw else {
        return Ok(EpochStartInfo::default());
    };
    Ok(EpochStartInfo {
        total_supply: fields::amount("total supply", &info.total_supply)?,
        total_to_distribute: fields::amount("total to distribute", &info.total_to_distribute)?,
        total_newly_minted: fields::amount("total newly minted", &info.total_newly_minted)?,
        rewards_per_block: fields::amount("rewards per block", &info.rewards_per_block)?,
        rewards_for_protocol_sustainability: fields::amount(
            "rewards for protocol sustainability",
            &info.rewards_for_protocol_sustainability,
        )?,
        node_price: fields::amount("node price", &info.node_price)?,
        prev_epoch_start_round: fields::long(
            "previous epoch start round",
            info.prev_epoch_start_round,
        )?,
        prev_epoch_start_hash: fields::optional_hash(
            "previous epoch start hash",
            &info.prev_epoch_start_hash,
        )?,
    })
}

/// Map notarized shard blocks, skipping `null` entries.
///
/// # Errors
///
/// Returns [`MapError::InvalidHash`] for malformed block or miniblock hashes.
pub fn map_shard_blocks(raw: &[Option<ApiShardBlock>]) -> Result<Vec<ShardBlock>, MapError> {
    raw.iter()
        .flatten()
        .map(|block| -> Result<ShardBlock, MapError> {
            Ok(ShardBlock {
                hash: fields::hash("shard block hash", &block.hash)?,
                shard_id: fields::int("shard", block.shard)?,
                nonce: fields::long("shard block nonce", block.nonce)?,
                round: fields::long("shard block round", block.round)?,
                root_hash: fields::optional_hash("shard block root hash", &block.root_hash)?,
                mini_block_hashes: block
                    .mini_block_hashes
                    .iter()
                    .map(|hash| fields::hash("miniblock hash", hash))
                    .collect::<Result<_, _>>()?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiAlteredAccount;

    fn hex32(byte: &str) -> String {
        byte.repeat(32)
    }

    fn raw_block() -> ApiHyperBlock {
        ApiHyperBlock {
            hash: hex32("aa"),
            prev_block_hash: hex32("bb"),
            state_root_hash: hex32("cc"),
            nonce: 42,
            round: 43,
            epoch: 2,
            accumulated_fees: "0".to_owned(),
            developer_fees: "10".to_owned(),
            status: "on-chain".to_owned(),
            ..ApiHyperBlock::default()
        }
    }

    #[test]
    fn absent_epoch_start_info_is_zero_valued() {
        let block = map_hyperblock(&raw_block()).unwrap();
        assert_eq!(block.epoch_start_info, EpochStartInfo::default(), "zero info");
        assert_eq!(block.nonce, 42, "nonce");
        assert_eq!(block.developer_fees, vec![10], "developer fees");
    }

    #[test]
    fn invalid_total_supply_is_named() {
        let info = ApiEpochStartInfo {
            total_supply: "twenty".to_owned(),
            ..ApiEpochStartInfo::default()
        };
        let err = map_epoch_start_info(Some(&info)).unwrap_err();
        assert!(err.to_string().contains("invalid total supply"), "{err}");
    }

    #[test]
    fn invalid_block_hash_aborts_mapping() {
        let mut raw = raw_block();
        raw.prev_block_hash = "1234".to_owned();
        let err = map_hyperblock(&raw).unwrap_err();
        assert!(
            matches!(err, MapError::InvalidHash { field: "prevBlockHash", .. }),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn state_changes_follow_shard_block_order() {
        let account = |n: u64| {
            Some(ApiAlteredAccount {
                address: format!("erd1{n:0>58}"),
                nonce: n,
                balance: "1".to_owned(),
                tokens: Vec::new(),
            })
        };
        let mut raw = raw_block();
        raw.shard_blocks = vec![
            Some(ApiShardBlock {
                hash: hex32("01"),
                shard: 1,
                altered_accounts: vec![account(1), account(2)],
                ..ApiShardBlock::default()
            }),
            None,
            Some(ApiShardBlock {
                hash: hex32("00"),
                shard: 0,
                mini_block_hashes: vec![hex32("0f")],
                altered_accounts: vec![account(3)],
                ..ApiShardBlock::default()
            }),
        ];

        let block = map_hyperblock(&raw).unwrap();

        let shards: Vec<i32> = block.shard_blocks.iter().map(|b| b.shard_id).collect();
        assert_eq!(shards, vec![1, 0], "shard blocks unsorted, null skipped");
        let nonces: Vec<i64> = block.state_changes.iter().map(|a| a.nonce).collect();
        assert_eq!(nonces, vec![1, 2, 3], "accounts in shard-block order");
        assert_eq!(
            block.shard_blocks[1].mini_block_hashes,
            vec![vec![0x0f; 32]],
            "miniblock hashes decoded"
        );
    }
}
