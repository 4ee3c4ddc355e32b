//! Statically declared canonical schema.
//!
//! Schemas are expressed with Arrow field descriptors: each field carries its
//! name, its wire type and its nullability. Wire types map as follows:
//!
//! | Arrow type           | Canonical meaning                        |
//! |----------------------|------------------------------------------|
//! | `FixedSizeBinary(n)` | hash (32), address (62), signature (64)  |
//! | `Binary`             | variable bytes, big integers             |
//! | `Int32` / `Int64`    | signed integers                          |
//! | `Utf8`               | string                                   |
//! | `Struct`             | nested record                            |
//! | `List`               | array                                    |
//!
//! A nullable field is a two-branch union `[null, T]`.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use arrow_schema::{DataType, Field, Fields, Schema};

use crate::model::{ADDRESS_LEN, HASH_LEN, SCHEMA_VERSION, SIGNATURE_LEN};

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    reason = "widths are small constants"
)]
const fn width(len: usize) -> DataType {
    DataType::FixedSizeBinary(len as i32)
}

fn hash(name: &str) -> Field {
    Field::new(name, width(HASH_LEN), false)
}

fn address(name: &str) -> Field {
    Field::new(name, width(ADDRESS_LEN), false)
}

fn optional_address(name: &str) -> Field {
    address(name).with_nullable(true)
}

fn bytes(name: &str) -> Field {
    Field::new(name, DataType::Binary, false)
}

fn long(name: &str) -> Field {
    Field::new(name, DataType::Int64, false)
}

fn int(name: &str) -> Field {
    Field::new(name, DataType::Int32, false)
}

fn string(name: &str) -> Field {
    Field::new(name, DataType::Utf8, false)
}

fn record(name: &str, fields: &Fields) -> Field {
    Field::new(name, DataType::Struct(fields.clone()), false)
}

fn array(name: &str, item: DataType) -> Field {
    Field::new(
        name,
        DataType::List(Arc::new(Field::new("item", item, false))),
        false,
    )
}

/// `Event` record.
pub static EVENT: LazyLock<Fields> = LazyLock::new(|| {
    Fields::from(vec![
        address("address"),
        bytes("identifier"),
        array("topics", DataType::Binary),
        bytes("data"),
    ])
});

/// `Log` record. The address is variable-length so the empty log encodes.
pub static LOG: LazyLock<Fields> = LazyLock::new(|| {
    Fields::from(vec![
        bytes("address"),
        array("events", DataType::Struct(Fields::clone(&EVENT))),
    ])
});

/// `Receipt` record.
pub static RECEIPT: LazyLock<Fields> = LazyLock::new(|| {
    Fields::from(vec![
        hash("txHash"),
        bytes("value"),
        address("sender"),
        bytes("data"),
    ])
});

/// `SmartContractResult` record.
pub static SMART_CONTRACT_RESULT: LazyLock<Fields> = LazyLock::new(|| {
    Fields::from(vec![
        hash("hash"),
        long("nonce"),
        long("gasLimit"),
        long("gasPrice"),
        bytes("value"),
        address("sender"),
        address("receiver"),
        optional_address("relayer"),
        bytes("relayedValue"),
        bytes("data"),
        hash("prevTxHash"),
        hash("originalTxHash"),
        string("callType"),
        string("returnMessage"),
        long("timestamp"),
        record("log", &LOG),
    ])
});

/// `Transaction` record.
pub static TRANSACTION: LazyLock<Fields> = LazyLock::new(|| {
    Fields::from(vec![
        hash("hash"),
        string("transactionType"),
        long("nonce"),
        long("round"),
        bytes("value"),
        address("receiver"),
        address("sender"),
        int("senderShard"),
        int("receiverShard"),
        long("gasPrice"),
        long("gasLimit"),
        long("gasUsed"),
        bytes("data"),
        Field::new("signature", width(SIGNATURE_LEN), true),
        long("timestamp"),
        bytes("initiallyPaidFee"),
        bytes("fee"),
        optional_address("relayer"),
        bytes("relayedValue"),
        record("log", &LOG),
    ])
});

/// `ShardBlock` record.
pub static SHARD_BLOCK: LazyLock<Fields> = LazyLock::new(|| {
    Fields::from(vec![
        hash("hash"),
        int("shardId"),
        long("nonce"),
        long("round"),
        bytes("rootHash"),
        array("miniBlockHashes", width(HASH_LEN)),
    ])
});

/// `AccountTokenData` record.
pub static ACCOUNT_TOKEN_DATA: LazyLock<Fields> = LazyLock::new(|| {
    Fields::from(vec![
        long("nonce"),
        string("identifier"),
        bytes("balance"),
        string("properties"),
    ])
});

/// `AccountBalanceUpdate` record.
pub static ACCOUNT_BALANCE_UPDATE: LazyLock<Fields> = LazyLock::new(|| {
    Fields::from(vec![
        address("address"),
        bytes("balance"),
        long("nonce"),
        array(
            "tokens",
            DataType::Struct(Fields::clone(&ACCOUNT_TOKEN_DATA)),
        )
        .with_nullable(true),
    ])
});

/// `EpochStartInfo` record.
pub static EPOCH_START_INFO: LazyLock<Fields> = LazyLock::new(|| {
    Fields::from(vec![
        bytes("totalSupply"),
        bytes("totalToDistribute"),
        bytes("totalNewlyMinted"),
        bytes("rewardsPerBlock"),
        bytes("rewardsForProtocolSustainability"),
        bytes("nodePrice"),
        long("prevEpochStartRound"),
        bytes("prevEpochStartHash"),
    ])
});

/// Root `HyperBlock` schema, tagged with its name and version.
pub static HYPERBLOCK_SCHEMA: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    let fields = vec![
        hash("hash"),
        hash("prevBlockHash"),
        hash("stateRootHash"),
        long("nonce"),
        long("round"),
        int("epoch"),
        array("shardBlocks", DataType::Struct(Fields::clone(&SHARD_BLOCK))),
        array("transactions", DataType::Struct(Fields::clone(&TRANSACTION))),
        array(
            "scResults",
            DataType::Struct(Fields::clone(&SMART_CONTRACT_RESULT)),
        ),
        array("receipts", DataType::Struct(Fields::clone(&RECEIPT))),
        array(
            "stateChanges",
            DataType::Struct(Fields::clone(&ACCOUNT_BALANCE_UPDATE)),
        ),
        bytes("accumulatedFees"),
        bytes("developerFees"),
        bytes("accumulatedFeesInEpoch"),
        bytes("developerFeesInEpoch"),
        long("timestamp"),
        record("epochStartInfo", &EPOCH_START_INFO),
        string("status"),
    ];
    let metadata = HashMap::from([
        ("name".to_owned(), "HyperBlock".to_owned()),
        ("version".to_owned(), SCHEMA_VERSION.to_string()),
    ]);
    Arc::new(Schema::new_with_metadata(fields, metadata))
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_widths_match_model_constants() {
        assert_eq!(
            TRANSACTION.find("hash").map(|(_, f)| f.data_type().clone()),
            Some(DataType::FixedSizeBinary(32)),
            "hash width"
        );
        assert_eq!(
            RECEIPT.find("sender").map(|(_, f)| f.data_type().clone()),
            Some(DataType::FixedSizeBinary(62)),
            "address width"
        );
        let signature = TRANSACTION.find("signature").map(|(_, f)| f.clone());
        assert_eq!(
            signature.as_ref().map(|f| f.data_type().clone()),
            Some(DataType::FixedSizeBinary(64)),
            "signature width"
        );
        assert!(
            signature.is_some_and(|f| f.is_nullable()),
            "signature is optional"
        );
    }

    #[test]
    fn root_schema_carries_version() {
        assert_eq!(
            HYPERBLOCK_SCHEMA.metadata().get("version").map(String::as_str),
            Some("2"),
            "schema version"
        );
        assert_eq!(HYPERBLOCK_SCHEMA.fields().len(), 18, "field count");
    }
}
