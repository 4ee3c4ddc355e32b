//! Conversions between canonical records and [`Datum`] trees.

use arrow_schema::Fields;

use super::schema;
use super::wire::Datum;
use crate::error::CodecError;
use crate::model::{
    AccountBalanceUpdate, AccountTokenData, EpochStartInfo, Event, HyperBlock, Log, Receipt,
    ShardBlock, SmartContractResult, Transaction,
};

/// A canonical record with a statically declared schema.
pub trait Record: Sized {
    /// Record name, used as the root of error paths.
    const NAME: &'static str;

    /// Declared fields, in wire order.
    fn fields() -> &'static Fields;

    /// Field values in the order of [`Record::fields`].
    fn to_datum(&self) -> Datum;

    /// Rebuild the record from a decoded value tree.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::SchemaViolation`] if the tree does not have the
    /// shape of this record.
    fn from_datum(datum: Datum) -> Result<Self, CodecError>;
}

fn bytes(value: &[u8]) -> Datum {
    Datum::Bytes(value.to_vec())
}

fn optional_bytes(value: Option<&Vec<u8>>) -> Datum {
    value.map_or(Datum::Null, |v| bytes(v))
}

fn string(value: &str) -> Datum {
    Datum::String(value.to_owned())
}

fn records<R: Record>(items: &[R]) -> Datum {
    Datum::Array(items.iter().map(Record::to_datum).collect())
}

fn byte_list(items: &[Vec<u8>]) -> Datum {
    Datum::Array(items.iter().map(|item| bytes(item)).collect())
}

/// Pulls field values off a decoded record in declaration order.
struct FieldReader {
    record: &'static str,
    values: std::vec::IntoIter<Datum>,
}

impl FieldReader {
    fn new<R: Record>(datum: Datum) -> Result<Self, CodecError> {
        match datum {
            Datum::Record(values) => Ok(Self {
                record: R::NAME,
                values: values.into_iter(),
            }),
            other => Err(CodecError::violation(
                R::NAME,
                format!("expected record, found {}", other.kind()),
            )),
        }
    }

    fn unexpected(&self, expected: &str, found: &Datum) -> CodecError {
        CodecError::violation(
            self.record,
            format!("expected {expected}, found {}", found.kind()),
        )
    }

    fn next(&mut self) -> Result<Datum, CodecError> {
        self.values
            .next()
            .ok_or_else(|| CodecError::violation(self.record, "too few fields"))
    }

    fn bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        match self.next()? {
            Datum::Bytes(value) => Ok(value),
            other => Err(self.unexpected("bytes", &other)),
        }
    }

    fn optional_bytes(&mut self) -> Result<Option<Vec<u8>>, CodecError> {
        match self.next()? {
            Datum::Null => Ok(None),
            Datum::Bytes(value) => Ok(Some(value)),
            other => Err(self.unexpected("null or bytes", &other)),
        }
    }

    fn long(&mut self) -> Result<i64, CodecError> {
        match self.next()? {
            Datum::Long(value) => Ok(value),
            other => Err(self.unexpected("long", &other)),
        }
    }

    fn int(&mut self) -> Result<i32, CodecError> {
        match self.next()? {
            Datum::Int(value) => Ok(value),
            other => Err(self.unexpected("int", &other)),
        }
    }

    fn string(&mut self) -> Result<String, CodecError> {
        match self.next()? {
            Datum::String(value) => Ok(value),
            other => Err(self.unexpected("string", &other)),
        }
    }

    fn record<R: Record>(&mut self) -> Result<R, CodecError> {
        R::from_datum(self.next()?)
    }

    fn array(&mut self) -> Result<Vec<Datum>, CodecError> {
        match self.next()? {
            Datum::Array(items) => Ok(items),
            other => Err(self.unexpected("array", &other)),
        }
    }

    fn records<R: Record>(&mut self) -> Result<Vec<R>, CodecError> {
        self.array()?.into_iter().map(R::from_datum).collect()
    }

    fn optional_records<R: Record>(&mut self) -> Result<Option<Vec<R>>, CodecError> {
        match self.next()? {
            Datum::Null => Ok(None),
            Datum::Array(items) => items
                .into_iter()
                .map(R::from_datum)
                .collect::<Result<_, _>>()
                .map(Some),
            other => Err(self.unexpected("null or array", &other)),
        }
    }

    fn byte_list(&mut self) -> Result<Vec<Vec<u8>>, CodecError> {
        self.array()?
            .into_iter()
            .map(|item| match item {
                Datum::Bytes(value) => Ok(value),
                other => Err(self.unexpected("bytes", &other)),
            })
            .collect()
    }

    /// Wrap up a record, rejecting leftover values.
    fn finish<R>(self, record: R) -> Result<R, CodecError> {
        match self.values.len() {
            0 => Ok(record),
            extra => Err(CodecError::violation(
                self.record,
                format!("{extra} unexpected trailing fields"),
            )),
        }
    }
}

impl Record for Event {
    const NAME: &'static str = "Event";

    fn fields() -> &'static Fields {
        &schema::EVENT
    }

    fn to_datum(&self) -> Datum {
        Datum::Record(vec![
            bytes(&self.address),
            bytes(&self.identifier),
            byte_list(&self.topics),
            bytes(&self.data),
        ])
    }

    fn from_datum(datum: Datum) -> Result<Self, CodecError> {
        let mut r = FieldReader::new::<Self>(datum)?;
        let event = Self {
            address: r.bytes()?,
            identifier: r.bytes()?,
            topics: r.byte_list()?,
            data: r.bytes()?,
        };
        r.finish(event)
    }
}

impl Record for Log {
    const NAME: &'static str = "Log";

    fn fields() -> &'static Fields {
        &schema::LOG
    }

    fn to_datum(&self) -> Datum {
        Datum::Record(vec![bytes(&self.address), records(&self.events)])
    }

    fn from_datum(datum: Datum) -> Result<Self, CodecError> {
        let mut r = FieldReader::new::<Self>(datum)?;
        let log = Self {
            address: r.bytes()?,
            events: r.records()?,
        };
        r.finish(log)
    }
}

impl Record for Receipt {
    const NAME: &'static str = "Receipt";

    fn fields() -> &'static Fields {
        &schema::RECEIPT
    }

    fn to_datum(&self) -> Datum {
        Datum::Record(vec![
            bytes(&self.tx_hash),
            bytes(&self.value),
            bytes(&self.sender),
            bytes(&self.data),
        ])
    }

    fn from_datum(datum: Datum) -> Result<Self, CodecError> {
        let mut r = FieldReader::new::<Self>(datum)?;
        let receipt = Self {
            tx_hash: r.bytes()?,
            value: r.bytes()?,
            sender: r.bytes()?,
            data: r.bytes()?,
        };
        r.finish(receipt)
    }
}

impl Record for SmartContractResult {
    const NAME: &'static str = "SmartContractResult";

    fn fields() -> &'static Fields {
        &schema::SMART_CONTRACT_RESULT
    }

    fn to_datum(&self) -> Datum {
        Datum::Record(vec![
            bytes(&self.hash),
            Datum::Long(self.nonce),
            Datum::Long(self.gas_limit),
            Datum::Long(self.gas_price),
            bytes(&self.value),
            bytes(&self.sender),
            bytes(&self.receiver),
            optional_bytes(self.relayer.as_ref()),
            bytes(&self.relayed_value),
            bytes(&self.data),
            bytes(&self.prev_tx_hash),
            bytes(&self.original_tx_hash),
            string(&self.call_type),
            string(&self.return_message),
            Datum::Long(self.timestamp),
            self.log.to_datum(),
        ])
    }

    fn from_datum(datum: Datum) -> Result<Self, CodecError> {
        let mut r = FieldReader::new::<Self>(datum)?;
        let result = Self {
            hash: r.bytes()?,
            nonce: r.long()?,
            gas_limit: r.long()?,
            gas_price: r.long()?,
            value: r.bytes()?,
            sender: r.bytes()?,
            receiver: r.bytes()?,
            relayer: r.optional_bytes()?,
            relayed_value: r.bytes()?,
            data: r.bytes()?,
            prev_tx_hash: r.bytes()?,
            original_tx_hash: r.bytes()?,
            call_type: r.string()?,
            return_message: r.string()?,
            timestamp: r.long()?,
            log: r.record()?,
        };
        r.finish(result)
    }
}

impl Record for Transaction {
    const NAME: &'static str = "Transaction";

    fn fields() -> &'static Fields {
        &schema::TRANSACTION
    }

    fn to_datum(&self) -> Datum {
        Datum::Record(vec![
            bytes(&self.hash),
            string(&self.transaction_type),
            Datum::Long(self.nonce),
            Datum::Long(self.round),
            bytes(&self.value),
            bytes(&self.receiver),
            bytes(&self.sender),
            Datum::Int(self.sender_shard),
            Datum::Int(self.receiver_shard),
            Datum::Long(self.gas_price),
            Datum::Long(self.gas_limit),
            Datum::Long(self.gas_used),
            bytes(&self.data),
            optional_bytes(self.signature.as_ref()),
            Datum::Long(self.timestamp),
            bytes(&self.initially_paid_fee),
            bytes(&self.fee),
            optional_bytes(self.relayer.as_ref()),
            bytes(&self.relayed_value),
            self.log.to_datum(),
        ])
    }

    fn from_datum(datum: Datum) -> Result<Self, CodecError> {
        let mut r = FieldReader::new::<Self>(datum)?;
        let tx = Self {
            hash: r.bytes()?,
            transaction_type: r.string()?,
            nonce: r.long()?,
            round: r.long()?,
            value: r.bytes()?,
            receiver: r.bytes()?,
            sender: r.bytes()?,
            sender_shard: r.int()?,
            receiver_shard: r.int()?,
            gas_price: r.long()?,
            gas_limit: r.long()?,
            gas_used: r.long()?,
            data: r.bytes()?,
            signature: r.optional_bytes()?,
            timestamp: r.long()?,
            initially_paid_fee: r.bytes()?,
            fee: r.bytes()?,
            relayer: r.optional_bytes()?,
            relayed_value: r.bytes()?,
            log: r.record()?,
        };
        r.finish(tx)
    }
}

impl Record for ShardBlock {
    const NAME: &'static str = "ShardBlock";

    fn fields() -> &'static Fields {
        &schema::SHARD_BLOCK
    }

    fn to_datum(&self) -> Datum {
        Datum::Record(vec![
            bytes(&self.hash),
            Datum::Int(self.shard_id),
            Datum::Long(self.nonce),
            Datum::Long(self.round),
            bytes(&self.root_hash),
            byte_list(&self.mini_block_hashes),
        ])
    }

    fn from_datum(datum: Datum) -> Result<Self, CodecError> {
        let mut r = FieldReader::new::<Self>(datum)?;
        let block = Self {
            hash: r.bytes()?,
            shard_id: r.int()?,
            nonce: r.long()?,
            round: r.long()?,
            root_hash: r.bytes()?,
            mini_block_hashes: r.byte_list()?,
        };
        r.finish(block)
    }
}

impl Record for AccountTokenData {
    const NAME: &'static str = "AccountTokenData";

    fn fields() -> &'static Fields {
        &schema::ACCOUNT_TOKEN_DATA
    }

    fn to_datum(&self) -> Datum {
        Datum::Record(vec![
            Datum::Long(self.nonce),
            string(&self.identifier),
            bytes(&self.balance),
            string(&self.properties),
        ])
    }

    fn from_datum(datum: Datum) -> Result<Self, CodecError> {
        let mut r = FieldReader::new::<Self>(datum)?;
        let token = Self {
            nonce: r.long()?,
            identifier: r.string()?,
            balance: r.bytes()?,
            properties: r.string()?,
        };
        r.finish(token)
    }
}

impl Record for AccountBalanceUpdate {
    const NAME: &'static str = "AccountBalanceUpdate";

    fn fields() -> &'static Fields {
        &schema::ACCOUNT_BALANCE_UPDATE
    }

    fn to_datum(&self) -> Datum {
        Datum::Record(vec![
            bytes(&self.address),
            bytes(&self.balance),
            Datum::Long(self.nonce),
            self.tokens.as_deref().map_or(Datum::Null, records),
        ])
    }

    fn from_datum(datum: Datum) -> Result<Self, CodecError> {
        let mut r = FieldReader::new::<Self>(datum)?;
        let update = Self {
            address: r.bytes()?,
            balance: r.bytes()?,
            nonce: r.long()?,
            tokens: r.optional_records()?,
        };
        r.finish(update)
    }
}

impl Record for EpochStartInfo {
    const NAME: &'static str = "EpochStartInfo";

    fn fields() -> &'static Fields {
        &schema::EPOCH_START_INFO
    }

    fn to_datum(&self) -> Datum {
        Datum::Record(vec![
            bytes(&self.total_supply),
            bytes(&self.total_to_distribute),
            bytes(&self.total_newly_minted),
            bytes(&self.rewards_per_block),
            bytes(&self.rewards_for_protocol_sustainability),
            bytes(&self.node_price),
            Datum::Long(self.prev_epoch_start_round),
            bytes(&self.prev_epoch_start_hash),
        ])
    }

    fn from_datum(datum: Datum) -> Result<Self, CodecError> {
        let mut r = FieldReader::new::<Self>(datum)?;
        let info = Self {
            total_supply: r.bytes()?,
            total_to_distribute: r.bytes()?,
            total_newly_minted: r.bytes()?,
            rewards_per_block: r.bytes()?,
            rewards_for_protocol_sustainability: r.bytes()?,
            node_price: r.bytes()?,
            prev_epoch_start_round: r.long()?,
            prev_epoch_start_hash: r.bytes()?,
        };
        r.finish(info)
    }
}

impl Record for HyperBlock {
    const NAME: &'static str = "HyperBlock";

    fn fields() -> &'static Fields {
        schema::HYPERBLOCK_SCHEMA.fields()
    }

    fn to_datum(&self) -> Datum {
        Datum::Record(vec![
            bytes(&self.hash),
            bytes(&self.prev_block_hash),
            bytes(&self.state_root_hash),
            Datum::Long(self.nonce),
            Datum::Long(self.round),
            Datum::Int(self.epoch),
            records(&self.shard_blocks),
            records(&self.transactions),
            records(&self.sc_results),
            records(&self.receipts),
            records(&self.state_changes),
            bytes(&self.accumulated_fees),
            bytes(&self.developer_fees),
            bytes(&self.accumulated_fees_in_epoch),
            bytes(&self.developer_fees_in_epoch),
            Datum::Long(self.timestamp),
            self.epoch_start_info.to_datum(),
            string(&self.status),
        ])
    }

    fn from_datum(datum: Datum) -> Result<Self, CodecError> {
        let mut r = FieldReader::new::<Self>(datum)?;
        let block = Self {
            hash: r.bytes()?,
            prev_block_hash: r.bytes()?,
            state_root_hash: r.bytes()?,
            nonce: r.long()?,
            round: r.long()?,
            epoch: r.int()?,
            shard_blocks: r.records()?,
            transactions: r.records()?,
            sc_results: r.records()?,
            receipts: r.records()?,
            state_changes: r.records()?,
            accumulated_fees: r.bytes()?,
            developer_fees: r.bytes()?,
            accumulated_fees_in_epoch: r.bytes()?,
            developer_fees_in_epoch: r.bytes()?,
            timestamp: r.long()?,
            epoch_start_info: r.record()?,
            status: r.string()?,
        };
        r.finish(block)
    }
}
