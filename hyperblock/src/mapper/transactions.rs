//! Transaction, smart contract result, receipt and log mapping.

use crate::api::{ApiEvent, ApiLogs, ApiReceipt, ApiTransaction};
use crate::error::MapError;
use crate::model::{Event, Log, Receipt, SmartContractResult, Transaction};

use super::fields;

/// Proxy transaction type of smart contract results.
const UNSIGNED_TX_TYPE: &str = "unsigned";

/// A raw transaction classified by the record it produces.
///
/// Classification happens once per transaction at ingestion; the rest of
/// the mapping dispatches on the variant.
#[derive(Debug, Clone, Copy)]
pub enum TransactionItem<'a> {
    /// User, reward or invalid transaction.
    Normal(&'a ApiTransaction),
    /// Smart contract result.
    SmartContractResult(&'a ApiTransaction),
    /// Receipt attached to a transaction.
    Receipt {
        /// The receipt.
        receipt: &'a ApiReceipt,
        /// The transaction that carries it.
        parent: &'a ApiTransaction,
    },
}

impl<'a> TransactionItem<'a> {
    /// Classify a raw transaction: one item for the transaction itself,
    /// followed by one for its receipt when present.
    pub fn classify(tx: &'a ApiTransaction) -> impl Iterator<Item = Self> {
        let primary = if tx.tx_type == UNSIGNED_TX_TYPE {
            Self::SmartContractResult(tx)
        } else {
            Self::Normal(tx)
        };
        let receipt = tx
            .receipt
            .as_ref()
            .map(|receipt| Self::Receipt { receipt, parent: tx });
        std::iter::once(primary).chain(receipt)
    }
}

/// Transactions split by canonical record type, each in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedTransactions {
    /// Normal, reward and invalid transactions.
    pub transactions: Vec<Transaction>,
    /// Smart contract results.
    pub sc_results: Vec<SmartContractResult>,
    /// Receipts, one per transaction that carries one.
    pub receipts: Vec<Receipt>,
}

/// Map every non-null transaction of a hyperblock.
///
/// # Errors
///
/// Returns the first [`MapError`] encountered; no partial result is kept.
pub fn map_transactions(raw: &[Option<ApiTransaction>]) -> Result<MappedTransactions, MapError> {
    let mut mapped = MappedTransactions::default();
    for item in raw.iter().flatten().flat_map(TransactionItem::classify) {
        match item {
            TransactionItem::Normal(tx) => mapped.transactions.push(map_transaction(tx)?),
            TransactionItem::SmartContractResult(tx) => {
                mapped.sc_results.push(map_sc_result(tx)?);
            }
            TransactionItem::Receipt { receipt, parent } => {
                mapped.receipts.push(map_receipt(receipt, parent)?);
            }
        }
    }
    Ok(mapped)
}

/// Relayer address and relayed value, both left at zero unless the source
/// names a relayer.
fn relayer(tx: &ApiTransaction) -> Result<(Option<Vec<u8>>, Vec<u8>), MapError> {
    match fields::optional_address(&tx.relayer) {
        Some(relayer) => Ok((
            Some(relayer),
            fields::amount("relayed value", &tx.relayed_value)?,
        )),
        None => Ok((None, Vec::new())),
    }
}

fn map_transaction(tx: &ApiTransaction) -> Result<Transaction, MapError> {
    let (relayer, relayed_value) = relayer(tx)?;
    Ok(Transaction {
        hash: fields::hash("transaction hash", &tx.hash)?,
        transaction_type: tx.tx_type.clone(),
        nonce: fields::long("transaction nonce", tx.nonce)?,
        round: fields::long("transaction round", tx.round)?,
        value: fields::amount("transaction value", &tx.value)?,
        receiver: fields::address(&tx.receiver),
        sender: fields::address(&tx.sender),
        sender_shard: fields::int("source shard", tx.source_shard)?,
        receiver_shard: fields::int("destination shard", tx.destination_shard)?,
        gas_price: fields::long("gas price", tx.gas_price)?,
        gas_limit: fields::long("gas limit", tx.gas_limit)?,
        gas_used: fields::long("gas used", tx.gas_used)?,
        data: fields::base64("transaction data", tx.data.as_deref())?,
        signature: fields::signature(&tx.signature)?,
        timestamp: fields::long("transaction timestamp", tx.timestamp)?,
        initially_paid_fee: fields::amount("initially paid fee", &tx.initially_paid_fee)?,
        fee: fields::amount("fee", &tx.fee)?,
        relayer,
        relayed_value,
        log: map_log(tx.logs.as_ref())?,
    })
}

fn map_sc_result(tx: &ApiTransaction) -> Result<SmartContractResult, MapError> {
    let (relayer, relayed_value) = relayer(tx)?;
    Ok(SmartContractResult {
        hash: fields::hash("smart contract result hash", &tx.hash)?,
        nonce: fields::long("smart contract result nonce", tx.nonce)?,
        gas_limit: fields::long("gas limit", tx.gas_limit)?,
        gas_price: fields::long("gas price", tx.gas_price)?,
        value: fields::amount("smart contract result value", &tx.value)?,
        sender: fields::address(&tx.sender),
        receiver: fields::address(&tx.receiver),
        relayer,
        relayed_value,
        data: fields::base64("smart contract result data", tx.data.as_deref())?,
        prev_tx_hash: fields::hash("previous transaction hash", &tx.prev_tx_hash)?,
        original_tx_hash: fields::hash("original transaction hash", &tx.original_tx_hash)?,
        call_type: tx.call_type.clone(),
        return_message: tx.return_message.clone(),
        timestamp: fields::long("smart contract result timestamp", tx.timestamp)?,
        log: map_log(tx.logs.as_ref())?,
    })
}

fn map_receipt(receipt: &ApiReceipt, parent: &ApiTransaction) -> Result<Receipt, MapError> {
    let tx_hash = if receipt.tx_hash.is_empty() {
        &parent.hash
    } else {
        &receipt.tx_hash
    };
    Ok(Receipt {
        tx_hash: fields::hash("receipt transaction hash", tx_hash)?,
        value: fields::amount("receipt value", &receipt.value)?,
        sender: fields::address(&receipt.sender),
        data: receipt.data.as_bytes().to_vec(),
    })
}

/// Map transaction logs. Absent logs become the empty log; `null` events
/// are dropped.
///
/// # Errors
///
/// Returns [`MapError::InvalidField`] for topics or data that are not
/// valid base64.
pub fn map_log(logs: Option<&ApiLogs>) -> Result<Log, MapError> {
    let Some(logs) = logs else {
        return Ok(Log::default());
    };
    Ok(Log {
        address: fields::address(&logs.address),
        events: logs
            .events
            .iter()
            .flatten()
            .map(map_event)
            .collect::<Result<_, _>>()?,
    })
}

fn map_event(event: &ApiEvent) -> Result<Event, MapError> {
    Ok(Event {
        address: fields::address(&event.address),
        identifier: event.identifier.as_bytes().to_vec(),
        topics: event
            .topics
            .iter()
            .map(|topic| fields::base64("event topic", Some(topic)))
            .collect::<Result<_, _>>()?,
        data: fields::base64("event data", event.data.as_deref())?,
    })
}
