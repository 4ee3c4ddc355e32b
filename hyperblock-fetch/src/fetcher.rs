//! Hyperblock retrieval with per-block retry and bounded concurrency.
//!
//! Every fetch runs the full pipeline for one block:
//! 1. `GET` the hyperblock endpoint through the [`Transport`].
//! 2. Unwrap the proxy envelope and map the block to its canonical record.
//! 3. Encode the record with the binary schema codec.
//!
//! Any retryable failure restarts the pipeline for that block, up to
//! [`RetryConfig::max_attempts`]. Interval fetches run one task per nonce
//! with at most `batch_size` in flight and return payloads in nonce order.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::hex;
use hyperblock::api::HyperBlockData;
use hyperblock::codec::encode_hyperblock;
use hyperblock::mapper::map_hyperblock;
use hyperblock::model::HASH_LEN;
use tokio::task::JoinSet;

use crate::error::{FetchError, Target};
use crate::query::{HyperBlockQueryOptions, hash_path, nonce_path};
use crate::retry::RetryConfig;
use crate::transport::Transport;

/// Bytes of a non-200 body kept in [`FetchError::Status`].
const STATUS_BODY_LIMIT: usize = 256;

/// Policy shared by every fetch of a [`HyperBlockFetcher`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetcherConfig {
    /// Per-block retry policy.
    pub retry: RetryConfig,
    /// Upper bound on a whole `get_*` call, retries included.
    pub deadline: Option<Duration>,
}

/// Closed nonce range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceInterval {
    /// First nonce, inclusive.
    pub start: u64,
    /// Last nonce, inclusive.
    pub end: u64,
}

impl NonceInterval {
    /// Create an interval; validated when fetched.
    #[must_use]
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

/// Options of an interval fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum number of blocks fetched concurrently.
    pub batch_size: usize,
    /// Options applied to every block.
    pub query: HyperBlockQueryOptions,
}

/// Fetches hyperblocks and returns their encoded canonical records.
#[derive(Debug)]
pub struct HyperBlockFetcher<T> {
    transport: Arc<T>,
    config: FetcherConfig,
}

impl<T: Transport> HyperBlockFetcher<T> {
    /// Create a fetcher over `transport`.
    #[must_use]
    pub fn new(transport: T, config: FetcherConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            config,
        }
    }

    /// The transport requests go through.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch and encode the hyperblock with the given nonce.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Exhausted`] once every attempt failed,
    /// [`FetchError::Failed`] on an error no retry can fix (a record that
    /// does not encode), and
    /// [`FetchError::DeadlineExceeded`] if the deadline expires first.
    pub async fn get_by_nonce(
        &self,
        nonce: u64,
        query: &HyperBlockQueryOptions,
    ) -> Result<Vec<u8>, FetchError> {
        let path = nonce_path(nonce, query);
        let target = Target::Nonce(nonce);
        self.with_deadline(fetch_with_retry(
            &*self.transport,
            &self.config.retry,
            &target,
            &path,
        ))
        .await
    }

    /// Fetch and encode the hyperblock with the given hex hash.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidHash`] without any request if `hash` is
    /// not 64 hex characters, otherwise as [`Self::get_by_nonce`].
    pub async fn get_by_hash(
        &self,
        hash: &str,
        query: &HyperBlockQueryOptions,
    ) -> Result<Vec<u8>, FetchError> {
        if !is_block_hash(hash) {
            return Err(FetchError::InvalidHash {
                hash: hash.to_owned(),
            });
        }
        let path = hash_path(hash, query);
        let target = Target::Hash(hash.to_owned());
        self.with_deadline(fetch_with_retry(
            &*self.transport,
            &self.config.retry,
            &target,
            &path,
        ))
        .await
    }

    /// Fetch and encode every hyperblock in `interval`, in nonce order.
    ///
    /// The first block to fail definitively stops dispatch, aborts the
    /// blocks still in flight, and fails the whole call.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidInterval`] or
    /// [`FetchError::InvalidBatchSize`] without any request, and
    /// [`FetchError::Batch`] wrapping the first block failure.
    pub async fn get_by_interval(
        &self,
        interval: NonceInterval,
        options: &BatchOptions,
    ) -> Result<Vec<Vec<u8>>, FetchError> {
        let NonceInterval { start, end } = interval;
        if start > end {
            return Err(FetchError::InvalidInterval { start, end });
        }
        if options.batch_size == 0 {
            return Err(FetchError::InvalidBatchSize);
        }
        self.with_deadline(self.fetch_interval(start, end, options))
            .await
    }

    /// Completed payloads are keyed by nonce, so memory grows with the
    /// blocks fetched rather than the width of the interval.
    async fn fetch_interval(
        &self,
        start: u64,
        end: u64,
        options: &BatchOptions,
    ) -> Result<Vec<Vec<u8>>, FetchError> {
        tracing::info!(start, end, batch_size = options.batch_size, "fetching hyperblocks");

        let mut payloads = BTreeMap::new();
        let mut first_error: Option<FetchError> = None;
        let mut nonces = start..=end;
        let mut tasks = JoinSet::new();

        loop {
            while first_error.is_none() && tasks.len() < options.batch_size {
                let Some(nonce) = nonces.next() else { break };
                let transport = Arc::clone(&self.transport);
                let retry = self.config.retry.clone();
                let path = nonce_path(nonce, &options.query);
                tasks.spawn(async move {
                    let target = Target::Nonce(nonce);
                    let result = fetch_with_retry(&*transport, &retry, &target, &path).await;
                    (nonce, result)
                });
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            match joined {
                Ok((nonce, Ok(payload))) => {
                    payloads.insert(nonce, payload);
                }
                Ok((_, Err(err))) => {
                    if first_error.is_none() {
                        tasks.abort_all();
                        first_error = Some(err);
                    }
                }
                Err(err) if err.is_cancelled() => {}
                Err(err) => {
                    if first_error.is_none() {
                        tasks.abort_all();
                        first_error = Some(FetchError::Task(err));
                    }
                }
            }
        }

        if let Some(err) = first_error {
            tracing::error!(start, end, error = %err, "hyperblock interval failed");
            return Err(FetchError::Batch(Box::new(err)));
        }
        tracing::info!(start, end, blocks = payloads.len(), "fetched hyperblocks");
        Ok(payloads.into_values().collect())
    }

    async fn with_deadline<R>(
        &self,
        fetch: impl Future<Output = Result<R, FetchError>>,
    ) -> Result<R, FetchError> {
        match self.config.deadline {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| FetchError::DeadlineExceeded(limit))?,
            None => fetch.await,
        }
    }
}

/// Exactly 64 hex characters, without a `0x` prefix.
fn is_block_hash(hash: &str) -> bool {
    !hash.starts_with("0x") && hex::decode(hash).is_ok_and(|bytes| bytes.len() == HASH_LEN)
}

/// Run the fetch pipeline for one block until it succeeds, fails with a
/// non-retryable error, or runs out of attempts.
async fn fetch_with_retry<T: Transport>(
    transport: &T,
    retry: &RetryConfig,
    target: &Target,
    path: &str,
) -> Result<Vec<u8>, FetchError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        tracing::debug!(%target, attempt, "fetching hyperblock");
        let err = match fetch_once(transport, path).await {
            Ok(payload) => return Ok(payload),
            Err(err) if !err.is_retryable() => {
                tracing::error!(%target, attempt, error = %err, "hyperblock failed");
                return Err(FetchError::Failed {
                    target: target.clone(),
                    attempts: attempt,
                    source: Box::new(err),
                });
            }
            Err(err) => err,
        };
        match retry.next_delay(attempt) {
            Some(delay) => {
                tracing::warn!(
                    %target,
                    attempt,
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "retrying hyperblock"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            None => {
                tracing::error!(%target, attempts = attempt, error = %err, "giving up on hyperblock");
                return Err(FetchError::Exhausted {
                    target: target.clone(),
                    attempts: attempt,
                    source: Box::new(err),
                });
            }
        }
    }
}

async fn fetch_once<T: Transport>(transport: &T, path: &str) -> Result<Vec<u8>, FetchError> {
    let response = transport.fetch_raw(path).await?;
    if !response.is_ok() {
        return Err(FetchError::Status {
            status: response.status,
            body: String::from_utf8_lossy(&response.body)
                .chars()
                .take(STATUS_BODY_LIMIT)
                .collect(),
        });
    }
    let raw = HyperBlockData::from_response_body(&response.body)?;
    let block = map_hyperblock(&raw)?;
    Ok(encode_hyperblock(&block)?)
}
