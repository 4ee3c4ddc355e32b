//! Fetcher behavior against an in-memory proxy.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use hyperblock::codec::decode_hyperblock;
use hyperblock_fetch::{
    BatchOptions, FetchError, FetcherConfig, HyperBlockFetcher, HyperBlockQueryOptions,
    NonceInterval, RawResponse, RetryConfig, Target, Transport, TransportError,
};
use serde_json::{Value, json};

type Responder = Box<dyn Fn(u64, u32) -> Result<RawResponse, TransportError> + Send + Sync>;

/// Proxy stub that counts attempts per path and tracks peak concurrency.
struct StubProxy {
    respond: Responder,
    delay: Duration,
    attempts: Mutex<HashMap<String, u32>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubProxy {
    fn new(
        respond: impl Fn(u64, u32) -> Result<RawResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            delay: Duration::ZERO,
            attempts: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn attempts(&self, path: &str) -> u32 {
        self.attempts.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.lock().unwrap().values().sum()
    }
}

impl Transport for StubProxy {
    async fn fetch_raw(&self, path: &str) -> Result<RawResponse, TransportError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let count = attempts.entry(path.to_owned()).or_default();
            *count += 1;
            *count
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let nonce = path
            .trim_start_matches("hyperblock/by-nonce/")
            .split('?')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        (self.respond)(nonce, attempt)
    }
}

fn hash_hex(nonce: u64, salt: u8) -> String {
    format!("{salt:02x}{nonce:062x}")
}

fn block_json(nonce: u64) -> Value {
    json!({
        "hash": hash_hex(nonce, 0xaa),
        "prevBlockHash": hash_hex(nonce.saturating_sub(1), 0xaa),
        "stateRootHash": hash_hex(nonce, 0x5e),
        "nonce": nonce,
        "round": nonce + 1,
        "epoch": 1,
        "accumulatedFees": "1000",
        "developerFees": "0",
        "timestamp": 1_700_000_000_u64 + nonce * 6,
        "status": "on-chain",
        "shardBlocks": [],
        "transactions": [],
    })
}

fn envelope(block: &Value) -> RawResponse {
    RawResponse::ok(
        serde_json::to_vec(&json!({
            "data": { "hyperblock": block },
            "error": "",
            "code": "successful",
        }))
        .unwrap(),
    )
}

fn ok_block(nonce: u64) -> Result<RawResponse, TransportError> {
    Ok(envelope(&block_json(nonce)))
}

fn unavailable() -> Result<RawResponse, TransportError> {
    Ok(RawResponse {
        status: 503,
        body: b"service unavailable".to_vec(),
    })
}

fn fetcher(stub: StubProxy) -> HyperBlockFetcher<StubProxy> {
    HyperBlockFetcher::new(
        stub,
        FetcherConfig {
            retry: RetryConfig::immediate(),
            deadline: None,
        },
    )
}

fn batch(batch_size: usize) -> BatchOptions {
    BatchOptions {
        batch_size,
        query: HyperBlockQueryOptions::default(),
    }
}

fn by_nonce(nonce: u64) -> String {
    format!("hyperblock/by-nonce/{nonce}")
}

#[tokio::test]
async fn reversed_interval_is_rejected_without_requests() {
    let fetcher = fetcher(StubProxy::new(|nonce, _| ok_block(nonce)));
    let err = fetcher
        .get_by_interval(NonceInterval::new(5, 4), &batch(2))
        .await
        .unwrap_err();
    assert!(
        matches!(err, FetchError::InvalidInterval { start: 5, end: 4 }),
        "{err}"
    );
    assert_eq!(fetcher.transport().total_attempts(), 0, "no requests");
}

#[tokio::test]
async fn zero_batch_size_is_rejected_without_requests() {
    let fetcher = fetcher(StubProxy::new(|nonce, _| ok_block(nonce)));
    let err = fetcher
        .get_by_interval(NonceInterval::new(1, 1), &batch(0))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidBatchSize), "{err}");
    assert_eq!(fetcher.transport().total_attempts(), 0, "no requests");
}

#[tokio::test]
async fn flaky_blocks_succeed_on_tenth_attempt_in_nonce_order() {
    let fetcher = fetcher(StubProxy::new(|nonce, attempt| {
        if attempt < 10 {
            unavailable()
        } else {
            ok_block(nonce)
        }
    }));

    let payloads = fetcher
        .get_by_interval(NonceInterval::new(100, 107), &batch(3))
        .await
        .unwrap();

    assert_eq!(payloads.len(), 8, "one payload per nonce");
    let nonces: Vec<i64> = payloads
        .iter()
        .map(|payload| decode_hyperblock(payload).unwrap().nonce)
        .collect();
    assert_eq!(nonces, (100..=107).collect::<Vec<_>>(), "nonce order");
    for nonce in 100..=107 {
        assert_eq!(
            fetcher.transport().attempts(&by_nonce(nonce)),
            10,
            "attempts for nonce {nonce}"
        );
    }
}

#[tokio::test]
async fn one_failing_nonce_fails_the_whole_interval() {
    let fetcher = fetcher(StubProxy::new(|nonce, _| {
        if nonce == 4 { unavailable() } else { ok_block(nonce) }
    }));

    let err = fetcher
        .get_by_interval(NonceInterval::new(1, 8), &batch(2))
        .await
        .unwrap_err();

    let FetchError::Batch(inner) = &err else {
        panic!("expected a batch error, got {err}");
    };
    assert!(
        matches!(
            inner.as_ref(),
            FetchError::Exhausted {
                target: Target::Nonce(4),
                attempts: 10,
                ..
            }
        ),
        "{inner}"
    );
    let message = err.to_string();
    assert!(message.contains("one or more errors occurred"), "{message}");
    assert!(message.contains("nonce 4"), "{message}");
    assert_eq!(fetcher.transport().attempts(&by_nonce(4)), 10, "retry ceiling");
}

#[tokio::test]
async fn in_flight_requests_never_exceed_batch_size() {
    let fetcher = fetcher(StubProxy::new(|nonce, _| ok_block(nonce)));

    let payloads = fetcher
        .get_by_interval(NonceInterval::new(0, 29), &batch(4))
        .await
        .unwrap();

    assert_eq!(payloads.len(), 30, "all blocks fetched");
    let peak = fetcher.transport().max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 4, "peak concurrency {peak} exceeds batch size");
    assert!(peak > 1, "requests ran concurrently");
}

#[tokio::test]
async fn mapping_errors_are_retried_and_reported() {
    let fetcher = fetcher(StubProxy::new(|nonce, _| {
        let mut block = block_json(nonce);
        block["shardBlocks"] = json!([{
            "hash": hash_hex(nonce, 0x01),
            "alteredAccounts": [{ "address": "erd1", "balance": "lots" }],
        }]);
        Ok(envelope(&block))
    }));

    let err = fetcher
        .get_by_nonce(9, &HyperBlockQueryOptions::default())
        .await
        .unwrap_err();

    assert!(
        matches!(
            &err,
            FetchError::Exhausted { source, attempts: 10, .. }
                if matches!(source.as_ref(), FetchError::Mapping(_))
        ),
        "{err}"
    );
    let message = err.to_string();
    assert!(message.contains("invalid") && message.contains("balance"), "{message}");
    assert_eq!(fetcher.transport().attempts(&by_nonce(9)), 10, "retried");
}

#[tokio::test]
async fn proxy_error_envelopes_are_retried() {
    let fetcher = fetcher(StubProxy::new(|nonce, attempt| {
        if attempt == 1 {
            Ok(RawResponse::ok(
                br#"{"data":null,"error":"node is syncing","code":"internal_issue"}"#.to_vec(),
            ))
        } else {
            ok_block(nonce)
        }
    }));

    let payload = fetcher
        .get_by_nonce(3, &HyperBlockQueryOptions::default())
        .await
        .unwrap();

    assert_eq!(decode_hyperblock(&payload).unwrap().nonce, 3);
    assert_eq!(fetcher.transport().attempts(&by_nonce(3)), 2, "one retry");
}

fn unencodable_block(nonce: u64) -> Result<RawResponse, TransportError> {
    let mut block = block_json(nonce);
    block["transactions"] = json!([{
        "type": "normal",
        "hash": hash_hex(nonce, 0x10),
        "sender": "erd1short",
        "receiver": "erd1short",
    }]);
    Ok(envelope(&block))
}

#[tokio::test]
async fn codec_errors_are_not_retried() {
    let fetcher = fetcher(StubProxy::new(|nonce, _| unencodable_block(nonce)));

    let err = fetcher
        .get_by_nonce(5, &HyperBlockQueryOptions::default())
        .await
        .unwrap_err();

    let FetchError::Failed {
        target: Target::Nonce(5),
        attempts: 1,
        source,
    } = &err
    else {
        panic!("expected a failed nonce 5, got {err}");
    };
    let FetchError::Codec(codec) = source.as_ref() else {
        panic!("expected a codec error, got {source}");
    };
    assert!(codec.is_schema_violation(), "{codec}");
    assert!(err.to_string().contains("nonce 5"), "{err}");
    assert_eq!(fetcher.transport().attempts(&by_nonce(5)), 1, "no retry");
}

#[tokio::test]
async fn codec_failure_in_interval_names_the_nonce() {
    let fetcher = fetcher(StubProxy::new(|nonce, _| {
        if nonce == 3 { unencodable_block(nonce) } else { ok_block(nonce) }
    }));

    let err = fetcher
        .get_by_interval(NonceInterval::new(1, 5), &batch(2))
        .await
        .unwrap_err();

    assert_eq!(err.target(), Some(&Target::Nonce(3)), "{err}");
    let message = err.to_string();
    assert!(message.contains("nonce 3"), "{message}");
    assert!(message.contains("HyperBlock.transactions[0]"), "{message}");
    assert_eq!(fetcher.transport().attempts(&by_nonce(3)), 1, "no retry");
}

#[tokio::test]
async fn very_wide_interval_fetches_lazily() {
    let fetcher = fetcher(StubProxy::new(|nonce, _| {
        if nonce == 2 { unavailable() } else { ok_block(nonce) }
    }));

    let err = fetcher
        .get_by_interval(NonceInterval::new(0, u64::MAX / 4), &batch(1))
        .await
        .unwrap_err();

    assert_eq!(err.target(), Some(&Target::Nonce(2)), "{err}");
    assert_eq!(fetcher.transport().attempts(&by_nonce(3)), 0, "dispatch stopped");
}

#[tokio::test]
async fn transport_failures_are_retried() {
    let fetcher = fetcher(StubProxy::new(|nonce, attempt| {
        if attempt < 3 {
            Err(TransportError::Other("connection reset".to_owned()))
        } else {
            ok_block(nonce)
        }
    }));

    fetcher
        .get_by_nonce(11, &HyperBlockQueryOptions::default())
        .await
        .unwrap();
    assert_eq!(fetcher.transport().attempts(&by_nonce(11)), 3, "attempts");
}

#[tokio::test]
async fn malformed_hash_is_rejected_without_requests() {
    let fetcher = fetcher(StubProxy::new(|nonce, _| ok_block(nonce)));
    let malformed = [
        "abc".to_owned(),
        "zz".repeat(32),
        format!("0x{}", "ab".repeat(31)),
    ];
    for hash in &malformed {
        let err = fetcher
            .get_by_hash(hash, &HyperBlockQueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidHash { .. }), "{err}");
    }
    assert_eq!(fetcher.transport().total_attempts(), 0, "no requests");
}

#[tokio::test]
async fn hash_requests_carry_query_options() {
    let fetcher = fetcher(StubProxy::new(|_, _| ok_block(77)));
    let hash = hash_hex(77, 0xaa);
    let query = HyperBlockQueryOptions {
        with_logs: true,
        ..HyperBlockQueryOptions::default()
    };

    let payload = fetcher.get_by_hash(&hash, &query).await.unwrap();

    assert_eq!(decode_hyperblock(&payload).unwrap().nonce, 77);
    let path = format!("hyperblock/by-hash/{hash}?withLogs=true");
    assert_eq!(fetcher.transport().attempts(&path), 1, "requested path");
}

#[tokio::test]
async fn deadline_bounds_the_whole_call() {
    let mut stub = StubProxy::new(|nonce, _| ok_block(nonce));
    stub.delay = Duration::from_secs(30);
    let fetcher = HyperBlockFetcher::new(
        stub,
        FetcherConfig {
            retry: RetryConfig::immediate(),
            deadline: Some(Duration::from_millis(20)),
        },
    );

    let err = fetcher
        .get_by_interval(NonceInterval::new(1, 4), &batch(2))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::DeadlineExceeded(_)), "{err}");
}
