//! Hyperblock fetcher library.
//!
//! Retrieves hyperblocks from a proxy API by nonce, by hash or by nonce
//! interval, maps them to canonical records and returns the binary
//! encoding of each. Interval fetches run with bounded concurrency and
//! per-block retry, and always return payloads in nonce order.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod query;
pub mod retry;
pub mod transport;

pub use error::{FetchError, Target};
pub use fetcher::{BatchOptions, FetcherConfig, HyperBlockFetcher, NonceInterval};
pub use query::HyperBlockQueryOptions;
pub use retry::RetryConfig;
pub use transport::{HttpTransport, RawResponse, Transport, TransportError};
