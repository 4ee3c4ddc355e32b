//! Hyperblock fetcher CLI.
//!
//! Fetches hyperblocks from a proxy API, maps them to the canonical schema
//! and prints the binary encoding of each as hex.
//!
//! # Usage
//!
//! ```bash
//! # A single block by nonce, with logs
//! hyperblock-fetch --proxy-url https://proxy.example.com --with-logs by-nonce 1000
//!
//! # A single block by hash
//! hyperblock-fetch by-hash <HASH>
//!
//! # A nonce range, 16 blocks at a time
//! hyperblock-fetch range --start 1000 --end 1099 --batch-size 16
//! ```

use std::path::PathBuf;

use alloy::primitives::hex;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hyperblock_fetch::config::Config;
use hyperblock_fetch::{
    BatchOptions, HttpTransport, HyperBlockFetcher, HyperBlockQueryOptions, NonceInterval,
};

/// Hyperblock fetcher and canonical encoder.
#[derive(Debug, Parser)]
#[command(name = "hyperblock-fetch", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Override the proxy base URL from the config.
    #[arg(long, global = true)]
    proxy_url: Option<String>,

    /// Include transaction logs.
    #[arg(long, global = true)]
    with_logs: bool,

    /// Fetch shard blocks as notarized at source.
    #[arg(long, global = true)]
    notarized_at_source: bool,

    /// Include altered accounts.
    #[arg(long, global = true)]
    with_altered_accounts: bool,

    /// Comma-separated token filter for altered accounts.
    #[arg(long, global = true)]
    tokens: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch one hyperblock by nonce.
    ByNonce {
        /// Block nonce.
        nonce: u64,
    },

    /// Fetch one hyperblock by hash.
    ByHash {
        /// Block hash, 64 hex characters.
        hash: String,
    },

    /// Fetch every hyperblock in a closed nonce range.
    Range {
        /// First nonce, inclusive.
        #[arg(long)]
        start: u64,

        /// Last nonce, inclusive.
        #[arg(long)]
        end: u64,

        /// Blocks fetched concurrently. Defaults to the config value.
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

impl Cli {
    /// Config query options with the command-line flags applied on top.
    fn query_options(&self, defaults: &HyperBlockQueryOptions) -> HyperBlockQueryOptions {
        HyperBlockQueryOptions {
            with_logs: self.with_logs || defaults.with_logs,
            notarized_at_source: self.notarized_at_source || defaults.notarized_at_source,
            with_altered_accounts: self.with_altered_accounts || defaults.with_altered_accounts,
            tokens: self
                .tokens
                .clone()
                .unwrap_or_else(|| defaults.tokens.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let query = cli.query_options(&config.query);
    let proxy_url = cli.proxy_url.as_deref().unwrap_or(&config.proxy_url);

    let transport = HttpTransport::new(proxy_url, config.request_timeout())
        .with_context(|| format!("creating transport for {proxy_url}"))?;
    let fetcher = HyperBlockFetcher::new(transport, config.fetcher_config());

    match cli.command {
        Command::ByNonce { nonce } => {
            let payload = fetcher
                .get_by_nonce(nonce, &query)
                .await
                .with_context(|| format!("fetching hyperblock {nonce}"))?;
            print_payload(&nonce.to_string(), &payload);
        }
        Command::ByHash { hash } => {
            let payload = fetcher
                .get_by_hash(&hash, &query)
                .await
                .with_context(|| format!("fetching hyperblock {hash}"))?;
            print_payload(&hash, &payload);
        }
        Command::Range {
            start,
            end,
            batch_size,
        } => {
            let options = BatchOptions {
                batch_size: batch_size.unwrap_or(config.batch_size),
                query,
            };
            let payloads = fetcher
                .get_by_interval(NonceInterval::new(start, end), &options)
                .await
                .with_context(|| format!("fetching hyperblocks {start}..={end}"))?;
            for (nonce, payload) in (start..=end).zip(&payloads) {
                print_payload(&nonce.to_string(), payload);
            }
        }
    }

    Ok(())
}

/// Print one `<label> <length> <hex>` line.
#[allow(clippy::print_stdout, reason = "payloads are the command output")]
fn print_payload(label: &str, payload: &[u8]) {
    println!("{label} {} {}", payload.len(), hex::encode(payload));
}
