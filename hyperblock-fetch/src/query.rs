//! Hyperblock endpoint paths and their query options.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Per-block options appended to the hyperblock endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperBlockQueryOptions {
    /// Include transaction logs.
    pub with_logs: bool,
    /// Fetch shard blocks as notarized at source.
    pub notarized_at_source: bool,
    /// Include altered accounts per shard block.
    pub with_altered_accounts: bool,
    /// Comma-separated token filter for altered accounts.
    pub tokens: String,
}

impl HyperBlockQueryOptions {
    /// Render the non-default options as a query string, including the
    /// leading `?`. Returns an empty string when every option is default.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if self.with_logs {
            query.append_pair("withLogs", "true");
        }
        if self.notarized_at_source {
            query.append_pair("notarizedAtSource", "true");
        }
        if self.with_altered_accounts {
            query.append_pair("withAlteredAccounts", "true");
        }
        if !self.tokens.is_empty() {
            query.append_pair("tokens", &self.tokens);
        }
        let query = query.finish();
        if query.is_empty() {
            query
        } else {
            format!("?{query}")
        }
    }
}

/// Path of the by-nonce endpoint.
#[must_use]
pub fn nonce_path(nonce: u64, options: &HyperBlockQueryOptions) -> String {
    format!("hyperblock/by-nonce/{nonce}{}", options.to_query_string())
}

/// Path of the by-hash endpoint.
#[must_use]
pub fn hash_path(hash: &str, options: &HyperBlockQueryOptions) -> String {
    format!("hyperblock/by-hash/{hash}{}", options.to_query_string())
}
