//! HTTP clients for the inventory search (Flexi report) and cockpit detail
//! backends.

mod cockpit;
mod error;
mod search;

pub use cockpit::CockpitClient;
pub use error::BackendError;
pub use search::FlexiClient;

use reqwest::Client;
use std::time::Duration;

/// Longest body excerpt carried in protocol errors.
pub const PREVIEW_LIMIT: usize = 1000;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Truncates `text` to at most `limit` characters, marking the cut with `...`.
pub fn preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub(crate) fn build_http_client(
    timeout_secs: u64,
    accept_invalid_certs: bool,
) -> Result<Client, BackendError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .map_err(BackendError::Client)
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}
