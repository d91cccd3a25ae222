// src/utils/url.rs

//! URL to file name encoding.

use sha2::{Digest, Sha256};
use url::Url;

/// Longest readable prefix kept in a cache key.
const MAX_READABLE_LEN: usize = 96;

/// Number of hex digits of the digest appended to every key.
const DIGEST_LEN: usize = 16;

/// The part of a URL that identifies a target on disk:
/// `host[:port] + path [+ ?query]`. The scheme and fragment are ignored.
pub fn identity(url: &Url) -> String {
    let mut identity = String::new();
    if let Some(host) = url.host_str() {
        identity.push_str(host);
    }
    if let Some(port) = url.port() {
        identity.push(':');
        identity.push_str(&port.to_string());
    }
    identity.push_str(url.path());
    if let Some(query) = url.query() {
        identity.push('?');
        identity.push_str(query);
    }
    identity
}

/// Encode a URL as a file name stem.
///
/// The readable prefix replaces every character that is unsafe in file names;
/// the trailing SHA-256 digest of the full identity keeps distinct URLs apart.
///
/// # Examples
/// ```
/// use pagewatch::utils::url::cache_key;
///
/// let url = url::Url::parse("https://example.com/news?page=2").unwrap();
/// assert!(cache_key(&url).starts_with("example.com_news_page_2-"));
/// ```
pub fn cache_key(url: &Url) -> String {
    let identity = identity(url);

    let readable: String = identity
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_READABLE_LEN)
        .collect();

    let digest = hex::encode(Sha256::digest(identity.as_bytes()));
    format!("{}-{}", readable, &digest[..DIGEST_LEN])
}
