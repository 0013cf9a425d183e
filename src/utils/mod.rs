//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Maximum length of one sanitized storage key part
pub const MAX_KEY_PART_LEN: usize = 64;

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Trim text, mapping blank results to `None`
pub fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Sanitize one part of a storage key
///
/// Every character outside `[0-9A-Za-z_-]` becomes `_` and the result is
/// cut to [`MAX_KEY_PART_LEN`] characters.
pub fn sanitize_key_part(part: &str) -> String {
    static INVALID_CHARS: OnceLock<Regex> = OnceLock::new();

    let re = INVALID_CHARS
        .get_or_init(|| Regex::new(r"[^0-9A-Za-z_-]").expect("Invalid regex pattern"));

    // Output is pure ASCII, so byte truncation is safe
    let mut sanitized = re.replace_all(part, "_").into_owned();
    sanitized.truncate(MAX_KEY_PART_LEN);
    sanitized
}

/// Hex-encoded SHA-256 digest of a string
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
