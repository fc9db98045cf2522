//! ENS name normalization, validation and namehash.

use once_cell::sync::Lazy;
use regex::Regex;
use sha3::{Digest, Keccak256};

use crate::error::{DiscoveryError, Result};

/// Period-separated labels of `[a-z0-9-]` ending in the literal `eth` label.
static ENS_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z0-9-]+\.)+eth$").expect("ENS name pattern is a valid regex")
});

const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 255;

/// Trim surrounding whitespace and lower-case.
pub fn normalize_ens_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Whether `name`, once normalized, is an acceptable `.eth` name.
pub fn validate_ens_name(name: &str) -> bool {
    let normalized = normalize_ens_name(name);
    (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&normalized.len())
        && ENS_NAME_PATTERN.is_match(&normalized)
}

/// Normalize and validate in one step, failing with a validation error.
pub(crate) fn require_ens_name(name: &str) -> Result<String> {
    let normalized = normalize_ens_name(name);
    if normalized.is_empty() {
        return Err(DiscoveryError::missing("ens name"));
    }
    if !validate_ens_name(&normalized) {
        return Err(DiscoveryError::invalid("ens name", name));
    }
    Ok(normalized)
}

/// EIP-137 namehash of a validated name, as `0x`-prefixed lowercase hex.
pub fn compute_ens_node(name: &str) -> Result<String> {
    let normalized = require_ens_name(name)?;
    Ok(format!("0x{}", hex::encode(namehash(&normalized))))
}

fn namehash(name: &str) -> [u8; 32] {
    name.rsplit('.').fold([0u8; 32], |node, label| {
        let label_hash = Keccak256::digest(label.as_bytes());
        let mut hasher = Keccak256::new();
        hasher.update(node);
        hasher.update(label_hash);
        hasher.finalize().into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_whitespace_and_case() {
        assert_eq!(normalize_ens_name("  Weather-API.ETH \t"), "weather-api.eth");
        assert_eq!(normalize_ens_name(""), "");
    }

    #[test]
    fn accepts_eth_names() {
        assert!(validate_ens_name("weather-api.eth"));
        assert!(validate_ens_name("a.b.eth"));
        assert!(validate_ens_name(" Weather-API.ETH "));
        assert!(validate_ens_name("123.eth"));
    }

    #[test]
    fn rejects_malformed_names() {
        for name in [
            "",
            "   ",
            "invalid-name",
            "eth",
            ".eth",
            "weather..eth",
            "weather.com",
            "weather_api.eth",
            "weather api.eth",
            "weather.eth.",
            "wéather.eth",
        ] {
            assert!(!validate_ens_name(name), "{name:?} should be rejected");
        }
    }

    #[test]
    fn enforces_length_bounds() {
        let at_limit = format!("{}.eth", "a".repeat(MAX_NAME_LEN - 4));
        assert_eq!(at_limit.len(), MAX_NAME_LEN);
        assert!(validate_ens_name(&at_limit));

        let too_long = format!("{}.eth", "a".repeat(MAX_NAME_LEN - 3));
        assert!(!validate_ens_name(&too_long));
    }

    #[test]
    fn require_distinguishes_missing_from_invalid() {
        assert!(matches!(
            require_ens_name("  "),
            Err(DiscoveryError::MissingField { field: "ens name" })
        ));
        assert!(matches!(
            require_ens_name("invalid-name"),
            Err(DiscoveryError::InvalidField { field: "ens name", .. })
        ));
        assert_eq!(require_ens_name(" A.Eth ").unwrap(), "a.eth");
    }

    #[test]
    fn namehash_matches_eip137_vectors() {
        assert_eq!(
            hex::encode(namehash("eth")),
            "93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            compute_ens_node("foo.eth").unwrap(),
            "0xde9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
        assert_eq!(
            compute_ens_node(" FOO.eth ").unwrap(),
            compute_ens_node("foo.eth").unwrap()
        );
    }

    #[test]
    fn namehash_rejects_invalid_names() {
        assert!(compute_ens_node("not-an-ens-name").is_err());
    }
}
