//! Recipient identifier formats.

use regex::Regex;
use std::sync::OnceLock;

fn canonical_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static address pattern"))
}

fn alias_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$")
            .expect("static alias pattern")
    })
}

/// True for a chain-native account address: `0x` followed by 40 hex digits.
pub fn is_canonical_address(value: &str) -> bool {
    canonical_pattern().is_match(value)
}

/// Lower-cased alias when `value` looks like a dotted human-readable name
/// (`vitalik.eth`, `pay.team.eth`).
pub fn normalize_alias(value: &str) -> Option<String> {
    let lowered = value.trim().to_ascii_lowercase();
    if is_canonical_address(&lowered) || !alias_pattern().is_match(&lowered) {
        return None;
    }
    Some(lowered)
}
