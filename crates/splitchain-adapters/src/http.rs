use reqwest::Client;
use splitchain_core::SplitchainError;
use std::time::Duration;

/// Shared client builder. System proxies are ignored unless
/// `SPLITCHAIN_USE_SYSTEM_PROXY` is set.
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client, SplitchainError> {
    let mut builder = Client::builder().timeout(timeout);
    let allow_system_proxy = std::env::var("SPLITCHAIN_USE_SYSTEM_PROXY")
        .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    if !allow_system_proxy {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|e| SplitchainError::Config(format!("failed to build HTTP client: {}", e)))
}

pub(crate) fn truncate(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }
}
