//! Shared utility functions used across multiple modules.

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Trim an endpoint URL and drop trailing slashes.
///
/// Returns `None` for blank values and values without an http(s) scheme.
pub fn normalize_endpoint_url(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || !is_http_url(value) {
        return None;
    }
    Some(value.trim_end_matches('/').to_string())
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Dashboard greeting for a local hour of day (0-23).
pub const fn greeting_for_hour(hour: u32) -> &'static str {
    if hour < 12 {
        "Good Morning"
    } else if hour < 18 {
        "Good Afternoon"
    } else {
        "Good Evening"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
    }

    #[test]
    fn normalize_text_option_trims_value() {
        assert_eq!(
            normalize_text_option(Some(" Alex ".to_string())),
            Some("Alex".to_string())
        );
    }

    #[test]
    fn is_http_url_accepts_valid_schemes() {
        assert!(is_http_url("http://localhost"));
        assert!(is_http_url("https://script.example.com/exec"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("example.com"));
    }

    #[test]
    fn normalize_endpoint_url_drops_trailing_slash() {
        assert_eq!(
            normalize_endpoint_url(" https://hub.example.com/ ").as_deref(),
            Some("https://hub.example.com")
        );
        assert_eq!(normalize_endpoint_url("hub.example.com"), None);
        assert_eq!(normalize_endpoint_url("  "), None);
    }

    #[test]
    fn greeting_follows_time_of_day() {
        assert_eq!(greeting_for_hour(0), "Good Morning");
        assert_eq!(greeting_for_hour(11), "Good Morning");
        assert_eq!(greeting_for_hour(12), "Good Afternoon");
        assert_eq!(greeting_for_hour(17), "Good Afternoon");
        assert_eq!(greeting_for_hour(18), "Good Evening");
    }
}
