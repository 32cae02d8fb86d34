//! String utilities
//!
//! Helpers for keeping secrets out of log lines.

/// Number of leading key characters that may appear in logs
const VISIBLE_KEY_CHARS: usize = 8;

/// Safely truncate a string at a character boundary
///
/// # Example
/// ```
/// use quotes_api::utils::truncate_str;
///
/// assert_eq!(truncate_str("Hello, 世界!", 8), "Hello, 世");
/// assert_eq!(truncate_str("Hi", 100), "Hi");
/// ```
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Mask an API key for logging: the first 8 characters followed by `...`.
///
/// Keys of 12 characters or fewer are fully hidden.
///
/// # Example
/// ```
/// use quotes_api::utils::mask_key;
///
/// assert_eq!(mask_key("0123456789abcdef0123456789abcdef"), "01234567...");
/// assert_eq!(mask_key("short"), "***");
/// ```
pub fn mask_key(key: &str) -> String {
    if key.chars().count() > 12 {
        format!("{}...", truncate_str(key, VISIBLE_KEY_CHARS))
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_unicode() {
        let text = "Hello, 世界!";
        assert_eq!(truncate_str(text, 7), "Hello, ");
        assert_eq!(truncate_str(text, 9), "Hello, 世界");
        assert_eq!(truncate_str("", 3), "");
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("a1b2c3d4e5f6a7b8c9d0"), "a1b2c3d4...");
        assert_eq!(mask_key("123456789012"), "***");
        assert_eq!(mask_key(""), "***");
    }
}
