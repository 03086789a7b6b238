use xxhash_rust::xxh3::xxh3_64;

/// Truncates a string to max_chars characters, appending "..." if truncated.
/// Safe for UTF-8 multi-byte characters.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncate_at = max_chars.saturating_sub(3);
        format!("{}...", truncate_chars(s, truncate_at))
    }
}

/// First `max_chars` characters of `s`, without any marker.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &s[..byte_index],
        None => s,
    }
}

/// Replace every non-alphanumeric ASCII character with '-'.
pub fn dash_non_alphanumeric(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Cheap change-detection fingerprint.
pub fn content_hash(content: &str) -> u64 {
    xxh3_64(content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_str_short_string() {
        assert_eq!(truncate_str("short", 20), "short");
    }

    #[test]
    fn truncate_str_exact_length() {
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn truncate_str_specific_truncation() {
        assert_eq!(truncate_str("hello world", 8), "hello...");
    }

    #[test]
    fn truncate_str_utf8_safe() {
        let japanese = "こんにちは世界";
        assert_eq!(truncate_str(japanese, 10), japanese);
        assert_eq!(truncate_str(japanese, 5), "こん...");
    }

    #[test]
    fn truncate_chars_keeps_prefix() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
    }

    #[test]
    fn dash_non_alphanumeric_replaces_each_char() {
        assert_eq!(dash_non_alphanumeric("1. Two Sum"), "1--Two-Sum");
        assert_eq!(dash_non_alphanumeric(""), "");
    }

    #[test]
    fn content_hash_detects_changes() {
        assert_eq!(content_hash("page"), content_hash("page"));
        assert_ne!(content_hash("page"), content_hash("page2"));
    }
}
