//! Command handlers

pub mod check;
pub mod list;
pub mod refs;
pub mod schema;
pub mod show;

/// Shorten text for table cells, on a character boundary
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ünïcödé text", 4), "ünïc...");
    }
}
