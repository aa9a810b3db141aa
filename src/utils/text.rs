//! Text cleanup for scraped labels.

use unicode_segmentation::UnicodeSegmentation;

/// Collapse runs of whitespace. Input is expected to be decoded already,
/// so entity-like text such as `&lt;br&gt;` is kept as written.
pub fn clean_title(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a title has nothing visible once entities are decoded and
/// whitespace is trimmed.
pub fn is_blank(text: &str) -> bool {
    html_escape::decode_html_entities(text).trim().is_empty()
}

/// Cut `text` to at most `max` graphemes, appending an ellipsis when cut.
pub fn truncate(text: &str, max: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = graphemes[..max - 1].concat();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("  Chapter\n\t 12  "), "Chapter 12");
        assert_eq!(clean_title(" \n"), "");
    }

    #[test]
    fn test_clean_title_keeps_entity_text() {
        assert_eq!(clean_title("Use &lt;br&gt;  tags"), "Use &lt;br&gt; tags");
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank("  \n\t"));
        assert!(is_blank("&nbsp; \u{a0}"));
        assert!(!is_blank("&lt;br&gt;"));
        assert!(!is_blank(" Ch 1 "));
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate("Chương 12", 20), "Chương 12");
    }

    #[test]
    fn test_truncate_counts_graphemes() {
        // "ươ" written with combining marks still counts per grapheme
        let title = "Chu\u{031B}o\u{031B}ng mo\u{0301}t";
        assert_eq!(truncate(title, 4), "Chu\u{031B}…");
        assert_eq!(truncate("abcdef", 0), "");
    }
}
