//! Cheap check for whether clipboard text is worth parsing.

use super::parser::COLUMN_HEADER_MARKER;

/// True when the text looks like a moon scan paste.
///
/// Only the column header marker is checked; the parser does the rest.
pub fn looks_like_moon_scan(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.contains(COLUMN_HEADER_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert!(!looks_like_moon_scan(""));
        assert!(!looks_like_moon_scan("  \r\n\t "));
    }

    #[test]
    fn test_marker_present() {
        assert!(looks_like_moon_scan(
            "Moon\tMoon Product\tQuantity\n66-PMM V - Moon 15"
        ));
        assert!(looks_like_moon_scan("   Moon Product   "));
    }

    #[test]
    fn test_marker_absent() {
        assert!(!looks_like_moon_scan("66-PMM V - Moon 15\nArkonor 0.3 1 2 3 4"));
        assert!(!looks_like_moon_scan("moon product"));
    }
}
