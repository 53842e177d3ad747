//! Query normalization and whitespace term extraction.

use std::collections::HashSet;

/// Lower-case, trim, and collapse internal whitespace runs to one space.
///
/// Used both as the query-cache key and as the lexical scorer's input.
pub fn normalize_query(query: &str) -> String {
    let lowered = query.to_lowercase();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Distinct whitespace-separated terms of already lower-cased text.
pub fn term_set(text: &str) -> HashSet<&str> {
    text.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_and_lowercases() {
        assert_eq!(normalize_query("  Where   CAN\tI park?\n"), "where can i park?");
        assert_eq!(normalize_query(""), "");
        assert_eq!(normalize_query("   "), "");
    }

    #[test]
    fn term_set_deduplicates() {
        let terms = term_set("lot b lot");
        assert_eq!(terms.len(), 2);
        assert!(terms.contains("lot"));
        assert!(terms.contains("b"));
    }
}
