//! Relaxed option key matching.
//!
//! Option names are declared in camel case (`maxResultsPerRequest`) but raw
//! configuration usually arrives kebab-cased from files, dotted from property
//! sources, or upper snake case from the environment. All of them compare
//! equal after normalization.

/// Characters treated as word separators in option keys.
const SEPARATORS: [char; 3] = ['-', '.', '_'];

/// Normalizes an option key for comparison.
///
/// Separators are dropped and the remaining characters lowercased, so
/// `maxResultsPerRequest`, `max-results-per-request`, `max.results.per.request`
/// and `MAX_RESULTS_PER_REQUEST` all map to `maxresultsperrequest`.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !SEPARATORS.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Returns `true` if both keys name the same option.
pub fn keys_match(a: &str, b: &str) -> bool {
    normalize_key(a) == normalize_key(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spellings_are_equivalent() {
        let expected = "maxresultsperrequest";
        for key in [
            "maxResultsPerRequest",
            "max-results-per-request",
            "max.results.per.request",
            "MAX_RESULTS_PER_REQUEST",
        ] {
            assert_eq!(normalize_key(key), expected, "{key}");
        }
    }

    #[test]
    fn test_distinct_names_stay_distinct() {
        assert!(!keys_match("shardId", "shardClosed"));
        assert!(keys_match("aws2-kinesis", "aws2_kinesis"));
    }
}
