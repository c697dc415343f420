// src/extraction/text.rs

/// ASCII punctuation inventory shared by the normalization and filtering
/// passes. Matches the classifier's notion of "punctuation" everywhere a
/// token is stripped before a lexical test.
pub(crate) const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Stop punctuation. A hard separator for the isolation merger and the final
/// candidate cleanup.
pub(crate) const STOPS: &str = ".,;:";

/// Remove every punctuation character except those in `preserve`.
pub(crate) fn remove_punctuation(word: &str, preserve: &str) -> String {
    word.chars()
        .filter(|c| !PUNCTUATION.contains(*c) || preserve.contains(*c))
        .collect()
}

/// Remove every stop character, wherever it occurs.
pub(crate) fn strip_stops(word: &str) -> String {
    word.chars().filter(|c| !STOPS.contains(*c)).collect()
}

pub(crate) fn starts_with_stop(word: &str) -> bool {
    word.chars().next().map_or(false, |c| STOPS.contains(c))
}

pub(crate) fn ends_with_stop(word: &str) -> bool {
    word.chars().last().map_or(false, |c| STOPS.contains(c))
}

/// True when the string has at least one cased character and none of its
/// cased characters are lower case ("DE-FG02" and "12A" qualify, "123" does
/// not).
pub(crate) fn is_all_uppercase(s: &str) -> bool {
    let mut has_cased = false;
    for c in s.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// True when the string is non-empty and made of digits only.
pub(crate) fn is_all_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

pub(crate) fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_punctuation_respects_preserve_set() {
        assert_eq!(remove_punctuation("N.A.S.A.", ""), "NASA");
        assert_eq!(remove_punctuation("DE-FG02,", "-"), "DE-FG02");
        assert_eq!(remove_punctuation("AR+12345,", "-&#/.,;:"), "AR12345,");
    }

    #[test]
    fn uppercase_test_matches_cased_semantics() {
        assert!(is_all_uppercase("ARO"));
        assert!(is_all_uppercase("DE-FG02"));
        assert!(is_all_uppercase("12A"));
        assert!(!is_all_uppercase("12345"));
        assert!(!is_all_uppercase("Grant"));
        assert!(!is_all_uppercase(""));
    }

    #[test]
    fn stop_helpers() {
        assert_eq!(strip_stops("AR+12345,"), "AR+12345");
        assert!(ends_with_stop("67890."));
        assert!(starts_with_stop(";x"));
        assert!(!ends_with_stop("67890"));
    }
}
