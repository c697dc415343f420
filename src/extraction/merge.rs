// src/extraction/merge.rs
//
// Reattach identifier fragments that OCR or layout split across adjacent
// tokens. Starting from a flagged token, the walk absorbs qualifying
// neighbors one direction at a time and joins the pieces with `+`. Stop
// punctuation on the facing edge of either token is a hard separator.
//
// Termination: every recursive step moves strictly toward the stream
// boundary in the walk direction, and the stream is finite.

use std::collections::HashSet;

use super::text::{
    ends_with_stop, is_all_numeric, is_all_uppercase, remove_punctuation, starts_with_stop,
    strip_stops,
};
use super::tokens::is_acronym;
use crate::dictionary::Dictionary;

/// Result of one merge walk. `Fanout` models "PREFIX N1 and N2": two
/// candidates sharing the recovered prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Merge {
    Single(String),
    Fanout(String, String),
}

impl Merge {
    /// The first (or only) candidate.
    pub fn primary(&self) -> &str {
        match self {
            Merge::Single(s) => s,
            Merge::Fanout(first, _) => first,
        }
    }

    pub fn into_candidates(self) -> Vec<String> {
        match self {
            Merge::Single(s) => vec![s],
            Merge::Fanout(first, second) => vec![first, second],
        }
    }
}

/// Walk from the flagged token at `seed_idx` in the given direction and
/// absorb adjacent fragments. Returning the seed unchanged is the common
/// case, not a failure.
pub fn merge_isolated(
    tokens: &[String],
    seed_idx: usize,
    flagged: &[String],
    acronyms: &HashSet<String>,
    dict: &dyn Dictionary,
    forward: bool,
) -> Merge {
    let seed = &tokens[seed_idx];
    if (!forward && seed_idx == 0) || (forward && seed_idx + 1 == tokens.len()) {
        return Merge::Single(seed.clone());
    }
    let neighbor_idx = if forward { seed_idx + 1 } else { seed_idx - 1 };
    let neighbor = &tokens[neighbor_idx];

    // Punctuation on the facing edges blocks the merge outright.
    let blocked = if forward {
        ends_with_stop(seed) || starts_with_stop(neighbor)
    } else {
        starts_with_stop(seed) || ends_with_stop(neighbor)
    };
    if blocked {
        return Merge::Single(seed.clone());
    }

    let bare = strip_stops(neighbor);
    let bare_depunct = remove_punctuation(&bare, "");
    let qualifies = (is_all_uppercase(&bare) && !is_acronym(&bare, acronyms))
        || (bare_depunct.chars().count() < 5 && is_all_numeric(&bare_depunct));
    if !qualifies {
        return Merge::Single(seed.clone());
    }

    let absorbed = match merge_isolated(tokens, neighbor_idx, flagged, acronyms, dict, forward) {
        Merge::Single(s) => s,
        Merge::Fanout(first, _) => first,
    };

    if forward {
        return Merge::Single(format!("{}+{}", seed, absorbed));
    }

    // Backward only: "PREFIX N1 and N2" fans out into two candidates when
    // the token after "and" looks like a sibling of the seed. When the token
    // past the sibling is itself flagged, only the first candidate is
    // emitted; the sibling is recovered through its own seed.
    if tokens.len() > seed_idx + 2
        && tokens[seed_idx + 1] == "and"
        && tokens[seed_idx + 2] != absorbed
        && !tokens[seed_idx + 2].chars().any(|c| c.is_lowercase())
        && !is_acronym(&tokens[seed_idx + 2], acronyms)
        && !dict.contains(&tokens[seed_idx + 2])
        && char_len_diff(seed, &tokens[seed_idx + 2]) < 2
    {
        let primary = format!("{}+{}", absorbed, seed);
        let sibling = format!("{}+{}", absorbed, tokens[seed_idx + 2]);
        if tokens.len() > seed_idx + 3 && flagged.iter().any(|f| f == &tokens[seed_idx + 3]) {
            return Merge::Single(primary);
        }
        return Merge::Fanout(primary, sibling);
    }

    Merge::Single(format!("{}+{}", absorbed, seed))
}

fn char_len_diff(a: &str, b: &str) -> usize {
    let la = a.chars().count();
    let lb = b.chars().count();
    la.abs_diff(lb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn no_acronyms() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn backward_merge_absorbs_an_uppercase_prefix() {
        let dict = dictionary::fixture();
        let tokens = toks(&["grants", "DE-FG02", "12345"]);
        let merged = merge_isolated(&tokens, 2, &[], &no_acronyms(), &dict, false);
        assert_eq!(merged, Merge::Single("DE-FG02+12345".to_string()));
    }

    #[test]
    fn merge_chains_through_consecutive_fragments() {
        let dict = dictionary::fixture();
        let tokens = toks(&["under", "N00014", "91", "J1956"]);
        let merged = merge_isolated(&tokens, 3, &[], &no_acronyms(), &dict, false);
        assert_eq!(merged, Merge::Single("N00014+91+J1956".to_string()));
    }

    #[test]
    fn forward_merge_appends_a_short_numeric_suffix() {
        let dict = dictionary::fixture();
        let tokens = toks(&["grant", "AF-AFOSR", "1234", "text"]);
        let merged = merge_isolated(&tokens, 1, &[], &no_acronyms(), &dict, true);
        assert_eq!(merged, Merge::Single("AF-AFOSR+1234".to_string()));
    }

    #[test]
    fn stop_punctuation_is_a_hard_separator() {
        let dict = dictionary::fixture();
        let tokens = toks(&["DE-FG02,", "12345"]);
        let merged = merge_isolated(&tokens, 1, &[], &no_acronyms(), &dict, false);
        assert_eq!(merged, Merge::Single("12345".to_string()));
    }

    #[test]
    fn acronym_neighbors_are_not_absorbed() {
        let dict = dictionary::fixture();
        let acronyms: HashSet<String> = ["NSF"].into_iter().map(str::to_string).collect();
        let tokens = toks(&["NSF", "1234567"]);
        let merged = merge_isolated(&tokens, 1, &[], &acronyms, &dict, false);
        assert_eq!(merged, Merge::Single("1234567".to_string()));
    }

    #[test]
    fn five_digit_numbers_do_not_merge_as_neighbors() {
        let dict = dictionary::fixture();
        let tokens = toks(&["AB", "12345"]);
        // Forward from "AB": the 5-digit neighbor fails the short-numeric
        // test, so nothing is absorbed.
        let merged = merge_isolated(&tokens, 0, &[], &no_acronyms(), &dict, true);
        assert_eq!(merged, Merge::Single("AB".to_string()));
    }

    #[test]
    fn and_list_fans_out_into_two_candidates() {
        let dict = dictionary::fixture();
        let tokens = toks(&["grants", "DE-FG02", "12345", "and", "67890."]);
        let merged = merge_isolated(&tokens, 2, &[], &no_acronyms(), &dict, false);
        assert_eq!(
            merged,
            Merge::Fanout("DE-FG02+12345".to_string(), "DE-FG02+67890.".to_string())
        );
    }

    #[test]
    fn fanout_is_suppressed_when_the_far_token_is_already_flagged() {
        let dict = dictionary::fixture();
        let tokens = toks(&["grants", "DE-FG02", "12345", "and", "67890", "XY999999"]);
        let flagged = toks(&["12345", "67890", "XY999999"]);
        let merged = merge_isolated(&tokens, 2, &flagged, &no_acronyms(), &dict, false);
        assert_eq!(merged, Merge::Single("DE-FG02+12345".to_string()));
    }

    #[test]
    fn fanout_requires_a_sibling_of_similar_length() {
        let dict = dictionary::fixture();
        let tokens = toks(&["grants", "DE-FG02", "12345", "and", "9876543"]);
        let merged = merge_isolated(&tokens, 2, &[], &no_acronyms(), &dict, false);
        assert_eq!(merged, Merge::Single("DE-FG02+12345".to_string()));
    }

    #[test]
    fn result_is_never_shorter_than_the_seed() {
        let dict = dictionary::fixture();
        let tokens = toks(&["A1", "B2", "C3", "D4", "E5"]);
        for idx in 0..tokens.len() {
            for forward in [false, true] {
                let merged =
                    merge_isolated(&tokens, idx, &[], &no_acronyms(), &dict, forward);
                assert!(merged.primary().len() >= tokens[idx].len());
            }
        }
    }
}
