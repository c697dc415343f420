// src/extraction/tokens.rs
//
// Statement-level rewrites ahead of tokenization, the tokenizer itself, and
// the candidate inclusion filter. The token stream produced by `tokenize` is
// the ground truth the isolation merger walks over; the flagged candidates
// come from a reduced copy of the same string with ordinary words erased.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;

use super::text::{is_all_numeric, is_all_uppercase, remove_punctuation, STOPS};
use crate::dictionary::{base_form, Dictionary};

static ENG_FRAGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"-[Ee]ng\.?-?").unwrap());
static SLASH_ACRONYM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z]+)/([A-Z]+)\b").unwrap());
static AMP_ACRONYM_CONTEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]+[\s).,;:]").unwrap());

// "CODE N1, N2 and N3" with a two-letter prefix and 4-7 digit numbers.
static AWARD_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[\s(](?P<code>[A-Z]{2})(?P<first>[0-9]{4,7})(?P<mid>(?:, [0-9]{4,7})*),? and (?P<last>[0-9]{4,7})[\s)]",
    )
    .unwrap()
});
static NUMBER_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

// Ordinary words: lower case with at most a leading capital, optionally
// hyphen-joined to a second one. These can never be identifier fragments.
static LETTER_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]?[a-z]+(-[A-Z]?[a-z]+)?\b").unwrap());

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w\-/&.,;:]+").unwrap());

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(19|20)[0-9]{2}$").unwrap());

/// Rewrite a normalized statement into the form that gets tokenized: `&`
/// and `/` context rules, `#` removal, and the award-list expansion that
/// distributes a shared prefix over a number list.
pub fn prepare(statement: &str) -> String {
    // OCR renders the ENG infix of some award ids in lower case.
    let mut s = ENG_FRAGMENT.replace_all(statement, "-ENG-").into_owned();
    s = remove_punctuation(&s, "-&#/.,;:");
    s = s.replace(" & ", " and ");
    s = rewrite_ampersands(&s);
    s = SLASH_ACRONYM.replace_all(&s, "$1 $2").into_owned();
    s = s.replace('#', " ");
    expand_award_lists(&s)
}

/// `&` becomes a list separator unless it sits inside an all-uppercase
/// acronym such as `AT&T` or `R&D`.
fn rewrite_ampersands(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        if c == '&' && !AMP_ACRONYM_CONTEXT.is_match(&s[i + 1..]) {
            out.push_str(", ");
        } else {
            out.push(c);
        }
    }
    out
}

/// Rewrite "AB1234, 5678 and 9012" to "AB+1234, AB+5678, AB+9012" so each
/// number in the list becomes an independent prefixed candidate.
pub(crate) fn expand_award_lists(s: &str) -> String {
    AWARD_LIST
        .replace_all(s, |c: &Captures| {
            let code = &c["code"];
            let mut numbers = vec![c["first"].to_string()];
            numbers.extend(
                NUMBER_RUN
                    .find_iter(&c["mid"])
                    .map(|m| m.as_str().to_string()),
            );
            numbers.push(c["last"].to_string());
            let joined = numbers
                .iter()
                .map(|n| format!("{}+{}", code, n))
                .collect::<Vec<_>>()
                .join(", ");
            format!(" {} ", joined)
        })
        .into_owned()
}

/// Split into tokens of word characters plus `-`, `/`, `&` and the stop
/// punctuation. Stops stay attached to their token; the merger treats them
/// as hard separators.
pub fn tokenize(s: &str) -> Vec<String> {
    TOKEN.find_iter(s).map(|m| m.as_str().to_string()).collect()
}

/// Run the inclusion filter over the prepared statement and return the
/// flagged tokens, duplicates preserved in stream order.
pub fn flag_candidates(
    prepared: &str,
    acronyms: &HashSet<String>,
    dict: &dyn Dictionary,
) -> Vec<String> {
    let reduced = LETTER_WORD.replace_all(prepared, "");
    let mut flagged = Vec::new();
    for token in tokenize(&reduced) {
        if token == "U.S." {
            continue;
        }
        let chars = token.chars().count();
        let long_enough = (chars > 2 && token.ends_with(|c| STOPS.contains(c)))
            || chars > 1
            || is_all_numeric(&token);
        if !long_enough {
            continue;
        }
        if is_acronym(&token, acronyms) {
            continue;
        }
        if include_word(&token, dict) {
            flagged.push(token);
        }
    }
    flagged
}

/// The inclusion test: keep a token when it is a short all-uppercase
/// fragment, when it carries a digit, or when its base form is not an
/// English word.
pub(crate) fn include_word(word: &str, dict: &dyn Dictionary) -> bool {
    let stripped = remove_punctuation(word, "");
    if stripped.chars().count() < 3
        && is_all_uppercase(&stripped)
        && stripped.chars().all(|c| c.is_alphabetic())
    {
        return true;
    }
    if stripped.chars().any(|c| c.is_ascii_digit()) {
        return true;
    }
    !dict.contains(&base_form(&stripped, dict))
}

/// Acronym test tolerant of hyphen/slash compounds: an all-uppercase
/// alphabetic token is an acronym when any of its `-`/`/`-delimited parts is
/// in the excluded set.
pub(crate) fn is_acronym(word: &str, excluded: &HashSet<String>) -> bool {
    let kept = remove_punctuation(word, "-/");
    let stripped = remove_punctuation(&kept, "");
    is_all_uppercase(&stripped)
        && !stripped.is_empty()
        && stripped.chars().all(|c| c.is_alphabetic())
        && kept
            .split(|c| c == '-' || c == '/')
            .any(|part| excluded.contains(part))
}

/// A candidate that reads as a plausible calendar year no later than
/// `current_year`.
pub(crate) fn is_year(word: &str, current_year: i32) -> bool {
    YEAR.is_match(word) && word.parse::<i32>().map_or(false, |y| y <= current_year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary;

    fn acronym_set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ampersand_survives_acronym_context_only() {
        assert_eq!(rewrite_ampersands("the AT&T deal"), "the AT&T deal");
        assert_eq!(rewrite_ampersands("R&D. next"), "R&D. next");
        assert_eq!(rewrite_ampersands("Smith&Jones"), "Smith, Jones");
    }

    #[test]
    fn prepare_splits_slashed_acronyms_and_hash_marks() {
        let s = prepare("funded NSF/DOE grant #1234567 today");
        assert!(s.contains("NSF DOE"));
        assert!(!s.contains('#'));
        assert!(s.contains(" 1234567"));
    }

    #[test]
    fn award_list_is_distributed_over_its_prefix() {
        let s = expand_award_lists("grant numbers AR12345, 67890 and 34567 from");
        assert!(s.contains("AR+12345, AR+67890, AR+34567"));
        // Three or more listed numbers expand the same way.
        let s = expand_award_lists("grants DE1111, 2222, 3333 and 4444 here");
        assert!(s.contains("DE+1111, DE+2222, DE+3333, DE+4444"));
    }

    #[test]
    fn award_list_requires_two_letter_prefix_and_digit_runs() {
        let untouched = expand_award_lists("grant ABC12345 and 67890 given");
        assert!(untouched.contains("ABC12345 and 67890"));
    }

    #[test]
    fn tokenize_keeps_stops_attached_and_splits_on_plus() {
        let tokens = tokenize(" AR+12345, AR+67890 ");
        assert_eq!(tokens, vec!["AR", "12345,", "AR", "67890"]);
    }

    #[test]
    fn include_word_accepts_fragments_and_rejects_english() {
        let dict = dictionary::fixture();
        assert!(include_word("AR", &dict));
        assert!(include_word("12345,", &dict));
        assert!(include_word("91ER40677", &dict));
        assert!(!include_word("grants", &dict));
        assert!(!include_word("support", &dict));
        // Unknown long uppercase tokens stay in via the dictionary branch.
        assert!(include_word("XYZQ", &dict));
    }

    #[test]
    fn acronym_test_tolerates_hyphen_and_slash_compounds() {
        let excluded = acronym_set(&["NSF", "ARO", "NCI"]);
        assert!(is_acronym("NSF", &excluded));
        assert!(is_acronym("NSF.", &excluded));
        assert!(is_acronym("NIH/NCI", &excluded));
        assert!(is_acronym("ARO-X", &excluded));
        assert!(!is_acronym("DE-FG02", &excluded));
        assert!(!is_acronym("ONR", &excluded));
    }

    #[test]
    fn flag_candidates_drops_acronyms_and_english_words() {
        let dict = dictionary::fixture();
        let excluded = acronym_set(&["ARO"]);
        let prepared = prepare("grant numbers AR12345, 67890 and 34567 from ARO and U.S. support");
        let flagged = flag_candidates(&prepared, &excluded, &dict);
        assert!(flagged.contains(&"AR".to_string()));
        assert!(flagged.contains(&"12345,".to_string()));
        assert!(flagged.contains(&"34567".to_string()));
        assert!(!flagged.iter().any(|t| t == "ARO"));
        assert!(!flagged.iter().any(|t| t == "U.S."));
    }

    #[test]
    fn year_predicate_checks_prefix_shape_and_bound() {
        assert!(is_year("2019", 2020));
        assert!(is_year("1998", 2020));
        assert!(!is_year("2021", 2020));
        assert!(!is_year("2019-", 2020));
        assert!(!is_year("1818", 2020));
        assert!(!is_year("20190", 2020));
    }
}
