//! Organization legal-name normalization for deduplication.
//!
//! Assignee names arrive with inconsistent legal-entity suffixes, stray
//! punctuation, and the occasional one-letter OCR mistake in the entity
//! type. `standardize_name` canonicalizes the suffix; `comparison_key`
//! reduces a standardized name to the form used for matching names across
//! sources.

use once_cell::sync::Lazy;
use regex::Regex;
use strsim::levenshtein;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Legal-entity types accepted for one-edit spelling repair, most specific
/// first.
const LEGAL_ENTITY_TYPES: &[&str] = &[
    "LIMITED COMPANY",
    "LIMITED PARTNERSHIP",
    "REGISTERED LIMITED LIABILITY PARTNERSHIP",
    "LIMITED LIABILITY PARTNERSHIP",
    "REGISTERED LIMITED LIABILITY LIMITED PARTNERSHIP",
    "LIMITED LIABILITY LIMITED PARTNERSHIP",
    "PROFESSIONAL CORPORATION",
    "PROFESSIONAL SERVICE CORPORATION",
    "PROFESSIONAL LIMITED LIABILITY COMPANY",
    "LIMITED LIABILITY COMPANY",
    "PROFESSIONAL ASSOCIATION",
    "CORPORATION",
    "INCORPORATED",
    "COMPANY",
    "LIMITED",
    "REGISTERED PARTNERSHIP",
    "ASSOCIATION",
    "CLUB",
    "FOUNDATION",
    "FUND",
    "INSTITUTE",
    "SOCIETY",
    "UNION",
    "SYNDICATE",
    "BANK",
];

/// Long-form legal types and their canonical short forms, applied in order.
const LEGAL_TYPE_SHORT_FORMS: &[(&str, &str)] = &[
    ("LIMITED COMPANY", "LTD"),
    ("LIMITED PARTNERSHIP", "LP"),
    ("REGISTERED LIMITED LIABILITY PARTNERSHIP", "RLLP"),
    ("LIMITED LIABILITY PARTNERSHIP", "LLP"),
    ("REGISTERED LIMITED LIABILITY LIMITED PARTNERSHIP", "RLLLP"),
    ("LIMITED LIABILITY LIMITED PARTNERSHIP", "LLLP"),
    ("PROFESSIONAL CORPORATION", "PC"),
    ("PROFESSIONAL SERVICE CORPORATION", "PSC"),
    ("PROFESSIONAL LIMITED LIABILITY COMPANY", "PLLC"),
    ("LIMITED LIABILITY COMPANY", "LLC"),
    ("PROFESSIONAL ASSOCIATION", "PA"),
    ("CORPORATION", "CORP"),
    ("INCORPORATED", "INC"),
    ("COMPANY", "CO"),
    ("LIMITED", "LTD"),
];

/// Legal types stripped when building a comparison key, longest first so a
/// compound suffix never loses only its tail.
const COMPARISON_STRIPPED_TYPES: &[&str] = &[
    "REGISTERED PARTNERSHIP",
    "ASSOCIATION",
    "FOUNDATION",
    "SYNDICATE",
    "INSTITUTE",
    "SOCIETY",
    "RLLLP",
    "UNION",
    "CLUB",
    "FUND",
    "BANK",
    "LLLP",
    "RLLP",
    "PLLC",
    "CORP",
    "LLC",
    "LLP",
    "LTD",
    "INC",
    "CO",
    "LP",
    "PA",
    "PC",
    "SC",
];

static TRAILING_PAREN_ABBREV: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s\(\w*\)$").unwrap());
static TRAILING_THE_ET_AL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",?( THE| ET AL\.?)+$").unwrap());
static PLLC_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"P\.?\s?L\.?\s?L\.?\s?C\.?$").unwrap());
static LLC_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"L\.?\s?L\.?\s?C\.?$").unwrap());
static LC_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r" L\.?\s?C\.?$").unwrap());
static NUMBERED_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*)\s?\([0-9]+\)?$").unwrap());
static PROPRIETARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(?PROPRIETARY\)?").unwrap());

/// Canonicalize a raw assignee name: uppercase, trailing noise removed,
/// legal-entity type repaired and shortened.
pub fn standardize_name(name: &str) -> String {
    let mut s = name.trim().to_string();

    // One trailing punctuation character, keeping a closing parenthesis.
    if let Some(last) = s.chars().last() {
        if last.is_ascii_punctuation() && last != ')' {
            s.pop();
        }
    }
    s = TRAILING_PAREN_ABBREV.replace(&s, "").into_owned();
    s = s.to_uppercase();
    s = TRAILING_THE_ET_AL.replace(&s, "").into_owned();

    // "LC" limited companies become "LTD"; LLC/PLLC endings are distinct
    // entity types and stay as they are.
    if !(PLLC_SUFFIX.is_match(&s) || LLC_SUFFIX.is_match(&s)) {
        s = LC_SUFFIX.replace(&s, " LTD").into_owned();
    }

    if let Some(caps) = NUMBERED_SUFFIX.captures(&s) {
        s = caps[1].trim_end().to_string();
    }

    s = repair_legal_type_spelling(&s);

    for (long, short) in LEGAL_TYPE_SHORT_FORMS {
        s = long_to_short(&s, long, short);
    }
    PROPRIETARY.replace_all(&s, "PTY").into_owned()
}

/// Fix a single-letter mistake in a trailing legal-entity type.
fn repair_legal_type_spelling(s: &str) -> String {
    let words: Vec<&str> = s.split_whitespace().collect();
    for entity_type in LEGAL_ENTITY_TYPES {
        let type_len = entity_type.split_whitespace().count();
        if words.len() < type_len {
            continue;
        }
        let tail = words[words.len() - type_len..].join(" ");
        if levenshtein(entity_type, &tail) == 1 {
            return s.replace(&tail, entity_type);
        }
    }
    s.to_string()
}

fn long_to_short(s: &str, long: &str, short: &str) -> String {
    let mut s = s.to_string();
    // Long form to short form.
    if let Some(stripped) = s.strip_suffix(&format!(" {}", long)) {
        s = format!("{} {}", stripped, short);
    }
    // Dotted short form to bare short form ("L.L.C." -> "LLC").
    let dotted = short
        .chars()
        .map(|c| format!("{}\\.?", c))
        .collect::<String>();
    if let Ok(re) = Regex::new(&format!(" {}$", dotted)) {
        s = re.replace(&s, format!(" {}", short)).into_owned();
    }
    // Comma between the name and the legal type.
    if let Ok(re) = Regex::new(&format!("^(.*[^,]),? ({})$", short)) {
        if let Some(caps) = re.captures(&s) {
            s = format!("{} {}", &caps[1], &caps[2]);
        }
    }
    // "CO." before the legal type loses its dot; "COMPANY" collapses to CO.
    if let Ok(re) = Regex::new(&format!(" CO\\.? {}$", short)) {
        s = re.replace(&s, format!(" CO {}", short)).into_owned();
    }
    if let Ok(re) = Regex::new(&format!(" COMPANY {}$", short)) {
        s = re.replace(&s, format!(" CO {}", short)).into_owned();
    }
    s
}

static HOLDINGS: Lazy<Regex> = Lazy::new(|| Regex::new(r" HOLDINGS?").unwrap());
static LEADING_THE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^THE ").unwrap());
static AND_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\sAND\s").unwrap());
static AND_SIGN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s&\s").unwrap());

/// Reduce a standardized name to its comparison form: legal type and filler
/// removed, punctuation squeezed out.
pub fn comparison_key(name: &str, remove_spaces: bool) -> String {
    let mut s = name.to_string();
    for entity_type in COMPARISON_STRIPPED_TYPES {
        if let Ok(re) = Regex::new(&format!(
            r"^(.*)\s?(CO\s)?{}(\s[A-Z]{{0,3}})?$",
            entity_type
        )) {
            if let Some(caps) = re.captures(&s) {
                s = caps[1].to_string();
            }
        }
    }
    s = HOLDINGS.replace_all(&s, "").into_owned();
    s = LEADING_THE.replace(&s, "").into_owned();
    s = AND_WORD.replace_all(&s, " ").into_owned();
    s = AND_SIGN.replace_all(&s, " ").into_owned();
    s = squeeze(&s, remove_spaces);
    s.replace("ENGRG", "ENGINEERING")
}

/// Drop spaces (or just trim) and the punctuation that varies freely across
/// sources.
fn squeeze(s: &str, remove_spaces: bool) -> String {
    let mut s = if remove_spaces {
        s.replace(' ', "")
    } else {
        s.trim().to_string()
    };
    for c in ['(', ')', '-', ','] {
        s = s.replace(c, "");
    }
    s
}

/// Decompose and drop combining marks, so accented and plain spellings of
/// the same name compare equal.
pub fn strip_accents(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}
