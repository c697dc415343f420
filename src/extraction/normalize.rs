// src/extraction/normalize.rs
//
// Ordered noise removal over a government-interest statement. Every stage
// only deletes or rewrites spans; the statement never grows except for the
// single spaces inserted around fused punctuation. Stage order is load
// bearing: statute citations must be excised before zip codes (statute text
// contains digit runs that read like zips), and the verbatim boilerplate
// rules must run before the generic leading-title strip.

use log::warn;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::dictionary::{is_base_word, Dictionary};
use crate::reference::ZipRow;

/// Closed set of named HTML character references seen in the patent corpus.
/// Unknown entities pass through untouched; this is a lookup table, not an
/// HTML parser. `&Ovalhollow;` and `&Oslash;` are OCR artifacts.
const HTML_ENTITIES: &[(&str, &str)] = &[
    ("&mdash;", "-"),
    ("&num;", "#"),
    ("&ldquo;", "'"),
    ("&rdquo;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
    ("&equals;", "="),
    ("&lsqb;", "["),
    ("&rsqb;", "]"),
    ("&quest;", "?"),
    ("&sect;", "§"),
    ("&Ovalhollow;", ""),
    ("&Oslash;", "0"),
    ("&Prime;", "'"),
    ("&plus;", "+"),
    ("&oacute;", "ó"),
    ("&times;", "x"),
    ("&copy;", "(c)"),
    ("&mgr;", "mu"),
];

static SPACE_AFTER_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([;:)])([A-Za-z0-9])").unwrap());
static SPACE_BEFORE_PAREN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z0-9])(\()").unwrap());
static DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a statement: apply the full excision sequence and report the
/// public-law flag picked up by the statute stage.
pub fn normalize(statement: &str, zipcodes: &[ZipRow], dict: &dyn Dictionary) -> (String, bool) {
    let mut s = decode_entities(statement);
    s = SPACE_AFTER_PUNCT.replace_all(&s, "$1 $2").into_owned();
    s = SPACE_BEFORE_PAREN.replace_all(&s, "$1 $2").into_owned();
    s = s.replace('–', "-").replace('—', "-");
    s = DASH_RUN.replace_all(&s, "-").into_owned();
    s = WHITESPACE_RUN.replace_all(&s, " ").into_owned();

    let (mut s, public_law) = excise_laws(s);
    s = excise_zipcodes(&s, zipcodes);
    s = excise_postal_and_serials(&s);
    s = excise_dates(&s);
    s = excise_titles(&s);
    if s.contains(".txt") {
        s = excise_filenames(&s, dict);
    }
    s = excise_boilerplate(&s);
    s = strip_leading_title(&s);
    (s, public_law)
}

pub(crate) fn decode_entities(text: &str) -> String {
    let mut s = text.to_string();
    for (entity, replacement) in HTML_ENTITIES {
        s = s.replace(entity, replacement);
    }
    s
}

static SBIR_TRIGGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"S\.?B\.?I\.?R\.?").unwrap());
const SBIR_CITATION: &str = "106-554, Small Business Reauthorization Act of 2000";

static NASA_ACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([Ss]ection\s)?(305|20135\(b\)) of the (National Aeronautic(s)? (&|and) Space|NASA) Act(ion)?(\s(of\s)?\(?1958)?",
    )
    .unwrap()
});

static LAW_CITATIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"P(ublic|\.) [Ll](aw|\.) \d{2,3}\s?-+\s?\d{2,3}",
        r"([\(\s]\d{2,3}\s)?[Uu]\.?[Ss]\.?\s?[Cc]\.?([Pp]\.?)?\s?(§|\.?sctn\.?|[Cc]hapter|[Ss]ec(tion|\.)?)?\s*(111-)?\d{3,6}",
        r"[1-4][0-9]\s?C\.?F\.?R\.?\s?([Ss]ec(tion|\.)|\.sctn\.|[Pp]art|§)?\s?[0-9.\-]+\s?(\([A-Za-z]\))?\s?(\([0-9]\))?(\([ivx]{1,3}\))?",
        r"[Ff][Aa][Rr]\s([Rr]egulation\s)?[0-9.\-]+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

// The statute-volume citation must not eat into a digit or hyphen that
// follows it, so the boundary character is captured and restored.
static STAT_CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"((\d{2,3}\s)?[Ss][Tt][Aa][Tt]?(ute)?\.?\s\d{3,4})\|?(?P<tail>[^\d-]|$)").unwrap()
});

static ASPR_CITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ASPR (Section\s)?7-\d{3}.\d{2}(\s?\([a-z]\))?").unwrap());

/// Excise the statute/regulation citation inventory. The flag is true when
/// any excision shortened the statement or when the literal "Public Law"
/// remains afterwards.
pub(crate) fn excise_laws(statement: String) -> (String, bool) {
    let len_before = statement.len();
    let mut s = statement;

    if SBIR_TRIGGER.is_match(&s) {
        s = s.replace(SBIR_CITATION, "");
    }
    s = NASA_ACT.replace_all(&s, "").into_owned();
    for citation in LAW_CITATIONS.iter() {
        s = citation.replace_all(&s, "").into_owned();
    }
    s = STAT_CITATION
        .replace_all(&s, |c: &Captures| c["tail"].to_string())
        .into_owned();
    s = ASPR_CITATION.replace_all(&s, "").into_owned();

    let public_law = s.len() < len_before || s.contains("Public Law");
    (s, public_law)
}

/// Excise the zip codes of cities named in the statement. The pipe-joined
/// zip list of a matching city is used directly as a removal alternation,
/// optionally followed by a 4-digit extension.
pub(crate) fn excise_zipcodes(statement: &str, zipcodes: &[ZipRow]) -> String {
    // Mail for the Redstone Arsenal installation routes through Huntsville.
    let mut s = statement.replace("Redstone Arsenal", "Huntsville");
    for row in zipcodes {
        if !s.contains(&row.city) {
            continue;
        }
        match Regex::new(&format!(r"({})(-\d{{4}})?", row.zipcodes)) {
            Ok(re) => s = re.replace_all(&s, "").into_owned(),
            Err(e) => warn!("Invalid zip pattern for {}: {}", row.city, e),
        }
    }
    s
}

static PO_BOX: Lazy<Regex> = Lazy::new(|| Regex::new(r"P.O. Box \d+").unwrap());
static SERIAL_NO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"((Ser|Pat)(ent|\.)? (No\.?|[Aa]pplication)|S\.?N\.?) (\d{1,2}[/,])?\d{3}[/,]\s?\d{3}")
        .unwrap()
});
static APPLICATION_NO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}/\d{3},\d{3}").unwrap());
static PCT_APPLICATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PCT[/\s]([A-Z]{2}|W0)\d{2,4}/\d{5,6}").unwrap());

pub(crate) fn excise_postal_and_serials(statement: &str) -> String {
    let mut s = PO_BOX.replace_all(statement, "").into_owned();
    s = SERIAL_NO.replace_all(&s, "").into_owned();
    s = APPLICATION_NO.replace_all(&s, "").into_owned();
    s = PCT_APPLICATION.replace_all(&s, "").into_owned();
    s
}

const MONTHS: &[&str] = &[
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAY: &str = r"(?:0?[1-9]|[12]\d|3[01])";

// One (textual, numeric) pattern pair per month. The textual form accepts
// the full month name, the three-letter abbreviation, and an optional
// trailing period; the year boundary is captured and restored because the
// year must not be followed by another digit.
static DATE_PATTERNS: Lazy<Vec<(Regex, Regex)>> = Lazy::new(|| {
    MONTHS
        .iter()
        .enumerate()
        .map(|(idx, month)| {
            let initial = &month[..1];
            let mut m = format!("[{}{}]{}", initial, initial.to_lowercase(), &month[1..3]);
            if month.len() > 3 {
                m = format!("{}(?:{})?\\.?", m, &month[3..]);
            }
            let textual = Regex::new(&format!(
                r"{m} (?:{DAY}(?:-{DAY})?,\s)?(?:19|20)\d{{2}}(?P<tail>\D|$)"
            ))
            .unwrap();

            let month_no = idx + 1;
            let mm = if month_no < 10 {
                format!("0?{}", month_no)
            } else {
                month_no.to_string()
            };
            let numeric = Regex::new(&format!(r"\s\(?{mm}/{DAY}/(?:19|20)?\d{{2}}[),;:.]?\s"))
                .unwrap();
            (textual, numeric)
        })
        .collect()
});

pub(crate) fn excise_dates(statement: &str) -> String {
    let mut s = statement.to_string();
    for (textual, numeric) in DATE_PATTERNS.iter() {
        s = textual
            .replace_all(&s, |c: &Captures| format!(" {}", &c["tail"]))
            .into_owned();
        s = numeric.replace_all(&s, " ").into_owned();
        s = WHITESPACE_RUN.replace_all(&s, " ").into_owned();
    }
    s
}

static TITLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"[Ll]abeled:? “.+”",
        r"([Ee]n)?[Tt]itle(d)?:? “.+”",
        r"[Uu]nder “.+” ([Pp]rogram|[Cc]ontract)",
        r"project name:? “.+”",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

pub(crate) fn excise_titles(statement: &str) -> String {
    let mut s = statement.to_string();
    for pattern in TITLE_PATTERNS.iter() {
        s = pattern.replace_all(&s, "").into_owned();
    }
    s
}

static WORD_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());
static EMPTY_QUOTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"“\s*”").unwrap());

/// Excise file names ending in `.txt`. From each `txt` token, scan backward
/// until a token whose base form is an English word is found, then remove
/// everything after that word through the extension. Hitting the start of
/// the statement without finding a word removes from the first token.
pub(crate) fn excise_filenames(statement: &str, dict: &dyn Dictionary) -> String {
    let tokens: Vec<(usize, usize, &str)> = WORD_TOKEN
        .find_iter(statement)
        .map(|m| (m.start(), m.end(), m.as_str()))
        .collect();

    let mut spans: Vec<(usize, usize)> = Vec::new();
    for (idx, &(_, end, text)) in tokens.iter().enumerate() {
        if !text.eq_ignore_ascii_case("txt") {
            continue;
        }
        let mut first = 0;
        let mut back = 1;
        while back <= idx {
            if is_base_word(tokens[idx - back].2, dict) {
                first = idx - back + 1;
                break;
            }
            back += 1;
        }
        if first <= idx {
            spans.push((tokens[first].0, end));
        }
    }

    let mut s = statement.to_string();
    for &(start, end) in spans.iter().rev() {
        if end <= s.len() {
            s.replace_range(start..end, "");
        }
    }
    s = EMPTY_QUOTES.replace_all(&s, "").into_owned();
    WHITESPACE_RUN.replace_all(&s, " ").into_owned()
}

static LICENSING_INQUIRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Licensing (and technical )?inquiri?es may be directed to .+\.(mil|gov)\.?")
        .unwrap()
});

// Contact blocks appended by the Navy's San Diego and Charleston technology
// transfer offices: office codes, zip, phone, email, and case numbers.
static NAVY_SAN_DIEGO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[Cc]ode \d{4,5}|D0012|53510|53560|(619)?\)?[-\s]?553-\d{4}|[\w.]+@[\w.]*navy\.mil|(([Rr]eferenc(e|ing)\s)|([Nn]avy [Cc]ase\s)|(NC\s))+(Number|No\.?)?\s?[\d,.]{5,7}",
    )
    .unwrap()
});
static NAVY_CHARLESTON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[Cc]ode [A-Z0-9\-]+|29419(-9022)?|(843)?\)?[-\s]?218-\d{4}|[\w.]+@[\w.]*navy\.mil|(([Rr]eferenc(e|ing)\s)|([Nn]avy [Cc]ase\s)|(NC\s))+(Number|No\.?)?\s?[\d,.]{5,7}",
    )
    .unwrap()
});
static NAVY_CASE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(([Rr]eferenc(e|ing)\s)|([Nn]avy [Cc]ase\s)|(NC\s))+(Number|No\.?)?\s?[\d,.]{5,7}")
        .unwrap()
});

/// Verbatim excisions tied to specific real-world statements. Each pair is
/// (trigger substring, literal removed when the trigger is present); a
/// trigger equal to its removal is an unconditional delete.
const TRIGGERED_LITERALS: &[(&str, &str)] = &[
    ("Environmental Protection Agency", "1025 F St"),
    (
        "(COOPERATIVE RESEARCH AND TECHNOLOGY ENHANCEMENT ACT OF 2004 (CREATE ACT) (PUB. L. 108-453, 118 STAT. 3596 (2004))",
        "(COOPERATIVE RESEARCH AND TECHNOLOGY ENHANCEMENT ACT OF 2004 (CREATE ACT) (PUB. L. 108-453, 118 STAT. 3596 (2004))",
    ),
    ("CIRID at UCLA", "CIRID at UCLA"),
];

pub(crate) fn excise_boilerplate(statement: &str) -> String {
    let len_before = statement.len();
    let mut s = LICENSING_INQUIRY.replace_all(statement, "").into_owned();

    if s.contains("Legal Counsel") || s.contains("Space and Naval Warfare Systems") {
        if s.contains("Calif") {
            s = NAVY_SAN_DIEGO.replace_all(&s, "").into_owned();
        } else if s.contains("S.C.") {
            s = NAVY_CHARLESTON.replace_all(&s, "").into_owned();
        }
    }
    if s.len() < len_before {
        s = NAVY_CASE_REFERENCE.replace_all(&s, "").into_owned();
    }

    for (trigger, removal) in TRIGGERED_LITERALS {
        if s.contains(trigger) {
            s = s.replace(removal, "");
        }
    }
    s
}

static LEADING_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0?[1-9][\s.]{1,3})?\b[A-Z&\s-]+\b").unwrap());

/// Strip an all-uppercase span (optionally numbered) at the start of the
/// statement; these are section titles fused to the statement body.
pub(crate) fn strip_leading_title(statement: &str) -> String {
    LEADING_TITLE.replace(statement, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary;
    use crate::reference;

    fn normalize_fixture(statement: &str) -> (String, bool) {
        let tables = reference::fixture();
        let dict = dictionary::fixture();
        normalize(statement, &tables.zipcodes, &dict)
    }

    #[test]
    fn decodes_known_entities_and_passes_unknown_through() {
        assert_eq!(decode_entities("grant &num;12 &amp; more"), "grant #12 & more");
        assert_eq!(decode_entities("&unknown; stays"), "&unknown; stays");
    }

    #[test]
    fn inserts_spaces_around_fused_punctuation() {
        let (s, _) = normalize_fixture("support under grant:NSF-123(awarded)by");
        assert!(s.contains("grant: NSF-123"));
        assert!(s.contains("NSF-123 (awarded) by"));
    }

    #[test]
    fn collapses_dash_runs_and_whitespace() {
        let (s, _) = normalize_fixture("grant  DE--FG02—91ER40677   here");
        assert!(s.contains("DE-FG02-91ER40677"));
        assert!(!s.contains("  "));
    }

    #[test]
    fn usc_citation_is_excised_and_sets_public_law_via_shortening() {
        let (s, public_law) = excise_laws("as provided by 35 U.S.C. 202 herein".to_string());
        assert!(!s.contains("202"));
        assert!(public_law);
    }

    #[test]
    fn public_law_flag_from_literal_presence() {
        let (_, public_law) = excise_laws("consistent with Public Law requirements".to_string());
        assert!(public_law);
        let (_, none) = excise_laws("no citations at all".to_string());
        assert!(!none);
    }

    #[test]
    fn public_law_number_is_excised() {
        let (s, public_law) = excise_laws("under Public Law 96-517 as amended".to_string());
        assert!(!s.contains("96-517"));
        assert!(public_law);
    }

    #[test]
    fn stat_citation_keeps_its_boundary_character() {
        let (s, _) = excise_laws("118 STAT. 3596 (2004)".to_string());
        assert!(!s.contains("3596"));
        assert!(s.contains('('));
    }

    #[test]
    fn zip_codes_removed_only_for_cities_in_the_table() {
        let tables = reference::fixture();
        let s = excise_zipcodes("NIH, Bethesda, Maryland 20814-9692", &tables.zipcodes);
        assert!(!s.contains("20814"));
        assert!(!s.contains("-9692"));
        let untouched = excise_zipcodes("Somewhere, Ohio 44101", &tables.zipcodes);
        assert!(untouched.contains("44101"));
    }

    #[test]
    fn redstone_arsenal_routes_through_huntsville() {
        let tables = reference::fixture();
        let s = excise_zipcodes("Redstone Arsenal, AL 35898", &tables.zipcodes);
        assert!(s.contains("Huntsville"));
        assert!(!s.contains("35898"));
    }

    #[test]
    fn serial_and_pct_references_are_excised() {
        let s = excise_postal_and_serials(
            "filed as Ser. No. 08/123, 456 and PCT/US02/12345 at P.O. Box 1450",
        );
        assert!(!s.contains("123"));
        assert!(!s.contains("PCT"));
        assert!(!s.contains("Box"));
    }

    #[test]
    fn textual_dates_are_excised_in_all_three_spellings() {
        assert!(!excise_dates("issued Dec. 16, 2019 to").contains("2019"));
        assert!(!excise_dates("issued December 16, 2019 to").contains("2019"));
        assert!(!excise_dates("issued Dec 16, 2019 to").contains("2019"));
        // A bare number is not a date.
        assert!(excise_dates("grant 162019 kept").contains("162019"));
    }

    #[test]
    fn numeric_dates_are_excised() {
        let s = excise_dates("awarded (12/16/2019) under");
        assert!(!s.contains("12/16"));
    }

    #[test]
    fn quoted_project_titles_are_excised() {
        let s = excise_titles("work entitled “Fancy Project Name” under grant");
        assert!(!s.contains("Fancy"));
        let s = excise_titles("under “Some Research” program support");
        assert!(!s.contains("Some Research"));
    }

    #[test]
    fn filename_is_excised_back_to_the_last_english_word() {
        let dict = dictionary::fixture();
        let s = excise_filenames("in the file SEQ_LISTING_0123.txt filed herein", &dict);
        assert!(!s.contains("SEQ_LISTING_0123"));
        assert!(!s.contains(".txt"));
        assert!(s.contains("file"));
        assert!(s.contains("filed herein"));
    }

    #[test]
    fn licensing_inquiry_sentence_is_excised() {
        let s = excise_boilerplate(
            "Navy rights. Licensing inquiries may be directed to techtran@navy.mil. More text",
        );
        assert!(!s.contains("Licensing"));
    }

    #[test]
    fn epa_address_requires_its_trigger() {
        let s = excise_boilerplate("Environmental Protection Agency, 1025 F St NW");
        assert!(!s.contains("1025 F St"));
        let untouched = excise_boilerplate("located at 1025 F St NW");
        assert!(untouched.contains("1025 F St"));
    }

    #[test]
    fn leading_all_caps_title_is_stripped() {
        assert_eq!(
            strip_leading_title("STATEMENT OF GOVERNMENT INTEREST This invention"),
            "This invention"
        );
        assert_eq!(
            strip_leading_title("This invention was made"),
            "This invention was made"
        );
    }

    #[test]
    fn normalize_is_idempotent_on_cleaned_text() {
        let tables = reference::fixture();
        let dict = dictionary::fixture();
        let raw = "GOVERNMENT INTEREST The government has rights under grant NSF-1234567 \
                   issued Dec. 16, 2019 per 35 U.S.C. 202, Bethesda, Maryland 20814.";
        let (once, _) = normalize(raw, &tables.zipcodes, &dict);
        let (twice, _) = normalize(&once, &tables.zipcodes, &dict);
        assert_eq!(once, twice);
    }
}
