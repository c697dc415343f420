// src/extraction/agency.rs
//
// Canonical awarding-agency codes for a normalized statement. Matching is
// table driven except for three fixed service branches and the ARPA family,
// where "ARPA" alone must not be read as DARPA when the statement is really
// naming ARPA-E.

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use super::text::remove_punctuation;
use crate::reference::AgencyRow;

/// The one code excluded from table-driven matching; the ARPA special case
/// below owns it.
const TABLE_EXCLUDED_CODE: &str = "DARPA";

const ARMY_CODE: &str = "USA";
const NAVY_CODE: &str = "USN";
const AIR_FORCE_CODE: &str = "USAF";
const NIH_CODE: &str = "NIH";

/// Sub-agency codes folded into their parent program code when both match.
const SUBSUMED_CODES: &[(&str, &str)] = &[("NRSA", "NIH")];

static ARPA_ENERGY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(advanced research projects agency|ARPA)\s*(E|energy)").unwrap());
static ARPA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(advanced research projects agency|ARPA)").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Identify every agency named in the statement, returned as a deduplicated
/// code set.
pub fn identify_agencies(
    statement: &str,
    agencies: &[AgencyRow],
    nih_institutes: &[AgencyRow],
) -> BTreeSet<String> {
    // Unify dotted spellings ("N.A.S.A.") with the bare acronym, then turn
    // the remaining punctuation except hyphens into spaces.
    let mut s = statement.replace('.', "");
    s = s
        .chars()
        .map(|c| {
            if c.is_ascii_punctuation() && c != '-' {
                ' '
            } else {
                c
            }
        })
        .collect();
    s = WHITESPACE_RUN.replace_all(&s, " ").into_owned();
    let s_low = s.to_lowercase();

    let mut codes: BTreeSet<String> = BTreeSet::new();

    for row in agencies {
        let code = remove_punctuation(&row.code, "-");
        if code == TABLE_EXCLUDED_CODE {
            continue;
        }
        let title = remove_punctuation(&row.title.to_lowercase(), "-");
        let matched = word_in(&code, &s)
            || word_in(&format!("US{}", code), &s)
            || word_in(&title, &s_low)
            || word_in(&title.replace("department", "dept"), &s_low);
        if matched {
            codes.insert(code);
        }
    }

    if word_in("Army", &s) {
        codes.insert(ARMY_CODE.to_string());
    }
    if word_in("Navy", &s) {
        codes.insert(NAVY_CODE.to_string());
    }
    if word_in("Air Force", &s) {
        codes.insert(AIR_FORCE_CODE.to_string());
    }

    if !codes.contains(NIH_CODE) {
        if word_in("National Institute of Health", &s) {
            codes.insert(NIH_CODE.to_string());
        } else {
            for row in nih_institutes {
                let code = remove_punctuation(&row.code, "-");
                let title = remove_punctuation(&row.title.to_lowercase(), "-");
                if word_in(&code, &s) || word_in(&title, &s_low) {
                    codes.insert(NIH_CODE.to_string());
                    break;
                }
            }
        }
    }

    for (sub, parent) in SUBSUMED_CODES {
        if codes.remove(*sub) {
            codes.insert(parent.to_string());
        }
    }

    let s_nohyphen = s.replace('-', "");
    let s_low_nohyphen = s_low.replace('-', "");
    if ARPA_ENERGY.is_match(&s_nohyphen) || ARPA_ENERGY.is_match(&s_low_nohyphen) {
        codes.insert("DOE".to_string());
    } else if ARPA.is_match(&s) || ARPA.is_match(&s_low) {
        codes.insert(TABLE_EXCLUDED_CODE.to_string());
    }

    codes
}

/// Whole-word containment.
fn word_in(word: &str, text: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    match Regex::new(&format!(r"\b{}\b", regex::escape(word))) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            warn!("Invalid word pattern for {:?}: {}", word, e);
            false
        }
    }
}
