//! Award-identifier extraction over government-interest statements.
//!
//! One statement in, one [`ExtractionResult`] out. The pipeline is pure and
//! synchronous: normalization, agency identification, candidate filtering,
//! isolation merging, and containment deduplication, all against shared
//! read-only reference tables.

pub mod agency;
pub mod merge;
pub mod normalize;
pub(crate) mod text;
pub mod tokens;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::dictionary::Dictionary;
use crate::reference::ReferenceTables;
use text::{has_digit, remove_punctuation, strip_stops};

/// The per-statement output record. `award_id` and
/// `awarding_agency_acronyms` are pipe-joined, with the empty string as the
/// no-result sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub award_id: String,
    pub public_law_statement: bool,
    pub awarding_agency_acronyms: String,
    pub potential_year: bool,
}

/// Extract candidate award identifiers from one statement.
///
/// `current_year` bounds the potential-year flag; it defaults to the current
/// calendar year when absent (callers with a per-document grant year pass it
/// through).
pub fn extract(
    statement: &str,
    tables: &ReferenceTables,
    dict: &dyn Dictionary,
    current_year: Option<i32>,
) -> ExtractionResult {
    let current_year = current_year.unwrap_or_else(|| chrono::Utc::now().year());

    let (normalized, public_law) = normalize::normalize(statement, &tables.zipcodes, dict);
    let agencies =
        agency::identify_agencies(&normalized, &tables.agencies, &tables.nih_institutes);
    let excluded = tables.excluded_acronyms();

    let prepared = tokens::prepare(&normalized);
    let stream = tokens::tokenize(&prepared);
    let flagged = tokens::flag_candidates(&prepared, &excluded, dict);

    // Every occurrence of every flagged token seeds one backward and one
    // forward merge walk over the unreduced stream.
    let distinct: BTreeSet<&String> = flagged.iter().collect();
    let mut seeds: Vec<usize> = Vec::new();
    for token in distinct {
        for (idx, tok) in stream.iter().enumerate() {
            if tok == token {
                seeds.push(idx);
            }
        }
    }

    let mut candidates: BTreeSet<String> = flagged.iter().cloned().collect();
    for &forward in &[false, true] {
        for &idx in &seeds {
            let merged = merge::merge_isolated(&stream, idx, &flagged, &excluded, dict, forward);
            candidates.extend(merged.into_candidates());
        }
    }

    let surviving: Vec<String> = candidates
        .iter()
        .map(|c| strip_stops(c))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|c| remove_punctuation(c, "").chars().count() > 4 && has_digit(c))
        .collect();

    let potential_year = surviving.iter().any(|c| tokens::is_year(c, current_year));
    let award_id = dedupe_and_join(surviving);

    ExtractionResult {
        award_id,
        public_law_statement: public_law,
        awarding_agency_acronyms: agencies.into_iter().collect::<Vec<_>>().join("|"),
        potential_year,
    }
}

/// Containment dedup and final assembly: shortest first, drop anything that
/// is a substring of a longer survivor, then join the lexicographically
/// sorted rest.
fn dedupe_and_join(mut candidates: Vec<String>) -> String {
    if candidates.is_empty() {
        return String::new();
    }
    candidates.sort_by(|a, b| {
        a.chars()
            .count()
            .cmp(&b.chars().count())
            .then_with(|| a.cmp(b))
    });
    let mut kept: Vec<String> = Vec::new();
    for (i, candidate) in candidates.iter().enumerate() {
        let contained = candidates[i + 1..]
            .iter()
            .any(|longer| longer.contains(candidate.as_str()));
        if !contained {
            kept.push(candidate.clone());
        }
    }
    kept.sort();
    kept.join("|")
}
