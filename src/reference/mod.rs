//! Static reference tables consumed by the extraction pipeline.
//!
//! All four tables are built once by the loader and shared read-only across
//! statement workers; nothing in the pipeline mutates them.

pub mod loader;

use std::collections::HashSet;

/// One agency (or NIH institute) row: canonical code plus full name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgencyRow {
    pub code: String,
    pub title: String,
}

/// One city row. `zipcodes` is the pipe-joined list of zip codes for the
/// city, kept in joined form because the normalizer uses it verbatim as a
/// removal alternation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipRow {
    pub city: String,
    pub zipcodes: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub acronyms: HashSet<String>,
    pub agencies: Vec<AgencyRow>,
    pub nih_institutes: Vec<AgencyRow>,
    pub zipcodes: Vec<ZipRow>,
}

impl ReferenceTables {
    /// The acronym set actually used for token exclusion: the loaded acronym
    /// list unioned with the NIH institute codes.
    pub fn excluded_acronyms(&self) -> HashSet<String> {
        let mut set = self.acronyms.clone();
        set.extend(self.nih_institutes.iter().map(|row| row.code.clone()));
        set
    }
}

#[cfg(test)]
pub(crate) fn fixture() -> ReferenceTables {
    let agency = |code: &str, title: &str| AgencyRow {
        code: code.to_string(),
        title: title.to_string(),
    };
    ReferenceTables {
        acronyms: ["NSF", "ARO", "ONR", "DOE", "NASA", "SBIR", "STTR", "ARMY", "NAVY", "LLC"]
            .into_iter()
            .map(str::to_string)
            .collect(),
        agencies: vec![
            agency("NSF", "NATIONAL SCIENCE FOUNDATION"),
            agency("DOE", "DEPARTMENT OF ENERGY"),
            agency("NASA", "NATIONAL AERONAUTICS AND SPACE ADMINISTRATION"),
            agency("ARO", "ARMY RESEARCH OFFICE"),
            agency("ONR", "OFFICE OF NAVAL RESEARCH"),
            agency("NIH", "NATIONAL INSTITUTES OF HEALTH"),
            agency("NRSA", "NATIONAL RESEARCH SERVICE AWARD"),
            agency("DARPA", "DEFENSE ADVANCED RESEARCH PROJECTS AGENCY"),
            agency("ARPA-E", "ADVANCED RESEARCH PROJECTS AGENCY-ENERGY"),
            agency("EPA", "ENVIRONMENTAL PROTECTION AGENCY"),
        ],
        nih_institutes: vec![
            agency("NCI", "National Cancer Institute"),
            agency("NIAID", "National Institute of Allergy and Infectious Diseases"),
        ],
        zipcodes: vec![
            ZipRow {
                city: "Bethesda".to_string(),
                zipcodes: "20814|20892|20014".to_string(),
            },
            ZipRow {
                city: "Huntsville".to_string(),
                zipcodes: "35801|35898".to_string(),
            },
        ],
    }
}
