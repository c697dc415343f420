// src/reference/loader.rs
//
// Fail-fast loading of the persisted reference files. Missing or malformed
// tables are a configuration error reported before any statement is
// processed; the extraction pipeline itself never sees partial tables.

use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::{AgencyRow, ReferenceTables, ZipRow};

const ZIPCODE_DATABASE_URL: &str =
    "http://federalgovernmentzipcodes.us/free-zipcode-database-Primary.csv";
const DOWNLOAD_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Load the four reference tables from `data_dir`.
///
/// Expected files: `acronyms.txt` (one acronym per line), `agencies.tsv` and
/// `nih_institutes.tsv` (TAB-separated, header `ACNM\tTITLE`), `zipcodes.tsv`
/// (TAB-separated, header `City\tZipcode`, pipe-joined zip lists).
pub fn load_reference_tables(data_dir: &Path) -> Result<ReferenceTables> {
    let acronyms_path = data_dir.join("acronyms.txt");
    let acronyms: std::collections::HashSet<String> = fs::read_to_string(&acronyms_path)
        .with_context(|| format!("Failed to read acronym list {}", acronyms_path.display()))?
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    let agencies_path = data_dir.join("agencies.tsv");
    let agencies = parse_code_table(
        &fs::read_to_string(&agencies_path)
            .with_context(|| format!("Failed to read agency table {}", agencies_path.display()))?,
    )
    .with_context(|| format!("Malformed agency table {}", agencies_path.display()))?;

    let nih_path = data_dir.join("nih_institutes.tsv");
    let nih_institutes = parse_code_table(
        &fs::read_to_string(&nih_path)
            .with_context(|| format!("Failed to read NIH institute table {}", nih_path.display()))?,
    )
    .with_context(|| format!("Malformed NIH institute table {}", nih_path.display()))?;

    let zip_path = data_dir.join("zipcodes.tsv");
    let zipcodes = parse_zip_table(
        &fs::read_to_string(&zip_path)
            .with_context(|| format!("Failed to read zip code table {}", zip_path.display()))?,
    )
    .with_context(|| format!("Malformed zip code table {}", zip_path.display()))?;

    info!(
        "Loaded reference tables: {} acronyms, {} agencies, {} NIH institutes, {} cities",
        acronyms.len(),
        agencies.len(),
        nih_institutes.len(),
        zipcodes.len()
    );

    Ok(ReferenceTables {
        acronyms,
        agencies,
        nih_institutes,
        zipcodes,
    })
}

pub(crate) fn parse_code_table(content: &str) -> Result<Vec<AgencyRow>> {
    let mut lines = content.lines();
    match lines.next() {
        Some("ACNM\tTITLE") => {}
        Some(other) => bail!("Expected header 'ACNM\\tTITLE', found {:?}", other),
        None => bail!("Table is empty"),
    }
    let mut rows = Vec::new();
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.splitn(2, '\t');
        let code = parts.next().unwrap_or("").trim();
        let title = parts.next().map(str::trim).unwrap_or("");
        if code.is_empty() || title.is_empty() {
            bail!("Row {} has a missing code or title: {:?}", line_no + 2, line);
        }
        rows.push(AgencyRow {
            code: code.to_string(),
            title: title.to_string(),
        });
    }
    Ok(rows)
}

pub(crate) fn parse_zip_table(content: &str) -> Result<Vec<ZipRow>> {
    let mut lines = content.lines();
    match lines.next() {
        Some("City\tZipcode") => {}
        Some(other) => bail!("Expected header 'City\\tZipcode', found {:?}", other),
        None => bail!("Table is empty"),
    }
    let mut rows = Vec::new();
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.splitn(2, '\t');
        let city = parts.next().unwrap_or("").trim();
        let zipcodes = parts.next().map(str::trim).unwrap_or("");
        if city.is_empty() || zipcodes.is_empty() {
            bail!("Row {} has a missing city or zip list: {:?}", line_no + 2, line);
        }
        if !zipcodes.chars().all(|c| c.is_ascii_digit() || c == '|') {
            bail!(
                "Row {} has a zip list with unexpected characters: {:?}",
                line_no + 2,
                line
            );
        }
        rows.push(ZipRow {
            city: city.to_string(),
            zipcodes: zipcodes.to_string(),
        });
    }
    Ok(rows)
}

/// Build `zipcodes.tsv` from the public zip-code database when it is missing.
///
/// The full database is reduced to the cities actually observed in the input
/// statements, Huntsville is always kept (the Redstone Arsenal substitution
/// targets it), and Bethesda gets the legacy 20014 code appended.
pub async fn ensure_zipcode_table(data_dir: &Path, statements: &[String]) -> Result<()> {
    let zip_path = data_dir.join("zipcodes.tsv");
    if zip_path.exists() {
        return Ok(());
    }
    info!(
        "{} is missing; downloading the public zip code database (this takes a while)",
        zip_path.display()
    );

    let client = reqwest::Client::new();
    let body = loop {
        match client.get(ZIPCODE_DATABASE_URL).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => break body,
                Err(e) => {
                    warn!("Failed to read zip code database body: {}; retrying", e);
                    tokio::time::sleep(DOWNLOAD_RETRY_DELAY).await;
                }
            },
            Ok(resp) => {
                warn!(
                    "Zip code database returned status {}; retrying",
                    resp.status()
                );
                tokio::time::sleep(DOWNLOAD_RETRY_DELAY).await;
            }
            Err(e) => {
                warn!("Zip code database request failed: {}; retrying", e);
                tokio::time::sleep(DOWNLOAD_RETRY_DELAY).await;
            }
        }
    };

    let mut by_city: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for line in body.lines().skip(1) {
        let cols: Vec<&str> = line.split(',').map(|c| c.trim_matches('"')).collect();
        if cols.len() < 3 {
            continue;
        }
        let zip = cols[0].trim();
        let city = title_case(cols[2].trim());
        if zip.is_empty() || city.is_empty() {
            continue;
        }
        by_city.entry(city).or_default().push(zip.to_string());
    }

    let mut rows = Vec::new();
    for (city, zips) in by_city {
        let keep = city == "Huntsville" || statements.iter().any(|s| s.contains(&city));
        if !keep {
            continue;
        }
        let mut joined = zips.join("|");
        if city == "Bethesda" {
            // Statements can carry the pre-1980s Bethesda code.
            joined.push_str("|20014");
        }
        rows.push(format!("{}\t{}", city, joined));
    }

    let mut out = String::from("City\tZipcode\n");
    out.push_str(&rows.join("\n"));
    out.push('\n');
    fs::write(&zip_path, out)
        .with_context(|| format!("Failed to write {}", zip_path.display()))?;
    info!("Wrote {} ({} cities)", zip_path.display(), rows.len());
    Ok(())
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_table_requires_exact_header() {
        assert!(parse_code_table("ACNM\tTITLE\nNSF\tNATIONAL SCIENCE FOUNDATION\n").is_ok());
        assert!(parse_code_table("CODE\tNAME\nNSF\tNATIONAL SCIENCE FOUNDATION\n").is_err());
        assert!(parse_code_table("").is_err());
    }

    #[test]
    fn code_table_rejects_partial_rows() {
        let err = parse_code_table("ACNM\tTITLE\nNSF\n").unwrap_err();
        assert!(err.to_string().contains("Row 2"));
    }

    #[test]
    fn zip_table_parses_pipe_joined_lists() {
        let rows = parse_zip_table("City\tZipcode\nBethesda\t20814|20014\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].city, "Bethesda");
        assert_eq!(rows[0].zipcodes, "20814|20014");
        assert!(parse_zip_table("City\tZipcode\nBethesda\t20814;20014\n").is_err());
    }

    #[test]
    fn title_case_matches_city_formatting() {
        assert_eq!(title_case("REDSTONE ARSENAL"), "Redstone Arsenal");
        assert_eq!(title_case("bethesda"), "Bethesda");
    }
}
