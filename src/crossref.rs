//! Award identifiers reported for publications by the Crossref works API.
//!
//! This is an enrichment source over the same award domain, independent of
//! the statement extraction pipeline: given a batch of DOIs it returns the
//! award ids their funders report. Transport failures and non-200 responses
//! are retryable, never fatal.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

const WORKS_ENDPOINT: &str = "https://api.crossref.org/works";
const BATCH_SIZE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_DELAY: Duration = Duration::from_secs(10);

/// One (DOI, award) row. `award_id` is `None` when a funder reports no
/// award for the work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AwardRecord {
    pub doi: String,
    pub award_id: Option<String>,
}

#[derive(Deserialize)]
struct WorksResponse {
    message: WorksMessage,
}

#[derive(Deserialize)]
struct WorksMessage {
    #[serde(default)]
    items: Vec<WorkItem>,
}

#[derive(Deserialize)]
struct WorkItem {
    #[serde(rename = "DOI")]
    doi: String,
    #[serde(default)]
    funder: Option<Vec<Funder>>,
}

#[derive(Deserialize)]
struct Funder {
    #[serde(default)]
    award: Option<Vec<String>>,
}

/// Collect the award ids Crossref reports for `dois`, querying in batches of
/// at most 100 with the polite-pool contact address attached.
pub async fn collect_award_ids(dois: &[String], mailto: &str) -> Result<Vec<AwardRecord>> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build Crossref HTTP client")?;

    let mut records = Vec::new();
    for (batch_no, chunk) in dois.chunks(BATCH_SIZE).enumerate() {
        let mut filter = chunk
            .iter()
            .map(|doi| format!("doi:{}", doi))
            .collect::<Vec<_>>()
            .join(",");
        filter.push_str(",has-funder:true");

        let response = loop {
            let attempt = client
                .get(WORKS_ENDPOINT)
                .query(&[
                    ("filter", filter.as_str()),
                    ("select", "DOI,funder"),
                    ("mailto", mailto),
                ])
                .send()
                .await;
            match attempt {
                Ok(resp) if resp.status() == reqwest::StatusCode::OK => break resp,
                Ok(resp) => {
                    warn!(
                        "Crossref batch {} returned status {}; retrying in {:?}",
                        batch_no + 1,
                        resp.status(),
                        RETRY_DELAY
                    );
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => {
                    warn!(
                        "Crossref batch {} request failed: {}; retrying in {:?}",
                        batch_no + 1,
                        e,
                        RETRY_DELAY
                    );
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        };

        let works: WorksResponse = response
            .json()
            .await
            .context("Failed to decode Crossref works response")?;
        debug!(
            "Crossref batch {}: {} works returned",
            batch_no + 1,
            works.message.items.len()
        );
        records.extend(flatten_items(works.message.items));
    }

    let mut seen = HashSet::new();
    records.retain(|record| seen.insert(record.clone()));
    Ok(records)
}

/// Flatten the nested funder/award arrays into one row per reported award.
fn flatten_items(items: Vec<WorkItem>) -> Vec<AwardRecord> {
    let mut records = Vec::new();
    for item in items {
        match item.funder {
            Some(funders) if !funders.is_empty() => {
                for funder in funders {
                    match funder.award {
                        Some(awards) if !awards.is_empty() => {
                            records.extend(awards.into_iter().map(|award| AwardRecord {
                                doi: item.doi.clone(),
                                award_id: Some(award),
                            }));
                        }
                        _ => records.push(AwardRecord {
                            doi: item.doi.clone(),
                            award_id: None,
                        }),
                    }
                }
            }
            _ => records.push(AwardRecord {
                doi: item.doi.clone(),
                award_id: None,
            }),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_expands_awards_and_keeps_empty_funders() {
        let items: Vec<WorkItem> = serde_json::from_str(
            r#"[
                {"DOI": "10.1/a", "funder": [{"award": ["NSF-1", "NSF-2"]}, {}]},
                {"DOI": "10.1/b", "funder": [{"award": []}]},
                {"DOI": "10.1/c"}
            ]"#,
        )
        .unwrap();
        let records = flatten_items(items);
        assert_eq!(
            records,
            vec![
                AwardRecord {
                    doi: "10.1/a".to_string(),
                    award_id: Some("NSF-1".to_string())
                },
                AwardRecord {
                    doi: "10.1/a".to_string(),
                    award_id: Some("NSF-2".to_string())
                },
                AwardRecord {
                    doi: "10.1/a".to_string(),
                    award_id: None
                },
                AwardRecord {
                    doi: "10.1/b".to_string(),
                    award_id: None
                },
                AwardRecord {
                    doi: "10.1/c".to_string(),
                    award_id: None
                },
            ]
        );
    }
}
