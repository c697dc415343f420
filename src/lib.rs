//! Candidate award-identifier extraction from the government-interest
//! statements of US patents, plus the collaborators around it: reference
//! table loading, organization legal-name normalization, Crossref award
//! lookups, and file checksumming.
//!
//! The core entry point is [`extraction::extract`]: one statement in, one
//! [`extraction::ExtractionResult`] out, pure and synchronous against shared
//! read-only [`reference::ReferenceTables`].

pub mod checksum;
pub mod cli;
pub mod crossref;
pub mod dictionary;
pub mod extraction;
pub mod names;
pub mod reference;
