//! Checks nutrition and health claims against the biomedical literature.
//!
//! A claim goes through extraction (`(subject, effect)` via a language
//! model), enrichment (synonyms and standard vocabulary), a paced PubMed
//! search, and a deterministic analysis that yields a [`models::Verdict`].
//! Verdicts can optionally be published to a knowledge ledger.

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod intelligence;
pub mod llm;
pub mod models;
pub mod publisher;
pub mod pubmed;
pub mod services;

pub use error::{CheckError, Result};
