//! # trialmatch core
//!
//! Eligibility matching of patients against recruiting clinical trials.
//!
//! This crate contains the matching engine and no transport concerns:
//! - Duration normalisation and criteria splitting
//! - Structured age/sex rules and exclusion-clause evaluation
//! - Per-patient orchestration over a [`TrialRegistry`] and a [`ClauseJudge`]
//! - JSON and CSV rendering of the results
//!
//! **No API concerns**: the ClinicalTrials.gov client lives in `trialmatch-registry`, the
//! language-model judge in `trialmatch-llm`, and the CLI/REST front ends in their own crates.

pub mod config;
pub mod constants;
pub mod criteria;
pub mod duration;
pub mod eligibility;
pub mod error;
pub mod exclusion;
pub mod judge;
pub mod matching;
pub mod output;
pub mod patient;
pub mod result;
pub mod retry;
pub mod structured;
pub mod trial;

pub use config::{MatchConfig, MatchConfigValues};
pub use criteria::{split_criteria, CriteriaSections};
pub use duration::{normalize_duration, AgeBound};
pub use eligibility::{evaluate_trial, Disqualification, Verdict};
pub use error::{MatchError, MatchResult};
pub use exclusion::exclusion_clauses;
pub use judge::{AbstainingJudge, ClauseJudge, Judgment, KeywordJudge};
pub use matching::Matcher;
pub use patient::{ClinicalFacts, PatientProfile};
pub use result::{EligibilityResult, MatchingSummary};
pub use retry::RetryPolicy;
pub use trial::{RegistryQuery, TrialRecord, TrialRegistry};
pub use trialmatch_types::{NonEmptyText, Sex, SexEligibility};
