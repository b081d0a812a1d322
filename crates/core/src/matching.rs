//! Per-patient orchestration: registry queries, trial evaluation and result assembly.

use crate::config::MatchConfig;
use crate::eligibility::{evaluate_trial, Verdict};
use crate::judge::ClauseJudge;
use crate::patient::PatientProfile;
use crate::result::{EligibilityResult, MatchingSummary};
use crate::trial::{RegistryQuery, TrialRecord, TrialRegistry};
use crate::MatchError;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Matches patients against the trials a registry returns for their conditions.
pub struct Matcher<R, J>
where
    R: TrialRegistry + ?Sized,
    J: ClauseJudge + ?Sized,
{
    registry: Arc<R>,
    judge: Arc<J>,
    cfg: Arc<MatchConfig>,
}

impl<R, J> Clone for Matcher<R, J>
where
    R: TrialRegistry + ?Sized,
    J: ClauseJudge + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            judge: Arc::clone(&self.judge),
            cfg: Arc::clone(&self.cfg),
        }
    }
}

impl<R, J> Matcher<R, J>
where
    R: TrialRegistry + ?Sized,
    J: ClauseJudge + ?Sized,
{
    pub fn new(registry: Arc<R>, judge: Arc<J>, cfg: Arc<MatchConfig>) -> Self {
        Self {
            registry,
            judge,
            cfg,
        }
    }

    /// Builds the summary of every trial `patient` is eligible for.
    ///
    /// One recruiting query is issued per condition. A failed query contributes no trials;
    /// a trial with a malformed age limit is skipped. Results keep condition order, then
    /// registry order. With deduplication on, a trial returned for several conditions is
    /// evaluated once, at its first position.
    pub async fn match_patient(&self, patient: &PatientProfile) -> MatchingSummary {
        let patient_id = patient.patient_id().as_str();
        let queries: Vec<RegistryQuery> = patient
            .conditions()
            .iter()
            .map(RegistryQuery::recruiting)
            .collect();

        let semaphore = Semaphore::new(self.cfg.max_concurrent_queries());
        let per_condition = join_all(queries.iter().map(|query| {
            let semaphore = &semaphore;
            async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return Vec::new();
                };
                self.fetch(query).await
            }
        }))
        .await;

        let candidates = self.unique_candidates(patient_id, per_condition);
        let mut summary = MatchingSummary::new(patient_id);
        summary.eligible_trials = self.evaluate_candidates(patient, candidates).await;

        tracing::info!(
            patient_id,
            conditions = queries.len(),
            eligible = summary.eligible_trials.len(),
            "patient matched"
        );
        summary
    }

    /// Matches every patient, at most `max_concurrent_patients` at a time. Output order
    /// follows `patients`.
    pub async fn match_patients(&self, patients: &[PatientProfile]) -> Vec<MatchingSummary> {
        let semaphore = Semaphore::new(self.cfg.max_concurrent_patients());
        join_all(patients.iter().map(|patient| {
            let semaphore = &semaphore;
            async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return MatchingSummary::new(patient.patient_id().as_str());
                };
                self.match_patient(patient).await
            }
        }))
        .await
    }

    async fn fetch(&self, query: &RegistryQuery) -> Vec<TrialRecord> {
        match self.registry.search(query).await {
            Ok(trials) => {
                tracing::debug!(condition = %query.condition, trials = trials.len(), "registry query complete");
                trials
            }
            Err(e) => {
                tracing::warn!(
                    condition = %query.condition,
                    error = %e,
                    "registry query failed; no trials for this condition"
                );
                Vec::new()
            }
        }
    }

    /// Flattens per-condition candidates, dropping repeated trial ids when configured.
    fn unique_candidates(
        &self,
        patient_id: &str,
        per_condition: Vec<Vec<TrialRecord>>,
    ) -> Vec<TrialRecord> {
        let all = per_condition.into_iter().flatten();
        if !self.cfg.deduplicate_trials() {
            return all.collect();
        }
        let mut seen = HashSet::new();
        all.filter(|trial| {
            let first = seen.insert(trial.trial_id.as_str().to_string());
            if !first {
                tracing::debug!(patient_id, trial_id = %trial.trial_id, "duplicate trial dropped");
            }
            first
        })
        .collect()
    }

    async fn evaluate_candidates(
        &self,
        patient: &PatientProfile,
        candidates: Vec<TrialRecord>,
    ) -> Vec<EligibilityResult> {
        let judge = self.judge.as_ref();
        let verdicts = join_all(
            candidates
                .iter()
                .map(|trial| evaluate_trial(patient, trial, judge)),
        )
        .await;

        candidates
            .into_iter()
            .zip(verdicts)
            .filter_map(|(trial, verdict)| into_result(patient, trial, verdict))
            .collect()
    }
}

fn into_result(
    patient: &PatientProfile,
    trial: TrialRecord,
    verdict: Result<Verdict, MatchError>,
) -> Option<EligibilityResult> {
    let patient_id = patient.patient_id().as_str();
    let trial_id = trial.trial_id.as_str();
    match verdict {
        Ok(Verdict::Disqualified(reason)) => {
            tracing::debug!(patient_id, trial_id, %reason, "trial disqualified");
            None
        }
        Ok(passed) => {
            let justifications = passed.into_justifications()?;
            Some(EligibilityResult {
                trial_id: trial.trial_id.to_string(),
                trial_name: trial.title,
                eligibility_criteria_meet: justifications,
            })
        }
        Err(e) => {
            tracing::warn!(patient_id, trial_id, error = %e, "trial skipped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::{AbstainingJudge, Judgment, KeywordJudge};
    use crate::patient::ClinicalFacts;
    use crate::retry::RetryPolicy;
    use crate::MatchResult;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use trialmatch_types::{NonEmptyText, Sex, SexEligibility};

    /// Registry serving canned trials per condition. Unknown conditions fail.
    #[derive(Default)]
    struct FakeRegistry {
        trials: HashMap<String, Vec<TrialRecord>>,
        queries: Mutex<Vec<RegistryQuery>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FakeRegistry {
        fn with(mut self, condition: &str, trials: Vec<TrialRecord>) -> Self {
            self.trials.insert(condition.to_string(), trials);
            self
        }
    }

    #[async_trait]
    impl TrialRegistry for FakeRegistry {
        async fn search(&self, query: &RegistryQuery) -> MatchResult<Vec<TrialRecord>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.queries.lock().unwrap().push(query.clone());
            self.trials
                .get(&query.condition)
                .cloned()
                .ok_or_else(|| MatchError::RegistryUnavailable {
                    condition: query.condition.clone(),
                    reason: "HTTP 503".into(),
                })
        }
    }

    fn trial(id: &str, min: Option<&str>, criteria: &str) -> TrialRecord {
        TrialRecord {
            trial_id: NonEmptyText::new(id).unwrap(),
            title: format!("Study {id}"),
            sex: SexEligibility::All,
            minimum_age: min.map(str::to_string),
            maximum_age: None,
            eligibility_criteria: criteria.to_string(),
        }
    }

    fn patient(id: &str, conditions: &[&str]) -> PatientProfile {
        PatientProfile::new(
            NonEmptyText::new(id).unwrap(),
            45.0,
            Sex::Female,
            conditions.iter().map(|c| c.to_string()),
            vec![],
            vec!["Warfarin".to_string()],
        )
        .unwrap()
    }

    fn config(dedup: bool, queries: usize) -> Arc<MatchConfig> {
        Arc::new(
            MatchConfig::new(
                "http://localhost/studies".into(),
                Duration::from_secs(1),
                RetryPolicy::no_retry(),
                queries,
                2,
                dedup,
                None,
            )
            .unwrap(),
        )
    }

    fn matcher<J: ClauseJudge>(
        registry: FakeRegistry,
        judge: J,
        cfg: Arc<MatchConfig>,
    ) -> (Matcher<FakeRegistry, J>, Arc<FakeRegistry>) {
        let registry = Arc::new(registry);
        (
            Matcher::new(Arc::clone(&registry), Arc::new(judge), cfg),
            registry,
        )
    }

    const ADULTS: &str = "Inclusion Criteria:\n* Adults of age 18 or older";

    #[tokio::test]
    async fn assembles_in_condition_then_registry_order() {
        let registry = FakeRegistry::default()
            .with("Asthma", vec![trial("NCT1", Some("18 Years"), ADULTS), trial("NCT2", None, ADULTS)])
            .with("Diabetes", vec![trial("NCT3", Some("18 Years"), ADULTS)]);
        let (m, registry) = matcher(registry, AbstainingJudge, config(true, 4));

        let summary = m.match_patient(&patient("p1", &["Diabetes", "Asthma"])).await;

        let ids: Vec<_> = summary.eligible_trials.iter().map(|r| r.trial_id.as_str()).collect();
        // conditions iterate in sorted order
        assert_eq!(ids, vec!["NCT1", "NCT2", "NCT3"]);
        assert_eq!(summary.patient_id, "p1");
        assert_eq!(registry.queries.lock().unwrap().len(), 2);
        assert!(registry
            .queries
            .lock()
            .unwrap()
            .iter()
            .all(|q| q.overall_status == "RECRUITING"));
    }

    #[tokio::test]
    async fn failed_condition_query_contributes_nothing() {
        let registry = FakeRegistry::default().with("Asthma", vec![trial("NCT1", None, ADULTS)]);
        let (m, _) = matcher(registry, AbstainingJudge, config(true, 4));

        let summary = m.match_patient(&patient("p1", &["Asthma", "Unreachable"])).await;
        assert_eq!(summary.eligible_trials.len(), 1);
        assert_eq!(summary.eligible_trials[0].trial_id, "NCT1");
    }

    #[tokio::test]
    async fn duplicates_across_conditions_follow_config() {
        let shared = trial("NCT9", None, ADULTS);
        let registry = || {
            FakeRegistry::default()
                .with("Asthma", vec![shared.clone()])
                .with("Diabetes", vec![shared.clone()])
        };

        let (dedup, _) = matcher(registry(), AbstainingJudge, config(true, 4));
        let summary = dedup.match_patient(&patient("p1", &["Asthma", "Diabetes"])).await;
        assert_eq!(summary.eligible_trials.len(), 1);

        let (keep, _) = matcher(registry(), AbstainingJudge, config(false, 4));
        let summary = keep.match_patient(&patient("p1", &["Asthma", "Diabetes"])).await;
        assert_eq!(summary.eligible_trials.len(), 2);
    }

    /// Disqualifies on its first call only, and counts every call.
    #[derive(Default)]
    struct FirstCallDisqualifies {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ClauseJudge for FirstCallDisqualifies {
        async fn judge(&self, _clause: &str, _facts: ClinicalFacts<'_>) -> MatchResult<Judgment> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(Judgment::Disqualified)
            } else {
                Ok(Judgment::Justification("Patient does not smoke".into()))
            }
        }
    }

    #[tokio::test]
    async fn duplicate_trial_is_judged_once() {
        let shared = trial(
            "NCT9",
            None,
            "Inclusion Criteria:\n* Adults\nExclusion Criteria:\n* Current smoker",
        );
        let registry = || {
            FakeRegistry::default()
                .with("Asthma", vec![shared.clone()])
                .with("Diabetes", vec![shared.clone()])
        };
        let conditions = ["Asthma", "Diabetes"];

        let registry_once = Arc::new(registry());
        let judge = Arc::new(FirstCallDisqualifies::default());
        let m = Matcher::new(registry_once, Arc::clone(&judge), config(true, 4));
        let summary = m.match_patient(&patient("p1", &conditions)).await;
        assert_eq!(judge.calls.load(Ordering::SeqCst), 1);
        assert!(summary.is_empty());

        let judge = Arc::new(FirstCallDisqualifies::default());
        let m = Matcher::new(Arc::new(registry()), Arc::clone(&judge), config(false, 4));
        let summary = m.match_patient(&patient("p1", &conditions)).await;
        assert_eq!(judge.calls.load(Ordering::SeqCst), 2);
        assert_eq!(summary.eligible_trials.len(), 1);
    }

    #[tokio::test]
    async fn malformed_and_excluded_trials_are_dropped() {
        let registry = FakeRegistry::default().with(
            "Asthma",
            vec![
                trial("NCT1", Some("18 Fortnights"), ADULTS),
                trial(
                    "NCT2",
                    None,
                    "Inclusion Criteria:\n* Adults\nExclusion Criteria:\n* Current warfarin use",
                ),
                trial("NCT3", None, "Inclusion Criteria:\n* Adults\nExclusion Criteria:\n* Pregnancy"),
            ],
        );
        let (m, _) = matcher(registry, KeywordJudge, config(true, 4));

        let summary = m.match_patient(&patient("p1", &["Asthma"])).await;
        assert_eq!(summary.eligible_trials.len(), 1);
        let result = &summary.eligible_trials[0];
        assert_eq!(result.trial_id, "NCT3");
        assert_eq!(result.trial_name, "Study NCT3");
        assert_eq!(result.eligibility_criteria_meet.len(), 3);
    }

    #[tokio::test]
    async fn query_concurrency_is_bounded() {
        let conditions = ["A", "B", "C", "D", "E", "F"];
        let registry = conditions
            .iter()
            .fold(FakeRegistry::default(), |r, c| r.with(c, vec![]));
        let (m, registry) = matcher(registry, AbstainingJudge, config(true, 2));

        let summary = m.match_patient(&patient("p1", &conditions)).await;
        assert!(summary.is_empty());
        assert!(registry.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(registry.queries.lock().unwrap().len(), conditions.len());
    }

    #[tokio::test]
    async fn match_patients_preserves_input_order() {
        let registry = FakeRegistry::default().with("Asthma", vec![trial("NCT1", None, ADULTS)]);
        let (m, _) = matcher(registry, AbstainingJudge, config(true, 4));

        let patients = vec![
            patient("zeta", &["Asthma"]),
            patient("alpha", &[]),
            patient("mid", &["Asthma"]),
        ];
        let summaries = m.match_patients(&patients).await;
        let ids: Vec<_> = summaries.iter().map(|s| s.patient_id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
        assert!(summaries[1].is_empty());
        assert_eq!(summaries[2].eligible_trials.len(), 1);
    }
}
