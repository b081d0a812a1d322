//! Prompt construction and reply interpretation.

use std::collections::BTreeSet;
use trialmatch_core::{ClinicalFacts, Judgment};

/// Role instruction sent with every prompt.
pub const SYSTEM_PROMPT: &str = "You are a medical eligibility evaluator.";

/// Reply that marks the patient as meeting the exclusion criterion.
pub const FAIL_REPLY: &str = "FAIL";

fn list(names: &BTreeSet<String>) -> String {
    if names.is_empty() {
        return "none recorded".to_string();
    }
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// User prompt asking whether the patient meets `clause`.
pub fn build_prompt(clause: &str, facts: ClinicalFacts<'_>) -> String {
    format!(
        "A patient is being evaluated for eligibility in a clinical trial.\n\
         The exclusion criterion being checked is: \"{clause}\".\n\
         \n\
         Patient details:\n\
         - Conditions: {conditions}\n\
         - Findings: {findings}\n\
         - Medications: {medications}\n\
         \n\
         If the patient meets the exclusion criterion, respond with only \"FAIL\".\n\
         Otherwise, provide a sentence of why the patient is eligible.",
        conditions = list(facts.conditions),
        findings = list(facts.findings),
        medications = list(facts.medications),
    )
}

/// Markup a model may wrap around its answer.
fn is_decoration(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | '*' | '_' | '`' | '#' | '>')
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty())
}

/// Maps the model's reply to a judgment.
///
/// Markdown, quotes and case are ignored. A reply whose first word is `FAIL` disqualifies.
/// A reply that mentions `FAIL` anywhere else, or that is not a sentence, carries no
/// opinion.
pub fn interpret_reply(reply: &str) -> Judgment {
    let text = reply.trim_matches(is_decoration);
    let mut tokens = words(text);
    let Some(first) = tokens.next() else {
        return Judgment::NoOpinion;
    };
    if first.eq_ignore_ascii_case(FAIL_REPLY) {
        return Judgment::Disqualified;
    }

    let starts_with_letter = text.chars().next().is_some_and(char::is_alphabetic);
    let mut rest = tokens.peekable();
    let is_sentence = starts_with_letter && rest.peek().is_some();
    if !is_sentence || rest.any(|w| w.eq_ignore_ascii_case(FAIL_REPLY)) {
        tracing::debug!(reply, "unrecognised model reply");
        return Judgment::NoOpinion;
    }
    Judgment::Justification(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_facts_and_clause() {
        let conditions: BTreeSet<String> = ["Asthma", "Hypertension"].iter().map(|s| s.to_string()).collect();
        let empty = BTreeSet::new();
        let facts = ClinicalFacts {
            conditions: &conditions,
            findings: &empty,
            medications: &empty,
        };
        let prompt = build_prompt("Current smoker", facts);
        assert!(prompt.contains("\"Current smoker\""));
        assert!(prompt.contains("- Conditions: Asthma, Hypertension"));
        assert!(prompt.contains("- Findings: none recorded"));
        assert!(prompt.contains("respond with only \"FAIL\""));
    }

    #[test]
    fn replies_map_to_judgments() {
        for reply in [
            "FAIL",
            " \"FAIL.\"\n",
            "fail",
            "Fail.",
            "FAIL: the patient has type 2 diabetes",
            "**FAIL**",
            "> `fail`",
        ] {
            assert_eq!(interpret_reply(reply), Judgment::Disqualified, "{reply:?}");
        }

        assert_eq!(
            interpret_reply("The patient has no history of smoking.\n"),
            Judgment::Justification("The patient has no history of smoking.".into())
        );
        assert_eq!(
            interpret_reply("**Eligible: no recorded pregnancy.**"),
            Judgment::Justification("Eligible: no recorded pregnancy.".into())
        );
    }

    #[test]
    fn unclear_replies_carry_no_opinion() {
        for reply in [
            "   ",
            "...",
            "**",
            "Eligible",
            "42 is the answer",
            "The patient meets this criterion, so FAIL.",
            "Patient is eligible, not a fail",
        ] {
            assert_eq!(interpret_reply(reply), Judgment::NoOpinion, "{reply:?}");
        }
    }
}
