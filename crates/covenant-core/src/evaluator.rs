//! Violation evaluation over a loaded rule set.
//!
//! [`evaluate`] is a pure function of its four inputs: no clock, no
//! randomness, no hidden state. Same inputs always produce the same ordered
//! violation list and score, which is what makes the engine auditable and
//! trivially safe to call concurrently.

use crate::rules::{Rule, RuleKind, RuleSet};
use crate::types::{EvaluationResult, Violation, ViolationKind};

/// Flat score penalty per violation.
const VIOLATION_PENALTY: u32 = 10;

/// Evaluate generated text against a rule set.
///
/// Rules are processed in rule-set order, each one independently over the
/// full input:
///
/// - Keyword rules search `input_text` for each keyword in configured order,
///   then independently `output_text`. A keyword present in both fields
///   fires twice, once per field; a keyword repeated within one field fires
///   once for that field.
/// - Role rules compare `role` against the allow-list case-insensitively
///   and fire at most once per evaluation.
/// - Inert and unrecognized rule kinds never match.
pub fn evaluate(
    input_text: &str,
    output_text: &str,
    role: &str,
    rules: &RuleSet,
) -> EvaluationResult {
    let input_lower = input_text.to_lowercase();
    let output_lower = output_text.to_lowercase();
    let role_lower = role.to_lowercase();

    let mut violations = Vec::new();

    for rule in rules {
        match &rule.kind {
            RuleKind::Keyword { keywords } => {
                push_keyword_matches(&input_lower, keywords, rule, &mut violations);
                push_keyword_matches(&output_lower, keywords, rule, &mut violations);
            }
            RuleKind::Role { allowed_roles } => {
                let allowed = allowed_roles
                    .iter()
                    .any(|candidate| candidate.to_lowercase() == role_lower);
                if !allowed {
                    violations.push(Violation {
                        rule_id: rule.id.clone(),
                        kind: ViolationKind::Role,
                        // Verbatim caller value, not the normalized form.
                        trigger: role.to_string(),
                        severity: rule.severity,
                    });
                }
            }
            RuleKind::Inert => {}
            RuleKind::Unknown { declared } => {
                tracing::debug!(
                    rule_id = %rule.id,
                    kind = %declared,
                    "skipping rule of unrecognized kind"
                );
            }
        }
    }

    let score = score_for(violations.len());
    EvaluationResult { violations, score }
}

/// First-match semantics per field: each keyword contributes at most one
/// violation for this field regardless of how often it occurs in it.
fn push_keyword_matches(
    field_lower: &str,
    keywords: &[String],
    rule: &Rule,
    violations: &mut Vec<Violation>,
) {
    for keyword in keywords {
        if field_lower.contains(&keyword.to_lowercase()) {
            violations.push(Violation {
                rule_id: rule.id.clone(),
                kind: ViolationKind::Keyword,
                // Rule-defined casing, not the casing found in the text.
                trigger: keyword.clone(),
                severity: rule.severity,
            });
        }
    }
}

/// `clamp(100 - 10 x violation_count, 0, 100)`.
///
/// A linear penalty, not severity-weighted: predictable and easy for
/// operators to reason about.
pub fn score_for(violation_count: usize) -> u8 {
    let count = u32::try_from(violation_count).unwrap_or(u32::MAX);
    100u32
        .saturating_sub(count.saturating_mul(VIOLATION_PENALTY))
        .min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::LoadedRuleSet;
    use crate::types::Severity;

    fn sample_rules() -> RuleSet {
        LoadedRuleSet::from_json(
            r#"{
                "rules": [
                    {"id": "R1", "type": "keyword", "keywords": ["secret", "confidential"], "severity": "high"},
                    {"id": "R2", "type": "role", "allowed_roles": ["admin", "developer"], "severity": "medium"}
                ]
            }"#,
        )
        .unwrap()
        .into_rules()
    }

    #[test]
    fn test_empty_rule_set_is_compliant() {
        let result = evaluate("anything at all", "any output", "any-role", &RuleSet::empty());
        assert!(result.is_compliant());
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_no_violations_for_clean_run() {
        let result = evaluate(
            "This is a normal query.",
            "Here is the response.",
            "developer",
            &sample_rules(),
        );
        assert!(result.violations.is_empty());
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_keyword_in_input() {
        let result = evaluate(
            "Access the secret database.",
            "Accessing data.",
            "developer",
            &sample_rules(),
        );

        assert_eq!(result.violations.len(), 1);
        let violation = &result.violations[0];
        assert_eq!(violation.rule_id, "R1");
        assert_eq!(violation.kind, ViolationKind::Keyword);
        assert_eq!(violation.trigger, "secret");
        assert_eq!(violation.severity, Severity::High);
        assert_eq!(result.score, 90);
    }

    #[test]
    fn test_keyword_in_output() {
        let result = evaluate(
            "Generate some text.",
            "Here is some confidential information.",
            "developer",
            &sample_rules(),
        );

        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].trigger, "confidential");
    }

    #[test]
    fn test_keyword_in_both_fields_fires_twice() {
        let result = evaluate(
            "Tell me the secret.",
            "The secret is safe.",
            "developer",
            &sample_rules(),
        );

        assert_eq!(result.violations.len(), 2);
        assert!(result
            .violations
            .iter()
            .all(|v| v.rule_id == "R1" && v.trigger == "secret"));
        assert_eq!(result.score, 80);
    }

    #[test]
    fn test_keyword_repeated_in_one_field_fires_once() {
        let result = evaluate(
            "secret secret secret",
            "nothing here",
            "developer",
            &sample_rules(),
        );
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn test_matching_is_case_insensitive_with_rule_casing_in_trigger() {
        let upper = evaluate("This is a SECRET.", "", "developer", &sample_rules());
        let lower = evaluate("This is a secret.", "", "developer", &sample_rules());

        assert_eq!(upper, lower);
        assert_eq!(upper.violations[0].trigger, "secret");
    }

    #[test]
    fn test_role_not_allowed() {
        let result = evaluate(
            "Perform some analysis.",
            "Analysis complete.",
            "user",
            &sample_rules(),
        );

        assert_eq!(result.violations.len(), 1);
        let violation = &result.violations[0];
        assert_eq!(violation.rule_id, "R2");
        assert_eq!(violation.kind, ViolationKind::Role);
        assert_eq!(violation.trigger, "user");
    }

    #[test]
    fn test_role_comparison_is_case_insensitive() {
        let result = evaluate("hello", "world", "DeVeLoPeR", &sample_rules());
        assert!(result
            .violations
            .iter()
            .all(|v| v.kind != ViolationKind::Role));
    }

    #[test]
    fn test_role_trigger_is_verbatim() {
        let result = evaluate("hello", "world", "GuEsT", &sample_rules());
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].trigger, "GuEsT");
    }

    #[test]
    fn test_multiple_violations_across_rules() {
        let rules = LoadedRuleSet::from_json(
            r#"{
                "rules": [
                    {"id": "R1", "type": "keyword", "keywords": ["secret", "confidential"], "severity": "high"},
                    {"id": "R2", "type": "role", "allowed_roles": ["admin", "developer"], "severity": "medium"},
                    {"id": "R3", "type": "keyword", "keywords": ["badword"], "severity": "low"}
                ]
            }"#,
        )
        .unwrap()
        .into_rules();

        // R1 fires once (input "secret"), R3 fires twice (input and output
        // "badword"), R2 fires once (role "guest"): four violations total.
        let result = evaluate(
            "This contains a badword and secret info.",
            "Also a badword here.",
            "guest",
            &rules,
        );

        assert_eq!(result.violations.len(), 4);
        let mut ids: Vec<_> = result.violations.iter().map(|v| v.rule_id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["R1", "R2", "R3", "R3"]);
        assert_eq!(result.score, 60);
    }

    #[test]
    fn test_violations_reported_in_rule_set_order() {
        let result = evaluate(
            "secret badword",
            "",
            "guest",
            &LoadedRuleSet::from_json(
                r#"{
                    "rules": [
                        {"id": "R3", "type": "keyword", "keywords": ["badword"], "severity": "low"},
                        {"id": "R1", "type": "keyword", "keywords": ["secret"], "severity": "high"}
                    ]
                }"#,
            )
            .unwrap()
            .into_rules(),
        );

        let ids: Vec<_> = result.violations.iter().map(|v| v.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["R3", "R1"]);
    }

    #[test]
    fn test_inert_and_unknown_rules_never_match() {
        let rules = LoadedRuleSet::from_json(
            r#"{
                "rules": [
                    {"id": "R1", "type": "keyword", "severity": "high"},
                    {"id": "R2", "type": "regex", "severity": "high"}
                ]
            }"#,
        )
        .unwrap()
        .into_rules();

        let result = evaluate("anything", "anything", "anyone", &rules);
        assert!(result.is_compliant());
    }

    #[test]
    fn test_score_clamps_at_zero() {
        assert_eq!(score_for(0), 100);
        assert_eq!(score_for(3), 70);
        assert_eq!(score_for(10), 0);
        assert_eq!(score_for(11), 0);
        assert_eq!(score_for(usize::MAX), 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn empty_rules_always_score_100(
                input in ".*",
                output in ".*",
                role in ".*",
            ) {
                let result = evaluate(&input, &output, &role, &RuleSet::empty());
                prop_assert!(result.violations.is_empty());
                prop_assert_eq!(result.score, 100);
            }

            #[test]
            fn score_is_clamped_linear_penalty(count in 0usize..1000) {
                let expected = 100i64.saturating_sub(10 * count as i64).max(0) as u8;
                prop_assert_eq!(score_for(count), expected);
            }

            #[test]
            fn evaluation_is_deterministic(
                input in ".*",
                output in ".*",
                role in ".*",
            ) {
                let rules = sample_rules();
                let first = evaluate(&input, &output, &role, &rules);
                let second = evaluate(&input, &output, &role, &rules);
                prop_assert_eq!(first, second);
            }

            #[test]
            fn score_matches_violation_count(
                input in ".*",
                output in ".*",
                role in ".*",
            ) {
                let result = evaluate(&input, &output, &role, &sample_rules());
                prop_assert_eq!(result.score, score_for(result.violations.len()));
            }
        }
    }
}
