//! Shared types for rule evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity attached to a rule and carried onto any violation it produces.
///
/// Severity is reporting metadata only. The compliance score applies a flat
/// per-violation penalty and never weights by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parse a severity string case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Which rule kind produced a violation.
///
/// Serialized as `type` on [`Violation`] to keep the historical log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationKind {
    Keyword,
    Role,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Keyword => write!(f, "keyword"),
            ViolationKind::Role => write!(f, "role"),
        }
    }
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Id of the rule that fired. Duplicated ids are reported per instance.
    pub rule_id: String,

    /// Rule kind that fired.
    #[serde(rename = "type")]
    pub kind: ViolationKind,

    /// For keyword violations, the matched keyword in its rule-defined
    /// casing. For role violations, the verbatim role supplied by the caller.
    pub trigger: String,

    /// Severity of the violated rule.
    pub severity: Severity,
}

/// Outcome of evaluating one (input, output, role) triple against a rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Violations in rule-set order, then configured keyword order, with
    /// input-side matches before output-side matches within a keyword rule.
    pub violations: Vec<Violation>,

    /// `clamp(100 - 10 x violations, 0, 100)`.
    pub score: u8,
}

impl EvaluationResult {
    /// True when no rule fired.
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse_is_case_insensitive() {
        assert_eq!(Severity::parse("HIGH"), Some(Severity::High));
        assert_eq!(Severity::parse("Critical"), Some(Severity::Critical));
        assert_eq!(Severity::parse("fatal"), None);
    }

    #[test]
    fn test_violation_serializes_kind_as_type() {
        let violation = Violation {
            rule_id: "R1".to_string(),
            kind: ViolationKind::Keyword,
            trigger: "secret".to_string(),
            severity: Severity::High,
        };

        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["type"], "keyword");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["trigger"], "secret");
    }
}
