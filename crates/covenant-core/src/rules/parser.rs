//! Rule set parsing from JSON/YAML.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::slice;
use thiserror::Error;

use crate::types::Severity;

/// Substituted when a rule omits its `id` field.
const FALLBACK_RULE_ID: &str = "unknown";

/// Errors that can occur when loading a rule set.
///
/// An absent rule file is not an error: [`LoadedRuleSet::load`] resolves it
/// to an empty rule set, meaning no policy is enforced.
#[derive(Error, Debug)]
pub enum RuleStoreError {
    #[error("failed to read rule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("rule set is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("rule set is not valid YAML: {0}")]
    MalformedYaml(#[from] serde_yaml::Error),
}

/// Advisory defect found while loading a rule.
///
/// Warnings never fail the load. The affected rule is retained, degraded to
/// [`RuleKind::Inert`] where its kind-specific fields are unusable, so that
/// one bad rule cannot take down the evaluation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Rule at `index` (zero-based) is missing an always-required field.
    MissingField { index: usize, field: &'static str },

    /// Severity value was present but not recognized; `medium` substituted.
    UnknownSeverity { rule_id: String, declared: String },

    /// Keyword rule with no usable keywords; loaded as a no-op.
    NoKeywords { rule_id: String },

    /// Role rule with no usable allowed roles; loaded as a no-op.
    NoAllowedRoles { rule_id: String },

    /// Empty entries were dropped from a keyword or role list.
    EmptyEntries { rule_id: String, field: &'static str },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::MissingField { index, field } => {
                write!(f, "rule {} is missing required field '{}'", index + 1, field)
            }
            LoadWarning::UnknownSeverity { rule_id, declared } => write!(
                f,
                "rule '{rule_id}' has unrecognized severity '{declared}', using 'medium'"
            ),
            LoadWarning::NoKeywords { rule_id } => write!(
                f,
                "keyword rule '{rule_id}' has no keywords and will never match"
            ),
            LoadWarning::NoAllowedRoles { rule_id } => write!(
                f,
                "role rule '{rule_id}' has no allowed roles and will never match"
            ),
            LoadWarning::EmptyEntries { rule_id, field } => {
                write!(f, "rule '{rule_id}' has empty entries in '{field}', dropped")
            }
        }
    }
}

/// The matching behavior of a rule.
///
/// A closed tagged union: the two supported kinds, an explicit no-op for
/// rules malformed at load time, and an `Unknown` variant so future rule
/// kinds stay inert instead of crashing evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// Case-insensitive substring match over input and output text.
    Keyword { keywords: Vec<String> },

    /// Case-insensitive allow-list check against the caller-supplied role.
    Role { allowed_roles: Vec<String> },

    /// Declared a known kind but lacked the fields that kind needs.
    /// Never matches.
    Inert,

    /// Unrecognized `type` value. Skipped silently at evaluation.
    Unknown { declared: String },
}

/// A single validated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Identifier used in violations and historical aggregation. Expected
    /// but not required to be unique.
    pub id: String,

    /// Severity carried onto violations this rule produces.
    pub severity: Severity,

    /// Matching behavior.
    pub kind: RuleKind,
}

/// An ordered sequence of rules.
///
/// Order determines the order in which violations are reported; it does not
/// affect which violations are found, since every rule is evaluated
/// independently over the full input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// A rule set with no rules. Evaluating against it always yields zero
    /// violations and a score of 100.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn iter(&self) -> slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// A parsed rule set together with its advisory warnings channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedRuleSet {
    pub rules: RuleSet,
    pub warnings: Vec<LoadWarning>,
}

impl LoadedRuleSet {
    /// Parse a rule set from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, RuleStoreError> {
        let raw: RawDocument = serde_json::from_str(json)?;
        Ok(Self::from_raw(raw))
    }

    /// Parse a rule set from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, RuleStoreError> {
        let raw: RawDocument = serde_yaml::from_str(yaml)?;
        Ok(Self::from_raw(raw))
    }

    /// Parse a rule set from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RuleStoreError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a rule set from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RuleStoreError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load a rule set from a file, dispatching JSON/YAML by extension.
    ///
    /// A missing file resolves to an empty rule set, not an error: absence
    /// of a rule file means no policy is enforced. A file that exists but
    /// does not parse propagates as [`RuleStoreError`]; callers decide
    /// whether to fail hard or fall back to an empty set.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RuleStoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            Self::from_yaml_file(path)
        } else {
            Self::from_json_file(path)
        }
    }

    /// Discard the warnings channel.
    pub fn into_rules(self) -> RuleSet {
        self.rules
    }

    fn from_raw(raw: RawDocument) -> Self {
        let mut warnings = Vec::new();
        let rules = raw
            .rules
            .into_iter()
            .enumerate()
            .map(|(index, raw_rule)| validate_rule(index, raw_rule, &mut warnings))
            .collect();

        Self {
            rules: RuleSet::new(rules),
            warnings,
        }
    }
}

/// Wire shape of the rule document. Unknown top-level and per-rule fields
/// are ignored for forward compatibility.
#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    severity: Option<String>,
    keywords: Option<Vec<String>>,
    allowed_roles: Option<Vec<String>>,
}

/// Turn a raw rule into a validated [`Rule`], pushing advisory warnings
/// for every correctable defect. This never rejects a rule.
fn validate_rule(index: usize, raw: RawRule, warnings: &mut Vec<LoadWarning>) -> Rule {
    let id = match raw.id {
        Some(id) => id,
        None => {
            warnings.push(LoadWarning::MissingField { index, field: "id" });
            FALLBACK_RULE_ID.to_string()
        }
    };

    let severity = match raw.severity.as_deref() {
        Some(declared) => Severity::parse(declared).unwrap_or_else(|| {
            warnings.push(LoadWarning::UnknownSeverity {
                rule_id: id.clone(),
                declared: declared.to_string(),
            });
            Severity::Medium
        }),
        None => {
            warnings.push(LoadWarning::MissingField {
                index,
                field: "severity",
            });
            Severity::Medium
        }
    };

    let kind = match raw.kind.as_deref() {
        Some("keyword") => {
            let keywords = retain_non_empty(raw.keywords, &id, "keywords", warnings);
            if keywords.is_empty() {
                warnings.push(LoadWarning::NoKeywords {
                    rule_id: id.clone(),
                });
                RuleKind::Inert
            } else {
                RuleKind::Keyword { keywords }
            }
        }
        Some("role") => {
            let allowed_roles = retain_non_empty(raw.allowed_roles, &id, "allowed_roles", warnings);
            if allowed_roles.is_empty() {
                warnings.push(LoadWarning::NoAllowedRoles {
                    rule_id: id.clone(),
                });
                RuleKind::Inert
            } else {
                RuleKind::Role { allowed_roles }
            }
        }
        Some(declared) => RuleKind::Unknown {
            declared: declared.to_string(),
        },
        None => {
            warnings.push(LoadWarning::MissingField {
                index,
                field: "type",
            });
            RuleKind::Inert
        }
    };

    Rule { id, severity, kind }
}

fn retain_non_empty(
    entries: Option<Vec<String>>,
    rule_id: &str,
    field: &'static str,
    warnings: &mut Vec<LoadWarning>,
) -> Vec<String> {
    let mut entries = entries.unwrap_or_default();
    let before = entries.len();
    entries.retain(|entry| !entry.trim().is_empty());
    if entries.len() != before {
        warnings.push(LoadWarning::EmptyEntries {
            rule_id: rule_id.to_string(),
            field,
        });
    }
    entries
}
