use super::CombatLogType;
use serde::{Deserialize, Serialize};

/// Positive text clause: exact string or prefix.
///
/// In TOML an exact match is a bare string, a prefix match is a table:
/// `inflictor = "item_power_treads"` / `class = { prefix = "CDOTA_Unit_Hero_" }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextMatch {
    Exact(String),
    Prefix { prefix: String },
}

impl TextMatch {
    pub fn exact(text: impl Into<String>) -> Self {
        TextMatch::Exact(text.into())
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        TextMatch::Prefix {
            prefix: prefix.into(),
        }
    }

    /// Empty text is "unresolved" and never satisfies a clause
    pub fn matches(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        match self {
            TextMatch::Exact(expected) => text == expected,
            TextMatch::Prefix { prefix } => text.starts_with(prefix.as_str()),
        }
    }
}

/// Names of one combat log entry after string-table resolution ("" = unresolved)
#[derive(Clone, Copy, Debug, Default)]
pub struct ResolvedNames<'a> {
    pub attacker: &'a str,
    pub target: &'a str,
    pub source: &'a str,
    pub inflictor: &'a str,
}

/// Conjunction of optional name clauses. An empty rule matches every entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attacker: Option<TextMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TextMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<TextMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflictor: Option<TextMatch>,
}

impl FilterRule {
    pub fn matches(&self, names: &ResolvedNames<'_>) -> bool {
        clause(&self.inflictor, names.inflictor)
            && clause(&self.attacker, names.attacker)
            && clause(&self.target, names.target)
            && clause(&self.source, names.source)
    }
}

fn clause(rule: &Option<TextMatch>, text: &str) -> bool {
    rule.as_ref().map_or(true, |m| m.matches(text))
}

/// Declarative event predicate: type allow-list AND any matching rule.
///
/// An empty `types` list admits every type; an empty `rules` list admits every name set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFilter {
    pub types: Vec<CombatLogType>,
    pub rules: Vec<FilterRule>,
}

impl EventFilter {
    pub fn admits_type(&self, kind: CombatLogType) -> bool {
        self.types.is_empty() || self.types.contains(&kind)
    }

    pub fn matches(&self, kind: CombatLogType, names: &ResolvedNames<'_>) -> bool {
        self.admits_type(kind)
            && (self.rules.is_empty() || self.rules.iter().any(|rule| rule.matches(names)))
    }
}
