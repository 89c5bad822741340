pub mod runtime;
pub use runtime::RunOptions;

use crate::event::{CombatLogType, EventFilter, FilterRule, TextMatch};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete replaylens configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LensConfig {
    #[serde(default)]
    pub time: TimeConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub correlation: CorrelationConfig,
    #[serde(default)]
    pub handles: HandleConfig,
}

/// Tick/time base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// Seconds per tick until the feed announces its own interval
    #[serde(default = "default_tick_interval")]
    pub tick_interval: f64,
}

fn default_tick_interval() -> f64 {
    1.0 / 30.0
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
        }
    }
}

/// Which entities are tracked identities and how they are keyed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Class pattern of identity entities (heroes)
    #[serde(default = "default_identity_class")]
    pub class: TextMatch,

    /// Integer property holding the domain key
    #[serde(default = "default_key_property")]
    pub key_property: String,

    /// String properties tried, in order, for the hero's unit name
    #[serde(default = "default_unit_name_properties")]
    pub unit_name_properties: Vec<String>,
}

fn default_identity_class() -> TextMatch {
    TextMatch::prefix("CDOTA_Unit_Hero_")
}

fn default_key_property() -> String {
    "m_iPlayerID".to_string()
}

fn default_unit_name_properties() -> Vec<String> {
    ["m_iszUnitName", "m_iszUnitNameString", "m_szUnitName"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            class: default_identity_class(),
            key_property: default_key_property(),
            unit_name_properties: default_unit_name_properties(),
        }
    }
}

/// Attributes captured per identity by the snapshot differ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_attributes")]
    pub attributes: Vec<String>,
}

fn default_snapshot_attributes() -> Vec<String> {
    ["m_iHealth", "m_iMaxHealth", "m_flMana", "m_flMaxMana"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            attributes: default_snapshot_attributes(),
        }
    }
}

/// Combat log predicate and recording options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_filter_types")]
    pub types: Vec<CombatLogType>,

    #[serde(default = "default_filter_rules")]
    pub rules: Vec<FilterRule>,

    /// Stop the feed after this many recorded events (0 = unlimited)
    #[serde(default)]
    pub max_matches: usize,

    /// Attach attacker/target health and mana to recorded events
    #[serde(default = "default_record_vitals")]
    pub record_vitals: bool,
}

fn default_filter_types() -> Vec<CombatLogType> {
    vec![
        CombatLogType::Ability,
        CombatLogType::Item,
        CombatLogType::AbilityTrigger,
    ]
}

fn default_filter_rules() -> Vec<FilterRule> {
    vec![FilterRule {
        inflictor: Some(TextMatch::exact("item_power_treads")),
        ..Default::default()
    }]
}

fn default_record_vitals() -> bool {
    true
}

impl FilterConfig {
    pub fn predicate(&self) -> EventFilter {
        EventFilter {
            types: self.types.clone(),
            rules: self.rules.clone(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            types: default_filter_types(),
            rules: default_filter_rules(),
            max_matches: 0,
            record_vitals: default_record_vitals(),
        }
    }
}

/// How a holder entity points at its owning identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerReference {
    /// Property holds the owner's entity handle
    Handle(String),
    /// Property holds the owner's domain key directly
    DomainKey(String),
}

/// Whether a recorded event may correlate more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Consumed by its first correlation
    Once,
    /// Correlates with every later qualifying update
    Unbounded,
}

/// Holder-entity correlation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Class pattern of holder entities (items/abilities)
    #[serde(default = "default_holder_class")]
    pub holder_class: TextMatch,

    #[serde(default = "default_owner")]
    pub owner: OwnerReference,

    /// Float property giving the holder's reference time
    #[serde(default = "default_reference_time_property")]
    pub reference_time_property: String,

    /// Events match when `timestamp > reference_time - epsilon`
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Optional upper bound: `timestamp <= reference_time + window`
    #[serde(default)]
    pub window: Option<f64>,

    #[serde(default = "default_repeat")]
    pub repeat: RepeatPolicy,

    /// Integer property decoded into a kind label
    #[serde(default = "default_kind_property")]
    pub kind_property: String,

    /// Labels indexed by the kind property's value
    #[serde(default = "default_kind_labels")]
    pub kind_labels: Vec<String>,
}

fn default_holder_class() -> TextMatch {
    TextMatch::exact("CDOTA_Item_PowerTreads")
}

fn default_owner() -> OwnerReference {
    OwnerReference::Handle("m_hOwnerEntity".to_string())
}

fn default_reference_time_property() -> String {
    "m_flAssembledTime".to_string()
}

fn default_epsilon() -> f64 {
    0.01
}

fn default_repeat() -> RepeatPolicy {
    RepeatPolicy::Once
}

fn default_kind_property() -> String {
    "m_iStat".to_string()
}

fn default_kind_labels() -> Vec<String> {
    ["strength", "agility", "intelligence"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            holder_class: default_holder_class(),
            owner: default_owner(),
            reference_time_property: default_reference_time_property(),
            epsilon: default_epsilon(),
            window: None,
            repeat: default_repeat(),
            kind_property: default_kind_property(),
            kind_labels: default_kind_labels(),
        }
    }
}

/// Ad hoc handle lookups
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandleConfig {
    /// Handles to resolve to class names while the feed runs
    #[serde(default)]
    pub watch: Vec<u64>,
}

/// Load configuration from TOML file
pub fn load_config(path: &Path) -> Result<LensConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: LensConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}
