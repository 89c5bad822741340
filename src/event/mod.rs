use serde::{Deserialize, Serialize};
use std::fmt;

mod filter;
mod recorder;

pub use filter::{EventFilter, FilterRule, ResolvedNames, TextMatch};
pub use recorder::{Consideration, EventRecorder, UsageRecord, Vitals};

/// Combat log entry type (DOTA_COMBATLOG_TYPES)
///
/// Accepts either the numeric protocol code or the snake_case name on input;
/// always serializes as the name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TypeRepr", into = "String")]
pub enum CombatLogType {
    Damage,
    Heal,
    ModifierAdd,
    ModifierRemove,
    Death,
    Ability,
    Item,
    Location,
    Gold,
    GameState,
    Xp,
    Purchase,
    Buyback,
    AbilityTrigger,
    PlayerStats,
    Multikill,
    Killstreak,
    TeamBuildingKill,
    FirstBlood,
    ModifierRefresh,
    /// Any code this crate has no name for
    Other(u32),
}

const NAMED_TYPES: [(CombatLogType, &str); 20] = [
    (CombatLogType::Damage, "damage"),
    (CombatLogType::Heal, "heal"),
    (CombatLogType::ModifierAdd, "modifier_add"),
    (CombatLogType::ModifierRemove, "modifier_remove"),
    (CombatLogType::Death, "death"),
    (CombatLogType::Ability, "ability"),
    (CombatLogType::Item, "item"),
    (CombatLogType::Location, "location"),
    (CombatLogType::Gold, "gold"),
    (CombatLogType::GameState, "game_state"),
    (CombatLogType::Xp, "xp"),
    (CombatLogType::Purchase, "purchase"),
    (CombatLogType::Buyback, "buyback"),
    (CombatLogType::AbilityTrigger, "ability_trigger"),
    (CombatLogType::PlayerStats, "player_stats"),
    (CombatLogType::Multikill, "multikill"),
    (CombatLogType::Killstreak, "killstreak"),
    (CombatLogType::TeamBuildingKill, "team_building_kill"),
    (CombatLogType::FirstBlood, "first_blood"),
    (CombatLogType::ModifierRefresh, "modifier_refresh"),
];

impl CombatLogType {
    /// Map a protocol code; named codes are their position in `NAMED_TYPES`
    pub fn from_code(code: u32) -> Self {
        NAMED_TYPES
            .get(code as usize)
            .map(|(kind, _)| *kind)
            .unwrap_or(CombatLogType::Other(code))
    }

    pub fn code(self) -> u32 {
        match self {
            CombatLogType::Other(code) => code,
            named => NAMED_TYPES
                .iter()
                .position(|(kind, _)| *kind == named)
                .map_or(u32::MAX, |pos| pos as u32),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(code) = name.strip_prefix("other_") {
            return code.parse().ok().map(CombatLogType::Other);
        }
        NAMED_TYPES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(kind, _)| *kind)
    }

    pub fn name(self) -> String {
        match self {
            CombatLogType::Other(code) => format!("other_{}", code),
            named => NAMED_TYPES
                .iter()
                .find(|(kind, _)| *kind == named)
                .map(|(_, n)| n.to_string())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for CombatLogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TypeRepr {
    Code(u32),
    Name(String),
}

impl TryFrom<TypeRepr> for CombatLogType {
    type Error = String;

    fn try_from(repr: TypeRepr) -> Result<Self, Self::Error> {
        match repr {
            TypeRepr::Code(code) => Ok(CombatLogType::from_code(code)),
            TypeRepr::Name(name) => CombatLogType::from_name(&name)
                .ok_or_else(|| format!("unknown combat log type '{}'", name)),
        }
    }
}

impl From<CombatLogType> for String {
    fn from(kind: CombatLogType) -> Self {
        kind.name()
    }
}

/// One discrete combat log event as delivered by the decoder.
///
/// Name fields are indices into the `CombatLogNames` string table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatLogEntry {
    #[serde(rename = "type")]
    pub kind: CombatLogType,

    /// Game time in seconds
    pub timestamp: f64,

    /// Tick the entry was delivered on (when the decoder reports it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick: Option<u32>,

    #[serde(default)]
    pub attacker_name: u32,
    #[serde(default)]
    pub target_name: u32,
    #[serde(default)]
    pub inflictor_name: u32,
    #[serde(default)]
    pub damage_source_name: u32,

    #[serde(default)]
    pub value: u32,

    #[serde(default)]
    pub is_attacker_hero: bool,
    #[serde(default)]
    pub is_attacker_illusion: bool,
    #[serde(default)]
    pub is_target_hero: bool,
    #[serde(default)]
    pub is_target_illusion: bool,
    #[serde(default)]
    pub is_visible_radiant: bool,
    #[serde(default)]
    pub is_visible_dire: bool,
}

impl CombatLogEntry {
    pub fn new(kind: CombatLogType, timestamp: f64) -> Self {
        Self {
            kind,
            timestamp,
            tick: None,
            attacker_name: 0,
            target_name: 0,
            inflictor_name: 0,
            damage_source_name: 0,
            value: 0,
            is_attacker_hero: false,
            is_attacker_illusion: false,
            is_target_hero: false,
            is_target_illusion: false,
            is_visible_radiant: false,
            is_visible_dire: false,
        }
    }
}
