use crate::entity::Entity;
use crate::event::Vitals;

/// Sentinel returned when a unit name cannot be mapped to a hero class
pub const UNKNOWN_CLASS: &str = "unknown";

const HERO_UNIT_PREFIX: &str = "npc_dota_hero_";
const HERO_CLASS_PREFIX: &str = "CDOTA_Unit_Hero_";

/// Derive the expected entity class from a combat log unit name.
///
/// `npc_dota_hero_keeper_of_the_light` → `CDOTA_Unit_Hero_KeeperOfTheLight`.
/// Segments are split on `_`, empty segments dropped and each remaining
/// segment has its first character upper-cased. Total: empty input, a missing
/// prefix or an empty remainder all yield [`UNKNOWN_CLASS`].
pub fn hero_class_from_unit_name(unit_name: &str) -> String {
    let Some(raw) = unit_name.strip_prefix(HERO_UNIT_PREFIX) else {
        return UNKNOWN_CLASS.to_string();
    };

    let mut class = String::from(HERO_CLASS_PREFIX);
    let mut segments = 0;
    for segment in raw.split('_').filter(|s| !s.is_empty()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            class.extend(first.to_uppercase());
            class.push_str(chars.as_str());
            segments += 1;
        }
    }

    if segments == 0 {
        return UNKNOWN_CLASS.to_string();
    }
    class
}

/// Read health/mana from a hero entity; `None` when none of the fields exist
pub fn read_vitals(hero: &Entity) -> Option<Vitals> {
    let vitals = Vitals {
        health: hero.get_i64("m_iHealth"),
        max_health: hero.get_i64("m_iMaxHealth"),
        mana: hero.get_f64("m_flMana"),
        max_mana: hero.get_f64("m_flMaxMana"),
    };
    (!vitals.is_empty()).then_some(vitals)
}
