use std::collections::HashMap;

/// String table the combat log indexes into
pub const COMBAT_LOG_NAMES: &str = "CombatLogNames";

/// Index → string lookup provided by the decoder
pub trait StringTable {
    fn lookup(&self, table: &str, index: i32) -> Option<&str>;
}

/// In-memory string tables fed from the captured stream
#[derive(Debug, Default)]
pub struct StringTables {
    tables: HashMap<String, HashMap<i32, String>>,
}

impl StringTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry (string tables are updated in place during a replay)
    pub fn insert(&mut self, table: &str, index: i32, value: impl Into<String>) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(index, value.into());
    }

    /// Number of entries in a table (0 for unknown tables)
    pub fn len(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, HashMap::len)
    }
}

impl StringTable for StringTables {
    fn lookup(&self, table: &str, index: i32) -> Option<&str> {
        self.tables.get(table)?.get(&index).map(String::as_str)
    }
}

/// Resolves combat log name indices with a "resolved or empty" contract.
///
/// Index 0 is the decoder's "no name" marker and always resolves empty,
/// as do indices that overflow `i32` or are missing from the table.
pub struct StringResolver<'a, T: StringTable + ?Sized> {
    strings: &'a T,
    table: &'a str,
}

impl<'a, T: StringTable + ?Sized> StringResolver<'a, T> {
    pub fn new(strings: &'a T, table: &'a str) -> Self {
        Self { strings, table }
    }

    /// Resolver over the `CombatLogNames` table
    pub fn combat_log(strings: &'a T) -> Self {
        Self::new(strings, COMBAT_LOG_NAMES)
    }

    pub fn try_resolve(&self, index: u32) -> Option<&'a str> {
        if index == 0 {
            return None;
        }
        let index = i32::try_from(index).ok()?;
        self.strings.lookup(self.table, index)
    }

    pub fn resolve(&self, index: u32) -> &'a str {
        self.try_resolve(index).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> StringTables {
        let mut strings = StringTables::new();
        strings.insert(COMBAT_LOG_NAMES, 0, "dota_unknown");
        strings.insert(COMBAT_LOG_NAMES, 4, "npc_dota_hero_zuus");
        strings.insert(COMBAT_LOG_NAMES, 9, "item_power_treads");
        strings.insert("ActiveModifiers", 4, "modifier_stunned");
        strings
    }

    #[test]
    fn test_resolve_known_index() {
        let strings = tables();
        let resolver = StringResolver::combat_log(&strings);
        assert_eq!(resolver.resolve(4), "npc_dota_hero_zuus");
        assert_eq!(resolver.try_resolve(9), Some("item_power_treads"));
    }

    #[test]
    fn test_resolve_miss_is_empty() {
        let strings = tables();
        let resolver = StringResolver::combat_log(&strings);
        assert_eq!(resolver.resolve(5), "");
        assert_eq!(resolver.try_resolve(5), None);
        assert_eq!(resolver.resolve(u32::MAX), "");
    }

    #[test]
    fn test_index_zero_never_resolves() {
        let strings = tables();
        let resolver = StringResolver::combat_log(&strings);
        assert_eq!(resolver.resolve(0), "");
    }

    #[test]
    fn test_tables_are_independent() {
        let strings = tables();
        assert_eq!(
            StringResolver::new(&strings, "ActiveModifiers").resolve(4),
            "modifier_stunned"
        );
        assert_eq!(StringResolver::new(&strings, "Missing").resolve(4), "");
        assert_eq!(strings.len(COMBAT_LOG_NAMES), 3);
        assert_eq!(strings.len("Missing"), 0);
    }

    #[test]
    fn test_insert_overwrites() {
        let mut strings = tables();
        strings.insert(COMBAT_LOG_NAMES, 4, "npc_dota_hero_axe");
        assert_eq!(
            StringResolver::combat_log(&strings).resolve(4),
            "npc_dota_hero_axe"
        );
    }
}
