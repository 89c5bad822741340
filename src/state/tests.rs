use super::*;
use crate::entity::{Entity, EntityRef, Lifecycle, NULL_HANDLE};

fn hero(index: u32, handle: u64) -> Entity {
    Entity::new(index, handle, "CDOTA_Unit_Hero_Zuus").with_property("m_iPlayerID", 1)
}

fn eref(index: u32, handle: u64) -> EntityRef {
    EntityRef { index, handle }
}

#[test]
fn test_table_upsert_and_lookup() {
    let mut table = EntityTable::new();
    table.upsert(hero(5, 500));

    assert_eq!(table.len(), 1);
    assert_eq!(table.by_index(5).unwrap().handle, 500);
    assert_eq!(table.by_handle(500).unwrap().index, 5);
    assert_eq!(table.lifecycle(5), Lifecycle::Active);
}

#[test]
fn test_table_upsert_replaces_properties() {
    let mut table = EntityTable::new();
    table.upsert(hero(5, 500).with_property("m_iHealth", 600));
    table.upsert(hero(5, 500));

    assert_eq!(table.by_index(5).unwrap().get_i64("m_iHealth"), None);
}

#[test]
fn test_table_remove_retires_index() {
    let mut table = EntityTable::new();
    table.upsert(hero(5, 500));

    let removed = table.remove(5).unwrap();
    assert_eq!(removed.handle, 500);
    assert!(table.by_handle(500).is_none());
    assert_eq!(table.lifecycle(5), Lifecycle::Removed);
    assert_eq!(table.lifecycle(6), Lifecycle::Absent);
    assert!(table.remove(5).is_none());
}

#[test]
fn test_table_slot_reuse_drops_old_handle() {
    let mut table = EntityTable::new();
    table.upsert(hero(5, 500));
    table.remove(5);
    table.upsert(hero(5, 900));

    assert!(table.by_handle(500).is_none());
    assert_eq!(table.by_handle(900).unwrap().index, 5);
    assert_eq!(table.lifecycle(5), Lifecycle::Active);

    // Reuse without an intervening delete behaves the same
    table.upsert(hero(5, 1200));
    assert!(table.by_handle(900).is_none());
    assert_eq!(table.by_handle(1200).unwrap().index, 5);
}

#[test]
fn test_table_drain_orders_by_index() {
    let mut table = EntityTable::new();
    table.upsert(hero(9, 900));
    table.upsert(hero(2, 200));
    table.upsert(hero(4, 400));

    let drained: Vec<u32> = table.drain().iter().map(|e| e.index).collect();
    assert_eq!(drained, vec![2, 4, 9]);
    assert!(table.is_empty());
    assert!(table.by_handle(400).is_none());
    assert_eq!(table.lifecycle(4), Lifecycle::Removed);
}

#[test]
fn test_handle_resolution_tracks_current_truth() {
    let mut table = EntityTable::new();
    table.upsert(hero(5, 500));

    assert_eq!(HandleTable::new(&table).resolve(500).unwrap().index, 5);

    table.remove(5);
    assert!(HandleTable::new(&table).resolve(500).is_none());
}

#[test]
fn test_handle_misses_do_not_mutate() {
    let mut table = EntityTable::new();
    table.upsert(hero(5, 500));

    let handles = HandleTable::new(&table);
    assert!(handles.resolve(12345).is_none());
    assert!(handles.resolve(NULL_HANDLE).is_none());
    assert!(handles.resolve(0).is_none());

    assert_eq!(table.len(), 1);
    assert_eq!(table.by_handle(500).unwrap().index, 5);
}

#[test]
fn test_handle_follow_rejects_stale_ref() {
    let mut table = EntityTable::new();
    table.upsert(hero(5, 500));
    let stale = eref(5, 500);
    table.upsert(hero(5, 900));

    let handles = HandleTable::new(&table);
    assert!(handles.follow(stale).is_none());
    assert_eq!(handles.follow(eref(5, 900)).unwrap().handle, 900);
}

#[test]
fn test_identity_upsert_lookup_remove() {
    let mut index = IdentityIndex::new();
    index.upsert(1i64, eref(5, 500));

    assert_eq!(index.lookup(&1), Some(eref(5, 500)));
    assert_eq!(index.key_of(eref(5, 500)), Some(&1));

    assert_eq!(index.remove(eref(5, 500)), Some(1));
    assert_eq!(index.lookup(&1), None);
    assert!(index.is_empty());
}

#[test]
fn test_identity_last_write_wins() {
    let mut index = IdentityIndex::new();
    index.upsert(1i64, eref(5, 500));
    index.upsert(1i64, eref(6, 600));

    assert_eq!(index.lookup(&1), Some(eref(6, 600)));
    assert_eq!(index.len(), 1);

    // Removing the displaced entity is a no-op
    assert_eq!(index.remove(eref(5, 500)), None);
    assert_eq!(index.lookup(&1), Some(eref(6, 600)));
}

#[test]
fn test_identity_rekey_moves_entry() {
    let mut index = IdentityIndex::new();
    index.upsert(1i64, eref(5, 500));
    index.upsert(2i64, eref(5, 500));

    assert_eq!(index.lookup(&1), None);
    assert_eq!(index.lookup(&2), Some(eref(5, 500)));
    assert_eq!(index.len(), 1);
}

#[test]
fn test_identity_remove_unknown_ref() {
    let mut index: IdentityIndex<i64> = IdentityIndex::new();
    assert_eq!(index.remove(eref(1, 1)), None);
}

#[test]
fn test_identity_string_keys_borrow_lookup() {
    let mut index = IdentityIndex::new();
    index.upsert("npc_dota_hero_zuus".to_string(), eref(5, 500));
    assert_eq!(index.lookup("npc_dota_hero_zuus"), Some(eref(5, 500)));
}

#[test]
fn test_identity_never_references_removed_entities() {
    // Deterministic pseudo-random upsert/delete churn over a small key space
    let mut table = EntityTable::new();
    let mut index: IdentityIndex<i64> = IdentityIndex::new();
    let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
    let mut next_handle = 1u64;

    for _ in 0..5000 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;

        let slot = (seed % 8) as u32;
        let key = ((seed >> 8) % 4) as i64;

        if (seed >> 16) % 3 == 0 {
            if let Some(removed) = table.remove(slot) {
                index.remove(removed.entity_ref());
            }
        } else {
            let handle = match table.by_index(slot) {
                Some(existing) => existing.handle,
                None => {
                    next_handle += 1;
                    next_handle
                }
            };
            let entity = table.upsert(Entity::new(slot, handle, "CDOTA_Unit_Hero_Axe"));
            index.upsert(key, entity.entity_ref());
        }

        for key in 0..4i64 {
            if let Some(r) = index.lookup(&key) {
                assert!(
                    HandleTable::new(&table).follow(r).is_some(),
                    "key {} points at removed entity {:?}",
                    key,
                    r
                );
            }
        }
    }
}

#[test]
fn test_histogram_orders_by_count_then_name() {
    let mut histogram = ClassHistogram::new();
    for class in [
        "CDOTA_Item_PowerTreads",
        "CDOTA_Unit_Hero_Zuus",
        "CDOTA_Unit_Hero_Axe",
        "CDOTA_Unit_Hero_Zuus",
        "CDOTA_Unit_Hero_Axe",
        "CDOTA_Unit_Hero_Zuus",
        "CDOTA_BaseNPC_Creep_Lane",
    ] {
        histogram.observe(class);
    }

    let rows = histogram.snapshot();
    let order: Vec<(&str, u64)> = rows.iter().map(|r| (r.class.as_str(), r.count)).collect();
    assert_eq!(
        order,
        vec![
            ("CDOTA_Unit_Hero_Zuus", 3),
            ("CDOTA_Unit_Hero_Axe", 2),
            ("CDOTA_BaseNPC_Creep_Lane", 1),
            ("CDOTA_Item_PowerTreads", 1),
        ]
    );

    // Strict total order
    for pair in rows.windows(2) {
        assert!(
            pair[0].count > pair[1].count
                || (pair[0].count == pair[1].count && pair[0].class < pair[1].class)
        );
    }
}

#[test]
fn test_histogram_snapshot_is_idempotent() {
    let mut histogram = ClassHistogram::new();
    histogram.observe("b");
    histogram.observe("a");
    histogram.observe("c");
    histogram.observe("a");

    assert_eq!(histogram.snapshot(), histogram.snapshot());
    assert_eq!(histogram.count("a"), 2);
    assert_eq!(histogram.count("missing"), 0);
    assert_eq!(histogram.len(), 3);
}
