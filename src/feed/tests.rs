use super::*;
use crate::event::CombatLogType;
use crate::entity::OpFlag;
use std::io::Cursor;

fn reader(text: &str) -> FeedReader<Cursor<Vec<u8>>> {
    FeedReader::from_reader(Cursor::new(text.as_bytes().to_vec()))
}

#[test]
fn test_parse_each_record_kind() {
    let text = r#"
{"kind":"tick_interval","seconds":0.033333335}
{"kind":"tick","tick":120}
{"kind":"string","table":"CombatLogNames","index":4,"value":"npc_dota_hero_zuus"}
{"kind":"entity","tick":120,"ops":["created","entered"],"entity":{"index":3,"handle":1507335,"class":"CDOTA_Unit_Hero_Zuus","properties":{"m_iPlayerID":1,"m_flMana":291.5}}}
{"kind":"combat_log","type":"item","timestamp":612.4,"attacker_name":4,"inflictor_name":9}
{"kind":"chat","channel":"say_text2"}
"#;
    let mut feed = reader(text);

    assert!(matches!(
        feed.next_record().unwrap(),
        FeedRecord::TickInterval { .. }
    ));
    assert_eq!(feed.next_record().unwrap(), FeedRecord::Tick { tick: 120 });
    assert_eq!(
        feed.next_record().unwrap(),
        FeedRecord::StringEntry {
            table: "CombatLogNames".to_string(),
            index: 4,
            value: "npc_dota_hero_zuus".to_string(),
        }
    );

    let FeedRecord::Entity(update) = feed.next_record().unwrap() else {
        panic!("expected entity record");
    };
    assert_eq!(update.tick, Some(120));
    assert!(update.ops.flag(OpFlag::Created));
    assert!(update.ops.flag(OpFlag::Entered));
    assert!(!update.ops.is_removal());
    assert_eq!(update.entity.get_i64("m_iPlayerID"), Some(1));
    assert_eq!(update.entity.get_f64("m_flMana"), Some(291.5));

    let FeedRecord::CombatLog(entry) = feed.next_record().unwrap() else {
        panic!("expected combat log record");
    };
    assert_eq!(entry.kind, CombatLogType::Item);
    assert_eq!(entry.timestamp, 612.4);
    assert_eq!(entry.inflictor_name, 9);
    assert_eq!(entry.target_name, 0);

    assert_eq!(
        feed.next_record().unwrap(),
        FeedRecord::Chat {
            channel: ChatChannel::SayText2
        }
    );
    assert!(matches!(feed.next_record(), Err(FeedError::EndOfStream)));
}

#[test]
fn test_combat_log_type_by_code() {
    let mut feed = reader(r#"{"kind":"combat_log","type":5,"timestamp":1.0}"#);
    let FeedRecord::CombatLog(entry) = feed.next_record().unwrap() else {
        panic!("expected combat log record");
    };
    assert_eq!(entry.kind, CombatLogType::Ability);
}

#[test]
fn test_malformed_line_reports_position() {
    let mut feed = reader("{\"kind\":\"tick\",\"tick\":1}\n\n{\"kind\":\"tick\",\"tick\":\n");
    assert!(feed.next_record().is_ok());

    match feed.next_record() {
        Err(FeedError::Malformed { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected malformed error, got {:?}", other),
    }
}

#[test]
fn test_unknown_kind_is_malformed() {
    let mut feed = reader(r#"{"kind":"voice_data","bytes":12}"#);
    assert!(matches!(feed.next_record(), Err(FeedError::Malformed { .. })));
}

#[test]
fn test_empty_feed_ends_immediately() {
    let mut feed = reader("\n   \n");
    assert!(matches!(feed.next_record(), Err(FeedError::EndOfStream)));
    assert_eq!(feed.line(), 2);
}

#[test]
fn test_vec_feed_drains_in_order() {
    let mut feed = VecFeed::new(vec![FeedRecord::Tick { tick: 1 }]);
    feed.push(FeedRecord::Tick { tick: 2 });
    assert_eq!(feed.remaining(), 2);

    assert_eq!(feed.next_record().unwrap(), FeedRecord::Tick { tick: 1 });
    assert_eq!(feed.next_record().unwrap(), FeedRecord::Tick { tick: 2 });
    assert!(matches!(feed.next_record(), Err(FeedError::EndOfStream)));
}

#[test]
fn test_record_serialization_shape() {
    let json = serde_json::to_value(FeedRecord::StringEntry {
        table: "CombatLogNames".to_string(),
        index: 2,
        value: "item_power_treads".to_string(),
    })
    .unwrap();
    assert_eq!(json["kind"], "string");
    assert_eq!(json["index"], 2);
}

#[test]
fn test_open_gz_feed() {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replay.jsonl.gz");
    {
        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        writeln!(encoder, r#"{{"kind":"tick","tick":7}}"#).unwrap();
        encoder.finish().unwrap();
    }

    let mut feed = FeedReader::open(&path).unwrap();
    assert_eq!(feed.next_record().unwrap(), FeedRecord::Tick { tick: 7 });
    assert!(matches!(feed.next_record(), Err(FeedError::EndOfStream)));
}

#[test]
fn test_open_missing_file() {
    let err = match FeedReader::open(Path::new("/nonexistent/replay.jsonl")) {
        Err(e) => e,
        Ok(_) => panic!("expected open failure"),
    };
    assert!(err.to_string().contains("Failed to open feed file"));
}
