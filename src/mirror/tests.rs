use super::*;
use crate::models::Sensor;

fn sensor(sensor_id: i64, field_id: i64) -> Sensor {
    Sensor {
        sensor_id,
        field_id,
        name: format!("sensor-{}", sensor_id),
        sensor_type: "moisture".to_string(),
        moisture: Some(40.0),
        ph_level: None,
        npk_n: None,
        npk_p: None,
        npk_k: None,
        temperature: None,
    }
}

fn memory_mirror() -> SensorMirror {
    SensorMirror::new(Box::new(MemoryStore::default()))
}

#[test]
fn empty_store_reads_as_empty() {
    let mirror = memory_mirror();
    assert!(mirror.read_all().is_empty());
}

#[test]
fn malformed_content_reads_as_empty() {
    let store = MemoryStore::default();
    store.set(MIRROR_KEY, r#"{"not":"an array"}"#);
    let mirror = SensorMirror::new(Box::new(store));
    assert!(mirror.read_all().is_empty());

    let store = MemoryStore::default();
    store.set(MIRROR_KEY, "garbage bytes, not json");
    let mirror = SensorMirror::new(Box::new(store));
    assert!(mirror.read_all().is_empty());
}

#[test]
fn upsert_new_id_prepends() {
    let mirror = memory_mirror();
    mirror.upsert(sensor(1, 10));
    mirror.upsert(sensor(2, 10));

    let all = mirror.read_all();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].sensor_id, 2);
    assert_eq!(all[1].sensor_id, 1);
}

#[test]
fn upsert_existing_id_replaces_in_place() {
    let mirror = memory_mirror();
    mirror.upsert(sensor(1, 10));
    mirror.upsert(sensor(2, 10));
    mirror.upsert(sensor(3, 11));

    let mut updated = sensor(2, 10);
    updated.moisture = Some(12.5);
    mirror.upsert(updated);

    let all = mirror.read_all();
    let ids: Vec<i64> = all.iter().map(|s| s.sensor_id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert_eq!(all[1].moisture, Some(12.5));
}

#[test]
fn upsert_sequences_keep_one_record_per_id() {
    let mirror = memory_mirror();
    for round in 0..3 {
        for id in 1..=4 {
            let mut s = sensor(id, 10);
            s.moisture = Some(round as f64);
            mirror.upsert(s);
        }
    }
    let all = mirror.read_all();
    assert_eq!(all.len(), 4);
    for s in &all {
        assert_eq!(s.moisture, Some(2.0));
    }
}

#[test]
fn remove_drops_only_the_matching_id() {
    let mirror = memory_mirror();
    mirror.upsert(sensor(1, 10));
    mirror.upsert(sensor(2, 10));
    mirror.remove(1);

    let all = mirror.read_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].sensor_id, 2);

    // Removing an unknown id is a no-op.
    mirror.remove(99);
    assert_eq!(mirror.read_all().len(), 1);
}

#[test]
fn read_for_fields_filters_by_field_id() {
    let mirror = memory_mirror();
    mirror.upsert(sensor(1, 10));
    mirror.upsert(sensor(2, 11));
    mirror.upsert(sensor(3, 12));

    let subset = mirror.read_for_fields(&[10, 12]);
    let ids: Vec<i64> = subset.iter().map(|s| s.sensor_id).collect();
    assert_eq!(ids, vec![3, 1]);
}

#[test]
fn merge_synced_preserves_unrelated_fields() {
    let mirror = memory_mirror();
    mirror.write_all(&[sensor(1, 10), sensor(2, 11), sensor(3, 12)]);

    // Sync fields 10 and 11: sensor 1 was replaced remotely by sensor 4,
    // sensor 2 disappeared, sensor 3 (field 12) was not part of the sync.
    let fetched = vec![sensor(4, 10)];
    let merged = mirror.merge_synced(&fetched, &[10, 11]);

    let ids: Vec<i64> = merged.iter().map(|s| s.sensor_id).collect();
    assert_eq!(ids, vec![4, 3]);

    let stored: Vec<i64> = mirror.read_all().iter().map(|s| s.sensor_id).collect();
    assert_eq!(stored, vec![4, 3]);
}

#[test]
fn merge_synced_with_empty_fetch_clears_synced_fields_only() {
    let mirror = memory_mirror();
    mirror.write_all(&[sensor(1, 10), sensor(2, 11)]);

    let merged = mirror.merge_synced(&[], &[10]);
    let ids: Vec<i64> = merged.iter().map(|s| s.sensor_id).collect();
    assert_eq!(ids, vec![2]);
}

#[test]
fn file_store_round_trips() {
    let dir = std::env::temp_dir().join(format!("agricare-mirror-{}", std::process::id()));
    let store = FileStore::new(&dir);
    store.set(MIRROR_KEY, r#"[]"#);
    assert_eq!(store.get(MIRROR_KEY).as_deref(), Some("[]"));
    assert_eq!(store.get("missing"), None);
    let _ = std::fs::remove_dir_all(&dir);
}
