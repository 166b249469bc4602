use std::sync::Arc;

use serde_json::json;

use nestdb::{AsyncDatabase, Database, Entry, Error, ImportMode};
use nestdb_json_store::{FileStore, MemoryStore};

fn db() -> Database<MemoryStore> {
    Database::new(MemoryStore::new())
}

#[test]
fn set_and_get_round_trip() {
    let db = db();
    db.set("user", json!({ "name": "updev" })).unwrap();
    assert_eq!(db.get("user").unwrap(), Some(json!({ "name": "updev" })));
}

#[test]
fn nested_set_creates_intermediate_objects() {
    let db = db();
    db.set("user.age", json!(16)).unwrap();
    assert_eq!(db.get("user").unwrap(), Some(json!({ "age": 16 })));
    assert_eq!(db.get("user.age").unwrap(), Some(json!(16)));
}

#[test]
fn deep_set_then_partial_reads() {
    let db = db();
    db.set("guild.settings.prefix", json!("!")).unwrap();
    db.set("guild.settings.locale", json!("en")).unwrap();

    assert_eq!(
        db.get("guild.settings").unwrap(),
        Some(json!({ "prefix": "!", "locale": "en" }))
    );
    assert_eq!(db.get("guild.settings.missing").unwrap(), None);
}

#[test]
fn get_of_unknown_root_is_none() {
    let db = db();
    assert_eq!(db.get("ghost").unwrap(), None);
    assert_eq!(db.get("ghost.deep.path").unwrap(), None);
}

#[test]
fn get_required_errors_on_unresolved_key() {
    let db = db();
    assert!(matches!(
        db.get_required("ghost"),
        Err(Error::NotFound { .. })
    ));

    db.set("user", json!(1)).unwrap();
    assert_eq!(db.get_required("user").unwrap(), json!(1));
}

#[test]
fn fetch_is_get() {
    let db = db();
    db.set("user", json!("x")).unwrap();
    assert_eq!(db.fetch("user").unwrap(), db.get("user").unwrap());
}

#[test]
fn descending_through_a_scalar_is_a_target_type_error() {
    let db = db();
    db.set("user.age", json!(16)).unwrap();
    assert!(matches!(
        db.get("user.age.days"),
        Err(Error::TargetType { .. })
    ));
    assert!(matches!(
        db.set("user.age.days", json!(1)),
        Err(Error::TargetType { .. })
    ));
}

#[test]
fn null_values_are_rejected_at_the_boundary() {
    let db = db();
    assert!(matches!(
        db.set("user", json!(null)),
        Err(Error::InvalidValue { .. })
    ));
    assert!(matches!(
        db.push("list", json!(null)),
        Err(Error::InvalidValue { .. })
    ));
}

#[test]
fn malformed_keys_are_rejected() {
    let db = db();
    assert!(matches!(db.set("", json!(1)), Err(Error::InvalidKey { .. })));
    assert!(matches!(
        db.get(".age"),
        Err(Error::InvalidKey { .. })
    ));
}

#[test]
fn exists_tracks_resolution_without_erroring() {
    let db = db();
    db.set("user.age", json!(16)).unwrap();

    assert!(db.exists("user").unwrap());
    assert!(db.exists("user.age").unwrap());
    assert!(!db.exists("user.name").unwrap());
    assert!(!db.exists("ghost").unwrap());
    // Scalar descent counts as unresolved here, never an error.
    assert!(!db.exists("user.age.days").unwrap());
    assert_eq!(db.has("user").unwrap(), db.exists("user").unwrap());
}

#[test]
fn delete_whole_record_and_idempotence() {
    let db = db();
    db.set("user", json!(1)).unwrap();

    assert!(db.delete("user").unwrap());
    assert!(!db.delete("user").unwrap());
    assert_eq!(db.get("user").unwrap(), None);
}

#[test]
fn delete_sub_path_leaves_siblings() {
    let db = db();
    db.set("user", json!({ "age": 16, "name": "updev" })).unwrap();

    assert!(db.delete("user.age").unwrap());
    assert_eq!(db.get("user").unwrap(), Some(json!({ "name": "updev" })));
    assert!(!db.delete("user.age").unwrap());
}

#[test]
fn delete_all_empties_the_store() {
    let db = db();
    db.set("a", json!(1)).unwrap();
    db.set("b", json!(2)).unwrap();

    db.delete_all().unwrap();
    assert_eq!(db.count().unwrap(), 0);
}

#[test]
fn push_creates_then_appends() {
    let db = db();
    db.push("user.items", json!("sword")).unwrap();
    let entry = db.push("user.items", json!("shield")).unwrap();

    assert_eq!(entry.key, "user.items");
    assert_eq!(entry.value, json!(["sword", "shield"]));
    assert_eq!(db.get("user.items").unwrap(), Some(json!(["sword", "shield"])));
}

#[test]
fn push_array_concatenates() {
    let db = db();
    db.push("items", json!([1, 2])).unwrap();
    let entry = db.push("items", json!([3, 4])).unwrap();
    assert_eq!(entry.value, json!([1, 2, 3, 4]));
}

#[test]
fn push_onto_non_array_is_a_target_type_error() {
    let db = db();
    db.set("items", json!("scalar")).unwrap();
    assert!(matches!(
        db.push("items", json!(1)),
        Err(Error::TargetType { .. })
    ));
}

#[test]
fn pull_is_the_inverse_of_push() {
    let db = db();
    db.push("items", json!("a")).unwrap();
    db.push("items", json!("b")).unwrap();

    let entry = db.pull("items", &json!("a"), false).unwrap();
    assert_eq!(entry.value, json!(["b"]));
}

#[test]
fn pull_matches_structurally() {
    let db = db();
    db.push("items", json!({ "id": 1, "tag": "x" })).unwrap();
    db.push("items", json!({ "id": 2, "tag": "y" })).unwrap();

    let entry = db.pull("items", &json!({ "id": 1, "tag": "x" }), false).unwrap();
    assert_eq!(entry.value, json!([{ "id": 2, "tag": "y" }]));

    // A partial object is not equal to any element, so nothing moves.
    let entry = db.pull("items", &json!({ "id": 2 }), false).unwrap();
    assert_eq!(entry.value, json!([{ "id": 2, "tag": "y" }]));
}

#[test]
fn pull_multiple_removes_every_match() {
    let db = db();
    db.push("items", json!([1, 2, 1, 3, 1])).unwrap();

    let entry = db.pull("items", &json!(1), true).unwrap();
    assert_eq!(entry.value, json!([2, 3]));

    let entry = db.pull("items", &json!(1), false).unwrap();
    assert_eq!(entry.value, json!([2, 3]));
}

#[test]
fn pull_single_removes_first_match_only() {
    let db = db();
    db.push("items", json!([1, 2, 1])).unwrap();
    let entry = db.pull("items", &json!(1), false).unwrap();
    assert_eq!(entry.value, json!([2, 1]));
}

#[test]
fn pull_errors_on_absent_or_non_array() {
    let db = db();
    assert!(matches!(
        db.pull("ghost", &json!(1), false),
        Err(Error::NotFound { .. })
    ));

    db.set("scalar", json!(5)).unwrap();
    assert!(matches!(
        db.pull("scalar", &json!(1), false),
        Err(Error::TargetType { .. })
    ));
}

#[test]
fn math_coerces_absent_to_zero() {
    let db = db();
    assert_eq!(db.add("coins", 5.0).unwrap().value, json!(5));
    assert_eq!(db.subtract("debt", 5.0).unwrap().value, json!(-5));
}

#[test]
fn math_operates_on_stored_numbers() {
    let db = db();
    db.set("n", json!(4)).unwrap();
    assert_eq!(db.math("n", "*", 5.0).unwrap().value, json!(20));
    assert_eq!(db.math("n", "/", 8.0).unwrap().value, json!(2.5));
    assert_eq!(db.get("n").unwrap(), Some(json!(2.5)));
}

#[test]
fn math_rejects_bad_operator_and_non_finite() {
    let db = db();
    assert!(matches!(
        db.math("n", "^", 2.0),
        Err(Error::InvalidOperator { .. })
    ));
    assert!(matches!(
        db.math("n", "/", 0.0),
        Err(Error::InvalidValue { .. })
    ));
    assert!(matches!(
        db.math("n", "+", f64::NAN),
        Err(Error::InvalidValue { .. })
    ));
}

#[test]
fn math_on_non_number_is_a_target_type_error() {
    let db = db();
    db.set("n", json!("four")).unwrap();
    assert!(matches!(db.add("n", 1.0), Err(Error::TargetType { .. })));
}

#[test]
fn value_type_reports_tags() {
    let db = db();
    db.set("doc", json!({ "list": [1], "word": "x", "flag": true, "num": 2 }))
        .unwrap();

    assert_eq!(db.value_type("doc").unwrap(), Some("object"));
    assert_eq!(db.value_type("doc.list").unwrap(), Some("array"));
    assert_eq!(db.value_type("doc.word").unwrap(), Some("string"));
    assert_eq!(db.value_type("doc.flag").unwrap(), Some("boolean"));
    assert_eq!(db.value_type("doc.num").unwrap(), Some("number"));
    assert_eq!(db.value_type("ghost").unwrap(), None);
}

#[test]
fn all_keys_values_and_count() {
    let db = db();
    db.set("b", json!(2)).unwrap();
    db.set("a", json!(1)).unwrap();

    assert_eq!(db.count().unwrap(), 2);
    assert_eq!(db.key_array().unwrap(), vec!["a", "b"]);
    assert_eq!(db.value_array().unwrap(), vec![json!(1), json!(2)]);
    assert_eq!(db.all(Some(1)).unwrap().len(), 1);
}

#[test]
fn filter_and_sort_by() {
    let db = db();
    db.set("alpha", json!(3)).unwrap();
    db.set("beta", json!(1)).unwrap();
    db.set("gamma", json!(2)).unwrap();

    let odd: Vec<Entry> = db
        .filter(|e| e.value.as_i64().is_some_and(|n| n % 2 == 1))
        .unwrap();
    assert_eq!(odd.len(), 2);

    let sorted = db
        .sort_by(|a, b| a.value.as_i64().cmp(&b.value.as_i64()))
        .unwrap();
    let keys: Vec<&str> = sorted.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["beta", "gamma", "alpha"]);
}

#[test]
fn starts_with_and_includes_match_root_keys() {
    let db = db();
    db.set("updev", json!(1)).unwrap();
    db.set("upstream", json!(2)).unwrap();
    db.set("zeta", json!(3)).unwrap();

    let keys: Vec<String> = db
        .starts_with("up")
        .unwrap()
        .into_iter()
        .map(|e| e.key)
        .collect();
    assert_eq!(keys, vec!["updev", "upstream"]);

    let keys: Vec<String> = db
        .includes("stream")
        .unwrap()
        .into_iter()
        .map(|e| e.key)
        .collect();
    assert_eq!(keys, vec!["upstream"]);
}

#[test]
fn empty_search_terms_are_rejected() {
    let db = db();
    assert!(matches!(
        db.starts_with(""),
        Err(Error::InvalidArgument { .. })
    ));
    assert!(matches!(db.includes(""), Err(Error::InvalidArgument { .. })));
}

#[test]
fn random_samples_without_replacement() {
    let db = db();
    for i in 0..5 {
        db.set(&format!("k{}", i), json!(i)).unwrap();
    }

    let picked = db.random(3).unwrap();
    assert_eq!(picked.len(), 3);
    let mut keys: Vec<String> = picked.into_iter().map(|e| e.key).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 3);
}

#[test]
fn random_over_requesting_is_a_range_error() {
    let db = db();
    db.set("a", json!(1)).unwrap();
    db.set("b", json!(2)).unwrap();

    assert!(matches!(db.random(3), Err(Error::Range { .. })));
    assert_eq!(db.random(2).unwrap().len(), 2);
    assert_eq!(db.random(0).unwrap().len(), 0);
}

#[test]
fn export_import_round_trip() {
    let source = db();
    source.set("user.age", json!(16)).unwrap();
    source.set("guild", json!({ "prefix": "!" })).unwrap();

    let snapshot = source.export().unwrap();

    let bulk = db();
    assert_eq!(bulk.import(snapshot.clone(), ImportMode::Bulk).unwrap(), 2);
    assert_eq!(bulk.export().unwrap(), snapshot);

    let upsert = db();
    assert_eq!(upsert.import(snapshot.clone(), ImportMode::Upsert).unwrap(), 2);
    assert_eq!(upsert.export().unwrap(), snapshot);
}

#[test]
fn import_upsert_validates_entries() {
    let db = db();
    let entries = vec![Entry::new("ok".to_string(), json!(1)), Entry::new(String::new(), json!(2))];
    assert!(matches!(
        db.import(entries, ImportMode::Upsert),
        Err(Error::InvalidKey { .. })
    ));
}

#[test]
fn entries_carry_the_full_dotted_key() {
    let db = db();
    let entry = db.set("user.stats.wins", json!(3)).unwrap();
    assert_eq!(entry.key, "user.stats.wins");
    assert_eq!(entry.value, json!(3));
}

#[test]
fn concurrent_math_on_one_key_loses_no_updates() {
    let db = Arc::new(db());
    let mut handles = Vec::new();

    for _ in 0..8 {
        let db = Arc::clone(&db);
        handles.push(std::thread::spawn(move || {
            for _ in 0..50 {
                db.add("counter", 1.0).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(db.get("counter").unwrap(), Some(json!(400)));
}

#[test]
fn file_store_backed_database_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let db = Database::new(FileStore::with_root(dir.path(), "game").unwrap());
        db.set("user.coins", json!(10)).unwrap();
        db.add("user.coins", 5.0).unwrap();
    }

    let db = Database::new(FileStore::with_root(dir.path(), "game").unwrap());
    assert_eq!(db.get("user.coins").unwrap(), Some(json!(15)));
    assert_eq!(db.store_name(), "game");
}

#[tokio::test]
async fn async_engine_matches_sync_semantics() {
    let db = AsyncDatabase::new(MemoryStore::new());

    db.set("user.age", json!(16)).await.unwrap();
    assert_eq!(db.get("user").await.unwrap(), Some(json!({ "age": 16 })));

    db.push("user.items", json!("sword")).await.unwrap();
    let entry = db.pull("user.items", &json!("sword"), false).await.unwrap();
    assert_eq!(entry.value, json!([]));

    assert_eq!(db.add("user.coins", 5.0).await.unwrap().value, json!(5));
    assert!(db.exists("user.coins").await.unwrap());
    assert!(db.delete("user").await.unwrap());
    assert_eq!(db.count().await.unwrap(), 0);
}

#[tokio::test]
async fn async_engine_collection_queries() {
    let db = AsyncDatabase::new(MemoryStore::new());
    db.set("updev", json!(1)).await.unwrap();
    db.set("zeta", json!(2)).await.unwrap();

    assert_eq!(db.key_array().await.unwrap(), vec!["updev", "zeta"]);
    assert_eq!(db.starts_with("up").await.unwrap().len(), 1);
    assert!(matches!(
        db.random(5).await,
        Err(Error::Range { .. })
    ));

    let snapshot = db.export().await.unwrap();
    let other = AsyncDatabase::new(MemoryStore::new());
    other.import(snapshot, ImportMode::Bulk).await.unwrap();
    assert_eq!(other.count().await.unwrap(), 2);
}
