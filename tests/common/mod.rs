#![allow(dead_code)]

use serde_json::json;
use tempfile::TempDir;

use government_lookup_server::core::seed::{SeedFile, apply_seed};
use government_lookup_server::core::store::Store;
use government_lookup_server::features::register_references;

pub const CURRENT_GOVERNMENT_ID: &str = "gov-2024";
pub const PAST_GOVERNMENT_ID: &str = "gov-2023";

pub fn open_store() -> (TempDir, Store) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let db = sled::open(temp_dir.path()).expect("sled open");
    (temp_dir, register_references(Store::new(db)))
}

pub fn fixture(with_current: bool) -> SeedFile {
    SeedFile {
        governments: vec![
            json!({
                "_id": PAST_GOVERNMENT_ID,
                "uid": "spring-2023",
                "current": false,
                "name": "Spring 2023 Student Government",
                "term_start": "2023-01-15T00:00:00Z",
                "term_end": "2023-05-15T00:00:00Z"
            }),
            json!({
                "_id": CURRENT_GOVERNMENT_ID,
                "uid": "fall-2024",
                "current": with_current,
                "name": "Fall 2024 Student Government",
                "term_start": "2024-08-20T00:00:00Z"
            }),
        ],
        petitions: vec![
            json!({
                "_id": "pet-1",
                "government": CURRENT_GOVERNMENT_ID,
                "author": "user-1",
                "cosigners": ["user-2", "user-missing", "user-1"],
                "title": "Longer library hours"
            }),
            json!({
                "_id": "pet-2",
                "government": CURRENT_GOVERNMENT_ID,
                "author": "user-missing",
                "title": "More bike racks"
            }),
            json!({
                "_id": "pet-3",
                "government": PAST_GOVERNMENT_ID,
                "author": "user-2",
                "title": "Recycling bins"
            }),
        ],
        users: vec![
            json!({
                "_id": "user-1",
                "name": "Avery",
                "roles": [{"government": CURRENT_GOVERNMENT_ID, "title": "President"}]
            }),
            json!({
                "_id": "user-2",
                "name": "Jordan",
                "roles": [
                    {"government": PAST_GOVERNMENT_ID, "title": "Treasurer"},
                    {"government": CURRENT_GOVERNMENT_ID, "title": "Senator"}
                ]
            }),
            json!({
                "_id": "user-3",
                "name": "Riley",
                "roles": [{"government": PAST_GOVERNMENT_ID, "title": "Senator"}]
            }),
            json!({"_id": "user-4", "name": "Casey", "roles": []}),
        ],
    }
}

pub async fn seeded_store(with_current: bool) -> (TempDir, Store) {
    let (temp_dir, store) = open_store();
    apply_seed(&store, fixture(with_current))
        .await
        .expect("seed applies");
    (temp_dir, store)
}

pub fn ids(records: &[government_lookup_server::core::query::Record]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.id().expect("record id").to_string())
        .collect()
}
