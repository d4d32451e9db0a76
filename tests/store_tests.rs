mod common;

use serde_json::{Value, json};

use government_lookup_server::core::error::AppError;
use government_lookup_server::core::query::{Filter, QueryOptions, Record};
use government_lookup_server::core::seed::{SeedFile, apply_seed};
use government_lookup_server::features::governments::GOVERNMENTS_COLLECTION;
use government_lookup_server::features::petitions::PETITIONS_COLLECTION;
use government_lookup_server::features::users::USERS_COLLECTION;

use common::{CURRENT_GOVERNMENT_ID, ids, open_store, seeded_store};

#[tokio::test]
async fn insert_assigns_an_id_when_missing() {
    let (_temp_dir, store) = open_store();
    let governments = store.collection(GOVERNMENTS_COLLECTION).expect("collection");

    let id = governments
        .insert(json!({"uid": "summer-2025", "current": false}))
        .await
        .expect("insert");
    assert_eq!(id.len(), 24);

    let found = governments
        .find_one(Filter::new().eq("uid", "summer-2025"), &QueryOptions::new().lean(true))
        .await
        .expect("lookup")
        .expect("document exists");
    assert_eq!(found.id(), Some(id.as_str()));
}

#[tokio::test]
async fn insert_rejects_non_object_documents() {
    let (_temp_dir, store) = open_store();
    let governments = store.collection(GOVERNMENTS_COLLECTION).expect("collection");

    let error = governments
        .insert(json!(["not", "a", "document"]))
        .await
        .expect_err("arrays are not documents");
    assert!(matches!(error, AppError::BadRequest(_)));
}

#[tokio::test]
async fn select_id_only_keeps_just_the_identifier() {
    let (_temp_dir, store) = seeded_store(true).await;
    let governments = store.collection(GOVERNMENTS_COLLECTION).expect("collection");

    let record = governments
        .find_one(
            Filter::new().eq("current", true),
            &QueryOptions::new().lean(true).select(["_id"]),
        )
        .await
        .expect("lookup")
        .expect("current government");

    assert_eq!(record.into_value(), json!({"_id": CURRENT_GOVERNMENT_ID}));
}

#[tokio::test]
async fn exclusion_select_drops_named_fields() {
    let (_temp_dir, store) = seeded_store(true).await;
    let governments = store.collection(GOVERNMENTS_COLLECTION).expect("collection");

    let record = governments
        .find_one(
            Filter::new().eq("uid", "fall-2024"),
            &QueryOptions::new().lean(true).select(["-_id", "-name", "-term_start"]),
        )
        .await
        .expect("lookup")
        .expect("government");

    assert_eq!(record.into_value(), json!({"uid": "fall-2024", "current": true}));
}

#[tokio::test]
async fn mixed_select_is_rejected_before_scanning() {
    let (_temp_dir, store) = seeded_store(true).await;
    let governments = store.collection(GOVERNMENTS_COLLECTION).expect("collection");

    let error = governments
        .find_one(
            Filter::new().eq("uid", "does-not-exist"),
            &QueryOptions::new().select(["uid", "-name"]),
        )
        .await
        .expect_err("mixed projection");
    assert!(matches!(error, AppError::BadRequest(_)));
}

#[tokio::test]
async fn unregistered_populate_is_rejected_before_scanning() {
    let (_temp_dir, store) = seeded_store(true).await;
    let governments = store.collection(GOVERNMENTS_COLLECTION).expect("collection");

    let error = governments
        .find_one(
            Filter::new().eq("uid", "does-not-exist"),
            &QueryOptions::new().populate(["members"]),
        )
        .await
        .expect_err("governments have no `members` reference");
    assert!(matches!(error, AppError::BadRequest(_)));

    let error = governments
        .find(
            Filter::new().eq("uid", "does-not-exist"),
            &QueryOptions::new().populate(["members"]),
        )
        .await
        .expect_err("governments have no `members` reference");
    assert!(matches!(error, AppError::BadRequest(_)));
}

#[tokio::test]
async fn populate_resolves_references_inline() {
    let (_temp_dir, store) = seeded_store(true).await;
    let petitions = store.collection(PETITIONS_COLLECTION).expect("collection");

    let records = petitions
        .find(
            Filter::new().eq("government", CURRENT_GOVERNMENT_ID),
            &QueryOptions::new()
                .lean(true)
                .select(["title", "author"])
                .populate(["author"]),
        )
        .await
        .expect("petitions");

    assert_eq!(ids(&records), vec!["pet-1", "pet-2"]);
    let author = records[0].get("author").expect("author field");
    assert_eq!(author["name"], json!("Avery"));
    assert_eq!(records[1].get("author"), Some(&json!(null)));
}

#[tokio::test]
async fn populate_of_id_arrays_drops_missing_entries_in_order() {
    let (_temp_dir, store) = seeded_store(true).await;
    let petitions = store.collection(PETITIONS_COLLECTION).expect("collection");

    let record = petitions
        .find_one(
            Filter::new().eq("_id", "pet-1"),
            &QueryOptions::new()
                .lean(true)
                .select(["cosigners"])
                .populate(["cosigners"]),
        )
        .await
        .expect("lookup")
        .expect("petition");

    let cosigners = record
        .get("cosigners")
        .and_then(|value| value.as_array())
        .expect("cosigners array");
    let names: Vec<&Value> = cosigners.iter().map(|user| &user["name"]).collect();
    assert_eq!(names, vec![&json!("Jordan"), &json!("Avery")]);
}

#[tokio::test]
async fn populate_skips_fields_removed_by_select() {
    let (_temp_dir, store) = seeded_store(true).await;
    let petitions = store.collection(PETITIONS_COLLECTION).expect("collection");

    let record = petitions
        .find_one(
            Filter::new().eq("_id", "pet-3"),
            &QueryOptions::new().lean(true).select(["title"]).populate(["government"]),
        )
        .await
        .expect("lookup")
        .expect("petition");

    assert_eq!(record.into_value(), json!({"_id": "pet-3", "title": "Recycling bins"}));
}

#[tokio::test]
async fn populate_of_unregistered_field_is_rejected() {
    let (_temp_dir, store) = seeded_store(true).await;
    let governments = store.collection(GOVERNMENTS_COLLECTION).expect("collection");

    let error = governments
        .find_one(
            Filter::new().eq("current", true),
            &QueryOptions::new().populate(["members"]),
        )
        .await
        .expect_err("governments have no `members` reference");
    assert!(matches!(error, AppError::BadRequest(_)));
}

#[tokio::test]
async fn dotted_filters_match_any_array_element() {
    let (_temp_dir, store) = seeded_store(true).await;
    let users = store.collection(USERS_COLLECTION).expect("collection");

    let senators = users
        .find(
            Filter::new().eq("roles.title", "Senator"),
            &QueryOptions::new().lean(true),
        )
        .await
        .expect("users");

    assert_eq!(ids(&senators), vec!["user-2", "user-3"]);
}

#[tokio::test]
async fn array_fields_match_contained_values() {
    let (_temp_dir, store) = open_store();
    let users = store.collection(USERS_COLLECTION).expect("collection");
    users
        .insert(json!({"_id": "user-9", "tags": ["founder", "alumni"]}))
        .await
        .expect("insert");

    let found = users
        .find(Filter::new().eq("tags", "alumni"), &QueryOptions::default())
        .await
        .expect("users");
    assert_eq!(ids(&found), vec!["user-9"]);
}

#[tokio::test]
async fn live_documents_save_only_modified_fields() {
    let (_temp_dir, store) = seeded_store(true).await;
    let governments = store.collection(GOVERNMENTS_COLLECTION).expect("collection");

    let record = governments
        .find_one(
            Filter::new().eq("uid", "fall-2024"),
            &QueryOptions::new().select(["current"]),
        )
        .await
        .expect("lookup")
        .expect("government");

    let Record::Live(mut document) = record else {
        panic!("expected a live document");
    };
    assert!(!document.is_modified());

    document.set("current", false);
    assert_eq!(document.modified_fields().collect::<Vec<_>>(), vec!["current"]);
    document.save().await.expect("save");
    assert!(!document.is_modified());

    let reloaded = governments
        .find_one(
            Filter::new().eq("uid", "fall-2024"),
            &QueryOptions::new().lean(true),
        )
        .await
        .expect("lookup")
        .expect("government");
    assert_eq!(reloaded.get("current"), Some(&json!(false)));
    assert_eq!(
        reloaded.get("name"),
        Some(&json!("Fall 2024 Student Government"))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_saves_of_different_fields_both_persist() {
    let (_temp_dir, store) = seeded_store(true).await;
    let governments = store.collection(GOVERNMENTS_COLLECTION).expect("collection");

    for round in 0..20 {
        let mut copies = Vec::new();
        for _ in 0..2 {
            let record = governments
                .find_one(Filter::new().eq("uid", "fall-2024"), &QueryOptions::default())
                .await
                .expect("lookup")
                .expect("government");
            let Record::Live(document) = record else {
                panic!("expected a live document");
            };
            copies.push(document);
        }

        let mut second = copies.pop().expect("second copy");
        let mut first = copies.pop().expect("first copy");
        first.set("motto", format!("motto-{round}"));
        second.set("seats", round);

        let (first_saved, second_saved) = tokio::join!(
            tokio::spawn(async move { first.save().await }),
            tokio::spawn(async move { second.save().await }),
        );
        first_saved.expect("join").expect("first save");
        second_saved.expect("join").expect("second save");

        let reloaded = governments
            .find_one(
                Filter::new().eq("uid", "fall-2024"),
                &QueryOptions::new().lean(true),
            )
            .await
            .expect("lookup")
            .expect("government");
        assert_eq!(reloaded.get("motto"), Some(&json!(format!("motto-{round}"))));
        assert_eq!(reloaded.get("seats"), Some(&json!(round)));
    }
}

#[tokio::test]
async fn saving_a_document_read_without_id_is_rejected() {
    let (_temp_dir, store) = seeded_store(true).await;
    let governments = store.collection(GOVERNMENTS_COLLECTION).expect("collection");

    let record = governments
        .find_one(
            Filter::new().eq("uid", "fall-2024"),
            &QueryOptions::new().select(["-_id"]),
        )
        .await
        .expect("lookup")
        .expect("government");
    let Record::Live(mut document) = record else {
        panic!("expected a live document");
    };

    document.set("current", false);
    let error = document.save().await.expect_err("no id to save under");
    assert!(matches!(error, AppError::BadRequest(_)));
}

#[tokio::test]
async fn seed_with_invalid_entry_writes_nothing() {
    let (_temp_dir, store) = open_store();

    let seed = SeedFile {
        governments: vec![json!({"_id": "gov-1", "uid": "fall-2024", "current": true})],
        petitions: vec![json!("not a petition")],
        ..SeedFile::default()
    };

    let error = apply_seed(&store, seed).await.expect_err("petition is not an object");
    assert!(matches!(error, AppError::BadRequest(_)));

    let governments = store.collection(GOVERNMENTS_COLLECTION).expect("collection");
    let stored = governments
        .find(Filter::new(), &QueryOptions::new().lean(true))
        .await
        .expect("scan");
    assert!(stored.is_empty());
}

#[tokio::test]
async fn seed_rejects_governments_without_uid() {
    let (_temp_dir, store) = open_store();

    let seed = SeedFile {
        governments: vec![json!({"current": true})],
        ..SeedFile::default()
    };

    let error = apply_seed(&store, seed).await.expect_err("uid is required");
    assert!(matches!(error, AppError::BadRequest(_)));
}
