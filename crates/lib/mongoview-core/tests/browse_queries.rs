use std::time::Duration;

use bson::oid::ObjectId;
use bson::doc;
use mongoview_core::control::{BrowseControlPlane, ControlError, Deadline, StoreAction};
use mongoview_core::store::{MemoryDocStore, StoreError};
use mongoview_store::DocumentId;

const BUDGET: Duration = Duration::from_secs(5);

const fn oid(seed: u8) -> ObjectId {
    ObjectId::from_bytes([seed; 12])
}

async fn seeded_store() -> MemoryDocStore {
    let store = MemoryDocStore::new("example");
    for (seed, name) in [(1, "ada"), (2, "grace"), (3, "linus")] {
        let id = oid(seed);
        let age = i32::from(seed) * 10;
        store
            .insert_document("users", doc! { "_id": id, "name": name, "age": age })
            .await;
    }
    store.create_collection("empty").await;
    store
}

async fn build_control_plane() -> BrowseControlPlane<MemoryDocStore> {
    BrowseControlPlane::new(seeded_store().await)
}

#[tokio::test]
async fn list_collections_in_store_order() {
    let control = build_control_plane().await;
    let listing = control
        .list_collections(Deadline::after(BUDGET))
        .await
        .expect("listing should succeed");

    assert_eq!(listing.database_name, "example");
    assert_eq!(listing.collection_names, vec!["users", "empty"]);
}

#[tokio::test]
async fn list_collections_stops_on_cursor_error() {
    let store = seeded_store().await.with_stream_failure_after(1);
    let control = BrowseControlPlane::new(store);
    let err = control
        .list_collections(Deadline::after(BUDGET))
        .await
        .expect_err("interrupted cursor should fail");

    assert!(matches!(
        err,
        ControlError::Store {
            action: StoreAction::ListCollections,
            ..
        }
    ));
}

#[tokio::test]
async fn list_ids_counts_whole_collection_regardless_of_skip() {
    let control = build_control_plane().await;

    let first = control
        .list_document_ids("users", None, Deadline::after(BUDGET))
        .await
        .expect("first page should load");
    assert_eq!(first.document_count, 3);
    let expected: Vec<DocumentId> = [1, 2, 3].map(|seed| DocumentId::from(oid(seed))).to_vec();
    assert_eq!(first.ids, expected);

    let rest = control
        .list_document_ids("users", Some("2"), Deadline::after(BUDGET))
        .await
        .expect("skipped page should load");
    assert_eq!(rest.document_count, 3);
    assert_eq!(rest.ids, vec![DocumentId::from(oid(3))]);

    let past_end = control
        .list_document_ids("users", Some("10"), Deadline::after(BUDGET))
        .await
        .expect("skip past the end should still succeed");
    assert_eq!(past_end.document_count, 3);
    assert!(past_end.ids.is_empty());
}

#[tokio::test]
async fn omitted_skip_matches_zero_skip() {
    let control = build_control_plane().await;
    let omitted = control
        .list_document_ids("users", None, Deadline::after(BUDGET))
        .await
        .unwrap();
    let empty = control
        .list_document_ids("users", Some(""), Deadline::after(BUDGET))
        .await
        .unwrap();
    let zero = control
        .list_document_ids("users", Some("0"), Deadline::after(BUDGET))
        .await
        .unwrap();

    assert_eq!(omitted, zero);
    assert_eq!(empty, zero);
}

#[tokio::test]
async fn invalid_skip_fails_before_any_query() {
    let store = seeded_store().await;
    let control = BrowseControlPlane::new(store.clone());

    for skip in ["-1", "two", "1e3"] {
        let err = control
            .list_document_ids("users", Some(skip), Deadline::after(BUDGET))
            .await
            .expect_err("bad skip should be rejected");
        assert!(
            matches!(&err, ControlError::Validation(message) if message == "invalid skip param"),
            "unexpected error for {skip:?}: {err}"
        );
    }
    assert_eq!(store.query_count(), 0);
}

#[tokio::test]
async fn missing_name_is_validation_error() {
    let control = build_control_plane().await;
    let err = control
        .list_document_ids("", None, Deadline::after(BUDGET))
        .await
        .unwrap_err();

    assert!(matches!(err, ControlError::Validation(message) if message == "missing name query parameter"));
}

#[tokio::test]
async fn non_object_id_aborts_listing() {
    let store = seeded_store().await;
    store
        .insert_document("users", doc! { "_id": "custom-key", "name": "edsger" })
        .await;
    let control = BrowseControlPlane::new(store);

    let err = control
        .list_document_ids("users", None, Deadline::after(BUDGET))
        .await
        .unwrap_err();

    match err {
        ControlError::Store {
            action: StoreAction::QueryDocuments,
            source: StoreError::UnsupportedIdType(kind),
        } => assert_eq!(kind, "string"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn interrupted_id_scan_is_reported_as_query_action() {
    let store = seeded_store().await.with_stream_failure_after(1);
    let control = BrowseControlPlane::new(store);
    let err = control
        .list_document_ids("users", None, Deadline::after(BUDGET))
        .await
        .expect_err("interrupted cursor should fail");

    assert!(matches!(
        err,
        ControlError::Store {
            action: StoreAction::QueryDocuments,
            ..
        }
    ));
}

#[tokio::test]
async fn count_failure_is_reported_as_count_action() {
    let control = BrowseControlPlane::new(seeded_store().await.with_failure("connection reset"));
    let err = control
        .list_document_ids("users", None, Deadline::after(BUDGET))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ControlError::Store {
            action: StoreAction::CountDocuments,
            ..
        }
    ));
}

#[tokio::test]
async fn get_document_renders_fields() {
    let control = build_control_plane().await;
    let id = oid(2).to_hex();
    let view = control
        .get_document("users", &id, Deadline::after(BUDGET))
        .await
        .expect("document should load");

    assert_eq!(view.database_name, "example");
    assert_eq!(view.collection_name, "users");
    assert_eq!(view.id.to_hex(), id);
    assert!(view.document.contains("\"name\": \"grace\""));
    assert!(view.document.contains("\"age\": 20"));
    assert!(view.document.contains(&format!("\"_id\": \"{id}\"")));
}

#[tokio::test]
async fn get_document_is_byte_stable() {
    let control = build_control_plane().await;
    let id = oid(1).to_hex();
    let first = control
        .get_document("users", &id, Deadline::after(BUDGET))
        .await
        .unwrap();
    let second = control
        .get_document("users", &id, Deadline::after(BUDGET))
        .await
        .unwrap();

    assert_eq!(first.document.as_bytes(), second.document.as_bytes());
}

#[tokio::test]
async fn get_document_validates_inputs() {
    let control = build_control_plane().await;
    let deadline = Deadline::after(BUDGET);
    let valid = oid(1).to_hex();

    let cases = [
        ("", valid.as_str(), "missing collection query parameter"),
        ("users", "", "missing id query parameter"),
        ("users", "not-an-id", "invalid object ID"),
        ("users", "0123456789abcdef0123456", "invalid object ID"),
    ];
    for (collection, id, expected) in cases {
        let err = control.get_document(collection, id, deadline).await.unwrap_err();
        assert!(
            matches!(&err, ControlError::Validation(message) if message == expected),
            "unexpected error for ({collection:?}, {id:?}): {err}"
        );
    }
}

#[tokio::test]
async fn missing_document_is_store_error() {
    let control = build_control_plane().await;
    let err = control
        .get_document("users", "ffffffffffffffffffffffff", Deadline::after(BUDGET))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ControlError::Store {
            action: StoreAction::DecodeDocument,
            source: StoreError::NotFound { .. },
        }
    ));
}

#[tokio::test]
async fn expired_deadline_times_out_without_querying() {
    let store = seeded_store().await;
    let control = BrowseControlPlane::new(store.clone());
    let expired = Deadline::after(Duration::ZERO);

    assert!(matches!(
        control.list_collections(expired).await,
        Err(ControlError::Timeout)
    ));
    assert!(matches!(
        control.list_document_ids("users", None, expired).await,
        Err(ControlError::Timeout)
    ));
    assert!(matches!(
        control.get_document("users", &oid(1).to_hex(), expired).await,
        Err(ControlError::Timeout)
    ));
    assert_eq!(store.query_count(), 0);
}

#[tokio::test]
async fn slow_store_times_out() {
    let store = seeded_store().await.with_latency(Duration::from_millis(500));
    let control = BrowseControlPlane::new(store);

    let err = control
        .list_collections(Deadline::after(Duration::from_millis(20)))
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::Timeout));
}

#[tokio::test]
async fn null_id_is_unsupported() {
    let store = MemoryDocStore::new("example");
    store.insert_document("odd", doc! { "name": "no id" }).await;
    let control = BrowseControlPlane::new(store);

    let err = control
        .list_document_ids("odd", None, Deadline::after(BUDGET))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "failed to query documents: {}",
            StoreError::UnsupportedIdType("null".to_string())
        )
    );
}
