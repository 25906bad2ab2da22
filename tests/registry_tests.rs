use std::collections::HashSet;
use std::sync::{Arc, Barrier};

use file_keeper::storage::models::{DisplayHints, FileType, NewFile};
use file_keeper::storage::{Database, RegistryError};

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn hints(username: &str) -> DisplayHints {
    DisplayHints {
        username: Some(username.to_string()),
        first_name: Some("Test".to_string()),
        last_name: None,
    }
}

fn upload(storage_ref: &str) -> NewFile {
    NewFile {
        name: Some(format!("{storage_ref}.pdf")),
        mime_type: Some("application/pdf".to_string()),
        byte_size: Some(1024),
        storage_ref: storage_ref.to_string(),
    }
}

/// Create a user and a file for it in one committed unit of work.
fn seed_file(db: &Database, external_id: i64, storage_ref: &str) -> String {
    db.transaction(|s| {
        let user = s.resolve_user(external_id, &DisplayHints::default())?;
        let category = s.get_current_category(user.id)?;
        s.create_file(user.id, category.id, upload(storage_ref))
    })
    .unwrap()
    .public_id
}

// ============================================================================
// Identity resolution
// ============================================================================

#[test]
fn test_resolve_user_is_idempotent() {
    let (_dir, db) = test_db();

    let first = db.transaction(|s| s.resolve_user(1001, &hints("alice"))).unwrap();
    let second = db.transaction(|s| s.resolve_user(1001, &hints("alice"))).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.external_id, 1001);
    assert_eq!(second.username, Some("alice".to_string()));
}

#[test]
fn test_resolve_user_distinct_identities() {
    let (_dir, db) = test_db();

    let a = db.transaction(|s| s.resolve_user(1, &hints("a"))).unwrap();
    let b = db.transaction(|s| s.resolve_user(2, &hints("b"))).unwrap();
    assert_ne!(a.id, b.id);
}

#[test]
fn test_resolve_user_does_not_refresh_hints() {
    let (_dir, db) = test_db();

    db.transaction(|s| s.resolve_user(5, &hints("old-name"))).unwrap();
    let user = db.transaction(|s| s.resolve_user(5, &hints("new-name"))).unwrap();
    assert_eq!(user.username, Some("old-name".to_string()));
}

#[test]
fn test_resolve_user_concurrently_creates_one_row() {
    let (_dir, db) = test_db();
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let db = db.clone();
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                db.transaction(|s| s.resolve_user(777, &DisplayHints::default()))
                    .unwrap()
                    .id
            })
        })
        .collect();

    let ids: HashSet<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids.len(), 1);
}

// ============================================================================
// Category resolution
// ============================================================================

#[test]
fn test_resolve_category_case_insensitive() {
    let (_dir, db) = test_db();

    let upper = db.transaction(|s| s.resolve_category("Work")).unwrap();
    let lower = db.transaction(|s| s.resolve_category("work")).unwrap();
    let shouting = db.transaction(|s| s.resolve_category("WORK")).unwrap();

    assert_eq!(upper.id, lower.id);
    assert_eq!(upper.id, shouting.id);
    // first caller's casing is kept
    assert_eq!(lower.name, "Work");
}

#[test]
fn test_resolve_category_validates_length() {
    let (_dir, db) = test_db();

    let err = db.transaction(|s| s.resolve_category("ab")).unwrap_err();
    assert!(matches!(err, RegistryError::Validation(_)));

    let err = db
        .transaction(|s| s.resolve_category(&"n".repeat(51)))
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation(_)));

    let ok = db.transaction(|s| s.resolve_category(&"n".repeat(50))).unwrap();
    assert_eq!(ok.name.len(), 50);
}

#[test]
fn test_default_category_is_created_once() {
    let (_dir, db) = test_db();

    let first = db.transaction(|s| s.get_default_category()).unwrap();
    let second = db.transaction(|s| s.get_default_category()).unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.name, "General");

    let by_name = db.transaction(|s| s.resolve_category("general")).unwrap();
    assert_eq!(by_name.id, first.id);
}

#[test]
fn test_concurrent_resolve_category_differing_case() {
    let (_dir, db) = test_db();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["Work", "work"]
        .into_iter()
        .map(|name| {
            let db = db.clone();
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                db.transaction(|s| s.resolve_category(name)).unwrap().id
            })
        })
        .collect();

    let ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids[0], ids[1]);

    let row = db
        .transaction(|s| Ok(s.find_category_by_name("WoRk")?))
        .unwrap()
        .expect("category should exist");
    assert_eq!(row.id, ids[0]);

    // a brand-new category takes the next id, so no duplicate row was issued
    let next = db.transaction(|s| s.resolve_category("Other")).unwrap();
    assert_eq!(next.id, ids[0] + 1);
}

// ============================================================================
// Current category
// ============================================================================

#[test]
fn test_current_category_defaults_and_persists() {
    let (_dir, db) = test_db();

    let user = db.transaction(|s| s.resolve_user(10, &hints("u"))).unwrap();
    assert_eq!(user.current_category_id, None);

    let current = db.transaction(|s| s.get_current_category(user.id)).unwrap();
    assert_eq!(current.name, "General");

    // independent read sees the stored pointer
    let stored = db.transaction(|s| s.get_user(user.id)).unwrap();
    assert_eq!(stored.current_category_id, Some(current.id));
}

#[test]
fn test_set_current_category() {
    let (_dir, db) = test_db();

    let user = db.transaction(|s| s.resolve_user(11, &hints("u"))).unwrap();
    let photos = db.transaction(|s| s.resolve_category("Photos")).unwrap();

    db.transaction(|s| s.set_current_category(user.id, Some(photos.id)))
        .unwrap();
    let current = db.transaction(|s| s.get_current_category(user.id)).unwrap();
    assert_eq!(current.id, photos.id);

    db.transaction(|s| s.set_current_category(user.id, None)).unwrap();
    let stored = db.transaction(|s| s.get_user(user.id)).unwrap();
    assert_eq!(stored.current_category_id, None);

    let current = db.transaction(|s| s.get_current_category(user.id)).unwrap();
    assert_eq!(current.name, "General");
}

#[test]
fn test_set_current_category_unknown_ids() {
    let (_dir, db) = test_db();
    let user = db.transaction(|s| s.resolve_user(12, &hints("u"))).unwrap();

    let err = db
        .transaction(|s| s.set_current_category(user.id, Some(404)))
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));

    let err = db
        .transaction(|s| s.set_current_category(9999, None))
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));
}

// ============================================================================
// File registry
// ============================================================================

#[test]
fn test_create_file_records_metadata() {
    let (_dir, db) = test_db();

    let file = db
        .transaction(|s| {
            let user = s.resolve_user(20, &hints("u"))?;
            let category = s.get_current_category(user.id)?;
            s.create_file(user.id, category.id, upload("tg-abc"))
        })
        .unwrap();

    assert_eq!(file.name, "tg-abc.pdf");
    assert_eq!(file.mime_type, "application/pdf");
    assert_eq!(file.file_type, FileType::Document);
    assert_eq!(file.byte_size, Some(1024));
    assert_eq!(file.storage_ref, "tg-abc");
    assert_eq!(file.public_id.len(), 8);

    let fetched = db.transaction(|s| s.get_by_public_id(&file.public_id)).unwrap();
    assert_eq!(fetched, file);
}

#[test]
fn test_create_file_blank_name_gets_placeholder() {
    let (_dir, db) = test_db();

    let file = db
        .transaction(|s| {
            let user = s.resolve_user(21, &hints("u"))?;
            let category = s.get_default_category()?;
            s.create_file(
                user.id,
                category.id,
                NewFile {
                    name: Some("   ".to_string()),
                    mime_type: None,
                    byte_size: None,
                    storage_ref: "tg-photo".to_string(),
                },
            )
        })
        .unwrap();

    assert_eq!(file.name, "Unnamed File");
    assert_eq!(file.mime_type, "unknown/type");
    assert_eq!(file.file_type, FileType::Binary);
    assert_eq!(file.byte_size, None);
}

#[test]
fn test_create_file_requires_storage_ref() {
    let (_dir, db) = test_db();

    let err = db
        .transaction(|s| {
            let user = s.resolve_user(22, &hints("u"))?;
            let category = s.get_default_category()?;
            s.create_file(user.id, category.id, upload(" "))
        })
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation(_)));
}

#[test]
fn test_create_file_unknown_owner_or_category() {
    let (_dir, db) = test_db();

    let err = db
        .transaction(|s| {
            let category = s.get_default_category()?;
            s.create_file(999, category.id, upload("r"))
        })
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));

    let err = db
        .transaction(|s| {
            let user = s.resolve_user(23, &hints("u"))?;
            s.create_file(user.id, 999, upload("r"))
        })
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));
}

#[test]
fn test_failed_unit_of_work_leaves_no_rows() {
    let (_dir, db) = test_db();

    let mut public_id = String::new();
    let err = db
        .transaction(|s| {
            let user = s.resolve_user(24, &hints("u"))?;
            let category = s.get_current_category(user.id)?;
            public_id = s.create_file(user.id, category.id, upload("r"))?.public_id;
            Err::<(), _>(RegistryError::validation("presentation layer failed"))
        })
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation(_)));

    let lookup = db.transaction(|s| s.get_by_public_id(&public_id));
    assert!(matches!(lookup, Err(RegistryError::NotFound(_))));

    let user = db.transaction(|s| Ok(s.find_user_by_external_id(24)?)).unwrap();
    assert!(user.is_none());
}

#[test]
fn test_public_ids_are_unique() {
    let (_dir, db) = test_db();

    let public_ids: Vec<String> = db
        .transaction(|s| {
            let user = s.resolve_user(30, &hints("bulk"))?;
            let category = s.get_default_category()?;
            (0..10_000)
                .map(|i| {
                    s.create_file(user.id, category.id, upload(&format!("ref-{i}")))
                        .map(|f| f.public_id)
                })
                .collect()
        })
        .unwrap();

    let distinct: HashSet<&String> = public_ids.iter().collect();
    assert_eq!(distinct.len(), 10_000);
}

#[test]
fn test_list_files_pagination() {
    let (_dir, db) = test_db();

    let user = db.transaction(|s| s.resolve_user(40, &hints("u"))).unwrap();
    for i in 0..25 {
        seed_file(&db, 40, &format!("ref-{i}"));
    }

    let page1 = db.transaction(|s| s.list_files(user.id, 1, 10)).unwrap();
    assert_eq!(page1.items.len(), 10);
    assert_eq!(page1.total, 25);
    assert_eq!(page1.total_pages(), 3);
    assert_eq!(page1.items[0].storage_ref, "ref-24");

    let page3 = db.transaction(|s| s.list_files(user.id, 3, 10)).unwrap();
    assert_eq!(page3.items.len(), 5);
    assert_eq!(page3.items[4].storage_ref, "ref-0");

    let page4 = db.transaction(|s| s.list_files(user.id, 4, 10)).unwrap();
    assert!(page4.items.is_empty());
    assert_eq!(page4.total, 25);
}

#[test]
fn test_list_files_newest_first_with_id_tiebreak() {
    let (_dir, db) = test_db();

    let user = db.transaction(|s| s.resolve_user(41, &hints("u"))).unwrap();
    for i in 0..5 {
        seed_file(&db, 41, &format!("ref-{i}"));
    }

    let page = db.transaction(|s| s.list_files(user.id, 1, 10)).unwrap();
    let ordered = page.items.windows(2).all(|pair| {
        (pair[0].created_at, pair[0].id) > (pair[1].created_at, pair[1].id)
    });
    assert!(ordered);
}

#[test]
fn test_list_files_huge_page_size_is_bounded_by_rows() {
    let (_dir, db) = test_db();

    let user = db.transaction(|s| s.resolve_user(42, &hints("u"))).unwrap();
    for i in 0..3 {
        seed_file(&db, 42, &format!("ref-{i}"));
    }

    let all = db.transaction(|s| s.list_files(user.id, 1, u32::MAX)).unwrap();
    assert_eq!(all.items.len(), 3);
    assert_eq!(all.total, 3);

    let past_end = db
        .transaction(|s| s.list_files(user.id, u32::MAX, u32::MAX))
        .unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total, 3);
}

#[test]
fn test_list_files_scoped_to_owner() {
    let (_dir, db) = test_db();

    seed_file(&db, 50, "mine");
    seed_file(&db, 51, "theirs");

    let user = db.transaction(|s| s.resolve_user(50, &hints("u"))).unwrap();
    let page = db.transaction(|s| s.list_files(user.id, 1, 10)).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].storage_ref, "mine");
}

#[test]
fn test_list_files_rejects_zero_page_or_size() {
    let (_dir, db) = test_db();
    let user = db.transaction(|s| s.resolve_user(52, &hints("u"))).unwrap();

    assert!(matches!(
        db.transaction(|s| s.list_files(user.id, 0, 10)),
        Err(RegistryError::Validation(_))
    ));
    assert!(matches!(
        db.transaction(|s| s.list_files(user.id, 1, 0)),
        Err(RegistryError::Validation(_))
    ));
}

#[test]
fn test_resolve_for_owner() {
    let (_dir, db) = test_db();

    let public_id = seed_file(&db, 60, "owned");

    let file = db.transaction(|s| s.resolve_for_owner(&public_id, 60)).unwrap();
    assert_eq!(file.storage_ref, "owned");

    let denied = db.transaction(|s| s.resolve_for_owner(&public_id, 61));
    assert!(matches!(denied, Err(RegistryError::PermissionDenied)));

    let missing = db.transaction(|s| s.resolve_for_owner("nosuchid", 60));
    assert!(matches!(missing, Err(RegistryError::NotFound(_))));
}

// ============================================================================
// Supplementary queries
// ============================================================================

#[test]
fn test_list_user_categories_only_shows_own_files() {
    let (_dir, db) = test_db();

    let (alice, bob) = db
        .transaction(|s| {
            let alice = s.resolve_user(70, &hints("alice"))?;
            let bob = s.resolve_user(71, &hints("bob"))?;
            let work = s.resolve_category("work stuff")?;
            let art = s.resolve_category("Art")?;
            s.create_file(alice.id, work.id, upload("a1"))?;
            s.create_file(alice.id, art.id, upload("a2"))?;
            s.create_file(alice.id, art.id, upload("a3"))?;
            s.resolve_category("Empty")?;
            Ok((alice, bob))
        })
        .unwrap();

    let names: Vec<String> = db
        .transaction(|s| s.list_user_categories(alice.id))
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Art", "work stuff"]);

    let bobs = db.transaction(|s| s.list_user_categories(bob.id)).unwrap();
    assert!(bobs.is_empty());
}

#[test]
fn test_count_files() {
    let (_dir, db) = test_db();

    seed_file(&db, 80, "a");
    seed_file(&db, 80, "b");
    let user = db.transaction(|s| s.resolve_user(80, &hints("u"))).unwrap();
    assert_eq!(db.transaction(|s| s.count_files(user.id)).unwrap(), 2);
}

#[test]
fn test_delete_user_cascades_to_files() {
    let (_dir, db) = test_db();

    let gone = seed_file(&db, 90, "gone");
    let kept = seed_file(&db, 91, "kept");
    let user = db.transaction(|s| s.resolve_user(90, &hints("u"))).unwrap();

    assert!(db.transaction(|s| s.delete_user(user.id)).unwrap());
    assert!(!db.transaction(|s| s.delete_user(user.id)).unwrap());

    assert!(matches!(
        db.transaction(|s| s.get_by_public_id(&gone)),
        Err(RegistryError::NotFound(_))
    ));
    assert!(db.transaction(|s| s.get_by_public_id(&kept)).is_ok());

    // categories outlive their referencers
    assert!(db.transaction(|s| s.get_default_category()).is_ok());

    // the identity is free again and resolves to a fresh user
    let again = db.transaction(|s| s.resolve_user(90, &hints("u"))).unwrap();
    assert_ne!(again.id, user.id);
    assert_eq!(db.transaction(|s| s.count_files(again.id)).unwrap(), 0);
}

#[test]
fn test_purge_all() {
    let (_dir, db) = test_db();

    seed_file(&db, 100, "p1");
    seed_file(&db, 101, "p2");

    let stats = db.purge_all().unwrap();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.users, 2);
    assert_eq!(stats.categories, 1);

    let user = db.transaction(|s| Ok(s.find_user_by_external_id(100)?)).unwrap();
    assert!(user.is_none());
}

#[test]
fn test_file_type_from_mime() {
    assert_eq!(FileType::from_mime("image/jpeg"), FileType::Image);
    assert_eq!(FileType::from_mime("video/mp4"), FileType::Video);
    assert_eq!(FileType::from_mime("audio/ogg"), FileType::Audio);
    assert_eq!(FileType::from_mime("application/pdf"), FileType::Document);
    assert_eq!(FileType::from_mime("text/plain"), FileType::Document);
    assert_eq!(FileType::from_mime("application/zip"), FileType::Binary);
    assert_eq!(FileType::from_mime("unknown/type"), FileType::Binary);
}
