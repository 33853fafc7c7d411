mod common;

use common::seed_user;
use uuid::Uuid;

use nook_api::error::ApiError;
use nook_api::notes;
use nook_db::Database;
use nook_types::api::{CreateNoteRequest, NotePatch};
use nook_types::models::{NoteVisibility, Role};

fn note_req(title: &str, visibility: NoteVisibility) -> CreateNoteRequest {
    CreateNoteRequest {
        title: title.to_string(),
        content: "some content".to_string(),
        visibility,
        shared_with_emails: None,
    }
}

#[test]
fn shared_note_resolves_emails_and_reaches_collaborators_only() {
    let db = Database::open_in_memory().unwrap();
    let alice = seed_user(&db, "alice@example.com", Role::User);
    let bob = seed_user(&db, "bob@example.com", Role::User);
    let carol = seed_user(&db, "carol@example.com", Role::User);

    let req = CreateNoteRequest {
        shared_with_emails: Some(vec!["bob@example.com".to_string()]),
        ..note_req("rollout plan", NoteVisibility::Shared)
    };
    let note = notes::create(&db, &alice, req).unwrap();
    assert_eq!(note.shared_with, vec![bob.id]);
    assert_eq!(note.owner_id, alice.id);

    // Bob sees it, Carol cannot tell it exists.
    assert_eq!(notes::get(&db, &bob, note.id).unwrap().id, note.id);
    assert!(matches!(
        notes::get(&db, &carol, note.id),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn unresolvable_email_rejects_the_whole_create() {
    let db = Database::open_in_memory().unwrap();
    let alice = seed_user(&db, "alice@example.com", Role::User);
    seed_user(&db, "bob@example.com", Role::User);

    let req = CreateNoteRequest {
        shared_with_emails: Some(vec![
            "bob@example.com".to_string(),
            "ghost@example.com".to_string(),
        ]),
        ..note_req("never lands", NoteVisibility::Shared)
    };
    assert!(matches!(
        notes::create(&db, &alice, req),
        Err(ApiError::BadRequest(_))
    ));
    assert!(notes::list(&db, &alice).unwrap().is_empty());
}

#[test]
fn shared_visibility_requires_an_email_list() {
    let db = Database::open_in_memory().unwrap();
    let alice = seed_user(&db, "alice@example.com", Role::User);

    assert!(matches!(
        notes::create(&db, &alice, note_req("no list", NoteVisibility::Shared)),
        Err(ApiError::BadRequest(_))
    ));

    let req = CreateNoteRequest {
        shared_with_emails: Some(vec![]),
        ..note_req("empty list", NoteVisibility::Shared)
    };
    assert!(matches!(
        notes::create(&db, &alice, req),
        Err(ApiError::BadRequest(_))
    ));
}

#[test]
fn private_notes_never_leak_into_other_listings() {
    let db = Database::open_in_memory().unwrap();
    let alice = seed_user(&db, "alice@example.com", Role::User);
    let bob = seed_user(&db, "bob@example.com", Role::User);

    let note = notes::create(&db, &alice, note_req("diary", NoteVisibility::Private)).unwrap();

    assert!(notes::list(&db, &bob).unwrap().is_empty());
    assert!(matches!(
        notes::get(&db, &bob, note.id),
        Err(ApiError::NotFound(_))
    ));

    let mine = notes::list(&db, &alice).unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, note.id);
}

#[test]
fn public_notes_are_visible_to_every_user() {
    let db = Database::open_in_memory().unwrap();
    let alice = seed_user(&db, "alice@example.com", Role::User);
    let bob = seed_user(&db, "bob@example.com", Role::User);

    let note = notes::create(&db, &alice, note_req("announcement", NoteVisibility::Public)).unwrap();

    let bobs = notes::list(&db, &bob).unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].id, note.id);
    assert_eq!(notes::get(&db, &bob, note.id).unwrap().title, "announcement");
}

#[test]
fn note_mutation_has_no_admin_bypass() {
    let db = Database::open_in_memory().unwrap();
    let admin = seed_user(&db, "admin@example.com", Role::Admin);
    let alice = seed_user(&db, "alice@example.com", Role::User);

    let note = notes::create(&db, &alice, note_req("owner only", NoteVisibility::Public)).unwrap();

    let patch = NotePatch {
        title: Some("admin was here".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        notes::update(&db, &admin, note.id, patch),
        Err(ApiError::Forbidden(_))
    ));
    assert!(matches!(
        notes::delete(&db, &admin, note.id),
        Err(ApiError::Forbidden(_))
    ));

    let after = notes::get(&db, &alice, note.id).unwrap();
    assert_eq!(after.title, "owner only");
    assert_eq!(after.updated_at, None);
}

#[test]
fn update_to_shared_requires_fully_resolvable_emails() {
    let db = Database::open_in_memory().unwrap();
    let alice = seed_user(&db, "alice@example.com", Role::User);

    let note = notes::create(&db, &alice, note_req("stays private", NoteVisibility::Private)).unwrap();

    let patch = NotePatch {
        visibility: Some(NoteVisibility::Shared),
        shared_with_emails: Some(vec!["ghost@example.com".to_string()]),
        ..Default::default()
    };
    assert!(matches!(
        notes::update(&db, &alice, note.id, patch),
        Err(ApiError::BadRequest(_))
    ));

    // Nothing was modified, not even the stamps.
    let after = notes::get(&db, &alice, note.id).unwrap();
    assert_eq!(after.visibility, NoteVisibility::Private);
    assert_eq!(after.updated_at, None);

    let missing_list = NotePatch {
        visibility: Some(NoteVisibility::Shared),
        ..Default::default()
    };
    assert!(matches!(
        notes::update(&db, &alice, note.id, missing_list),
        Err(ApiError::BadRequest(_))
    ));
}

#[test]
fn resharing_replaces_the_collaborator_set() {
    let db = Database::open_in_memory().unwrap();
    let alice = seed_user(&db, "alice@example.com", Role::User);
    let bob = seed_user(&db, "bob@example.com", Role::User);
    let carol = seed_user(&db, "carol@example.com", Role::User);

    let req = CreateNoteRequest {
        shared_with_emails: Some(vec!["bob@example.com".to_string()]),
        ..note_req("handover", NoteVisibility::Shared)
    };
    let note = notes::create(&db, &alice, req).unwrap();
    assert_eq!(note.shared_with, vec![bob.id]);

    let patch = NotePatch {
        visibility: Some(NoteVisibility::Shared),
        shared_with_emails: Some(vec!["carol@example.com".to_string()]),
        ..Default::default()
    };
    notes::update(&db, &alice, note.id, patch).unwrap();

    let after = notes::get(&db, &alice, note.id).unwrap();
    assert_eq!(after.shared_with, vec![carol.id]);
    assert!(matches!(
        notes::get(&db, &bob, note.id),
        Err(ApiError::NotFound(_))
    ));
    assert_eq!(notes::get(&db, &carol, note.id).unwrap().id, note.id);
}

#[test]
fn leaving_shared_visibility_clears_the_collaborator_set() {
    let db = Database::open_in_memory().unwrap();
    let alice = seed_user(&db, "alice@example.com", Role::User);
    let bob = seed_user(&db, "bob@example.com", Role::User);

    let req = CreateNoteRequest {
        shared_with_emails: Some(vec!["bob@example.com".to_string()]),
        ..note_req("soon private", NoteVisibility::Shared)
    };
    let note = notes::create(&db, &alice, req).unwrap();
    assert_eq!(note.shared_with, vec![bob.id]);

    let patch = NotePatch {
        visibility: Some(NoteVisibility::Private),
        ..Default::default()
    };
    notes::update(&db, &alice, note.id, patch).unwrap();

    let after = notes::get(&db, &alice, note.id).unwrap();
    assert_eq!(after.visibility, NoteVisibility::Private);
    assert!(after.shared_with.is_empty());
    assert!(matches!(
        notes::get(&db, &bob, note.id),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn empty_patch_is_a_noop() {
    let db = Database::open_in_memory().unwrap();
    let alice = seed_user(&db, "alice@example.com", Role::User);

    let note = notes::create(&db, &alice, note_req("still", NoteVisibility::Private)).unwrap();
    notes::update(&db, &alice, note.id, NotePatch::default()).unwrap();

    let after = notes::get(&db, &alice, note.id).unwrap();
    assert_eq!(after.updated_at, None);
    assert_eq!(after.updated_by, None);
    assert_eq!(after.title, note.title);
    assert_eq!(after.created_at, note.created_at);
}

#[test]
fn partial_update_leaves_remaining_fields_alone() {
    let db = Database::open_in_memory().unwrap();
    let alice = seed_user(&db, "alice@example.com", Role::User);

    let note = notes::create(&db, &alice, note_req("original", NoteVisibility::Private)).unwrap();

    let patch = NotePatch {
        title: Some("renamed".to_string()),
        ..Default::default()
    };
    notes::update(&db, &alice, note.id, patch).unwrap();

    let after = notes::get(&db, &alice, note.id).unwrap();
    assert_eq!(after.title, "renamed");
    assert_eq!(after.content, note.content);
    assert_eq!(after.visibility, note.visibility);
    assert_eq!(after.created_at, note.created_at);
    assert!(after.updated_at.is_some());
    assert_eq!(after.updated_by, Some(alice.id));
}

#[test]
fn delete_is_owner_only_and_not_repeatable() {
    let db = Database::open_in_memory().unwrap();
    let alice = seed_user(&db, "alice@example.com", Role::User);
    let bob = seed_user(&db, "bob@example.com", Role::User);

    let note = notes::create(&db, &alice, note_req("short lived", NoteVisibility::Public)).unwrap();

    assert!(matches!(
        notes::delete(&db, &bob, note.id),
        Err(ApiError::Forbidden(_))
    ));

    notes::delete(&db, &alice, note.id).unwrap();
    assert!(matches!(
        notes::delete(&db, &alice, note.id),
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        notes::update(&db, &alice, note.id, NotePatch::default()),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn unknown_note_reads_as_not_found() {
    let db = Database::open_in_memory().unwrap();
    let alice = seed_user(&db, "alice@example.com", Role::User);

    assert!(matches!(
        notes::get(&db, &alice, Uuid::new_v4()),
        Err(ApiError::NotFound(_))
    ));
}
