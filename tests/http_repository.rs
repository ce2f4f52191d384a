mod common;

use assert_matches::assert_matches;
use common::FakeBackend;
use quicknote::api::{NoteDraft, NoteId, NotePatch, NoteRepository, RepositoryError};
use quicknote::config::ApiOptions;
use quicknote::search::{ListQuery, SortDirection, SortField, SortSpec};
use quicknote::HttpNoteRepository;

#[tokio::test]
async fn list_returns_notes_in_backend_order() -> anyhow::Result<()> {
    let backend = FakeBackend::start().await;
    backend.seed("first", "", "").await;
    backend.seed("second", "", "").await;
    let repo = backend.repository();

    let newest_first = repo.list(&ListQuery::default()).await?;
    let titles: Vec<_> = newest_first.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["second", "first"]);

    let oldest_first = repo
        .list(&ListQuery::new(
            "",
            SortSpec::new(SortField::Created, SortDirection::Ascending),
        ))
        .await?;
    let titles: Vec<_> = oldest_first.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second"]);

    let requests = backend.list_requests().await;
    assert_eq!(requests[0].sort.as_deref(), Some("-updated_at"));
    assert_eq!(requests[1].sort.as_deref(), Some("created_at"));
    Ok(())
}

#[tokio::test]
async fn search_term_is_encoded_and_forwarded() -> anyhow::Result<()> {
    let backend = FakeBackend::start().await;
    backend.seed("Café & tea", "", "drinks").await;
    backend.seed("Shopping", "milk", "home").await;
    let repo = backend.repository();

    let hits = repo
        .list(&ListQuery::new("café &", SortSpec::default()))
        .await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Café & tea");
    assert_eq!(hits[0].tags_list, vec!["drinks"]);

    let requests = backend.list_requests().await;
    assert_eq!(requests[0].search.as_deref(), Some("café &"));
    Ok(())
}

#[tokio::test]
async fn create_returns_persisted_note() -> anyhow::Result<()> {
    let backend = FakeBackend::start().await;
    let repo = backend.repository();

    let note = repo
        .create(&NoteDraft::new("Plan", "# Q3", "work, planning"))
        .await?;
    assert_eq!(note.id, Some(NoteId::from(1)));
    assert!(note.updated_at.is_some());
    assert_eq!(note.display_tags(), vec!["work", "planning"]);
    assert_eq!(backend.notes().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn rejected_payload_is_a_validation_error() {
    let backend = FakeBackend::start().await;
    let repo = backend.repository();

    let err = repo
        .create(&NoteDraft::new(" ", "", ""))
        .await
        .expect_err("blank title must be rejected");
    assert_matches!(
        err,
        RepositoryError::Validation(ref fields)
            if fields.field("title") == Some(&["This field may not be blank.".to_string()][..])
    );
    assert!(backend.notes().await.is_empty());
}

#[tokio::test]
async fn get_update_and_patch_round_trip() -> anyhow::Result<()> {
    let backend = FakeBackend::start().await;
    let seeded = backend.seed("Draft", "body", "a").await;
    let id = seeded.id.clone().expect("id");
    let repo = backend.repository();

    assert_eq!(repo.get(&id).await?.title, "Draft");

    let updated = repo
        .update(&id, &NoteDraft::new("Final", "new body", ""))
        .await?;
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.text, "new body");
    assert!(updated.tags_list.is_empty());
    assert_ne!(updated.updated_at, seeded.updated_at);

    let patched = repo
        .patch(
            &id,
            &NotePatch {
                tags: Some("x, y".into()),
                ..NotePatch::default()
            },
        )
        .await?;
    assert_eq!(patched.title, "Final");
    assert_eq!(patched.tags_list, vec!["x", "y"]);
    Ok(())
}

#[tokio::test]
async fn missing_notes_are_not_found() {
    let backend = FakeBackend::start().await;
    let repo = backend.repository();
    let ghost = NoteId::from(404);

    assert_matches!(repo.get(&ghost).await, Err(RepositoryError::NotFound { .. }));
    assert_matches!(
        repo.update(&ghost, &NoteDraft::new("x", "", "")).await,
        Err(RepositoryError::NotFound { .. })
    );
    assert_matches!(repo.delete(&ghost).await, Err(err) if err.is_not_found());
}

#[tokio::test]
async fn delete_removes_the_note() -> anyhow::Result<()> {
    let backend = FakeBackend::start().await;
    let note = backend.seed("bye", "", "").await;
    let repo = backend.repository();

    repo.delete(note.id.as_ref().expect("id")).await?;
    assert!(backend.notes().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn failing_backend_is_a_server_error() {
    let backend = FakeBackend::start().await;
    backend.set_failing(true).await;
    let repo = backend.repository();

    assert_matches!(
        repo.list(&ListQuery::default()).await,
        Err(RepositoryError::Server { status: 500, message }) if message == "boom"
    );
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let repo = HttpNoteRepository::new(&ApiOptions {
        base_url: format!("http://{addr}/api"),
        timeout_secs: 2,
    })?;
    assert_matches!(
        repo.list(&ListQuery::default()).await,
        Err(RepositoryError::Network(_))
    );
    Ok(())
}
