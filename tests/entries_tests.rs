mod common;

use chrono::NaiveDate;

use animeshelf::models::{AnimeImages, AnimeMetadata, Tracking, ValidationError, WatchStatus};
use animeshelf::presentation::{AddEntryForm, AnimeListView, Messages, ViewState};
use animeshelf::repository::RepositoryError;
use common::{Harness, snapshot};

fn tracking() -> Tracking {
    Tracking {
        status: WatchStatus::Watching,
        progress: 12,
        score: 9,
        started_at: NaiveDate::from_ymd_opt(2024, 1, 5),
        finished_at: None,
        notes: "rewatching the Mars arc".to_string(),
    }
}

#[tokio::test]
async fn test_add_then_list_returns_same_fields() {
    let app = Harness::new().await;
    app.sign_up("ana@example.com", "Ana").await;
    let collection = app.collections.create("Classics", "", &[]).await.unwrap();

    let added = app
        .lists
        .add(collection.id, snapshot(1, "Cowboy Bebop"), tracking())
        .await
        .unwrap();
    assert_eq!(added.collection_id, collection.id);

    let listed = app.lists.list_by_collection(&collection.id).await.unwrap();
    assert_eq!(listed, vec![added]);

    let entry = &listed[0];
    assert_eq!(entry.anime, snapshot(1, "Cowboy Bebop"));
    assert_eq!(entry.tracking, tracking());
    assert_eq!(entry.progress_label(), "12 / 26");
}

#[tokio::test]
async fn test_entries_keep_insertion_order() {
    let app = Harness::new().await;
    app.sign_up("ana@example.com", "Ana").await;
    let collection = app.collections.create("Queue", "", &[]).await.unwrap();

    for (id, title) in [(5114, "Fullmetal Alchemist: Brotherhood"), (1, "Cowboy Bebop"), (30, "Evangelion")] {
        app.lists
            .add(collection.id, snapshot(id, title), Tracking::default())
            .await
            .unwrap();
    }

    let titles: Vec<String> = app
        .lists
        .list_by_collection(&collection.id)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.anime.title)
        .collect();
    assert_eq!(
        titles,
        vec!["Fullmetal Alchemist: Brotherhood", "Cowboy Bebop", "Evangelion"]
    );
}

#[tokio::test]
async fn test_foreign_collection_is_forbidden() {
    let owner = Harness::new().await;
    owner.sign_up("ana@example.com", "Ana").await;
    let collection = owner.collections.create("Private", "", &[]).await.unwrap();
    owner
        .lists
        .add(collection.id, snapshot(1, "Cowboy Bebop"), tracking())
        .await
        .unwrap();

    let other = Harness::on(owner.store.clone()).await;
    other.sign_up("ben@example.com", "Ben").await;

    let err = other
        .lists
        .add(collection.id, snapshot(21, "One Piece"), Tracking::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Forbidden(_)), "got {err:?}");

    assert!(
        other
            .lists
            .list_by_collection(&collection.id)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        owner.lists.list_by_collection(&collection.id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_score_out_of_range() {
    let app = Harness::new().await;
    app.sign_up("ana@example.com", "Ana").await;
    let collection = app.collections.create("Classics", "", &[]).await.unwrap();

    let mut bad = tracking();
    bad.score = 11;
    let err = app
        .lists
        .add(collection.id, snapshot(1, "Cowboy Bebop"), bad)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RepositoryError::ValidationFailed(ValidationError::ScoreOutOfRange(11))
    );
    assert!(app.lists.list_by_collection(&collection.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_signed_out_list_is_rejected() {
    let app = Harness::new().await;
    app.sign_up("ana@example.com", "Ana").await;
    let collection = app.collections.create("Classics", "", &[]).await.unwrap();
    app.session.sign_out().await.unwrap();

    assert_eq!(
        app.lists.list_by_collection(&collection.id).await.unwrap_err(),
        RepositoryError::NotAuthenticated
    );
    assert_eq!(
        app.lists
            .add(collection.id, snapshot(1, "Cowboy Bebop"), tracking())
            .await
            .unwrap_err(),
        RepositoryError::NotAuthenticated
    );
}

#[tokio::test]
async fn test_status_edits_stay_local_until_reload() {
    let app = Harness::new().await;
    app.sign_up("ana@example.com", "Ana").await;
    let collection = app.collections.create("Queue", "", &[]).await.unwrap();
    app.lists
        .add(collection.id, snapshot(1, "Cowboy Bebop"), tracking())
        .await
        .unwrap();

    let mut view = AnimeListView::new(app.lists.clone(), Messages::default());
    view.load(collection.id).await;

    assert!(view.change_status(0, WatchStatus::Completed));
    assert!(!view.change_status(7, WatchStatus::Completed));
    assert!(view.is_unsaved(0));
    assert_eq!(view.visible()[0].1.tracking.status, WatchStatus::Completed);

    view.load(collection.id).await;
    assert!(!view.has_unsaved_changes());
    assert_eq!(view.visible()[0].1.tracking.status, WatchStatus::Watching);

    view.set_filter("nothing");
    assert!(view.visible().is_empty());
}

fn bebop() -> AnimeMetadata {
    let anime = snapshot(1, "Cowboy Bebop");
    AnimeMetadata {
        mal_id: anime.mal_id,
        url: anime.url,
        title: anime.title,
        images: AnimeImages::default(),
        anime_type: anime.anime_type,
        episodes: anime.episodes,
        status: None,
        airing: false,
        score: Some(8.75),
        synopsis: anime.synopsis,
        season: anime.season,
        year: anime.year,
        genres: anime.genres,
    }
}

#[tokio::test]
async fn test_add_form_tracks_submit_outcome() {
    let app = Harness::new().await;
    app.sign_up("ana@example.com", "Ana").await;
    let collection = app.collections.create("Classics", "", &[]).await.unwrap();

    let mut form = AddEntryForm::new(bebop());
    assert_eq!(form.state, ViewState::Idle);

    form.submit(&app.lists, Messages::default()).await.unwrap_err();
    assert_eq!(
        form.state.error(),
        Some(Messages::default().validation(&ValidationError::CollectionNotSelected).as_str())
    );

    form.collection_id = Some(collection.id);
    let entry = form.submit(&app.lists, Messages::default()).await.unwrap();
    assert_eq!(form.state.value(), Some(&entry));

    app.session.sign_out().await.unwrap();
    let err = form.submit(&app.lists, Messages::default()).await.unwrap_err();
    assert_eq!(err, RepositoryError::NotAuthenticated);
    assert!(form.state.error().is_some());
}
