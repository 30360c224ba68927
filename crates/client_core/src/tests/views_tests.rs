use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use super::*;
use crate::test_support::{course, lesson, two_beginner_courses, FakeCatalogApi};
use shared::domain::CourseChanges;
use tokio::{sync::Notify, time::timeout};

async fn loaded_store(api: FakeCatalogApi) -> Arc<CoursesStore> {
    let store = CoursesStore::new(
        Arc::new(api),
        LoadingService::new(),
        MessagesService::new(),
    );
    store.initial_load().await.expect("load");
    store
}

fn ids(courses: &[Course]) -> Vec<&str> {
    courses.iter().map(|course| course.id.as_str()).collect()
}

#[test]
fn extracts_course_id_from_route() {
    assert_eq!(course_id_from_route("/courses/12"), Some(CourseId::new("12")));
    assert_eq!(
        course_id_from_route("courses/angular-core/?tab=lessons"),
        Some(CourseId::new("angular-core"))
    );
    assert_eq!(course_id_from_route("/courses"), None);
    assert_eq!(course_id_from_route("/lessons/3"), None);
    assert_eq!(course_id_from_route("/courses/3/lessons"), None);
}

#[test]
fn course_card_shows_identity_category_and_details() {
    let card = render_course_card(&course("7", Category::Advanced, 1));
    assert!(card.starts_with("#7"));
    assert!(card.contains("Course 7 [ADVANCED]"));
    assert!(card.contains("All about course 7"));
}

#[tokio::test]
async fn courses_changed_fires_only_for_saved_dialogs() {
    let store = loaded_store(FakeCatalogApi::with_courses(two_beginner_courses())).await;
    let changed = Arc::new(AtomicUsize::new(0));
    let list = CoursesCardList::new(store.snapshot().to_vec()).on_courses_changed({
        let changed = Arc::clone(&changed);
        move || {
            changed.fetch_add(1, Ordering::SeqCst);
        }
    });

    let cancelled = list
        .edit_course(&CourseId::new("1"))
        .expect("session")
        .cancel();
    list.dialog_closed(&cancelled);
    assert_eq!(changed.load(Ordering::SeqCst), 0);

    let session = list.edit_course(&CourseId::new("2")).expect("session");
    let saved = session.confirm(&store).expect("confirm");
    list.dialog_closed(&saved);
    assert_eq!(changed.load(Ordering::SeqCst), 1);

    assert!(list.edit_course(&CourseId::new("99")).is_none());
}

#[tokio::test]
async fn banner_shows_each_batch_until_closed() {
    let messages = MessagesService::new();
    let mut banner = MessagesBanner::new(&messages);
    assert!(!banner.is_visible());

    messages.show_error("Could not load courses");
    let shown = banner.next_batch().await.expect("batch").to_vec();
    assert_eq!(shown, vec!["Could not load courses".to_string()]);
    assert!(banner.is_visible());

    banner.on_close();
    assert!(!banner.is_visible());
    assert_eq!(banner.errors(), ["Could not load courses".to_string()]);

    messages.show_error("Could not save course");
    banner.next_batch().await.expect("second batch");
    assert!(banner.is_visible());
}

#[tokio::test]
async fn loading_indicator_follows_the_busy_flag() {
    let loading = LoadingService::new();
    let mut indicator = LoadingIndicator::new(&loading);
    assert!(!indicator.is_visible());

    loading.loading_on();
    assert_eq!(indicator.changed().await, Some(true));
    assert!(indicator.is_visible());

    loading.loading_off();
    assert_eq!(indicator.changed().await, Some(false));
}

#[tokio::test]
async fn home_view_moves_a_recategorised_course_between_lists() {
    let store = loaded_store(FakeCatalogApi::with_courses(vec![
        course("1", Category::Beginner, 2),
        course("2", Category::Beginner, 1),
        course("3", Category::Advanced, 1),
    ]))
    .await;
    let mut home = HomeView::new(&store);
    assert_eq!(ids(home.beginner.courses()), ["2", "1"]);
    assert_eq!(ids(home.advanced.courses()), ["3"]);

    store
        .save_course(
            &CourseId::new("1"),
            CourseChanges {
                category: Some(Category::Advanced),
                ..CourseChanges::default()
            },
        )
        .expect("course exists");

    timeout(Duration::from_secs(1), async {
        while ids(home.advanced.courses()) != ["3", "1"] || ids(home.beginner.courses()) != ["2"] {
            assert!(home.next_update().await, "store dropped");
        }
    })
    .await
    .expect("home view caught up");
}

#[tokio::test]
async fn home_view_updates_only_after_the_catalog_changes() {
    let store = loaded_store(FakeCatalogApi::with_courses(two_beginner_courses())).await;
    let mut home = HomeView::new(&store);
    assert_eq!(ids(home.beginner.courses()), ["2", "1"]);

    assert!(timeout(Duration::from_millis(50), home.next_update())
        .await
        .is_err());

    store
        .save_course(
            &CourseId::new("2"),
            CourseChanges {
                description: Some("Renamed".to_string()),
                ..CourseChanges::default()
            },
        )
        .expect("course exists");

    let updated = timeout(Duration::from_secs(1), home.next_update())
        .await
        .expect("update after change");
    assert!(updated);
}

#[tokio::test]
async fn course_detail_fills_in_each_part_as_it_arrives() {
    let gate = Arc::new(Notify::new());
    let api = Arc::new(
        FakeCatalogApi::with_courses(two_beginner_courses())
            .with_lessons(vec![lesson("10", "1", 1), lesson("11", "1", 2), lesson("20", "2", 1)])
            .with_lessons_gate(gate.clone()),
    );
    let route_id = course_id_from_route("/courses/1").expect("route id");

    let view = CourseDetailView::load(api, route_id);
    let mut data = view.subscribe();
    let partial = data
        .wait_for(|data| data.course.is_some())
        .await
        .expect("course arrived")
        .clone();
    assert!(partial.lessons.is_empty());

    gate.notify_one();
    view.done().await.expect("loaded");

    let complete = view.data();
    assert_eq!(complete.course.expect("course").id, CourseId::new("1"));
    let lesson_ids: Vec<&str> = complete.lessons.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(lesson_ids, ["10", "11"]);
    assert_eq!(render_lesson(&complete.lessons[0]), "  1. Lesson 10 (4:17)");
}

#[tokio::test]
async fn course_detail_reports_a_missing_course() {
    let api = Arc::new(FakeCatalogApi::with_courses(two_beginner_courses()));

    let view = CourseDetailView::load(api, CourseId::new("404"));
    let err = view.done().await.expect_err("missing course");

    assert!(matches!(err, ClientError::Status { status: 404, .. }));
    assert_eq!(view.data().course, None);
}
