use super::*;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::{Category, CourseChanges, CourseId};
use storage::MemoryStorage;
use tokio::{
    net::TcpListener,
    sync::{Mutex, Notify},
};
use tokio_stream::StreamExt;

#[derive(Clone)]
struct ServerState {
    release_puts: Arc<Notify>,
    fail_puts: bool,
    puts: Arc<Mutex<Vec<Value>>>,
}

async fn list_courses() -> Json<Value> {
    Json(json!({
        "payload": [
            { "id": 1, "description": "Course 1", "category": "BEGINNER", "seqNo": 2 },
            { "id": 2, "description": "Course 2", "category": "BEGINNER", "seqNo": 1 },
            { "id": 3, "description": "Course 3", "category": "ADVANCED", "seqNo": 1 }
        ]
    }))
}

async fn put_course(
    State(state): State<ServerState>,
    Path(_course_id): Path<String>,
    Json(changes): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.release_puts.notified().await;
    state.puts.lock().await.push(changes);
    if state.fail_puts {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})))
    } else {
        (StatusCode::OK, Json(json!({ "saved": true })))
    }
}

async fn spawn_server(fail_puts: bool) -> (String, ServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ServerState {
        release_puts: Arc::new(Notify::new()),
        fail_puts,
        puts: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/api/courses", get(list_courses))
        .route("/api/courses/:course_id", put(put_course))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

async fn start_client(url: &str) -> CatalogClient {
    let api = Arc::new(HttpCatalogApi::new(url).expect("api"));
    CatalogClient::start(api, Arc::new(MemoryStorage::new()))
        .await
        .expect("client")
}

#[tokio::test]
async fn edit_round_trip_against_http_backend() {
    let (url, server) = spawn_server(false).await;
    let client = start_client(&url).await;
    client.courses.initial_load().await.expect("load");
    assert!(!client.loading.is_loading());

    let mut beginner = client.courses.filter_by_category(Category::Beginner);
    let initial: Vec<String> = beginner
        .next()
        .await
        .expect("view")
        .into_iter()
        .map(|course| course.id.to_string())
        .collect();
    assert_eq!(initial, ["2", "1"]);

    let session = CourseEditSession::open(client.courses.course(&CourseId::new("1")).expect("course"));
    let mut edited = session.clone();
    edited.description = "New".to_string();
    let DialogOutcome::Saved { save, .. } = edited.confirm(&client.courses).expect("confirm") else {
        panic!("expected save");
    };

    let view = beginner.next().await.expect("optimistic view");
    assert_eq!(view[1].description, "New");
    assert_eq!(save.state(), SaveState::LocalApplied);

    server.release_puts.notify_one();
    save.await.expect("remote confirmed");
    let puts = server.puts.lock().await;
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0]["description"], "New");
    assert_eq!(puts[0]["category"], "BEGINNER");
    assert!(puts[0].get("seqNo").is_none());
}

#[tokio::test]
async fn failed_put_surfaces_banner_message_and_keeps_local_edit() {
    let (url, server) = spawn_server(true).await;
    let client = start_client(&url).await;
    client.courses.initial_load().await.expect("load");
    let mut banner = views::MessagesBanner::new(&client.messages);

    let save = client
        .courses
        .save_course(
            &CourseId::new("3"),
            CourseChanges {
                description: Some("Offline edit".to_string()),
                ..CourseChanges::default()
            },
        )
        .expect("course exists");
    server.release_puts.notify_one();

    let err = save.outcome().await.expect_err("server rejected");
    assert!(matches!(err, ClientError::Status { status: 500, .. }));
    assert_eq!(
        banner.next_batch().await.expect("banner"),
        [catalog::SAVE_FAILED_MESSAGE.to_string()]
    );
    assert_eq!(
        client
            .courses
            .course(&CourseId::new("3"))
            .expect("course")
            .description,
        "Offline edit"
    );
}

#[tokio::test]
async fn unreachable_backend_leaves_catalog_empty_with_a_notice() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);

    let client = start_client(&url).await;
    client
        .courses
        .initial_load()
        .await
        .expect_err("no backend");

    assert!(client.courses.snapshot().is_empty());
    assert!(!client.loading.is_loading());
    assert_eq!(
        client.messages.current_errors(),
        vec![catalog::LOAD_FAILED_MESSAGE.to_string()]
    );
    assert_eq!(client.auth.current_user(), None);
}
