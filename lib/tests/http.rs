use std::collections::HashSet;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use storyboard::config::{Assets, Storage};
use storyboard::{app, AppState, Config};

const BOUNDARY: &str = "storyboard-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

fn png(bytes: &[u8]) -> Part<'_> {
    Part::File {
        filename: "holiday.png",
        content_type: "image/png",
        bytes,
    }
}

fn config(dir: &TempDir) -> Config {
    let path = |p: &str| dir.path().join(p).to_string_lossy().into_owned();
    Config {
        storage: Storage {
            document: path("data/catalog.json"),
            blobs: path("uploads"),
        },
        assets: Assets {
            serve: true,
            path: path("public"),
        },
        ..Default::default()
    }
}

fn setup() -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::open(config(&dir)).unwrap();
    (dir, state)
}

fn upload_request(parts: &[Part]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!(
                        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                    )
                    .as_bytes(),
                );
            }
            Part::File {
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn login_request(password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/login")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "password": password }).to_string()))
        .unwrap()
}

async fn send(state: &AppState, request: Request<Body>) -> Response {
    app(state.clone()).oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_json(state: &AppState, uri: &str) -> Value {
    let response = send(state, request("GET", uri)).await;
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await
}

async fn upload(state: &AppState, title: &str) -> Value {
    let response = send(
        state,
        upload_request(&[
            Part::Text("title", title),
            Part::Text("description", "a day at the beach"),
            png(b"\x89PNG fake"),
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    body["image"].clone()
}

fn blob_count(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path().join("uploads")).unwrap().count()
}

async fn assert_counters(state: &AppState) {
    let images = get_json(state, "/api/images").await;
    let images = images.as_array().unwrap();
    let stats = get_json(state, "/api/stats").await;
    let favorites = images
        .iter()
        .filter(|i| i["isFavorite"] == json!(true))
        .count();
    assert_eq!(stats["totalImages"], json!(images.len()));
    assert_eq!(stats["totalFavorites"], json!(favorites));
}

#[tokio::test]
async fn uploaded_image_is_listed_first_and_served() {
    let (dir, state) = setup();

    let first = upload(&state, "first").await;
    let second = upload(&state, "second").await;

    let images = get_json(&state, "/api/images").await;
    assert_eq!(images[0]["id"], second["id"]);
    assert_eq!(images[1]["id"], first["id"]);
    assert_eq!(images[0]["title"], json!("second"));
    assert_eq!(images[0]["isFavorite"], json!(false));

    let stats = get_json(&state, "/api/stats").await;
    assert_eq!(stats["totalImages"], json!(2));
    assert_eq!(blob_count(&dir), 2);

    let url = second["url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/"));
    let response = send(&state, request("GET", url)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"\x89PNG fake");
}

#[tokio::test]
async fn non_image_upload_leaves_nothing_behind() {
    let (dir, state) = setup();

    let response = send(
        &state,
        upload_request(&[
            Part::Text("title", "t"),
            Part::Text("description", "d"),
            Part::File {
                filename: "script.sh",
                content_type: "text/x-shellscript",
                bytes: b"rm -rf /",
            },
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], json!(false));

    assert_eq!(get_json(&state, "/api/images").await, json!([]));
    assert_eq!(blob_count(&dir), 0);
}

#[tokio::test]
async fn missing_title_removes_written_blob() {
    let (dir, state) = setup();

    let response = send(
        &state,
        upload_request(&[Part::Text("description", "d"), png(b"img")]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(blob_count(&dir), 0);
    assert_eq!(get_json(&state, "/api/stats").await["totalImages"], json!(0));
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let (_dir, state) = setup();

    let response = send(
        &state,
        upload_request(&[Part::Text("title", "t"), Part::Text("description", "d")]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], json!("No image file provided"));
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&dir);
    config.upload.max_size = 8;
    let state = AppState::open(config).unwrap();

    let response = send(
        &state,
        upload_request(&[
            Part::Text("title", "t"),
            Part::Text("description", "d"),
            png(&[0u8; 64]),
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(blob_count(&dir), 0);
    assert_eq!(get_json(&state, "/api/images").await, json!([]));
}

#[tokio::test]
async fn oversized_text_fields_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&dir);
    config.upload.max_text_size = 32;
    let state = AppState::open(config).unwrap();
    let long = "x".repeat(33);

    let response = send(
        &state,
        upload_request(&[
            Part::Text("title", &long),
            Part::Text("description", "d"),
            png(b"img"),
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("title"));

    let response = send(
        &state,
        upload_request(&[
            Part::Text("title", "t"),
            png(b"img"),
            Part::Text("description", &long),
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(blob_count(&dir), 0);
    assert_eq!(get_json(&state, "/api/images").await, json!([]));

    let exact = "x".repeat(32);
    let response = send(
        &state,
        upload_request(&[
            Part::Text("title", &exact),
            Part::Text("description", &exact),
            png(b"img"),
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn favorite_unknown_id_is_not_found() {
    let (_dir, state) = setup();
    upload(&state, "only").await;

    let response = send(&state, request("POST", "/api/favorite/12345")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        get_json(&state, "/api/stats").await["totalFavorites"],
        json!(0)
    );
}

#[tokio::test]
async fn favorite_twice_restores_original() {
    let (_dir, state) = setup();
    let image = upload(&state, "fav").await;
    let uri = format!("/api/favorite/{}", image["id"]);

    let response = send(&state, request("POST", &uri)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "success": true, "isFavorite": true })
    );
    assert_eq!(
        get_json(&state, "/api/stats").await["totalFavorites"],
        json!(1)
    );

    let response = send(&state, request("POST", &uri)).await;
    assert_eq!(json_body(response).await["isFavorite"], json!(false));
    assert_eq!(
        get_json(&state, "/api/stats").await["totalFavorites"],
        json!(0)
    );
}

#[tokio::test]
async fn delete_removes_entry_and_blob() {
    let (dir, state) = setup();
    let keep = upload(&state, "keep").await;
    let gone = upload(&state, "gone").await;
    send(
        &state,
        request("POST", &format!("/api/favorite/{}", gone["id"])),
    )
    .await;

    let response = send(
        &state,
        request("DELETE", &format!("/api/images/{}", gone["id"])),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["success"], json!(true));

    let images = get_json(&state, "/api/images").await;
    assert_eq!(images.as_array().unwrap().len(), 1);
    assert_eq!(images[0]["id"], keep["id"]);
    assert_eq!(blob_count(&dir), 1);
    assert!(!dir
        .path()
        .join("uploads")
        .join(gone["filename"].as_str().unwrap())
        .exists());

    let stats = get_json(&state, "/api/stats").await;
    assert_eq!(stats["totalImages"], json!(1));
    assert_eq!(stats["totalFavorites"], json!(0));

    let response = send(
        &state,
        request("DELETE", &format!("/api/images/{}", gone["id"])),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_succeeds_when_blob_already_gone() {
    let (dir, state) = setup();
    let image = upload(&state, "ghost").await;
    std::fs::remove_file(
        dir.path()
            .join("uploads")
            .join(image["filename"].as_str().unwrap()),
    )
    .unwrap();

    let response = send(
        &state,
        request("DELETE", &format!("/api/images/{}", image["id"])),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_json(&state, "/api/images").await, json!([]));
}

#[tokio::test]
async fn counters_follow_every_operation() {
    let (_dir, state) = setup();
    let mut ids = vec![];
    for title in ["a", "b", "c", "d"] {
        ids.push(upload(&state, title).await["id"].clone());
        assert_counters(&state).await;
    }
    for id in [&ids[0], &ids[2], &ids[3]] {
        send(&state, request("POST", &format!("/api/favorite/{id}"))).await;
        assert_counters(&state).await;
    }
    for id in [&ids[2], &ids[1]] {
        send(&state, request("DELETE", &format!("/api/images/{id}"))).await;
        assert_counters(&state).await;
    }
}

#[tokio::test]
async fn restart_reloads_same_state() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::open(config(&dir)).unwrap();
    let image = upload(&state, "persisted").await;
    send(
        &state,
        request("POST", &format!("/api/favorite/{}", image["id"])),
    )
    .await;
    send(&state, request("GET", "/")).await;
    let images = get_json(&state, "/api/images").await;
    let stats = get_json(&state, "/api/stats").await;
    drop(state);

    let restarted = AppState::open(config(&dir)).unwrap();
    assert_eq!(get_json(&restarted, "/api/images").await, images);
    assert_eq!(get_json(&restarted, "/api/stats").await, stats);
}

#[tokio::test]
async fn landing_page_counts_visits() {
    let (dir, state) = setup();
    std::fs::create_dir_all(dir.path().join("public")).unwrap();
    std::fs::write(dir.path().join("public/index.html"), "<h1>board</h1>").unwrap();

    for _ in 0..3 {
        let response = send(&state, request("GET", "/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>board</h1>");
    }

    assert_eq!(get_json(&state, "/api/stats").await["totalVisits"], json!(3));
}

#[tokio::test]
async fn landing_page_has_fallback() {
    let (_dir, state) = setup();
    let response = send(&state, request("GET", "/")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_accepts_only_configured_password() {
    let (_dir, state) = setup();

    let response = send(&state, login_request("admin")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "success": true }));

    let response = send(&state, login_request("hunter2")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_id_is_json_not_found() {
    let (_dir, state) = setup();
    upload(&state, "only").await;

    for (method, uri) in [("POST", "/api/favorite/abc"), ("DELETE", "/api/images/1.5")] {
        let response = send(&state, request(method, uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(response).await,
            json!({ "success": false, "error": "Image not found" })
        );
    }
    assert_eq!(get_json(&state, "/api/stats").await["totalImages"], json!(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_uploads_get_distinct_ids() {
    let (dir, state) = setup();

    let handles = (0..8)
        .map(|n| {
            let state = state.clone();
            tokio::spawn(async move { upload(&state, &format!("shot {n}")).await })
        })
        .collect::<Vec<_>>();

    let mut ids = HashSet::new();
    for handle in handles {
        let image = handle.await.unwrap();
        assert!(ids.insert(image["id"].as_i64().unwrap()));
    }

    assert_eq!(get_json(&state, "/api/stats").await["totalImages"], json!(8));
    assert_eq!(blob_count(&dir), 8);

    let document = std::fs::read(dir.path().join("data/catalog.json")).unwrap();
    let document: Value = serde_json::from_slice(&document).unwrap();
    assert_eq!(document["images"].as_array().unwrap().len(), 8);
}
