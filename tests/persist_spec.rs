use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use brasskey::config::Config;
use brasskey::import::load_rooms_dir;
use brasskey::net::http::router;
use brasskey::services::lines::DialogueCatalog;
use brasskey::{Registry, RoomRegistry};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn room_doc(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "width": 320,
        "height": 180,
        "backgroundColor": "#000000",
        "hotspots": [{
            "id": "door",
            "name": "Door",
            "bounds": { "x": 10, "y": 10, "w": 20, "h": 40 },
            "walkTarget": { "x": 20, "y": 150 }
        }]
    })
}

fn setup() -> (TempDir, Arc<Registry>, Router) {
    let dir = TempDir::new().unwrap();
    let text = serde_json::to_string_pretty(&room_doc("room1", "Gatehouse")).unwrap();
    std::fs::write(dir.path().join("room1.json"), text).unwrap();

    let rooms = Arc::new(RoomRegistry::from_set(load_rooms_dir(dir.path(), None).unwrap()));
    let config = Arc::new(Config {
        rooms_dir: dir.path().to_path_buf(),
        ..Config::default()
    });
    let registry = Arc::new(Registry::new(config, rooms, DialogueCatalog::default()));
    let app = router(registry.clone());
    (dir, registry, app)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Option<String>, Value) {
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let cache = res
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cache, json)
}

#[tokio::test]
async fn get_existing_room() {
    let (_dir, _registry, app) = setup();
    let (status, cache, body) = call(&app, "GET", "/api/rooms/room1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("no-store"));
    assert_eq!(body["room"]["id"], "room1");
    assert_eq!(body["room"]["hotspots"][0]["id"], "door");
}

#[tokio::test]
async fn missing_or_malformed_ids_are_not_found() {
    let (_dir, _registry, app) = setup();
    for uri in ["/api/rooms/cellar", "/api/rooms/bad.id", "/api/nothing"] {
        let (status, cache, body) = call(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(cache.as_deref(), Some("no-store"));
        assert_eq!(body, json!({ "error": "Not found" }));
    }
}

#[tokio::test]
async fn post_writes_file_and_swaps_registry() {
    let (dir, registry, app) = setup();
    let mut room = room_doc("ignored", "Renamed Gatehouse");
    room["hotspots"][0]["bounds"]["x"] = json!(42);

    let (status, _, body) = call(&app, "POST", "/api/rooms/room1", Some(json!({ "room": room }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(body["file"].as_str().unwrap().ends_with("room1.json"));

    let written = std::fs::read_to_string(dir.path().join("room1.json")).unwrap();
    assert!(written.ends_with('\n'));
    let on_disk: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(on_disk["id"], "room1");
    assert_eq!(on_disk["hotspots"][0]["bounds"]["x"], 42.0);

    let live = registry.rooms.get("room1").unwrap();
    assert_eq!(live.name, "Renamed Gatehouse");

    let (_, _, body) = call(&app, "GET", "/api/rooms/room1", None).await;
    assert_eq!(body["room"]["name"], "Renamed Gatehouse");
}

#[tokio::test]
async fn post_new_room_fills_defaults() {
    let (dir, registry, app) = setup();
    let (status, _, _) = call(&app, "POST", "/api/rooms/attic", Some(json!({ "room": {} }))).await;
    assert_eq!(status, StatusCode::OK);

    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(dir.path().join("attic.json")).unwrap()).unwrap();
    assert_eq!(on_disk["name"], "attic");
    assert_eq!(on_disk["width"], 320.0);
    assert_eq!(on_disk["height"], 180.0);
    assert_eq!(on_disk["backgroundColor"], "#000000");
    assert!(registry.rooms.contains("attic"));
}

#[tokio::test]
async fn bad_bodies_are_rejected() {
    let (dir, registry, app) = setup();
    let before = std::fs::read_to_string(dir.path().join("room1.json")).unwrap();

    let (status, _, body) = call(&app, "POST", "/api/rooms/room1", Some(json!({ "nope": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Expected body: { room: object }");

    let mut dup = room_doc("room1", "Twice");
    dup["hotspots"] = json!([dup["hotspots"][0].clone(), dup["hotspots"][0].clone()]);
    let (status, _, _) = call(&app, "POST", "/api/rooms/room1", Some(json!({ "room": dup }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(std::fs::read_to_string(dir.path().join("room1.json")).unwrap(), before);
    assert_eq!(registry.rooms.get("room1").unwrap().name, "Gatehouse");
}

#[tokio::test]
async fn post_to_invalid_id_is_not_found() {
    let (dir, _registry, app) = setup();
    let (status, _, _) = call(&app, "POST", "/api/rooms/..%2Fescape", Some(json!({ "room": {} }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!dir.path().join("escape.json").exists());
}
