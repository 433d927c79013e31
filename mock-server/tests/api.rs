use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with_db, Db};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

fn put(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/octet-stream")
        .body(body.to_string())
        .unwrap()
}

async fn seeded(keys: &[(&str, &str)]) -> (Router, Db) {
    let db = Db::default();
    {
        let mut store = db.write().await;
        for (k, v) in keys {
            store.insert(k.to_string(), bytes::Bytes::from(v.to_string()));
        }
    }
    (app_with_db(db.clone()), db)
}

// --- ping ---

#[tokio::test]
async fn ping_answers_pong() {
    let resp = app().oneshot(request("GET", "/ping")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "pong");
}

// --- single keys ---

#[tokio::test]
async fn get_missing_key_is_empty_ok() {
    let resp = app().oneshot(request("GET", "/nothing")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn put_returns_previous_value() {
    let (app, db) = seeded(&[]).await;

    let resp = app.clone().oneshot(put("/k", "first")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());

    let resp = app.clone().oneshot(put("/k", "second")).await.unwrap();
    assert_eq!(body_bytes(resp).await, "first");

    let resp = app.oneshot(request("GET", "/k")).await.unwrap();
    assert_eq!(body_bytes(resp).await, "second");
    assert_eq!(db.read().await.len(), 1);
}

#[tokio::test]
async fn delete_returns_removed_value() {
    let (app, db) = seeded(&[("k", "v")]).await;
    let resp = app.oneshot(request("DELETE", "/k")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "v");
    assert!(db.read().await.is_empty());
}

#[tokio::test]
async fn delete_missing_key_returns_404() {
    let resp = app().oneshot(request("DELETE", "/missing")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- listing ---

#[tokio::test]
async fn list_keys_empty() {
    let resp = app().oneshot(request("GET", "/keys")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let keys: Vec<String> = body_json(resp).await;
    assert!(keys.is_empty());
}

#[tokio::test]
async fn list_keys_sorted() {
    let (app, _) = seeded(&[("b", "1"), ("a", "2")]).await;
    let resp = app.oneshot(request("GET", "/keys")).await.unwrap();
    let keys: Vec<String> = body_json(resp).await;
    assert_eq!(keys, vec!["a", "b"]);
}

#[tokio::test]
async fn list_keys_with_prefix() {
    let (app, _) = seeded(&[("c_sdk", "1"), ("c_sdk2", "2"), ("rust", "3")]).await;
    let resp = app.oneshot(request("GET", "/keys/c_")).await.unwrap();
    let keys: Vec<String> = body_json(resp).await;
    assert_eq!(keys, vec!["c_sdk", "c_sdk2"]);
}

// --- bulk deletion ---

#[tokio::test]
async fn delete_prefix_returns_removed_keys() {
    let (app, db) = seeded(&[("c1", "1"), ("c2", "2"), ("d", "3")]).await;
    let resp = app.oneshot(request("DELETE", "/keys/c")).await.unwrap();
    let removed: Vec<String> = body_json(resp).await;
    assert_eq!(removed, vec!["c1", "c2"]);
    let store = db.read().await;
    assert_eq!(store.keys().collect::<Vec<_>>(), vec!["d"]);
}

#[tokio::test]
async fn delete_all_clears_store() {
    let (app, db) = seeded(&[("a", "1"), ("b", "2")]).await;
    let resp = app.oneshot(request("DELETE", "/keys")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
    assert!(db.read().await.is_empty());
}

// --- redirect ---

#[tokio::test]
async fn redirect_points_at_key() {
    let resp = app().oneshot(request("GET", "/redirect/k")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.headers()[http::header::LOCATION], "/k");
}
