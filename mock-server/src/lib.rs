//! In-memory MemoryKV server for exercising clients over real HTTP.
//!
//! Values are opaque bytes. Listing and prefix deletion answer with a JSON
//! array of key names; single-key reads and writes answer with the raw value.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Redirect,
    routing::get,
    Json, Router,
};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::debug;

pub type Db = Arc<RwLock<BTreeMap<String, Bytes>>>;

pub fn app() -> Router {
    app_with_db(Db::default())
}

/// Router over an existing store, so tests can inspect or seed it.
pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/keys", get(list_keys).delete(remove_all_keys))
        .route(
            "/keys/{prefix}",
            get(list_keys_with_prefix).delete(remove_prefix),
        )
        .route("/redirect/{key}", get(redirect_to_key))
        .route("/{key}", get(get_key).put(put_key).delete(remove_key))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn ping() -> &'static str {
    "pong"
}

/// Missing keys read as an empty body.
async fn get_key(State(db): State<Db>, Path(key): Path<String>) -> Bytes {
    db.read().await.get(&key).cloned().unwrap_or_default()
}

/// Answers with the value that was replaced, if any.
async fn put_key(State(db): State<Db>, Path(key): Path<String>, value: Bytes) -> Bytes {
    debug!(%key, len = value.len(), "put");
    db.write().await.insert(key, value).unwrap_or_default()
}

async fn remove_key(
    State(db): State<Db>,
    Path(key): Path<String>,
) -> Result<Bytes, StatusCode> {
    db.write().await.remove(&key).ok_or(StatusCode::NOT_FOUND)
}

async fn list_keys(State(db): State<Db>) -> Json<Vec<String>> {
    Json(db.read().await.keys().cloned().collect())
}

async fn list_keys_with_prefix(
    State(db): State<Db>,
    Path(prefix): Path<String>,
) -> Json<Vec<String>> {
    Json(matching(&*db.read().await, &prefix))
}

async fn remove_prefix(State(db): State<Db>, Path(prefix): Path<String>) -> Json<Vec<String>> {
    let mut store = db.write().await;
    let removed = matching(&store, &prefix);
    for key in &removed {
        store.remove(key);
    }
    Json(removed)
}

async fn remove_all_keys(State(db): State<Db>) -> StatusCode {
    db.write().await.clear();
    StatusCode::OK
}

async fn redirect_to_key(Path(key): Path<String>) -> Redirect {
    Redirect::temporary(&format!("/{key}"))
}

fn matching(store: &BTreeMap<String, Bytes>, prefix: &str) -> Vec<String> {
    store
        .range(prefix.to_string()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, _)| k.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(keys: &[&str]) -> BTreeMap<String, Bytes> {
        keys.iter()
            .map(|k| (k.to_string(), Bytes::from_static(b"v")))
            .collect()
    }

    #[test]
    fn matching_returns_sorted_prefix_run() {
        let s = store(&["b1", "a", "b", "b2", "c"]);
        assert_eq!(matching(&s, "b"), vec!["b", "b1", "b2"]);
    }

    #[test]
    fn matching_empty_prefix_returns_everything() {
        let s = store(&["x", "y"]);
        assert_eq!(matching(&s, ""), vec!["x", "y"]);
    }

    #[test]
    fn matching_no_hits() {
        let s = store(&["a", "b"]);
        assert!(matching(&s, "z").is_empty());
    }
}
