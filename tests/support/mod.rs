//! In-process heroes server the checker is run against.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use hero_api_check::{Config, Hero};
use serde::Deserialize;
use serde_json::{json, Value};

/// Ways the fake server can break the contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quirks {
    pub list_as_object: bool,
    pub reassign_ids: bool,
    pub ignore_update: bool,
    pub ignore_delete: bool,
    pub root_status_500: bool,
    pub update_as_array: bool,
    pub delete_as_array: bool,
    /// Serve the list body as `text/plain`.
    pub list_as_text: bool,
}

type Store = Arc<Mutex<BTreeMap<i64, Hero>>>;

#[derive(Clone)]
struct AppState {
    heroes: Store,
    quirks: Quirks,
}

#[derive(Deserialize)]
struct SearchQuery {
    name: Option<String>,
}

pub struct FakeServer {
    pub addr: SocketAddr,
    heroes: Store,
}

impl FakeServer {
    pub async fn spawn(quirks: Quirks) -> Self {
        let heroes = Store::default();
        let state = AppState {
            heroes: heroes.clone(),
            quirks,
        };
        let app = Router::new()
            .route("/", get(root))
            .route("/api/heroes", get(list).post(create).put(update))
            .route("/api/heroes/{id}", get(read).delete(remove))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, heroes }
    }

    pub fn config(&self) -> Config {
        Config {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            ..Config::default()
        }
    }

    pub fn hero(&self, id: i64) -> Option<Hero> {
        self.heroes.lock().unwrap().get(&id).cloned()
    }
}

/// Config pointing at a local port nothing listens on.
pub async fn closed_port_config() -> Config {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Config {
        host: "127.0.0.1".to_string(),
        port,
        ..Config::default()
    }
}

async fn root(State(state): State<AppState>) -> Response {
    let body = Json(json!({ "data": "Welcome to the rest service of Heroes." }));
    if state.quirks.root_status_500 {
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    } else {
        body.into_response()
    }
}

async fn list(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Response {
    let heroes: Vec<Hero> = state
        .heroes
        .lock()
        .unwrap()
        .values()
        .filter(|h| match &query.name {
            Some(term) => h.name.starts_with(term.as_str()),
            None => true,
        })
        .cloned()
        .collect();

    let body = if state.quirks.list_as_object {
        json!({ "heroes": heroes })
    } else {
        json!(heroes)
    };
    if state.quirks.list_as_text {
        ([(header::CONTENT_TYPE, "text/plain")], body.to_string()).into_response()
    } else {
        Json(body).into_response()
    }
}

async fn create(State(state): State<AppState>, Json(mut hero): Json<Hero>) -> (StatusCode, Json<Hero>) {
    if state.quirks.reassign_ids {
        hero.id += 1;
    }
    let previous = state.heroes.lock().unwrap().insert(hero.id, hero.clone());
    let status = if previous.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    (status, Json(hero))
}

async fn read(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Hero>, StatusCode> {
    state
        .heroes
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update(State(state): State<AppState>, Json(hero): Json<Hero>) -> Json<Value> {
    let mut heroes = state.heroes.lock().unwrap();
    let matched = heroes.contains_key(&hero.id);
    if matched && !state.quirks.ignore_update {
        heroes.insert(hero.id, hero);
    }
    if state.quirks.update_as_array {
        return Json(json!([{ "n": u8::from(matched) }]));
    }
    Json(json!({ "n": u8::from(matched), "ok": 1 }))
}

async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> Json<Value> {
    let deleted = if state.quirks.ignore_delete {
        false
    } else {
        state.heroes.lock().unwrap().remove(&id).is_some()
    };
    if state.quirks.delete_as_array {
        Json(json!([]))
    } else {
        Json(json!({ "deletedCount": u8::from(deleted) }))
    }
}
