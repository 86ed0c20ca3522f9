//! In-process stub of the segmentation backend for integration tests.
//!
//! Serves the three-endpoint contract on an ephemeral port, records what
//! the client actually sent, and fails on demand so the error paths can be
//! exercised.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

pub const FILE_ID: &str = "abc123";
pub const ZIP_FILENAME: &str = "groups_abc123.zip";

/// How one endpoint behaves for subsequent requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepBehavior {
    /// Answer the contract's success response.
    #[default]
    Ok,
    /// Answer HTTP 500 with a plain-text body.
    ServerError,
    /// Answer 200 with a body that violates the contract.
    Malformed,
}

/// Per-endpoint behavior, adjustable mid-test.
#[derive(Debug, Clone, Copy, Default)]
pub struct Behavior {
    pub upload: StepBehavior,
    pub select: StepBehavior,
    pub download: StepBehavior,
}

/// Everything the stub observed.
#[derive(Debug, Default)]
pub struct Seen {
    pub upload_paths: Vec<String>,
    pub upload_fields: Vec<String>,
    pub upload_filenames: Vec<String>,
    pub upload_bodies: Vec<Vec<u8>>,
    pub select_requests: Vec<serde_json::Value>,
    pub download_filenames: Vec<Option<String>>,
}

#[derive(Clone)]
pub struct StubState {
    behavior: Arc<Mutex<Behavior>>,
    seen: Arc<Mutex<Seen>>,
}

/// Handle to a running stub backend.
pub struct StubBackend {
    /// Base URL, e.g. `http://127.0.0.1:49152`.
    pub url: String,
    state: StubState,
}

impl StubBackend {
    /// Spawn a stub with default (all-success) behavior.
    pub async fn spawn() -> Self {
        Self::spawn_with(Behavior::default()).await
    }

    /// Spawn a stub with the given behavior.
    pub async fn spawn_with(behavior: Behavior) -> Self {
        let state = StubState {
            behavior: Arc::new(Mutex::new(behavior)),
            seen: Arc::new(Mutex::new(Seen::default())),
        };

        let app = Router::new()
            .route("/upload_uid_file", post(upload_handler))
            .route("/upload_cpid_file", post(upload_handler))
            .route("/select_users", post(select_handler))
            .route("/download_user_groups", get(download_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub backend");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub backend died");
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    /// Change endpoint behavior for subsequent requests.
    pub fn set_behavior(&self, behavior: Behavior) {
        *self.state.behavior.lock().unwrap() = behavior;
    }

    /// Run a closure over everything observed so far.
    pub fn with_seen<T>(&self, f: impl FnOnce(&Seen) -> T) -> T {
        f(&self.state.seen.lock().unwrap())
    }

    pub fn upload_count(&self) -> usize {
        self.with_seen(|seen| seen.upload_fields.len())
    }
}

async fn upload_handler(
    State(state): State<StubState>,
    uri: axum::http::Uri,
    mut multipart: Multipart,
) -> Response {
    {
        let mut seen = state.seen.lock().unwrap();
        seen.upload_paths.push(uri.path().to_string());
    }
    while let Some(field) = multipart.next_field().await.expect("bad multipart") {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.expect("bad multipart body").to_vec();
        let mut seen = state.seen.lock().unwrap();
        seen.upload_fields.push(name);
        seen.upload_filenames.push(filename);
        seen.upload_bodies.push(bytes);
    }

    let behavior = state.behavior.lock().unwrap().upload;
    match behavior {
        StepBehavior::Ok => Json(json!({ "file_id": FILE_ID })).into_response(),
        StepBehavior::ServerError => {
            (StatusCode::INTERNAL_SERVER_ERROR, "upload exploded").into_response()
        }
        StepBehavior::Malformed => Json(json!({ "file_id": "" })).into_response(),
    }
}

async fn select_handler(
    State(state): State<StubState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let open_rate = body["open_rate"].as_u64().unwrap_or(0);
    state.seen.lock().unwrap().select_requests.push(body);

    let behavior = state.behavior.lock().unwrap().select;
    match behavior {
        StepBehavior::Ok => Json(json!({
            "stats": {
                "total_users": 100,
                "expected_open_rate": open_rate,
                "mail_group": 60,
                "whatsapp_group": 30,
                "ignored_group": 10
            },
            "zip_filename": ZIP_FILENAME
        }))
        .into_response(),
        StepBehavior::ServerError => {
            (StatusCode::INTERNAL_SERVER_ERROR, "selection exploded").into_response()
        }
        StepBehavior::Malformed => Json(json!({ "unexpected": true })).into_response(),
    }
}

async fn download_handler(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state
        .seen
        .lock()
        .unwrap()
        .download_filenames
        .push(params.get("filename").cloned());

    let behavior = state.behavior.lock().unwrap().download;
    match behavior {
        StepBehavior::Ok => groups_zip().into_response(),
        StepBehavior::ServerError => {
            (StatusCode::NOT_FOUND, "no archive on record").into_response()
        }
        StepBehavior::Malformed => "<html>definitely not a zip</html>".into_response(),
    }
}

/// A small but real groups archive.
pub fn groups_zip() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let entries = [
        ("mail.csv", "id,email\n1,test1@mail.com\n"),
        ("wa.csv", "id,phone\n1,+1234567890\n"),
        ("ignore.csv", "id,reason\n1,No interaction\n"),
    ];
    for (name, content) in entries {
        writer
            .start_file(name, zip::write::SimpleFileOptions::default())
            .expect("zip entry");
        writer.write_all(content.as_bytes()).expect("zip write");
    }
    writer.finish().expect("zip finish").into_inner()
}

/// Write a small identifiers file into `dir` and return its path.
pub fn identifiers_file(dir: &std::path::Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "Uid\n1001\n1002\n1003\n").expect("write identifiers file");
    path
}
