// ============================================================
// Layer 7 - Editor HTTP Server
// ============================================================
// Routes:
//   GET  /                 editing page
//   GET  /api/data         { columns, rows, dirty, path }
//   POST /api/cell         { row, column, value }
//   POST /api/rows/delete  { row }
//   POST /api/save         write the table back to its CSV
//   POST /api/shutdown     stop serving
//
// `column` may be an index or a header name. Edits live in
// memory until /api/save.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::data::{loader::write_table, table::Table};

const PAGE: &str = include_str!("page.html");

pub struct Document {
    pub table: Table,
    pub path:  PathBuf,
    /// True when the table differs from what was last saved
    pub dirty: bool,
}

#[derive(Clone)]
pub struct AppState {
    document: Arc<Mutex<Document>>,
    shutdown: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl AppState {
    pub fn new(table: Table, path: PathBuf, shutdown: oneshot::Sender<()>) -> Self {
        Self {
            document: Arc::new(Mutex::new(Document { table, path, dirty: false })),
            shutdown: Arc::new(Mutex::new(Some(shutdown))),
        }
    }

    fn document(&self) -> Result<MutexGuard<'_, Document>, ApiError> {
        self.document
            .lock()
            .map_err(|_| ApiError::internal("editor state is poisoned"))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/data", get(data))
        .route("/api/cell", post(update_cell))
        .route("/api/rows/delete", post(delete_row))
        .route("/api/save", post(save))
        .route("/api/shutdown", post(shutdown))
        .with_state(state)
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ApiError {
    status:  StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!("{} {}", self.status, self.message);
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

// ─── Payloads ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct DataResponse {
    columns: Vec<String>,
    rows:    Vec<Vec<String>>,
    dirty:   bool,
    path:    String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColumnRef {
    Index(usize),
    Name(String),
}

#[derive(Debug, Deserialize)]
struct CellUpdate {
    row:    usize,
    column: ColumnRef,
    value:  String,
}

#[derive(Debug, Deserialize)]
struct RowRef {
    row: usize,
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    tracing::debug!("GET /");
    Html(PAGE)
}

async fn data(State(state): State<AppState>) -> Result<Json<DataResponse>, ApiError> {
    tracing::debug!("GET /api/data");
    let doc = state.document()?;
    Ok(Json(DataResponse {
        columns: doc.table.headers.clone(),
        rows:    doc.table.rows.clone(),
        dirty:   doc.dirty,
        path:    doc.path.display().to_string(),
    }))
}

async fn update_cell(
    State(state): State<AppState>,
    Json(update): Json<CellUpdate>,
) -> Result<Json<Value>, ApiError> {
    tracing::debug!("POST /api/cell {:?}", update);
    let mut doc = state.document()?;
    let col = match update.column {
        ColumnRef::Index(i) => i,
        ColumnRef::Name(name) => doc
            .table
            .column_index(&name)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown column '{name}'")))?,
    };
    doc.table
        .set_cell(update.row, col, update.value)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    doc.dirty = true;
    Ok(Json(json!({ "ok": true, "dirty": true })))
}

async fn delete_row(
    State(state): State<AppState>,
    Json(target): Json<RowRef>,
) -> Result<Json<Value>, ApiError> {
    tracing::debug!("POST /api/rows/delete {:?}", target);
    let mut doc = state.document()?;
    doc.table
        .remove_row(target.row)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    doc.dirty = true;
    Ok(Json(json!({ "ok": true, "rows": doc.table.n_rows() })))
}

async fn save(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    tracing::debug!("POST /api/save");
    let mut doc = state.document()?;
    write_table(&doc.path, &doc.table).map_err(|e| ApiError::internal(format!("{e:#}")))?;
    doc.dirty = false;
    tracing::info!("Saved {} rows to '{}'", doc.table.n_rows(), doc.path.display());
    Ok(Json(json!({ "ok": true, "rows": doc.table.n_rows() })))
}

async fn shutdown(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    tracing::debug!("POST /api/shutdown");
    let sender = state
        .shutdown
        .lock()
        .map_err(|_| ApiError::internal("shutdown handle is poisoned"))?
        .take();
    if let Some(tx) = sender {
        // the receiver only disappears once the server is already stopping
        let _ = tx.send(());
    }
    Ok(Json(json!({ "ok": true })))
}
