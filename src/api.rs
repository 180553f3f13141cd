//! HTTP API поверх сессий

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::error::{ModelError, PipelineError};
use crate::io;
use crate::models::{fit_and_predict, RunOutput};
use crate::preprocessing::union::check_required_columns;
use crate::preprocessing::{DataProfile, FeaturePipeline, PipelineReport};
use crate::session::{SessionError, SessionStore, SessionSummary};
use crate::types::{Partition, LABEL_COLUMN};

#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            store: SessionStore::new(),
            config: Arc::new(config),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn pipeline_status(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::SplitMismatch { .. }
        | PipelineError::OffsetConflict { .. }
        | PipelineError::IncompleteRecord { .. }
        | PipelineError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Session(SessionError::Stale(_)) => StatusCode::CONFLICT,
            ApiError::Session(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(e) | ApiError::Model(ModelError::Pipeline(e)) => pipeline_status(e),
            ApiError::Model(ModelError::EmptyTrainingSet) => StatusCode::BAD_REQUEST,
            ApiError::Model(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(session_summary).delete(delete_session))
        .route("/api/sessions/:id/partitions/:partition", put(upload_partition))
        .route("/api/sessions/:id/analyze", get(analyze))
        .route("/api/sessions/:id/preprocess", post(preprocess))
        .route("/api/sessions/:id/features/:partition", get(features))
        .route("/api/sessions/:id/model", post(run_model))
        .route("/api/sessions/:id/predictions", get(predictions))
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Passenger ML API (Rust)",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionSummary>) {
    (StatusCode::CREATED, Json(state.store.create().await))
}

async fn session_summary(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SessionSummary>, ApiError> {
    let summary = state
        .store
        .with_session(id, |session| Ok::<_, ApiError>(session.summary()))
        .await?;
    Ok(Json(summary))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.store.remove(id).await?;
    tracing::info!("Session {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    partition: Partition,
    rows: usize,
    columns: usize,
}

async fn upload_partition(
    State(state): State<AppState>,
    Path((id, partition)): Path<(u64, Partition)>,
    body: String,
) -> Result<Json<UploadResponse>, ApiError> {
    tracing::info!("Upload request: session {}, {} partition", id, partition);

    let table = io::read_table(body.as_bytes())?;
    check_required_columns(&table, partition)?;
    if partition == Partition::Labeled && !table.has_column(LABEL_COLUMN) {
        return Err(PipelineError::SchemaMismatch(format!(
            "labeled partition is missing the {LABEL_COLUMN} column"
        ))
        .into());
    }

    let response = UploadResponse {
        partition,
        rows: table.len(),
        columns: table.columns.len(),
    };
    state
        .store
        .with_session(id, |session| {
            session.set_partition(partition, table);
            Ok::<_, ApiError>(())
        })
        .await?;

    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    labeled: Option<DataProfile>,
    unlabeled: Option<DataProfile>,
}

async fn analyze(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let response = state
        .store
        .with_session(id, |session| -> Result<AnalyzeResponse, ApiError> {
            let labeled = session.partition(Partition::Labeled).map(DataProfile::of);
            let unlabeled = session.partition(Partition::Unlabeled).map(DataProfile::of);
            if labeled.is_none() && unlabeled.is_none() {
                return Err(ApiError::from(SessionError::MissingPartition(
                    Partition::Labeled,
                )));
            }
            Ok(AnalyzeResponse { labeled, unlabeled })
        })
        .await?;
    Ok(Json(response))
}

async fn preprocess(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<PipelineReport>, ApiError> {
    tracing::info!("Preprocess request: session {}", id);

    // Снимок под блокировкой, расчёт вне её
    let (revision, labeled, unlabeled) = state
        .store
        .with_session(id, |session| -> Result<_, ApiError> {
            let (labeled, unlabeled) = session.partitions()?;
            Ok((session.revision(), labeled.clone(), unlabeled.clone()))
        })
        .await?;

    let pipeline = FeaturePipeline::new(state.config.pipeline.clone());
    let output = tokio::task::spawn_blocking(move || pipeline.run(&labeled, &unlabeled)).await??;
    let report = output.report.clone();

    state
        .store
        .with_session(id, |session| -> Result<(), ApiError> {
            session.ensure_revision(revision)?;
            session.set_output(output);
            Ok(())
        })
        .await?;

    Ok(Json(report))
}

fn csv_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/csv")], body).into_response()
}

async fn features(
    State(state): State<AppState>,
    Path((id, partition)): Path<(u64, Partition)>,
) -> Result<Response, ApiError> {
    let encoding = state.config.pipeline.flag_encoding;
    let body = state
        .store
        .with_session(id, |session| -> Result<String, ApiError> {
            let tables = &session.output()?.tables;
            let text = match partition {
                Partition::Labeled => {
                    io::features_to_string(&tables.labeled, Some(tables.labels.as_slice()), encoding)?
                }
                Partition::Unlabeled => io::features_to_string(&tables.unlabeled, None, encoding)?,
            };
            Ok(text)
        })
        .await?;

    Ok(csv_response(body))
}

async fn run_model(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<RunOutput>, ApiError> {
    tracing::info!("Model request: session {}", id);

    let (revision, tables) = state
        .store
        .with_session(id, |session| -> Result<_, ApiError> {
            Ok((session.revision(), session.output()?.tables.clone()))
        })
        .await?;

    let config = state.config.classifier.clone();
    let output = tokio::task::spawn_blocking(move || fit_and_predict(&tables, &config)).await??;

    state
        .store
        .with_session(id, |session| -> Result<(), ApiError> {
            session.ensure_revision(revision)?;
            session.set_model(output.clone());
            Ok(())
        })
        .await?;

    Ok(Json(output))
}

async fn predictions(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    let body = state
        .store
        .with_session(id, |session| -> Result<String, ApiError> {
            let mut buf = Vec::new();
            io::write_predictions(&mut buf, &session.model()?.predictions)?;
            Ok(String::from_utf8_lossy(&buf).into_owned())
        })
        .await?;

    Ok(csv_response(body))
}
