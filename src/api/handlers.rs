use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::io::ReaderStream;

use crate::digest;
use crate::document::{self, AssemblyError, DOCX_MIME, DocumentSpec, images};
use crate::error::ApiError;
use crate::rag::{RagRequest, RetrievalCall};
use crate::search::{SearchParams, SearchRequest};

use super::AppState;
use super::models::{GenerateResponse, SearchResponse, StatusResponse};

const NO_JSON: &str = "No JSON data provided";
const NO_DOCUMENT: &str = "Invalid input. Must provide document parameters.";
const DOWNLOAD_NAME: &str = "generated_document.docx";

pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse { status: "OK" })
}

/// Empty bodies, `null` and `{}` count as "no data"; anything else that
/// fails to deserialize is a malformed request.
fn parse_body<T: DeserializeOwned>(body: &Bytes, empty_message: &str) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::validation(empty_message));
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::validation(format!("Invalid JSON body: {e}")))?;
    let is_empty = match &value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if is_empty {
        return Err(ApiError::validation(empty_message));
    }
    serde_json::from_value(value).map_err(|e| ApiError::validation(format!("Invalid request: {e}")))
}

pub async fn brave_search(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();
    let request: SearchRequest = parse_body(&body, NO_JSON)?;
    let params = SearchParams::from_request(&request)?;

    let raw = state.brave.search(&params).await?;
    let results = digest::render_value(raw)
        .map_err(|e| ApiError::Internal(format!("An error occurred: {e}")))?;

    log::info!("search for '{}' answered in {:?}", params.query(), start.elapsed());
    Ok(Json(SearchResponse { results }))
}

pub async fn rag_retrieve(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: RagRequest = parse_body(&body, NO_JSON)?;
    let call = RetrievalCall::from_request(&request, &state.config.rag_allowed_hosts)?;
    Ok(Json(state.rag.retrieve(&call).await?))
}

pub async fn generate_docx(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GenerateResponse>, ApiError> {
    let start = Instant::now();
    let spec: DocumentSpec = parse_body(&body, NO_DOCUMENT)?;

    let fetched = images::prefetch(&state.fetcher, &spec, &state.image_limits).await;
    // Building and zipping the package is CPU-bound.
    let (packed, warnings) = tokio::task::spawn_blocking(move || {
        let assembly = document::assemble(&spec, &fetched)?;
        let warnings = assembly.warning_messages();
        Ok::<_, AssemblyError>((assembly.pack()?, warnings))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("document build task failed: {e}")))?
    .map_err(ApiError::internal)?;

    let file_id = state
        .files
        .save(&packed, "docx")
        .await
        .map_err(|e| ApiError::Internal(format!("failed to store document: {e}")))?;

    let base = match &state.config.public_base_url {
        Some(base) => base.clone(),
        None => request_origin(&headers),
    };
    log::info!(
        "generated document {file_id} ({} bytes, {} warnings) in {:?}",
        packed.len(),
        warnings.len(),
        start.elapsed()
    );
    Ok(Json(GenerateResponse {
        download_link: format!("{base}/download/{file_id}"),
        warnings,
    }))
}

/// `scheme://host` as the client addressed us, honouring reverse-proxy headers.
fn request_origin(headers: &HeaderMap) -> String {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let scheme = header_str("x-forwarded-proto").unwrap_or("http");
    let host = header_str("x-forwarded-host")
        .or_else(|| header_str(header::HOST.as_str()))
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}

pub async fn download(State(state): State<Arc<AppState>>, Path(file_id): Path<String>) -> Response {
    let not_found = || (StatusCode::NOT_FOUND, "File not found").into_response();

    let Some(path) = state.files.lookup(&file_id) else {
        log::warn!("download requested for unknown file id {file_id}");
        return not_found();
    };
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            log::error!("stored file {} unreadable: {e}", path.display());
            return not_found();
        }
    };

    (
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_NAME}\""),
            ),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}
