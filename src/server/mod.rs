//! Thin HTTP edge: protocol PDF in via multipart, assembled ICF out.
//!
//! No pipeline logic lives here; each upload builds its own pipeline
//! instance on a blocking task and hands the result to the assembler.

use std::path::Path;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::document::IcfDocument;
use crate::pipeline::embedding::AzureEmbedder;
use crate::pipeline::extraction::PdfTextExtractor;
use crate::pipeline::generation::AzureChatGenerator;
use crate::pipeline::orchestrator::IcfPipeline;
use crate::pipeline::PipelineError;

/// Protocol uploads can run long; cap them at 50 MiB.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn router(config: AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/health", get(health))
        .route("/icf", post(generate_icf))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(config)
}

async fn health() -> &'static str {
    "ok"
}

/// `POST /icf`: multipart field `file` carrying a protocol PDF. Responds
/// with the populated ICF as a Markdown attachment.
async fn generate_icf(State(config): State<AppConfig>, mut multipart: Multipart) -> Response {
    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let filename = field.file_name().unwrap_or("uploaded_file.pdf").to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        upload = Some((filename, bytes.to_vec()));
                        break;
                    }
                    Err(_) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            "could not read uploaded file",
                        )
                    }
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(_) => return error_response(StatusCode::BAD_REQUEST, "malformed multipart body"),
        }
    }

    let Some((filename, bytes)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "missing file field");
    };

    if !filename.to_ascii_lowercase().ends_with(".pdf") {
        return error_response(StatusCode::BAD_REQUEST, "only PDF uploads are accepted");
    }

    tracing::info!(filename = %filename, size = bytes.len(), "processing protocol upload");

    // reqwest::blocking clients must stay off the async runtime; each
    // upload owns an independent pipeline instance.
    let result = tokio::task::spawn_blocking(move || {
        let pipeline = IcfPipeline::new(
            PdfTextExtractor,
            AzureEmbedder::new(config.embedding.clone()),
            config.chat.clone().map(AzureChatGenerator::new),
        );
        pipeline.run(&bytes)
    })
    .await;

    let sections = match result {
        Ok(Ok(sections)) => sections,
        Ok(Err(e)) => return pipeline_error_response(e),
        Err(e) => {
            tracing::error!(error = %e, "pipeline task panicked");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    };

    let document = IcfDocument::new(&sections);
    let download_name = format!("{}_icf.md", file_stem(&filename));

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/markdown; charset=utf-8"),
    );
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{download_name}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    (StatusCode::OK, headers, document.to_bytes()).into_response()
}

fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("protocol")
}

fn pipeline_error_response(e: PipelineError) -> Response {
    let status = match &e {
        PipelineError::Extraction(_) => StatusCode::BAD_REQUEST,
        PipelineError::EmptyCorpus => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::EmbeddingService(_) | PipelineError::Index(_) => StatusCode::BAD_GATEWAY,
    };
    tracing::warn!(error = %e, "pipeline failed");
    error_response(status, &e.to_string())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
