//! Axum REST API handlers

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::FormRejection,
        DefaultBodyLimit, Form, Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use maud::Markup;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::service::{ClassifyError, ClassifyService, ImageUpload, ValidatedUpload};
use crate::service::upload::UPLOAD_URL_PREFIX;
use crate::storage::ApiKeyStorage;

use super::dto::*;
use super::pages;

type ApiError = (StatusCode, Json<ErrorResponse>);

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Application state shared across handlers
pub struct AppState<S: ApiKeyStorage> {
    pub service: Arc<ClassifyService>,
    pub storage: Arc<S>,
    pub body_limit_bytes: usize,
    pub start_time: Instant,
}

/// Create the REST API router
pub fn create_rest_router<S: ApiKeyStorage>(state: Arc<AppState<S>>) -> Router {
    let uploads = ServeDir::new(state.service.uploads().dir());

    Router::new()
        // Classification
        .route("/", get(index_handler).post(classify_form_handler::<S>))
        .route("/predict", post(predict_handler::<S>))
        // API keys
        .route("/get_api_keys", get(get_api_keys_handler::<S>))
        .route(
            "/update_api_key",
            get(update_api_key_form_handler).post(update_api_key_handler::<S>),
        )
        // System endpoints
        .route("/health", get(health_handler::<S>))
        // Uploaded images, referenced by the result page
        .nest_service(UPLOAD_URL_PREFIX, uploads)
        // Middleware
        .layer(DefaultBodyLimit::max(state.body_limit_bytes))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Pull the `file` field out of a multipart body.
/// A field without a filename is not a file, mirroring browser form semantics.
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<ImageUpload>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field.bytes().await?.to_vec();
        return Ok(Some(ImageUpload { file_name, data }));
    }
    Ok(None)
}

fn classify_error_response(e: ClassifyError) -> ApiError {
    if e.is_client_error() {
        debug!("Rejected upload: {}", e);
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string())))
    } else {
        error!("Classification failed: {}", e);
        internal_error()
    }
}

/// Server faults are logged in full and reported without detail
fn internal_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(INTERNAL_ERROR_MESSAGE)),
    )
}

/// Upload form
async fn index_handler() -> Markup {
    pages::index_page(None, None)
}

/// Classify an upload from the HTML form and re-render the page
async fn classify_form_handler<S: ApiKeyStorage>(
    State(state): State<Arc<AppState<S>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let upload = match multipart {
        Ok(mut multipart) => match read_file_field(&mut multipart).await {
            Ok(upload) => upload,
            Err(e) => {
                debug!("Form upload could not be read: {}", e);
                return (e.status(), pages::index_page(None, Some(&e.body_text()))).into_response();
            }
        },
        Err(_) => None,
    };

    // Only a missing or disallowed file goes back to the empty form
    let upload = match ValidatedUpload::validate(upload) {
        Ok(upload) => upload,
        Err(e) => {
            debug!("Form upload rejected: {}", e);
            return Redirect::to("/").into_response();
        }
    };

    match state.service.classify_upload(upload).await {
        Ok(result) => pages::index_page(Some(&result), None).into_response(),
        Err(e) => {
            let (status, Json(body)) = classify_error_response(e);
            (status, pages::index_page(None, Some(&body.error))).into_response()
        }
    }
}

/// Classify an upload and answer with JSON
async fn predict_handler<S: ApiKeyStorage>(
    State(state): State<Arc<AppState<S>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let upload = match multipart {
        Ok(mut multipart) => read_file_field(&mut multipart)
            .await
            .map_err(|e| (e.status(), Json(ErrorResponse::new(e.body_text()))))?,
        Err(_) => None,
    };

    let upload = ValidatedUpload::validate(upload)
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))))?;

    let result = state
        .service
        .classify_upload(upload)
        .await
        .map_err(classify_error_response)?;

    Ok(Json(PredictResponse {
        prediction: result.prediction.label,
        confidence: result.prediction.confidence,
    }))
}

/// All API keys as a flat name -> value object
async fn get_api_keys_handler<S: ApiKeyStorage>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    let keys = state.storage.list_keys().await.map_err(|e| {
        error!("Failed to list API keys: {:#}", e);
        internal_error()
    })?;

    Ok(Json(
        keys.into_iter()
            .map(|k| (k.key_name, k.key_value))
            .collect(),
    ))
}

async fn update_api_key_form_handler() -> Markup {
    pages::update_api_key_page()
}

/// Replace the value of an existing API key
async fn update_api_key_handler<S: ApiKeyStorage>(
    State(state): State<Arc<AppState<S>>>,
    form: Result<Form<UpdateApiKeyForm>, FormRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let form = form.map(|Form(form)| form).unwrap_or_default();

    let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
    let (Some(key_name), Some(key_value)) = (non_empty(form.key_name), non_empty(form.key_value))
    else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Key name and new key value are required")),
        ));
    };

    let storage_error = |e: anyhow::Error| {
        error!("Failed to update API key {}: {:#}", key_name, e);
        internal_error()
    };

    let existing = state.storage.get_key(&key_name).await.map_err(storage_error)?;
    let updated = match existing {
        Some(_) => state
            .storage
            .update_key(&key_name, &key_value)
            .await
            .map_err(storage_error)?,
        None => false,
    };

    if !updated {
        return Err((StatusCode::NOT_FOUND, Json(ErrorResponse::new("API key not found"))));
    }

    info!("API key {} updated", key_name);
    Ok(Json(MessageResponse::new(format!(
        "API key {} updated successfully",
        key_name
    ))))
}

/// Health check
async fn health_handler<S: ApiKeyStorage>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    let health = state.service.health();

    Json(HealthResponse {
        healthy: health.healthy,
        version: health.version,
        classifier: health.classifier,
        labels: health.labels,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}


