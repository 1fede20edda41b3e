use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State},
    http::{
        header::{CONTENT_TYPE, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde_json::json;

use crate::{
    config::Config,
    error::{AppError, UploadError},
    flash::{clear_cookie, FlashSigner},
    model::{Classifier, DiseaseTable, RandomClassifier},
    pages,
    result::resolve,
    upload::{extension_of, is_stored_name, persist, stored_name, validate_filename, UploadedImage},
};

pub const FILE_FIELD: &str = "crop_image";

pub struct AppState {
    pub table: DiseaseTable,
    pub classifier: Arc<dyn Classifier>,
    pub upload_dir: PathBuf,
    pub signer: FlashSigner,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        AppState::with_classifier(config, Arc::new(RandomClassifier::default()))
    }

    pub fn with_classifier(config: &Config, classifier: Arc<dyn Classifier>) -> Self {
        AppState {
            table: DiseaseTable::builtin(),
            classifier,
            upload_dir: config.upload_dir.clone(),
            signer: FlashSigner::new(&config.secret_key),
        }
    }
}

pub fn router(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/about", get(about))
        .route("/upload", get(upload_page))
        .route("/analyze", post(analyze))
        .route("/result/:filename/:disease", get(result_page))
        .route("/community", get(community))
        .route("/contact", get(contact))
        .route("/static/uploads/:filename", get(uploaded_file))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .with_state(Arc::new(state))
}

async fn index() -> Html<String> {
    Html(pages::index())
}

async fn about() -> Html<String> {
    Html(pages::about())
}

async fn community() -> Html<String> {
    Html(pages::community())
}

async fn contact() -> Html<String> {
    Html(pages::contact())
}

async fn upload_page(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let flashes = state.signer.take(&headers);
    let page = Html(pages::upload(&flashes));
    if flashes.is_empty() {
        page.into_response()
    } else {
        ([(SET_COOKIE, clear_cookie())], page).into_response()
    }
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    // A body that is not multipart/form-data carries no file at all.
    let outcome = match multipart {
        Ok(multipart) => accept_upload(&state, multipart).await,
        Err(rejection) => {
            tracing::debug!(%rejection, "analyze request is not multipart");
            Err(UploadError::MissingFile.into())
        }
    };
    match outcome {
        Ok((image, key)) => {
            Redirect::to(&format!("/result/{}/{}", image.stored_name, key)).into_response()
        }
        Err(err) => err.into_response_with(&state.signer),
    }
}

/// Validates and stores the `crop_image` part, then asks the classifier for a key.
async fn accept_upload(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<(UploadedImage, String), AppError> {
    let (original_name, extension, bytes) = loop {
        let Some(field) = multipart.next_field().await? else {
            return Err(UploadError::MissingFile.into());
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // A part without a filename is a plain form value, not a file.
        let Some(name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let extension = validate_filename(Some(name.as_str()))?;
        break (name, extension, field.bytes().await?);
    };

    let stored = stored_name(&original_name, Local::now().naive_local());
    let image = persist(&state.upload_dir, &original_name, stored, extension, &bytes).await?;
    let key = state.classifier.classify(&image);

    tracing::info!(
        original_name = %image.original_name,
        stored_name = %image.stored_name,
        size = image.size,
        disease = %key,
        "stored upload"
    );
    Ok((image, key))
}

async fn result_page(
    State(state): State<Arc<AppState>>,
    Path((filename, disease)): Path<(String, String)>,
) -> Html<String> {
    let view = resolve(&state.table, &filename, &disease);
    Html(pages::result(&view))
}

fn content_type(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

async fn uploaded_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Response {
    if !is_stored_name(&filename) {
        return StatusCode::NOT_FOUND.into_response();
    }
    match tokio::fs::read(state.upload_dir.join(&filename)).await {
        Ok(bytes) => ([(CONTENT_TYPE, content_type(&filename))], bytes).into_response(),
        Err(err) if err.kind() == ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            tracing::error!(error = %err, filename = %filename, "failed to read upload");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type("a.PNG"), "image/png");
        assert_eq!(content_type("a.jpeg"), "image/jpeg");
        assert_eq!(content_type("a.gif"), "image/gif");
        assert_eq!(content_type("a"), "application/octet-stream");
    }
}
