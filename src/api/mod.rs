use actix_files::NamedFile;
use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;
use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use std::sync::Arc;

use crate::auth;
use crate::config::Config;
use crate::images::{ImageError, ImagePipeline};
use crate::models::{ApiResponse, ItemFields, SettingsResponse, VerifyPinRequest};
use crate::store::{validate_title, ItemStore, StoreError};

pub struct AppState {
    pub store: Arc<ItemStore>,
    pub images: Arc<ImagePipeline>,
    pub config: Arc<Config>,
}

// ==================== Health Check ====================

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

// ==================== Settings ====================

pub async fn settings(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success(SettingsResponse {
        title: state.config.title.clone(),
        currency: state.config.currency.clone(),
        currency_symbol: state.config.currency_symbol().to_string(),
        require_pin: state.config.pin.is_some(),
    }))
}

// ==================== Auth ====================

pub async fn verify_pin(
    state: web::Data<AppState>,
    body: web::Json<VerifyPinRequest>,
) -> impl Responder {
    let valid = match state.config.pin.as_deref() {
        None => true,
        Some(pin) => auth::pin_matches(pin, &body.pin),
    };
    if valid {
        HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({ "valid": true })))
    } else {
        HttpResponse::Unauthorized().json(ApiResponse::<()>::error("Invalid PIN"))
    }
}

// ==================== Items ====================

/// Multipart form shared by create and update. All text fields are
/// optional at the transport level; the store enforces the title.
#[derive(Debug, MultipartForm)]
pub struct ItemForm {
    pub title: Option<Text<String>>,
    pub url: Option<Text<String>>,
    pub price: Option<Text<String>>,
    pub note: Option<Text<String>>,
    #[multipart(limit = "25MB")]
    pub image: Option<TempFile>,
}

impl ItemForm {
    fn fields(&self) -> ItemFields {
        ItemFields {
            title: self
                .title
                .as_ref()
                .map(|t| t.0.clone())
                .unwrap_or_default(),
            url: text_or_none(&self.url),
            price: text_or_none(&self.price),
            note: text_or_none(&self.note),
            image: None,
        }
    }

    /// Uploaded bytes, if the form carried a non-empty file part.
    fn upload(&self) -> Option<std::io::Result<Vec<u8>>> {
        let file = self.image.as_ref()?;
        if file.size == 0 {
            return None;
        }
        Some(std::fs::read(file.file.path()))
    }
}

/// Browsers submit untouched optional inputs as empty strings.
fn text_or_none(field: &Option<Text<String>>) -> Option<String> {
    field
        .as_ref()
        .map(|t| t.0.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub async fn list_items(state: web::Data<AppState>) -> impl Responder {
    match state.store.list() {
        Ok(items) => HttpResponse::Ok().json(ApiResponse::success(items)),
        Err(e) => store_error(e),
    }
}

pub async fn create_item(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: MultipartForm<ItemForm>,
) -> impl Responder {
    if !auth::verify_request(&req, &state.config) {
        return unauthorized();
    }

    // Reject undecodable uploads before anything is written.
    let encoded = match form.upload() {
        Some(Ok(bytes)) => match state.images.process(&bytes) {
            Ok(encoded) => Some(encoded),
            Err(e) => return image_error(e),
        },
        Some(Err(e)) => {
            log::error!("failed to read upload: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to read upload"));
        }
        None => None,
    };

    let item = match state.store.create(form.fields()) {
        Ok(item) => item,
        Err(e) => return store_error(e),
    };

    // The image file must exist before its reference lands in the document.
    if let Some(encoded) = encoded {
        let reference = match state.images.save(&encoded, item.id) {
            Ok(reference) => reference,
            Err(e) => return image_error(e),
        };
        return match state.store.attach_image(item.id, &reference) {
            Ok(item) => HttpResponse::Created().json(ApiResponse::success(item)),
            Err(e) => store_error(e),
        };
    }

    HttpResponse::Created().json(ApiResponse::success(item))
}

pub async fn update_item(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    form: MultipartForm<ItemForm>,
) -> impl Responder {
    if !auth::verify_request(&req, &state.config) {
        return unauthorized();
    }

    let id = path.into_inner();
    let mut fields = form.fields();

    // An update that will fail validation must not replace the item's
    // existing image, so the title is checked before any file write.
    if let Err(e) = validate_title(&fields.title) {
        return store_error(e);
    }

    // A new upload is persisted before the document write so the document
    // never references a missing file. If the item turns out not to exist
    // the file is a tolerated orphan.
    match form.upload() {
        Some(Ok(bytes)) => match state.images.store(&bytes, id) {
            Ok(reference) => fields.image = Some(reference),
            Err(e) => return image_error(e),
        },
        Some(Err(e)) => {
            log::error!("failed to read upload: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to read upload"));
        }
        None => {}
    }

    match state.store.update(id, fields) {
        Ok(item) => HttpResponse::Ok().json(ApiResponse::success(item)),
        Err(e) => store_error(e),
    }
}

pub async fn delete_item(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    if !auth::verify_request(&req, &state.config) {
        return unauthorized();
    }

    let id = path.into_inner();
    match state.store.delete(id) {
        Ok(removed) => {
            // Best-effort cleanup: the document write already succeeded.
            if removed {
                state.images.delete(id);
            }
            HttpResponse::Ok().json(ApiResponse::success(
                serde_json::json!({ "deleted": removed }),
            ))
        }
        Err(e) => store_error(e),
    }
}

// ==================== Images ====================

pub async fn get_image(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let filename = path.into_inner();
    if !valid_image_name(&filename) {
        return HttpResponse::NotFound().finish();
    }
    match NamedFile::open_async(state.images.dir().join(&filename)).await {
        Ok(file) => file.into_response(&req),
        Err(_) => HttpResponse::NotFound().finish(),
    }
}

/// Only store-generated names (`<digits>.jpeg`) are servable. Anything
/// else, including traversal attempts, is treated as absent.
fn valid_image_name(name: &str) -> bool {
    match name.strip_suffix(".jpeg") {
        Some(stem) => !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

// ==================== Error mapping ====================

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::<()>::error("PIN required"))
}

fn store_error(e: StoreError) -> HttpResponse {
    match e {
        StoreError::Validation(msg) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(msg))
        }
        StoreError::NotFound(id) => HttpResponse::NotFound()
            .json(ApiResponse::<()>::error(format!("Item {} not found", id))),
        e => {
            log::error!("store failure: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Storage unavailable"))
        }
    }
}

fn image_error(e: ImageError) -> HttpResponse {
    match e {
        ImageError::Invalid(_) => HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("Uploaded file is not a valid image")),
        e => {
            log::error!("image pipeline failure: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to store image"))
        }
    }
}

// ==================== Route Configuration ====================

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(health))
        // Settings + PIN verification (no PIN required)
        .route("/api/settings", web::get().to(settings))
        .route("/api/auth/verify", web::post().to(verify_pin))
        // Items
        .route("/api/items", web::get().to(list_items))
        .route("/api/items", web::post().to(create_item))
        .route("/api/items/{id}", web::put().to(update_item))
        .route("/api/items/{id}", web::delete().to(delete_item))
        // Images
        .route("/api/images/{filename}", web::get().to(get_image));
}
