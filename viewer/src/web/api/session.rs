use serde::Deserialize;
use actix_multipart::Multipart;
use sanitize_filename::sanitize;
use futures::{StreamExt, TryStreamExt};
use actix_web::{get, post, web, HttpResponse, Responder, Scope};
use crate::viewer::viewer::ViewerOrchestrator;
use crate::web::utils::response::OperationStatus;
use crate::viewer::utils::selected_file::SelectedFile;

pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

pub fn initialize() -> Scope {
    web::scope("/session")
        .service(state)
        .service(upload)
        .service(threshold)
        .service(address)
        .service(detect)
        .service(image)
}

#[derive(Deserialize)]
struct ThresholdUpdate {
    threshold: f64,
}

#[derive(Deserialize)]
struct AddressUpdate {
    address: String,
}

#[get("/state")]
async fn state(orchestrator: web::Data<ViewerOrchestrator>) -> impl Responder {
    HttpResponse::Ok().json(orchestrator.snapshot().await)
}

#[post("/upload")]
async fn upload(orchestrator: web::Data<ViewerOrchestrator>, mut payload: Multipart) -> impl Responder {
    let mut upload = None;
    while let Ok(Some(mut field)) = payload.try_next().await {
        let (field_name, file_name) = match field.content_disposition() {
            Some(content_disposition) => (
                content_disposition.get_name().map(str::to_string),
                content_disposition.get_filename().map(sanitize),
            ),
            None => return HttpResponse::BadRequest().json(OperationStatus::failure("Invalid payload.")),
        };
        if field_name.as_deref() != Some("file") {
            continue;
        }
        let file_name = match file_name {
            Some(file_name) if !file_name.is_empty() => file_name,
            _ => return HttpResponse::BadRequest().json(OperationStatus::failure("Invalid filename.")),
        };
        let mime = match field.content_type() {
            Some(mime) if mime.type_() == mime_guess::mime::IMAGE => mime.to_string(),
            _ => match mime_guess::from_path(&file_name).first() {
                Some(mime) if mime.type_() == mime_guess::mime::IMAGE => mime.to_string(),
                _ => return HttpResponse::BadRequest().json(OperationStatus::failure("Only image files are accepted.")),
            },
        };
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(data) if bytes.len() + data.len() > MAX_UPLOAD_BYTES => {
                    return HttpResponse::PayloadTooLarge().json(OperationStatus::failure("Image exceeds the upload limit."));
                },
                Ok(data) => bytes.extend_from_slice(&data),
                Err(_) => return HttpResponse::InternalServerError().json(OperationStatus::new(false, None)),
            }
        }
        upload = Some((file_name, mime, bytes));
    }
    let (file_name, mime, bytes) = match upload {
        Some(upload) => upload,
        None => return HttpResponse::BadRequest().json(OperationStatus::failure("Missing file field.")),
    };
    let file = match web::block(move || SelectedFile::new(file_name, mime, bytes)).await {
        Ok(file) => file,
        Err(_) => return HttpResponse::InternalServerError().json(OperationStatus::new(false, None)),
    };
    let _ = orchestrator.select_file(file).await;
    HttpResponse::Ok().json(orchestrator.snapshot().await)
}

#[post("/threshold")]
async fn threshold(orchestrator: web::Data<ViewerOrchestrator>, update: web::Json<ThresholdUpdate>) -> impl Responder {
    let _ = orchestrator.set_threshold(update.threshold).await;
    HttpResponse::Ok().json(orchestrator.snapshot().await)
}

#[post("/address")]
async fn address(orchestrator: web::Data<ViewerOrchestrator>, update: web::Json<AddressUpdate>) -> impl Responder {
    let _ = orchestrator.set_service_address(&update.address).await;
    HttpResponse::Ok().json(orchestrator.snapshot().await)
}

#[post("/detect")]
async fn detect(orchestrator: web::Data<ViewerOrchestrator>) -> impl Responder {
    let _ = orchestrator.run_detection().await;
    HttpResponse::Ok().json(orchestrator.snapshot().await)
}

#[get("/image")]
async fn image(orchestrator: web::Data<ViewerOrchestrator>) -> impl Responder {
    match orchestrator.preview().await {
        Some((mime, bytes)) => HttpResponse::Ok().content_type(mime).body(bytes),
        None => HttpResponse::NotFound().json(OperationStatus::failure("No image selected.")),
    }
}
