use serde::Deserialize;
use actix_web::{get, web, HttpResponse, Responder, Scope};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use common::detection::utils::image_size::ImageSize;
use crate::viewer::viewer::ViewerOrchestrator;
use crate::web::utils::response::OperationStatus;
use crate::viewer::utils::render_error::RenderError;

pub fn initialize() -> Scope {
    web::scope("/detection")
        .service(overlay)
        .service(crop)
}

#[derive(Deserialize)]
struct OverlayQuery {
    display_width: Option<u32>,
    display_height: Option<u32>,
}

#[get("/overlay")]
async fn overlay(orchestrator: web::Data<ViewerOrchestrator>, query: web::Query<OverlayQuery>) -> impl Responder {
    let displayed = match (query.display_width, query.display_height) {
        (Some(width), Some(height)) => Some(ImageSize::new(width, height)),
        _ => None,
    };
    HttpResponse::Ok().json(orchestrator.overlay(displayed).await)
}

#[get("/crop/{index}")]
async fn crop(orchestrator: web::Data<ViewerOrchestrator>, index: web::Path<usize>) -> impl Responder {
    match orchestrator.crop(index.into_inner()).await {
        Ok(export) => {
            let content_disposition = ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(export.file_name)],
            };
            HttpResponse::Ok()
                .content_type("image/png")
                .insert_header(content_disposition)
                .body(export.png)
        },
        Err(err @ RenderError::ImageNotLoaded) => HttpResponse::Conflict().json(OperationStatus::failure(err)),
        Err(err @ RenderError::DetectionNotFound(_)) => HttpResponse::NotFound().json(OperationStatus::failure(err)),
        Err(err @ RenderError::InvalidBoundingBox) => HttpResponse::UnprocessableEntity().json(OperationStatus::failure(err)),
        Err(err @ RenderError::EncodeError(_)) => HttpResponse::InternalServerError().json(OperationStatus::failure(err)),
    }
}
