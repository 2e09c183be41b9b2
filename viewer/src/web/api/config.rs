use crate::utils::config::Config;
use crate::viewer::viewer::ViewerOrchestrator;
use crate::web::utils::response::OperationStatus;
use actix_web::{get, post, web, HttpResponse, Responder, Scope};

pub fn initialize() -> Scope {
    web::scope("/config")
        .service(get_config)
        .service(update_config)
}

#[get("/get")]
async fn get_config() -> impl Responder {
    web::Json(Config::now().await)
}

/// `storage_path` takes effect on the next start. The bind port and retry duration are read
/// on each bind attempt.
#[post("/update")]
async fn update_config(orchestrator: web::Data<ViewerOrchestrator>, config: web::Json<Config>) -> impl Responder {
    let config = config.into_inner();
    if !Config::validate(&config) {
        return HttpResponse::BadRequest().json(OperationStatus::failure("Invalid configuration."));
    }
    if let Err(err) = orchestrator.apply_config(&config).await {
        return HttpResponse::InternalServerError().json(OperationStatus::failure(err.to_string()));
    }
    Config::update(config).await;
    HttpResponse::Ok().json(OperationStatus::new(true, None))
}
