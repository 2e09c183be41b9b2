use serde::Serialize;
use actix_web::{get, web, HttpResponse, Responder, Scope};
use crate::viewer::viewer::ViewerOrchestrator;

pub fn initialize() -> Scope {
    web::scope("/domain")
        .service(list)
}

#[derive(Serialize)]
struct DomainList {
    known_addresses: Vec<String>,
    last_used: String,
}

#[get("/list")]
async fn list(orchestrator: web::Data<ViewerOrchestrator>) -> impl Responder {
    HttpResponse::Ok().json(DomainList {
        known_addresses: orchestrator.known_addresses().await,
        last_used: orchestrator.last_used_address().await,
    })
}
