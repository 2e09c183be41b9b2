use crate::viewer::viewer::Viewer;

pub mod storage;
pub mod utils;
pub mod viewer;
pub mod web;

#[actix_web::main]
async fn main() {
    Viewer::run().await;
    Viewer::terminate().await;
}
