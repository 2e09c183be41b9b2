use std::time::Duration;
use tokio::time::sleep;
use actix_web::{web, App, HttpServer};
use actix_web::web::route;
use crate::utils::logging::*;
use crate::utils::config::Config;
use crate::storage::KeyValueStore;
use crate::storage::file_store::FileStore;
use crate::storage::memory_store::MemoryStore;
use crate::viewer::orchestrator::Orchestrator;
use crate::viewer::domain_memory::DomainMemory;
use crate::viewer::detection_client::{DetectionService, HttpDetectionService};
use crate::web::api::{config, default, detection, domain, javascript, log, session};

pub type ViewerOrchestrator = Orchestrator<Box<dyn DetectionService>, Box<dyn KeyValueStore>>;

pub struct Viewer;

impl Viewer {
    pub async fn run() {
        logging_information!(SystemEntry::Initializing);
        let config = Config::now().await;
        let store = Self::open_store(&config.storage_path).await;
        let memory = DomainMemory::load(store, &config.default_service_address).await;
        let service = match HttpDetectionService::new(Duration::from_secs(config.request_timeout), Duration::from_secs(config.connect_timeout)) {
            Ok(service) => Box::new(service) as Box<dyn DetectionService>,
            Err(err) => {
                logging_emergency!(NetworkEntry::HttpClientError(err.to_string()));
                return;
            }
        };
        let orchestrator: web::Data<ViewerOrchestrator> = web::Data::new(Orchestrator::new(service, memory, config.default_threshold));
        let http_server = loop {
            let config = Config::now().await;
            let orchestrator = orchestrator.clone();
            let http_server = HttpServer::new(move || {
                App::new()
                    .app_data(orchestrator.clone())
                    .service(config::initialize())
                    .service(detection::initialize())
                    .service(domain::initialize())
                    .service(javascript::initialize())
                    .service(log::initialize())
                    .service(session::initialize())
                    .default_service(route().to(default::default_route))
            })
            .bind(format!("0.0.0.0:{}", config.http_server_bind_port));
            match http_server {
                Ok(http_server) => break http_server,
                Err(err) => {
                    logging_critical!(NetworkEntry::BindPortError(err));
                    sleep(Duration::from_secs(config.bind_retry_duration)).await;
                    continue;
                }
            }
        };
        logging_information!(SystemEntry::WebReady);
        logging_information!(SystemEntry::InitializeComplete);
        logging_information!(SystemEntry::Online);
        if let Err(err) = http_server.run().await {
            logging_emergency!(SystemEntry::WebPanic(err));
        }
    }

    pub async fn terminate() {
        logging_information!(SystemEntry::Terminating);
        logging_information!(SystemEntry::TerminateComplete);
    }

    async fn open_store(storage_path: &str) -> Box<dyn KeyValueStore> {
        if storage_path.is_empty() {
            return Box::new(MemoryStore::default());
        }
        match FileStore::open(storage_path) {
            Ok(store) => Box::new(store),
            Err(err) => {
                logging_error!(SystemEntry::StorageFallback(err.to_string()));
                Box::new(MemoryStore::default())
            }
        }
    }
}
