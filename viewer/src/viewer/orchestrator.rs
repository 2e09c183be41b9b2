use std::time::Duration;
use tokio::task::spawn_blocking;
use tokio::sync::{RwLock, RwLockWriteGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use common::detection::utils::image_size::ImageSize;
use crate::utils::logging::*;
use crate::utils::config::Config;
use crate::storage::KeyValueStore;
use crate::viewer::domain_memory::DomainMemory;
use crate::viewer::detection_client::DetectionService;
use crate::viewer::renderer::{self, OverlayBox};
use crate::viewer::utils::crop_export::CropExport;
use crate::viewer::utils::render_error::RenderError;
use crate::viewer::utils::selected_file::SelectedFile;
use crate::viewer::utils::request_result::RequestResult;
use crate::viewer::utils::detection_error::{DetectionError, INVALID_THRESHOLD};
use crate::viewer::utils::session_state::{normalize_threshold, SessionSnapshot, SessionState};

/// Owns the session and drives detection requests against the remote service.
///
/// Every trigger takes a new generation id. A response is applied only while its id
/// is still the latest, so a slow stale request can never overwrite a newer result.
pub struct Orchestrator<S: DetectionService, K: KeyValueStore> {
    service: S,
    memory: RwLock<DomainMemory<K>>,
    session: RwLock<SessionState>,
    generation: AtomicU64,
}

impl<S: DetectionService, K: KeyValueStore> Orchestrator<S, K> {
    pub fn new(service: S, memory: DomainMemory<K>, threshold: f64) -> Self {
        let session = SessionState::new(memory.last_used().to_string(), threshold);
        Self {
            service,
            memory: RwLock::new(memory),
            session: RwLock::new(session),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn select_file(&self, file: SelectedFile) -> Result<RequestResult, DetectionError> {
        if file.image.is_none() {
            logging_warning!(DetectionEntry::ImageDecodeError(file.name.clone()));
        }
        logging_information!(DetectionEntry::FileSelected(file.name.clone()));
        let mut session = self.session.write().await;
        session.select_file(file);
        self.start(session).await
    }

    pub async fn set_threshold(&self, value: f64) -> Result<RequestResult, DetectionError> {
        let mut session = self.session.write().await;
        session.set_threshold(value)?;
        self.retrigger(session).await
    }

    pub async fn set_service_address(&self, address: &str) -> Result<RequestResult, DetectionError> {
        let mut session = self.session.write().await;
        let address = session.set_service_address(address);
        let persisted = self.memory.write().await.set_last_used(&address);
        if let Err(err) = persisted {
            logging_error!(DetectionEntry::PersistError(err.to_string()));
        }
        self.retrigger(session).await
    }

    /// Pushes updated configuration into the running session. Timeouts apply to the next
    /// request, the default address joins the known addresses, and a session without a
    /// selected file takes the new default threshold and, when it has none, the default address.
    pub async fn apply_config(&self, config: &Config) -> Result<(), DetectionError> {
        let threshold = normalize_threshold(config.default_threshold)
            .ok_or_else(|| DetectionError::Validation(INVALID_THRESHOLD.to_string()))?;
        self.service.set_timeouts(Duration::from_secs(config.request_timeout), Duration::from_secs(config.connect_timeout)).await?;
        let address = config.default_service_address.trim();
        self.remember(address).await;
        let mut session = self.session.write().await;
        if session.file.is_none() {
            session.threshold = threshold;
            if session.service_address.is_empty() {
                session.set_service_address(address);
            }
        }
        Ok(())
    }

    async fn retrigger(&self, session: RwLockWriteGuard<'_, SessionState>) -> Result<RequestResult, DetectionError> {
        if session.file.is_some() {
            self.start(session).await
        } else {
            Ok(RequestResult::Skipped)
        }
    }

    pub async fn run_detection(&self) -> Result<RequestResult, DetectionError> {
        let session = self.session.write().await;
        self.start(session).await
    }

    /// Takes the generation id while the session change that caused the trigger is still locked.
    async fn start(&self, mut session: RwLockWriteGuard<'_, SessionState>) -> Result<RequestResult, DetectionError> {
        let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let request = match session.prepare_request() {
            Ok(request) => request,
            Err(err) => {
                session.fail(&err);
                drop(session);
                logging_warning!(DetectionEntry::RequestFailed(id, err.to_string()));
                return Err(err);
            }
        };
        drop(session);
        self.remember(&request.address).await;
        logging_information!(DetectionEntry::RequestStart(id, request.address.clone()));

        let outcome = self.service.detect(request).await;

        let mut session = self.session.write().await;
        if id != self.generation.load(Ordering::SeqCst) {
            drop(session);
            logging_notice!(DetectionEntry::RequestSuperseded(id));
            return Ok(RequestResult::Superseded);
        }
        match outcome {
            Ok(batches) => {
                let result = session.complete(batches);
                drop(session);
                match result {
                    RequestResult::Detected(count) => logging_information!(DetectionEntry::RequestSuccess(id, count)),
                    _ => logging_information!(DetectionEntry::RequestEmpty(id)),
                }
                Ok(result)
            },
            Err(err) => {
                session.fail(&err);
                drop(session);
                logging_error!(DetectionEntry::RequestFailed(id, err.to_string()));
                Err(err)
            },
        }
    }

    async fn remember(&self, address: &str) {
        let remembered = self.memory.write().await.remember(address);
        match remembered {
            Ok(true) => logging_information!(DetectionEntry::AddressRemembered(address.to_string())),
            Ok(false) => {},
            Err(err) => logging_error!(DetectionEntry::PersistError(err.to_string())),
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let known_addresses = self.known_addresses().await;
        self.session.read().await.snapshot(known_addresses)
    }

    pub async fn known_addresses(&self) -> Vec<String> {
        self.memory.read().await.known_addresses().to_vec()
    }

    pub async fn last_used_address(&self) -> String {
        self.memory.read().await.last_used().to_string()
    }

    /// Bytes and MIME type of the selected image.
    pub async fn preview(&self) -> Option<(String, Vec<u8>)> {
        let session = self.session.read().await;
        session.file.as_ref().map(|file| (file.mime.clone(), file.bytes.clone()))
    }

    pub async fn overlay(&self, displayed: Option<ImageSize>) -> Vec<OverlayBox> {
        let session = self.session.read().await;
        let natural = session.file.as_ref().and_then(SelectedFile::natural_size);
        renderer::overlay_boxes(&session.detections, displayed, natural)
    }

    pub async fn crop(&self, index: usize) -> Result<CropExport, RenderError> {
        let (bbox, image, file_name) = {
            let session = self.session.read().await;
            let detection = session.detections.get(index).ok_or(RenderError::DetectionNotFound(index))?;
            let file = session.file.as_ref().ok_or(RenderError::ImageNotLoaded)?;
            (detection.bbox, file.image.clone(), file.name.clone())
        };
        let export = spawn_blocking(move || renderer::export_crop(&bbox, image.as_deref(), &file_name, index))
            .await
            .map_err(|err| RenderError::EncodeError(err.to_string()))??;
        logging_information!(DetectionEntry::CropExported(export.file_name.clone()));
        Ok(export)
    }
}
