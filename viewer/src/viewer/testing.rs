use std::io::Cursor;
use std::time::Duration;
use std::sync::{Arc, Mutex};
use std::collections::VecDeque;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use common::detection::utils::detection::Detection;
use common::detection::utils::bounding_box::BoundingBox;
use crate::storage::KeyValueStore;
use crate::storage::memory_store::MemoryStore;
use crate::viewer::orchestrator::Orchestrator;
use crate::viewer::domain_memory::DomainMemory;
use crate::viewer::viewer::ViewerOrchestrator;
use crate::viewer::detection_client::DetectionService;
use crate::viewer::utils::selected_file::SelectedFile;
use crate::viewer::utils::detection_error::DetectionError;
use crate::viewer::utils::detection_request::DetectionRequest;

type Reply = (Duration, Result<Vec<Vec<Detection>>, DetectionError>);

/// Plays back scripted replies in call order and records every request.
#[derive(Clone, Default)]
pub struct ScriptedService {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    pub requests: Arc<Mutex<Vec<DetectionRequest>>>,
    pub timeouts: Arc<Mutex<Option<(Duration, Duration)>>>,
}

impl ScriptedService {
    pub fn reply(self, delay_ms: u64, result: Result<Vec<Vec<Detection>>, DetectionError>) -> Self {
        self.replies.lock().unwrap().push_back((Duration::from_millis(delay_ms), result));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl DetectionService for ScriptedService {
    async fn detect(&self, request: DetectionRequest) -> Result<Vec<Vec<Detection>>, DetectionError> {
        self.requests.lock().unwrap().push(request);
        let (delay, result) = self.replies.lock().unwrap().pop_front().unwrap_or((Duration::ZERO, Ok(Vec::new())));
        tokio::time::sleep(delay).await;
        result
    }

    async fn set_timeouts(&self, request_timeout: Duration, connect_timeout: Duration) -> Result<(), DetectionError> {
        *self.timeouts.lock().unwrap() = Some((request_timeout, connect_timeout));
        Ok(())
    }
}

pub fn detection(class_name: &str, confidence: f64) -> Detection {
    Detection {
        bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        class_name: class_name.to_string(),
        confidence,
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn image_file(width: u32, height: u32) -> SelectedFile {
    SelectedFile::new("harbor.png", "image/png", png_bytes(width, height))
}

/// Orchestrator of the same type the web console serves, backed by scripted replies.
pub async fn viewer_orchestrator(service: ScriptedService) -> ViewerOrchestrator {
    let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::default());
    let memory = DomainMemory::load(store, "http://127.0.0.1:8000").await;
    let service: Box<dyn DetectionService> = Box::new(service);
    Orchestrator::new(service, memory, 0.5)
}
