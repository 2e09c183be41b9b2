use serde::Serialize;
use common::detection::utils::detection::Detection;
use common::detection::utils::image_size::ImageSize;
use crate::viewer::utils::detection_error::*;
use crate::viewer::utils::request_phase::RequestPhase;
use crate::viewer::utils::selected_file::SelectedFile;
use crate::viewer::utils::request_result::RequestResult;
use crate::viewer::utils::detection_request::DetectionRequest;

pub const MIN_THRESHOLD: f64 = 0.1;
pub const MAX_THRESHOLD: f64 = 1.0;
pub const DEFAULT_THRESHOLD: f64 = 0.5;
const THRESHOLD_STEPS_PER_UNIT: f64 = 20.0;

pub struct SessionState {
    pub file: Option<SelectedFile>,
    pub threshold: f64,
    pub service_address: String,
    pub detections: Vec<Detection>,
    pub loading: bool,
    pub error_message: String,
    pub phase: RequestPhase,
}

#[derive(Serialize, Debug, Clone)]
pub struct SessionSnapshot {
    pub file_name: Option<String>,
    pub preview_url: Option<String>,
    pub natural_size: Option<ImageSize>,
    pub threshold: f64,
    pub service_address: String,
    pub known_addresses: Vec<String>,
    pub detections: Vec<Detection>,
    pub loading: bool,
    pub error_message: String,
    pub phase: RequestPhase,
}

/// Clamps into `[0.1, 1.0]` and snaps to the 0.05 grid of the range control.
pub fn normalize_threshold(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let clamped = value.clamp(MIN_THRESHOLD, MAX_THRESHOLD);
    Some((clamped * THRESHOLD_STEPS_PER_UNIT).round() / THRESHOLD_STEPS_PER_UNIT)
}

impl SessionState {
    pub fn new(service_address: String, threshold: f64) -> Self {
        Self {
            file: None,
            threshold: normalize_threshold(threshold).unwrap_or(DEFAULT_THRESHOLD),
            service_address,
            detections: Vec::new(),
            loading: false,
            error_message: String::new(),
            phase: RequestPhase::Idle,
        }
    }

    pub fn select_file(&mut self, file: SelectedFile) {
        self.file = Some(file);
        self.detections.clear();
        self.error_message.clear();
    }

    pub fn set_threshold(&mut self, value: f64) -> Result<f64, DetectionError> {
        let threshold = normalize_threshold(value)
            .ok_or_else(|| DetectionError::Validation(INVALID_THRESHOLD.to_string()))?;
        self.threshold = threshold;
        Ok(threshold)
    }

    pub fn set_service_address(&mut self, address: &str) -> String {
        self.service_address = address.trim().to_string();
        self.service_address.clone()
    }

    /// Validates and moves to `Requesting`. On failure the state is left for `fail`.
    pub fn prepare_request(&mut self) -> Result<DetectionRequest, DetectionError> {
        self.phase = RequestPhase::Validating;
        if self.service_address.is_empty() {
            return Err(DetectionError::Validation(EMPTY_ADDRESS.to_string()));
        }
        let file = self.file.as_ref()
            .ok_or_else(|| DetectionError::Validation(NO_IMAGE_SELECTED.to_string()))?;
        let request = DetectionRequest {
            address: self.service_address.clone(),
            threshold: self.threshold,
            file_name: file.name.clone(),
            mime: file.mime.clone(),
            bytes: file.bytes.clone(),
        };
        self.loading = true;
        self.phase = RequestPhase::Requesting;
        Ok(request)
    }

    /// Only the first batch is consumed, the client always submits a single file.
    pub fn complete(&mut self, batches: Vec<Vec<Detection>>) -> RequestResult {
        self.loading = false;
        self.phase = RequestPhase::Success;
        self.detections = batches.into_iter().next().unwrap_or_default();
        if self.detections.is_empty() {
            self.error_message = EMPTY_RESULT_NOTICE.to_string();
            RequestResult::Empty
        } else {
            self.error_message.clear();
            RequestResult::Detected(self.detections.len())
        }
    }

    pub fn fail(&mut self, err: &DetectionError) {
        self.loading = false;
        self.phase = RequestPhase::from(err);
        self.detections.clear();
        self.error_message = err.to_string();
    }

    pub fn snapshot(&self, known_addresses: Vec<String>) -> SessionSnapshot {
        SessionSnapshot {
            file_name: self.file.as_ref().map(|file| file.name.clone()),
            preview_url: self.file.as_ref().map(SelectedFile::preview_url),
            natural_size: self.file.as_ref().and_then(SelectedFile::natural_size),
            threshold: self.threshold,
            service_address: self.service_address.clone(),
            known_addresses,
            detections: self.detections.clone(),
            loading: self.loading,
            error_message: self.error_message.clone(),
            phase: self.phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::detection::utils::bounding_box::BoundingBox;

    fn seal() -> Detection {
        Detection {
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            class_name: "seal".to_string(),
            confidence: 0.92,
        }
    }

    #[test]
    fn threshold_is_clamped_and_snapped() {
        assert_eq!(normalize_threshold(0.5), Some(0.5));
        assert_eq!(normalize_threshold(0.57), Some(0.55));
        assert_eq!(normalize_threshold(0.0), Some(0.1));
        assert_eq!(normalize_threshold(3.0), Some(1.0));
        assert_eq!(normalize_threshold(f64::NAN), None);
        assert_eq!(format!("{}", normalize_threshold(0.35).unwrap()), "0.35");
    }

    #[test]
    fn empty_address_fails_validation() {
        let mut session = SessionState::new(String::new(), 0.5);
        session.select_file(SelectedFile::new("a.png", "image/png", Vec::new()));
        let err = session.prepare_request().unwrap_err();
        assert_eq!(err, DetectionError::Validation(EMPTY_ADDRESS.to_string()));
        assert!(!session.loading);
        session.fail(&err);
        assert_eq!(session.phase, RequestPhase::ValidationError);
        assert_eq!(session.error_message, EMPTY_ADDRESS);
    }

    #[test]
    fn missing_file_fails_validation() {
        let mut session = SessionState::new("http://127.0.0.1:8000".to_string(), 0.5);
        let err = session.prepare_request().unwrap_err();
        assert_eq!(err, DetectionError::Validation(NO_IMAGE_SELECTED.to_string()));
    }

    #[test]
    fn empty_outer_array_sets_notice() {
        let mut session = SessionState::new("http://127.0.0.1:8000".to_string(), 0.5);
        session.loading = true;
        assert_eq!(session.complete(Vec::new()), RequestResult::Empty);
        assert!(session.detections.is_empty());
        assert_eq!(session.error_message, EMPTY_RESULT_NOTICE);
        assert_eq!(session.phase, RequestPhase::Success);
        assert!(!session.loading);
    }

    #[test]
    fn first_batch_becomes_detections() {
        let mut session = SessionState::new("http://127.0.0.1:8000".to_string(), 0.5);
        session.error_message = "stale".to_string();
        let result = session.complete(vec![vec![seal()], vec![seal(), seal()]]);
        assert_eq!(result, RequestResult::Detected(1));
        assert_eq!(session.detections, vec![seal()]);
        assert!(session.error_message.is_empty());
    }

    #[test]
    fn selecting_file_clears_previous_results() {
        let mut session = SessionState::new("http://127.0.0.1:8000".to_string(), 0.5);
        session.complete(vec![vec![seal()]]);
        session.error_message = "old".to_string();
        session.select_file(SelectedFile::new("b.png", "image/png", Vec::new()));
        assert!(session.detections.is_empty());
        assert!(session.error_message.is_empty());
        assert_eq!(session.snapshot(Vec::new()).file_name.as_deref(), Some("b.png"));
    }
}
