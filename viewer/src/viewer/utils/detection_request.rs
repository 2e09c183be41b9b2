/// Everything one outbound detection call needs, detached from the session lock.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub address: String,
    pub threshold: f64,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}
