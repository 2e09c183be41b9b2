#[derive(Debug, Clone)]
pub struct CropExport {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}
