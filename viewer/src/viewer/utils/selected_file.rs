use uuid::Uuid;
use std::sync::Arc;
use image::DynamicImage;
use common::detection::utils::image_size::ImageSize;

#[derive(Clone)]
pub struct SelectedFile {
    pub id: Uuid,
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    /// `None` when the bytes could not be decoded, the equivalent of an image that never loaded.
    pub image: Option<Arc<DynamicImage>>,
}

impl SelectedFile {
    /// Decodes the image eagerly, call it off the async workers.
    pub fn new<T: Into<String>, U: Into<String>>(name: T, mime: U, bytes: Vec<u8>) -> Self {
        let image = image::load_from_memory(&bytes).ok().map(Arc::new);
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            mime: mime.into(),
            bytes,
            image,
        }
    }

    pub fn natural_size(&self) -> Option<ImageSize> {
        self.image.as_ref().map(|image| ImageSize::new(image.width(), image.height()))
    }

    pub fn preview_url(&self) -> String {
        format!("/session/image?id={}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use image::{ImageFormat, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_natural_size() {
        let file = SelectedFile::new("harbor.png", "image/png", png_bytes(64, 48));
        assert_eq!(file.natural_size(), Some(ImageSize::new(64, 48)));
        assert!(file.preview_url().ends_with(&file.id.to_string()));
    }

    #[test]
    fn undecodable_bytes_leave_image_unloaded() {
        let file = SelectedFile::new("broken.png", "image/png", b"not an image".to_vec());
        assert!(file.image.is_none());
        assert_eq!(file.natural_size(), None);
    }
}
