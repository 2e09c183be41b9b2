pub mod bounding_box;
pub mod detection;
pub mod image_size;
pub mod overlay_rect;
