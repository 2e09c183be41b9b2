use serde::{Deserialize, Serialize};
use crate::detection::utils::bounding_box::BoundingBox;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_name: String,
    pub confidence: f64,
}
