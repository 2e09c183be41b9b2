use std::io::Cursor;
use serde::Serialize;
use image::{imageops, DynamicImage, ImageFormat, RgbaImage};
use common::detection::utils::detection::Detection;
use common::detection::utils::image_size::ImageSize;
use common::detection::utils::bounding_box::BoundingBox;
use common::detection::utils::overlay_rect::OverlayRect;
use crate::viewer::utils::crop_export::CropExport;
use crate::viewer::utils::render_error::RenderError;

/// Upper bound on crop canvas pixels, 64 megapixels or 256 MiB of RGBA.
pub const MAX_CROP_PIXELS: u64 = 1 << 26;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub index: usize,
    pub class_name: String,
    pub confidence: f64,
    pub rect: OverlayRect,
}

/// Maps `bbox` from natural-image pixels to displayed-image pixels.
/// Returns the empty rectangle while either size is unknown.
pub fn compute_overlay_rect(bbox: &BoundingBox, displayed: Option<ImageSize>, natural: Option<ImageSize>) -> OverlayRect {
    let (displayed, natural) = match (displayed, natural) {
        (Some(displayed), Some(natural)) if !displayed.is_empty() && !natural.is_empty() => (displayed, natural),
        _ => return OverlayRect::default(),
    };
    let scale_x = displayed.width as f64 / natural.width as f64;
    let scale_y = displayed.height as f64 / natural.height as f64;
    OverlayRect {
        left: bbox.x1 * scale_x,
        top: bbox.y1 * scale_y,
        width: bbox.width() * scale_x,
        height: bbox.height() * scale_y,
    }
}

pub fn overlay_boxes(detections: &[Detection], displayed: Option<ImageSize>, natural: Option<ImageSize>) -> Vec<OverlayBox> {
    detections.iter()
        .enumerate()
        .map(|(index, detection)| OverlayBox {
            index,
            class_name: detection.class_name.clone(),
            confidence: detection.confidence,
            rect: compute_overlay_rect(&detection.bbox, displayed, natural),
        })
        .collect()
}

/// `harbor.sample.png` with index 2 becomes `harbor_2.png`.
pub fn crop_file_name(file_name: &str, index: usize) -> String {
    let base = file_name.split('.').next().unwrap_or_default();
    let base = if base.is_empty() { "crop" } else { base };
    format!("{base}_{index}.png")
}

/// Copies `bbox` out of the full-resolution image onto a canvas of exactly the box size.
/// Canvas pixels outside the source stay transparent.
pub fn export_crop(bbox: &BoundingBox, source: Option<&DynamicImage>, file_name: &str, index: usize) -> Result<CropExport, RenderError> {
    let source = source.ok_or(RenderError::ImageNotLoaded)?;
    if !bbox.is_valid() {
        return Err(RenderError::InvalidBoundingBox);
    }
    let (x1, y1) = (bbox.x1.round() as i64, bbox.y1.round() as i64);
    let (x2, y2) = (bbox.x2.round() as i64, bbox.y2.round() as i64);
    if x2 <= x1 || y2 <= y1 {
        return Err(RenderError::InvalidBoundingBox);
    }
    let width = x2.checked_sub(x1)
        .and_then(|width| u32::try_from(width).ok())
        .ok_or(RenderError::InvalidBoundingBox)?;
    let height = y2.checked_sub(y1)
        .and_then(|height| u32::try_from(height).ok())
        .ok_or(RenderError::InvalidBoundingBox)?;
    if width as u64 * height as u64 > MAX_CROP_PIXELS {
        return Err(RenderError::InvalidBoundingBox);
    }
    let mut canvas = RgbaImage::new(width, height);

    let left = x1.max(0);
    let top = y1.max(0);
    let right = x2.min(source.width() as i64);
    let bottom = y2.min(source.height() as i64);
    if right > left && bottom > top {
        let region = source.crop_imm(left as u32, top as u32, (right - left) as u32, (bottom - top) as u32).to_rgba8();
        imageops::replace(&mut canvas, &region, left - x1, top - y1);
    }

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|err| RenderError::EncodeError(err.to_string()))?;
    Ok(CropExport {
        file_name: crop_file_name(file_name, index),
        width,
        height,
        png,
    })
}
