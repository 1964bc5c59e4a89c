//! Region extraction from captured frames

use image::RgbaImage;

use super::geometry::{Rect, Region};

/// Clamp `rect` into the frame, or `None` if nothing of it is visible
pub fn clamp_rect(frame: &RgbaImage, rect: Rect) -> Option<Rect> {
    let (width, height) = frame.dimensions();
    let clamped = rect.clamp_to(width, height);
    (!clamped.is_degenerate()).then_some(clamped)
}

/// Crop a normalized rectangle, clamped to the frame bounds
pub fn crop_rect(frame: &RgbaImage, rect: Rect) -> Option<RgbaImage> {
    let clamped = clamp_rect(frame, rect)?;
    let sub = image::imageops::crop_imm(
        frame,
        clamped.x1 as u32,
        clamped.y1 as u32,
        clamped.width() as u32,
        clamped.height() as u32,
    );
    Some(sub.to_image())
}

/// Crop a configured region out of a frame.
///
/// An unusable descriptor or a rectangle that falls entirely outside the
/// frame yields a copy of the whole frame.
pub fn crop_safe(frame: &RgbaImage, region: &Region) -> RgbaImage {
    region
        .rect()
        .and_then(|rect| crop_rect(frame, rect))
        .unwrap_or_else(|| frame.clone())
}

/// Offset of a region's visible part inside the frame, used to map match
/// locations found in a crop back to frame coordinates
pub fn crop_origin(frame: &RgbaImage, region: &Region) -> (u32, u32) {
    region
        .rect()
        .and_then(|rect| clamp_rect(frame, rect))
        .map(|r| (r.x1 as u32, r.y1 as u32))
        .unwrap_or((0, 0))
}
