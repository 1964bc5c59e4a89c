//! Vision and image processing module
//!
//! Handles frame intake, region geometry, template matching, game state
//! classification and OCR of battle screen fields.

pub mod capture;
pub mod geometry;
pub mod matching;
pub mod ocr;
pub mod recognition;
pub mod region;

pub use capture::{Frame, FrameSource, ScreenCapture, ScreenshotReplay};
pub use geometry::{normalize, safe_random_point, Rect, Region};
pub use matching::{NccMatcher, TemplateKind, TemplateLibrary, TemplateMatch, TemplateMatcher};
pub use ocr::{FieldKey, FieldReader, OcrError, OcrMode, TesseractCli, TextRecognizer};
pub use recognition::StateClassifier;
pub use region::crop_safe;

/// Vision system errors
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("Failed to capture frame: {0}")]
    Capture(String),
    #[error("No frame captured yet")]
    NoFrame,
    #[error("Invalid frame data")]
    InvalidFrameData,
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),
}
