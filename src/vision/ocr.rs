//! Text reading from screen regions
//!
//! The raw recognizer is a capability ([`TextRecognizer`]); the crate ships
//! a Tesseract command-line implementation. On top of it [`FieldReader`]
//! crops a configured region, cleans up the background and applies the
//! name/move cleanup rules.

use std::path::PathBuf;
use std::process::Command;

use image::{GrayImage, Luma, RgbaImage};

use super::capture::Frame;
use super::geometry::Region;
use super::region::crop_rect;
use crate::config::settings::{OcrSettings, RegionSettings};

/// Page segmentation hint for the recognizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrMode {
    /// A single line of text
    Line,
    /// A uniform block of text, possibly several lines
    Block,
}

/// Raw optical character recognition
pub trait TextRecognizer {
    /// Recognize text in an already preprocessed image
    fn recognize_text(&self, image: &GrayImage, mode: OcrMode) -> Result<String, OcrError>;

    /// Preprocessing for light text on a variable-color background
    fn normalize_dynamic_background_text(&self, image: &RgbaImage) -> GrayImage {
        normalize_dynamic_background(image)
    }
}

/// Binarize a text crop into dark text on a white background.
///
/// The split level comes from Otsu's method. Whichever side of the split
/// covers fewer pixels is taken to be the text.
pub fn normalize_dynamic_background(image: &RgbaImage) -> GrayImage {
    let gray = image::imageops::grayscale(image);
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray;
    }

    let level = imageproc::contrast::otsu_level(&gray);
    let bright = gray.pixels().filter(|p| p[0] > level).count();
    let text_is_bright = bright * 2 < (width * height) as usize;

    GrayImage::from_fn(width, height, |x, y| {
        let is_bright = gray.get_pixel(x, y)[0] > level;
        if is_bright == text_is_bright {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

/// Recognizer backed by the `tesseract` executable
pub struct TesseractCli {
    executable: PathBuf,
    language: String,
}

impl TesseractCli {
    pub fn new(settings: &OcrSettings) -> Self {
        Self {
            executable: PathBuf::from(&settings.tesseract_path),
            language: settings.language.clone(),
        }
    }
}

impl TextRecognizer for TesseractCli {
    fn recognize_text(&self, image: &GrayImage, mode: OcrMode) -> Result<String, OcrError> {
        let psm = match mode {
            OcrMode::Line => "7",
            OcrMode::Block => "6",
        };

        let temp_input = tempfile::Builder::new().suffix(".png").tempfile()?;
        image
            .save(temp_input.path())
            .map_err(|e| OcrError::ProcessingError(e.to_string()))?;

        let output = Command::new(&self.executable)
            .arg(temp_input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(psm)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::EngineFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Clean a creature name read by OCR.
///
/// Keeps the first whitespace-delimited token, drops gender glyphs and any
/// punctuation hanging off either end.
pub fn clean_name(raw: &str) -> String {
    let Some(token) = raw.split_whitespace().next() else {
        return String::new();
    };

    token
        .chars()
        .filter(|c| !matches!(c, '♂' | '♀'))
        .collect::<String>()
        .trim_matches(|c: char| c.is_ascii_punctuation() && c != '-')
        .to_string()
}

/// Clean a move label read by OCR.
///
/// Move names may contain spaces. Everything but letters, spaces and
/// hyphens is dropped, whitespace is collapsed and one-letter fragments
/// (usually border noise) are discarded.
pub fn clean_move_name(raw: &str) -> String {
    let letters: String = raw
        .chars()
        .map(|c| {
            if c.is_alphabetic() || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();

    letters
        .split_whitespace()
        .map(|w| w.trim_matches('-'))
        .filter(|w| w.chars().count() > 1)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Logical text fields on the battle screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    EnemyName,
    PlayerName,
    /// Move button, 0-based slot index
    MoveSlot(usize),
}

impl FieldKey {
    fn mode(&self) -> OcrMode {
        match self {
            FieldKey::EnemyName | FieldKey::PlayerName => OcrMode::Line,
            FieldKey::MoveSlot(_) => OcrMode::Block,
        }
    }
}

/// Reads cleaned text out of configured screen regions
pub struct FieldReader {
    recognizer: Box<dyn TextRecognizer>,
    regions: RegionSettings,
}

impl FieldReader {
    pub fn new(recognizer: Box<dyn TextRecognizer>, regions: RegionSettings) -> Self {
        Self {
            recognizer,
            regions,
        }
    }

    fn region_for(&self, key: FieldKey) -> Option<&Region> {
        match key {
            FieldKey::EnemyName => self.regions.enemy_name.as_ref(),
            FieldKey::PlayerName => self.regions.player_name.as_ref(),
            FieldKey::MoveSlot(slot) => self.regions.moves.get(slot)?.as_ref(),
        }
    }

    /// Read one field.
    ///
    /// An unconfigured region or an empty recognition result yields an empty
    /// string. Only a failure of the recognizer itself is an error.
    pub fn read_field(&self, frame: &Frame, key: FieldKey) -> Result<String, OcrError> {
        let Some(raw) = self.read_raw(frame, key)? else {
            return Ok(String::new());
        };

        let cleaned = match key {
            FieldKey::EnemyName | FieldKey::PlayerName => clean_name(&raw),
            FieldKey::MoveSlot(_) => clean_move_name(&raw),
        };
        log::debug!("OCR {:?}: raw {:?} -> {:?}", key, raw.trim(), cleaned);
        Ok(cleaned)
    }

    fn read_raw(&self, frame: &Frame, key: FieldKey) -> Result<Option<String>, OcrError> {
        let Some(rect) = self.region_for(key).and_then(|r| r.rect()) else {
            log::debug!("No region configured for {:?}", key);
            return Ok(None);
        };
        let Some(crop) = crop_rect(frame, rect) else {
            return Ok(None);
        };

        let processed = self.recognizer.normalize_dynamic_background_text(&crop);
        let text = self.recognizer.recognize_text(&processed, key.mode())?;
        Ok(Some(text))
    }

    /// Read the creature names listed in the switch menu, top to bottom
    pub fn read_roster(&self, frame: &Frame) -> Result<Vec<String>, OcrError> {
        let Some(rect) = self
            .regions
            .switch_menu
            .as_ref()
            .and_then(|m| m.container.rect())
        else {
            return Ok(Vec::new());
        };
        let Some(crop) = crop_rect(frame, rect) else {
            return Ok(Vec::new());
        };

        let processed = self.recognizer.normalize_dynamic_background_text(&crop);
        let text = self.recognizer.recognize_text(&processed, OcrMode::Block)?;

        Ok(text
            .lines()
            .map(clean_name)
            .filter(|name| !name.is_empty())
            .collect())
    }
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("Failed to process image: {0}")]
    ProcessingError(String),
    #[error("OCR engine failed: {0}")]
    EngineFailed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
