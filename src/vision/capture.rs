//! Frame intake
//!
//! The capture device itself lives outside this crate. Frames arrive either
//! as raw RGBA buffers pushed into [`ScreenCapture`] or as screenshots on
//! disk replayed by [`ScreenshotReplay`].

use std::path::{Path, PathBuf};

use image::{ImageBuffer, RgbaImage};

use super::VisionError;

/// One captured screen image. Never mutated after capture.
pub type Frame = RgbaImage;

/// Anything that can hand out the current screen contents
pub trait FrameSource {
    /// Capture the current frame
    fn capture(&mut self) -> Result<Frame, VisionError>;
}

/// Latest-frame holder fed by an external capture device
#[derive(Debug, Default)]
pub struct ScreenCapture {
    latest: Option<Frame>,
}

impl ScreenCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held frame with a raw RGBA buffer of `width` x `height`
    pub fn update(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<(), VisionError> {
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(VisionError::InvalidFrameData);
        }
        let frame = ImageBuffer::from_raw(width, height, rgba.to_vec())
            .ok_or(VisionError::InvalidFrameData)?;
        self.latest = Some(frame);
        Ok(())
    }
}

impl FrameSource for ScreenCapture {
    fn capture(&mut self) -> Result<Frame, VisionError> {
        self.latest.clone().ok_or(VisionError::NoFrame)
    }
}

/// Replays screenshots from a directory in file-name order, wrapping around
pub struct ScreenshotReplay {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ScreenshotReplay {
    /// Collect all PNG/JPEG files of `dir`
    pub fn open(dir: &Path) -> Result<Self, VisionError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                .unwrap_or(false);
            if is_image {
                paths.push(path);
            }
        }

        if paths.is_empty() {
            return Err(VisionError::Capture(format!(
                "no screenshots found in {}",
                dir.display()
            )));
        }
        paths.sort();

        log::info!("Replaying {} screenshots from {}", paths.len(), dir.display());
        Ok(Self { paths, next: 0 })
    }

    /// Number of screenshots in the replay set
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ScreenshotReplay {
    fn capture(&mut self) -> Result<Frame, VisionError> {
        let path = &self.paths[self.next % self.paths.len()];
        self.next = (self.next + 1) % self.paths.len();

        log::debug!("Replaying frame {}", path.display());
        Ok(image::open(path)?.to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_pushed_frame_is_captured() {
        let mut capture = ScreenCapture::new();
        assert!(matches!(capture.capture(), Err(VisionError::NoFrame)));

        capture.update(&[255u8; 10 * 8 * 4], 10, 8).unwrap();
        assert_eq!(capture.capture().unwrap().dimensions(), (10, 8));
    }

    #[test]
    fn test_wrong_buffer_size_keeps_previous_frame() {
        let mut capture = ScreenCapture::new();
        capture.update(&[0u8; 4 * 4 * 4], 4, 4).unwrap();

        let result = capture.update(&[255u8; 100], 10, 10);
        assert!(matches!(result, Err(VisionError::InvalidFrameData)));
        assert_eq!(capture.capture().unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn test_replay_cycles_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, width) in [("b.png", 20u32), ("a.png", 10u32)] {
            let img: RgbaImage = ImageBuffer::from_pixel(width, 5, Rgba([1, 2, 3, 255]));
            img.save(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut replay = ScreenshotReplay::open(dir.path()).unwrap();
        assert_eq!(replay.len(), 2);
        assert_eq!(replay.capture().unwrap().width(), 10);
        assert_eq!(replay.capture().unwrap().width(), 20);
        assert_eq!(replay.capture().unwrap().width(), 10);
    }

    #[test]
    fn test_replay_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ScreenshotReplay::open(dir.path()).is_err());
    }
}
