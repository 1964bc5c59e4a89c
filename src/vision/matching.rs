//! Template matching
//!
//! Matching is a capability behind [`TemplateMatcher`] so the perception
//! layer can be driven by deterministic fakes. The production matcher computes
//! a correlation coefficient from `imageproc` correlation and integral images.

use std::collections::HashMap;
use std::path::Path;

use image::{ImageBuffer, Luma, RgbaImage};
use imageproc::integral_image::{integral_image, integral_squared_image};
use imageproc::template_matching::{find_extremes, match_template, MatchTemplateMethod};
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use crate::config::settings::AssetSettings;

/// Reference images the bot knows how to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Shiny sparkle marker
    Shiny,
    /// Dialogue indicator in the overworld
    Talk,
    /// Quest "go to" button
    Goto,
    /// Battle menu: fight
    Fight,
    /// Battle menu: items / bag
    Items,
    /// Battle menu: creature switch
    Roster,
    /// Battle menu: run
    Run,
}

impl TemplateKind {
    /// The four battle menu buttons
    pub const BATTLE_BUTTONS: [TemplateKind; 4] = [
        TemplateKind::Fight,
        TemplateKind::Items,
        TemplateKind::Roster,
        TemplateKind::Run,
    ];

    pub const ALL: [TemplateKind; 7] = [
        TemplateKind::Shiny,
        TemplateKind::Talk,
        TemplateKind::Goto,
        TemplateKind::Fight,
        TemplateKind::Items,
        TemplateKind::Roster,
        TemplateKind::Run,
    ];
}

/// A loaded reference image
#[derive(Debug, Clone)]
pub struct Template {
    pub kind: TemplateKind,
    pub image: RgbaImage,
}

/// Best alignment of a template inside a haystack image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateMatch {
    /// Similarity of the best location, higher is better
    pub score: f32,
    /// Top-left corner of the match inside the haystack
    pub x: u32,
    pub y: u32,
    /// Template dimensions
    pub width: u32,
    pub height: u32,
}

impl TemplateMatch {
    /// Bounding box of the match, shifted by the haystack's offset
    pub fn bounds(&self, offset: (u32, u32)) -> Rect {
        Rect::from_origin_size(
            (self.x + offset.0) as i32,
            (self.y + offset.1) as i32,
            self.width as i32,
            self.height as i32,
        )
    }
}

/// Locates a template inside an image
pub trait TemplateMatcher {
    /// Best match of `template` in `haystack`, or `None` when no comparison
    /// is possible (e.g. the template is larger than the haystack)
    fn best_match(&self, haystack: &RgbaImage, template: &Template) -> Option<TemplateMatch>;
}

/// Zero-mean normalized cross-correlation on grayscale images.
///
/// Scores lie in `[-1, 1]`. Windows or templates without any contrast score
/// 0, so a flat screen never matches a textured template.
#[derive(Debug, Default, Clone, Copy)]
pub struct NccMatcher;

impl TemplateMatcher for NccMatcher {
    fn best_match(&self, haystack: &RgbaImage, template: &Template) -> Option<TemplateMatch> {
        let (hw, hh) = haystack.dimensions();
        let (tw, th) = template.image.dimensions();
        if tw == 0 || th == 0 || tw > hw || th > hh {
            return None;
        }

        let haystack_gray = image::imageops::grayscale(haystack);
        let template_gray = image::imageops::grayscale(&template.image);

        // Raw sum of products, corrected for both means below
        let products = match_template(
            &haystack_gray,
            &template_gray,
            MatchTemplateMethod::CrossCorrelation,
        );
        let sums = integral_image::<_, u64>(&haystack_gray);
        let squares = integral_squared_image::<_, u64>(&haystack_gray);

        let n = f64::from(tw) * f64::from(th);
        let (t_sum, t_sq) = template_gray.pixels().fold((0.0, 0.0), |(sum, sq), p| {
            let v = f64::from(p[0]);
            (sum + v, sq + v * v)
        });
        let t_var = t_sq - t_sum * t_sum / n;

        let scores: ImageBuffer<Luma<f32>, Vec<f32>> =
            ImageBuffer::from_fn(products.width(), products.height(), |x, y| {
                let w_sum = window_sum(&sums, x, y, tw, th);
                let w_var = window_sum(&squares, x, y, tw, th) - w_sum * w_sum / n;
                let denom = (t_var * w_var).sqrt();
                if t_var <= f64::EPSILON || w_var <= f64::EPSILON || denom <= f64::EPSILON {
                    return Luma([0.0]);
                }
                let cross = f64::from(products.get_pixel(x, y)[0]) - t_sum * w_sum / n;
                Luma([(cross / denom).clamp(-1.0, 1.0) as f32])
            });

        let extremes = find_extremes(&scores);
        let (x, y) = extremes.max_value_location;

        Some(TemplateMatch {
            score: extremes.max_value,
            x,
            y,
            width: tw,
            height: th,
        })
    }
}

/// Sum of the `w` x `h` window at `(x, y)` from a zero-padded integral image
fn window_sum(
    integral: &ImageBuffer<Luma<u64>, Vec<u64>>,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
) -> f64 {
    let at = |x: u32, y: u32| integral.get_pixel(x, y)[0] as f64;
    at(x + w, y + h) - at(x, y + h) - at(x + w, y) + at(x, y)
}

/// Templates loaded at startup plus the matcher used to search them.
///
/// A template whose file is missing is simply absent; every lookup against
/// it reports "no match".
pub struct TemplateLibrary {
    templates: HashMap<TemplateKind, Template>,
    matcher: Box<dyn TemplateMatcher>,
}

impl TemplateLibrary {
    /// Create an empty library
    pub fn new(matcher: Box<dyn TemplateMatcher>) -> Self {
        Self {
            templates: HashMap::new(),
            matcher,
        }
    }

    /// Load every configured template file that exists
    pub fn load(assets: &AssetSettings, matcher: Box<dyn TemplateMatcher>) -> Self {
        let mut library = Self::new(matcher);
        let dir = Path::new(&assets.templates_dir);

        for kind in TemplateKind::ALL {
            let path = dir.join(assets.file_name(kind));
            if !path.exists() {
                log::warn!("Template {:?} not found at {}", kind, path.display());
                continue;
            }
            match image::open(&path) {
                Ok(img) => library.insert(kind, img.to_rgba8()),
                Err(e) => log::warn!("Failed to load template {}: {}", path.display(), e),
            }
        }

        log::info!("Loaded {} templates", library.templates.len());
        library
    }

    /// Register a template image
    pub fn insert(&mut self, kind: TemplateKind, image: RgbaImage) {
        self.templates.insert(kind, Template { kind, image });
    }

    /// Whether a template of this kind is loaded
    pub fn has(&self, kind: TemplateKind) -> bool {
        self.templates.contains_key(&kind)
    }

    /// Best match of a template in `haystack`
    pub fn find(&self, kind: TemplateKind, haystack: &RgbaImage) -> Option<TemplateMatch> {
        let template = self.templates.get(&kind)?;
        self.matcher.best_match(haystack, template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use image::Rgba;

    use crate::config::settings::DetectionSettings;
    use crate::game::state::GameState;
    use crate::vision::recognition::StateClassifier;

    fn noise(width: u32, height: u32) -> RgbaImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            let mut h = x.wrapping_mul(0x9E37_79B9) ^ y.wrapping_mul(0x85EB_CA6B);
            h ^= h >> 13;
            h = h.wrapping_mul(0xC2B2_AE35);
            h ^= h >> 16;
            let v = (h & 0xFF) as u8;
            Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn test_ncc_finds_embedded_patch() {
        let frame = noise(64, 48);
        let patch = image::imageops::crop_imm(&frame, 21, 13, 12, 9).to_image();
        let template = Template {
            kind: TemplateKind::Fight,
            image: patch,
        };

        let found = NccMatcher.best_match(&frame, &template).unwrap();
        assert_eq!((found.x, found.y), (21, 13));
        assert_eq!((found.width, found.height), (12, 9));
        assert!(found.score > 0.99);
    }

    #[test]
    fn test_ncc_ignores_brightness_and_contrast() {
        let frame = noise(64, 48);
        let mut patch = image::imageops::crop_imm(&frame, 30, 5, 16, 16).to_image();
        for p in patch.pixels_mut() {
            let v = p[0] / 2 + 60;
            *p = Rgba([v, v, v, 255]);
        }
        let template = Template {
            kind: TemplateKind::Goto,
            image: patch,
        };

        let found = NccMatcher.best_match(&frame, &template).unwrap();
        assert_eq!((found.x, found.y), (30, 5));
        assert!(found.score > 0.99);
    }

    #[test]
    fn test_flat_frame_never_matches() {
        let frame: RgbaImage = ImageBuffer::from_pixel(320, 240, Rgba([128, 128, 128, 255]));
        let template = Template {
            kind: TemplateKind::Shiny,
            image: noise(24, 24),
        };

        let found = NccMatcher.best_match(&frame, &template).unwrap();
        assert!(found.score.abs() < 0.05, "score {}", found.score);

        let mut library = TemplateLibrary::new(Box::new(NccMatcher));
        library.insert(TemplateKind::Shiny, noise(24, 24));
        let classifier = StateClassifier::new(Rc::new(library), DetectionSettings::default());
        assert_eq!(classifier.classify(&frame), GameState::Exploring);
    }

    #[test]
    fn test_ncc_oversized_template() {
        let frame = noise(10, 10);
        let template = Template {
            kind: TemplateKind::Shiny,
            image: noise(20, 5),
        };
        assert!(NccMatcher.best_match(&frame, &template).is_none());
    }

    #[test]
    fn test_missing_template_never_matches() {
        let library = TemplateLibrary::new(Box::new(NccMatcher));
        assert!(!library.has(TemplateKind::Goto));
        assert!(library.find(TemplateKind::Goto, &noise(32, 32)).is_none());
    }

    #[test]
    fn test_load_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        noise(8, 8).save(dir.path().join("run.png")).unwrap();

        let assets = AssetSettings {
            templates_dir: dir.path().to_string_lossy().to_string(),
            ..Default::default()
        };
        let library = TemplateLibrary::load(&assets, Box::new(NccMatcher));

        assert!(library.has(TemplateKind::Run));
        assert!(!library.has(TemplateKind::Shiny));
    }

    #[test]
    fn test_match_bounds_offset() {
        let m = TemplateMatch {
            score: 0.9,
            x: 5,
            y: 6,
            width: 10,
            height: 4,
        };
        let rect = m.bounds((100, 200));
        assert_eq!((rect.x1, rect.y1, rect.x2, rect.y2), (105, 206, 115, 210));
    }
}
