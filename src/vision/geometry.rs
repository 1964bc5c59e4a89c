//! Rectangle normalization and click-point geometry
//!
//! Screen regions are written in the settings file either as corner pairs
//! `[x1, y1, x2, y2]` or as origin plus size `[x, y, w, h]`. Everything
//! downstream works on the normalized [`Rect`].

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A raw region descriptor as written in the settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(pub Vec<i32>);

impl Region {
    /// Corner-pair descriptor
    pub fn corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self(vec![x1, y1, x2, y2])
    }

    /// Normalize into a rectangle, see [`normalize`]
    pub fn rect(&self) -> Option<Rect> {
        normalize(&self.0)
    }
}

impl From<[i32; 4]> for Region {
    fn from(values: [i32; 4]) -> Self {
        Self(values.to_vec())
    }
}

/// A normalized rectangle with `x1 < x2` and `y1 < y2`
///
/// The right and bottom edges are exclusive when used for cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    /// Build from an origin and a size
    pub fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x.saturating_add(width),
            y2: y.saturating_add(height),
        }
    }

    pub fn width(&self) -> i32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> i32 {
        self.y2.saturating_sub(self.y1)
    }

    /// Zero or negative area
    pub fn is_degenerate(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// Integer center, rounded towards the origin
    pub fn center(&self) -> (i32, i32) {
        (self.x1 + self.width() / 2, self.y1 + self.height() / 2)
    }

    /// Clamp both corners into a `width` x `height` frame.
    ///
    /// The top-left corner is clamped to `[0, dim - 1]`, the bottom-right
    /// corner to `[0, dim]`. The result may be degenerate.
    pub fn clamp_to(&self, width: u32, height: u32) -> Rect {
        let w = width as i32;
        let h = height as i32;
        Rect {
            x1: self.x1.clamp(0, (w - 1).max(0)),
            y1: self.y1.clamp(0, (h - 1).max(0)),
            x2: self.x2.clamp(0, w),
            y2: self.y2.clamp(0, h),
        }
    }

    /// Shrink every side inwards by `margin_fraction` of the width/height
    pub fn shrink(&self, margin_fraction: f32) -> Rect {
        let margin_x = (margin_fraction * self.width() as f32) as i32;
        let margin_y = (margin_fraction * self.height() as f32) as i32;
        Rect {
            x1: self.x1.saturating_add(margin_x),
            y1: self.y1.saturating_add(margin_y),
            x2: self.x2.saturating_sub(margin_x),
            y2: self.y2.saturating_sub(margin_y),
        }
    }

    /// Whether a point lies inside the rectangle, edges included
    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.x1..=self.x2).contains(&x) && (self.y1..=self.y2).contains(&y)
    }
}

/// Normalize a region descriptor into corner form.
///
/// Returns `None` when fewer than four values are supplied. When the third
/// and fourth values are not strictly greater than the first and second the
/// quad is read as `[x, y, w, h]`; a size that still yields an empty
/// rectangle is rejected.
pub fn normalize(values: &[i32]) -> Option<Rect> {
    let &[x1, y1, x2, y2] = values.get(..4)? else {
        return None;
    };

    let rect = if x2 <= x1 || y2 <= y1 {
        Rect::from_origin_size(x1, y1, x2, y2)
    } else {
        Rect { x1, y1, x2, y2 }
    };

    if rect.is_degenerate() {
        return None;
    }
    Some(rect)
}

/// Pick a random click point inside `rect`, away from its edges.
///
/// The rectangle is shrunk by `margin_fraction` on each side. If nothing is
/// left the exact center is returned, otherwise a uniformly sampled point of
/// the shrunken rectangle.
pub fn safe_random_point<R: Rng + ?Sized>(
    rect: Rect,
    margin_fraction: f32,
    rng: &mut R,
) -> (i32, i32) {
    let safe = rect.shrink(margin_fraction);
    if safe.is_degenerate() {
        return rect.center();
    }

    (
        rng.gen_range(safe.x1..=safe.x2),
        rng.gen_range(safe.y1..=safe.y2),
    )
}
