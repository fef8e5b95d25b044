// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core value types shared by the engine, the security layer, and the CLI.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in PDF user-space points (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from two opposite corners in any order.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// Smallest rectangle containing every point, or `None` for no points.
    pub fn bounding(points: &[(f32, f32)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        Some(Self::from_corners(x0, y0, x1, y1))
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// True when the rectangles overlap with a non-zero area.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.top() <= self.top()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_corners(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.top().max(other.top()),
        )
    }

    /// Grow the rectangle by `amount` points on every side.
    pub fn inflate(&self, amount: f32) -> Rect {
        Rect::new(
            self.x - amount,
            self.y - amount,
            self.width + 2.0 * amount,
            self.height + 2.0 * amount,
        )
    }
}

/// An RGB colour with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl RgbColor {
    pub const BLACK: RgbColor = RgbColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: RgbColor = RgbColor {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };
    pub const GRAY: RgbColor = RgbColor {
        r: 0.5,
        g: 0.5,
        b: 0.5,
    };

    /// Create a colour, clamping each component into `[0, 1]`.
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: clamp_unit(r),
            g: clamp_unit(g),
            b: clamp_unit(b),
        }
    }

    /// Parse `#RRGGBB` or `RRGGBB`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .ok()
                .map(|v| v as f32 / 255.0)
        };
        Some(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Clamp into `[0, 1]`, mapping NaN to 1.0.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        1.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One serialized result handed back to the caller for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl OutputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_intersection_and_containment() {
        let page = Rect::new(0.0, 0.0, 612.0, 792.0);
        let box_a = Rect::new(100.0, 100.0, 50.0, 20.0);
        let box_b = Rect::new(140.0, 110.0, 50.0, 20.0);
        let far = Rect::new(400.0, 400.0, 10.0, 10.0);

        assert!(page.contains(&box_a));
        assert!(box_a.intersects(&box_b));
        assert!(!box_a.intersects(&far));
        // Touching edges do not count as overlap.
        assert!(!box_a.intersects(&Rect::new(150.0, 100.0, 10.0, 10.0)));
    }

    #[test]
    fn bounding_box_of_points() {
        let rect = Rect::bounding(&[(10.0, 5.0), (-2.0, 8.0), (4.0, -1.0)]).unwrap();
        assert_eq!(rect, Rect::new(-2.0, -1.0, 12.0, 9.0));
        assert!(Rect::bounding(&[]).is_none());
    }

    #[test]
    fn hex_colours() {
        assert_eq!(RgbColor::from_hex("#000000"), Some(RgbColor::BLACK));
        assert_eq!(RgbColor::from_hex("FFFFFF"), Some(RgbColor::WHITE));
        assert!(RgbColor::from_hex("#12345").is_none());
        assert!(RgbColor::from_hex("zzzzzz").is_none());
    }

    #[test]
    fn colour_components_are_clamped() {
        let c = RgbColor::new(1.5, -0.2, f32::NAN);
        assert_eq!(c, RgbColor::new(1.0, 0.0, 1.0));
    }
}
