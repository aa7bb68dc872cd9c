/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Typed geometry shared across the rendering pipeline.
//!
//! All layout, paint and compositor coordinates live in `CssPixel` space: one
//! unit per CSS pixel at a 1.0 device-pixel ratio.

use euclid::default::{Point2D, Rect, Size2D, Vector2D};

/// Unit marker for coordinates expressed in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CssPixel {}

pub type PixelRect = Rect<f32>;
pub type PixelPoint = Point2D<f32>;
pub type PixelSize = Size2D<f32>;
pub type PixelVector = Vector2D<f32>;

/// Builds a rect from the same `(x, y, width, height)` shape used throughout
/// the layout and display-list code.
pub fn rect(x: f32, y: f32, width: f32, height: f32) -> PixelRect {
    PixelRect::new(PixelPoint::new(x, y), PixelSize::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_constructs_expected_bounds() {
        let r = rect(1.0, 2.0, 3.0, 4.0);
        assert_eq!(r.origin.x, 1.0);
        assert_eq!(r.max_x(), 4.0);
        assert_eq!(r.max_y(), 6.0);
    }
}
