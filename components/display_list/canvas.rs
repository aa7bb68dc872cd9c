/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use fonts::Font;
use geometry::PixelRect;

/// The four `saveLayer` blend modes the painter wires up; any other CSS
/// `mix-blend-mode` value parses to `None` (no blend mode set) rather than
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Multiply,
    Difference,
    DestinationIn,
    SourceOver,
}

impl BlendMode {
    /// Parses a CSS `mix-blend-mode` keyword. Unrecognized keywords yield
    /// `None`.
    pub fn parse(value: &str) -> Option<BlendMode> {
        match value {
            "multiply" => Some(BlendMode::Multiply),
            "difference" => Some(BlendMode::Difference),
            "destination-in" => Some(BlendMode::DestinationIn),
            "source-over" => Some(BlendMode::SourceOver),
            _ => None,
        }
    }
}

/// A GPU-backed (or software-backed) drawing surface sized in device pixels,
/// RGBA8 premultiplied. Owned by whichever crate allocates it (the
/// compositor, for composited layers); this crate only needs to draw into
/// and blit one.
pub trait Surface {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    /// Every concrete `Surface` also implements `Canvas`, drawing directly
    /// into its own pixel buffer; this just reborrows `self` as the trait
    /// object the raster pass executes paint commands against.
    fn as_canvas(&mut self) -> &mut dyn Canvas;
    /// Lets a concrete backend (e.g. `ports/shell`'s software `Canvas`)
    /// recover its own type from a `&dyn Surface` to blit one surface's
    /// pixels into another — trait upcasting to `dyn Any` isn't available
    /// at this workspace's MSRV, so each backend threads it through
    /// explicitly instead.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// The immediate-mode graphics backend every draw command and visual effect
/// executes against — a generalization of Skia's `Canvas`.
pub trait Canvas {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, tx: f32, ty: f32);
    fn clip_rect(&mut self, rect: PixelRect);

    fn draw_string(&mut self, rect: PixelRect, text: &str, font: &dyn Font, color: &str);
    fn draw_rect(&mut self, rect: PixelRect, color: &str);
    fn draw_rrect(&mut self, rect: PixelRect, radius: f32, color: &str);
    fn draw_line(&mut self, rect: PixelRect, thickness: f32, color: &str);
    fn draw_outline(&mut self, rect: PixelRect, thickness: f32, color: &str);

    /// Pushes a layer that composites its contents with `opacity` and
    /// `blend_mode` when it is popped by the matching `restore`.
    fn save_layer(&mut self, opacity: f32, blend_mode: Option<BlendMode>);

    fn create_surface(&self, width: i32, height: i32) -> Box<dyn Surface>;
    fn draw_surface(&mut self, surface: &dyn Surface, x: f32, y: f32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_blend_modes() {
        assert_eq!(BlendMode::parse("multiply"), Some(BlendMode::Multiply));
        assert_eq!(BlendMode::parse("difference"), Some(BlendMode::Difference));
        assert_eq!(BlendMode::parse("destination-in"), Some(BlendMode::DestinationIn));
    }

    #[test]
    fn unknown_blend_mode_parses_to_none() {
        assert_eq!(BlendMode::parse("hue"), None);
    }
}
