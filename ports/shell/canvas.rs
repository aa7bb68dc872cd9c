/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! A software implementation of `wisp-display-list`'s `Canvas`/`Surface`
//! traits, backed by a plain `Vec<u32>` of premultiplied ARGB8 pixels. Real
//! text shaping and subpixel glyph positioning are out of scope, so glyphs
//! are drawn as solid blocks at the font's measured advance width rather
//! than rasterized outlines.

use std::cell::Cell;

use display_list::{BlendMode, Canvas, Surface};
use fonts::Font;
use geometry::PixelRect;

#[derive(Clone, Copy)]
struct CanvasState {
    tx: f32,
    ty: f32,
    clip: Option<PixelRect>,
}

impl Default for CanvasState {
    fn default() -> Self {
        CanvasState { tx: 0.0, ty: 0.0, clip: None }
    }
}

/// A layer pushed by `save_layer`: the pixels underneath it (to composite
/// back onto once popped) and the opacity/blend mode to composite with.
struct PendingLayer {
    state: CanvasState,
    opacity: f32,
    blend_mode: Option<BlendMode>,
    under: Vec<u32>,
}

enum StackEntry {
    Plain(CanvasState),
    Layer(PendingLayer),
}

/// A fixed-size pixel buffer that is both a [`Surface`] (something the
/// compositor can raster a layer into and the draw stage can blit) and a
/// [`Canvas`] (something paint commands execute directly against). Every
/// composited layer's surface, and the top-level window framebuffer, is one
/// of these: RGBA8 premultiplied, software-backed rather than GPU-backed.
pub struct RasterSurface {
    width: i32,
    height: i32,
    pixels: Vec<u32>,
    current: Cell<CanvasState>,
    stack: std::cell::RefCell<Vec<StackEntry>>,
}

impl RasterSurface {
    pub fn new(width: i32, height: i32) -> RasterSurface {
        let area = (width.max(0) as usize) * (height.max(0) as usize);
        RasterSurface {
            width,
            height,
            pixels: vec![0; area],
            current: Cell::new(CanvasState::default()),
            stack: std::cell::RefCell::new(Vec::new()),
        }
    }

    /// The raw pixel buffer, premultiplied ARGB8 one `u32` per pixel, row
    /// major. `ports/shell::app` reads this to blit the window's own
    /// `RasterSurface` to the `softbuffer` window surface.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: u32) {
        let Some(i) = self.index(x, y) else { return };
        self.pixels[i] = over(color, self.pixels[i]);
    }

    /// Fills `rect` (already translated into this surface's own pixel
    /// space) with `color`, skipping pixels outside the active clip.
    fn fill_rect(&mut self, rect: PixelRect, color: u32) {
        let clip = self.current.get().clip;
        let x0 = rect.origin.x.floor() as i32;
        let y0 = rect.origin.y.floor() as i32;
        let x1 = rect.max_x().ceil() as i32;
        let y1 = rect.max_y().ceil() as i32;
        for y in y0..y1 {
            for x in x0..x1 {
                if let Some(clip) = clip {
                    if (x as f32) < clip.origin.x
                        || (x as f32) >= clip.max_x()
                        || (y as f32) < clip.origin.y
                        || (y as f32) >= clip.max_y()
                    {
                        continue;
                    }
                }
                self.blend_pixel(x, y, color);
            }
        }
    }

    /// Fills an axis-aligned rounded rect by skipping the four corner
    /// squares outside the quarter-circle radius, good enough to read as
    /// "rounded" without a real arc rasterizer.
    fn fill_rrect(&mut self, rect: PixelRect, radius: f32, color: u32) {
        if radius <= 0.0 {
            self.fill_rect(rect, color);
            return;
        }
        let clip = self.current.get().clip;
        let x0 = rect.origin.x.floor() as i32;
        let y0 = rect.origin.y.floor() as i32;
        let x1 = rect.max_x().ceil() as i32;
        let y1 = rect.max_y().ceil() as i32;
        for y in y0..y1 {
            for x in x0..x1 {
                if let Some(clip) = clip {
                    if (x as f32) < clip.origin.x
                        || (x as f32) >= clip.max_x()
                        || (y as f32) < clip.origin.y
                        || (y as f32) >= clip.max_y()
                    {
                        continue;
                    }
                }
                let cx = (x as f32 + 0.5).clamp(rect.origin.x + radius, rect.max_x() - radius);
                let cy = (y as f32 + 0.5).clamp(rect.origin.y + radius, rect.max_y() - radius);
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= radius * radius + radius {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    fn translated(&self, rect: PixelRect) -> PixelRect {
        let state = self.current.get();
        rect.translate(geometry::PixelVector::new(state.tx, state.ty))
    }
}

impl Surface for RasterSurface {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn as_canvas(&mut self) -> &mut dyn Canvas {
        self
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl Canvas for RasterSurface {
    fn save(&mut self) {
        self.stack.borrow_mut().push(StackEntry::Plain(self.current.get()));
    }

    fn restore(&mut self) {
        match self.stack.borrow_mut().pop() {
            Some(StackEntry::Plain(state)) => self.current.set(state),
            Some(StackEntry::Layer(layer)) => {
                let mut composited = layer.under;
                for (i, pixel) in self.pixels.iter().enumerate() {
                    composited[i] = blend(*pixel, composited[i], layer.opacity, layer.blend_mode);
                }
                self.pixels = composited;
                self.current.set(layer.state);
            }
            None => {}
        }
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        let mut state = self.current.get();
        state.tx += tx;
        state.ty += ty;
        self.current.set(state);
    }

    fn clip_rect(&mut self, rect: PixelRect) {
        let mut state = self.current.get();
        let rect = self.translated(rect);
        state.clip = Some(match state.clip {
            Some(existing) => existing.intersection(&rect).unwrap_or(geometry::rect(0.0, 0.0, 0.0, 0.0)),
            None => rect,
        });
        self.current.set(state);
    }

    fn draw_string(&mut self, rect: PixelRect, text: &str, font: &dyn Font, color: &str) {
        let rect = self.translated(rect);
        let color = parse_color(color);
        let metrics = font.metrics();
        let mut x = rect.origin.x;
        for ch in text.chars() {
            if ch != ' ' {
                let glyph_width = font.measure_text(&ch.to_string()).max(1.0);
                let glyph = geometry::rect(x, rect.origin.y, glyph_width * 0.8, metrics.ascent);
                self.fill_rect(glyph, color);
            }
            x += font.measure_text(&ch.to_string());
        }
    }

    fn draw_rect(&mut self, rect: PixelRect, color: &str) {
        let rect = self.translated(rect);
        self.fill_rect(rect, parse_color(color));
    }

    fn draw_rrect(&mut self, rect: PixelRect, radius: f32, color: &str) {
        let rect = self.translated(rect);
        self.fill_rrect(rect, radius, parse_color(color));
    }

    fn draw_line(&mut self, rect: PixelRect, thickness: f32, color: &str) {
        let rect = self.translated(rect);
        let line = geometry::rect(rect.origin.x, rect.origin.y, thickness.max(1.0), rect.size.height);
        self.fill_rect(line, parse_color(color));
    }

    fn draw_outline(&mut self, rect: PixelRect, thickness: f32, color: &str) {
        let rect = self.translated(rect);
        let t = thickness.max(1.0);
        let color = parse_color(color);
        self.fill_rect(geometry::rect(rect.origin.x, rect.origin.y, rect.size.width, t), color);
        self.fill_rect(geometry::rect(rect.origin.x, rect.max_y() - t, rect.size.width, t), color);
        self.fill_rect(geometry::rect(rect.origin.x, rect.origin.y, t, rect.size.height), color);
        self.fill_rect(geometry::rect(rect.max_x() - t, rect.origin.y, t, rect.size.height), color);
    }

    fn save_layer(&mut self, opacity: f32, blend_mode: Option<BlendMode>) {
        let under = self.pixels.clone();
        self.pixels.iter_mut().for_each(|p| *p = 0);
        self.stack.borrow_mut().push(StackEntry::Layer(PendingLayer {
            state: self.current.get(),
            opacity,
            blend_mode,
            under,
        }));
    }

    fn create_surface(&self, width: i32, height: i32) -> Box<dyn Surface> {
        Box::new(RasterSurface::new(width, height))
    }

    fn draw_surface(&mut self, surface: &dyn Surface, x: f32, y: f32) {
        let Some(raster) = surface.as_any().downcast_ref::<RasterSurface>() else {
            log::warn!("draw_surface given a Surface that isn't a RasterSurface");
            return;
        };
        let state = self.current.get();
        let origin_x = (x + state.tx).round() as i32;
        let origin_y = (y + state.ty).round() as i32;
        for sy in 0..raster.height {
            for sx in 0..raster.width {
                let pixel = raster.pixels[sy as usize * raster.width as usize + sx as usize];
                if pixel != 0 {
                    self.blend_pixel(origin_x + sx, origin_y + sy, pixel);
                }
            }
        }
    }
}

/// Alpha-composites `src` (premultiplied) over `dst` (premultiplied), the
/// default `SourceOver` rule every leaf draw call uses directly.
fn over(src: u32, dst: u32) -> u32 {
    let (sa, sr, sg, sb) = unpack(src);
    if sa == 0 {
        return dst;
    }
    let (_da, dr, dg, db) = unpack(dst);
    let inv = 255 - sa;
    pack(
        255,
        sr as u16 + (dr as u16 * inv as u16 / 255) as u16,
        sg as u16 + (dg as u16 * inv as u16 / 255) as u16,
        sb as u16 + (db as u16 * inv as u16 / 255) as u16,
    )
}

/// Composites a whole `save_layer`'d buffer onto its background, applying
/// `opacity` and `blend_mode`.
fn blend(src: u32, dst: u32, opacity: f32, blend_mode: Option<BlendMode>) -> u32 {
    // `destination-in` keeps the destination (what was already drawn
    // beneath this layer) wherever the layer's own alpha covers it, and
    // erases it elsewhere — the opposite of every other mode, which draws
    // the layer's own color *over* the destination. Mask-style clipping
    // only makes sense with this read-the-destination-back semantics.
    if let Some(BlendMode::DestinationIn) = blend_mode {
        let (sa, _, _, _) = unpack(src);
        let (da, dr, dg, db) = unpack(dst);
        let fraction = (sa as f32 / 255.0) * opacity;
        return pack(
            (da as f32 * fraction) as u8,
            (dr as f32 * fraction) as u16,
            (dg as f32 * fraction) as u16,
            (db as f32 * fraction) as u16,
        );
    }

    let (sa, sr, sg, sb) = unpack(src);
    if sa == 0 {
        return dst;
    }
    let (_da, dr, dg, db) = unpack(dst);

    let (sr, sg, sb) = match blend_mode {
        Some(BlendMode::Multiply) => (
            (sr as u32 * dr as u32 / 255) as u8,
            (sg as u32 * dg as u32 / 255) as u8,
            (sb as u32 * db as u32 / 255) as u8,
        ),
        Some(BlendMode::Difference) => (
            (sr as i16 - dr as i16).unsigned_abs() as u8,
            (sg as i16 - dg as i16).unsigned_abs() as u8,
            (sb as i16 - db as i16).unsigned_abs() as u8,
        ),
        _ => (sr, sg, sb),
    };

    let effective_alpha = (sa as f32 * opacity) as u8;
    over(pack(effective_alpha, sr as u16, sg as u16, sb as u16), dst)
}

fn unpack(pixel: u32) -> (u8, u8, u8, u8) {
    (
        (pixel >> 24) as u8,
        (pixel >> 16) as u8,
        (pixel >> 8) as u8,
        pixel as u8,
    )
}

fn pack(a: u8, r: u16, g: u16, b: u16) -> u32 {
    ((a as u32) << 24) | ((r.min(255) as u32) << 16) | ((g.min(255) as u32) << 8) | (b.min(255) as u32)
}

/// A tiny named/hex color table, covering the handful of keyword colors
/// this workspace's CSS subset ever produces.
fn parse_color(value: &str) -> u32 {
    match value {
        "transparent" => 0x00000000,
        "black" => 0xff000000,
        "white" => 0xffffffff,
        "red" => 0xffff0000,
        "green" => 0xff008000,
        "blue" => 0xff0000ff,
        "gray" | "grey" => 0xff808080,
        "lightblue" => 0xffadd8e6,
        "orange" => 0xffffa500,
        "yellow" => 0xffffff00,
        other if other.starts_with('#') && other.len() == 7 => {
            let r = u8::from_str_radix(&other[1..3], 16).unwrap_or(0);
            let g = u8::from_str_radix(&other[3..5], 16).unwrap_or(0);
            let b = u8::from_str_radix(&other[5..7], 16).unwrap_or(0);
            pack(255, r as u16, g as u16, b as u16)
        }
        _ => 0xff000000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_sets_opaque_pixels_within_bounds() {
        let mut surface = RasterSurface::new(4, 4);
        surface.draw_rect(geometry::rect(0.0, 0.0, 2.0, 2.0), "red");
        assert_eq!(surface.pixels()[0], 0xffff0000);
        assert_eq!(surface.pixels()[3 * 4 + 3], 0);
    }

    #[test]
    fn translate_offsets_subsequent_draws() {
        let mut surface = RasterSurface::new(4, 4);
        surface.translate(2.0, 0.0);
        surface.draw_rect(geometry::rect(0.0, 0.0, 1.0, 1.0), "blue");
        assert_eq!(surface.pixels()[2], 0xff0000ff);
        assert_eq!(surface.pixels()[0], 0);
    }

    #[test]
    fn opacity_below_one_attenuates_alpha() {
        let mut surface = RasterSurface::new(2, 2);
        surface.save_layer(0.5, None);
        surface.draw_rect(geometry::rect(0.0, 0.0, 2.0, 2.0), "black");
        surface.restore();
        let (a, _, _, _) = unpack(surface.pixels()[0]);
        assert!(a > 100 && a < 150);
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_color("#ff0000"), 0xffff0000);
    }

    #[test]
    fn unknown_color_name_falls_back_to_black() {
        assert_eq!(parse_color("chartreuse"), 0xff000000);
    }
}
