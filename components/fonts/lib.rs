/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Font measurement seam.
//!
//! Real text shaping is out of scope here, but layout still needs *some*
//! answer to "how wide is this word" and "what's this font's
//! ascent/descent" to run end to end. `FontLibrary` is the trait a real
//! shaping engine would implement; `BuiltinFontLibrary` is a deterministic
//! fixed-width stand-in.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Font style, keyed the way CSS `font-weight`/`font-style` resolve down
/// to (`"normal"`/`"bold"`, `"roman"`/`"italic"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontKey {
    pub size: i32,
    pub bold: bool,
    pub italic: bool,
}

/// Ascent/descent/line-height measurements for a font at a given size.
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_height: f32,
}

/// A measurable, drawable font handle. `ports/shell`'s software canvas
/// only needs `measure_text`/`metrics` to lay text out and a `size`/`bold`/
/// `italic` triple to pick a glyph rendering, kept deliberately tiny.
pub trait Font: Send + Sync {
    fn measure_text(&self, text: &str) -> f32;
    fn metrics(&self) -> FontMetrics;
    fn key(&self) -> FontKey;
}

/// The seam `wisp-layout` and `wisp-display-list` measure and draw text
/// through, so a real shaping/rasterization backend can be swapped in
/// without touching layout code.
pub trait FontLibrary: Send + Sync {
    fn get_font(&self, size: i32, bold: bool, italic: bool) -> Arc<dyn Font>;
}

struct BuiltinFont {
    key: FontKey,
}

/// Monospace-ish deterministic metrics: every glyph is `0.6 * size` wide,
/// ascent is `0.8 * size`, descent is `0.2 * size`. Good enough to drive
/// line-breaking and baseline placement without a real glyph table.
impl Font for BuiltinFont {
    fn measure_text(&self, text: &str) -> f32 {
        text.chars().count() as f32 * (self.key.size as f32 * 0.6)
    }

    fn metrics(&self) -> FontMetrics {
        let size = self.key.size as f32;
        FontMetrics {
            ascent: size * 0.8,
            descent: size * 0.2,
            line_height: size * 1.25,
        }
    }

    fn key(&self) -> FontKey {
        self.key
    }
}

/// Caches one [`Font`] per `(size, bold, italic)` key: built once, reused
/// for every word measured at that size/weight/style.
#[derive(Default)]
pub struct BuiltinFontLibrary {
    cache: Mutex<FxHashMap<FontKey, Arc<dyn Font>>>,
}

impl BuiltinFontLibrary {
    pub fn new() -> Self {
        BuiltinFontLibrary {
            cache: Mutex::new(FxHashMap::default()),
        }
    }
}

impl FontLibrary for BuiltinFontLibrary {
    fn get_font(&self, size: i32, bold: bool, italic: bool) -> Arc<dyn Font> {
        let key = FontKey { size, bold, italic };
        let mut cache = self.cache.lock();
        cache
            .entry(key)
            .or_insert_with(|| Arc::new(BuiltinFont { key }) as Arc<dyn Font>)
            .clone()
    }
}

/// Extra vertical space a line of text at this font occupies, beyond its
/// raw line height, to leave breathing room between stacked lines.
pub fn linespace(metrics: FontMetrics) -> f32 {
    metrics.line_height + 20.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_fonts_by_key() {
        let library = BuiltinFontLibrary::new();
        let a = library.get_font(16, false, false);
        let b = library.get_font(16, false, false);
        assert_eq!(a.key(), b.key());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn measure_text_scales_with_size() {
        let library = BuiltinFontLibrary::new();
        let small = library.get_font(10, false, false);
        let large = library.get_font(20, false, false);
        assert!(large.measure_text("hello") > small.measure_text("hello"));
    }
}
