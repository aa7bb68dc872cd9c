/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Process-wide constants shared by every `wisp` crate, collected here so
//! there is exactly one definition of each.

use rustc_hash::FxHashMap;

/// Initial window width in CSS pixels.
pub const WIDTH: i32 = 800;
/// Initial window height in CSS pixels.
pub const HEIGHT: i32 = 600;

/// Horizontal step used by the legacy character-grid text layout.
pub const HSTEP: i32 = 13;
/// Vertical step used by the legacy character-grid text layout.
pub const VSTEP: i32 = 18;

/// Pixels scrolled per wheel tick / arrow keypress.
pub const SCROLL_STEP: i32 = 50;

/// Target frame interval for the compositor's refresh-driven animation loop.
pub const REFRESH_RATE_SEC: f32 = 0.033;

/// Whether the pipeline groups paint commands into cached composited layers
/// or rasters and draws every paint command directly every frame.
pub const USE_COMPOSITING: bool = true;

/// Whether the draw stage outlines composited-layer bounds, for debugging
/// the compositor's merge decisions.
pub const SHOW_COMPOSITED_LAYER_BORDERS: bool = false;

/// Returns the style properties every element inherits from its parent
/// unless a cascade rule overrides them.
pub fn inherited_properties() -> FxHashMap<String, String> {
    let mut map = FxHashMap::default();
    map.insert("font-size".to_string(), "16px".to_string());
    map.insert("font-style".to_string(), "normal".to_string());
    map.insert("font-weight".to_string(), "normal".to_string());
    map.insert("color".to_string(), "black".to_string());
    map
}

/// The stylesheet applied to every document before any author `<link>` or
/// `<style>` rules, providing baseline block/inline defaults.
pub const DEFAULT_STYLE_SHEET: &str = r#"
html, body, div, header, footer, nav, section, article, p, ul, ol, li,
h1, h2, h3, h4, h5, h6, form { display: block; }
a { color: blue; }
i, em { font-style: italic; }
b, strong { font-weight: bold; }
small { font-size: 14px; }
big { font-size: 20px; }
pre { font-family: monospace; }
input, button { display: inline; }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherited_properties_has_font_size() {
        let props = inherited_properties();
        assert_eq!(props.get("font-size"), Some(&"16px".to_string()));
    }

    #[test]
    fn default_stylesheet_is_nonempty() {
        assert!(!DEFAULT_STYLE_SHEET.trim().is_empty());
    }
}
