/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use dom::NodeRef;
use fonts::{Font, FontLibrary};

/// Resolves the font a word (or input) laid out for `node` should use:
/// size is `floor(0.75 * font-size-px)`, weight/style come straight from
/// the resolved style.
pub fn font_for_node(node: &NodeRef, fonts: &dyn FontLibrary) -> Arc<dyn Font> {
    let node = node.borrow();
    let size_px: f32 = node
        .style
        .get("font-size")
        .and_then(|v| v.trim_end_matches("px").parse::<f32>().ok())
        .unwrap_or(16.0);
    let size = (0.75 * size_px).floor() as i32;
    let bold = node.style.get("font-weight").map(|w| w == "bold").unwrap_or(false);
    let italic = node.style.get("font-style").map(|s| s == "italic").unwrap_or(false);
    fonts.get_font(size.max(1), bold, italic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::{AttributeMap, Node};
    use fonts::BuiltinFontLibrary;

    #[test]
    fn resolves_size_as_three_quarters_floor() {
        let mut attrs = AttributeMap::default();
        attrs.insert("style".to_string(), String::new());
        let node = Node::new_element("span".to_string(), attrs);
        node.borrow_mut().style.insert("font-size".to_string(), "17px".to_string());

        let library = BuiltinFontLibrary::new();
        let font = font_for_node(&node, &library);
        assert_eq!(font.key().size, 12);
    }
}
