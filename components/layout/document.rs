/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use dom::NodeRef;
use fonts::FontLibrary;

use crate::block::build_block;
use crate::object::{LayoutObject, LayoutRef};

/// Lays out the whole document: a `Document` root positioned at
/// `(HSTEP, VSTEP)` with its single `Block` child spanning `WIDTH - 2*HSTEP`.
pub fn layout_document(root: NodeRef, fonts: &dyn FontLibrary) -> LayoutRef {
    let document = LayoutObject::new_document();
    {
        let mut d = document.borrow_mut();
        d.x = config::HSTEP as f32;
        d.y = config::VSTEP as f32;
        d.width = config::WIDTH as f32 - 2.0 * config::HSTEP as f32;
    }

    let child = build_block(&document, root, None, fonts);
    document.borrow_mut().height = child.borrow().height;
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::{append_child, AttributeMap, Node};
    use fonts::BuiltinFontLibrary;

    #[test]
    fn document_spans_configured_width_minus_margins() {
        let html = Node::new_element("html".to_string(), AttributeMap::default());
        let body = Node::new_element("body".to_string(), AttributeMap::default());
        append_child(&html, body);

        let fonts = BuiltinFontLibrary::new();
        let document = layout_document(html, &fonts);

        let d = document.borrow();
        assert_eq!(d.x, config::HSTEP as f32);
        assert_eq!(d.y, config::VSTEP as f32);
        assert_eq!(d.width, config::WIDTH as f32 - 2.0 * config::HSTEP as f32);
        assert_eq!(d.children.len(), 1);
    }
}
