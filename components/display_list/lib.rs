/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The display-list tree: leaf paint commands and the visual-effect nodes
//! that wrap them, plus the painter that builds the tree from a layout tree.
//!
//! Leaf commands and effect nodes (Blend/Transform) are collapsed into one
//! node type, since both share the same `rect`/`children`/`parent`/`execute`
//! surface.

mod canvas;
mod effects;
mod node;
mod paint;

pub use canvas::{BlendMode, Canvas, Surface};
pub use effects::{new_blend, new_transform};
pub use node::{
    append_display_child, draw_custom, draw_line, draw_outline, draw_rect, draw_rrect, draw_text,
    CustomPaint, DisplayKind, DisplayNode, DisplayRef, WeakDisplayRef,
};
pub use paint::{element_key, parse_transform, paint, PaintResult};

#[cfg(test)]
mod property_tests {
    use super::*;
    use geometry::rect;
    use quickcheck::quickcheck;

    quickcheck! {
        /// `e.unmap(e.map(r)) == r` for every Transform.
        fn transform_map_unmap_round_trips(x: f32, y: f32, tx: f32, ty: f32) -> bool {
            if !x.is_finite() || !y.is_finite() || !tx.is_finite() || !ty.is_finite() {
                return true;
            }
            let r = rect(x, y, 10.0, 10.0);
            let transform = new_transform(tx, ty);
            let t = transform.borrow();
            t.unmap(t.map(r)) == r
        }
    }
}
