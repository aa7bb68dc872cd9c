/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::rc::Rc;

use geometry::{rect, PixelRect};

use crate::canvas::{BlendMode, Canvas};
use crate::node::{append_display_child, DisplayKind, DisplayNode, DisplayRef};

/// Builds an (initially childless) Blend effect node. Callers append
/// children with [`append_display_child`] then call [`recompute`] to fix up
/// `rect`/`needs_compositing` once the subtree is final.
pub fn new_blend(opacity: f32, blend_mode: Option<BlendMode>) -> DisplayRef {
    Rc::new(std::cell::RefCell::new(DisplayNode {
        kind: DisplayKind::Blend { opacity, blend_mode },
        rect: rect(0.0, 0.0, 0.0, 0.0),
        children: Vec::new(),
        parent: None,
        element: None,
        needs_compositing: false,
    }))
}

/// Builds an (initially childless) Transform effect node. `tx`/`ty` of
/// `(0, 0)` means "no translation set".
pub fn new_transform(tx: f32, ty: f32) -> DisplayRef {
    Rc::new(std::cell::RefCell::new(DisplayNode {
        kind: DisplayKind::Transform { tx, ty },
        rect: rect(0.0, 0.0, 0.0, 0.0),
        children: Vec::new(),
        parent: None,
        element: None,
        needs_compositing: false,
    }))
}

impl DisplayNode {
    /// Maps `r` from the node's own coordinate space to the space its
    /// parent observes it in, i.e. post-effect.
    pub fn map(&self, r: PixelRect) -> PixelRect {
        match &self.kind {
            DisplayKind::Transform { tx, ty } => r.translate(geometry::PixelVector::new(*tx, *ty)),
            DisplayKind::Blend { blend_mode: Some(BlendMode::DestinationIn), .. } => {
                match self.children.last() {
                    Some(last) => r.intersection(&last.borrow().rect).unwrap_or(rect(0.0, 0.0, 0.0, 0.0)),
                    None => r,
                }
            }
            _ => r,
        }
    }

    /// Inverse of [`map`]: exact for Transform, and for destination-in Blend
    /// exact within the clip bounds (outside them there is no well-defined
    /// preimage).
    pub fn unmap(&self, r: PixelRect) -> PixelRect {
        match &self.kind {
            DisplayKind::Transform { tx, ty } => r.translate(geometry::PixelVector::new(-*tx, -*ty)),
            _ => r,
        }
    }

    /// Runs this node (and its subtree) against `canvas`.
    pub fn execute(&self, canvas: &mut dyn Canvas) {
        match &self.kind {
            DisplayKind::DrawText { text, font, color } => {
                canvas.draw_string(self.rect, text, font.as_ref(), color);
            }
            DisplayKind::DrawRect { color } => canvas.draw_rect(self.rect, color),
            DisplayKind::DrawRRect { radius, color } => canvas.draw_rrect(self.rect, *radius, color),
            DisplayKind::DrawLine { thickness, color } => canvas.draw_line(self.rect, *thickness, color),
            DisplayKind::DrawOutline { thickness, color } => canvas.draw_outline(self.rect, *thickness, color),
            DisplayKind::Blend { opacity, blend_mode } => {
                let should_save = self.should_save();
                if should_save {
                    canvas.save_layer(*opacity, *blend_mode);
                }
                for child in &self.children {
                    child.borrow().execute(canvas);
                }
                if should_save {
                    canvas.restore();
                }
            }
            DisplayKind::Transform { tx, ty } => {
                let translated = *tx != 0.0 || *ty != 0.0;
                if translated {
                    canvas.save();
                    canvas.translate(*tx, *ty);
                }
                for child in &self.children {
                    child.borrow().execute(canvas);
                }
                if translated {
                    canvas.restore();
                }
            }
            DisplayKind::Custom(custom) => custom.execute(canvas),
        }
    }

    /// Recomputes `rect` (union of children's rects) and `needs_compositing`
    /// (true if this is a non-trivial Blend, or any child needs it) after
    /// children have been appended. Call once the subtree is final.
    pub fn recompute(&mut self) {
        self.rect = self
            .children
            .iter()
            .map(|c| c.borrow().rect)
            .reduce(|a, b| a.union(&b))
            .unwrap_or(rect(0.0, 0.0, 0.0, 0.0));

        let self_forces_compositing = config::USE_COMPOSITING
            && matches!(
                &self.kind,
                DisplayKind::Blend { opacity, blend_mode }
                    if *opacity < 1.0 || blend_mode.is_some()
            );
        self.needs_compositing =
            self_forces_compositing || self.children.iter().any(|c| c.borrow().needs_compositing);
    }

    /// Builds a shallow copy of this effect node with a new child list,
    /// re-parenting each child to the clone. Used by draw-list assembly to
    /// wrap a composited layer in a fresh copy of each ancestor effect
    /// without mutating the shared original.
    pub fn clone_with_children(&self, children: Vec<DisplayRef>) -> DisplayRef {
        let clone = Rc::new(std::cell::RefCell::new(DisplayNode {
            kind: match &self.kind {
                DisplayKind::Blend { opacity, blend_mode } => {
                    DisplayKind::Blend { opacity: *opacity, blend_mode: *blend_mode }
                }
                DisplayKind::Transform { tx, ty } => DisplayKind::Transform { tx: *tx, ty: *ty },
                _ => unreachable!("only effect nodes are cloned during draw-list assembly"),
            },
            rect: self.rect,
            children: Vec::new(),
            parent: None,
            element: self.element.clone(),
            needs_compositing: self.needs_compositing,
        }));
        for child in children {
            append_display_child(&clone, child);
        }
        clone.borrow_mut().recompute();
        clone
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::draw_rect;

    #[test]
    fn transform_map_and_unmap_round_trip() {
        let transform = new_transform(10.0, 20.0);
        let r = rect(0.0, 0.0, 5.0, 5.0);
        let mapped = transform.borrow().map(r);
        let unmapped = transform.borrow().unmap(mapped);
        assert_eq!(unmapped, r);
    }

    #[test]
    fn destination_in_blend_clips_to_last_child() {
        let blend = new_blend(1.0, Some(BlendMode::DestinationIn));
        let mask = draw_rect(rect(0.0, 0.0, 4.0, 4.0), "white".to_string());
        append_display_child(&blend, mask);
        let mapped = blend.borrow().map(rect(0.0, 0.0, 10.0, 10.0));
        assert_eq!(mapped, rect(0.0, 0.0, 4.0, 4.0));
    }

    #[test]
    fn needs_compositing_propagates_from_children() {
        let outer = new_transform(0.0, 0.0);
        let inner = new_blend(0.5, None);
        append_display_child(&outer, inner.clone());
        inner.borrow_mut().recompute();
        outer.borrow_mut().recompute();
        assert!(outer.borrow().needs_compositing);
    }
}
