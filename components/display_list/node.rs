/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use dom::NodeRef;
use fonts::Font;
use geometry::PixelRect;

use crate::canvas::{BlendMode, Canvas};

pub type DisplayRef = Rc<RefCell<DisplayNode>>;
pub type WeakDisplayRef = Weak<RefCell<DisplayNode>>;

/// A composited layer's contribution to the draw list. Defined here (rather
/// than as a concrete variant) so `wisp-compositing` can hand the painter's
/// tree a leaf that draws a cached surface without this crate depending on
/// the compositor.
pub trait CustomPaint {
    fn execute(&self, canvas: &mut dyn Canvas);
}

/// Every leaf paint command and every visual-effect node, unified into one
/// type: both expose `rect`/`children`/`parent`/`execute`. Leaves always
/// have empty `children`; effects wrap one or more leaves or other effects.
pub enum DisplayKind {
    DrawText {
        text: String,
        font: Arc<dyn Font>,
        color: String,
    },
    DrawRect {
        color: String,
    },
    DrawRRect {
        radius: f32,
        color: String,
    },
    DrawLine {
        thickness: f32,
        color: String,
    },
    DrawOutline {
        thickness: f32,
        color: String,
    },
    /// `opacity` and an optional blend mode; `should_save()` decides whether
    /// `execute` pushes a layer at all.
    Blend {
        opacity: f32,
        blend_mode: Option<BlendMode>,
    },
    /// Pixel translation only; the parser only understands a
    /// `translate(<x>px, <y>px)` argument shape.
    Transform {
        tx: f32,
        ty: f32,
    },
    Custom(Rc<dyn CustomPaint>),
}

pub struct DisplayNode {
    pub kind: DisplayKind,
    pub rect: PixelRect,
    pub children: Vec<DisplayRef>,
    pub parent: Option<WeakDisplayRef>,
    /// The element this node paints on behalf of, if any. Set on every
    /// effect node the painter builds for an element, so the tab thread can
    /// look up `element.blend_op` for the animation fast path.
    pub element: Option<NodeRef>,
    /// True if this node or any descendant requires a composited surface.
    /// Recomputed by the painter once the subtree below is built.
    pub needs_compositing: bool,
}

impl DisplayNode {
    fn leaf(rect: PixelRect, kind: DisplayKind) -> DisplayRef {
        Rc::new(RefCell::new(DisplayNode {
            kind,
            rect,
            children: Vec::new(),
            parent: None,
            element: None,
            needs_compositing: false,
        }))
    }

    pub fn is_effect(&self) -> bool {
        matches!(self.kind, DisplayKind::Blend { .. } | DisplayKind::Transform { .. })
    }

    /// `should_save = opacity<1 or blend_mode set`. Only meaningful on
    /// `Blend`; other kinds never save a layer.
    pub fn should_save(&self) -> bool {
        match &self.kind {
            DisplayKind::Blend { opacity, blend_mode } => *opacity < 1.0 || blend_mode.is_some(),
            _ => false,
        }
    }

    pub fn parent(&self) -> Option<DisplayRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }
}

pub fn draw_text(rect: PixelRect, text: String, font: Arc<dyn Font>, color: String) -> DisplayRef {
    DisplayNode::leaf(rect, DisplayKind::DrawText { text, font, color })
}

pub fn draw_rect(rect: PixelRect, color: String) -> DisplayRef {
    DisplayNode::leaf(rect, DisplayKind::DrawRect { color })
}

pub fn draw_rrect(rect: PixelRect, radius: f32, color: String) -> DisplayRef {
    DisplayNode::leaf(rect, DisplayKind::DrawRRect { radius, color })
}

pub fn draw_line(rect: PixelRect, thickness: f32, color: String) -> DisplayRef {
    DisplayNode::leaf(rect, DisplayKind::DrawLine { thickness, color })
}

pub fn draw_outline(rect: PixelRect, thickness: f32, color: String) -> DisplayRef {
    DisplayNode::leaf(rect, DisplayKind::DrawOutline { thickness, color })
}

/// Wraps a compositor-owned leaf (`DrawCompositedLayer`) so it can sit in
/// the draw list alongside ordinary paint commands without this crate
/// depending on `wisp-compositing`.
pub fn draw_custom(rect: PixelRect, custom: Rc<dyn CustomPaint>) -> DisplayRef {
    DisplayNode::leaf(rect, DisplayKind::Custom(custom))
}

/// Appends `child` to `effect` and sets `child`'s parent pointer. Callers
/// must assign every node's parent as the last step of tree construction so
/// a node is never observed half-linked.
pub fn append_display_child(effect: &DisplayRef, child: DisplayRef) {
    child.borrow_mut().parent = Some(Rc::downgrade(effect));
    effect.borrow_mut().children.push(child);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_one_without_blend_mode_does_not_save() {
        let blend = crate::effects::new_blend(1.0, None);
        assert!(!blend.borrow().should_save());
    }

    #[test]
    fn opacity_below_one_saves() {
        let blend = crate::effects::new_blend(0.5, None);
        assert!(blend.borrow().should_save());
    }
}
