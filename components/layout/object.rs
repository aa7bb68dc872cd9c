/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::rc::{Rc, Weak};
use std::cell::RefCell;
use std::sync::Arc;

use dom::NodeRef;
use fonts::Font;
use geometry::PixelRect;

pub type LayoutRef = Rc<RefCell<LayoutObject>>;
pub type WeakLayoutRef = Weak<RefCell<LayoutObject>>;

/// The five layout object variants. `Document` has no element reference;
/// every other variant's `node` points back at the element (or text node)
/// it lays out.
pub enum LayoutKind {
    Document,
    Block,
    Line,
    Text { word: String, font: Arc<dyn Font> },
    Input { font: Arc<dyn Font> },
}

/// One node of the layout tree: a box with a position, a size, a parent and
/// an ordered child list.
pub struct LayoutObject {
    pub kind: LayoutKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub parent: Option<WeakLayoutRef>,
    pub children: Vec<LayoutRef>,
    /// The element or text node this object lays out; `None` only for
    /// `Document`, which has no corresponding DOM node.
    pub node: Option<NodeRef>,
}

impl LayoutObject {
    fn new(kind: LayoutKind, node: Option<NodeRef>) -> LayoutRef {
        Rc::new(RefCell::new(LayoutObject {
            kind,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            parent: None,
            children: Vec::new(),
            node,
        }))
    }

    pub fn new_document() -> LayoutRef {
        LayoutObject::new(LayoutKind::Document, None)
    }

    pub fn new_block(node: NodeRef) -> LayoutRef {
        LayoutObject::new(LayoutKind::Block, Some(node))
    }

    pub fn new_line(node: NodeRef) -> LayoutRef {
        LayoutObject::new(LayoutKind::Line, Some(node))
    }

    pub fn new_text(node: NodeRef, word: String, font: Arc<dyn Font>) -> LayoutRef {
        LayoutObject::new(LayoutKind::Text { word, font }, Some(node))
    }

    pub fn new_input(node: NodeRef, font: Arc<dyn Font>) -> LayoutRef {
        LayoutObject::new(LayoutKind::Input { font }, Some(node))
    }

    pub fn parent(&self) -> Option<LayoutRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn rect(&self) -> PixelRect {
        geometry::rect(self.x, self.y, self.width, self.height)
    }
}

/// Appends `child` to `parent` and sets `child`'s parent pointer, assigning
/// the parent pointer as the last step of construction so a box is never
/// observed half-linked.
pub fn append_layout_child(parent: &LayoutRef, child: LayoutRef) {
    child.borrow_mut().parent = Some(Rc::downgrade(parent));
    parent.borrow_mut().children.push(child);
}

/// Flattens the layout tree rooted at `root` into `out` in document order,
/// mirroring `dom::tree_to_list` for the layout tree. Used by click
/// hit-testing, which needs every layout object's absolute box, not just
/// the element tree's.
pub fn layout_tree_to_list(root: &LayoutRef, out: &mut Vec<LayoutRef>) {
    out.push(root.clone());
    for child in &root.borrow().children {
        layout_tree_to_list(child, out);
    }
}
