/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::NumericAnimation;

/// An element's attribute set. Order doesn't matter, so a hash map fits.
pub type AttributeMap = FxHashMap<String, String>;

/// A resolved style: CSS property name to value, post-cascade.
pub type Style = FxHashMap<String, String>;

/// A strong reference to a node, shared by every owner (parent's children
/// vec, layout objects, the script thread's focus pointer).
pub type NodeRef = Rc<RefCell<Node>>;

/// A non-owning reference to a node's parent. Upgraded only when walking
/// up the tree; never stored as a strong reference to avoid a cycle with
/// the parent's `children` vec.
pub type WeakNodeRef = Weak<RefCell<Node>>;

/// The two node kinds a parsed document tree is built from. Unlike a full
/// DOM there is no separate `Document`/`Comment`/`CDATA` kind: the HTML
/// parser never produces anything else.
#[derive(Debug)]
pub enum NodeData {
    Element {
        tag: String,
        attributes: AttributeMap,
    },
    Text {
        text: String,
    },
}

/// One node of the parsed, styled document tree.
///
/// `style` starts empty and is filled in by the style crate's cascade pass;
/// layout and paint only ever read it. `animations` holds in-flight
/// transitions keyed by the CSS property they drive, ticked once per
/// animation frame by the pipeline driver.
pub struct Node {
    pub data: NodeData,
    pub children: Vec<NodeRef>,
    pub parent: Option<WeakNodeRef>,
    pub style: Style,
    pub is_focused: bool,
    pub animations: FxHashMap<String, NumericAnimation>,
}

impl Node {
    pub fn new_element(tag: String, attributes: AttributeMap) -> NodeRef {
        Rc::new(RefCell::new(Node {
            data: NodeData::Element { tag, attributes },
            children: Vec::new(),
            parent: None,
            style: Style::default(),
            is_focused: false,
            animations: FxHashMap::default(),
        }))
    }

    pub fn new_text(text: String) -> NodeRef {
        Rc::new(RefCell::new(Node {
            data: NodeData::Text { text },
            children: Vec::new(),
            parent: None,
            style: Style::default(),
            is_focused: false,
            animations: FxHashMap::default(),
        }))
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            NodeData::Text { .. } => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text { text } => Some(text.as_str()),
            NodeData::Element { .. } => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        match &self.data {
            NodeData::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            NodeData::Text { .. } => None,
        }
    }

    /// Sets an attribute on an element node; a no-op on text nodes, which
    /// have no attribute set to write into.
    pub fn set_attribute(&mut self, name: &str, value: String) {
        if let NodeData::Element { attributes, .. } = &mut self.data {
            attributes.insert(name.to_string(), value);
        }
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }
}

/// Appends `child` to `parent`'s children and sets `child`'s parent pointer,
/// assigning the parent pointer last so a node is never observed
/// half-linked mid-construction.
pub fn append_child(parent: &NodeRef, child: NodeRef) {
    child.borrow_mut().parent = Some(Rc::downgrade(parent));
    parent.borrow_mut().children.push(child);
}

/// Flattens a tree into preorder (self, then each child's preorder). Used
/// by hit-testing and by anything that needs to walk every node without
/// caring about tree shape.
pub fn tree_to_list(root: &NodeRef, out: &mut Vec<NodeRef>) {
    out.push(root.clone());
    for child in &root.borrow().children {
        tree_to_list(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_child_sets_parent_pointer() {
        let parent = Node::new_element("div".to_string(), AttributeMap::default());
        let child = Node::new_text("hello".to_string());
        append_child(&parent, child.clone());

        assert!(Rc::ptr_eq(&child.borrow().parent().unwrap(), &parent));
        assert_eq!(parent.borrow().children.len(), 1);
    }

    #[test]
    fn tree_to_list_is_preorder() {
        let root = Node::new_element("html".to_string(), AttributeMap::default());
        let body = Node::new_element("body".to_string(), AttributeMap::default());
        let text = Node::new_text("hi".to_string());
        append_child(&root, body.clone());
        append_child(&body, text.clone());

        let mut list = Vec::new();
        tree_to_list(&root, &mut list);

        assert!(Rc::ptr_eq(&list[0], &root));
        assert!(Rc::ptr_eq(&list[1], &body));
        assert!(Rc::ptr_eq(&list[2], &text));
    }
}
