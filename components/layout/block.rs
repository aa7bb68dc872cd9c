/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use dom::NodeRef;
use fonts::FontLibrary;

use crate::line::build_inline;
use crate::object::{append_layout_child, LayoutObject, LayoutRef};

/// Elements that force their containing box into `block` layout mode.
pub const BLOCK_ELEMENTS: &[&str] = &[
    "html", "body", "article", "section", "nav", "aside", "h1", "h2", "h3", "h4", "h5", "h6",
    "hgroup", "header", "footer", "address", "p", "hr", "pre", "blockquote", "ol", "ul", "menu",
    "li", "dl", "dt", "dd", "figure", "figcaption", "main", "div", "table", "form", "fieldset",
    "legend", "details", "summary",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Block,
    Inline,
}

/// Decides a node's layout mode: a block child forces block mode;
/// otherwise a node with children (or an `input`) is laid out inline;
/// an empty leaf element defaults to block (so it still sums to zero height
/// rather than running the inline word-wrap machinery for nothing). Text
/// nodes are always inline.
pub fn layout_mode(node: &NodeRef) -> Mode {
    let node = node.borrow();
    if node.text().is_some() {
        return Mode::Inline;
    }
    let has_block_child = node
        .children
        .iter()
        .any(|child| child.borrow().tag().map(|t| BLOCK_ELEMENTS.contains(&t)).unwrap_or(false));
    if has_block_child {
        Mode::Block
    } else if !node.children.is_empty() || node.tag() == Some("input") {
        Mode::Inline
    } else {
        Mode::Block
    }
}

/// Builds a `Block` layout object for `node`, appends it to `parent`, and
/// recursively lays out its contents (either block-mode child boxes or an
/// inline run of lines).
pub fn build_block(
    parent: &LayoutRef,
    node: NodeRef,
    previous: Option<&LayoutRef>,
    fonts: &dyn FontLibrary,
) -> LayoutRef {
    let block = LayoutObject::new_block(node.clone());
    {
        let mut b = block.borrow_mut();
        b.x = parent.borrow().x;
        b.width = parent.borrow().width;
        b.y = match previous {
            Some(prev) => prev.borrow().y + prev.borrow().height,
            None => parent.borrow().y,
        };
    }
    append_layout_child(parent, block.clone());

    match layout_mode(&node) {
        Mode::Block => {
            let mut prev: Option<LayoutRef> = None;
            let children: Vec<NodeRef> = node.borrow().children.clone();
            for child_node in children {
                let child = build_block(&block, child_node, prev.as_ref(), fonts);
                prev = Some(child);
            }
            let height: f32 = block.borrow().children.iter().map(|c| c.borrow().height).sum();
            block.borrow_mut().height = height;
        }
        Mode::Inline => {
            let height = build_inline(&block, &node, fonts);
            block.borrow_mut().height = height;
        }
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::{append_child, AttributeMap, Node};

    #[test]
    fn block_child_forces_block_mode() {
        let outer = Node::new_element("body".to_string(), AttributeMap::default());
        let inner = Node::new_element("div".to_string(), AttributeMap::default());
        append_child(&outer, inner);
        assert_eq!(layout_mode(&outer), Mode::Block);
    }

    #[test]
    fn leaf_element_with_text_child_is_inline() {
        let outer = Node::new_element("p".to_string(), AttributeMap::default());
        let text = Node::new_text("hi".to_string());
        append_child(&outer, text);
        assert_eq!(layout_mode(&outer), Mode::Inline);
    }

    #[test]
    fn empty_leaf_element_is_block() {
        let outer = Node::new_element("div".to_string(), AttributeMap::default());
        assert_eq!(layout_mode(&outer), Mode::Block);
    }

    #[test]
    fn empty_input_is_inline() {
        let input = Node::new_element("input".to_string(), AttributeMap::default());
        assert_eq!(layout_mode(&input), Mode::Inline);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::object::LayoutObject;
    use dom::{append_child, AttributeMap, Node};
    use fonts::BuiltinFontLibrary;
    use quickcheck::quickcheck;

    quickcheck! {
        /// A block-mode box's height is always the sum of its children's
        /// heights (`build_block`'s `Mode::Block` arm), whatever those
        /// children's own heights happen to be.
        fn block_height_equals_sum_of_child_heights(word_counts: Vec<u8>) -> bool {
            if word_counts.is_empty() || word_counts.len() > 6 {
                return true;
            }

            let root = LayoutObject::new_document();
            root.borrow_mut().width = 100_000.0;

            let parent = Node::new_element("body".to_string(), AttributeMap::default());
            for count in &word_counts {
                let child = Node::new_element("div".to_string(), AttributeMap::default());
                child.borrow_mut().style.insert("font-size".to_string(), "16px".to_string());
                child.borrow_mut().style.insert("font-weight".to_string(), "normal".to_string());
                child.borrow_mut().style.insert("font-style".to_string(), "normal".to_string());
                let word_count = (*count as usize % 5) + 1;
                let text = Node::new_text(vec!["word"; word_count].join(" "));
                text.borrow_mut().style = child.borrow().style.clone();
                append_child(&child, text);
                append_child(&parent, child);
            }

            let fonts = BuiltinFontLibrary::new();
            let block = build_block(&root, parent, None, &fonts);
            let expected: f32 = block.borrow().children.iter().map(|c| c.borrow().height).sum();
            (block.borrow().height - expected).abs() < 0.001
        }
    }
}
