/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use dom::NodeRef;

/// A parsed CSS selector: either a bare tag selector or a descendant
/// combinator of two selectors. No attribute, class, id, or pseudo-class
/// selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Tag(String),
    Descendant(Box<Selector>, Box<Selector>),
}

impl Selector {
    /// Cascade priority: a tag selector counts 1, a descendant selector
    /// counts the sum of its parts.
    pub fn priority(&self) -> u32 {
        match self {
            Selector::Tag(_) => 1,
            Selector::Descendant(ancestor, descendant) => {
                ancestor.priority() + descendant.priority()
            }
        }
    }

    /// Whether `node` matches this selector. For a descendant selector, the
    /// node must match the rightmost part and have some strict ancestor
    /// matching the left part.
    pub fn matches(&self, node: &NodeRef) -> bool {
        match self {
            Selector::Tag(tag) => node.borrow().tag() == Some(tag.as_str()),
            Selector::Descendant(ancestor, descendant) => {
                if !descendant.matches(node) {
                    return false;
                }
                let mut cur = node.borrow().parent();
                while let Some(parent) = cur {
                    if ancestor.matches(&parent) {
                        return true;
                    }
                    cur = parent.borrow().parent();
                }
                false
            }
        }
    }
}

/// One stylesheet rule: a selector plus its ordered property declarations.
#[derive(Debug, Clone)]
pub struct Rule {
    pub selector: Selector,
    pub declarations: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::{append_child, AttributeMap, Node};

    #[test]
    fn tag_selector_priority_is_one() {
        assert_eq!(Selector::Tag("div".to_string()).priority(), 1);
    }

    #[test]
    fn descendant_selector_priority_sums_parts() {
        let selector = Selector::Descendant(
            Box::new(Selector::Tag("div".to_string())),
            Box::new(Selector::Tag("p".to_string())),
        );
        assert_eq!(selector.priority(), 2);
    }

    #[test]
    fn descendant_selector_requires_strict_ancestor() {
        let div = Node::new_element("div".to_string(), AttributeMap::default());
        let p = Node::new_element("p".to_string(), AttributeMap::default());
        append_child(&div, p.clone());

        let selector = Selector::Descendant(
            Box::new(Selector::Tag("div".to_string())),
            Box::new(Selector::Tag("p".to_string())),
        );
        assert!(selector.matches(&p));
        assert!(!selector.matches(&div));
    }
}
