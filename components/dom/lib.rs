/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The element/text tree, factored out of the style crate so layout and
//! script can depend on it without depending on the cascade.
//!
//! A node owns its children, carries a computed style map and an
//! `is_focused` flag, and knows its parent. Parent pointers use `Weak` so
//! the tree has no ownership cycles.

mod animation;
mod node;

pub use animation::NumericAnimation;
pub use node::{append_child, tree_to_list, AttributeMap, Node, NodeData, NodeRef, Style, WeakNodeRef};
