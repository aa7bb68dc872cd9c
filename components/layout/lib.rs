/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The layout tree: turns a styled DOM into a tree of positioned boxes.
//!
//! Document, block, line, text, and input boxes are collapsed into a single
//! `LayoutObject` enum rather than one type per kind, since the five kinds
//! differ only in a handful of fields.

mod block;
mod document;
mod input;
mod line;
mod object;
mod text;

pub use block::{build_block, layout_mode, BLOCK_ELEMENTS};
pub use document::layout_document;
pub use input::INPUT_WIDTH_PX;
pub use object::{
    append_layout_child, layout_tree_to_list, LayoutKind, LayoutObject, LayoutRef, WeakLayoutRef,
};
pub use text::font_for_node;
