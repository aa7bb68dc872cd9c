/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::rc::Rc;

use dom::NodeRef;
use geometry::rect;
use layout::{LayoutKind, LayoutRef};
use rustc_hash::FxHashMap;

use crate::canvas::BlendMode;
use crate::effects::{new_blend, new_transform};
use crate::node::{append_display_child, draw_line, draw_rrect, draw_text, DisplayRef};

/// A painted frame: the display-list tree rooted at the Document, plus a
/// mapping from element to its own Blend node so the animation fast path can
/// refresh an effect without repainting the whole tree.
pub struct PaintResult {
    pub root: DisplayRef,
    pub blend_ops: FxHashMap<usize, DisplayRef>,
}

/// Identifies an element by its node's heap address. Stable for the
/// lifetime of a single render; the tree is rebuilt from scratch on
/// invalidation so this is never compared across documents. Exported so
/// `wisp-script` can key a `composited_updates` map the same way
/// [`PaintResult::blend_ops`] is keyed.
pub fn element_key(node: &NodeRef) -> usize {
    Rc::as_ptr(node) as usize
}

/// Walks the layout tree and builds the display-list tree.
pub fn paint(document: &LayoutRef) -> PaintResult {
    let mut blend_ops = FxHashMap::default();
    let root = paint_object(document, &mut blend_ops);
    PaintResult { root, blend_ops }
}

fn paint_object(obj: &LayoutRef, blend_ops: &mut FxHashMap<usize, DisplayRef>) -> DisplayRef {
    let o = obj.borrow();
    let mut content: Vec<DisplayRef> = Vec::new();

    match &o.kind {
        LayoutKind::Document => {
            for child in &o.children {
                content.push(paint_object(child, blend_ops));
            }
        }
        LayoutKind::Block => {
            if let Some(bg) = background_paint(&o.node, o.rect()) {
                content.push(bg);
            }
            for child in &o.children {
                content.push(paint_object(child, blend_ops));
            }
        }
        LayoutKind::Line => {
            for word in &o.children {
                content.push(paint_line_child(word));
            }
        }
        LayoutKind::Text { .. } | LayoutKind::Input { .. } => {
            content.push(paint_line_child(obj));
        }
    }

    let node = o.node.clone();
    let rect = o.rect();
    drop(o);

    wrap_with_effects(node, rect, content, blend_ops)
}

/// Emits the draw commands for a single word (`Text`) or form control
/// (`Input`), including the blinking-cursor `DrawLine` for a focused input.
fn paint_line_child(obj: &LayoutRef) -> DisplayRef {
    let o = obj.borrow();
    let color = o
        .node
        .as_ref()
        .and_then(|n| n.borrow().style.get("color").cloned())
        .unwrap_or_else(|| "black".to_string());

    match &o.kind {
        LayoutKind::Text { word, font } => draw_text(o.rect(), word.clone(), font.clone(), color),
        LayoutKind::Input { font } => {
            let value = o
                .node
                .as_ref()
                .and_then(|n| n.borrow().attribute("value").map(str::to_string))
                .unwrap_or_default();
            let is_focused = o.node.as_ref().map(|n| n.borrow().is_focused).unwrap_or(false);

            let blend = new_blend(1.0, None);
            let text_leaf = draw_text(o.rect(), value.clone(), font.clone(), color.clone());
            append_display_child(&blend, text_leaf);
            if is_focused {
                let cursor_x = o.x + font.measure_text(&value);
                let cursor = draw_line(rect(cursor_x, o.y, 1.0, o.height), 1.0, "black".to_string());
                append_display_child(&blend, cursor);
            }
            blend.borrow_mut().recompute();
            blend
        }
        _ => unreachable!("paint_line_child is only called on Text/Input layout objects"),
    }
}

/// Paints an element's background (`DrawRRect`) when its `background-color`
/// is set and not `transparent`, with corner radius parsed from
/// `border-radius`.
fn background_paint(node: &Option<NodeRef>, rect: geometry::PixelRect) -> Option<DisplayRef> {
    let node = node.as_ref()?;
    let node = node.borrow();
    let color = node.style.get("background-color")?;
    if color == "transparent" {
        return None;
    }
    let radius = node
        .style
        .get("border-radius")
        .and_then(|v| v.trim_end_matches("px").parse::<f32>().ok())
        .unwrap_or(0.0);
    Some(draw_rrect(rect, radius, color.clone()))
}

/// Wraps `content` in the clip/blend/transform effects an element's style
/// can require, recording the element's own Blend node in `blend_ops`.
fn wrap_with_effects(
    node: Option<NodeRef>,
    rect: geometry::PixelRect,
    mut content: Vec<DisplayRef>,
    blend_ops: &mut FxHashMap<usize, DisplayRef>,
) -> DisplayRef {
    let style = node.as_ref().map(|n| n.borrow().style.clone()).unwrap_or_default();

    if style.get("overflow").map(String::as_str) == Some("clip") {
        let radius = style
            .get("border-radius")
            .and_then(|v| v.trim_end_matches("px").parse::<f32>().ok())
            .unwrap_or(0.0);
        let mask = draw_rrect(rect, radius, "white".to_string());
        let clip = new_blend(1.0, Some(BlendMode::DestinationIn));
        append_display_child(&clip, mask);
        clip.borrow_mut().recompute();
        content.push(clip);
    }

    let opacity: f32 = style.get("opacity").and_then(|v| v.parse().ok()).unwrap_or(1.0);
    let blend_mode = style.get("mix-blend-mode").and_then(|v| BlendMode::parse(v));
    let blend = new_blend(opacity, blend_mode);
    for item in content {
        append_display_child(&blend, item);
    }
    blend.borrow_mut().recompute();
    if let Some(node) = &node {
        blend_ops.insert(element_key(node), blend.clone());
        blend.borrow_mut().element = Some(node.clone());
    }

    let (tx, ty) = style.get("transform").and_then(|v| parse_transform(v)).unwrap_or((0.0, 0.0));
    let transform = new_transform(tx, ty);
    append_display_child(&transform, blend);
    transform.borrow_mut().recompute();
    transform
}

/// Parses `translate(<x>px, <y>px)`. Anything else, including a transform
/// function this implementation doesn't know, yields `None`. Each argument
/// has its trailing `px` suffix stripped before parsing, so a non-suffixed
/// argument fails to parse and the whole value is treated as "no
/// transform".
pub fn parse_transform(value: &str) -> Option<(f32, f32)> {
    let inner = value.strip_prefix("translate(")?.strip_suffix(')')?;
    let mut parts = inner.split(',').map(str::trim);
    let tx = parts.next()?.trim_end_matches("px").parse().ok()?;
    let ty = parts.next()?.trim_end_matches("px").parse().ok()?;
    Some((tx, ty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::{AttributeMap, Node};
    use fonts::BuiltinFontLibrary;
    use layout::layout_document;

    #[test]
    fn background_color_emits_draw_rrect() {
        let div = Node::new_element("div".to_string(), AttributeMap::default());
        div.borrow_mut().style.insert("background-color".to_string(), "red".to_string());
        div.borrow_mut().style.insert("width".to_string(), "100px".to_string());

        let fonts = BuiltinFontLibrary::new();
        let document = layout_document(div, &fonts);
        let result = paint(&document);

        assert!(result.blend_ops.len() >= 1);
    }

    #[test]
    fn opacity_below_one_is_recorded_on_blend_op() {
        let div = Node::new_element("div".to_string(), AttributeMap::default());
        div.borrow_mut().style.insert("opacity".to_string(), "0.5".to_string());
        let key = element_key(&div);

        let fonts = BuiltinFontLibrary::new();
        let document = layout_document(div, &fonts);
        let result = paint(&document);

        let blend = result.blend_ops.get(&key).expect("blend op recorded for element");
        match &blend.borrow().kind {
            crate::node::DisplayKind::Blend { opacity, .. } => assert_eq!(*opacity, 0.5),
            _ => panic!("expected a Blend node"),
        }
    }

    #[test]
    fn no_transform_parses_to_identity() {
        assert_eq!(parse_transform("rotate(10deg)"), None);
        assert_eq!(parse_transform("translate(10px, 20px)"), Some((10.0, 20.0)));
    }
}
