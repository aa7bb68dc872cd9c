/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::rc::Rc;

use display_list::{DisplayRef, Surface, WeakDisplayRef};
use geometry::PixelRect;

/// A cached GPU-backed surface holding the rasterized output of one or more
/// sibling paint commands that share the same effect ancestry. Owned by the
/// UI thread; rebuilt by [`composite`] whenever `needs_composite` is set,
/// and re-rastered by `raster::raster` only when `dirty` or `surface` is
/// empty.
pub struct CompositedLayer {
    pub items: Vec<DisplayRef>,
    /// The effect node every item in this layer shares as its immediate
    /// parent, or `None` if the items sit at the root of the display list.
    pub parent: Option<WeakDisplayRef>,
    /// Union of `items`' local rects, outset 1px on each side for
    /// antialiasing.
    pub composited_bounds: PixelRect,
    pub surface: Option<Rc<dyn Surface>>,
    pub dirty: bool,
}

impl CompositedLayer {
    fn new(first_item: DisplayRef, parent: Option<DisplayRef>) -> CompositedLayer {
        let composited_bounds = first_item.borrow().rect.inflate(1.0, 1.0);
        CompositedLayer {
            items: vec![first_item],
            parent: parent.as_ref().map(Rc::downgrade),
            composited_bounds,
            surface: None,
            dirty: true,
        }
    }

    fn push(&mut self, item: DisplayRef) {
        let r = item.borrow().rect.inflate(1.0, 1.0);
        self.composited_bounds = self.composited_bounds.union(&r);
        self.items.push(item);
        self.dirty = true;
    }

    fn shares_parent_with(&self, other_parent: &Option<DisplayRef>) -> bool {
        match (self.parent.as_ref().and_then(WeakDisplayRef::upgrade), other_parent) {
            (Some(a), Some(b)) => Rc::ptr_eq(&a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Absolute-space bounds, used only to decide whether a later command
    /// would be occluded by (and so must not slip underneath) this layer.
    fn absolute_bounds(&self) -> PixelRect {
        self.items
            .iter()
            .map(absolute_bounds)
            .reduce(|a, b| a.union(&b))
            .unwrap_or(self.composited_bounds)
    }
}

/// Maps `node`'s own rect up through every ancestor effect's `map`, to the
/// coordinate space the root observes.
pub fn absolute_bounds(node: &DisplayRef) -> PixelRect {
    let mut r = node.borrow().rect;
    let mut current = node.borrow().parent();
    while let Some(parent) = current {
        r = parent.borrow().map(r);
        current = parent.borrow().parent();
    }
    r
}

/// Walks the display list preorder, retaining leaf paint commands and the
/// nearest `needs_compositing` effect ancestor along each path — leaves
/// under a non-compositing chain of effects are retained directly (they sit
/// at the root compositing scope); a `needs_compositing` effect is retained
/// as a single atomic unit and not descended into further, since its own
/// `execute` already applies its blend/opacity when the layer rasters it.
fn collect_compositable(node: &DisplayRef, out: &mut Vec<DisplayRef>) {
    let n = node.borrow();
    if n.is_effect() {
        if n.needs_compositing {
            drop(n);
            out.push(node.clone());
        } else {
            let children = n.children.clone();
            drop(n);
            for child in &children {
                collect_compositable(child, out);
            }
        }
    } else {
        drop(n);
        out.push(node.clone());
    }
}

/// Groups the display list's retained commands into composited layers,
/// reusing a previous frame's surface for any layer whose bounds are
/// unchanged (keyed here by bounds since that's the only stable identity a
/// freshly rebuilt layer set carries).
pub fn composite(root: &DisplayRef, previous: &[CompositedLayer]) -> Vec<CompositedLayer> {
    let mut retained = Vec::new();
    collect_compositable(root, &mut retained);

    let mut layers: Vec<CompositedLayer> = Vec::new();
    for item in retained {
        let item_parent = item.borrow().parent();
        let item_bounds = absolute_bounds(&item);

        let mut merge_target = None;
        for (i, layer) in layers.iter().enumerate().rev() {
            if layer.shares_parent_with(&item_parent) {
                merge_target = Some(i);
                break;
            }
            if layer.absolute_bounds().intersects(&item_bounds) {
                break;
            }
        }

        match merge_target {
            Some(i) => layers[i].push(item),
            None => layers.push(CompositedLayer::new(item, item_parent)),
        }
    }

    for layer in &mut layers {
        if let Some(reused) = previous
            .iter()
            .find(|old| old.composited_bounds == layer.composited_bounds)
        {
            layer.surface = reused.surface.clone();
            layer.dirty = reused.surface.is_none();
        }
    }

    layers
}

/// The maximum bottom edge of any layer's absolute bounds — the active
/// tab's content height.
pub fn active_tab_height(layers: &[CompositedLayer]) -> f32 {
    layers
        .iter()
        .map(|l| l.absolute_bounds().max_y())
        .fold(0.0_f32, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use display_list::{draw_rect, new_transform};

    #[test]
    fn two_unrelated_rects_composite_into_one_layer_when_non_overlapping_and_unparented() {
        let root = new_transform(0.0, 0.0);
        let a = draw_rect(geometry::rect(0.0, 0.0, 10.0, 10.0), "red".to_string());
        let b = draw_rect(geometry::rect(0.0, 20.0, 10.0, 10.0), "blue".to_string());
        display_list::append_display_child(&root, a);
        display_list::append_display_child(&root, b);
        root.borrow_mut().recompute();

        let layers = composite(&root, &[]);
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].items.len(), 2);
    }

    #[test]
    fn active_tab_height_is_max_bottom_edge() {
        let root = new_transform(0.0, 0.0);
        let a = draw_rect(geometry::rect(0.0, 0.0, 10.0, 68.0), "red".to_string());
        display_list::append_display_child(&root, a);
        root.borrow_mut().recompute();

        let layers = composite(&root, &[]);
        assert_eq!(active_tab_height(&layers), 68.0);
    }
}
