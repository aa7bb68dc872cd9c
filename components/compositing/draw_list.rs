/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::rc::Rc;

use display_list::{append_display_child, draw_custom, Canvas, CustomPaint, DisplayRef};
use rustc_hash::FxHashMap;

use crate::compositor::CompositedLayer;

/// A leaf that blits a composited layer's cached surface at its bounds'
/// origin.
struct DrawCompositedLayer {
    surface: Rc<dyn display_list::Surface>,
    x: f32,
    y: f32,
}

impl CustomPaint for DrawCompositedLayer {
    fn execute(&self, canvas: &mut dyn Canvas) {
        canvas.draw_surface(self.surface.as_ref(), self.x, self.y);
    }
}

/// Builds the flat draw list: each composited layer's surface wrapped in a
/// clone of its ancestor effect chain, bottom-up, with siblings that share
/// an ancestor sharing the same cloned wrapper.
///
/// `composited_updates` substitutes a refreshed effect for any ancestor
/// whose element has one, so an opacity-only animation tick can change the
/// draw output without re-rastering the layers beneath it.
pub fn assemble_draw_list(
    layers: &[CompositedLayer],
    composited_updates: &FxHashMap<usize, DisplayRef>,
) -> Vec<DisplayRef> {
    let mut wrapper_cache: FxHashMap<usize, DisplayRef> = FxHashMap::default();
    let mut top_level: Vec<DisplayRef> = Vec::new();

    for layer in layers {
        let Some(surface) = layer.surface.clone() else {
            continue;
        };
        let leaf = draw_custom(
            layer.composited_bounds,
            Rc::new(DrawCompositedLayer {
                surface,
                x: layer.composited_bounds.origin.x,
                y: layer.composited_bounds.origin.y,
            }),
        );

        let ancestor = layer.parent.as_ref().and_then(|p| p.upgrade());
        let wrapped = wrap_with_ancestors(leaf, ancestor, composited_updates, &mut wrapper_cache);

        if !top_level.iter().any(|w| Rc::ptr_eq(w, &wrapped)) {
            top_level.push(wrapped);
        }
    }

    top_level
}

fn wrap_with_ancestors(
    child: DisplayRef,
    ancestor: Option<DisplayRef>,
    composited_updates: &FxHashMap<usize, DisplayRef>,
    cache: &mut FxHashMap<usize, DisplayRef>,
) -> DisplayRef {
    let Some(ancestor) = ancestor else {
        return child;
    };

    let cache_key = Rc::as_ptr(&ancestor) as usize;
    if let Some(existing) = cache.get(&cache_key).cloned() {
        // `existing` is only the immediate per-ancestor wrapper built the
        // first time this ancestor was wrapped; it may itself already sit
        // nested several levels inside a top-level wrapper already pushed
        // to `top_level` (the compositor's overlap-blocking rule can force
        // two differently-parented composited layers to share a
        // non-root ancestor further up their chains). Returning `existing`
        // directly would make the caller push that inner wrapper's subtree
        // into the flat draw list a second time. Climb the real parent
        // links built by the first pass up to the chain's actual root,
        // recomputing each ancestor's rect on the way since the union of
        // its children just changed.
        append_display_child(&existing, child);
        existing.borrow_mut().recompute();
        return top_of_chain(&existing);
    }

    let element_key = ancestor
        .borrow()
        .element
        .as_ref()
        .map(|n| Rc::as_ptr(n) as usize);
    let basis = element_key
        .and_then(|key| composited_updates.get(&key).cloned())
        .unwrap_or_else(|| ancestor.clone());

    let wrapper = basis.borrow().clone_with_children(vec![child]);
    cache.insert(cache_key, wrapper.clone());

    let grandparent = ancestor.borrow().parent();
    wrap_with_ancestors(wrapper, grandparent, composited_updates, cache)
}

/// Climbs `node`'s real parent links (set by [`append_display_child`] as
/// each ancestor wrapper was built) up to the one with no parent — the
/// top-level wrapper already in `top_level` — recomputing each ancestor's
/// rect along the way.
fn top_of_chain(node: &DisplayRef) -> DisplayRef {
    let mut current = node.clone();
    loop {
        let parent = current.borrow().parent();
        match parent {
            Some(parent) => {
                parent.borrow_mut().recompute();
                current = parent;
            }
            None => return current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use display_list::{draw_rect, new_blend, new_transform, Surface};
    use geometry::rect;

    /// A `Surface` that is never actually drawn into or executed against in
    /// these tests — they only check the *shape* of the assembled draw
    /// list, never call `execute` on it.
    struct StubSurface;

    impl Surface for StubSurface {
        fn width(&self) -> i32 {
            1
        }
        fn height(&self) -> i32 {
            1
        }
        fn as_canvas(&mut self) -> &mut dyn Canvas {
            unimplemented!("tests in this module never execute a StubSurface")
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn layer_for(item: DisplayRef, parent: &DisplayRef, bounds: geometry::PixelRect) -> CompositedLayer {
        CompositedLayer {
            items: vec![item],
            parent: Some(Rc::downgrade(parent)),
            composited_bounds: bounds,
            surface: Some(Rc::new(StubSurface) as Rc<dyn Surface>),
            dirty: false,
        }
    }

    /// Counts the leaves (nodes with no children) in the subtree rooted at
    /// `node`, i.e. how many distinct `DrawCompositedLayer`s it executes.
    fn count_leaves(node: &DisplayRef) -> usize {
        let n = node.borrow();
        if n.children.is_empty() {
            1
        } else {
            n.children.iter().map(count_leaves).sum()
        }
    }

    #[test]
    fn two_layers_sharing_a_two_level_up_ancestor_collapse_into_one_top_level_wrapper() {
        // root -> common_ancestor -> {parent_a -> leaf_a, parent_b -> leaf_b}
        // `parent_a`/`parent_b` are the layers' own immediate parents (so
        // they form two distinct `CompositedLayer`s, exactly as the
        // compositor's overlap-blocking rule can produce for two
        // differently-parented layers that share a grandparent), but both
        // climb to the same non-root `common_ancestor`.
        let root = new_transform(0.0, 0.0);
        let common_ancestor = new_blend(1.0, None);
        append_display_child(&root, common_ancestor.clone());
        root.borrow_mut().recompute();

        let parent_a = new_transform(0.0, 0.0);
        let parent_b = new_transform(0.0, 0.0);
        append_display_child(&common_ancestor, parent_a.clone());
        append_display_child(&common_ancestor, parent_b.clone());
        common_ancestor.borrow_mut().recompute();

        let leaf_a = draw_rect(rect(0.0, 0.0, 10.0, 10.0), "red".to_string());
        let leaf_b = draw_rect(rect(0.0, 20.0, 10.0, 10.0), "blue".to_string());
        append_display_child(&parent_a, leaf_a.clone());
        append_display_child(&parent_b, leaf_b.clone());
        parent_a.borrow_mut().recompute();
        parent_b.borrow_mut().recompute();

        let layer_a = layer_for(leaf_a, &parent_a, rect(0.0, 0.0, 10.0, 10.0));
        let layer_b = layer_for(leaf_b, &parent_b, rect(0.0, 20.0, 10.0, 10.0));

        let draw_list = assemble_draw_list(&[layer_a, layer_b], &FxHashMap::default());

        assert_eq!(
            draw_list.len(),
            1,
            "both layers share common_ancestor two levels up and must collapse into a single top-level wrapper"
        );
        assert_eq!(
            count_leaves(&draw_list[0]),
            2,
            "each composited layer's surface leaf must appear exactly once in the flattened tree"
        );
    }
}
