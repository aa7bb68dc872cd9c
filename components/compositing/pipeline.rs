/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use display_list::{Canvas, DisplayRef};
use rustc_hash::FxHashMap;

use crate::compositor::{active_tab_height, composite, CompositedLayer};
use crate::draw_list::assemble_draw_list;

/// The three dirty bits the tab thread owns, escalating monotonically
/// within a frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct TabDirtyBits {
    pub needs_style: bool,
    pub needs_layout: bool,
    pub needs_paint: bool,
}

impl TabDirtyBits {
    pub fn set_needs_style(&mut self) {
        self.needs_style = true;
        self.set_needs_layout();
    }

    pub fn set_needs_layout(&mut self) {
        self.needs_layout = true;
        self.set_needs_paint();
    }

    pub fn set_needs_paint(&mut self) {
        self.needs_paint = true;
    }

    pub fn clear(&mut self) {
        *self = TabDirtyBits::default();
    }
}

/// The three dirty bits the UI thread owns. Any set bit forces every
/// lower-priority bit set too; all three clear together after a successful
/// `composite_raster_and_draw`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UiDirtyBits {
    pub needs_composite: bool,
    pub needs_raster: bool,
    pub needs_draw: bool,
}

impl UiDirtyBits {
    pub fn set_needs_composite(&mut self) {
        self.needs_composite = true;
        self.set_needs_raster();
    }

    pub fn set_needs_raster(&mut self) {
        self.needs_raster = true;
        self.set_needs_draw();
    }

    pub fn set_needs_draw(&mut self) {
        self.needs_draw = true;
    }

    pub fn clear(&mut self) {
        *self = UiDirtyBits::default();
    }

    pub fn any(&self) -> bool {
        self.needs_composite || self.needs_raster || self.needs_draw
    }
}

/// Owns the UI-side composited layer cache and dirty bits, and runs the
/// composite/raster/draw stages a frame's bits require.
#[derive(Default)]
pub struct Pipeline {
    pub layers: Vec<CompositedLayer>,
    pub dirty: UiDirtyBits,
    pub active_tab_height: f32,
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline::default()
    }

    /// Runs whichever of composite/raster/draw the current dirty bits
    /// require, in order, clearing bits as each stage completes. Returns
    /// the flat draw list the UI thread blits, or `None` if nothing needed
    /// redrawing.
    pub fn composite_raster_and_draw(
        &mut self,
        root: &DisplayRef,
        composited_updates: &FxHashMap<usize, DisplayRef>,
        canvas: &dyn Canvas,
    ) -> Option<Vec<DisplayRef>> {
        if !self.dirty.any() {
            return None;
        }

        if self.dirty.needs_composite {
            self.layers = composite(root, &self.layers);
            self.active_tab_height = active_tab_height(&self.layers);
        }

        if self.dirty.needs_raster {
            crate::raster::raster_dirty_layers(&mut self.layers, canvas);
        }

        let draw_list = if self.dirty.needs_draw {
            Some(assemble_draw_list(&self.layers, composited_updates))
        } else {
            None
        };

        self.dirty.clear();
        draw_list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_needs_style_escalates_to_every_tab_bit() {
        let mut bits = TabDirtyBits::default();
        bits.set_needs_style();
        assert!(bits.needs_style && bits.needs_layout && bits.needs_paint);
    }

    #[test]
    fn setting_needs_raster_escalates_to_needs_draw_only() {
        let mut bits = UiDirtyBits::default();
        bits.set_needs_raster();
        assert!(!bits.needs_composite);
        assert!(bits.needs_raster && bits.needs_draw);
    }

    #[test]
    fn clear_resets_every_bit() {
        let mut bits = UiDirtyBits::default();
        bits.set_needs_composite();
        bits.clear();
        assert!(!bits.any());
    }
}
