/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::rc::Rc;

use display_list::Canvas;

use crate::compositor::CompositedLayer;

/// Rasters every layer whose surface is missing or marked dirty: allocates
/// a transparent surface sized to the layer's rounded-out bounds, translates
/// so the layer's top-left lands at the surface origin, and executes each
/// item.
pub fn raster_dirty_layers(layers: &mut [CompositedLayer], factory: &dyn Canvas) {
    for layer in layers {
        if layer.surface.is_some() && !layer.dirty {
            continue;
        }

        let bounds = layer.composited_bounds;
        let width = bounds.size.width.ceil().max(1.0) as i32;
        let height = bounds.size.height.ceil().max(1.0) as i32;
        let mut surface = factory.create_surface(width, height);

        {
            let canvas = surface.as_canvas();
            canvas.translate(-bounds.origin.x, -bounds.origin.y);
            for item in &layer.items {
                item.borrow().execute(canvas);
            }
        }

        layer.surface = Some(Rc::from(surface));
        layer.dirty = false;
    }
}
