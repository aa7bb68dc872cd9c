/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Groups the display list into cached composited layers, rasters the dirty
//! ones, and assembles the flat draw list the UI thread blits.

mod compositor;
mod draw_list;
mod pipeline;
mod raster;

pub use compositor::{absolute_bounds, active_tab_height, composite, CompositedLayer};
pub use draw_list::assemble_draw_list;
pub use pipeline::{Pipeline, TabDirtyBits, UiDirtyBits};
pub use raster::raster_dirty_layers;
