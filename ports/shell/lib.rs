/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The windowed shell: the one concrete `Canvas`/graphics backend and the
//! `winit` event source the rendering core is driven from end to end.
//!
//! The graphics backend and the windowing/input event source are reached
//! only through traits elsewhere in the workspace; this crate is where the
//! concrete embedder finally picks concrete ones and wires them together.

mod app;
mod canvas;
mod cli;

pub use app::run;
pub use canvas::RasterSurface;
pub use cli::default_url;
