/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! CSS declaration/selector parsing and cascade resolution.
//!
//! The selector grammar covers only tag and descendant selectors, and the
//! value grammar covers only what the cascade needs — no shorthand
//! expansion, no `calc()`, no media queries.

mod cascade;
mod parser;
mod selector;

pub use cascade::{cascade_priority, diff_styles, resolve_style, RenderEffect};
pub use parser::{parse_transition, CssParser};
pub use selector::{Rule, Selector};
