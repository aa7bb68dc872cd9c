/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

/// Fixed pixel width laid out for every `<input>`/`<button>`.
pub const INPUT_WIDTH_PX: f32 = 200.0;
