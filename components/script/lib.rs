/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! A tab's render state, its task queue, and the commit handoff to the UI
//! thread.

mod commit;
mod context;
mod tab;
mod task;

pub use commit::{CommitChannel, CommitData, UiState};
pub use context::{NullScriptContext, ScriptContext};
pub use tab::Tab;
pub use task::{TaskKind, TaskRunner};
