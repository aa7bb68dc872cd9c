/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The cross-thread handoff from a tab to the UI thread: one lock guarding
//! every field the UI thread reads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use compositing::UiDirtyBits;
use display_list::DisplayRef;
use rustc_hash::FxHashMap;

/// A frame's results, built by a tab and handed to the UI thread by value.
pub struct CommitData {
    pub url: String,
    pub scroll: Option<f32>,
    pub height: f32,
    /// `Some` only on a frame that actually repainted; `None` means the UI
    /// thread should keep whatever display list it already has.
    pub display_list: Option<DisplayRef>,
    /// `Some` only for a compositable-property-only animation tick
    /// (currently `opacity`): asks the UI thread to set `needs_draw` alone,
    /// skipping composite and raster.
    pub composited_updates: Option<FxHashMap<usize, DisplayRef>>,
    /// Whether this tab still wants another animation frame scheduled.
    pub needs_animation_frame: bool,
}

/// Everything the UI thread owns and a tab writes to at commit time: the
/// active-tab fields, the committed display list, the `composited_updates`
/// map, the UI dirty bits, and the animation-timer arm bit.
#[derive(Default)]
pub struct UiState {
    pub active_tab_url: String,
    pub active_tab_scroll: f32,
    pub active_tab_height: f32,
    pub display_list: Option<DisplayRef>,
    pub composited_updates: FxHashMap<usize, DisplayRef>,
    pub dirty: UiDirtyBits,
    pub animation_timer_armed: bool,
    pub wants_animation_frame: bool,
}

/// One [`CommitChannel`] is shared between the UI thread and every tab;
/// only the tab currently marked active actually writes a commit through —
/// a commit from tab T is applied to UI state only if T is still the
/// active tab at acquire time.
pub struct CommitChannel {
    state: parking_lot::Mutex<UiState>,
    active_tab_id: AtomicU64,
}

impl CommitChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(CommitChannel {
            state: parking_lot::Mutex::new(UiState::default()),
            active_tab_id: AtomicU64::new(0),
        })
    }

    pub fn set_active_tab(&self, tab_id: u64) {
        self.active_tab_id.store(tab_id, Ordering::SeqCst);
    }

    pub fn is_active_tab(&self, tab_id: u64) -> bool {
        self.active_tab_id.load(Ordering::SeqCst) == tab_id
    }

    /// Applies `commit` to the shared UI state iff `tab_id` is still the
    /// active tab, clearing the animation timer and escalating UI dirty
    /// bits as the commit's contents require. Never blocks on the tab
    /// thread — the critical section only copies already-built values.
    pub fn commit(&self, tab_id: u64, commit: CommitData) {
        if !self.is_active_tab(tab_id) {
            return;
        }

        let mut state = self.state.lock();
        state.active_tab_url = commit.url;
        if let Some(scroll) = commit.scroll {
            state.active_tab_scroll = scroll;
            state.dirty.set_needs_draw();
        }
        state.active_tab_height = commit.height;
        state.animation_timer_armed = false;
        state.wants_animation_frame = commit.needs_animation_frame;

        if let Some(root) = commit.display_list {
            state.display_list = Some(root);
            state.composited_updates.clear();
            state.dirty.set_needs_composite();
        } else if let Some(updates) = commit.composited_updates {
            state.composited_updates = updates;
            state.dirty.set_needs_draw();
        }
    }

    pub fn lock(&self) -> parking_lot::MutexGuard<'_, UiState> {
        self.state.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit_data() -> CommitData {
        CommitData {
            url: "file:///a".to_string(),
            scroll: None,
            height: 0.0,
            display_list: None,
            composited_updates: None,
            needs_animation_frame: false,
        }
    }

    #[test]
    fn commit_from_inactive_tab_is_dropped() {
        let channel = CommitChannel::new();
        channel.set_active_tab(1);
        channel.commit(2, commit_data());
        assert_eq!(channel.lock().active_tab_url, "");
    }

    #[test]
    fn commit_from_active_tab_updates_url() {
        let channel = CommitChannel::new();
        channel.set_active_tab(1);
        channel.commit(1, commit_data());
        assert_eq!(channel.lock().active_tab_url, "file:///a");
    }

    #[test]
    fn scroll_only_commit_sets_needs_draw_but_not_needs_composite() {
        let channel = CommitChannel::new();
        channel.set_active_tab(1);
        let mut data = commit_data();
        data.scroll = Some(42.0);
        channel.commit(1, data);

        let state = channel.lock();
        assert_eq!(state.active_tab_scroll, 42.0);
        assert!(state.dirty.needs_draw);
        assert!(!state.dirty.needs_composite);
    }
}
