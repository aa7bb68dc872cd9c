/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! A per-tab FIFO task queue: `schedule_task` appends and wakes, the worker
//! loop waits while idle and re-checks the quit flag once woken.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// The task kinds the UI thread schedules onto a tab. This is a closed
/// enum rather than an arbitrary boxed closure: `wisp-dom`'s element tree
/// is `Rc`-based and not `Send`, so a task can only carry the plain data a
/// tab turns into a DOM operation, never a closure capturing the tree
/// itself.
#[derive(Debug, Clone)]
pub enum TaskKind {
    Load { url: String, body: Option<String> },
    Click { x: f32, y: f32 },
    KeyPress { ch: char },
    Backspace,
    GoBack,
    SetNeedsRender,
    RunScript { src: String, code: String },
    RunAnimationFrame,
    ScrollUp,
    ScrollDown,
}

#[derive(Default)]
struct State {
    tasks: VecDeque<TaskKind>,
    needs_quit: bool,
}

/// A `Condvar`-guarded FIFO queue shared between the UI thread (which
/// schedules tasks) and exactly one tab worker, real or cooperative: no two
/// tasks on the same tab ever run concurrently.
#[derive(Default)]
pub struct TaskRunner {
    state: Mutex<State>,
    condition: Condvar,
}

impl TaskRunner {
    pub fn new() -> Self {
        TaskRunner::default()
    }

    /// Appends `task` to the queue and wakes a blocked worker.
    pub fn schedule_task(&self, task: TaskKind) {
        let mut state = self.state.lock();
        state.tasks.push_back(task);
        self.condition.notify_all();
    }

    /// Drops every queued task without running it; an already-running task
    /// still finishes. Used on navigation.
    pub fn clear_pending_tasks(&self) {
        self.state.lock().tasks.clear();
    }

    /// Flips the quit flag and wakes the worker so it observes it.
    pub fn set_needs_quit(&self) {
        let mut state = self.state.lock();
        state.needs_quit = true;
        self.condition.notify_all();
    }

    /// Pops the next task without blocking. Used by a cooperative poll loop
    /// that shares an OS thread with the UI loop (see `ports/shell`).
    pub fn try_next_task(&self) -> Option<TaskKind> {
        self.state.lock().tasks.pop_front()
    }

    /// Pops the next task, blocking the caller while the queue is empty and
    /// quit hasn't been requested. Returns `None` once `set_needs_quit` has
    /// been called and the queue has drained — the condition a dedicated
    /// worker thread would loop on.
    pub fn next_task(&self) -> Option<TaskKind> {
        let mut state = self.state.lock();
        loop {
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            if state.needs_quit {
                return None;
            }
            self.condition.wait(&mut state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn schedule_then_drain_runs_in_fifo_order() {
        let runner = TaskRunner::new();
        runner.schedule_task(TaskKind::ScrollDown);
        runner.schedule_task(TaskKind::ScrollUp);

        assert!(matches!(runner.try_next_task(), Some(TaskKind::ScrollDown)));
        assert!(matches!(runner.try_next_task(), Some(TaskKind::ScrollUp)));
        assert!(runner.try_next_task().is_none());
    }

    #[test]
    fn clear_pending_tasks_drops_queued_work() {
        let runner = TaskRunner::new();
        runner.schedule_task(TaskKind::ScrollDown);
        runner.clear_pending_tasks();
        assert!(runner.try_next_task().is_none());
    }

    #[test]
    fn next_task_returns_none_once_quit_is_requested_and_queue_is_empty() {
        let runner = TaskRunner::new();
        runner.set_needs_quit();
        assert!(runner.next_task().is_none());
    }

    #[test]
    fn worker_thread_wakes_for_a_task_scheduled_after_it_blocks() {
        let runner = Arc::new(TaskRunner::new());
        let worker_runner = runner.clone();
        let handle = thread::spawn(move || worker_runner.next_task());

        thread::sleep(std::time::Duration::from_millis(20));
        runner.schedule_task(TaskKind::ScrollUp);

        let task = handle.join().unwrap();
        assert!(matches!(task, Some(TaskKind::ScrollUp)));
    }
}
