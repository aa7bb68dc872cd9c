/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Chrome-trace-format profiler, writing `browser.json` incrementally: one
//! leading `M` `process_name` record, a `B`/`E` pair per named unit of work,
//! and `M` `thread_name` records written at shutdown. There is no portable
//! way to enumerate live threads, so callers register each thread's name
//! explicitly via [`Profiler::register_thread`] as it starts.

use std::fs::File;
use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde_json::json;

/// A thread id/name pair recorded for the closing `thread_name` metadata.
struct ThreadRecord {
    tid: u64,
    name: String,
}

struct Inner {
    file: File,
    threads: Vec<ThreadRecord>,
}

/// Writes `browser.json`, a Chrome `about://tracing`-compatible event log.
///
/// One [`Profiler`] is shared across every thread in the process (UI thread
/// and every tab's script thread); all writes go through a single
/// [`parking_lot::Mutex`].
pub struct Profiler {
    inner: Mutex<Inner>,
}

fn timestamp_micros() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_micros()
}

fn current_tid() -> u64 {
    // std::thread::ThreadId has no stable numeric representation; derive a
    // process-unique one from its Debug output, which is stable for the
    // lifetime of the thread.
    use std::hash::{Hash, Hasher};
    let mut hasher = rustc_hash_fallback_hasher();
    std::thread::current().id().hash(&mut hasher);
    hasher.finish()
}

fn rustc_hash_fallback_hasher() -> std::collections::hash_map::DefaultHasher {
    std::collections::hash_map::DefaultHasher::new()
}

impl Profiler {
    /// Opens (truncating) `path` and writes the leading `process_name` record.
    pub fn create(path: &str) -> io::Result<Self> {
        let mut file = File::create(path)?;
        let record = json!({
            "name": "process_name",
            "ph": "M",
            "ts": timestamp_micros() as u64,
            "pid": 1,
            "cat": "__metadata",
            "args": {"name": "Browser"},
        });
        write!(file, "{{\"traceEvents\": [{record}")?;
        file.flush()?;
        Ok(Self {
            inner: Mutex::new(Inner {
                file,
                threads: Vec::new(),
            }),
        })
    }

    /// Records the calling thread's name so `finish` can emit a
    /// `thread_name` metadata record for it at shutdown.
    pub fn register_thread(&self, name: &str) {
        let mut inner = self.inner.lock();
        let tid = current_tid();
        if !inner.threads.iter().any(|t| t.tid == tid) {
            inner.threads.push(ThreadRecord {
                tid,
                name: name.to_string(),
            });
        }
    }

    /// Emits a `B` (begin) event for a named unit of work on the calling thread.
    pub fn time(&self, name: &str) {
        let record = json!({
            "ph": "B",
            "cat": "_",
            "name": name,
            "ts": timestamp_micros() as u64,
            "pid": 1,
            "tid": current_tid(),
        });
        let mut inner = self.inner.lock();
        if let Err(err) = write!(inner.file, ", {record}") {
            log::warn!("profiler: failed to write begin event for {name}: {err}");
        }
        let _ = inner.file.flush();
    }

    /// Emits an `E` (end) event matching the most recent [`Profiler::time`]
    /// call with the same `name` on this thread.
    pub fn stop(&self, name: &str) {
        let record = json!({
            "ph": "E",
            "cat": "_",
            "name": name,
            "ts": timestamp_micros() as u64,
            "pid": 1,
            "tid": current_tid(),
        });
        let mut inner = self.inner.lock();
        let _ = write!(inner.file, ", {record}");
        let _ = inner.file.flush();
    }

    /// Writes the closing `thread_name` records and closes the trace array.
    /// No further events may be written afterwards.
    pub fn finish(&self) {
        let mut inner = self.inner.lock();
        let records: Vec<String> = inner
            .threads
            .iter()
            .map(|t| {
                json!({
                    "ph": "M",
                    "name": "thread_name",
                    "pid": 1,
                    "tid": t.tid,
                    "args": {"name": t.name},
                })
                .to_string()
            })
            .collect();
        for record in records {
            let _ = write!(inner.file, ", {record}");
        }
        let _ = inner.file.write_all(b"]}");
        let _ = inner.file.flush();
    }
}

/// RAII guard returned by [`Profiler::scope`] that calls `stop` on drop, so a
/// unit of work is always closed even if the caller returns early or panics.
pub struct ScopeGuard<'a> {
    profiler: &'a Profiler,
    name: String,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.profiler.stop(&self.name);
    }
}

impl Profiler {
    /// Begins a unit of work and returns a guard that ends it on drop.
    pub fn scope<'a>(&'a self, name: &str) -> ScopeGuard<'a> {
        self.time(name);
        ScopeGuard {
            profiler: self,
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_emits_matched_begin_and_end() {
        let dir = std::env::temp_dir().join("wisp-profile-test.json");
        let path = dir.to_str().unwrap();
        let profiler = Profiler::create(path).unwrap();
        profiler.register_thread("main");
        {
            let _scope = profiler.scope("layout");
        }
        profiler.finish();

        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("\"ph\":\"B\""));
        assert!(contents.contains("\"ph\":\"E\""));
        assert!(contents.contains("\"name\":\"layout\""));
        let _ = std::fs::remove_file(path);
    }
}
