/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The seam between a tab and its embedded script engine.
//!
//! A real engine would export `log`, `querySelectorAll`, `getAttribute`,
//! `innerHTML_set`, `style_set`, `XMLHttpRequest_send`, `setTimeout` and
//! `requestAnimationFrame` to the embedded interpreter, and the interpreter
//! would call back into the browser through the string protocol
//! `"new Node(handle).dispatchEvent(new Event(type))"`. No embedded script
//! interpreter is implemented here, so this crate's trait only covers the
//! two operations `wisp-script::Tab` itself drives: running a fetched
//! script body, and asking whether a synthetic event's default action was
//! prevented. A real engine would additionally need a handle back into the
//! owning `Tab` to implement the DOM-bridge functions above; that handle is
//! deliberately left out of this trait; see `DESIGN.md`.

use dom::NodeRef;

/// The script engine a tab runs its fetched `<script>` bodies through.
pub trait ScriptContext: Send {
    /// Evaluates a fetched script body. `script` is its src URL, used only
    /// for diagnostics when a script raises at the interpreter boundary.
    fn run(&mut self, script: &str, code: &str);

    /// Dispatches a synthetic `event_type` event targeting `node`. Returns
    /// whether the event's default action was prevented.
    fn dispatch_event(&mut self, event_type: &str, node: &NodeRef) -> bool;

    /// Marks every pending async completion (XHR, `setTimeout`) owned by
    /// this context as belonging to a discarded tab: their callbacks must
    /// not run.
    fn discard(&mut self);
}

/// A [`ScriptContext`] with no embedded interpreter: `run` only logs,
/// `dispatch_event` never prevents a default action, matching a page with
/// no script able to call `preventDefault`.
#[derive(Default)]
pub struct NullScriptContext {
    discarded: bool,
}

impl NullScriptContext {
    pub fn new() -> Self {
        NullScriptContext::default()
    }
}

impl ScriptContext for NullScriptContext {
    fn run(&mut self, script: &str, _code: &str) {
        log::debug!("no embedded script engine; skipping execution of {script}");
    }

    fn dispatch_event(&mut self, _event_type: &str, _node: &NodeRef) -> bool {
        false
    }

    fn discard(&mut self) {
        self.discarded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::{AttributeMap, Node};

    #[test]
    fn dispatch_event_never_prevents_default() {
        let mut ctx = NullScriptContext::new();
        let node = Node::new_element("a".to_string(), AttributeMap::default());
        assert!(!ctx.dispatch_event("click", &node));
    }

    #[test]
    fn discard_sets_flag() {
        let mut ctx = NullScriptContext::new();
        ctx.discard();
        assert!(ctx.discarded);
    }
}
