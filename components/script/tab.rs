/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! A single tab: the element tree, layout tree, display list and all the
//! navigation/interaction state that lives on the tab's own thread.
//!
//! `load`, `click`, `keypress`, `scroll_down`/`scroll_up`, `go_back`,
//! `submit_form` and `allowed_request` drive one tab's navigation and
//! interaction state. On unfocus, the previously-focused node's
//! `is_focused` flag is explicitly cleared, so its focus ring never lingers
//! after a new element takes focus.

use std::sync::Arc;

use compositing::TabDirtyBits;
use display_list::parse_transform;
use dom::{append_child, tree_to_list, Node, NodeRef};
use fonts::FontLibrary;
use geometry::{PixelRect, PixelVector};
use layout::{layout_document, layout_tree_to_list, LayoutRef};
use net::{HttpClient, Request, Url};
use rustc_hash::FxHashMap;
use style::{cascade_priority, resolve_style, CssParser, Rule};

use crate::commit::{CommitChannel, CommitData};
use crate::context::ScriptContext;
use crate::task::TaskKind;

/// A single tab's full render state. Lives entirely on the thread (real or
/// cooperative) that owns it: its element tree, layout tree and display
/// list are `Rc`-based and must never be observed from another thread
/// Only the values a [`CommitData`] carries ever leave this thread.
pub struct Tab {
    id: u64,
    http: Box<dyn HttpClient>,
    fonts: Arc<dyn FontLibrary>,
    script: Box<dyn ScriptContext>,
    channel: Arc<CommitChannel>,

    document_url: Option<Url>,
    history: Vec<Url>,
    root: Option<NodeRef>,
    rules: Vec<Rule>,
    allowed_origins: Option<Vec<String>>,

    document: Option<LayoutRef>,
    paint_result: Option<display_list::PaintResult>,

    scroll: f32,
    tab_height: f32,
    focus: Option<NodeRef>,

    dirty: TabDirtyBits,
    needs_animation_frame: bool,
    repainted_since_last_commit: bool,
    pending_composited_updates: Option<FxHashMap<usize, display_list::DisplayRef>>,
    pending_scripts: Vec<(String, String)>,
}

impl Tab {
    pub fn new(
        id: u64,
        http: Box<dyn HttpClient>,
        fonts: Arc<dyn FontLibrary>,
        script: Box<dyn ScriptContext>,
        channel: Arc<CommitChannel>,
        tab_height: f32,
    ) -> Tab {
        Tab {
            id,
            http,
            fonts,
            script,
            channel,
            document_url: None,
            history: Vec::new(),
            root: None,
            rules: Vec::new(),
            allowed_origins: None,
            document: None,
            paint_result: None,
            scroll: 0.0,
            tab_height,
            focus: None,
            dirty: TabDirtyBits::default(),
            needs_animation_frame: false,
            repainted_since_last_commit: false,
            pending_composited_updates: None,
            pending_scripts: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Runs one task to completion, always committing afterwards — even a
    /// no-op task commits, so a scroll change that didn't touch the dirty
    /// bits still reaches the UI thread.
    pub fn handle_task(&mut self, task: TaskKind) {
        match task {
            TaskKind::Load { url, body } => self.load(&url, body.as_deref()),
            TaskKind::Click { x, y } => self.click(x, y),
            TaskKind::KeyPress { ch } => self.keypress(ch),
            TaskKind::Backspace => self.backspace(),
            TaskKind::GoBack => self.go_back(),
            TaskKind::SetNeedsRender => {
                self.dirty.set_needs_style();
                self.render();
            }
            TaskKind::RunScript { src, code } => self.script.run(&src, &code),
            TaskKind::RunAnimationFrame => self.run_animation_frame(),
            TaskKind::ScrollUp => self.scroll_up(),
            TaskKind::ScrollDown => self.scroll_down(),
        }
        self.commit();
    }

    /// Runs the full navigation sequence: discard the old script context,
    /// reset scroll state, fetch and parse the document, fetch its scripts
    /// and stylesheets, then render. The caller (the task runner's owner)
    /// is responsible for draining any tasks still queued for the old
    /// document before scheduling `Load`; `load` itself only discards the
    /// old script context.
    pub fn load(&mut self, url: &str, body: Option<&str>) {
        self.script.discard();

        self.scroll = 0.0;
        self.focus = None;

        let url = match Url::parse(url) {
            Ok(url) => url,
            Err(err) => {
                log::warn!("failed to parse url {url}: {err}");
                return;
            }
        };

        let response = match self.http.request(Request {
            url: &url,
            referrer: self.document_url.as_ref(),
            body,
        }) {
            Ok(response) => response,
            Err(err) => {
                log::warn!("failed to load {}: {err}", url.to_url_string());
                return;
            }
        };

        self.history.push(url.clone());
        self.document_url = Some(url.clone());

        let root = html::HtmlParser::new(response.body).parse();

        self.allowed_origins = response
            .headers
            .get("content-security-policy")
            .and_then(|csp| parse_csp(csp));

        let mut script_srcs = Vec::new();
        let mut stylesheet_hrefs = Vec::new();
        let mut nodes = Vec::new();
        tree_to_list(&root, &mut nodes);
        for node in &nodes {
            let n = node.borrow();
            if n.tag() == Some("script") {
                if let Some(src) = n.attribute("src") {
                    script_srcs.push(src.to_string());
                }
            }
            if n.tag() == Some("link") && n.attribute("rel") == Some("stylesheet") {
                if let Some(href) = n.attribute("href") {
                    stylesheet_hrefs.push(href.to_string());
                }
            }
        }

        self.rules = CssParser::new(config::DEFAULT_STYLE_SHEET).parse();

        for src in script_srcs {
            let Ok(script_url) = url.resolve(&src) else { continue };
            if !self.allowed_request(&script_url) {
                log::warn!("blocked script {src} by content-security-policy");
                continue;
            }
            match self.http.request(Request { url: &script_url, referrer: Some(&url), body: None }) {
                Ok(response) => {
                    // Fetched eagerly but executed only once the document is
                    // fully parsed, so a script can never observe a
                    // half-built tree.
                    self.pending_scripts.push((src, response.body));
                }
                Err(err) => log::warn!("failed to fetch script {src}: {err}"),
            }
        }

        for href in stylesheet_hrefs {
            let Ok(style_url) = url.resolve(&href) else { continue };
            match self.http.request(Request { url: &style_url, referrer: Some(&url), body: None }) {
                Ok(response) => self.rules.extend(CssParser::new(&response.body).parse()),
                Err(err) => log::warn!("failed to fetch stylesheet {href}: {err}"),
            }
        }

        self.root = Some(root);
        self.dirty.set_needs_style();
        self.render();

        for (src, code) in self.pending_scripts.drain(..).collect::<Vec<_>>() {
            self.script.run(&src, &code);
        }
    }

    fn allowed_request(&self, url: &Url) -> bool {
        match &self.allowed_origins {
            None => true,
            Some(origins) => origins.contains(&url.origin()),
        }
    }

    /// Hit-tests the click point against the layout tree and dispatches to
    /// the deepest matching element: a link navigates, an input focuses,
    /// a button submits its enclosing form.
    pub fn click(&mut self, x: f32, y: f32) {
        if let Some(old_focus) = self.focus.take() {
            old_focus.borrow_mut().is_focused = false;
        }

        let y = y + self.scroll;
        let Some(document) = self.document.clone() else { return };

        let mut objects = Vec::new();
        layout_tree_to_list(&document, &mut objects);

        // Document order lists ancestors before descendants, so the last
        // match is the deepest (innermost) one under the click point.
        let hit = objects.into_iter().rev().find(|obj| {
            let bounds = absolute_bounds(obj);
            bounds.min_x() <= x && x <= bounds.max_x() && bounds.min_y() <= y && y <= bounds.max_y()
        });

        let Some(hit) = hit else { return };
        let Some(mut elt) = hit.borrow().node.clone() else {
            self.render();
            return;
        };

        loop {
            let is_text = !elt.borrow().is_element();
            if is_text {
                // no-op, climb to parent.
            } else {
                let tag = elt.borrow().tag().map(str::to_string);
                match tag.as_deref() {
                    Some("a") if elt.borrow().attribute("href").is_some() => {
                        if self.script.dispatch_event("click", &elt) {
                            return;
                        }
                        let href = elt.borrow().attribute("href").unwrap().to_string();
                        if let Some(base) = self.document_url.clone() {
                            if let Ok(resolved) = base.resolve(&href) {
                                self.load(&resolved.to_url_string(), None);
                            }
                        }
                        return;
                    }
                    Some("input") => {
                        if self.script.dispatch_event("click", &elt) {
                            return;
                        }
                        elt.borrow_mut().set_attribute("value", String::new());
                        elt.borrow_mut().is_focused = true;
                        self.focus = Some(elt);
                        self.dirty.set_needs_paint();
                        self.render();
                        return;
                    }
                    Some("button") => {
                        if self.script.dispatch_event("click", &elt) {
                            return;
                        }
                        let mut form_ancestor = Some(elt.clone());
                        while let Some(candidate) = form_ancestor {
                            let is_form_with_action = candidate.borrow().tag() == Some("form")
                                && candidate.borrow().attribute("action").is_some();
                            if is_form_with_action {
                                self.submit_form(&candidate);
                                return;
                            }
                            form_ancestor = candidate.borrow().parent();
                        }
                    }
                    _ => {}
                }
            }

            let parent = elt.borrow().parent();
            match parent {
                Some(parent) => elt = parent,
                None => break,
            }
        }

        self.render();
    }

    /// Submits a `<form action=...>`: percent-encodes its named inputs as
    /// `x-www-form-urlencoded` and loads the result.
    fn submit_form(&mut self, form: &NodeRef) {
        if self.script.dispatch_event("submit", form) {
            return;
        }

        let mut inputs = Vec::new();
        tree_to_list(form, &mut inputs);

        let mut body = String::new();
        for input in &inputs {
            let n = input.borrow();
            if n.tag() != Some("input") {
                continue;
            }
            let Some(name) = n.attribute("name") else { continue };
            let value = n.attribute("value").unwrap_or("");
            body.push('&');
            body.push_str(&percent_encode(name));
            body.push('=');
            body.push_str(&percent_encode(value));
        }
        let body = body.strip_prefix('&').unwrap_or(&body).to_string();

        let Some(action) = form.borrow().attribute("action").map(str::to_string) else { return };
        let Some(base) = self.document_url.clone() else { return };
        let Ok(target) = base.resolve(&action) else { return };
        self.load(&target.to_url_string(), Some(&body));
    }

    pub fn go_back(&mut self) {
        if self.history.len() <= 1 {
            return;
        }
        self.history.pop();
        if let Some(previous) = self.history.pop() {
            self.load(&previous.to_url_string(), None);
        }
    }

    /// Steps scroll by `SCROLL_STEP`, clamped against
    /// `[0, height - tab_height]`; this only changes what's drawn, never
    /// layout.
    pub fn scroll_down(&mut self) {
        let max_scroll = self.max_scroll();
        self.scroll = (self.scroll + config::SCROLL_STEP as f32).min(max_scroll).max(0.0);
        self.needs_animation_frame = true;
    }

    pub fn scroll_up(&mut self) {
        self.scroll = (self.scroll - config::SCROLL_STEP as f32).max(0.0);
        self.needs_animation_frame = true;
    }

    fn max_scroll(&self) -> f32 {
        (self.document_height() - self.tab_height).max(0.0)
    }

    fn document_height(&self) -> f32 {
        self.document
            .as_ref()
            .map(|d| d.borrow().height + 2.0 * config::VSTEP as f32)
            .unwrap_or(0.0)
    }

    pub fn keypress(&mut self, ch: char) {
        let Some(focus) = self.focus.clone() else { return };
        if self.script.dispatch_event("keydown", &focus) {
            return;
        }
        let mut value = focus.borrow().attribute("value").unwrap_or("").to_string();
        value.push(ch);
        focus.borrow_mut().set_attribute("value", value);
        self.dirty.set_needs_style();
        self.render();
    }

    /// Drops the last character of the focused input's value.
    pub fn backspace(&mut self) {
        let Some(focus) = self.focus.clone() else { return };
        if self.script.dispatch_event("keydown", &focus) {
            return;
        }
        let mut value = focus.borrow().attribute("value").unwrap_or("").to_string();
        value.pop();
        focus.borrow_mut().set_attribute("value", value);
        self.dirty.set_needs_style();
        self.render();
    }

    /// Ticks every in-flight transition, routing a compositable-only tick
    /// (currently only `opacity`) to a `composited_updates` commit instead
    /// of a full repaint notification.
    pub fn run_animation_frame(&mut self) {
        let Some(root) = self.root.clone() else { return };

        let mut nodes = Vec::new();
        tree_to_list(&root, &mut nodes);

        let mut ticked_opacity: Vec<NodeRef> = Vec::new();
        let mut layout_affected = false;
        let mut any_ticked = false;

        for node in &nodes {
            let properties: Vec<String> = node.borrow().animations.keys().cloned().collect();
            for property in properties {
                let next_value = {
                    let mut n = node.borrow_mut();
                    let Some(animation) = n.animations.get_mut(&property) else { continue };
                    animation.animate()
                };
                any_ticked = true;
                match next_value {
                    Some(value) => {
                        node.borrow_mut().style.insert(property.clone(), value);
                        if property == "opacity" {
                            ticked_opacity.push(node.clone());
                        } else {
                            layout_affected = true;
                        }
                    }
                    None => {
                        node.borrow_mut().animations.remove(&property);
                    }
                }
            }
        }

        if !any_ticked {
            self.needs_animation_frame = false;
            return;
        }

        let compositable_only = !layout_affected && !ticked_opacity.is_empty();
        if layout_affected {
            self.dirty.set_needs_layout();
        } else if compositable_only {
            self.dirty.set_needs_paint();
        }

        self.render();

        if compositable_only {
            if let Some(paint) = &self.paint_result {
                let mut updates = FxHashMap::default();
                for node in &ticked_opacity {
                    let key = display_list::element_key(node);
                    if let Some(blend) = paint.blend_ops.get(&key) {
                        updates.insert(key, blend.clone());
                    }
                }
                self.pending_composited_updates = Some(updates);
            }
        }

        self.needs_animation_frame = nodes.iter().any(|n| !n.borrow().animations.is_empty());
    }

    /// `render()` on the tab thread: runs the subset of style/layout/paint
    /// whose dirty bits are set, in order, clearing each as it completes.
    pub fn render(&mut self) {
        if self.dirty.needs_style {
            if let Some(root) = &self.root {
                let mut rules = self.rules.clone();
                rules.sort_by_key(cascade_priority);
                let effects = resolve_style(root, &rules);
                if !effects.is_empty() {
                    self.needs_animation_frame = true;
                }
            }
            self.dirty.needs_style = false;
        }

        if self.dirty.needs_layout {
            if let Some(root) = &self.root {
                self.document = Some(layout_document(root.clone(), self.fonts.as_ref()));
            }
            self.dirty.needs_layout = false;
        }

        if self.dirty.needs_paint {
            if let Some(document) = &self.document {
                self.paint_result = Some(display_list::paint(document));
                self.repainted_since_last_commit = true;
            }
            self.dirty.needs_paint = false;
        }
    }

    /// Builds a [`CommitData`] snapshot and hands it to the [`CommitChannel`].
    fn commit(&mut self) {
        let display_list = if self.repainted_since_last_commit && self.pending_composited_updates.is_none() {
            self.paint_result.as_ref().map(|p| p.root.clone())
        } else {
            None
        };
        self.repainted_since_last_commit = false;

        let data = CommitData {
            url: self.document_url.as_ref().map(Url::to_url_string).unwrap_or_default(),
            scroll: Some(self.scroll),
            height: self.document_height(),
            display_list,
            composited_updates: self.pending_composited_updates.take(),
            needs_animation_frame: self.needs_animation_frame,
        };
        self.channel.commit(self.id, data);
    }
}

/// Maps a layout object's own rect through every ancestor element's parsed
/// `transform` style, starting with the object's own node.
///
/// Mirrors `compositing::absolute_bounds`, which does the same walk over
/// the display-list tree; here the walk is over the *element* tree via
/// `obj.node`, since a transformed ancestor need not have a layout object
/// of its own (its box is a line or inline run, not a `<div>`).
fn absolute_bounds(obj: &LayoutRef) -> PixelRect {
    let mut rect = obj.borrow().rect();
    let mut current = obj.borrow().node.clone();
    while let Some(node) = current {
        let transform = node.borrow().style.get("transform").and_then(|v| parse_transform(v));
        if let Some((tx, ty)) = transform {
            rect = rect.translate(PixelVector::new(tx, ty));
        }
        current = node.borrow().parent();
    }
    rect
}

/// Parses a `content-security-policy` header's `default-src` directive
/// into an origin allowlist. Each origin is normalized through
/// [`Url::parse`]/[`Url::origin`], falling back to the raw token if it
/// doesn't parse as an absolute URL, so `allowed_request` always compares
/// two values produced the same way.
fn parse_csp(value: &str) -> Option<Vec<String>> {
    let mut tokens = value.split_whitespace();
    if tokens.next()? != "default-src" {
        return None;
    }
    Some(
        tokens
            .map(|origin| Url::parse(origin).map(|u| u.origin()).unwrap_or_else(|_| origin.to_string()))
            .collect(),
    )
}

/// Percent-encodes a form field the way `urllib.parse.quote` does: every
/// byte outside `[A-Za-z0-9._~-]` becomes `%XX`.
fn percent_encode(value: &str) -> String {
    let mut out = String::new();
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'~' | b'-' => {
                out.push(byte as char);
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fonts::BuiltinFontLibrary;
    use net::{NetError, Response};
    use std::collections::HashMap;

    struct FixtureHttpClient {
        body: String,
    }

    impl HttpClient for FixtureHttpClient {
        fn request(&self, _request: Request<'_>) -> Result<Response, NetError> {
            Ok(Response { headers: HashMap::new(), body: self.body.clone() })
        }
    }

    fn make_tab(body: &str) -> Tab {
        Tab::new(
            1,
            Box::new(FixtureHttpClient { body: body.to_string() }),
            Arc::new(BuiltinFontLibrary::new()),
            Box::new(crate::context::NullScriptContext::new()),
            CommitChannel::new(),
            600.0,
        )
    }

    #[test]
    fn load_parses_body_and_renders() {
        let mut tab = make_tab("<html><body><div>hi</div></body></html>");
        tab.load("file:///index.html", None);
        assert!(tab.root.is_some());
        assert!(tab.document.is_some());
        assert!(tab.paint_result.is_some());
    }

    #[test]
    fn scroll_down_clamps_to_max() {
        let mut tab = make_tab("<html></html>");
        tab.load("file:///index.html", None);
        for _ in 0..50 {
            tab.scroll_down();
        }
        assert!(tab.scroll <= tab.max_scroll());
    }

    #[test]
    fn scroll_up_never_goes_negative() {
        let mut tab = make_tab("<html></html>");
        tab.scroll_up();
        assert_eq!(tab.scroll, 0.0);
    }

    #[test]
    fn click_outside_any_object_is_a_no_op() {
        let mut tab = make_tab("<html><body><div>hi</div></body></html>");
        tab.load("file:///index.html", None);
        tab.click(10_000.0, 10_000.0);
    }

    #[test]
    fn click_on_input_focuses_and_clears_value() {
        let mut tab = make_tab(r#"<html><body><input value="old"></body></html>"#);
        tab.load("file:///index.html", None);

        let mut objects = Vec::new();
        layout_tree_to_list(tab.document.as_ref().unwrap(), &mut objects);
        let input_obj = objects
            .iter()
            .find(|o| o.borrow().node.as_ref().map(|n| n.borrow().tag() == Some("input")).unwrap_or(false))
            .unwrap()
            .clone();
        let (x, y) = {
            let o = input_obj.borrow();
            (o.x + 1.0, o.y + 1.0)
        };

        tab.click(x, y);

        assert!(tab.focus.is_some());
        assert_eq!(tab.focus.as_ref().unwrap().borrow().attribute("value"), Some(""));
    }

    #[test]
    fn click_maps_through_ancestor_transform() {
        let mut tab = make_tab(r#"<html><body><div id="wrap"><input value="old"></div></body></html>"#);
        tab.load("file:///index.html", None);

        let mut objects = Vec::new();
        layout_tree_to_list(tab.document.as_ref().unwrap(), &mut objects);
        let input_obj = objects
            .iter()
            .find(|o| o.borrow().node.as_ref().map(|n| n.borrow().tag() == Some("input")).unwrap_or(false))
            .unwrap()
            .clone();
        let wrapper = input_obj.borrow().node.as_ref().unwrap().borrow().parent().unwrap();
        wrapper.borrow_mut().style.insert("transform".to_string(), "translate(50px, 30px)".to_string());

        let (raw_x, raw_y) = {
            let o = input_obj.borrow();
            (o.x + 1.0, o.y + 1.0)
        };

        // The raw layout position no longer hits the element once its
        // ancestor is transformed away from it.
        tab.click(raw_x, raw_y);
        assert!(tab.focus.is_none());

        // Clicking the position the transform actually moved it to does.
        tab.click(raw_x + 50.0, raw_y + 30.0);
        assert!(tab.focus.is_some());
    }

    #[test]
    fn keypress_appends_to_focused_input_value() {
        let mut tab = make_tab(r#"<html><body><input value=""></body></html>"#);
        tab.load("file:///index.html", None);
        let input = Node::new_element("input".to_string(), dom::AttributeMap::default());
        append_child(tab.root.as_ref().unwrap(), input.clone());
        tab.focus = Some(input.clone());

        tab.keypress('a');

        assert_eq!(input.borrow().attribute("value"), Some("a"));
    }

    #[test]
    fn backspace_drops_last_character_of_focused_value() {
        let mut tab = make_tab(r#"<html><body><input value=""></body></html>"#);
        tab.load("file:///index.html", None);
        let input = Node::new_element("input".to_string(), dom::AttributeMap::default());
        input.borrow_mut().set_attribute("value", "ab".to_string());
        append_child(tab.root.as_ref().unwrap(), input.clone());
        tab.focus = Some(input.clone());

        tab.backspace();

        assert_eq!(input.borrow().attribute("value"), Some("a"));
    }

    #[test]
    fn parse_csp_rejects_non_default_src_directives() {
        assert!(parse_csp("script-src 'self'").is_none());
    }

    #[test]
    fn parse_csp_collects_origin_list() {
        let origins = parse_csp("default-src http://example.org").unwrap();
        assert_eq!(origins, vec!["http://example.org:80".to_string()]);
    }

    #[test]
    fn percent_encode_escapes_reserved_bytes() {
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("a-b_c.d~e"), "a-b_c.d~e");
    }
}
