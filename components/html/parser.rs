/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use dom::{append_child, AttributeMap, Node, NodeRef};

const SELF_CLOSING_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const HEAD_TAGS: &[&str] = &[
    "base", "basefont", "bgsound", "noscript", "link", "meta", "title", "style", "script",
];

/// Tag-soup HTML parser. Tolerates unclosed tags, missing `<html>`/`<head>`/
/// `<body>` wrappers, and HTML entities, the way real browsers do, without
/// implementing the full tree-construction algorithm.
pub struct HtmlParser {
    body: String,
}

impl HtmlParser {
    pub fn new(body: String) -> Self {
        HtmlParser { body }
    }

    pub fn parse(&self) -> NodeRef {
        let mut unfinished: Vec<NodeRef> = Vec::new();
        let mut text = String::new();
        let mut in_tag = false;
        let mut chars = self.body.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '<' {
                if !text.is_empty() {
                    self.add_text(&decode_entities(&text), &mut unfinished);
                    text.clear();
                }
                in_tag = true;
            } else if c == '>' {
                in_tag = false;
                let tag_text = std::mem::take(&mut text);
                self.add_tag(&tag_text, &mut unfinished);
            } else {
                text.push(c);
            }
        }

        if !in_tag && !text.is_empty() {
            self.add_text(&decode_entities(&text), &mut unfinished);
        }

        self.finish(unfinished)
    }

    fn add_text(&self, text: &str, unfinished: &mut Vec<NodeRef>) {
        if text.trim().is_empty() {
            return;
        }
        self.implicit_tags(None, unfinished);
        let parent = unfinished.last().expect("implicit_tags always leaves a parent");
        let node = Node::new_text(text.to_string());
        append_child(parent, node);
    }

    fn add_tag(&self, tag_text: &str, unfinished: &mut Vec<NodeRef>) {
        let (tag, attributes) = parse_tag(tag_text);
        if tag.is_empty() || tag.starts_with('!') {
            return;
        }

        if let Some(closing) = tag.strip_prefix('/') {
            if unfinished.len() == 1 {
                return;
            }
            log_mismatch_if_needed(closing, unfinished);
            let node = unfinished.pop().unwrap();
            let parent = unfinished.last().expect("root stays until finish");
            append_child(parent, node);
        } else if SELF_CLOSING_TAGS.contains(&tag.as_str()) {
            self.implicit_tags(Some(&tag), unfinished);
            let parent = unfinished.last().expect("implicit_tags always leaves a parent");
            let node = Node::new_element(tag, attributes);
            append_child(parent, node);
        } else {
            self.implicit_tags(Some(&tag), unfinished);
            let node = Node::new_element(tag, attributes);
            unfinished.push(node);
        }
    }

    /// Inserts `<html>`, `<head>`/`<body>` as needed so a document missing
    /// its wrapper tags still produces a well-formed tree, matching a real
    /// browser's HTML-parsing recovery rules.
    fn implicit_tags(&self, tag: Option<&str>, unfinished: &mut Vec<NodeRef>) {
        loop {
            let open_tags: Vec<String> = unfinished
                .iter()
                .map(|n| n.borrow().tag().unwrap_or("").to_string())
                .collect();

            if open_tags.is_empty() && tag != Some("html") {
                unfinished.push(Node::new_element("html".to_string(), AttributeMap::default()));
            } else if open_tags == ["html"]
                && !matches!(tag, Some("head") | Some("body") | None)
            {
                if tag.map(|t| HEAD_TAGS.contains(&t)).unwrap_or(false) {
                    unfinished.push(Node::new_element("head".to_string(), AttributeMap::default()));
                } else {
                    unfinished.push(Node::new_element("body".to_string(), AttributeMap::default()));
                }
            } else if open_tags == ["html", "head"]
                && !(tag.map(|t| HEAD_TAGS.contains(&t)).unwrap_or(false) || tag == Some("/head"))
            {
                let head = unfinished.pop().unwrap();
                let parent = unfinished.last().unwrap();
                append_child(parent, head);
            } else {
                return;
            }
        }
    }

    fn finish(&self, mut unfinished: Vec<NodeRef>) -> NodeRef {
        if unfinished.is_empty() {
            unfinished.push(Node::new_element("html".to_string(), AttributeMap::default()));
        }
        while unfinished.len() > 1 {
            let node = unfinished.pop().unwrap();
            let parent = unfinished.last().unwrap();
            append_child(parent, node);
        }
        unfinished.pop().unwrap()
    }
}

fn log_mismatch_if_needed(closing_tag: &str, unfinished: &[NodeRef]) {
    if let Some(top) = unfinished.last() {
        if top.borrow().tag() != Some(closing_tag) {
            log::warn!(
                "closing tag </{closing_tag}> does not match open tag <{}>, closing anyway",
                top.borrow().tag().unwrap_or("?")
            );
        }
    }
}

/// Splits `tag attr="value" attr2 ...` into the tag name and its attributes.
fn parse_tag(tag_text: &str) -> (String, AttributeMap) {
    let parts = split_attributes(tag_text);
    let mut parts = parts.into_iter();
    let tag = parts
        .next()
        .unwrap_or_default()
        .trim_end_matches('/')
        .to_lowercase();

    let mut attributes = AttributeMap::default();
    for part in parts {
        let part = part.trim_end_matches('/');
        if part.is_empty() {
            continue;
        }
        if let Some((key, value)) = part.split_once('=') {
            let value = value.trim_matches(|c| c == '"' || c == '\'');
            attributes.insert(key.to_lowercase(), value.to_string());
        } else {
            attributes.insert(part.to_lowercase(), String::new());
        }
    }

    (tag, attributes)
}

/// Splits on whitespace, but keeps quoted attribute values (which may
/// contain spaces) intact.
fn split_attributes(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quote: Option<char> = None;

    for c in text.chars() {
        match in_quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    in_quote = None;
                }
            }
            None => {
                if c == '"' || c == '\'' {
                    in_quote = Some(c);
                    current.push(c);
                } else if c.is_whitespace() {
                    if !current.is_empty() {
                        parts.push(std::mem::take(&mut current));
                    }
                } else {
                    current.push(c);
                }
            }
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_document() {
        let root = HtmlParser::new("<html><body><p>hi</p></body></html>".to_string()).parse();
        assert_eq!(root.borrow().tag(), Some("html"));
        let body = root.borrow().children[0].clone();
        assert_eq!(body.borrow().tag(), Some("body"));
        let p = body.borrow().children[0].clone();
        assert_eq!(p.borrow().tag(), Some("p"));
        assert_eq!(p.borrow().children[0].borrow().text(), Some("hi"));
    }

    #[test]
    fn inserts_implicit_html_and_body() {
        let root = HtmlParser::new("<p>hi</p>".to_string()).parse();
        assert_eq!(root.borrow().tag(), Some("html"));
        assert_eq!(root.borrow().children[0].borrow().tag(), Some("body"));
    }

    #[test]
    fn self_closing_tag_has_no_children() {
        let root = HtmlParser::new("<html><body><img src=\"a.png\"></body></html>".to_string()).parse();
        let body = root.borrow().children[0].clone();
        let img = body.borrow().children[0].clone();
        assert_eq!(img.borrow().tag(), Some("img"));
        assert!(img.borrow().children.is_empty());
        assert_eq!(img.borrow().attribute("src"), Some("a.png"));
    }

    #[test]
    fn decodes_basic_entities() {
        let root = HtmlParser::new("<html><body>a &amp; b</body></html>".to_string()).parse();
        let body = root.borrow().children[0].clone();
        assert_eq!(body.borrow().children[0].borrow().text(), Some("a & b"));
    }
}
