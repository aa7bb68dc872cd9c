/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use rustc_hash::FxHashMap;

use crate::selector::{Rule, Selector};

/// A recovering CSS declaration/selector parser: on a malformed rule or
/// declaration it skips to the next `;` or `}` and resumes. There is no
/// tokenizer stage — the parser walks the source string directly.
pub struct CssParser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> CssParser<'a> {
    pub fn new(source: &'a str) -> Self {
        CssParser {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if (b as char).is_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// A bare word: alphanumerics plus the punctuation CSS values use
    /// (`,/#-.%()"'`).
    fn word(&mut self) -> Option<&'a str> {
        let start = self.pos;
        let mut in_quote = false;
        while let Some(b) = self.peek() {
            let c = b as char;
            if c == '\'' {
                in_quote = !in_quote;
            }
            if c.is_alphanumeric() || ",/#-.%()\"'".contains(c) || (in_quote && c == ':') {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            None
        } else {
            Some(&self.source[start..self.pos])
        }
    }

    fn literal(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Advances past everything up to (not including) the first byte in
    /// `chars`, returning that byte if one was found before EOF.
    fn ignore_until(&mut self, chars: &[u8]) -> Option<u8> {
        while let Some(b) = self.peek() {
            if chars.contains(&b) {
                return Some(b);
            }
            self.pos += 1;
        }
        None
    }

    fn until_chars(&mut self, chars: &[u8]) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if chars.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        &self.source[start..self.pos]
    }

    fn pair(&mut self, until: &[u8]) -> Option<(String, String)> {
        let prop = self.word()?.to_lowercase();
        self.whitespace();
        if !self.literal(b':') {
            return None;
        }
        self.whitespace();
        let value = self.until_chars(until).trim().to_string();
        Some((prop, value))
    }

    /// Parses `prop: value;` pairs until (but not consuming) the closing
    /// `}`, recovering from a malformed pair by skipping to the next `;`.
    pub fn body(&mut self) -> FxHashMap<String, String> {
        let mut pairs = FxHashMap::default();
        loop {
            self.whitespace();
            match self.peek() {
                None | Some(b'}') => break,
                _ => {}
            }
            let checkpoint = self.pos;
            if let Some((prop, value)) = self.pair(&[b';', b'}']) {
                self.whitespace();
                if self.literal(b';') {
                    pairs.insert(prop, value);
                    self.whitespace();
                    continue;
                }
            }
            self.pos = checkpoint;
            match self.ignore_until(&[b';', b'}']) {
                Some(b';') => {
                    self.literal(b';');
                    self.whitespace();
                }
                _ => break,
            }
        }
        pairs
    }

    fn selector(&mut self) -> Option<Selector> {
        let tag = self.word()?.to_lowercase();
        let mut out = Selector::Tag(tag);
        self.whitespace();
        while let Some(b) = self.peek() {
            if b == b'{' {
                break;
            }
            let tag = self.word()?.to_lowercase();
            out = Selector::Descendant(Box::new(out), Box::new(Selector::Tag(tag)));
            self.whitespace();
        }
        Some(out)
    }

    /// Parses a full stylesheet into cascade-ordered rules. A rule whose
    /// selector or body fails to parse is skipped entirely by scanning to
    /// the next `}`.
    pub fn parse(&mut self) -> Vec<Rule> {
        let mut rules = Vec::new();
        loop {
            self.whitespace();
            if self.peek().is_none() {
                break;
            }
            let checkpoint = self.pos;
            let parsed = (|| {
                let selector = self.selector()?;
                self.whitespace();
                if !self.literal(b'{') {
                    return None;
                }
                self.whitespace();
                let body = self.body();
                if !self.literal(b'}') {
                    return None;
                }
                Some(Rule {
                    selector,
                    declarations: body.into_iter().collect(),
                })
            })();

            match parsed {
                Some(rule) => {
                    self.whitespace();
                    rules.push(rule);
                }
                None => {
                    self.pos = checkpoint;
                    match self.ignore_until(&[b'}']) {
                        Some(b'}') => {
                            self.literal(b'}');
                            self.whitespace();
                        }
                        _ => break,
                    }
                }
            }
        }
        rules
    }
}

/// Parses a `transition` declaration value (`"opacity 0.1s, color 0.2s"`)
/// into `{property: num_frames}`, converting seconds to frames at
/// `REFRESH_RATE_SEC`.
pub fn parse_transition(value: Option<&str>) -> FxHashMap<String, u32> {
    let mut out = FxHashMap::default();
    let Some(value) = value else {
        return out;
    };
    if value.is_empty() {
        return out;
    }
    for item in value.split(',') {
        let item = item.trim();
        let Some((property, duration)) = item.split_once(' ') else {
            continue;
        };
        let Some(seconds_str) = duration.strip_suffix('s') else {
            continue;
        };
        let Ok(seconds) = seconds_str.parse::<f32>() else {
            continue;
        };
        let frames = (seconds / config::REFRESH_RATE_SEC) as u32;
        out.insert(property.to_string(), frames);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tag_rule() {
        let rules = CssParser::new("div { color: red; }").parse();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selector, Selector::Tag("div".to_string()));
        assert_eq!(
            rules[0].declarations,
            vec![("color".to_string(), "red".to_string())]
        );
    }

    #[test]
    fn parses_descendant_rule() {
        let rules = CssParser::new("div p { color: red; }").parse();
        assert_eq!(
            rules[0].selector,
            Selector::Descendant(
                Box::new(Selector::Tag("div".to_string())),
                Box::new(Selector::Tag("p".to_string())),
            )
        );
    }

    #[test]
    fn recovers_from_malformed_declaration() {
        let rules = CssParser::new("div { bogus bogus; color: red; }").parse();
        assert_eq!(
            rules[0].declarations.get("color").map(String::as_str),
            Some("red")
        );
    }

    #[test]
    fn recovers_from_malformed_rule_by_skipping_to_brace() {
        let rules = CssParser::new("!!! { color: red; } p { color: blue; }").parse();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selector, Selector::Tag("p".to_string()));
    }

    #[test]
    fn parse_transition_converts_seconds_to_frames() {
        let frames = parse_transition(Some("opacity 0.1s"));
        assert_eq!(frames.get("opacity"), Some(&3));
    }

    #[test]
    fn parse_transition_of_none_is_empty() {
        assert!(parse_transition(None).is_empty());
    }
}

trait DeclarationsExt {
    fn get(&self, key: &str) -> Option<&String>;
}

impl DeclarationsExt for Vec<(String, String)> {
    fn get(&self, key: &str) -> Option<&String> {
        self.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}
