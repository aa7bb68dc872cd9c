/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use dom::{NodeRef, NumericAnimation};
use rustc_hash::FxHashMap;

use crate::parser::{parse_transition, CssParser};
use crate::selector::Rule;

/// Sort key for cascading rules by ascending selector specificity.
pub fn cascade_priority(rule: &Rule) -> u32 {
    rule.selector.priority()
}

/// A transition that fired during this style pass: which node, which
/// property, and the animation driving it. The caller uses this to know a
/// render must be requested.
pub struct RenderEffect {
    pub node: NodeRef,
    pub property: String,
    pub animation: NumericAnimation,
}

/// Resolves style for `root` and its whole subtree against `rules` (already
/// sorted by [`cascade_priority`]), returning one [`RenderEffect`] per
/// property transition discovered along the way.
///
/// Recurses after each node so a child always inherits its parent's
/// already-resolved values.
pub fn resolve_style(root: &NodeRef, rules: &[Rule]) -> Vec<RenderEffect> {
    let mut effects = Vec::new();
    resolve_style_recursive(root, rules, &mut effects);
    effects
}

fn resolve_style_recursive(node: &NodeRef, rules: &[Rule], effects: &mut Vec<RenderEffect>) {
    let old_style = node.borrow().style.clone();
    let had_old_style = !old_style.is_empty();
    let parent = node.borrow().parent();

    let mut style = FxHashMap::default();
    for (property, default_value) in config::inherited_properties() {
        let value = match &parent {
            Some(parent) => parent.borrow().style.get(&property).cloned(),
            None => None,
        }
        .unwrap_or(default_value);
        style.insert(property, value);
    }

    for rule in rules {
        if !rule.selector.matches(node) {
            continue;
        }
        for (property, value) in &rule.declarations {
            style.insert(property.clone(), value.clone());
        }
    }

    if let Some(inline) = node.borrow().attribute("style") {
        let mut parser = CssParser::new(inline);
        for (property, value) in parser.body() {
            style.insert(property, value);
        }
    }

    if let Some(font_size) = style.get("font-size") {
        if let Some(pct) = font_size.strip_suffix('%') {
            if let Ok(pct) = pct.parse::<f32>() {
                let parent_px = parent
                    .as_ref()
                    .and_then(|p| p.borrow().style.get("font-size").cloned())
                    .unwrap_or_else(|| "16px".to_string());
                let parent_px: f32 = parent_px.trim_end_matches("px").parse().unwrap_or(16.0);
                style.insert("font-size".to_string(), format!("{}px", pct / 100.0 * parent_px));
            }
        }
    }

    node.borrow_mut().style = style;

    if had_old_style {
        for (property, (old_value, new_value, num_frames)) in diff_styles(&old_style, &node.borrow().style)
        {
            if num_frames == 0 {
                continue;
            }
            let mut animation = NumericAnimation::new(
                old_value.parse().unwrap_or(0.0),
                new_value.parse().unwrap_or(0.0),
                num_frames,
            );
            let first_value = animation.animate().unwrap_or_else(|| new_value.clone());
            node.borrow_mut().style.insert(property.clone(), first_value);
            node.borrow_mut()
                .animations
                .insert(property.clone(), animation.clone());
            effects.push(RenderEffect {
                node: node.clone(),
                property: property.clone(),
                animation,
            });
        }
    }

    let children: Vec<NodeRef> = node.borrow().children.clone();
    for child in children {
        resolve_style_recursive(&child, rules, effects);
    }
}

/// Compares `old_style` and `new_style` against the node's `transition`
/// declaration, returning `{property: (old_value, new_value, num_frames)}`
/// for every transitioned property that actually changed value.
///
/// The animation this produces is stored under the *property name*, not a
/// literal placeholder key.
pub fn diff_styles(
    old_style: &FxHashMap<String, String>,
    new_style: &FxHashMap<String, String>,
) -> FxHashMap<String, (String, String, u32)> {
    let mut transitions = FxHashMap::default();
    for (property, num_frames) in parse_transition(new_style.get("transition").map(String::as_str)) {
        let (Some(old_value), Some(new_value)) =
            (old_style.get(&property), new_style.get(&property))
        else {
            continue;
        };
        if old_value == new_value {
            continue;
        }
        transitions.insert(
            property,
            (old_value.clone(), new_value.clone(), num_frames),
        );
    }
    transitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::{append_child, AttributeMap, Node};

    #[test]
    fn inherits_color_from_parent() {
        let parent = Node::new_element("div".to_string(), AttributeMap::default());
        let child = Node::new_element("p".to_string(), AttributeMap::default());
        append_child(&parent, child.clone());

        resolve_style(&parent, &[]);

        assert_eq!(
            child.borrow().style.get("color").map(String::as_str),
            Some("black")
        );
    }

    #[test]
    fn inline_style_wins_over_rules() {
        let mut attrs = AttributeMap::default();
        attrs.insert("style".to_string(), "color:green".to_string());
        let node = Node::new_element("div".to_string(), attrs);

        let rules = CssParser::new("div { color: red; }").parse();
        resolve_style(&node, &rules);

        assert_eq!(
            node.borrow().style.get("color").map(String::as_str),
            Some("green")
        );
    }

    #[test]
    fn percentage_font_size_resolves_against_parent_pixels() {
        let mut parent_attrs = AttributeMap::default();
        parent_attrs.insert("style".to_string(), "font-size:20px".to_string());
        let parent = Node::new_element("div".to_string(), parent_attrs);

        let mut child_attrs = AttributeMap::default();
        child_attrs.insert("style".to_string(), "font-size:50%".to_string());
        let child = Node::new_element("span".to_string(), child_attrs);
        append_child(&parent, child.clone());

        resolve_style(&parent, &[]);

        assert_eq!(
            child.borrow().style.get("font-size").map(String::as_str),
            Some("10px")
        );
    }

    #[test]
    fn transition_creates_animation_keyed_by_property_name() {
        let mut attrs = AttributeMap::default();
        attrs.insert(
            "style".to_string(),
            "transition:opacity 0.1s;opacity:1".to_string(),
        );
        let node = Node::new_element("div".to_string(), attrs);
        resolve_style(&node, &[]);

        node.borrow_mut().set_attribute(
            "style",
            "transition:opacity 0.1s;opacity:0.5".to_string(),
        );
        let effects = resolve_style(&node, &[]);

        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].property, "opacity");
        assert!(node.borrow().animations.contains_key("opacity"));
    }
}
