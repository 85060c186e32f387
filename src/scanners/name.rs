// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accessible name resolution for structural records.
//!
//! First non-empty source wins:
//! aria-label, aria-labelledby, aria-roledescription, alt/title, then
//! visible text for content-bearing tags only.

use crate::dom::{collapse_whitespace, truncate_chars, Document, Element, NodeId};

/// Tags whose text content names them
const TEXT_NAMED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "nav", "footer", "ul", "ol", "li", "dl", "dt", "dd",
    "a", "label", "legend", "caption", "th", "button",
];

/// Elements where `alt` is meaningful
const ALT_TAGS: &[&str] = &["img", "area"];

const MAX_TEXT_NAME_CHARS: usize = 50;

/// Resolve the accessible name of an element; empty when it has none
pub fn resolve(doc: &Document, node: NodeId) -> String {
    let Some(el) = doc.element(node) else {
        return String::new();
    };

    if let Some(label) = trimmed_attr(el, "aria-label") {
        return label;
    }

    let labelled = labelledby_text(doc, el);
    if !labelled.is_empty() {
        return labelled;
    }

    if let Some(desc) = trimmed_attr(el, "aria-roledescription") {
        return desc;
    }

    if takes_alt(el) {
        if let Some(alt) = trimmed_attr(el, "alt") {
            return alt;
        }
    }
    if let Some(title) = trimmed_attr(el, "title") {
        return title;
    }

    if TEXT_NAMED_TAGS.contains(&el.tag()) {
        let text = doc.collapsed_text(node);
        return truncate_chars(&text, MAX_TEXT_NAME_CHARS);
    }

    String::new()
}

/// Rendered text of every element referenced by `aria-labelledby`, joined
/// with single spaces. Ids that resolve to nothing are skipped.
pub fn labelledby_text(doc: &Document, el: &Element) -> String {
    let Some(ids) = el.attr("aria-labelledby") else {
        return String::new();
    };
    let parts: Vec<String> = ids
        .split_whitespace()
        .filter_map(|id| doc.get_element_by_id(id))
        .map(|target| doc.collapsed_text(target))
        .filter(|text| !text.is_empty())
        .collect();
    collapse_whitespace(&parts.join(" "))
}

/// Attribute value trimmed, `None` when absent or blank
pub fn trimmed_attr(el: &Element, name: &str) -> Option<String> {
    el.attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn takes_alt(el: &Element) -> bool {
    ALT_TAGS.contains(&el.tag())
        || (el.tag() == "input"
            && el
                .attr("type")
                .map(|t| t.eq_ignore_ascii_case("image"))
                .unwrap_or(false))
}
