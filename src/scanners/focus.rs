// SPDX-License-Identifier: PMPL-1.0-or-later
//! Sequential keyboard focusability.
//!
//! An element is reachable with Tab when nothing excludes it (negative
//! tabindex, disabled, hidden, not rendered, zero-area box, a role-only
//! generic container, `contenteditable="false"`) and it is either natively
//! interactive or carries an explicit tabindex.

use crate::dom::{Document, Element, NodeId};

/// ARIA roles that imply keyboard interaction
pub const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "link",
    "checkbox",
    "radio",
    "slider",
    "spinbutton",
    "switch",
    "tab",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "textbox",
    "searchbox",
    "combobox",
];

/// Layout wrappers that are never focusable through a role alone
pub const GENERIC_CONTAINERS: &[&str] = &["div", "span"];

/// Whether the element is in the sequential focus navigation order
pub fn is_focusable(doc: &Document, node: NodeId) -> bool {
    let Some(el) = doc.element(node) else {
        return false;
    };
    let tabindex = el.tabindex();

    if tabindex.is_some_and(|t| t < 0) {
        return false;
    }
    if el.has_attr("disabled") {
        return false;
    }
    if doc.is_hidden_by_attribute(node) || !doc.is_rendered(node) {
        return false;
    }
    if doc.bounding_box(node).is_some_and(|rect| rect.is_empty()) {
        return false;
    }
    if GENERIC_CONTAINERS.contains(&el.tag()) && has_interactive_role(el) && tabindex.is_none() {
        return false;
    }
    if contenteditable(el) == Some(false) {
        return false;
    }

    is_native_interactive(el) || tabindex.is_some()
}

/// Explicit role is one of [`INTERACTIVE_ROLES`]
pub fn has_interactive_role(el: &Element) -> bool {
    el.role()
        .map(|role| INTERACTIVE_ROLES.contains(&role.as_str()))
        .unwrap_or(false)
}

/// `contenteditable` state: `Some(true)` for "" / "true" / "plaintext-only",
/// `Some(false)` for "false", `None` when absent or invalid
pub fn contenteditable(el: &Element) -> Option<bool> {
    match el.attr("contenteditable")?.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "plaintext-only" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Focusable by default without a tabindex
pub fn is_native_interactive(el: &Element) -> bool {
    match el.tag() {
        "a" | "area" => el.has_attr("href"),
        "button" | "input" | "select" | "textarea" | "iframe" | "object" | "embed" | "summary" => true,
        "audio" | "video" => el.has_attr("controls"),
        _ => contenteditable(el) == Some(true),
    }
}
