// SPDX-License-Identifier: PMPL-1.0-or-later
//! Tab order scanner - the sequence keyboard focus follows.
//!
//! Candidates are gathered with a fixed rule list, filtered for
//! focusability, deduplicated and sorted: positive tabindex values first in
//! ascending order, then everything else in document order. Identity keys
//! leave the order out so a moved element keeps its key.

use crate::dom::{collapse_whitespace, Document, Element, NodeId};
use crate::identity::HashAlgorithm;
use crate::scanners::focus::{self, contenteditable};
use crate::scanners::name::{labelledby_text, trimmed_attr};
use crate::snapshot::{Snapshot, TabOrderRecord};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Name reported when nothing else names an element
pub const NO_ACCESSIBLE_NAME: &str = "(no accessible name)";

const MAX_TEXT_NAME_CHARS: usize = 100;

/// One entry of the candidate selector list
#[derive(Debug, Clone, Copy)]
enum Candidate {
    /// Any element with this tag
    Tag(&'static str),
    /// Elements with this tag carrying this attribute
    TagWithAttr(&'static str, &'static str),
    /// Any element carrying this attribute
    Attr(&'static str),
}

impl Candidate {
    fn matches(self, el: &Element) -> bool {
        match self {
            Candidate::Tag(tag) => el.tag() == tag,
            Candidate::TagWithAttr(tag, attr) => el.tag() == tag && el.has_attr(attr),
            Candidate::Attr(attr) => el.has_attr(attr),
        }
    }
}

const CANDIDATES: &[Candidate] = &[
    Candidate::TagWithAttr("a", "href"),
    Candidate::TagWithAttr("area", "href"),
    Candidate::Tag("button"),
    Candidate::Tag("input"),
    Candidate::Tag("select"),
    Candidate::Tag("textarea"),
    Candidate::Tag("iframe"),
    Candidate::Tag("object"),
    Candidate::Tag("embed"),
    Candidate::TagWithAttr("audio", "controls"),
    Candidate::TagWithAttr("video", "controls"),
    Candidate::Tag("summary"),
    Candidate::Attr("contenteditable"),
    Candidate::Attr("tabindex"),
    Candidate::Attr("role"),
];

/// A focusable element awaiting its order
struct Focusable {
    node: NodeId,
    tabindex: Option<i32>,
}

impl Focusable {
    fn positive_tabindex(&self) -> Option<i32> {
        self.tabindex.filter(|&t| t > 0)
    }
}

/// Scan a document's sequential focus order
pub fn scan(doc: &Document, hash: HashAlgorithm) -> Snapshot {
    let records = records(doc, hash);
    info!(url = doc.url(), records = records.len(), "Tab order scan complete");
    Snapshot::tab_order(doc.url(), doc.title(), records)
}

/// Ordered tab-order records of a document
pub fn records(doc: &Document, hash: HashAlgorithm) -> Vec<TabOrderRecord> {
    let elements = doc.light_elements();

    let mut seen = HashSet::new();
    let mut focusables: Vec<Focusable> = CANDIDATES
        .iter()
        .flat_map(|candidate| {
            elements
                .iter()
                .copied()
                .filter(move |&id| doc.element(id).map(|el| candidate.matches(el)).unwrap_or(false))
        })
        .filter(|&id| focus::is_focusable(doc, id))
        .filter(|&id| seen.insert(id))
        .map(|node| Focusable {
            node,
            tabindex: doc.element(node).and_then(Element::tabindex),
        })
        .collect();

    focusables.sort_by(|a, b| focus_order(doc, a, b));

    let labels = LabelIndex::build(doc);
    focusables
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let el = doc.element(item.node)?;
            let role = role_for(el);
            let name = accessible_name(doc, &labels, item.node, el);
            let path = doc.path_for(item.node);
            Some(TabOrderRecord {
                identity_key: hash.tab_order_key(&path, &role, &name),
                order: u32::try_from(idx + 1).unwrap_or(u32::MAX),
                role,
                name,
                tabindex: item.tabindex,
                path,
                bounding_box: doc.bounding_box(item.node),
            })
        })
        .collect()
}

/// Positive tabindex ascending first, then document position
fn focus_order(doc: &Document, a: &Focusable, b: &Focusable) -> Ordering {
    let by_position = || doc.position(a.node).cmp(&doc.position(b.node));
    match (a.positive_tabindex(), b.positive_tabindex()) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(by_position),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => by_position(),
    }
}

/// Role shown for a focusable element: explicit role, else derived from tag
pub fn role_for(el: &Element) -> String {
    if let Some(role) = el.role() {
        return capitalize(&role);
    }
    let role = match el.tag() {
        "a" | "area" => "Link",
        "button" | "summary" => "Button",
        "input" => input_role(el),
        "select" => {
            let multi = el.has_attr("multiple")
                || el
                    .attr("size")
                    .and_then(|s| s.trim().parse::<u32>().ok())
                    .is_some_and(|s| s > 1);
            if multi {
                "Listbox"
            } else {
                "Combobox"
            }
        }
        "textarea" => "Textbox",
        "iframe" => "Iframe",
        "object" | "embed" => "Embedded object",
        "audio" => "Audio",
        "video" => "Video",
        _ if contenteditable(el) == Some(true) => "Textbox",
        other => return capitalize(other),
    };
    role.to_string()
}

fn input_role(el: &Element) -> &'static str {
    let kind = el.attr("type").unwrap_or("text").trim().to_ascii_lowercase();
    match kind.as_str() {
        "button" | "submit" | "reset" | "image" => "Button",
        "checkbox" => "Checkbox",
        "radio" => "Radio",
        "range" => "Slider",
        "number" => "Spinbutton",
        "search" => "Searchbox",
        "file" => "File upload",
        "color" => "Color picker",
        "date" | "datetime-local" | "month" | "time" | "week" => "Date picker",
        _ => "Textbox",
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `label[for]` lookup, first label per id
struct LabelIndex {
    by_for: HashMap<String, NodeId>,
}

impl LabelIndex {
    fn build(doc: &Document) -> Self {
        let mut by_for = HashMap::new();
        for id in doc.light_elements() {
            let Some(el) = doc.element(id) else { continue };
            if el.tag() != "label" {
                continue;
            }
            if let Some(target) = el.attr("for").filter(|f| !f.is_empty()) {
                by_for.entry(target.to_string()).or_insert(id);
            }
        }
        Self { by_for }
    }

    fn label_for(&self, el: &Element) -> Option<NodeId> {
        self.by_for.get(el.id()?).copied()
    }
}

/// Accessible name of a focusable element.
///
/// aria-label, aria-labelledby, `label[for]`, enclosing label, alt, title,
/// text, placeholder, value, href, then [`NO_ACCESSIBLE_NAME`].
fn accessible_name(doc: &Document, labels: &LabelIndex, node: NodeId, el: &Element) -> String {
    if let Some(label) = trimmed_attr(el, "aria-label") {
        return label;
    }

    let labelled = labelledby_text(doc, el);
    if !labelled.is_empty() {
        return labelled;
    }

    if let Some(label) = labels.label_for(el) {
        let text = doc.collapsed_text(label);
        if !text.is_empty() {
            return text;
        }
    }

    let enclosing = doc
        .ancestors(node)
        .find(|&id| doc.element(id).map(|a| a.tag() == "label").unwrap_or(false));
    if let Some(label) = enclosing {
        let text = doc.collapsed_text(label);
        if !text.is_empty() {
            return text;
        }
    }

    for attr in ["alt", "title"] {
        if let Some(value) = trimmed_attr(el, attr) {
            return value;
        }
    }

    let text = collapse_whitespace(&doc.text_content(node));
    if !text.is_empty() {
        return text.chars().take(MAX_TEXT_NAME_CHARS).collect();
    }

    for attr in ["placeholder", "value", "href"] {
        if let Some(value) = trimmed_attr(el, attr) {
            return value;
        }
    }

    NO_ACCESSIBLE_NAME.to_string()
}
