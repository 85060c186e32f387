// SPDX-License-Identifier: PMPL-1.0-or-later
//! Structure scanner - landmarks, headings and other navigable structure.
//!
//! Depth-first pre-order walk from `<body>`. An element is recorded when
//! its tag, its role or one of a few ARIA attributes marks it as structural.
//! `level` only grows beneath recorded elements, so layout wrappers do not
//! indent their descendants. Open shadow roots are walked inline; accessible
//! iframes are walked as nested documents carrying frame metadata.

use crate::dom::{path, Document, Element, NodeId, ShadowMode};
use crate::identity::HashAlgorithm;
use crate::scanners::name;
use crate::snapshot::{FrameInfo, Snapshot, StructuralKind, StructuralRecord, StructureScan};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Tags that are structural on their own
const STRUCTURAL_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "nav", "main", "aside", "footer", "section",
    "article", "form", "search", "table", "ul", "ol", "dl", "fieldset", "legend", "label",
    "button", "iframe", "dialog", "details", "menu",
];

/// Roles that make any element structural
const STRUCTURAL_ROLES: &[&str] = &[
    "banner",
    "navigation",
    "search",
    "main",
    "complementary",
    "contentinfo",
    "region",
    "form",
    "button",
    "menu",
    "menubar",
    "alert",
    "application",
];

/// Attributes that make any element structural
const STRUCTURAL_ATTRIBUTES: &[&str] = &[
    "aria-label",
    "aria-labelledby",
    "aria-describedby",
    "aria-live",
    "aria-expanded",
    "aria-haspopup",
    "aria-hidden",
    "tabindex",
];

/// Attributes copied verbatim into each record
const RECORDED_ATTRIBUTES: &[&str] = &[
    "role",
    "aria-label",
    "aria-labelledby",
    "aria-describedby",
    "aria-live",
    "aria-expanded",
    "aria-haspopup",
    "aria-hidden",
    "aria-level",
    "aria-modal",
    "tabindex",
];

/// Roles announced as live regions
const LIVE_REGION_ROLES: &[&str] = &["status", "log", "marquee", "timer"];

/// Layout wrappers that qualify only through role or attributes
const GENERIC_CONTAINERS: &[&str] = &["div", "span"];

/// Structure scan limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Records emitted before the scan stops and reports truncation
    pub max_items: usize,
    /// Deepest iframe nesting that is followed
    pub max_frame_depth: usize,
    /// Identity fingerprint
    pub hash: HashAlgorithm,
}

impl ScanOptions {
    pub const DEFAULT_MAX_ITEMS: usize = 10_000;
    pub const DEFAULT_MAX_FRAME_DEPTH: usize = 8;

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_items: Self::DEFAULT_MAX_ITEMS,
            max_frame_depth: Self::DEFAULT_MAX_FRAME_DEPTH,
            hash: HashAlgorithm::default(),
        }
    }
}

/// Accumulator threaded through one scan
#[derive(Debug, Default)]
struct ScanState {
    records: Vec<StructuralRecord>,
    next_index: usize,
    truncated: bool,
    shadow_roots_skipped: usize,
}

/// Which document is being walked
struct FrameContext<'a> {
    doc: &'a Document,
    info: Option<FrameInfo>,
    depth: usize,
    /// Path of the hosting `<iframe>` from the top document
    host_path: Option<String>,
}

impl FrameContext<'_> {
    /// Element path qualified by the frames it sits in
    fn path_for(&self, node: NodeId) -> String {
        let local = self.doc.path_for(node);
        match &self.host_path {
            Some(host) => path::frame_path(host, &local),
            None => local,
        }
    }
}

/// Scan a document for structural elements
pub fn scan(doc: &Document, options: &ScanOptions) -> Snapshot {
    let mut state = ScanState::default();
    let top = FrameContext {
        doc,
        info: None,
        depth: 0,
        host_path: None,
    };
    scan_document(&top, options, 0, &mut state);

    info!(
        url = doc.url(),
        records = state.records.len(),
        truncated = state.truncated,
        shadow_roots_skipped = state.shadow_roots_skipped,
        "Structure scan complete"
    );

    Snapshot::structure(
        doc.url(),
        doc.title(),
        StructureScan {
            structural_elements: state.records,
            truncated: state.truncated,
            shadow_roots_skipped: state.shadow_roots_skipped,
        },
    )
}

fn scan_document(frame: &FrameContext<'_>, options: &ScanOptions, level: usize, state: &mut ScanState) {
    if let Some(body) = frame.doc.body() {
        walk(frame, options, body, level, state);
    }
}

/// Pre-order walk with an explicit stack; an open shadow root is visited
/// before the host's light children
fn walk(frame: &FrameContext<'_>, options: &ScanOptions, start: NodeId, level: usize, state: &mut ScanState) {
    let doc = frame.doc;
    let mut stack = vec![(start, level, false)];

    while let Some((node, level, in_shadow)) = stack.pop() {
        if state.truncated {
            return;
        }
        let Some(el) = doc.element(node) else {
            continue;
        };
        // inert content
        if el.tag() == "template" {
            continue;
        }

        let mut child_level = level;
        if is_structural(el) {
            if state.records.len() >= options.max_items {
                state.truncated = true;
                debug!(max_items = options.max_items, "Structure scan truncated");
                return;
            }
            state.records.push(build_record(frame, options, node, el, level, in_shadow, state.next_index));
            state.next_index += 1;
            child_level = level + 1;
        }

        if el.tag() == "iframe" {
            enter_frame(frame, options, node, child_level, state);
        }

        stack.extend(
            doc.children(node)
                .iter()
                .rev()
                .map(|&child| (child, child_level, in_shadow)),
        );
        if let Some(shadow) = doc.shadow_root(node) {
            match shadow.mode {
                ShadowMode::Open => stack.extend(
                    shadow
                        .children
                        .iter()
                        .rev()
                        .map(|&child| (child, child_level, true)),
                ),
                ShadowMode::Closed => state.shadow_roots_skipped += 1,
            }
        }
    }
}

fn enter_frame(
    frame: &FrameContext<'_>,
    options: &ScanOptions,
    node: NodeId,
    level: usize,
    state: &mut ScanState,
) {
    // cross-origin frames are simply absent
    let Some(inner) = frame.doc.frame_document(node) else {
        return;
    };
    if frame.depth + 1 > options.max_frame_depth {
        debug!(depth = frame.depth + 1, "Frame nesting limit reached, skipping frame");
        return;
    }
    let el = frame.doc.element(node);
    let src = el
        .and_then(|el| el.attr("src"))
        .map(str::to_string)
        .unwrap_or_else(|| inner.url().to_string());
    let title = el.and_then(|el| el.attr("title")).unwrap_or("").to_string();

    let nested = FrameContext {
        doc: inner,
        info: Some(FrameInfo { src, title }),
        depth: frame.depth + 1,
        host_path: Some(frame.path_for(node)),
    };
    scan_document(&nested, options, level, state);
}

fn build_record(
    frame: &FrameContext<'_>,
    options: &ScanOptions,
    node: NodeId,
    el: &Element,
    level: usize,
    in_shadow: bool,
    dom_index: usize,
) -> StructuralRecord {
    let doc = frame.doc;
    let role = el.role();
    let name = Some(name::resolve(doc, node)).filter(|n| !n.is_empty());
    let path = frame.path_for(node);
    let attributes: BTreeMap<String, String> = RECORDED_ATTRIBUTES
        .iter()
        .filter_map(|&attr| el.attr(attr).map(|v| (attr.to_string(), v.to_string())))
        .collect();

    StructuralRecord {
        identity_key: options
            .hash
            .structural_key(&path, role.as_deref(), name.as_deref()),
        kind: classify(el),
        tag: el.tag().to_string(),
        role,
        name,
        dom_index,
        path,
        rect: doc.bounding_box(node),
        level,
        in_shadow,
        frame: frame.info.clone(),
        attributes,
    }
}

/// Whether an element is recorded by the structure scan
pub fn is_structural(el: &Element) -> bool {
    let tag = el.tag();
    let role_hit = el
        .role()
        .map(|role| STRUCTURAL_ROLES.contains(&role.as_str()))
        .unwrap_or(false);

    if tag == "a" {
        return role_hit || el.has_attr("aria-expanded") || el.has_attr("aria-haspopup");
    }
    let attr_hit = STRUCTURAL_ATTRIBUTES.iter().any(|attr| el.has_attr(attr));
    if GENERIC_CONTAINERS.contains(&tag) {
        return role_hit || attr_hit;
    }
    STRUCTURAL_TAGS.contains(&tag) || role_hit || attr_hit
}

/// Classify a structural element.
///
/// Precedence: heading, table, role- or tag-derived specific kind (role
/// first), label, iframe, live region, other.
pub fn classify(el: &Element) -> StructuralKind {
    let tag = el.tag();
    let role = el.role();
    let role = role.as_deref();

    if is_heading_tag(tag) || role == Some("heading") {
        return StructuralKind::Heading;
    }
    if tag == "table" || matches!(role, Some("table") | Some("grid") | Some("treegrid")) {
        return StructuralKind::Table;
    }
    if let Some(kind) = role.and_then(kind_for_role).or_else(|| kind_for_tag(tag)) {
        return kind;
    }
    if matches!(tag, "label" | "legend") {
        return StructuralKind::Label;
    }
    if tag == "iframe" {
        return StructuralKind::Iframe;
    }
    if el.has_attr("aria-live") || role.map(|r| LIVE_REGION_ROLES.contains(&r)).unwrap_or(false) {
        return StructuralKind::LiveRegion;
    }
    StructuralKind::Other
}

fn is_heading_tag(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn kind_for_role(role: &str) -> Option<StructuralKind> {
    let kind = match role {
        "navigation" => StructuralKind::Navigation,
        "main" => StructuralKind::Main,
        "banner" => StructuralKind::Header,
        "contentinfo" => StructuralKind::Footer,
        "complementary" => StructuralKind::Aside,
        "search" => StructuralKind::Search,
        "form" => StructuralKind::Form,
        "button" => StructuralKind::Button,
        "menu" | "menubar" => StructuralKind::Menu,
        "alert" | "alertdialog" => StructuralKind::Alert,
        "region" | "application" => StructuralKind::Landmark,
        _ => return None,
    };
    Some(kind)
}

fn kind_for_tag(tag: &str) -> Option<StructuralKind> {
    let kind = match tag {
        "nav" => StructuralKind::Navigation,
        "main" => StructuralKind::Main,
        "header" => StructuralKind::Header,
        "footer" => StructuralKind::Footer,
        "aside" => StructuralKind::Aside,
        "search" => StructuralKind::Search,
        "form" => StructuralKind::Form,
        "button" => StructuralKind::Button,
        "menu" => StructuralKind::Menu,
        "section" | "article" => StructuralKind::Landmark,
        _ => return None,
    };
    Some(kind)
}
