// SPDX-License-Identifier: PMPL-1.0-or-later
//! Element paths: a re-resolvable address for a node.
//!
//! Format:
//!
//! - `#id` when the element has an id that `getElementById` resolves back to it
//! - `/html/tag[n]/tag[n]/...` otherwise, `n` being the 1-based ordinal among
//!   same-tag element siblings
//! - shadow content continues from its host path through a `::shadow`
//!   segment: `/html/body[1]/x-card[1]/::shadow/button[1]`
//! - content of a nested frame document continues from the `<iframe>` path
//!   through a `::frame` segment: `#ad/::frame/html/body[1]/h1[1]`

use super::{Document, NodeId, ParentLink};
use regex::Regex;
use std::sync::LazyLock;

/// Segment that steps from a host into its shadow root
pub const SHADOW_SEGMENT: &str = "::shadow";

/// Segment that steps from an `<iframe>` into its document
pub const FRAME_SEGMENT: &str = "::frame";

const ROOT_PREFIX: &str = "/html";

static SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\[\]/]+)\[(\d+)\]$").expect("valid regex"));

/// Build the path for an element
pub fn path_for(doc: &Document, node: NodeId) -> String {
    if let Some(shortcut) = id_shortcut(doc, node) {
        return shortcut;
    }

    let mut segments: Vec<String> = Vec::new();
    let mut current = node;
    loop {
        if Some(current) == doc.root() {
            break;
        }
        let Some(el) = doc.element(current) else {
            break;
        };
        segments.push(format!("{}[{}]", el.tag(), sibling_ordinal(doc, current)));
        match doc.parent_link(current) {
            Some(ParentLink::Element(parent)) => current = parent,
            Some(ParentLink::ShadowHost(host)) => {
                segments.reverse();
                return format!("{}/{}/{}", path_for(doc, host), SHADOW_SEGMENT, segments.join("/"));
            }
            None => break,
        }
    }

    if segments.is_empty() {
        return ROOT_PREFIX.to_string();
    }
    segments.reverse();
    format!("{}/{}", ROOT_PREFIX, segments.join("/"))
}

/// `#id` when it resolves back to `node` and survives splitting on `/`
fn id_shortcut(doc: &Document, node: NodeId) -> Option<String> {
    let id = doc.element(node)?.id()?;
    if id.contains('/') {
        return None;
    }
    (doc.get_element_by_id(id) == Some(node)).then(|| format!("#{}", id))
}

/// Path of an element in a frame document, given the path of its `<iframe>`
pub fn frame_path(host: &str, inner: &str) -> String {
    format!("{}/{}/{}", host, FRAME_SEGMENT, inner.trim_start_matches('/'))
}

/// 1-based position among same-tag element siblings
fn sibling_ordinal(doc: &Document, node: NodeId) -> usize {
    let Some(tag) = doc.element(node).map(|el| el.tag()) else {
        return 1;
    };
    doc.sibling_list(node)
        .iter()
        .take_while(|&&sib| sib != node)
        .filter(|&&sib| doc.element(sib).map(|el| el.tag() == tag).unwrap_or(false))
        .count()
        + 1
}

/// Resolve a path back to a node; `None` when the DOM no longer matches
pub fn resolve(doc: &Document, path: &str) -> Option<NodeId> {
    let mut parts = path.split('/').filter(|p| !p.is_empty());
    let first = parts.next()?;

    let mut current = if let Some(id) = first.strip_prefix('#') {
        doc.get_element_by_id(id)?
    } else if first == "html" {
        doc.root()?
    } else {
        return None;
    };

    let mut in_shadow_root = false;
    for part in parts {
        if part == SHADOW_SEGMENT {
            if in_shadow_root {
                return None;
            }
            doc.shadow_root(current)?;
            in_shadow_root = true;
            continue;
        }

        let caps = SEGMENT_RE.captures(part)?;
        let tag = caps.get(1)?.as_str().to_ascii_lowercase();
        let ordinal: usize = caps.get(2)?.as_str().parse().ok()?;
        if ordinal == 0 {
            return None;
        }

        let candidates: &[NodeId] = if in_shadow_root {
            &doc.shadow_root(current)?.children
        } else {
            doc.children(current)
        };
        current = candidates
            .iter()
            .copied()
            .filter(|&id| doc.element(id).map(|el| el.tag() == tag).unwrap_or(false))
            .nth(ordinal - 1)?;
        in_shadow_root = false;
    }

    if in_shadow_root {
        return None;
    }
    Some(current)
}

impl Document {
    /// Path of an element, see [`path_for`]
    pub fn path_for(&self, node: NodeId) -> String {
        path_for(self, node)
    }

    /// Inverse of [`Document::path_for`]
    pub fn resolve_path(&self, path: &str) -> Option<NodeId> {
        resolve(self, path)
    }

    /// Resolve a path that may descend into attached frames through
    /// `::frame` segments. Returns the document the node belongs to.
    pub fn resolve_in_frames(&self, path: &str) -> Option<(&Document, NodeId)> {
        let separator = format!("/{}/", FRAME_SEGMENT);
        let mut doc = self;
        let mut rest = path;
        while let Some((host, inner)) = rest.split_once(separator.as_str()) {
            let iframe = doc.resolve_path(host)?;
            doc = doc.frame_document(iframe)?;
            rest = inner;
        }
        Some((doc, doc.resolve_path(rest)?))
    }
}
