// SPDX-License-Identifier: PMPL-1.0-or-later
//! Read-only document model consumed by the scanners.
//!
//! HTML is parsed with scraper (html5ever) and copied into a flat arena so
//! the scanners can walk parents, shadow roots and nested frames without
//! borrowing the parser's tree. Node ids are allocated in pre-order, which
//! makes a node id its document position.
//!
//! Things a static HTML document cannot know are attached by the host:
//! layout boxes via [`Document::set_bounding_box`] and same-origin frame
//! documents via [`Document::attach_frame`]. Declarative shadow roots
//! (`<template shadowrootmode>`) and `srcdoc` frames are picked up at parse
//! time.

pub mod path;
pub mod style;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Index of a node in its document's arena
pub type NodeId = usize;

/// Bounding box in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Zero-area boxes belong to elements that cannot be reached visually
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// An element's tag and attributes
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    /// Lowercase local name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key == name)
    }

    /// Non-empty `id` attribute
    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    /// First token of the `role` attribute, lowercased
    pub fn role(&self) -> Option<String> {
        self.attr("role")
            .and_then(|role| role.split_whitespace().next())
            .map(|role| role.to_ascii_lowercase())
    }

    /// Parsed `tabindex`; unparsable values count as absent
    pub fn tabindex(&self) -> Option<i32> {
        self.attr("tabindex")
            .and_then(|value| value.trim().parse::<i32>().ok())
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Shadow root encapsulation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowMode {
    Open,
    Closed,
}

/// Shadow root attached to a host element
#[derive(Debug, Clone)]
pub struct ShadowRoot {
    pub mode: ShadowMode,
    pub children: Vec<NodeId>,
}

/// How a node hangs off the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentLink {
    /// Ordinary child of an element
    Element(NodeId),
    /// Top-level child of the shadow root of this host
    ShadowHost(NodeId),
}

impl ParentLink {
    /// The element above this link in the flat tree
    pub fn node(self) -> NodeId {
        match self {
            ParentLink::Element(id) | ParentLink::ShadowHost(id) => id,
        }
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<ParentLink>,
    children: Vec<NodeId>,
    shadow_root: Option<ShadowRoot>,
}

/// Tags whose text never renders
const NON_RENDERED_TEXT_TAGS: &[&str] = &["script", "style", "template", "noscript"];

/// A parsed page
#[derive(Debug, Clone, Default)]
pub struct Document {
    url: String,
    title: String,
    nodes: Vec<Node>,
    root: Option<NodeId>,
    ids: HashMap<String, NodeId>,
    geometry: HashMap<NodeId, Rect>,
    frames: HashMap<NodeId, Document>,
}

impl Document {
    /// Parse an HTML document
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Document::default();

        let root = parsed.root_element();
        doc.root = doc.import(root);

        let title_sel = Selector::parse("head > title").expect("valid selector");
        doc.title = parsed
            .select(&title_sel)
            .next()
            .map(|t| collapse_whitespace(&t.text().collect::<String>()))
            .unwrap_or_default();

        let srcdoc_frames: Vec<(NodeId, String)> = doc
            .element_ids()
            .filter_map(|id| {
                let el = doc.element(id)?;
                if el.tag() != "iframe" {
                    return None;
                }
                el.attr("srcdoc").map(|src| (id, src.to_string()))
            })
            .collect();
        for (id, srcdoc) in srcdoc_frames {
            let mut frame = Document::parse(&srcdoc);
            frame.url = "about:srcdoc".to_string();
            doc.frames.insert(id, frame);
        }

        debug!(nodes = doc.nodes.len(), frames = doc.frames.len(), "Parsed document");
        doc
    }

    /// Set the page URL recorded in snapshots
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Attach a same-origin document to every `<iframe>` whose `src` equals
    /// `src`. Returns how many frames received it. Frames never attached stay
    /// inaccessible, as cross-origin frames are in a browser.
    pub fn attach_frame(&mut self, src: &str, html: &str) -> usize {
        let targets: Vec<NodeId> = self
            .element_ids()
            .filter(|&id| {
                self.element(id)
                    .map(|el| el.tag() == "iframe" && el.attr("srcdoc").is_none() && el.attr("src") == Some(src))
                    .unwrap_or(false)
            })
            .collect();
        for &id in &targets {
            let frame = Document::parse(html).with_url(src);
            self.frames.insert(id, frame);
        }
        targets.len()
    }

    /// Record the layout box of an element
    pub fn set_bounding_box(&mut self, node: NodeId, rect: Rect) {
        self.geometry.insert(node, rect);
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The `<html>` element
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// The `<body>` element
    pub fn body(&self) -> Option<NodeId> {
        let root = self.root?;
        self.element_children(root)
            .find(|&id| self.element(id).map(|el| el.tag() == "body").unwrap_or(false))
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes.get(node)?.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    /// Light-tree children, text included
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Light-tree element children
    pub fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node)
            .iter()
            .copied()
            .filter(|&id| self.is_element(id))
    }

    pub fn parent_link(&self, node: NodeId) -> Option<ParentLink> {
        self.nodes.get(node)?.parent
    }

    /// Parent in the flat tree: shadow-root children report their host
    pub fn flat_parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent_link(node).map(ParentLink::node)
    }

    /// Ancestors in the flat tree, nearest first
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.flat_parent(node), move |&id| self.flat_parent(id))
    }

    pub fn shadow_root(&self, node: NodeId) -> Option<&ShadowRoot> {
        self.nodes.get(node)?.shadow_root.as_ref()
    }

    /// Whether the node lives inside any shadow tree
    pub fn is_in_shadow(&self, node: NodeId) -> bool {
        let mut current = node;
        while let Some(link) = self.parent_link(current) {
            match link {
                ParentLink::ShadowHost(_) => return true,
                ParentLink::Element(parent) => current = parent,
            }
        }
        false
    }

    /// The child list a node belongs to: its parent's children or its host's
    /// shadow root children
    pub fn sibling_list(&self, node: NodeId) -> &[NodeId] {
        match self.parent_link(node) {
            Some(ParentLink::Element(parent)) => self.children(parent),
            Some(ParentLink::ShadowHost(host)) => self
                .shadow_root(host)
                .map(|root| root.children.as_slice())
                .unwrap_or(&[]),
            None => &[],
        }
    }

    /// `getElementById`: first element in document order, shadow trees excluded
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    /// Accessible document of an `<iframe>`, if any
    pub fn frame_document(&self, node: NodeId) -> Option<&Document> {
        self.frames.get(&node)
    }

    pub fn bounding_box(&self, node: NodeId) -> Option<Rect> {
        self.geometry.get(&node).copied()
    }

    /// Document position used for focus-order tie breaking
    pub fn position(&self, node: NodeId) -> usize {
        node
    }

    /// Every element id in the arena in document order, shadow content included
    pub fn element_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(|&id| self.is_element(id))
    }

    /// Light-tree elements in document order, as `querySelectorAll` sees them
    pub fn light_elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            if !self.is_element(id) {
                continue;
            }
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Concatenated light-tree text, skipping non-rendered subtrees
    pub fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        self.collect_text(node, &mut text);
        text
    }

    /// Text content with whitespace runs collapsed and ends trimmed
    pub fn collapsed_text(&self, node: NodeId) -> String {
        collapse_whitespace(&self.text_content(node))
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(n) = self.nodes.get(id) else {
                continue;
            };
            match &n.kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Element(el) => {
                    if NON_RENDERED_TEXT_TAGS.contains(&el.tag()) {
                        continue;
                    }
                    stack.extend(n.children.iter().rev().copied());
                }
            }
        }
    }

    fn push(&mut self, kind: NodeKind, parent: Option<ParentLink>) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
            shadow_root: None,
        });
        let id = self.nodes.len() - 1;
        match parent {
            Some(ParentLink::Element(p)) => self.nodes[p].children.push(id),
            Some(ParentLink::ShadowHost(host)) => {
                if let Some(root) = self.nodes[host].shadow_root.as_mut() {
                    root.children.push(id);
                }
            }
            None => {}
        }
        id
    }

    /// Copy the parsed tree below `root` into the arena.
    ///
    /// Walks with an explicit stack so nesting depth is bounded by memory,
    /// not by the call stack. Ids are allocated in pre-order; the contents
    /// of a declarative shadow template are allocated where the template
    /// stood and hung off the host's shadow root.
    fn import(&mut self, root: ElementRef<'_>) -> Option<NodeId> {
        let mut first = None;
        let mut stack = vec![(*root, None, false)];

        while let Some((source, link, in_shadow)) = stack.pop() {
            let id = match source.value() {
                scraper::Node::Element(value) => {
                    let element = Element {
                        tag: value.name().to_ascii_lowercase(),
                        attrs: value
                            .attrs()
                            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                            .collect(),
                    };
                    if !in_shadow {
                        if let Some(key) = element.id() {
                            let key = key.to_string();
                            let next = self.nodes.len();
                            self.ids.entry(key).or_insert(next);
                        }
                    }
                    self.push(NodeKind::Element(element), link)
                }
                scraper::Node::Text(text) => {
                    self.push(NodeKind::Text(String::from(&**text)), link);
                    continue;
                }
                _ => continue,
            };
            first.get_or_insert(id);

            let mut pending = Vec::new();
            for child in source.children() {
                let shadow_mode = ElementRef::wrap(child).and_then(declarative_shadow_mode);
                if let Some(mode) = shadow_mode {
                    if self.nodes[id].shadow_root.is_none() {
                        self.nodes[id].shadow_root = Some(ShadowRoot {
                            mode,
                            children: Vec::new(),
                        });
                        let shadow_link = Some(ParentLink::ShadowHost(id));
                        // template contents sit under a fragment node
                        for content in child.children() {
                            if matches!(content.value(), scraper::Node::Fragment) {
                                pending.extend(content.children().map(|n| (n, shadow_link, true)));
                            } else {
                                pending.push((content, shadow_link, true));
                            }
                        }
                        continue;
                    }
                }
                pending.push((child, Some(ParentLink::Element(id)), in_shadow));
            }
            stack.extend(pending.into_iter().rev());
        }

        first
    }
}

fn declarative_shadow_mode(el: ElementRef<'_>) -> Option<ShadowMode> {
    let value = el.value();
    if value.name() != "template" {
        return None;
    }
    match value.attr("shadowrootmode")?.to_ascii_lowercase().as_str() {
        "open" => Some(ShadowMode::Open),
        "closed" => Some(ShadowMode::Closed),
        _ => None,
    }
}

/// Collapse whitespace runs to single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to `max` characters, appending `…` when anything was cut
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
