// SPDX-License-Identifier: PMPL-1.0-or-later
//! Computed visibility from inline styles and user-agent defaults.
//!
//! Only the properties that decide keyboard reachability are modelled:
//! `display` and `visibility`. Stylesheets are not evaluated.

use super::{Document, Element, NodeId};

/// Elements the user-agent stylesheet renders with `display: none`
const UA_HIDDEN_TAGS: &[&str] = &[
    "head", "script", "style", "template", "noscript", "title", "meta", "link", "base",
];

/// Inline `style` declarations as lowercase (property, value) pairs
pub fn declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let value = value.trim();
            let value = value
                .strip_suffix("!important")
                .unwrap_or(value)
                .trim();
            Some((prop.trim().to_ascii_lowercase(), value.to_ascii_lowercase()))
        })
        .collect()
}

/// Last declared value of an inline style property
fn inline_value(el: &Element, property: &str) -> Option<String> {
    let style = el.attr("style")?;
    declarations(style)
        .into_iter()
        .filter(|(prop, _)| prop == property)
        .map(|(_, value)| value)
        .last()
}

/// Whether the element itself generates no box
pub fn is_display_none(el: &Element) -> bool {
    if let Some(display) = inline_value(el, "display") {
        return display == "none";
    }
    if el.has_attr("hidden") || UA_HIDDEN_TAGS.contains(&el.tag()) {
        return true;
    }
    el.tag() == "input"
        && el
            .attr("type")
            .map(|t| t.eq_ignore_ascii_case("hidden"))
            .unwrap_or(false)
}

/// Whether the element itself is declared invisible
pub fn is_visibility_hidden(el: &Element) -> bool {
    matches!(
        inline_value(el, "visibility").as_deref(),
        Some("hidden") | Some("collapse")
    )
}

impl Document {
    /// Whether the node or any flat-tree ancestor carries the `hidden` attribute
    pub fn is_hidden_by_attribute(&self, node: NodeId) -> bool {
        std::iter::once(node)
            .chain(self.ancestors(node))
            .filter_map(|id| self.element(id))
            .any(|el| el.has_attr("hidden"))
    }

    /// Whether the node renders: neither it nor any flat-tree ancestor is
    /// `display: none` or `visibility: hidden`
    pub fn is_rendered(&self, node: NodeId) -> bool {
        !std::iter::once(node)
            .chain(self.ancestors(node))
            .filter_map(|id| self.element(id))
            .any(|el| is_display_none(el) || is_visibility_hidden(el))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_child(doc: &Document, id: &str) -> NodeId {
        doc.get_element_by_id(id).expect("element")
    }

    #[test]
    fn test_declarations() {
        let decls = declarations("color: red; DISPLAY : None !important;;bogus");
        assert_eq!(
            decls,
            vec![
                ("color".to_string(), "red".to_string()),
                ("display".to_string(), "none".to_string()),
            ]
        );
    }

    #[test]
    fn test_inline_display_none_inherited() {
        let doc = Document::parse(r#"<body><div style="display:none"><a id="a" href="/">x</a></div></body>"#);
        assert!(!doc.is_rendered(body_child(&doc, "a")));
    }

    #[test]
    fn test_visibility_hidden() {
        let doc = Document::parse(r#"<body><p id="p" style="visibility: hidden">x</p><p id="q" style="visibility: visible">y</p></body>"#);
        assert!(!doc.is_rendered(body_child(&doc, "p")));
        assert!(doc.is_rendered(body_child(&doc, "q")));
    }

    #[test]
    fn test_hidden_attribute_on_ancestor() {
        let doc = Document::parse(r#"<body><section hidden><button id="b">x</button></section></body>"#);
        let b = body_child(&doc, "b");
        assert!(doc.is_hidden_by_attribute(b));
        assert!(!doc.is_rendered(b));
    }

    #[test]
    fn test_explicit_display_overrides_hidden() {
        let doc = Document::parse(r#"<body><div id="d" hidden style="display: block">x</div></body>"#);
        assert!(doc.is_rendered(body_child(&doc, "d")));
    }

    #[test]
    fn test_hidden_input() {
        let doc = Document::parse(r#"<body><input id="i" type="hidden" value="1"></body>"#);
        assert!(!doc.is_rendered(body_child(&doc, "i")));
    }
}
