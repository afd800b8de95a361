//! Owned, mutable XML tree for OOXML parts.
//!
//! roxmltree gives a fast read-only view; the assembler needs to edit, clone
//! and re-serialize parts, so each part is parsed once into [`Element`].
//! WordprocessingML names are normalized to the `w:` prefix so lookups can
//! use local names.

use super::WML_NS;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Qualified name, e.g. `w:tbl`.
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// Schema order of `w:rPr` children.
pub(crate) const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect",
    "bdr", "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout",
    "specVanish", "oMath",
];

/// Schema order of `w:pPr` children.
pub(crate) const PPR_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl", "numPr",
    "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens", "kinsoku", "wordWrap",
    "overflowPunct", "topLinePunct", "autoSpaceDE", "autoSpaceDN", "bidi", "adjustRightInd",
    "snapToGrid", "spacing", "ind", "contextualSpacing", "mirrorIndents", "suppressOverlap",
    "jc", "textDirection", "textAlignment", "textboxTightWrap", "outlineLvl", "divId",
    "cnfStyle", "rPr", "sectPr", "pPrChange",
];

/// Schema order of `w:sectPr` children.
pub(crate) const SECTPR_ORDER: &[&str] = &[
    "headerReference", "footerReference", "footnotePr", "endnotePr", "type", "pgSz", "pgMar",
    "paperSrc", "pgBorders", "lnNumType", "pgNumType", "cols", "formProt", "vAlign",
    "noEndnote", "titlePg", "textDirection", "bidi", "rtlGutter", "docGrid", "printerSettings",
    "sectPrChange",
];

/// Parse a part into an owned tree. Comments and processing instructions
/// are dropped.
pub fn parse(text: &str) -> Result<Element, roxmltree::Error> {
    let doc = roxmltree::Document::parse(text)?;
    Ok(convert(doc.root_element(), None))
}

fn qualified(node: roxmltree::Node, ns: Option<&str>, local: &str) -> String {
    match ns {
        Some(WML_NS) => format!("w:{local}"),
        Some(XML_NS) => format!("xml:{local}"),
        Some(uri) => match node.lookup_prefix(uri) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
            _ => local.to_string(),
        },
        None => local.to_string(),
    }
}

fn convert(node: roxmltree::Node, parent: Option<roxmltree::Node>) -> Element {
    let tag = node.tag_name();
    let name = qualified(node, tag.namespace(), tag.name());

    let mut attrs = Vec::new();
    for ns in node.namespaces() {
        let inherited = parent.is_some_and(|p| {
            p.namespaces()
                .any(|pns| pns.name() == ns.name() && pns.uri() == ns.uri())
        });
        if inherited || ns.uri() == XML_NS {
            continue;
        }
        let key = match ns.name() {
            _ if ns.uri() == WML_NS => "xmlns:w".to_string(),
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        attrs.push((key, ns.uri().to_string()));
    }
    for attr in node.attributes() {
        attrs.push((
            qualified(node, attr.namespace(), attr.name()),
            attr.value().to_string(),
        ));
    }

    let children = node
        .children()
        .filter_map(|child| {
            if child.is_element() {
                Some(Node::Element(convert(child, Some(node))))
            } else if child.is_text() {
                child.text().map(|t| Node::Text(t.to_string()))
            } else {
                None
            }
        })
        .collect();

    Element {
        name,
        attrs,
        children,
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A WordprocessingML element, `w:{local}`.
    pub fn w(local: &str) -> Self {
        Self::new(format!("w:{local}"))
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn is_w(&self, local: &str) -> bool {
        self.name
            .strip_prefix("w:")
            .is_some_and(|rest| rest == local)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn w_child(&self, local: &str) -> Option<&Element> {
        self.elements().find(|e| e.is_w(local))
    }

    pub fn w_child_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.is_w(local))
    }

    pub fn w_children<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.is_w(local))
    }

    pub fn w_children_mut<'a>(
        &'a mut self,
        local: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> {
        self.elements_mut().filter(move |e| e.is_w(local))
    }

    /// Drop every `w:{local}` child.
    pub fn remove_w_children(&mut self, local: &str) {
        self.children
            .retain(|n| !matches!(n, Node::Element(e) if e.is_w(local)));
    }

    /// Return the `w:{local}` child, inserting it at its schema position
    /// (per `order`) when absent.
    pub fn ordered_child_mut(&mut self, local: &str, order: &[&str]) -> &mut Element {
        let existing = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.is_w(local)));
        let index = match existing {
            Some(i) => i,
            None => {
                let rank = order.iter().position(|o| *o == local).unwrap_or(order.len());
                let insert_at = self
                    .children
                    .iter()
                    .position(|n| match n {
                        Node::Element(e) => e
                            .name
                            .strip_prefix("w:")
                            .and_then(|l| order.iter().position(|o| *o == l))
                            .is_some_and(|r| r > rank),
                        Node::Text(_) => false,
                    })
                    .unwrap_or(self.children.len());
                self.children.insert(insert_at, Node::Element(Element::w(local)));
                insert_at
            }
        };
        match &mut self.children[index] {
            Node::Element(e) => e,
            Node::Text(_) => unreachable!("index points at an element"),
        }
    }

    /// The `w:pPr`/`w:rPr`/`w:tcPr`-style property child, always the first
    /// element. Text nodes (indentation) before it are skipped.
    pub fn properties_mut(&mut self, local: &str) -> &mut Element {
        let first = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(_)));
        let index = match first {
            Some(i) if matches!(&self.children[i], Node::Element(e) if e.is_w(local)) => i,
            _ => {
                self.remove_w_children(local);
                self.children.insert(0, Node::Element(Element::w(local)));
                0
            }
        };
        match &mut self.children[index] {
            Node::Element(e) => e,
            Node::Text(_) => unreachable!("index points at an element"),
        }
    }

    /// Depth-first visit of all descendant elements, `self` included.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Element)) {
        visit(self);
        for child in self.elements() {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Element)) {
        visit(self);
        for child in self.elements_mut() {
            child.walk_mut(visit);
        }
    }

    pub fn serialize(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n");
        self.write_to(&mut out);
        out
    }

    pub fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            escape_into(out, v, true);
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(e) => e.write_to(out),
                Node::Text(t) => escape_into(out, t, false),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\n' if attribute => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' if attribute => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
}
