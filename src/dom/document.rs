//! Parsed documents and node selections.

use std::fmt;

use scraper::{ElementRef, Html};

use crate::dom::selector::{self, SelectorError};

/// An owned, parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a full document. Malformed markup is recovered, never rejected.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Parse a fragment (no implied `<html>`/`<body>` wrapper handling).
    pub fn parse_fragment(markup: &str) -> Self {
        Self {
            html: Html::parse_fragment(markup),
        }
    }

    /// Selection holding only the root element.
    pub fn root(&self) -> Selection<'_> {
        Selection {
            nodes: vec![self.html.root_element()],
        }
    }

    /// Serialize the document back to markup.
    pub fn to_html(&self) -> String {
        self.html.html()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.html.root_element().value().name())
            .finish()
    }
}

/// An ordered, duplicate-free set of element nodes.
///
/// Nodes may come from different documents; [`Selection::union`] is how a
/// stage hands several tabs of one page to the next stage.
#[derive(Clone, Default)]
pub struct Selection<'a> {
    nodes: Vec<ElementRef<'a>>,
}

impl<'a> Selection<'a> {
    pub fn empty() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn from_element(element: ElementRef<'a>) -> Self {
        Self {
            nodes: vec![element],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Selection<'a>> + '_ {
        self.nodes.iter().map(|n| Selection::from_element(*n))
    }

    pub fn elements(&self) -> &[ElementRef<'a>] {
        &self.nodes
    }

    /// The `index`-th node as its own selection; empty when out of range.
    pub fn eq(&self, index: usize) -> Selection<'a> {
        self.nodes
            .get(index)
            .map(|n| Selection::from_element(*n))
            .unwrap_or_default()
    }

    pub fn first(&self) -> Selection<'a> {
        self.eq(0)
    }

    /// Descendants of every node matching `selector`, in document order per node.
    pub fn find(&self, selector: &str) -> Result<Selection<'a>, SelectorError> {
        let compiled = selector::compile(selector)?;
        let mut out = Selection::empty();
        for node in &self.nodes {
            for found in node.select(&compiled) {
                out.push(found);
            }
        }
        Ok(out)
    }

    /// Both selections, `self` first, duplicates dropped.
    pub fn union(mut self, other: Selection<'a>) -> Selection<'a> {
        for node in other.nodes {
            self.push(node);
        }
        self
    }

    /// Text directly owned by the nodes; text inside child elements is skipped.
    pub fn own_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            for child in node.children() {
                if let Some(text) = child.value().as_text() {
                    out.push_str(text);
                }
            }
        }
        out
    }

    /// All descendant text of all nodes.
    pub fn text(&self) -> String {
        self.nodes.iter().flat_map(|n| n.text()).collect()
    }

    /// Value of `name` on the first node; later nodes are never consulted.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.nodes.first().and_then(|n| n.value().attr(name))
    }

    /// Outer markup of every node, concatenated.
    pub fn html(&self) -> String {
        self.nodes.iter().map(|n| n.html()).collect()
    }

    fn push(&mut self, node: ElementRef<'a>) {
        if !self.nodes.contains(&node) {
            self.nodes.push(node);
        }
    }
}

impl fmt::Debug for Selection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.nodes.iter().map(|n| n.value().name()))
            .finish()
    }
}
