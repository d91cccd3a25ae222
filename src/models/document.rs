//! Owned document tree.
//!
//! `scraper::Html` cannot cross `.await` points in spawned tasks, so parsed
//! pages are converted into this plain tree right after selection. Transforms
//! operate on it and [`Document::render`] serializes it back to markup.

use scraper::{ElementRef, Html, Node as HtmlNode};

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text content is serialized verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "xmp", "iframe", "noembed", "noframes"];

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name
    pub name: String,
    /// Attributes in source order
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }
}

/// An ordered forest of nodes: a whole page or the sub-trees of a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// A minimal document holding nothing but `text`.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self::new(vec![Node::Text(text)])
    }

    /// Convert the whole parsed page, starting at its root element.
    pub fn from_html(html: &Html) -> Self {
        Self::new(vec![convert_element(html.root_element())])
    }

    /// Convert a sequence of matched elements, keeping their order.
    pub fn from_elements<'a>(elements: impl IntoIterator<Item = ElementRef<'a>>) -> Self {
        Self::new(elements.into_iter().map(convert_element).collect())
    }

    /// Parse markup and convert the whole page.
    pub fn parse(markup: &str) -> Self {
        Self::from_html(&Html::parse_document(markup))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Serialize the tree back to markup.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            render_node(node, &mut out, false);
        }
        out
    }

    /// Visit every node in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        fn go<'a>(node: &'a Node, visit: &mut impl FnMut(&'a Node)) {
            visit(node);
            if let Node::Element(element) = node {
                for child in &element.children {
                    go(child, visit);
                }
            }
        }
        for node in &self.nodes {
            go(node, visit);
        }
    }
}

fn convert_element(element: ElementRef<'_>) -> Node {
    let value = element.value();
    let mut converted = Element {
        name: value.name().to_ascii_lowercase(),
        attrs: value
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        children: Vec::new(),
    };

    for child in element.children() {
        match child.value() {
            HtmlNode::Text(text) => converted.children.push(Node::Text(text.to_string())),
            HtmlNode::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    converted.children.push(convert_element(child_element));
                }
            }
            // Comments, doctypes and processing instructions carry no content.
            _ => {}
        }
    }

    Node::Element(converted)
}

fn render_node(node: &Node, out: &mut String, raw_text: bool) {
    match node {
        Node::Text(text) if raw_text => out.push_str(text),
        Node::Text(text) => escape_text(text, out),
        Node::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for (name, value) in &element.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attr(value, out);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&element.name.as_str()) {
                return;
            }

            let raw = RAW_TEXT_ELEMENTS.contains(&element.name.as_str());
            for child in &element.children {
                render_node(child, out, raw);
            }

            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
