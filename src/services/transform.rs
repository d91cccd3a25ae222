//! Transform pipeline.
//!
//! Transforms reduce volatile content (counters, inline styles, scripts,
//! markup) before a selection is compared with its baseline. Each one is a
//! pure function of its input. A transform either yields a tree or, like
//! `html`, plain text; text output is lifted back into a minimal document at
//! the boundary so the next stage always receives a tree.

use crate::models::{Document, Element, Node, Transform};

/// Output of a single stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Form {
    Tree(Document),
    Text(String),
}

impl Form {
    /// Lift the stage output into tree form.
    pub fn into_tree(self) -> Document {
        match self {
            Form::Tree(document) => document,
            Form::Text(text) => Document::from_text(text),
        }
    }
}

impl Transform {
    /// Apply this transform to a document.
    pub fn apply(&self, document: Document) -> Form {
        match self {
            Transform::Numbers => Form::Tree(strip_numbers(document)),
            Transform::Attrs => Form::Tree(strip_attrs(document)),
            Transform::Scripts => Form::Tree(strip_scripts(document)),
            Transform::Html => Form::Text(flatten_text(&document)),
            Transform::Unknown(name) => {
                log::warn!("Ignoring unknown strip function '{}'", name);
                Form::Tree(document)
            }
        }
    }
}

/// Ordered list of transforms, applied exactly as configured.
#[derive(Debug, Clone, Default)]
pub struct TransformPipeline<'a> {
    transforms: &'a [Transform],
}

impl<'a> TransformPipeline<'a> {
    pub fn new(transforms: &'a [Transform]) -> Self {
        Self { transforms }
    }

    pub fn run(&self, document: Document) -> Document {
        self.transforms
            .iter()
            .fold(document, |document, transform| {
                transform.apply(document).into_tree()
            })
    }
}

/// Remove every numeric character from every text node.
pub fn strip_numbers(document: Document) -> Document {
    map_nodes(document, &mut |node| match node {
        Node::Text(text) => Some(Node::Text(
            text.chars().filter(|c| !c.is_numeric()).collect(),
        )),
        element => Some(element),
    })
}

/// Remove every attribute from every element.
pub fn strip_attrs(document: Document) -> Document {
    map_nodes(document, &mut |node| match node {
        Node::Element(mut element) => {
            element.attrs.clear();
            Some(Node::Element(element))
        }
        text => Some(text),
    })
}

/// Remove every script element together with its content.
pub fn strip_scripts(document: Document) -> Document {
    map_nodes(document, &mut |node| match node {
        Node::Element(element) if element.name.eq_ignore_ascii_case("script") => None,
        other => Some(other),
    })
}

/// Concatenate the trimmed text of every text node in pre-order, one per line.
pub fn flatten_text(document: &Document) -> String {
    let mut out = String::new();
    document.walk(&mut |node| {
        if let Node::Text(text) = node {
            out.push_str(text.trim());
            out.push('\n');
        }
    });
    out
}

/// Rebuild the tree bottom-up, letting `f` replace or drop each node.
/// Children are mapped before their parent sees them.
fn map_nodes(document: Document, f: &mut impl FnMut(Node) -> Option<Node>) -> Document {
    fn map_node(node: Node, f: &mut impl FnMut(Node) -> Option<Node>) -> Option<Node> {
        match f(node)? {
            Node::Element(Element {
                name,
                attrs,
                children,
            }) => Some(Node::Element(Element {
                name,
                attrs,
                children: children.into_iter().filter_map(|c| map_node(c, f)).collect(),
            })),
            text => Some(text),
        }
    }

    Document::new(
        document
            .nodes
            .into_iter()
            .filter_map(|node| map_node(node, f))
            .collect(),
    )
}
