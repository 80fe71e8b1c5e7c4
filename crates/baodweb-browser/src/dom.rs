//! Parse tree consumed by the block builder.
//!
//! Raw bytes go through `html5ever` into an `RcDom`, which is then copied
//! into plain owned [`Node`]s. The owned tree is `Send`, so a page can be
//! parsed on the loader thread and handed to the session afterwards.
//!
//! The copy is made with an explicit stack and caps element nesting at
//! [`MAX_DEPTH`], so the recursive walks over [`Node`] further down the
//! pipeline stay shallow whatever the markup looks like.

use std::rc::Rc;

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use baodweb_types::ParseError;

/// Tag name given to text nodes.
pub const TEXT_TAG: &str = "#text";

/// Tag name given to the document root.
pub const DOCUMENT_TAG: &str = "#document";

/// Deepest element nesting kept. A deeper element is dropped and its
/// children are attached to the nearest kept ancestor.
pub const MAX_DEPTH: usize = 64;

/// One node of the parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub tag: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
    /// Only set on text nodes.
    pub text: Option<String>,
}

impl Node {
    pub fn element(tag: &str, attrs: Vec<(String, String)>, children: Vec<Node>) -> Self {
        Self {
            tag: tag.to_string(),
            attrs,
            children,
            text: None,
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            tag: TEXT_TAG.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
            text: Some(text.to_string()),
        }
    }

    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    /// First attribute called `name`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(t) = &self.text {
            out.push_str(t);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// First node (pre-order, including `self`) with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Node> {
        if self.tag == tag {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(tag))
    }
}

/// An empty document, used when the input could not be read.
pub fn empty_document() -> Node {
    Node::element(DOCUMENT_TAG, Vec::new(), Vec::new())
}

/// Parse an HTML document. The parser never rejects markup; the only
/// error is a failure to read the input itself.
pub fn parse_html(bytes: &[u8]) -> Result<Node, ParseError> {
    let mut input = bytes;
    let dom = parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .read_from(&mut input)
        .map_err(|e| ParseError(e.to_string()))?;
    Ok(convert(&dom.document))
}

/// An element whose children are still being copied.
struct Open {
    node: Node,
    /// Children left to copy, last one first.
    rest: Vec<Handle>,
}

impl Open {
    fn new(node: Node, handle: &Handle) -> Self {
        Self {
            node,
            rest: children_rev(handle),
        }
    }
}

fn children_rev(handle: &Handle) -> Vec<Handle> {
    handle.children.borrow().iter().rev().map(Rc::clone).collect()
}

fn convert(document: &Handle) -> Node {
    let mut stack = vec![Open::new(empty_document(), document)];
    loop {
        let depth = stack.len();
        let Some(top) = stack.last_mut() else {
            return empty_document();
        };
        let Some(handle) = top.rest.pop() else {
            let Some(done) = stack.pop() else {
                return empty_document();
            };
            match stack.last_mut() {
                Some(parent) => parent.node.children.push(done.node),
                None => return done.node,
            }
            continue;
        };
        match &handle.data {
            NodeData::Text { contents } => top.node.children.push(Node::text(&contents.borrow())),
            NodeData::Element { .. } | NodeData::Document if depth > MAX_DEPTH => {
                top.rest.extend(children_rev(&handle));
            },
            NodeData::Element { name, attrs, .. } => {
                let attrs = attrs
                    .borrow()
                    .iter()
                    .map(|a| (a.name.local.to_string(), a.value.to_string()))
                    .collect();
                stack.push(Open::new(Node::element(&name.local, attrs, Vec::new()), &handle));
            },
            NodeData::Document => top.rest.extend(children_rev(&handle)),
            NodeData::Doctype { .. }
            | NodeData::Comment { .. }
            | NodeData::ProcessingInstruction { .. } => {},
        }
    }
}
