// Tree parser for gamestate script text.
//
// Grammar handled here:
//   node     := [ key [ '=' value ] ] [ block ]
//   value    := quoted | run up to '{', '}' or end of line, trimmed
//   block    := '{' node* '}'
//   document := node*
//
// Nodes live in a flat arena owned by `ParsedDocument`; parent links are plain
// indices. Every node records the byte span it occupies and, when present,
// the exact span of its key and value so edits can splice the source text
// without re-emitting anything else.

use log::{debug, warn};

use crate::cursor::{Cursor, Span, TokenKind};
use crate::error::{EditError, Result};
use crate::path::FieldPath;

/// Index of a node inside its `ParsedDocument`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) name: Option<Span>,
    pub(crate) value: Option<Span>,
    /// `{` through `}` inclusive.
    pub(crate) block: Option<Span>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) span: Span,
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    fn root(len: usize) -> Self {
        Self {
            name: None,
            value: None,
            block: None,
            children: Vec::new(),
            span: Span::new(0, len),
            parent: None,
        }
    }
}

/// A parsed gamestate plus the exact text it came from. Spans are only valid
/// against this text; any edit produces new text that must be parsed again.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    text: String,
    nodes: Vec<Node>,
}

impl ParsedDocument {
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let nodes = Parser::new(&text).parse()?;
        debug!("parsed {} bytes into {} nodes", text.len(), nodes.len());
        Ok(Self { text, nodes })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.node(NodeId::ROOT)
    }

    /// Panics if `id` did not come from this document.
    pub(crate) fn node(&self, id: NodeId) -> NodeRef<'_> {
        assert!(id.0 < self.nodes.len(), "node id out of range");
        NodeRef { doc: self, id }
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.0 < self.nodes.len()).then_some(NodeRef { doc: self, id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// All nodes in document (pre-)order, root first.
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> {
        (0..self.nodes.len()).map(move |i| NodeRef {
            doc: self,
            id: NodeId(i),
        })
    }

    fn raw(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

/// Borrowed handle to one node of a `ParsedDocument`.
#[derive(Clone, Copy)]
pub struct NodeRef<'d> {
    doc: &'d ParsedDocument,
    id: NodeId,
}

impl<'d> NodeRef<'d> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'d ParsedDocument {
        self.doc
    }

    fn node(&self) -> &'d Node {
        self.doc.raw(self.id)
    }

    pub fn name(&self) -> Option<&'d str> {
        self.node().name.map(|s| &self.doc.text[s.range()])
    }

    /// The value exactly as written, quotes included.
    pub fn value(&self) -> Option<&'d str> {
        self.node().value.map(|s| &self.doc.text[s.range()])
    }

    /// The value with one pair of surrounding quotes removed, if present.
    pub fn value_unquoted(&self) -> Option<&'d str> {
        self.value().map(unquote)
    }

    pub fn span(&self) -> Span {
        self.node().span
    }

    pub fn name_span(&self) -> Option<Span> {
        self.node().name
    }

    pub fn value_span(&self) -> Option<Span> {
        self.node().value
    }

    pub fn block_span(&self) -> Option<Span> {
        self.node().block
    }

    /// Source text of the whole node.
    pub fn source(&self) -> &'d str {
        &self.doc.text[self.span().range()]
    }

    pub fn is_scalar(&self) -> bool {
        self.node().value.is_some()
    }

    pub fn is_block(&self) -> bool {
        self.node().block.is_some()
    }

    pub fn is_root(&self) -> bool {
        self.id == NodeId::ROOT
    }

    pub fn parent(&self) -> Option<NodeRef<'d>> {
        self.node().parent.map(|id| NodeRef { doc: self.doc, id })
    }

    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    pub fn children(self) -> impl Iterator<Item = NodeRef<'d>> {
        let doc = self.doc;
        self.node()
            .children
            .iter()
            .map(move |&id| NodeRef { doc, id })
    }

    /// First child with this exact name.
    pub fn child(&self, name: &str) -> Option<NodeRef<'d>> {
        self.children().find(|c| c.name() == Some(name))
    }

    pub fn children_named(self, name: &str) -> impl Iterator<Item = NodeRef<'d>> {
        self.children().filter(move |c| c.name() == Some(name))
    }

    /// Structural path from the root, or `None` when an ancestor has no name
    /// (anonymous list members cannot be addressed by name).
    pub fn path(&self) -> Option<FieldPath> {
        let mut segments = Vec::new();
        let mut cur = Some(*self);
        while let Some(n) = cur {
            if n.is_root() {
                break;
            }
            segments.push(n.name()?.to_string());
            cur = n.parent();
        }
        segments.reverse();
        Some(FieldPath::from_segments(segments))
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id.0)
            .field("name", &self.name())
            .field("value", &self.value())
            .field("span", &self.span())
            .field("children", &self.child_count())
            .finish()
    }
}

pub fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .map(|rest| rest.strip_suffix('"').unwrap_or(rest))
        .unwrap_or(s)
}

struct Parser<'a> {
    cur: Cursor<'a>,
    nodes: Vec<Node>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            cur: Cursor::new(text),
            nodes: vec![Node::root(text.len())],
        }
    }

    // Blocks are tracked on an explicit stack so nesting depth never touches
    // the native stack.
    fn parse(mut self) -> Result<Vec<Node>> {
        let mut open: Vec<(NodeId, usize)> = Vec::new();
        loop {
            self.cur.skip_whitespace();
            let parent = open.last().map(|&(id, _)| id).unwrap_or(NodeId::ROOT);
            let Some(kind) = self.cur.peek() else {
                if let Some(&(_, brace)) = open.last() {
                    return Err(EditError::unterminated(self.cur.text(), brace));
                }
                break;
            };
            if kind == TokenKind::CloseBrace {
                let Some(tok) = self.cur.advance() else { break };
                match open.pop() {
                    Some((id, brace)) => {
                        let node = &mut self.nodes[id.0];
                        node.block = Some(Span::new(brace, tok.span.end));
                        node.span.end = tok.span.end;
                    }
                    None => {
                        warn!("stray '}}' at byte {} kept as opaque value", tok.span.start);
                        self.push(parent, None, Some(tok.span), tok.span);
                    }
                }
                continue;
            }
            let id = self.parse_head(parent);
            self.cur.skip_whitespace();
            if self.cur.peek() == Some(TokenKind::OpenBrace) {
                let Some(tok) = self.cur.advance() else { break };
                open.push((id, tok.span.start));
            }
        }
        Ok(self.nodes)
    }

    /// Key, `=` and value of one node. Consumes nothing for an anonymous block.
    fn parse_head(&mut self, parent: NodeId) -> NodeId {
        let start = self.cur.pos();
        let mut name = None;
        let mut value = None;
        let mut end = start;
        match self.cur.peek() {
            Some(TokenKind::Bareword) => {
                if let Some(tok) = self.cur.advance() {
                    name = Some(tok.span);
                    end = tok.span.end;
                }
                self.cur.skip_whitespace();
                if self.cur.peek() == Some(TokenKind::Equals) {
                    self.cur.advance();
                    end = self.cur.pos();
                    value = self.parse_value();
                }
            }
            Some(TokenKind::Equals) => {
                self.cur.advance();
                end = self.cur.pos();
                value = self.parse_value();
            }
            Some(TokenKind::Quoted { .. }) => value = self.parse_value(),
            _ => {}
        }
        if let Some(v) = value {
            end = v.end;
        }
        self.push(parent, name, value, Span::new(start, end))
    }

    fn parse_value(&mut self) -> Option<Span> {
        self.cur.skip_whitespace();
        match self.cur.peek()? {
            TokenKind::Bareword => self.cur.advance_value_run(),
            TokenKind::Quoted { closed } => {
                let tok = self.cur.advance()?;
                if !closed {
                    warn!("unterminated quoted string at byte {}", tok.span.start);
                }
                Some(tok.span)
            }
            _ => None,
        }
    }

    fn push(
        &mut self,
        parent: NodeId,
        name: Option<Span>,
        value: Option<Span>,
        span: Span,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name,
            value,
            block: None,
            children: Vec::new(),
            span,
            parent: Some(parent),
        });
        self.nodes[parent.0].children.push(id);
        id
    }
}
