// Structural paths over a parsed gamestate.
//
// A path is an ordered list of key names. Numeric segments are plain names
// too: `planets.0.planet_size` walks into the block keyed `0`. At each level
// the first child in document order with the requested name wins.

use std::fmt;
use std::str::FromStr;

use crate::error::{EditError, Result};
use crate::script::{NodeId, NodeRef, ParsedDocument};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Path made of the first `n` segments.
    pub fn prefix(&self, n: usize) -> FieldPath {
        Self {
            segments: self.segments[..n.min(self.segments.len())].to_vec(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Accepts `a.b.0.c` or pointer style `/a/b/0/c`.
impl FromStr for FieldPath {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let segments: Vec<&str> = match trimmed.strip_prefix('/') {
            Some(rest) => rest.split('/').collect(),
            None => trimmed.split('.').collect(),
        };
        if trimmed.is_empty() || segments.iter().any(|seg| seg.is_empty()) {
            return Err(EditError::InvalidPath {
                input: s.to_string(),
            });
        }
        Ok(Self::from_segments(segments))
    }
}

impl From<&[&str]> for FieldPath {
    fn from(segments: &[&str]) -> Self {
        Self::from_segments(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for FieldPath {
    fn from(segments: [&str; N]) -> Self {
        Self::from_segments(segments)
    }
}

/// Resolves `path` starting at `from`, matching the first child of each name.
pub fn resolve_from<'d>(from: NodeRef<'d>, path: &FieldPath) -> Result<NodeRef<'d>> {
    let mut cur = from;
    for (i, seg) in path.segments().iter().enumerate() {
        cur = cur.child(seg).ok_or_else(|| EditError::PathNotFound {
            prefix: path.prefix(i + 1).to_string(),
        })?;
    }
    Ok(cur)
}

pub fn resolve<'d>(doc: &'d ParsedDocument, path: &FieldPath) -> Result<NodeRef<'d>> {
    resolve_from(doc.root(), path)
}

/// Every node reachable through `path` when duplicate sibling names are
/// followed instead of collapsed to the first one. Document order.
pub fn resolve_all<'d>(doc: &'d ParsedDocument, path: &FieldPath) -> Vec<NodeRef<'d>> {
    let mut frontier = vec![doc.root()];
    for seg in path.segments() {
        frontier = frontier
            .into_iter()
            .flat_map(|n| n.children_named(seg))
            .collect();
        if frontier.is_empty() {
            break;
        }
    }
    frontier
}

/// First node named `name` anywhere under `from`, depth-first in document order.
pub fn find_first<'d>(from: NodeRef<'d>, name: &str) -> Option<NodeRef<'d>> {
    let mut stack: Vec<NodeRef<'d>> = from.children().collect();
    stack.reverse();
    while let Some(n) = stack.pop() {
        if n.name() == Some(name) {
            return Some(n);
        }
        let len = stack.len();
        stack.extend(n.children());
        stack[len..].reverse();
    }
    None
}

impl ParsedDocument {
    pub fn resolve(&self, path: &FieldPath) -> Result<NodeRef<'_>> {
        resolve(self, path)
    }

    pub fn resolve_id(&self, path: &FieldPath) -> Result<NodeId> {
        resolve(self, path).map(|n| n.id())
    }
}
