use std::fmt;

use log::debug;

use crate::cursor::Span;
use crate::error::{EditError, Result};
use crate::path::FieldPath;
use crate::script::{NodeRef, ParsedDocument, unquote};

/// One field edit: where, and the literal text to put there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPatch {
    pub path: FieldPath,
    pub value: String,
}

impl FieldPatch {
    pub fn new(path: impl Into<FieldPath>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }
}

/// Shape of a scalar literal, inferred from what the document already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Float,
    /// `yes` / `no`
    Bool,
    /// `2200.01.01`
    Date,
    Quoted,
    Bareword,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Bool => "yes/no",
            ValueKind::Date => "date",
            ValueKind::Quoted => "quoted string",
            ValueKind::Bareword => "bareword",
        })
    }
}

impl ValueKind {
    pub fn infer(literal: &str) -> Self {
        if literal.starts_with('"') {
            ValueKind::Quoted
        } else if literal.parse::<i64>().is_ok() {
            ValueKind::Integer
        } else if is_float(literal) {
            ValueKind::Float
        } else if literal == "yes" || literal == "no" {
            ValueKind::Bool
        } else if is_date(literal) {
            ValueKind::Date
        } else {
            ValueKind::Bareword
        }
    }
}

fn is_float(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+'))
        && s.parse::<f64>().is_ok()
}

fn is_date(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 3
        && parts.iter().enumerate().all(|(i, p)| {
            !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) && (i == 0 || p.len() <= 2)
        })
}

/// Checks `input` against `kind` and returns the literal to write.
/// Quoted kinds accept bare text and add the quotes.
pub fn coerce_literal(kind: ValueKind, input: &str) -> Option<String> {
    let input = input.trim();
    match kind {
        ValueKind::Integer => input.parse::<i64>().is_ok().then(|| input.to_string()),
        ValueKind::Float => is_float(input).then(|| input.to_string()),
        ValueKind::Bool => matches!(input, "yes" | "no").then(|| input.to_string()),
        ValueKind::Date => is_date(input).then(|| input.to_string()),
        ValueKind::Quoted => {
            let inner = if input.len() >= 2 && input.starts_with('"') && input.ends_with('"') {
                &input[1..input.len() - 1]
            } else {
                input
            };
            (!inner.contains(['"', '\n', '\r'])).then(|| format!("\"{inner}\""))
        }
        ValueKind::Bareword => {
            // interior spaces are fine; braces, quotes and line breaks would change the tree
            let structural = input.contains(['{', '}', '"', '\n', '\r']);
            (!input.is_empty() && !structural).then(|| input.to_string())
        }
    }
}

/// Byte range of the scalar `target` holds, or `NotAScalar`.
fn value_span(target: NodeRef<'_>, path: &FieldPath) -> Result<Span> {
    target.value_span().ok_or_else(|| EditError::NotAScalar {
        path: path.to_string(),
    })
}

fn splice(text: &str, span: Span, literal: &str) -> String {
    let mut out = String::with_capacity(text.len() - span.len() + literal.len());
    out.push_str(&text[..span.start]);
    out.push_str(literal);
    out.push_str(&text[span.end..]);
    out
}

/// Replaces the value at `path` with `literal` and returns the new text.
/// Every byte outside the old value's span is copied unchanged.
pub fn apply_field_patch(doc: &ParsedDocument, path: &FieldPath, literal: &str) -> Result<String> {
    let target = doc.resolve(path)?;
    let span = value_span(target, path)?;
    debug!(
        "patch {path}: bytes {}..{} {:?} -> {:?}",
        span.start,
        span.end,
        target.value().unwrap_or_default(),
        literal
    );
    Ok(splice(doc.text(), span, literal))
}

/// Like `apply_field_patch`, but `input` must fit the kind of the value
/// currently stored at `path`.
pub fn apply_typed_patch(doc: &ParsedDocument, path: &FieldPath, input: &str) -> Result<String> {
    let target = doc.resolve(path)?;
    let current = target.value().ok_or_else(|| EditError::NotAScalar {
        path: path.to_string(),
    })?;
    let literal = coerce_for(path, current, input)?;
    apply_field_patch(doc, path, &literal)
}

pub(crate) fn coerce_for(path: &FieldPath, current: &str, input: &str) -> Result<String> {
    let kind = ValueKind::infer(current);
    coerce_literal(kind, input).ok_or_else(|| EditError::TypeCoercion {
        path: path.to_string(),
        expected: kind,
        literal: input.to_string(),
    })
}

/// Applies several patches against one parse. All paths are resolved before
/// any text changes; a later patch to the same value replaces an earlier one.
/// Splicing runs from the rightmost value leftwards so spans stay valid.
pub fn apply_field_patches(doc: &ParsedDocument, patches: &[FieldPatch]) -> Result<String> {
    let mut edits: Vec<(Span, &str)> = Vec::with_capacity(patches.len());
    for patch in patches {
        let span = value_span(doc.resolve(&patch.path)?, &patch.path)?;
        match edits.iter_mut().find(|(s, _)| *s == span) {
            Some(slot) => slot.1 = patch.value.as_str(),
            None => edits.push((span, patch.value.as_str())),
        }
    }
    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    let mut text = doc.text().to_string();
    for (span, literal) in &edits {
        text.replace_range(span.range(), literal);
    }
    debug!("applied {} patch(es) in one pass", edits.len());
    Ok(text)
}

/// Typed variant of `apply_field_patches`: every input is coerced against the
/// value it replaces before anything is spliced.
pub fn apply_typed_patches(doc: &ParsedDocument, patches: &[FieldPatch]) -> Result<String> {
    let mut coerced = Vec::with_capacity(patches.len());
    for patch in patches {
        let target = doc.resolve(&patch.path)?;
        let current = target.value().ok_or_else(|| EditError::NotAScalar {
            path: patch.path.to_string(),
        })?;
        coerced.push(FieldPatch {
            path: patch.path.clone(),
            value: coerce_for(&patch.path, current, &patch.value)?,
        });
    }
    apply_field_patches(doc, &coerced)
}

/// Reads the scalar at `path`, quotes stripped.
pub fn get_field(doc: &ParsedDocument, path: &FieldPath) -> Result<String> {
    let target = doc.resolve(path)?;
    target
        .value()
        .map(|v| unquote(v).to_string())
        .ok_or_else(|| EditError::NotAScalar {
            path: path.to_string(),
        })
}
