//! Schema paths and prefixed name references.

use super::ids::NodeId;
use crate::lexer::Span;
use std::fmt;

/// Resolution state of a cross-reference placeholder.
///
/// References advance `Unresolved` → `IntraFileResolved` → `Resolved`, or
/// reach the terminal `Linked` state for cross-module references that are
/// fully bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResolvableStatus {
    /// No target located yet.
    #[default]
    Unresolved,
    /// Target located within the same file.
    IntraFileResolved,
    /// Cross-module target fully bound.
    Linked,
    /// Reference fully processed (e.g. a `uses` that has been expanded).
    Resolved,
}

/// A possibly-prefixed name reference (`p:name` or `name`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixedName {
    /// The prefix, when written.
    pub prefix: Option<String>,
    /// The local name.
    pub name: String,
    /// Source span of the reference.
    pub span: Span,
    /// The referenced node, once resolved.
    pub resolved: Option<NodeId>,
    /// Resolution state.
    pub status: ResolvableStatus,
}

impl PrefixedName {
    /// Parse a `[prefix:]name` argument.
    #[must_use]
    pub fn parse(text: &str, span: Span) -> Self {
        let (prefix, name) = match text.split_once(':') {
            Some((p, n)) if !p.is_empty() && !n.is_empty() => {
                (Some(p.to_string()), n.to_string())
            }
            _ => (None, text.to_string()),
        };
        Self {
            prefix,
            name,
            span,
            resolved: None,
            status: ResolvableStatus::Unresolved,
        }
    }
}

impl fmt::Display for PrefixedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{p}:{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// One step of a schema path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathStep {
    /// The step's prefix, when written.
    pub prefix: Option<String>,
    /// The step's node name.
    pub name: String,
}

/// A parsed schema path, as used by `augment` targets, `refine` arguments
/// and `leafref` paths.
///
/// Predicates (`[...]`) are instance-addressing syntax; they are stripped
/// from the steps and kept only in `raw` (the compiler does not evaluate
/// XPath).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaPath {
    /// True when the path starts with `/`.
    pub absolute: bool,
    /// Number of leading `../` steps (relative paths only).
    pub up: u32,
    /// The named steps, outermost first.
    pub steps: Vec<PathStep>,
    /// The path text as written.
    pub raw: String,
    /// Source span of the path argument.
    pub span: Span,
}

impl SchemaPath {
    /// Parse a schema path argument.
    ///
    /// # Errors
    ///
    /// Returns a message when the path is empty or a step is malformed.
    pub fn parse(text: &str, span: Span) -> Result<Self, String> {
        let raw = text.to_string();
        let stripped = strip_predicates(text);
        let mut rest = stripped.trim();

        if rest.is_empty() {
            return Err("empty schema path".to_string());
        }

        let absolute = rest.starts_with('/');
        let mut up = 0u32;
        if absolute {
            rest = &rest[1..];
        } else {
            while let Some(r) = rest.strip_prefix("../") {
                up += 1;
                rest = r;
            }
            if rest == ".." {
                up += 1;
                rest = "";
            }
        }

        let mut steps = Vec::new();
        for part in rest.split('/') {
            let part = part.trim();
            if part.is_empty() {
                if steps.is_empty() && up > 0 {
                    // "../.." style paths end without a step
                    continue;
                }
                return Err(format!("empty step in schema path '{text}'"));
            }
            let (prefix, name) = match part.split_once(':') {
                Some((p, n)) if !p.is_empty() && !n.is_empty() => {
                    (Some(p.to_string()), n.to_string())
                }
                Some(_) => return Err(format!("malformed step '{part}' in schema path")),
                None => (None, part.to_string()),
            };
            steps.push(PathStep { prefix, name });
        }

        if steps.is_empty() && up == 0 {
            return Err("empty schema path".to_string());
        }

        Ok(Self {
            absolute,
            up,
            steps,
            raw,
            span,
        })
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Remove `[...]` predicate sections (bracket-balanced).
fn strip_predicates(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => result.push(c),
            _ => {}
        }
    }
    result
}
