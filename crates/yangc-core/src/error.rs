//! Compile error taxonomy.
//!
//! Every stage reports errors through [`CompileError`]. Inside the resolver,
//! a reference that is merely not resolvable *yet* is not an error; only a
//! fixed-point round that makes no progress converts residual placeholders
//! into [`ReferenceErrorKind::UnresolvedReference`] errors.

use crate::lexer::Span;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Structural violations detected by the tree-walk listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructuralErrorKind {
    /// A non-module statement was encountered with an empty holder stack.
    MissingHolder,
    /// The statement may not appear under its current holder.
    InvalidHolder,
    /// A 0..1 statement appeared twice under one holder.
    DuplicateStatement,
    /// A mandatory substatement is missing.
    Cardinality,
}

impl fmt::Display for StructuralErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingHolder => "missing holder",
            Self::InvalidHolder => "invalid holder",
            Self::DuplicateStatement => "duplicate statement",
            Self::Cardinality => "cardinality violation",
        };
        f.write_str(s)
    }
}

/// Reference violations detected by the linker/resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceErrorKind {
    /// A prefix has no matching import, or an imported module was not found.
    MissingImport,
    /// A named definition could not be located.
    UnresolvedReference,
    /// Imports, includes, groupings or identities form a cycle.
    CyclicReference,
}

impl fmt::Display for ReferenceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingImport => "missing import",
            Self::UnresolvedReference => "unresolved reference",
            Self::CyclicReference => "cyclic reference",
        };
        f.write_str(s)
    }
}

/// The error category, per the taxonomy of the compiler.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Grammar-level error.
    #[error("syntax error")]
    Syntax,
    /// Statement-tree shape violation.
    #[error("{0}")]
    Structural(StructuralErrorKind),
    /// Cross-reference violation.
    #[error("{0}")]
    Reference(ReferenceErrorKind),
    /// Schema constraint violation (collisions, key rules, augment rules).
    #[error("constraint violation")]
    Constraint,
    /// Malformed or out-of-range revision date.
    #[error("invalid date")]
    Date,
    /// Invariant violated after a phase; indicates a compiler bug.
    #[error("internal error")]
    Internal,
    /// File system failure.
    #[error("io error")]
    Io,
}

/// A single compile error with optional source attribution.
#[derive(Debug)]
pub struct CompileError {
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Byte span in the originating file, when known.
    pub span: Option<Span>,
    /// Originating file, when known.
    pub path: Option<PathBuf>,
    /// 1-based line/column, when a span and line index were available.
    pub line_col: Option<(u32, u32)>,
}

impl CompileError {
    /// Create an error with no source attribution.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
            path: None,
            line_col: None,
        }
    }

    /// Create an error anchored at a span.
    #[must_use]
    pub fn at(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: Some(span),
            path: None,
            line_col: None,
        }
    }

    /// Attach the originating file path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach a resolved line/column position.
    #[must_use]
    pub fn with_line_col(mut self, line: u32, col: u32) -> Self {
        self.line_col = Some((line, col));
        self
    }

    /// Shorthand for an [`ErrorKind::Internal`] error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl std::error::Error for CompileError {}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}:", path.display())?;
            if let Some((line, col)) = self.line_col {
                write!(f, "{line}:{col}:")?;
            }
            write!(f, " ")?;
        } else if let Some((line, col)) = self.line_col {
            write!(f, "{line}:{col}: ")?;
        }
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// An aggregate of compile errors from one phase or one file.
#[derive(Debug, Default)]
pub struct CompileErrors {
    /// The collected errors, in detection order.
    pub errors: Vec<CompileError>,
}

impl CompileErrors {
    /// Create an empty aggregate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error.
    pub fn push(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    /// Check whether any errors were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Convert into a `Result`: `Ok(())` when empty.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one error was collected.
    pub fn into_result(self) -> Result<(), CompileErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::error::Error for CompileErrors {}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl From<CompileError> for CompileErrors {
    fn from(error: CompileError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl IntoIterator for CompileErrors {
    type Item = CompileError;
    type IntoIter = std::vec::IntoIter<CompileError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_position() {
        let err = CompileError::at(
            ErrorKind::Structural(StructuralErrorKind::InvalidHolder),
            Span::new(4, 7),
            "key may only appear inside list",
        )
        .with_path("acme.yang")
        .with_line_col(3, 12);

        assert_eq!(
            err.to_string(),
            "acme.yang:3:12: invalid holder: key may only appear inside list"
        );
    }

    #[test]
    fn test_display_without_position() {
        let err = CompileError::new(
            ErrorKind::Reference(ReferenceErrorKind::MissingImport),
            "no module named m",
        );
        assert_eq!(err.to_string(), "missing import: no module named m");
    }

    #[test]
    fn test_aggregate_into_result() {
        let mut errors = CompileErrors::new();
        assert!(errors.into_result().is_ok());

        errors = CompileErrors::new();
        errors.push(CompileError::new(ErrorKind::Constraint, "collision"));
        let err = errors.into_result().unwrap_err();
        assert_eq!(err.len(), 1);
    }
}
