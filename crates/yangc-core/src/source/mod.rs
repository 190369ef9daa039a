//! Source file handling: parse entry points, module search, options.
//!
//! Modules are located as `<name>.yang` or `<name>@<revision>.yang` under a
//! configured list of search directories, searched left-to-right; the first
//! directory containing a usable candidate wins. Within a directory, an
//! exact revision match is required when a revision was requested (under
//! the strict policy) and the newest revision wins otherwise.

use crate::error::{CompileError, CompileErrors, ErrorKind, ReferenceErrorKind};
use crate::lexer::{LineIndex, Severity};
use crate::listener::{self, is_valid_date};
use crate::parser::Parser;
use crate::schema::{NodeId, NodeKind, SchemaTree};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Revision selection policy for imports that pin a revision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RevisionPolicy {
    /// A pinned revision must exist on disk.
    #[default]
    Strict,
    /// Fall back to the newest available revision.
    Latest,
}

/// Compilation options. Passed explicitly; nothing global governs
/// compilation semantics.
#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
    /// Directories searched for imported modules and included submodules.
    pub search_dirs: Vec<PathBuf>,
    /// Revision selection policy.
    pub revision_policy: RevisionPolicy,
}

impl CompileOptions {
    /// Options with the given search directories and default policy.
    #[must_use]
    pub fn with_search_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_dirs: dirs.into_iter().map(Into::into).collect(),
            revision_policy: RevisionPolicy::default(),
        }
    }
}

/// One parsed (but unresolved) module or submodule.
#[derive(Debug)]
pub struct ParsedModule {
    /// The schema tree holding this file's lowered statements.
    pub tree: SchemaTree,
    /// The module/submodule root node.
    pub root: NodeId,
    /// The source path, when parsed from a file.
    pub path: Option<PathBuf>,
    /// The source text (kept for diagnostics rendering).
    pub source: String,
}

impl ParsedModule {
    /// The module's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.tree.name(self.root)
    }

    /// Whether this file holds a submodule.
    #[must_use]
    pub fn is_submodule(&self) -> bool {
        self.tree[self.root].kind == NodeKind::Submodule
    }
}

/// Parse a YANG file into an unresolved schema tree.
///
/// # Errors
///
/// Returns IO failures, syntax errors and structural errors, each carrying
/// the file path and (where available) line/column.
pub fn parse_file(path: &Path) -> Result<ParsedModule, CompileErrors> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        CompileErrors::from(
            CompileError::new(ErrorKind::Io, format!("cannot read file: {e}"))
                .with_path(path),
        )
    })?;
    parse_source(&source, Some(path))
}

/// Parse YANG source text into an unresolved schema tree.
///
/// # Errors
///
/// Returns syntax errors from the grammar and structural errors from the
/// tree-walk listener. Any error is fatal to the file: no partial tree is
/// returned.
pub fn parse_source(source: &str, path: Option<&Path>) -> Result<ParsedModule, CompileErrors> {
    let line_index = LineIndex::new(source);
    let attribute = |mut err: CompileError| {
        if let Some(span) = err.span {
            let (line, col) = line_index.line_col(span.start);
            err = err.with_line_col(line, col);
        }
        if let Some(path) = path {
            err = err.with_path(path);
        }
        err
    };

    let parse = Parser::new(source).parse();
    let mut errors = CompileErrors::new();
    for diagnostic in &parse.diagnostics {
        if diagnostic.severity == Severity::Error {
            errors.push(attribute(CompileError::at(
                ErrorKind::Syntax,
                diagnostic.span,
                diagnostic.message.clone(),
            )));
        }
    }

    let Some(root_stmt) = parse.root else {
        if errors.is_empty() {
            errors.push(attribute(CompileError::new(
                ErrorKind::Syntax,
                "no module or submodule statement found",
            )));
        }
        return Err(errors);
    };

    let lowered = listener::lower(&root_stmt);
    for err in lowered.errors {
        errors.push(attribute(err));
    }
    errors.into_result()?;

    let root = lowered.root.ok_or_else(|| {
        CompileErrors::from(attribute(CompileError::new(
            ErrorKind::Syntax,
            "no module or submodule statement found",
        )))
    })?;

    debug!(module = lowered.tree.name(root), "parsed module");
    Ok(ParsedModule {
        tree: lowered.tree,
        root,
        path: path.map(Path::to_path_buf),
        source: source.to_string(),
    })
}

/// A candidate module file found on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Candidate {
    path: PathBuf,
    revision: Option<String>,
}

/// Locates module files under the configured search directories.
#[derive(Clone, Debug, Default)]
pub struct ModuleLocator {
    search_dirs: Vec<PathBuf>,
    policy: RevisionPolicy,
}

impl ModuleLocator {
    /// Create a locator from compile options.
    #[must_use]
    pub fn new(options: &CompileOptions) -> Self {
        Self {
            search_dirs: options.search_dirs.clone(),
            policy: options.revision_policy,
        }
    }

    /// Locate a module by name and optional revision.
    ///
    /// Directories are searched left-to-right; the first directory holding
    /// a usable candidate decides. Returns `Ok(None)` when nothing was
    /// found.
    ///
    /// # Errors
    ///
    /// Under [`RevisionPolicy::Strict`], a pinned revision that exists
    /// under no search directory (while other revisions do) is reported as
    /// a missing import.
    pub fn locate(
        &self,
        name: &str,
        revision: Option<&str>,
    ) -> Result<Option<PathBuf>, CompileError> {
        let mut saw_other_revision = false;

        for dir in &self.search_dirs {
            let candidates = self.scan_dir(dir, name);
            if candidates.is_empty() {
                continue;
            }

            if let Some(rev) = revision {
                if let Some(exact) = candidates
                    .iter()
                    .find(|c| c.revision.as_deref() == Some(rev))
                {
                    return Ok(Some(exact.path.clone()));
                }
                saw_other_revision = true;
                if self.policy == RevisionPolicy::Latest {
                    return Ok(Self::select_newest(candidates));
                }
                // Strict: keep searching later directories for the exact file
                continue;
            }

            return Ok(Self::select_newest(candidates));
        }

        if revision.is_some() && saw_other_revision && self.policy == RevisionPolicy::Strict {
            return Err(CompileError::new(
                ErrorKind::Reference(ReferenceErrorKind::MissingImport),
                format!(
                    "module '{name}' revision {} not found (other revisions exist)",
                    revision.unwrap_or_default()
                ),
            ));
        }
        Ok(None)
    }

    /// Newest revisioned candidate, falling back to the unrevisioned file.
    fn select_newest(candidates: Vec<Candidate>) -> Option<PathBuf> {
        candidates
            .iter()
            .filter(|c| c.revision.is_some())
            .max_by(|a, b| a.revision.cmp(&b.revision))
            .or_else(|| candidates.iter().find(|c| c.revision.is_none()))
            .map(|c| c.path.clone())
    }

    /// Scan one directory for `<name>.yang` and `<name>@<rev>.yang`.
    fn scan_dir(&self, dir: &Path, name: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        let plain = dir.join(format!("{name}.yang"));
        if plain.is_file() {
            candidates.push(Candidate {
                path: plain,
                revision: None,
            });
        }

        let Ok(entries) = std::fs::read_dir(dir) else {
            return candidates;
        };
        let prefix = format!("{name}@");
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some(rest) = file_name.strip_prefix(&prefix) else {
                continue;
            };
            let Some(rev) = rest.strip_suffix(".yang") else {
                continue;
            };
            if is_valid_date(rev) && entry.path().is_file() {
                candidates.push(Candidate {
                    path: entry.path(),
                    revision: Some(rev.to_string()),
                });
            }
        }
        candidates
    }
}
