//! Resolution context: the compilation-unit arena plus lookup indices and
//! working state shared by the resolver phases.

use crate::error::{CompileError, ErrorKind, ReferenceErrorKind};
use crate::lexer::{LineIndex, Span};
use crate::schema::{NodeId, NodeKind, SchemaTree, StrId};
use crate::source::{CompileOptions, ModuleLocator, ParsedModule};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Source attribution for one parsed file.
#[derive(Debug)]
pub struct SourceInfo {
    /// File path, when parsed from disk.
    pub path: Option<PathBuf>,
    /// Line index over the file's source text.
    pub line_index: LineIndex,
}

/// Working state of one compilation unit.
pub struct ResolverContext {
    /// The unit arena all per-file trees are merged into.
    pub tree: SchemaTree,
    /// Module roots (not submodules), in merge order.
    pub module_roots: Vec<NodeId>,
    /// Parsed submodule roots awaiting inclusion.
    pub submodule_roots: Vec<NodeId>,
    /// Reverse-topological module order, filled by the ordering phase.
    pub order: Vec<NodeId>,
    /// Module name -> candidate roots (several when multiple revisions are
    /// loaded).
    pub module_by_name: BTreeMap<StrId, Vec<NodeId>>,
    /// (module root, prefix) -> target module root.
    pub prefix_bindings: BTreeMap<(NodeId, String), NodeId>,
    /// Per-file source info, keyed by the file's root node.
    pub sources: BTreeMap<NodeId, SourceInfo>,
    /// Top-level definition -> originating file root, for definitions
    /// merged out of submodules.
    pub origin: BTreeMap<NodeId, NodeId>,
    /// Errors collected by the current phase.
    pub errors: Vec<CompileError>,
    /// On-demand module loading.
    pub locator: ModuleLocator,
}

impl ResolverContext {
    /// Create a context for the given options.
    #[must_use]
    pub fn new(options: &CompileOptions) -> Self {
        Self {
            tree: SchemaTree::new(),
            module_roots: Vec::new(),
            submodule_roots: Vec::new(),
            order: Vec::new(),
            module_by_name: BTreeMap::new(),
            prefix_bindings: BTreeMap::new(),
            sources: BTreeMap::new(),
            origin: BTreeMap::new(),
            errors: Vec::new(),
            locator: ModuleLocator::new(options),
        }
    }

    /// Merge one parsed file into the unit arena and register it.
    pub fn add_parsed(&mut self, parsed: ParsedModule) -> NodeId {
        let root = self.tree.copy_subtree_from(&parsed.tree, parsed.root);
        self.sources.insert(
            root,
            SourceInfo {
                path: parsed.path,
                line_index: LineIndex::new(&parsed.source),
            },
        );
        if self.tree[root].kind == NodeKind::Submodule {
            self.submodule_roots.push(root);
        } else {
            let name = self.tree[root].name;
            self.module_by_name.entry(name).or_default().push(root);
            self.module_roots.push(root);
        }
        root
    }

    /// Drain the errors collected by the last phase.
    pub fn take_errors(&mut self) -> Vec<CompileError> {
        std::mem::take(&mut self.errors)
    }

    /// Push an error attributed to a node's source position.
    pub fn error_at_node(&mut self, kind: ErrorKind, node: NodeId, message: String) {
        let err = self.attribute(CompileError::at(kind, self.tree[node].span, message), node);
        self.errors.push(err);
    }

    /// Push an error attributed to an explicit span within a node's file.
    pub fn error_at_span(&mut self, kind: ErrorKind, node: NodeId, span: Span, message: String) {
        let err = self.attribute(CompileError::at(kind, span, message), node);
        self.errors.push(err);
    }

    /// Push an already-built error, attributing it to a node's file.
    pub fn push_error_for(&mut self, node: NodeId, err: CompileError) {
        let err = self.attribute(err, node);
        self.errors.push(err);
    }

    /// Attach file path and line/column to an error, based on which file
    /// the node came from (submodule-merged definitions attribute to their
    /// submodule's file).
    fn attribute(&self, mut err: CompileError, node: NodeId) -> CompileError {
        let Some(info) = self.source_for(node) else {
            return err;
        };
        if let Some(span) = err.span {
            let (line, col) = info.line_index.line_col(span.start);
            err = err.with_line_col(line, col);
        }
        if let Some(path) = &info.path {
            err = err.with_path(path);
        }
        err
    }

    /// The source file a node came from.
    #[must_use]
    pub fn source_for(&self, node: NodeId) -> Option<&SourceInfo> {
        // The file root is either the node's enclosing module, or the
        // submodule recorded for its top-level definition ancestor.
        let module = self.tree.enclosing_module(node)?;
        let top_level = std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .find(|&n| self.tree[n].parent == Some(module));
        if let Some(top) = top_level {
            if let Some(&file_root) = self.origin.get(&top) {
                return self.sources.get(&file_root);
            }
        }
        self.sources.get(&module)
    }

    /// Resolve a prefix in the context of a module: `None` and the
    /// module's own prefix denote the module itself; anything else goes
    /// through the import bindings.
    #[must_use]
    pub fn resolve_prefix(&self, module: NodeId, prefix: Option<&str>) -> Option<NodeId> {
        let Some(prefix) = prefix else {
            return Some(module);
        };
        let own = self.tree[module]
            .module_info()
            .and_then(|info| info.prefix.as_deref());
        if own == Some(prefix) {
            return Some(module);
        }
        self.prefix_bindings
            .get(&(module, prefix.to_string()))
            .copied()
    }

    /// Look up a named definition (`typedef`, `grouping`, `identity`,
    /// `feature`) from a reference site.
    ///
    /// Prefixed references search the target module's top level; plain
    /// references walk the scopes from the reference site up to the
    /// module, then fail.
    pub fn find_definition(
        &mut self,
        module: NodeId,
        from: NodeId,
        kind: NodeKind,
        prefix: Option<&str>,
        name: &str,
        span: Span,
    ) -> Option<NodeId> {
        if let Some(p) = prefix {
            let Some(target_module) = self.resolve_prefix(module, Some(p)) else {
                self.error_at_span(
                    ErrorKind::Reference(ReferenceErrorKind::MissingImport),
                    from,
                    span,
                    format!("prefix '{p}' has no matching import"),
                );
                return None;
            };
            if target_module != module {
                return self.tree.find_child(target_module, name, Some(kind));
            }
            // Fall through: the module's own prefix resolves in scope
        }

        std::iter::once(from)
            .chain(self.tree.ancestors(from))
            .find_map(|scope| self.tree.find_child(scope, name, Some(kind)))
    }

    /// Set the namespace of a whole subtree.
    pub fn set_namespace_recursive(&mut self, root: NodeId, namespace: StrId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            self.tree[id].namespace = Some(namespace);
            stack.extend(self.tree.children(id));
        }
    }

    /// The interned namespace of a module root, once assigned.
    #[must_use]
    pub fn module_namespace(&self, module: NodeId) -> Option<StrId> {
        self.tree[module].namespace
    }
}
