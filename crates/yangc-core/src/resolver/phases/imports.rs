//! Phase 2: import resolution.
//!
//! Binds every import prefix to a concrete module, parsing imported
//! modules on demand from the search directories. Revision selection
//! follows the compile options: an import without a revision takes the
//! newest available revision of the named module.
//!
//! Once a module's imports are bound, its namespace is assigned to every
//! node of its subtree (submodule-merged definitions included): a node's
//! namespace is its nearest module ancestor's. Expanded groupings are
//! re-namespaced later by the `uses` phase.

use crate::error::{ErrorKind, ReferenceErrorKind};
use crate::resolver::context::ResolverContext;
use crate::resolver::phases::includes;
use crate::schema::{NodeId, NodeKind, ResolvableStatus};
use crate::source::parse_file;
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, trace};

/// Run import resolution over the unit, growing it with on-demand loads.
pub fn run(ctx: &mut ResolverContext) {
    let mut worklist: VecDeque<NodeId> = ctx.module_roots.iter().copied().collect();
    let mut processed = BTreeSet::new();

    while let Some(module) = worklist.pop_front() {
        if !processed.insert(module) {
            continue;
        }
        resolve_module_imports(ctx, module, &mut worklist);
    }

    // Namespace assignment (invariant: nearest module ancestor)
    for module in ctx.module_roots.clone() {
        let Some(uri) = ctx.tree[module]
            .module_info()
            .and_then(|info| info.namespace_uri.clone())
        else {
            continue;
        };
        let ns = ctx.tree.intern(&uri);
        ctx.set_namespace_recursive(module, ns);
    }
}

fn resolve_module_imports(
    ctx: &mut ResolverContext,
    module: NodeId,
    worklist: &mut VecDeque<NodeId>,
) {
    let imports = ctx.tree[module]
        .module_info()
        .map(|info| info.imports.clone())
        .unwrap_or_default();

    for (index, import) in imports.iter().enumerate() {
        if import.status == ResolvableStatus::Linked {
            continue;
        }
        let target = find_or_load_module(
            ctx,
            module,
            &import.module,
            import.revision.as_deref(),
            import.span,
        );
        let Some(target) = target else {
            continue;
        };
        if target == module {
            ctx.error_at_span(
                ErrorKind::Reference(ReferenceErrorKind::CyclicReference),
                module,
                import.span,
                format!("module '{}' imports itself", import.module),
            );
            continue;
        }

        trace!(
            module = ctx.tree.name(module),
            prefix = %import.prefix,
            target = ctx.tree.name(target),
            "bound import prefix"
        );
        ctx.prefix_bindings
            .insert((module, import.prefix.clone()), target);
        worklist.push_back(target);

        if let Some(info) = ctx.tree[module].module_info_mut() {
            if let Some(entry) = info.imports.get_mut(index) {
                entry.resolved = Some(target);
                entry.status = ResolvableStatus::Linked;
            }
        }
    }
}

/// Find a module among the loaded candidates, or load it from disk.
fn find_or_load_module(
    ctx: &mut ResolverContext,
    importer: NodeId,
    name: &str,
    revision: Option<&str>,
    span: crate::lexer::Span,
) -> Option<NodeId> {
    if let Some(found) = select_candidate(ctx, name, revision) {
        return Some(found);
    }

    let located = match ctx.locator.locate(name, revision) {
        Ok(found) => found,
        Err(err) => {
            ctx.errors.push(err);
            return None;
        }
    };
    if let Some(path) = located {
        match parse_file(&path) {
            Ok(parsed) => {
                let root = ctx.add_parsed(parsed);
                if ctx.tree[root].kind != NodeKind::Module {
                    ctx.error_at_span(
                        ErrorKind::Reference(ReferenceErrorKind::MissingImport),
                        importer,
                        span,
                        format!("'{name}' is a submodule and cannot be imported"),
                    );
                    return None;
                }
                debug!(module = name, path = %path.display(), "loaded imported module");
                // The loaded module may have includes of its own
                let mut visiting = BTreeSet::new();
                includes::process_module(ctx, root, &mut visiting);
                return Some(root);
            }
            Err(errors) => {
                ctx.errors.extend(errors);
                return None;
            }
        }
    }

    ctx.error_at_span(
        ErrorKind::Reference(ReferenceErrorKind::MissingImport),
        importer,
        span,
        match revision {
            Some(rev) => format!("imported module '{name}' revision {rev} not found"),
            None => format!("imported module '{name}' not found"),
        },
    );
    None
}

/// Select among already-loaded candidates: exact revision when requested,
/// newest revision otherwise.
fn select_candidate(ctx: &ResolverContext, name: &str, revision: Option<&str>) -> Option<NodeId> {
    let name_id = ctx.tree.strings().find(name)?;
    let candidates = ctx.module_by_name.get(&name_id)?;

    if let Some(rev) = revision {
        return candidates
            .iter()
            .find(|&&c| {
                ctx.tree[c]
                    .module_info()
                    .is_some_and(|info| info.revisions.iter().any(|r| r.date == rev))
            })
            .copied();
    }

    candidates
        .iter()
        .max_by_key(|&&c| {
            ctx.tree[c]
                .module_info()
                .and_then(|info| info.latest_revision().map(str::to_string))
        })
        .copied()
}
