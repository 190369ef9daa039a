//! Linker/resolver.
//!
//! Given a set of parsed modules, produces a fully resolved schema tree in
//! which every resolvable placeholder reached `Resolved` (or `Linked`, for
//! cross-module references), or the whole compile fails.
//!
//! # Pipeline
//!
//! ```text
//! parsed modules → [includes → imports → order → definitions
//!                   → uses → augments → finalize → paths] → ResolvedTree
//! ```
//!
//! Each phase either advances or reports definite errors; the first phase
//! that errors aborts the compile, and no partial tree is ever handed to
//! downstream stages. Within one unit the resolver mutates the shared
//! arena with no synchronization: compilation units are single-threaded by
//! design.

pub(crate) mod context;
mod phases;

use crate::error::{CompileError, CompileErrors, ErrorKind};
use crate::schema::{NodeId, NodeKind, SchemaTree, StrId};
use crate::source::{CompileOptions, ParsedModule};
use context::ResolverContext;
use tracing::debug;

/// The fully resolved schema tree of one compilation unit.
///
/// Immutable once produced: the resolver hands it over by value and no
/// mutating access is exposed.
#[derive(Debug)]
pub struct ResolvedTree {
    tree: SchemaTree,
    modules: Vec<NodeId>,
}

impl ResolvedTree {
    /// The underlying schema tree (read-only).
    #[must_use]
    pub fn tree(&self) -> &SchemaTree {
        &self.tree
    }

    /// Module roots, in reverse topological (dependency-first) order.
    #[must_use]
    pub fn modules(&self) -> &[NodeId] {
        &self.modules
    }

    /// Find a module root by name.
    #[must_use]
    pub fn find_module(&self, name: &str) -> Option<NodeId> {
        self.modules
            .iter()
            .copied()
            .find(|&m| self.tree.name(m) == name)
    }

    /// The interned namespace of a module.
    #[must_use]
    pub fn module_namespace(&self, module: NodeId) -> Option<StrId> {
        self.tree[module].namespace
    }
}

/// Resolve a set of parsed modules into a [`ResolvedTree`].
///
/// Imported modules and included submodules not present in `modules` are
/// loaded on demand from the search directories in `options`.
///
/// # Errors
///
/// Returns the aggregated errors of the first failing phase.
pub fn resolve_set(
    modules: Vec<ParsedModule>,
    options: &CompileOptions,
) -> Result<ResolvedTree, CompileErrors> {
    let mut ctx = ResolverContext::new(options);
    for parsed in modules {
        ctx.add_parsed(parsed);
    }
    if ctx.module_roots.is_empty() && ctx.submodule_roots.is_empty() {
        return Err(CompileErrors::from(CompileError::new(
            ErrorKind::Internal,
            "no modules to resolve",
        )));
    }

    run_phases(&mut ctx)?;
    verify_resolved(&mut ctx)?;

    Ok(ResolvedTree {
        tree: ctx.tree,
        modules: ctx.order,
    })
}

/// Run the ordered phases, aborting on the first failing one.
fn run_phases(ctx: &mut ResolverContext) -> Result<(), CompileErrors> {
    let phases: [(&str, fn(&mut ResolverContext)); 8] = [
        ("includes", phases::includes::run),
        ("imports", phases::imports::run),
        ("order", phases::order::run),
        ("definitions", phases::definitions::run),
        ("uses", phases::uses::run),
        ("augments", phases::augment::run),
        ("finalize", phases::finalize::run),
        ("paths", phases::paths::run),
    ];

    for (name, phase) in phases {
        debug!(phase = name, "resolver phase start");
        phase(ctx);
        let errors = ctx.take_errors();
        debug!(phase = name, errors = errors.len(), "resolver phase end");
        if !errors.is_empty() {
            return Err(CompileErrors { errors });
        }
    }
    Ok(())
}

/// Post-condition sweep: no reachable placeholder may remain unresolved.
/// A violation here is a resolver bug, not a user error.
fn verify_resolved(ctx: &mut ResolverContext) -> Result<(), CompileErrors> {
    let mut errors = CompileErrors::new();
    for module in ctx.order.clone() {
        ctx.tree.walk(module, &mut |id| {
            match ctx.tree[id].kind {
                NodeKind::Uses => {
                    errors.push(CompileError::new(
                        ErrorKind::Internal,
                        format!(
                            "uses placeholder '{}' survived resolution",
                            ctx.tree.name(id)
                        ),
                    ));
                }
                NodeKind::Augment => {
                    let unresolved = match &ctx.tree[id].body {
                        crate::schema::NodeBody::Augment(info) => info.resolved.is_none(),
                        _ => false,
                    };
                    if unresolved {
                        errors.push(CompileError::new(
                            ErrorKind::Internal,
                            format!(
                                "augment '{}' survived resolution unapplied",
                                ctx.tree.name(id)
                            ),
                        ));
                    }
                }
                _ => {}
            }
            if ctx.tree[id].namespace.is_none() {
                errors.push(CompileError::new(
                    ErrorKind::Internal,
                    format!("node '{}' has no namespace", ctx.tree.name(id)),
                ));
            }
            true
        });
    }
    errors.into_result()
}
