//! Phase 8: leafref path validation.
//!
//! Resolves every `leafref` path against the final tree. Paths are data
//! paths: `..` climbs to the data-tree parent (choice and case layers are
//! transparent), steps descend the same way. Predicates were stripped at
//! parse time; they address instances, not schema. Dangling paths fail the
//! compile.

use crate::error::{ErrorKind, ReferenceErrorKind};
use crate::resolver::context::ResolverContext;
use crate::schema::{NodeBody, NodeId, NodeKind, SchemaPath, TypeSpec};
use tracing::trace;

/// Validate all leafref paths outside grouping templates.
pub fn run(ctx: &mut ResolverContext) {
    for module in ctx.order.clone() {
        let mut leaves = Vec::new();
        ctx.tree.walk(module, &mut |id| {
            if ctx.tree[id].kind == NodeKind::Grouping {
                return false; // templates resolve at their use sites
            }
            if matches!(ctx.tree[id].kind, NodeKind::Leaf | NodeKind::LeafList) {
                leaves.push(id);
            }
            true
        });

        for leaf in leaves {
            let spec = match &mut ctx.tree[leaf].body {
                NodeBody::Leaf(info) => info.type_spec.take(),
                _ => None,
            };
            if let Some(mut spec) = spec {
                resolve_spec_paths(ctx, module, leaf, &mut spec);
                if let NodeBody::Leaf(info) = &mut ctx.tree[leaf].body {
                    info.type_spec = Some(spec);
                }
            }
        }
    }
}

fn resolve_spec_paths(ctx: &mut ResolverContext, module: NodeId, leaf: NodeId, spec: &mut TypeSpec) {
    if let Some(path) = spec.path.clone() {
        if spec.path_target.is_none() {
            spec.path_target = resolve_leafref(ctx, module, leaf, &path);
        }
    }
    for member in &mut spec.union_members {
        resolve_spec_paths(ctx, module, leaf, member);
    }
}

/// The data-tree parent of a node: the nearest ancestor that is not a
/// choice or case layer.
fn data_parent(ctx: &ResolverContext, node: NodeId) -> Option<NodeId> {
    ctx.tree
        .ancestors(node)
        .find(|&a| !matches!(ctx.tree[a].kind, NodeKind::Choice | NodeKind::Case))
}

fn resolve_leafref(
    ctx: &mut ResolverContext,
    module: NodeId,
    leaf: NodeId,
    path: &SchemaPath,
) -> Option<NodeId> {
    let dangling = |ctx: &mut ResolverContext, detail: String| {
        ctx.error_at_span(
            ErrorKind::Reference(ReferenceErrorKind::UnresolvedReference),
            leaf,
            path.span,
            format!("leafref path '{path}' does not resolve: {detail}"),
        );
        None
    };

    let mut current: Option<NodeId> = if path.absolute {
        None
    } else {
        if path.up == 0 {
            return dangling(
                ctx,
                "a relative path must start with '../'".to_string(),
            );
        }
        let mut scope = leaf;
        for _ in 0..path.up {
            match data_parent(ctx, scope) {
                Some(parent) => scope = parent,
                None => {
                    return dangling(ctx, "path climbs above the module".to_string());
                }
            }
        }
        Some(scope)
    };

    for step in &path.steps {
        let scope = match current {
            Some(node) => node,
            None => {
                // First step of an absolute path: resolve against the
                // prefixed module (or the leaf's own module)
                match step_module(ctx, module, step.prefix.as_deref()) {
                    Some(root) => root,
                    None => {
                        let prefix = step.prefix.clone().unwrap_or_default();
                        return dangling(ctx, format!("unknown prefix '{prefix}'"));
                    }
                }
            }
        };
        let Some(name_id) = ctx.tree.strings().find(&step.name) else {
            return dangling(ctx, format!("no node '{}'", step.name));
        };
        // Steps match by name; the namespace is pinned only for prefixed
        // steps (expanded grouping content may carry the prefix map of the
        // module that defined it)
        let namespace = match &step.prefix {
            Some(p) => {
                let target = step_module(ctx, module, Some(p));
                match target {
                    Some(root) => ctx.tree[root].namespace,
                    None => return dangling(ctx, format!("unknown prefix '{p}'")),
                }
            }
            None => None,
        };
        match ctx.tree.find_data_child(scope, name_id, namespace) {
            Some(next) => current = Some(next),
            None => return dangling(ctx, format!("no node '{}'", step.name)),
        }
    }

    let Some(target) = current else {
        return dangling(ctx, "empty path".to_string());
    };
    if !matches!(ctx.tree[target].kind, NodeKind::Leaf | NodeKind::LeafList) {
        let kind = ctx.tree[target].kind.keyword().to_string();
        return dangling(ctx, format!("target is a {kind}, not a leaf"));
    }

    trace!(
        leaf = ctx.tree.name(leaf),
        target = ctx.tree.name(target),
        "resolved leafref"
    );
    Some(target)
}

/// The module a path-step prefix denotes. Falls back to matching the
/// modules' own prefixes, for paths copied out of groupings defined in
/// other modules.
fn step_module(ctx: &ResolverContext, module: NodeId, prefix: Option<&str>) -> Option<NodeId> {
    if let Some(found) = ctx.resolve_prefix(module, prefix) {
        return Some(found);
    }
    let prefix = prefix?;
    ctx.module_roots
        .iter()
        .copied()
        .find(|&m| {
            ctx.tree[m]
                .module_info()
                .is_some_and(|info| info.prefix.as_deref() == Some(prefix))
        })
}
