//! Phase 7: namespace and collision finalization.
//!
//! Assigns any still-missing namespaces, re-checks the deferred list-key
//! rules over the expanded tree, verifies config nesting, and builds every
//! container's child schema-id map, re-running collision detection across
//! the freshly spliced children.

use crate::error::ErrorKind;
use crate::listener::validate_list_on_exit;
use crate::resolver::context::ResolverContext;
use crate::schema::{NodeId, NodeKind};
use tracing::debug;

/// Run finalization over every module.
pub fn run(ctx: &mut ResolverContext) {
    for module in ctx.order.clone() {
        assign_missing_namespaces(ctx, module);
        check_config_nesting(ctx, module, true);
        revalidate_lists(ctx, module);
        build_child_maps(ctx, module);
    }
}

fn assign_missing_namespaces(ctx: &mut ResolverContext, module: NodeId) {
    let Some(ns) = ctx.tree[module].namespace else {
        return;
    };
    let mut missing = Vec::new();
    ctx.tree.walk(module, &mut |id| {
        if ctx.tree[id].namespace.is_none() {
            missing.push(id);
        }
        true
    });
    for id in missing {
        ctx.tree[id].namespace = Some(ns);
    }
}

/// A node with `config true` may not sit under a `config false` ancestor.
/// The check stops at operation boundaries (rpc, action, notification),
/// where the config flag has no meaning, and skips grouping templates.
fn check_config_nesting(ctx: &mut ResolverContext, node: NodeId, inherited: bool) {
    for child in ctx.tree.child_ids(node) {
        match ctx.tree[child].kind {
            NodeKind::Grouping
            | NodeKind::Rpc
            | NodeKind::Action
            | NodeKind::Notification
            | NodeKind::Input
            | NodeKind::Output
            | NodeKind::Augment => continue,
            k if k.is_data_node() => {
                let declared = ctx.tree[child].declared_config();
                if declared == Some(true) && !inherited {
                    let name = ctx.tree.name(child).to_string();
                    ctx.error_at_node(
                        ErrorKind::Constraint,
                        child,
                        format!(
                            "node '{name}' has config true under a config false ancestor"
                        ),
                    );
                }
                check_config_nesting(ctx, child, declared.unwrap_or(inherited));
            }
            _ => {}
        }
    }
}

/// Re-run the list key rules deferred at parse time: after expansion, a
/// list no longer has `uses` children, so the full check applies.
fn revalidate_lists(ctx: &mut ResolverContext, module: NodeId) {
    let mut lists = Vec::new();
    ctx.tree.walk(module, &mut |id| {
        if ctx.tree[id].kind == NodeKind::Grouping {
            return false; // templates stay unvalidated
        }
        if ctx.tree[id].kind == NodeKind::List {
            lists.push(id);
        }
        true
    });

    for list in lists {
        let mut errors = Vec::new();
        validate_list_on_exit(&ctx.tree, list, &mut errors);
        for err in errors {
            ctx.push_error_for(list, err);
        }
    }
}

/// Kinds whose children are registered in a child schema-id map.
fn is_map_scope(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Module
            | NodeKind::Container
            | NodeKind::List
            | NodeKind::Input
            | NodeKind::Output
            | NodeKind::Rpc
            | NodeKind::Action
            | NodeKind::Notification
    )
}

fn build_child_maps(ctx: &mut ResolverContext, module: NodeId) {
    let mut scopes = Vec::new();
    ctx.tree.walk(module, &mut |id| {
        if ctx.tree[id].kind == NodeKind::Grouping {
            return false;
        }
        if is_map_scope(ctx.tree[id].kind) {
            scopes.push(id);
        }
        true
    });

    let mut total = 0usize;
    for scope in scopes {
        let collisions = ctx.tree.build_child_map(scope);
        total += 1;
        for collision in collisions {
            let name = ctx.tree.get_str(collision.id.name).to_string();
            let scope_name = ctx.tree.name(collision.scope).to_string();
            let span = ctx.tree[collision.incoming].span;
            ctx.error_at_span(
                ErrorKind::Constraint,
                collision.incoming,
                span,
                format!(
                    "schema identifier '{name}' appears twice among the children of '{scope_name}'"
                ),
            );
        }
    }
    debug!(module = ctx.tree.name(module), scopes = total, "built child schema-id maps");
}
