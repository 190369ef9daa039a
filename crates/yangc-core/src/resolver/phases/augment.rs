//! Phase 6: `augment` application.
//!
//! Top-level augments are applied in definition order across the
//! dependency-sorted module list. Each target path is resolved against the
//! final trees (prefixes resolve through the augmenting module's imports,
//! unprefixed steps denote the augmenting module itself), augmentability
//! rules are enforced, and the augment's children are spliced under the
//! target keeping the **augmenting** module's namespace. Augment never
//! overwrites: schema-id conflicts are errors.

use crate::error::{ErrorKind, ReferenceErrorKind};
use crate::resolver::context::ResolverContext;
use crate::schema::{NodeBody, NodeId, NodeKind, ResolvableStatus, SchemaNode};
use tracing::{debug, trace};

/// Apply all top-level augments.
pub fn run(ctx: &mut ResolverContext) {
    for module in ctx.order.clone() {
        for child in ctx.tree.child_ids(module) {
            if ctx.tree[child].kind != NodeKind::Augment {
                continue;
            }
            let already = match &ctx.tree[child].body {
                NodeBody::Augment(info) => info.resolved.is_some(),
                _ => true,
            };
            if already {
                continue;
            }
            apply_top_level(ctx, module, child);
        }
    }
}

fn apply_top_level(ctx: &mut ResolverContext, module: NodeId, aug: NodeId) {
    let (path, span) = match &ctx.tree[aug].body {
        NodeBody::Augment(info) => (info.target.clone(), info.target.span),
        _ => return,
    };
    if !path.absolute {
        ctx.error_at_span(
            ErrorKind::Constraint,
            aug,
            span,
            format!("top-level augment target '{path}' must be an absolute path"),
        );
        return;
    }

    // Walk the path: each step's prefix selects a module through the
    // augmenting module's bindings; unprefixed steps stay in the
    // augmenting module
    let mut current: Option<NodeId> = None;
    for step in &path.steps {
        let Some(step_module) = ctx.resolve_prefix(module, step.prefix.as_deref()) else {
            let prefix = step.prefix.clone().unwrap_or_default();
            ctx.error_at_span(
                ErrorKind::Reference(ReferenceErrorKind::MissingImport),
                aug,
                span,
                format!("prefix '{prefix}' in augment target '{path}' has no matching import"),
            );
            return;
        };
        let namespace = ctx.tree[step_module].namespace;
        let scope = current.unwrap_or(step_module);
        let Some(name_id) = ctx.tree.strings().find(&step.name) else {
            report_unresolved_step(ctx, aug, span, &path, &step.name);
            return;
        };
        match ctx.tree.find_data_child(scope, name_id, namespace) {
            Some(next) => current = Some(next),
            None => {
                report_unresolved_step(ctx, aug, span, &path, &step.name);
                return;
            }
        }
    }
    let Some(target) = current else {
        report_unresolved_step(ctx, aug, span, &path, "");
        return;
    };

    debug!(
        module = ctx.tree.name(module),
        target = ctx.tree.name(target),
        "applying augment"
    );
    apply_augment_node(ctx, aug, target);
}

fn report_unresolved_step(
    ctx: &mut ResolverContext,
    aug: NodeId,
    span: crate::lexer::Span,
    path: &crate::schema::SchemaPath,
    step: &str,
) {
    ctx.error_at_span(
        ErrorKind::Reference(ReferenceErrorKind::UnresolvedReference),
        aug,
        span,
        format!("augment target '{path}' does not resolve (no node '{step}')"),
    );
}

/// Splice one augment's children under an already-resolved target.
///
/// Shared between top-level augments and the inline augments of a `uses`.
/// The children keep the namespace of the module that wrote the augment;
/// augmenting a choice wraps bare data nodes in implicit cases.
pub fn apply_augment_node(ctx: &mut ResolverContext, aug: NodeId, target: NodeId) {
    if ctx.tree[target].kind.is_terminal() {
        let target_name = ctx.tree.name(target).to_string();
        ctx.error_at_node(
            ErrorKind::Constraint,
            aug,
            format!(
                "cannot augment into {} '{target_name}'",
                ctx.tree[target].kind.keyword()
            ),
        );
        return;
    }

    for child in ctx.tree.child_ids(aug) {
        splice_augment_child(ctx, target, child);
    }

    ctx.tree[target].augmented_by.push(aug);
    let cross_module =
        ctx.tree.enclosing_module(aug) != ctx.tree.enclosing_module(target);
    if let NodeBody::Augment(info) = &mut ctx.tree[aug].body {
        info.resolved = Some(target);
        info.status = if cross_module {
            ResolvableStatus::Linked
        } else {
            ResolvableStatus::Resolved
        };
    }
}

fn splice_augment_child(ctx: &mut ResolverContext, target: NodeId, child: NodeId) {
    let child_kind = ctx.tree[child].kind;
    if !child_kind.is_data_node() {
        // typedefs/groupings under an augment serve its own subtree only
        return;
    }

    // Collision check before any mutation; augment never overwrites
    if let Some(existing) = ctx
        .tree
        .detect_colliding_child(target, ctx.tree[child].name, ctx.tree[child].namespace)
    {
        let child_name = ctx.tree.name(child).to_string();
        let scope_name = ctx.tree.name(ctx.tree.collision_scope(target)).to_string();
        let existing_name = ctx.tree.name(existing).to_string();
        let span = ctx.tree[child].span;
        ctx.error_at_span(
            ErrorKind::Constraint,
            child,
            span,
            format!(
                "augmented node '{child_name}' collides with existing '{existing_name}' in '{scope_name}'"
            ),
        );
        return;
    }

    if ctx.tree[target].kind == NodeKind::Choice && child_kind != NodeKind::Case {
        // RFC 6020 §7.15.3: bare data nodes augmented into a choice get an
        // implicit case named after them
        trace!(name = ctx.tree.name(child), "wrapping augmented child in implicit case");
        let name = ctx.tree[child].name;
        let namespace = ctx.tree[child].namespace;
        let span = ctx.tree[child].span;
        let mut case = SchemaNode::new(NodeKind::Case, name, NodeBody::Empty, span);
        case.namespace = namespace;
        let case = ctx.tree.add_node(case);
        ctx.tree.append_child(target, case);
        ctx.tree.detach(child);
        ctx.tree.append_child(case, child);
        ctx.origin.remove(&child);
        return;
    }

    ctx.tree.detach(child);
    ctx.tree.append_child(target, child);
    ctx.origin.remove(&child);
}
