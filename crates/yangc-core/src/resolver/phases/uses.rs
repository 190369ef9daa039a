//! Phase 5: `uses` expansion.
//!
//! Every `uses` placeholder is replaced by a deep copy of its target
//! grouping's children, spliced at the placeholder's sibling position,
//! re-namespaced to the **using** module, refined, and augmented by the
//! placeholder's inline augments. The grouping template itself is never
//! mutated.
//!
//! Expansion runs as a worklist fixed point: a `uses` whose grouping still
//! contains unexpanded `uses` placeholders is re-queued until the inner
//! ones are gone; a round that makes no progress reports the residue as a
//! grouping cycle.

use crate::error::{ErrorKind, ReferenceErrorKind};
use crate::resolver::context::ResolverContext;
use crate::resolver::phases::augment;
use crate::schema::{
    NodeBody, NodeId, NodeKind, Refine, ResolvableStatus, SchemaPath, StrId,
};
use tracing::{debug, trace};

/// Run `uses` expansion to its fixed point.
pub fn run(ctx: &mut ResolverContext) {
    let mut pending = collect_uses(ctx);
    debug!(count = pending.len(), "collected uses placeholders");

    for &u in &pending {
        locate_target(ctx, u);
    }
    if !ctx.errors.is_empty() {
        return;
    }

    loop {
        let mut progress = false;
        let mut remaining = Vec::new();

        for u in pending {
            let Some(target) = ctx.tree[u].uses_info().and_then(|info| info.resolved) else {
                continue;
            };
            if grouping_has_pending_uses(ctx, target) {
                remaining.push(u);
                continue;
            }
            expand(ctx, u, target);
            progress = true;
        }

        if remaining.is_empty() {
            break;
        }
        if !progress {
            for &u in &remaining {
                let target = ctx.tree[u]
                    .uses_info()
                    .map(|info| info.target.to_string())
                    .unwrap_or_default();
                ctx.error_at_node(
                    ErrorKind::Reference(ReferenceErrorKind::CyclicReference),
                    u,
                    format!("grouping '{target}' is used from within its own expansion"),
                );
            }
            return;
        }
        pending = remaining;
    }
}

/// Collect all attached `uses` nodes in dependency-then-source order.
fn collect_uses(ctx: &ResolverContext) -> Vec<NodeId> {
    let mut result = Vec::new();
    for module in ctx.order.clone() {
        ctx.tree.walk(module, &mut |id| {
            if ctx.tree[id].kind == NodeKind::Uses {
                result.push(id);
            }
            true
        });
    }
    result
}

/// Locate a `uses`'s target grouping and record its resolvable status.
fn locate_target(ctx: &mut ResolverContext, u: NodeId) {
    let Some(module) = ctx.tree.enclosing_module(u) else {
        return;
    };
    let (prefix, name, span) = match ctx.tree[u].uses_info() {
        Some(info) => (
            info.target.prefix.clone(),
            info.target.name.clone(),
            info.target.span,
        ),
        None => return,
    };

    let before = ctx.errors.len();
    let found = ctx.find_definition(
        module,
        u,
        NodeKind::Grouping,
        prefix.as_deref(),
        &name,
        span,
    );
    match found {
        Some(grouping) => {
            let status = if ctx.tree.enclosing_module(grouping) == Some(module) {
                ResolvableStatus::IntraFileResolved
            } else {
                ResolvableStatus::Linked
            };
            if let NodeBody::Uses(info) = &mut ctx.tree[u].body {
                info.resolved = Some(grouping);
                info.target.resolved = Some(grouping);
                info.status = status;
            }
        }
        None => {
            if ctx.errors.len() == before {
                let shown = match &prefix {
                    Some(p) => format!("{p}:{name}"),
                    None => name.clone(),
                };
                ctx.error_at_span(
                    ErrorKind::Reference(ReferenceErrorKind::UnresolvedReference),
                    u,
                    span,
                    format!("uses references unknown grouping '{shown}'"),
                );
            }
        }
    }
}

/// Whether a grouping's subtree still contains `uses` placeholders.
fn grouping_has_pending_uses(ctx: &ResolverContext, grouping: NodeId) -> bool {
    let mut found = false;
    ctx.tree.walk(grouping, &mut |id| {
        if id != grouping && ctx.tree[id].kind == NodeKind::Uses {
            found = true;
        }
        !found
    });
    found
}

/// Expand one `uses` node in place.
fn expand(ctx: &mut ResolverContext, u: NodeId, grouping: NodeId) {
    let Some(parent) = ctx.tree[u].parent else {
        return;
    };
    let Some(module) = ctx.tree.enclosing_module(u) else {
        return;
    };
    let namespace = ctx.tree[module].namespace;

    trace!(
        uses = ctx.tree.name(u),
        grouping = ctx.tree.name(grouping),
        into = ctx.tree.name(parent),
        "expanding uses"
    );

    // Splice a deep copy of each grouping child at the placeholder's
    // position, re-namespaced to the using module
    let mut spliced = Vec::new();
    for child in ctx.tree.child_ids(grouping) {
        if ctx.tree[child].kind == NodeKind::Uses {
            // The fixed point guaranteed none remain
            continue;
        }
        if let Some(existing) = check_splice_collision(ctx, u, parent, child, namespace) {
            if existing {
                continue; // earlier direct child wins
            }
            return;
        }
        let copy = ctx.tree.clone_subtree(child);
        if let Some(ns) = namespace {
            ctx.set_namespace_recursive(copy, ns);
        }
        ctx.tree.insert_before(u, copy);
        spliced.push(copy);
    }

    // Apply refine directives to the copies
    let refines = match ctx.tree[u].uses_info() {
        Some(info) => info.refines.clone(),
        None => Vec::new(),
    };
    let grouping_name = ctx.tree.name(grouping).to_string();
    for refine in &refines {
        apply_refine(ctx, u, &spliced, refine, &grouping_name);
    }

    // Apply the placeholder's inline augments within the expansion
    for child in ctx.tree.child_ids(u) {
        if ctx.tree[child].kind == NodeKind::Augment {
            apply_inline_augment(ctx, child, &spliced, &grouping_name);
        }
    }

    // Remove the placeholder; its subtree (inline augment records) goes
    // with it, reachable through the targets' augmented-by back-links
    ctx.tree.detach(u);
    if let NodeBody::Uses(info) = &mut ctx.tree[u].body {
        info.status = ResolvableStatus::Resolved;
    }
}

/// Collision handling for one grouping child about to be spliced.
///
/// Returns `None` when there is no collision, `Some(true)` when an earlier
/// direct child wins (the grouping child is dropped), and `Some(false)`
/// after reporting a collision error.
fn check_splice_collision(
    ctx: &mut ResolverContext,
    u: NodeId,
    parent: NodeId,
    grouping_child: NodeId,
    namespace: Option<StrId>,
) -> Option<bool> {
    if !ctx.tree[grouping_child].kind.is_data_node() {
        return None;
    }
    let name = ctx.tree[grouping_child].name;
    let existing = ctx
        .tree
        .detect_colliding_child(parent, name, namespace)?;

    if ctx.tree[existing].span.start < ctx.tree[u].span.start {
        trace!(
            name = ctx.tree.get_str(name),
            "earlier direct child wins over grouping child"
        );
        return Some(true);
    }
    let name = ctx.tree.get_str(name).to_string();
    ctx.error_at_node(
        ErrorKind::Constraint,
        u,
        format!(
            "expanding uses introduces duplicate schema identifier '{name}' in '{}'",
            ctx.tree.name(parent)
        ),
    );
    Some(false)
}

/// Resolve a relative schema path against the spliced copies.
fn find_in_expansion(
    ctx: &ResolverContext,
    spliced: &[NodeId],
    path: &SchemaPath,
) -> Option<NodeId> {
    let mut steps = path.steps.iter();
    let first = steps.next()?;
    let mut current = spliced
        .iter()
        .copied()
        .find(|&n| ctx.tree.name(n) == first.name)?;
    for step in steps {
        current = ctx.tree.find_child(current, &step.name, None)?;
    }
    Some(current)
}

/// Apply one `refine` directive to the addressed copy.
fn apply_refine(
    ctx: &mut ResolverContext,
    u: NodeId,
    spliced: &[NodeId],
    refine: &Refine,
    grouping_name: &str,
) {
    let Some(target) = find_in_expansion(ctx, spliced, &refine.path) else {
        ctx.error_at_span(
            ErrorKind::Reference(ReferenceErrorKind::UnresolvedReference),
            u,
            refine.span,
            format!(
                "refine target '{}' not found in grouping '{grouping_name}'",
                refine.path
            ),
        );
        return;
    };

    let node = &mut ctx.tree[target];
    if let Some(description) = &refine.description {
        node.meta.description = Some(description.clone());
    }
    if let Some(reference) = &refine.reference {
        node.meta.reference = Some(reference.clone());
    }
    node.meta.musts.extend(refine.musts.iter().cloned());

    match &mut node.body {
        NodeBody::Container(info) => {
            if let Some(config) = refine.config {
                info.config = Some(config);
            }
            if let Some(presence) = &refine.presence {
                info.presence = Some(presence.clone());
            }
        }
        NodeBody::List(info) => {
            if let Some(config) = refine.config {
                info.config = Some(config);
            }
            if let Some(min) = refine.min_elements {
                info.min_elements = Some(min);
            }
            if let Some(max) = refine.max_elements {
                info.max_elements = Some(max);
            }
        }
        NodeBody::Leaf(info) => {
            if let Some(config) = refine.config {
                info.config = Some(config);
            }
            if let Some(mandatory) = refine.mandatory {
                info.mandatory = Some(mandatory);
            }
            if !refine.defaults.is_empty() {
                info.defaults = refine.defaults.clone();
            }
            if let Some(min) = refine.min_elements {
                info.min_elements = Some(min);
            }
            if let Some(max) = refine.max_elements {
                info.max_elements = Some(max);
            }
        }
        NodeBody::Choice(info) => {
            if let Some(config) = refine.config {
                info.config = Some(config);
            }
            if let Some(mandatory) = refine.mandatory {
                info.mandatory = Some(mandatory);
            }
            if let Some(default) = refine.defaults.first() {
                info.default_case = Some(default.clone());
            }
        }
        NodeBody::Any(info) => {
            if let Some(config) = refine.config {
                info.config = Some(config);
            }
            if let Some(mandatory) = refine.mandatory {
                info.mandatory = Some(mandatory);
            }
        }
        _ => {}
    }
}

/// Apply an augment written inside the `uses` to the expanded copies.
fn apply_inline_augment(
    ctx: &mut ResolverContext,
    aug: NodeId,
    spliced: &[NodeId],
    grouping_name: &str,
) {
    let (path, span) = match &ctx.tree[aug].body {
        NodeBody::Augment(info) => (info.target.clone(), info.target.span),
        _ => return,
    };
    if path.absolute {
        ctx.error_at_span(
            ErrorKind::Constraint,
            aug,
            span,
            format!("augment target '{path}' inside uses must be a descendant path"),
        );
        return;
    }
    let Some(target) = find_in_expansion(ctx, spliced, &path) else {
        ctx.error_at_span(
            ErrorKind::Reference(ReferenceErrorKind::UnresolvedReference),
            aug,
            span,
            format!("augment target '{path}' not found in grouping '{grouping_name}'"),
        );
        return;
    };
    augment::apply_augment_node(ctx, aug, target);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::phases::{definitions, imports, order};
    use crate::source::{parse_source, CompileOptions};

    fn expanded_ctx(sources: &[&str]) -> ResolverContext {
        let mut ctx = ResolverContext::new(&CompileOptions::default());
        for source in sources {
            let parsed = parse_source(source, None).expect("parse failed");
            ctx.add_parsed(parsed);
        }
        imports::run(&mut ctx);
        order::run(&mut ctx);
        definitions::run(&mut ctx);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        run(&mut ctx);
        ctx
    }

    #[test]
    fn test_simple_expansion() {
        let ctx = expanded_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; grouping g { leaf x { type string; } } container c { uses g; } }",
        ]);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        let m = ctx.module_roots[0];
        let c = ctx.tree.find_child(m, "c", Some(NodeKind::Container)).unwrap();
        let x = ctx.tree.find_child(c, "x", Some(NodeKind::Leaf));
        assert!(x.is_some(), "grouping content should be spliced");
        // The placeholder is gone
        assert!(ctx
            .tree
            .children(c)
            .all(|n| ctx.tree[n].kind != NodeKind::Uses));
    }

    #[test]
    fn test_expansion_namespace_is_using_module() {
        let ctx = expanded_ctx(&[
            "module a { namespace \"urn:a\"; prefix a; import b { prefix b; } container c { uses b:g; } }",
            "module b { namespace \"urn:b\"; prefix b; grouping g { leaf x { type string; } } }",
        ]);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        let a = ctx.module_roots[0];
        let c = ctx.tree.find_child(a, "c", Some(NodeKind::Container)).unwrap();
        let x = ctx.tree.find_child(c, "x", Some(NodeKind::Leaf)).unwrap();
        let ns_a = ctx.tree.strings().find("urn:a").unwrap();
        assert_eq!(ctx.tree[x].namespace, Some(ns_a));
    }

    #[test]
    fn test_refine_default_leaves_template_unchanged() {
        let ctx = expanded_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; grouping g { leaf x { type string; default a; } } container c { uses g { refine x { default b; } } } }",
        ]);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        let m = ctx.module_roots[0];

        let c = ctx.tree.find_child(m, "c", Some(NodeKind::Container)).unwrap();
        let refined = ctx.tree.find_child(c, "x", Some(NodeKind::Leaf)).unwrap();
        assert_eq!(ctx.tree[refined].leaf_info().unwrap().defaults, vec!["b"]);

        let g = ctx.tree.find_child(m, "g", Some(NodeKind::Grouping)).unwrap();
        let template = ctx.tree.find_child(g, "x", Some(NodeKind::Leaf)).unwrap();
        assert_eq!(ctx.tree[template].leaf_info().unwrap().defaults, vec!["a"]);
    }

    #[test]
    fn test_nested_groupings_fixed_point() {
        let ctx = expanded_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; grouping inner { leaf x { type string; } } grouping outer { uses inner; leaf y { type string; } } container c { uses outer; } }",
        ]);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        let m = ctx.module_roots[0];
        let c = ctx.tree.find_child(m, "c", Some(NodeKind::Container)).unwrap();
        assert!(ctx.tree.find_child(c, "x", Some(NodeKind::Leaf)).is_some());
        assert!(ctx.tree.find_child(c, "y", Some(NodeKind::Leaf)).is_some());
    }

    #[test]
    fn test_grouping_cycle_rejected() {
        let ctx = expanded_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; grouping a { uses b; } grouping b { uses a; } container c { uses a; } }",
        ]);
        assert!(ctx.errors.iter().any(|e| {
            matches!(
                e.kind,
                ErrorKind::Reference(ReferenceErrorKind::CyclicReference)
            )
        }));
    }

    #[test]
    fn test_unknown_grouping_rejected() {
        let ctx = expanded_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; container c { uses nope; } }",
        ]);
        assert!(ctx
            .errors
            .iter()
            .any(|e| e.message.contains("unknown grouping 'nope'")));
    }

    #[test]
    fn test_refine_unknown_target_rejected() {
        let ctx = expanded_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; grouping g { leaf x { type string; } } container c { uses g { refine nope { config false; } } } }",
        ]);
        assert!(ctx
            .errors
            .iter()
            .any(|e| e.message.contains("refine target 'nope' not found")));
    }

    #[test]
    fn test_inline_augment_expands_into_copy() {
        let ctx = expanded_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; grouping g { container inner { leaf x { type string; } } } container c { uses g { augment inner { leaf extra { type string; } } } } }",
        ]);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        let m = ctx.module_roots[0];
        let c = ctx.tree.find_child(m, "c", Some(NodeKind::Container)).unwrap();
        let inner = ctx.tree.find_child(c, "inner", Some(NodeKind::Container)).unwrap();
        assert!(ctx.tree.find_child(inner, "extra", Some(NodeKind::Leaf)).is_some());
        assert!(!ctx.tree[inner].augmented_by.is_empty());

        // The grouping template gained nothing
        let g = ctx.tree.find_child(m, "g", Some(NodeKind::Grouping)).unwrap();
        let template_inner = ctx
            .tree
            .find_child(g, "inner", Some(NodeKind::Container))
            .unwrap();
        assert!(ctx
            .tree
            .find_child(template_inner, "extra", Some(NodeKind::Leaf))
            .is_none());
    }

    #[test]
    fn test_sibling_position_preserved() {
        let ctx = expanded_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; grouping g { leaf b { type string; } } container c { leaf a { type string; } uses g; leaf z { type string; } } }",
        ]);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        let m = ctx.module_roots[0];
        let c = ctx.tree.find_child(m, "c", Some(NodeKind::Container)).unwrap();
        let names: Vec<&str> = ctx.tree.children(c).map(|n| ctx.tree.name(n)).collect();
        assert_eq!(names, vec!["a", "b", "z"]);
    }

    #[test]
    fn test_multiple_uses_of_one_grouping() {
        let ctx = expanded_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; grouping g { leaf x { type string; } } container c1 { uses g; } container c2 { uses g; } }",
        ]);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        let m = ctx.module_roots[0];
        for container in ["c1", "c2"] {
            let c = ctx
                .tree
                .find_child(m, container, Some(NodeKind::Container))
                .unwrap();
            assert!(ctx.tree.find_child(c, "x", Some(NodeKind::Leaf)).is_some());
        }
    }
}
