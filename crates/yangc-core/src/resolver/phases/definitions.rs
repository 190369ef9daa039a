//! Phase 4: typedef, identity and feature resolution.
//!
//! Binds every derived type reference, identity `base` and `if-feature`
//! name to its definition. Lookups walk the scopes from the reference site
//! (ancestor typedefs shadow nothing: shadowing was rejected by the
//! listener) and cross module boundaries through import prefixes.
//! Identity bases form a DAG; typedef chains must be acyclic.

use crate::error::{ErrorKind, ReferenceErrorKind};
use crate::resolver::context::ResolverContext;
use crate::schema::{
    IfFeatureExpr, NodeBody, NodeId, NodeKind, PrefixedName, ResolvableStatus, TypeRef, TypeSpec,
};
use std::collections::BTreeSet;
use tracing::debug;

/// Run definition resolution over the unit in dependency order.
pub fn run(ctx: &mut ResolverContext) {
    for module in ctx.order.clone() {
        resolve_module(ctx, module);
    }
    detect_typedef_cycles(ctx);
    detect_identity_cycles(ctx);
}

fn resolve_module(ctx: &mut ResolverContext, module: NodeId) {
    let mut nodes = Vec::new();
    ctx.tree.walk(module, &mut |id| {
        nodes.push(id);
        true
    });
    debug!(
        module = ctx.tree.name(module),
        nodes = nodes.len(),
        "resolving definitions"
    );

    for node in nodes {
        // Derived types (leaf, leaf-list, typedef)
        let spec = match &mut ctx.tree[node].body {
            NodeBody::Leaf(info) => info.type_spec.take(),
            NodeBody::Typedef(info) => info.type_spec.take(),
            _ => None,
        };
        if let Some(mut spec) = spec {
            resolve_type_spec(ctx, module, node, &mut spec);
            match &mut ctx.tree[node].body {
                NodeBody::Leaf(info) => info.type_spec = Some(spec),
                NodeBody::Typedef(info) => info.type_spec = Some(spec),
                _ => {}
            }
        }

        // Identity bases
        if ctx.tree[node].kind == NodeKind::Identity {
            let mut bases = match &mut ctx.tree[node].body {
                NodeBody::Identity(info) => std::mem::take(&mut info.bases),
                _ => Vec::new(),
            };
            for base in &mut bases {
                resolve_reference(ctx, module, node, NodeKind::Identity, base);
            }
            if let NodeBody::Identity(info) = &mut ctx.tree[node].body {
                info.bases = bases;
            }
        }

        // if-feature expressions in the common metadata
        let mut if_features = std::mem::take(&mut ctx.tree[node].meta.if_features);
        for expr in &mut if_features {
            resolve_if_feature(ctx, module, node, expr);
        }
        ctx.tree[node].meta.if_features = if_features;
    }
}

fn resolve_if_feature(
    ctx: &mut ResolverContext,
    module: NodeId,
    node: NodeId,
    expr: &mut IfFeatureExpr,
) {
    expr.for_each_name_mut(&mut |name| {
        resolve_reference(ctx, module, node, NodeKind::Feature, name);
    });
}

/// Resolve one prefixed name against a definition kind, updating its
/// status in place.
fn resolve_reference(
    ctx: &mut ResolverContext,
    module: NodeId,
    node: NodeId,
    kind: NodeKind,
    reference: &mut PrefixedName,
) {
    if reference.resolved.is_some() {
        return;
    }
    let before = ctx.errors.len();
    let found = ctx.find_definition(
        module,
        node,
        kind,
        reference.prefix.as_deref(),
        &reference.name,
        reference.span,
    );
    match found {
        Some(target) => {
            reference.resolved = Some(target);
            reference.status = if ctx.tree.enclosing_module(target) == Some(module) {
                ResolvableStatus::Resolved
            } else {
                ResolvableStatus::Linked
            };
        }
        None => {
            // find_definition already reported unknown prefixes
            if ctx.errors.len() == before {
                ctx.error_at_span(
                    ErrorKind::Reference(ReferenceErrorKind::UnresolvedReference),
                    node,
                    reference.span,
                    format!("unknown {} '{reference}'", kind.keyword()),
                );
            }
        }
    }
}

fn resolve_type_spec(ctx: &mut ResolverContext, module: NodeId, node: NodeId, spec: &mut TypeSpec) {
    if let TypeRef::Derived(name) = &mut spec.base {
        resolve_reference(ctx, module, node, NodeKind::Typedef, name);
    }
    for base in &mut spec.identity_bases {
        resolve_reference(ctx, module, node, NodeKind::Identity, base);
    }
    for member in &mut spec.union_members {
        resolve_type_spec(ctx, module, node, member);
    }
}

/// Reject `typedef a { type b; } typedef b { type a; }` chains.
fn detect_typedef_cycles(ctx: &mut ResolverContext) {
    let mut typedefs = Vec::new();
    for module in ctx.order.clone() {
        ctx.tree.walk(module, &mut |id| {
            if ctx.tree[id].kind == NodeKind::Typedef {
                typedefs.push(id);
            }
            true
        });
    }

    for &start in &typedefs {
        let mut seen = BTreeSet::from([start]);
        let mut current = start;
        while let Some(next) = typedef_target(ctx, current) {
            if !seen.insert(next) {
                let name = ctx.tree.name(start).to_string();
                ctx.error_at_node(
                    ErrorKind::Reference(ReferenceErrorKind::CyclicReference),
                    start,
                    format!("typedef '{name}' participates in a type cycle"),
                );
                break;
            }
            current = next;
        }
    }
}

fn typedef_target(ctx: &ResolverContext, typedef: NodeId) -> Option<NodeId> {
    match &ctx.tree[typedef].body {
        NodeBody::Typedef(info) => match &info.type_spec {
            Some(spec) => spec.base.resolved(),
            None => None,
        },
        _ => None,
    }
}

/// Reject cycles in the identity base DAG.
fn detect_identity_cycles(ctx: &mut ResolverContext) {
    let mut identities = Vec::new();
    for module in ctx.order.clone() {
        for child in ctx.tree.children(module) {
            if ctx.tree[child].kind == NodeKind::Identity {
                identities.push(child);
            }
        }
    }

    for &start in &identities {
        let mut seen = BTreeSet::from([start]);
        let mut frontier = identity_bases(ctx, start);
        while let Some(next) = frontier.pop() {
            if next == start {
                let name = ctx.tree.name(start).to_string();
                ctx.error_at_node(
                    ErrorKind::Reference(ReferenceErrorKind::CyclicReference),
                    start,
                    format!("identity '{name}' participates in a base cycle"),
                );
                break;
            }
            if seen.insert(next) {
                frontier.extend(identity_bases(ctx, next));
            }
        }
    }
}

fn identity_bases(ctx: &ResolverContext, identity: NodeId) -> Vec<NodeId> {
    match &ctx.tree[identity].body {
        NodeBody::Identity(info) => info.bases.iter().filter_map(|b| b.resolved).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::phases::{imports, order};
    use crate::source::{parse_source, CompileOptions};

    fn resolved_ctx(sources: &[&str]) -> ResolverContext {
        let mut ctx = ResolverContext::new(&CompileOptions::default());
        for source in sources {
            let parsed = parse_source(source, None).expect("parse failed");
            ctx.add_parsed(parsed);
        }
        imports::run(&mut ctx);
        order::run(&mut ctx);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        run(&mut ctx);
        ctx
    }

    fn leaf_type_status(ctx: &ResolverContext, module: NodeId, leaf: &str) -> ResolvableStatus {
        let leaf = ctx.tree.find_child(module, leaf, Some(NodeKind::Leaf)).unwrap();
        ctx.tree[leaf]
            .leaf_info()
            .unwrap()
            .type_spec
            .as_ref()
            .unwrap()
            .base
            .status()
    }

    #[test]
    fn test_intra_module_typedef_resolved() {
        let ctx = resolved_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; typedef t { type string; } leaf x { type t; } }",
        ]);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        assert_eq!(
            leaf_type_status(&ctx, ctx.module_roots[0], "x"),
            ResolvableStatus::Resolved
        );
    }

    #[test]
    fn test_cross_module_typedef_linked() {
        let ctx = resolved_ctx(&[
            "module a { namespace \"urn:a\"; prefix a; import b { prefix b; } leaf x { type b:addr; } }",
            "module b { namespace \"urn:b\"; prefix b; typedef addr { type string; } }",
        ]);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        assert_eq!(
            leaf_type_status(&ctx, ctx.module_roots[0], "x"),
            ResolvableStatus::Linked
        );
    }

    #[test]
    fn test_unknown_typedef_reported() {
        let ctx = resolved_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; leaf x { type nope; } }",
        ]);
        assert!(ctx.errors.iter().any(|e| {
            matches!(
                e.kind,
                ErrorKind::Reference(ReferenceErrorKind::UnresolvedReference)
            ) && e.message.contains("unknown typedef 'nope'")
        }));
    }

    #[test]
    fn test_unknown_prefix_reported_as_missing_import() {
        let ctx = resolved_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; leaf x { type zz:t; } }",
        ]);
        assert!(ctx.errors.iter().any(|e| {
            matches!(
                e.kind,
                ErrorKind::Reference(ReferenceErrorKind::MissingImport)
            ) && e.message.contains("prefix 'zz'")
        }));
    }

    #[test]
    fn test_typedef_cycle_rejected() {
        let ctx = resolved_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; typedef a { type b; } typedef b { type a; } }",
        ]);
        assert!(ctx
            .errors
            .iter()
            .any(|e| e.message.contains("type cycle")));
    }

    #[test]
    fn test_identity_dag_resolved() {
        let ctx = resolved_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; identity alg; identity aes { base alg; } identity aes256 { base aes; } }",
        ]);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        let m = ctx.module_roots[0];
        let aes = ctx.tree.find_child(m, "aes", Some(NodeKind::Identity)).unwrap();
        let NodeBody::Identity(info) = &ctx.tree[aes].body else {
            panic!("expected identity body");
        };
        assert!(info.bases[0].resolved.is_some());
    }

    #[test]
    fn test_identity_cycle_rejected() {
        let ctx = resolved_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; identity a { base b; } identity b { base a; } }",
        ]);
        assert!(ctx.errors.iter().any(|e| e.message.contains("base cycle")));
    }

    #[test]
    fn test_identityref_base_resolved() {
        let ctx = resolved_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; identity alg; leaf a { type identityref { base alg; } } }",
        ]);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        let m = ctx.module_roots[0];
        let a = ctx.tree.find_child(m, "a", Some(NodeKind::Leaf)).unwrap();
        let spec = ctx.tree[a].leaf_info().unwrap().type_spec.as_ref().unwrap();
        assert!(spec.identity_bases[0].resolved.is_some());
    }

    #[test]
    fn test_if_feature_resolved() {
        let ctx = resolved_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; feature routing; container r { if-feature routing; } }",
        ]);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        let m = ctx.module_roots[0];
        let r = ctx.tree.find_child(m, "r", Some(NodeKind::Container)).unwrap();
        let IfFeatureExpr::Name(name) = &ctx.tree[r].meta.if_features[0] else {
            panic!("expected name expression");
        };
        assert!(name.resolved.is_some());
    }

    #[test]
    fn test_unknown_feature_reported() {
        let ctx = resolved_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; container r { if-feature nope; } }",
        ]);
        assert!(ctx
            .errors
            .iter()
            .any(|e| e.message.contains("unknown feature 'nope'")));
    }

    #[test]
    fn test_union_members_resolved() {
        let ctx = resolved_ctx(&[
            "module m { namespace \"urn:m\"; prefix m; typedef t { type string; } leaf u { type union { type t; type int32; } } }",
        ]);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        let m = ctx.module_roots[0];
        let u = ctx.tree.find_child(m, "u", Some(NodeKind::Leaf)).unwrap();
        let spec = ctx.tree[u].leaf_info().unwrap().type_spec.as_ref().unwrap();
        assert_eq!(spec.union_members[0].base.status(), ResolvableStatus::Resolved);
    }
}
