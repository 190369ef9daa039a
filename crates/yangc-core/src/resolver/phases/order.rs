//! Phase 3: dependency ordering.
//!
//! Builds the module dependency graph (edges from importer to imported)
//! and produces the reverse topological order: imported modules come
//! before their importers, so later phases see definitions before uses.
//! Mutually dependent modules are rejected.

use crate::error::{ErrorKind, ReferenceErrorKind};
use crate::resolver::context::ResolverContext;
use crate::schema::NodeId;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Compute `ctx.order`; reports a cycle when Kahn's algorithm stalls.
pub fn run(ctx: &mut ResolverContext) {
    let modules: Vec<NodeId> = ctx.module_roots.clone();
    let module_set: BTreeSet<NodeId> = modules.iter().copied().collect();

    // importer -> set of imported modules
    let mut imports_of: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
    // imported -> importers (reverse edges for Kahn)
    let mut importers_of: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();

    for &module in &modules {
        let deps: BTreeSet<NodeId> = ctx.tree[module]
            .module_info()
            .map(|info| {
                info.imports
                    .iter()
                    .filter_map(|i| i.resolved)
                    .filter(|dep| module_set.contains(dep) && *dep != module)
                    .collect()
            })
            .unwrap_or_default();
        for &dep in &deps {
            importers_of.entry(dep).or_default().push(module);
        }
        imports_of.insert(module, deps);
    }

    let mut ready: Vec<NodeId> = modules
        .iter()
        .copied()
        .filter(|m| imports_of.get(m).is_none_or(BTreeSet::is_empty))
        .collect();
    let mut order = Vec::with_capacity(modules.len());

    while let Some(module) = ready.pop() {
        order.push(module);
        if let Some(importers) = importers_of.get(&module) {
            for &importer in importers.clone().iter() {
                if let Some(deps) = imports_of.get_mut(&importer) {
                    deps.remove(&module);
                    if deps.is_empty() {
                        ready.push(importer);
                    }
                }
            }
        }
    }

    if order.len() != modules.len() {
        let stuck: Vec<String> = modules
            .iter()
            .filter(|m| imports_of.get(m).is_some_and(|deps| !deps.is_empty()))
            .map(|&m| ctx.tree.name(m).to_string())
            .collect();
        ctx.errors.push(crate::error::CompileError::new(
            ErrorKind::Reference(ReferenceErrorKind::CyclicReference),
            format!("cyclic imports among modules: {}", stuck.join(", ")),
        ));
        return;
    }

    debug!(
        order = ?order.iter().map(|&m| ctx.tree.name(m)).collect::<Vec<_>>(),
        "module processing order"
    );
    ctx.order = order;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::phases::imports;
    use crate::source::{parse_source, CompileOptions};

    fn ordered_names(sources: &[&str]) -> Result<Vec<String>, Vec<crate::error::CompileError>> {
        let mut ctx = ResolverContext::new(&CompileOptions::default());
        for source in sources {
            let parsed = parse_source(source, None).expect("parse failed");
            ctx.add_parsed(parsed);
        }
        imports::run(&mut ctx);
        assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
        run(&mut ctx);
        if ctx.errors.is_empty() {
            Ok(ctx
                .order
                .iter()
                .map(|&m| ctx.tree.name(m).to_string())
                .collect())
        } else {
            Err(ctx.take_errors())
        }
    }

    #[test]
    fn test_imported_before_importer() {
        let order = ordered_names(&[
            "module a { namespace \"urn:a\"; prefix a; import b { prefix b; } }",
            "module b { namespace \"urn:b\"; prefix b; import c { prefix c; } }",
            "module c { namespace \"urn:c\"; prefix c; }",
        ])
        .unwrap();
        let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
        assert!(pos("c") < pos("b"));
        assert!(pos("b") < pos("a"));
    }

    #[test]
    fn test_cycle_rejected() {
        let errors = ordered_names(&[
            "module a { namespace \"urn:a\"; prefix a; import b { prefix b; } }",
            "module b { namespace \"urn:b\"; prefix b; import a { prefix a; } }",
        ])
        .unwrap_err();
        assert!(errors.iter().any(|e| {
            matches!(
                e.kind,
                ErrorKind::Reference(ReferenceErrorKind::CyclicReference)
            ) && e.message.contains("cyclic imports")
        }));
    }

    #[test]
    fn test_independent_modules_all_ordered() {
        let order = ordered_names(&[
            "module a { namespace \"urn:a\"; prefix a; }",
            "module b { namespace \"urn:b\"; prefix b; }",
        ])
        .unwrap();
        assert_eq!(order.len(), 2);
    }
}
