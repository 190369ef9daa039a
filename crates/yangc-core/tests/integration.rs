//! End-to-end scenarios over the full pipeline.

use yangc_core::context::{AnnotationRegistry, ResourceId, SerializerContext};
use yangc_core::error::{CompileErrors, ErrorKind, ReferenceErrorKind};
use yangc_core::resolver::{resolve_set, ResolvedTree};
use yangc_core::schema::{NodeKind, OrderedBy};
use yangc_core::source::{parse_source, CompileOptions, ParsedModule};
use yangc_core::{compile_files, listener};

fn parse_all(sources: &[&str]) -> Vec<ParsedModule> {
    sources
        .iter()
        .map(|s| parse_source(s, None).expect("parse failed"))
        .collect()
}

fn resolve_ok(sources: &[&str]) -> ResolvedTree {
    resolve_set(parse_all(sources), &CompileOptions::default()).expect("resolve failed")
}

fn resolve_err(sources: &[&str]) -> CompileErrors {
    resolve_set(parse_all(sources), &CompileOptions::default())
        .err()
        .expect("expected resolution to fail")
}

/// S1: `leaf-list foo { ordered-by user; }` parses cleanly and records
/// the user ordering.
#[test]
fn scenario_ordered_by_user() {
    let resolved = resolve_ok(&[
        "module m { namespace \"urn:m\"; prefix m; leaf-list foo { type string; ordered-by user; } }",
    ]);
    let tree = resolved.tree();
    let m = resolved.find_module("m").unwrap();
    let foo = tree.find_child(m, "foo", Some(NodeKind::LeafList)).unwrap();
    assert_eq!(tree[foo].leaf_info().unwrap().ordered_by, OrderedBy::User);
}

/// S2: a trailing `}` after module close is a syntax error with the
/// classic parser message.
#[test]
fn scenario_extra_brace() {
    let err = parse_source(
        "module m { namespace \"urn:m\"; prefix m; }\n}",
        None,
    )
    .unwrap_err();
    assert!(err
        .errors
        .iter()
        .any(|e| matches!(e.kind, ErrorKind::Syntax)
            && e.message.contains("mismatched input '}' expecting <EOF>")));
}

/// S3: refine overrides the copy's default; the grouping keeps its own.
#[test]
fn scenario_uses_refine() {
    let resolved = resolve_ok(&[
        "module m { namespace \"urn:m\"; prefix m; grouping g { leaf x { type string; default a; } } container c { uses g { refine x { default b; } } } }",
    ]);
    let tree = resolved.tree();
    let m = resolved.find_module("m").unwrap();

    let c = tree.find_child(m, "c", Some(NodeKind::Container)).unwrap();
    let cx = tree.find_child(c, "x", Some(NodeKind::Leaf)).unwrap();
    assert_eq!(tree[cx].leaf_info().unwrap().defaults, vec!["b"]);

    let g = tree.find_child(m, "g", Some(NodeKind::Grouping)).unwrap();
    let gx = tree.find_child(g, "x", Some(NodeKind::Leaf)).unwrap();
    assert_eq!(tree[gx].leaf_info().unwrap().defaults, vec!["a"]);
}

/// S4: module B augments a container of module A through a grouping; the
/// spliced subtree carries B's namespace.
#[test]
fn scenario_augment_across_modules() {
    let resolved = resolve_ok(&[
        "module a { namespace \"urn:a\"; prefix a; container ifs { container if { leaf name { type string; } } } }",
        "module b { namespace \"urn:b\"; prefix b; import a { prefix a; } grouping vlan-routed-top { container routed-vlan { leaf vlan-id { type uint16; } } } augment /a:ifs/a:if { uses vlan-routed-top; } }",
    ]);
    let tree = resolved.tree();
    let a = resolved.find_module("a").unwrap();

    let ifs = tree.find_child(a, "ifs", Some(NodeKind::Container)).unwrap();
    let iff = tree.find_child(ifs, "if", Some(NodeKind::Container)).unwrap();
    let routed = tree
        .find_child(iff, "routed-vlan", Some(NodeKind::Container))
        .expect("augmented subtree present under /ifs/if");

    let ns_b = tree.strings().find("urn:b").unwrap();
    assert_eq!(tree[routed].namespace, Some(ns_b));
    // The inner leaf is B's too
    let vlan = tree.find_child(routed, "vlan-id", Some(NodeKind::Leaf)).unwrap();
    assert_eq!(tree[vlan].namespace, Some(ns_b));
}

/// S5: two cases of one choice introducing the same identifier collide,
/// and the error names both the identifier and the choice.
#[test]
fn scenario_cross_case_collision() {
    let err = parse_source(
        "module m { namespace \"urn:m\"; prefix m; choice iface-type { case a { leaf ethernet { type string; } } case b { container ethernet { } } } }",
        None,
    )
    .unwrap_err();
    let constraint = err
        .errors
        .iter()
        .find(|e| matches!(e.kind, ErrorKind::Constraint))
        .expect("expected a constraint error");
    assert!(constraint.message.contains("ethernet"));
    assert!(constraint.message.contains("iface-type"));
}

/// S6: revision-based import selection against files on disk.
#[test]
fn scenario_revision_import_selection() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("m@2016-05-26.yang"),
        "module m { namespace \"urn:m:2016\"; prefix m; revision 2016-05-26; leaf old { type string; } }",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("m@2017-03-10.yang"),
        "module m { namespace \"urn:m:2017\"; prefix m; revision 2017-03-10; revision 2016-05-26; leaf new { type string; } }",
    )
    .unwrap();

    let options = CompileOptions::with_search_dirs([dir.path()]);

    // import m (no revision) binds to the 2017 revision
    let resolved = resolve_set(
        parse_all(&[
            "module user { namespace \"urn:user\"; prefix u; import m { prefix m; } }",
        ]),
        &options,
    )
    .expect("unpinned import resolves");
    let m = resolved.find_module("m").unwrap();
    let ns = resolved.tree().get_str(resolved.module_namespace(m).unwrap());
    assert_eq!(ns, "urn:m:2017");

    let resolved = resolve_set(
        parse_all(&[
            "module user { namespace \"urn:user\"; prefix u; import m { prefix m; revision-date 2016-05-26; } }",
        ]),
        &options,
    )
    .expect("pinned import resolves");
    let m = resolved.find_module("m").unwrap();
    let ns = resolved.tree().get_str(resolved.module_namespace(m).unwrap());
    assert_eq!(ns, "urn:m:2016");
}

/// Invariant 1: (name, namespace) pairs are unique among data children,
/// globally across the cases of any choice.
#[test]
fn invariant_unique_schema_ids() {
    let resolved = resolve_ok(&[
        "module a { namespace \"urn:a\"; prefix a; container c { leaf x { type string; } choice ch { case one { leaf y { type string; } } case two { leaf z { type string; } } } } }",
        "module b { namespace \"urn:b\"; prefix b; import a { prefix a; } augment /a:c { leaf x { type string; } } }",
    ]);
    let tree = resolved.tree();
    let a = resolved.find_module("a").unwrap();
    let c = tree.find_child(a, "c", Some(NodeKind::Container)).unwrap();
    let map = tree.child_map(c).expect("child map built");

    // x (urn:a), ch, y, z, x (urn:b): all five unique
    assert_eq!(map.len(), 5);
    let mut seen = std::collections::BTreeSet::new();
    for id in map.keys() {
        assert!(seen.insert(*id), "duplicate schema id in child map");
    }
}

/// Invariant 3 over the whole pipeline: the namespace of expanded
/// grouping content is the using module's, never the defining module's.
#[test]
fn invariant_expansion_namespace() {
    let resolved = resolve_ok(&[
        "module lib { namespace \"urn:lib\"; prefix lib; grouping endpoint { leaf host { type string; } leaf port { type uint16; } } }",
        "module app { namespace \"urn:app\"; prefix app; import lib { prefix lib; } container server { uses lib:endpoint; } }",
    ]);
    let tree = resolved.tree();
    let app = resolved.find_module("app").unwrap();
    let ns_app = tree.strings().find("urn:app").unwrap();

    let server = tree.find_child(app, "server", Some(NodeKind::Container)).unwrap();
    for child in tree.child_ids(server) {
        assert_eq!(tree[child].namespace, Some(ns_app));
    }

    // The template still carries lib's namespace
    let lib = resolved.find_module("lib").unwrap();
    let ns_lib = tree.strings().find("urn:lib").unwrap();
    let g = tree.find_child(lib, "endpoint", Some(NodeKind::Grouping)).unwrap();
    for child in tree.child_ids(g) {
        assert_eq!(tree[child].namespace, Some(ns_lib));
    }
}

/// Invariant 4 round trip: every resource id built from a traversal looks
/// up to the node that produced it.
#[test]
fn invariant_resource_id_round_trip() {
    let resolved = resolve_ok(&[
        "module m { namespace \"urn:m\"; prefix m; container sys { list user { key name; leaf name { type string; } leaf-list groups { type string; } } choice auth { case pw { leaf password { type string; } } } } }",
    ]);
    let ctx = SerializerContext::new(resolved, AnnotationRegistry::new());

    let mut checked = 0;
    let nodes: Vec<_> = ctx.data_nodes().collect();
    for node in nodes {
        let kind = ctx.resolved().tree()[node].kind;
        if matches!(kind, NodeKind::Choice | NodeKind::Case) {
            continue;
        }
        let id = ctx.resource_id_of(node).expect("resource id built");
        assert_eq!(ctx.lookup(&id), Some(node));
        checked += 1;
    }
    assert!(checked >= 5, "expected to check several nodes, got {checked}");
}

/// Invariant 6: revision date validation is exactly calendar-valid
/// YYYY-MM-DD.
#[test]
fn invariant_revision_dates() {
    for (date, ok) in [
        ("2016-05-26", true),
        ("2016-02-29", true),
        ("2015-02-29", false),
        ("2016-13-01", false),
        ("2016-5-26", false),
        ("garbage", false),
    ] {
        assert_eq!(listener::is_valid_date(date), ok, "{date}");
    }
}

/// Submodules contribute to the including module's scope and namespace.
#[test]
fn submodule_inclusion_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("sub.yang"),
        "submodule sub { belongs-to main { prefix mn; } grouping helpers { leaf tag { type string; } } }",
    )
    .unwrap();
    let main = dir.path().join("main.yang");
    std::fs::write(
        &main,
        "module main { namespace \"urn:main\"; prefix mn; include sub; container c { uses helpers; } }",
    )
    .unwrap();

    let resolved = compile_files(&[&main], &CompileOptions::with_search_dirs([dir.path()]))
        .expect("compile failed");
    let tree = resolved.tree();
    let m = resolved.find_module("main").unwrap();
    let c = tree.find_child(m, "c", Some(NodeKind::Container)).unwrap();
    let tag = tree.find_child(c, "tag", Some(NodeKind::Leaf)).unwrap();

    let ns = tree.strings().find("urn:main").unwrap();
    assert_eq!(tree[tag].namespace, Some(ns));
}

/// Mutually-importing modules are rejected as a unit.
#[test]
fn mutual_imports_rejected() {
    let err = resolve_err(&[
        "module a { namespace \"urn:a\"; prefix a; import b { prefix b; } }",
        "module b { namespace \"urn:b\"; prefix b; import a { prefix a; } }",
    ]);
    assert!(err.errors.iter().any(|e| {
        matches!(
            e.kind,
            ErrorKind::Reference(ReferenceErrorKind::CyclicReference)
        )
    }));
}

/// A compile failure never yields a tree (failure semantics).
#[test]
fn no_partial_trees() {
    let result = resolve_set(
        parse_all(&[
            "module m { namespace \"urn:m\"; prefix m; container c { uses ghost; } leaf ok { type string; } }",
        ]),
        &CompileOptions::default(),
    );
    assert!(result.is_err());
}

/// Chained groupings across modules expand transitively.
#[test]
fn transitive_groupings_across_modules() {
    let resolved = resolve_ok(&[
        "module base { namespace \"urn:base\"; prefix base; grouping addr { leaf ip { type string; } } }",
        "module mid { namespace \"urn:mid\"; prefix mid; import base { prefix base; } grouping endpoint { uses base:addr; leaf port { type uint16; } } }",
        "module top { namespace \"urn:top\"; prefix top; import mid { prefix mid; } container conn { uses mid:endpoint; } }",
    ]);
    let tree = resolved.tree();
    let top = resolved.find_module("top").unwrap();
    let conn = tree.find_child(top, "conn", Some(NodeKind::Container)).unwrap();
    let names: Vec<&str> = tree.children(conn).map(|n| tree.name(n)).collect();
    assert_eq!(names, vec!["ip", "port"]);

    let ns_top = tree.strings().find("urn:top").unwrap();
    for child in tree.child_ids(conn) {
        assert_eq!(tree[child].namespace, Some(ns_top));
    }
}

/// A resource id can address augmented content in the augmenting
/// module's namespace.
#[test]
fn lookup_augmented_content() {
    let resolved = resolve_ok(&[
        "module a { namespace \"urn:a\"; prefix a; container c { leaf x { type string; } } }",
        "module b { namespace \"urn:b\"; prefix b; import a { prefix a; } augment /a:c { leaf y { type string; } } }",
    ]);
    let ctx = SerializerContext::new(resolved, AnnotationRegistry::new());

    let id = ResourceId::builder()
        .add_branch_point("c", "urn:a")
        .unwrap()
        .add_branch_point("y", "urn:b")
        .unwrap()
        .build()
        .unwrap();
    let y = ctx.lookup(&id).expect("augmented leaf addressable");
    assert_eq!(ctx.resolved().tree().name(y), "y");
}
