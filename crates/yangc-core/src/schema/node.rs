//! Schema tree nodes.
//!
//! Every node carries the common metadata of RFC 6020 §7 plus a
//! kind-specific payload. Nodes live in the [`SchemaTree`](super::SchemaTree)
//! arena and link to each other by [`NodeId`]; nothing here owns another
//! node.

use super::ids::{NodeId, StrId};
use super::path::{PrefixedName, ResolvableStatus, SchemaPath};
use super::types::TypeSpec;
use crate::lexer::Span;

/// Schema node kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Module,
    Submodule,
    Container,
    List,
    Choice,
    Case,
    Grouping,
    Uses,
    Augment,
    Rpc,
    Action,
    Input,
    Output,
    Notification,
    Leaf,
    LeafList,
    Anyxml,
    Anydata,
    Typedef,
    Identity,
    Feature,
}

impl NodeKind {
    /// The keyword this node kind corresponds to.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Submodule => "submodule",
            Self::Container => "container",
            Self::List => "list",
            Self::Choice => "choice",
            Self::Case => "case",
            Self::Grouping => "grouping",
            Self::Uses => "uses",
            Self::Augment => "augment",
            Self::Rpc => "rpc",
            Self::Action => "action",
            Self::Input => "input",
            Self::Output => "output",
            Self::Notification => "notification",
            Self::Leaf => "leaf",
            Self::LeafList => "leaf-list",
            Self::Anyxml => "anyxml",
            Self::Anydata => "anydata",
            Self::Typedef => "typedef",
            Self::Identity => "identity",
            Self::Feature => "feature",
        }
    }

    /// Data-tree node kinds: nodes that can appear in instance data
    /// (including the choice/case layer, which structures it).
    #[must_use]
    pub fn is_data_node(self) -> bool {
        matches!(
            self,
            Self::Container
                | Self::List
                | Self::Choice
                | Self::Case
                | Self::Leaf
                | Self::LeafList
                | Self::Anyxml
                | Self::Anydata
        )
    }

    /// Terminal data nodes: no data-tree children ever.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Leaf | Self::LeafList | Self::Anyxml | Self::Anydata
        )
    }

    /// Kinds whose children form a data-node collision scope.
    #[must_use]
    pub fn is_data_scope(self) -> bool {
        matches!(
            self,
            Self::Module
                | Self::Submodule
                | Self::Container
                | Self::List
                | Self::Case
                | Self::Grouping
                | Self::Input
                | Self::Output
                | Self::Notification
                | Self::Rpc
                | Self::Action
                | Self::Augment
        )
    }
}

/// The `status` of a definition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    #[default]
    Current,
    Deprecated,
    Obsolete,
}

/// `ordered-by` of a list or leaf-list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderedBy {
    #[default]
    System,
    User,
}

/// `max-elements` of a list or leaf-list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaxElements {
    /// `max-elements unbounded`.
    Unbounded,
    /// A concrete bound.
    Value(u64),
}

/// A `must` constraint. The XPath is opaque to the compiler and handed to
/// the runtime verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Must {
    /// The constraint expression, as written.
    pub xpath: String,
    /// `error-message` substatement.
    pub error_message: Option<String>,
    /// `error-app-tag` substatement.
    pub error_app_tag: Option<String>,
    /// `description` substatement.
    pub description: Option<String>,
    /// `reference` substatement.
    pub reference: Option<String>,
    /// Source span.
    pub span: Span,
}

/// A `when` condition, opaque to the compiler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct When {
    /// The condition expression, as written.
    pub xpath: String,
    /// Source span.
    pub span: Span,
}

/// An `if-feature` expression (RFC 7950 syntax: `and`, `or`, `not`,
/// parentheses over feature names; RFC 6020 uses bare names).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IfFeatureExpr {
    /// A feature reference.
    Name(PrefixedName),
    /// Logical negation.
    Not(Box<IfFeatureExpr>),
    /// Logical conjunction.
    And(Box<IfFeatureExpr>, Box<IfFeatureExpr>),
    /// Logical disjunction.
    Or(Box<IfFeatureExpr>, Box<IfFeatureExpr>),
}

impl IfFeatureExpr {
    /// Parse an if-feature expression argument.
    ///
    /// # Errors
    ///
    /// Returns a message for unbalanced parentheses or misplaced operators.
    pub fn parse(text: &str, span: Span) -> Result<Self, String> {
        let tokens = tokenize_if_feature(text);
        let mut pos = 0usize;
        let expr = parse_or(&tokens, &mut pos, span)?;
        if pos != tokens.len() {
            return Err(format!("trailing input in if-feature expression '{text}'"));
        }
        Ok(expr)
    }

    /// Visit every feature name referenced by this expression.
    pub fn for_each_name<F: FnMut(&PrefixedName)>(&self, f: &mut F) {
        match self {
            Self::Name(name) => f(name),
            Self::Not(inner) => inner.for_each_name(f),
            Self::And(a, b) | Self::Or(a, b) => {
                a.for_each_name(f);
                b.for_each_name(f);
            }
        }
    }

    /// Visit every feature name mutably (used by the resolver to bind them).
    pub fn for_each_name_mut<F: FnMut(&mut PrefixedName)>(&mut self, f: &mut F) {
        match self {
            Self::Name(name) => f(name),
            Self::Not(inner) => inner.for_each_name_mut(f),
            Self::And(a, b) | Self::Or(a, b) => {
                a.for_each_name_mut(f);
                b.for_each_name_mut(f);
            }
        }
    }
}

fn tokenize_if_feature(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' | ')' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_or(tokens: &[String], pos: &mut usize, span: Span) -> Result<IfFeatureExpr, String> {
    let mut left = parse_and(tokens, pos, span)?;
    while tokens.get(*pos).is_some_and(|t| t == "or") {
        *pos += 1;
        let right = parse_and(tokens, pos, span)?;
        left = IfFeatureExpr::Or(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_and(tokens: &[String], pos: &mut usize, span: Span) -> Result<IfFeatureExpr, String> {
    let mut left = parse_factor(tokens, pos, span)?;
    while tokens.get(*pos).is_some_and(|t| t == "and") {
        *pos += 1;
        let right = parse_factor(tokens, pos, span)?;
        left = IfFeatureExpr::And(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_factor(tokens: &[String], pos: &mut usize, span: Span) -> Result<IfFeatureExpr, String> {
    match tokens.get(*pos).map(String::as_str) {
        Some("not") => {
            *pos += 1;
            let inner = parse_factor(tokens, pos, span)?;
            Ok(IfFeatureExpr::Not(Box::new(inner)))
        }
        Some("(") => {
            *pos += 1;
            let inner = parse_or(tokens, pos, span)?;
            if tokens.get(*pos).map(String::as_str) != Some(")") {
                return Err("unbalanced parentheses in if-feature expression".to_string());
            }
            *pos += 1;
            Ok(inner)
        }
        Some(")") | Some("and") | Some("or") | None => {
            Err("expected feature name in if-feature expression".to_string())
        }
        Some(name) => {
            *pos += 1;
            Ok(IfFeatureExpr::Name(PrefixedName::parse(name, span)))
        }
    }
}

/// Metadata common to every schema node (RFC 6020 §7.19).
#[derive(Clone, Debug, Default)]
pub struct CommonMeta {
    /// `description`, when present.
    pub description: Option<String>,
    /// `reference`, when present.
    pub reference: Option<String>,
    /// `status`, defaulting to `current`.
    pub status: Status,
    /// `when` condition, captured verbatim.
    pub when: Option<When>,
    /// `if-feature` expressions, in source order.
    pub if_features: Vec<IfFeatureExpr>,
    /// `must` constraints, in source order.
    pub musts: Vec<Must>,
}

/// A `revision` entry of a module or submodule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Revision {
    /// The revision date (`YYYY-MM-DD`, validated).
    pub date: String,
    /// Revision description.
    pub description: Option<String>,
    /// Revision reference.
    pub reference: Option<String>,
    /// Source span.
    pub span: Span,
}

/// An `import` of another module.
#[derive(Clone, Debug)]
pub struct Import {
    /// Imported module name.
    pub module: String,
    /// Local prefix bound to the imported module.
    pub prefix: String,
    /// Requested revision, when pinned.
    pub revision: Option<String>,
    /// Source span.
    pub span: Span,
    /// The imported module root, once located.
    pub resolved: Option<NodeId>,
    /// Resolution state.
    pub status: ResolvableStatus,
}

/// An `include` of a submodule.
#[derive(Clone, Debug)]
pub struct Include {
    /// Included submodule name.
    pub submodule: String,
    /// Requested revision, when pinned.
    pub revision: Option<String>,
    /// Source span.
    pub span: Span,
    /// The submodule root, once located.
    pub resolved: Option<NodeId>,
    /// Resolution state.
    pub status: ResolvableStatus,
}

/// YANG language version of a module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum YangVersion {
    /// RFC 6020.
    #[default]
    V1,
    /// RFC 7950 (`yang-version 1.1`).
    V1_1,
}

/// Payload of a `module`/`submodule` node.
#[derive(Clone, Debug, Default)]
pub struct ModuleInfo {
    /// `namespace` URI (modules only).
    pub namespace_uri: Option<String>,
    /// The module's own `prefix` (modules), or the prefix bound by
    /// `belongs-to` (submodules).
    pub prefix: Option<String>,
    /// `yang-version`.
    pub yang_version: YangVersion,
    /// `belongs-to` parent module name (submodules only).
    pub belongs_to: Option<String>,
    /// `organization` text.
    pub organization: Option<String>,
    /// `contact` text.
    pub contact: Option<String>,
    /// `revision` history, in source order (newest first by convention).
    pub revisions: Vec<Revision>,
    /// `import`s, in source order.
    pub imports: Vec<Import>,
    /// `include`s, in source order.
    pub includes: Vec<Include>,
}

impl ModuleInfo {
    /// The module's newest revision date, by string comparison
    /// (valid `YYYY-MM-DD` dates order lexicographically).
    #[must_use]
    pub fn latest_revision(&self) -> Option<&str> {
        self.revisions.iter().map(|r| r.date.as_str()).max()
    }
}

/// Payload of a `container` node.
#[derive(Clone, Debug, Default)]
pub struct ContainerInfo {
    /// `presence` text, when this is a presence container.
    pub presence: Option<String>,
    /// Explicit `config`, when declared.
    pub config: Option<bool>,
}

/// Payload of a `list` node.
#[derive(Clone, Debug, Default)]
pub struct ListInfo {
    /// Key leaf names, in `key` argument order.
    pub keys: Vec<String>,
    /// Span of the `key` statement, for diagnostics.
    pub key_span: Option<Span>,
    /// `unique` sets, each a list of descendant leaf paths as written.
    pub uniques: Vec<Vec<String>>,
    /// Explicit `config`, when declared.
    pub config: Option<bool>,
    /// `min-elements`.
    pub min_elements: Option<u64>,
    /// `max-elements`.
    pub max_elements: Option<MaxElements>,
    /// `ordered-by`.
    pub ordered_by: OrderedBy,
}

/// Payload of a `leaf` or `leaf-list` node.
#[derive(Clone, Debug, Default)]
pub struct LeafInfo {
    /// The leaf's type.
    pub type_spec: Option<TypeSpec>,
    /// `units` text.
    pub units: Option<String>,
    /// `default` values: at most one for `leaf`; multiple allowed for
    /// `leaf-list` in YANG 1.1.
    pub defaults: Vec<String>,
    /// Explicit `config`, when declared.
    pub config: Option<bool>,
    /// `mandatory` (leaf only).
    pub mandatory: Option<bool>,
    /// `min-elements` (leaf-list only).
    pub min_elements: Option<u64>,
    /// `max-elements` (leaf-list only).
    pub max_elements: Option<MaxElements>,
    /// `ordered-by` (leaf-list only).
    pub ordered_by: OrderedBy,
}

/// Payload of a `choice` node.
#[derive(Clone, Debug, Default)]
pub struct ChoiceInfo {
    /// `default` case name.
    pub default_case: Option<String>,
    /// Span of the `default` statement, for diagnostics.
    pub default_span: Option<Span>,
    /// `mandatory`.
    pub mandatory: Option<bool>,
    /// Explicit `config`, when declared.
    pub config: Option<bool>,
}

/// A `refine` directive under a `uses`.
#[derive(Clone, Debug)]
pub struct Refine {
    /// Relative path to the refined node inside the grouping instance.
    pub path: SchemaPath,
    /// Refined `description`.
    pub description: Option<String>,
    /// Refined `reference`.
    pub reference: Option<String>,
    /// Refined `config`.
    pub config: Option<bool>,
    /// Refined `mandatory`.
    pub mandatory: Option<bool>,
    /// Refined `presence`.
    pub presence: Option<String>,
    /// Replacement `default` values.
    pub defaults: Vec<String>,
    /// Refined `min-elements`.
    pub min_elements: Option<u64>,
    /// Refined `max-elements`.
    pub max_elements: Option<MaxElements>,
    /// Added `must` constraints.
    pub musts: Vec<Must>,
    /// Source span of the refine statement.
    pub span: Span,
}

/// Payload of a `uses` node (pre-expansion placeholder).
#[derive(Clone, Debug)]
pub struct UsesInfo {
    /// The referenced grouping.
    pub target: PrefixedName,
    /// `refine` directives, in source order.
    pub refines: Vec<Refine>,
    /// The located grouping node.
    pub resolved: Option<NodeId>,
    /// Resolution state.
    pub status: ResolvableStatus,
}

/// Payload of an `augment` node.
#[derive(Clone, Debug)]
pub struct AugmentInfo {
    /// The target schema path (absolute for top-level augments,
    /// descendant for augments inside a `uses`).
    pub target: SchemaPath,
    /// The resolved target node.
    pub resolved: Option<NodeId>,
    /// Resolution state.
    pub status: ResolvableStatus,
}

/// Payload of a `typedef` node.
#[derive(Clone, Debug, Default)]
pub struct TypedefInfo {
    /// The defined type.
    pub type_spec: Option<TypeSpec>,
    /// `units` text.
    pub units: Option<String>,
    /// `default` value.
    pub default: Option<String>,
}

/// Payload of an `identity` node.
#[derive(Clone, Debug, Default)]
pub struct IdentityInfo {
    /// `base` identity references (multiple allowed in YANG 1.1).
    pub bases: Vec<PrefixedName>,
}

/// Payload of an `anyxml`/`anydata` node.
#[derive(Clone, Debug, Default)]
pub struct AnyInfo {
    /// Explicit `config`, when declared.
    pub config: Option<bool>,
    /// `mandatory`.
    pub mandatory: Option<bool>,
}

/// Kind-specific node payload.
#[derive(Clone, Debug)]
pub enum NodeBody {
    Module(Box<ModuleInfo>),
    Container(ContainerInfo),
    List(ListInfo),
    Leaf(Box<LeafInfo>),
    Choice(ChoiceInfo),
    Uses(Box<UsesInfo>),
    Augment(Box<AugmentInfo>),
    Typedef(Box<TypedefInfo>),
    Identity(IdentityInfo),
    Any(AnyInfo),
    /// Kinds with no extra attributes (grouping, rpc, input, ...).
    Empty,
}

/// A node in the schema tree.
#[derive(Clone, Debug)]
pub struct SchemaNode {
    /// Node kind.
    pub kind: NodeKind,
    /// Node name (interned). Augments use their target path text.
    pub name: StrId,
    /// Namespace URI (interned); assigned by the resolver.
    pub namespace: Option<StrId>,
    /// Parent node.
    pub parent: Option<NodeId>,
    /// First child, in insertion order.
    pub first_child: Option<NodeId>,
    /// Last child.
    pub last_child: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Common metadata.
    pub meta: CommonMeta,
    /// Kind-specific payload.
    pub body: NodeBody,
    /// Augments applied to this node (back-links to augment nodes).
    pub augmented_by: Vec<NodeId>,
    /// Source span of the defining statement.
    pub span: Span,
}

impl SchemaNode {
    /// Create a new unlinked node.
    #[must_use]
    pub fn new(kind: NodeKind, name: StrId, body: NodeBody, span: Span) -> Self {
        Self {
            kind,
            name,
            namespace: None,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            meta: CommonMeta::default(),
            body,
            augmented_by: Vec::new(),
            span,
        }
    }

    /// The module payload, when this is a module/submodule node.
    #[must_use]
    pub fn module_info(&self) -> Option<&ModuleInfo> {
        match &self.body {
            NodeBody::Module(info) => Some(info),
            _ => None,
        }
    }

    /// Mutable module payload.
    pub fn module_info_mut(&mut self) -> Option<&mut ModuleInfo> {
        match &mut self.body {
            NodeBody::Module(info) => Some(info),
            _ => None,
        }
    }

    /// The leaf payload, when this is a leaf/leaf-list node.
    #[must_use]
    pub fn leaf_info(&self) -> Option<&LeafInfo> {
        match &self.body {
            NodeBody::Leaf(info) => Some(info),
            _ => None,
        }
    }

    /// Mutable leaf payload.
    pub fn leaf_info_mut(&mut self) -> Option<&mut LeafInfo> {
        match &mut self.body {
            NodeBody::Leaf(info) => Some(info),
            _ => None,
        }
    }

    /// The uses payload, when this is a uses node.
    #[must_use]
    pub fn uses_info(&self) -> Option<&UsesInfo> {
        match &self.body {
            NodeBody::Uses(info) => Some(info),
            _ => None,
        }
    }

    /// The effective `config` flag declared on this node, if any.
    #[must_use]
    pub fn declared_config(&self) -> Option<bool> {
        match &self.body {
            NodeBody::Container(info) => info.config,
            NodeBody::List(info) => info.config,
            NodeBody::Leaf(info) => info.config,
            NodeBody::Choice(info) => info.config,
            NodeBody::Any(info) => info.config,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_expr(text: &str) -> IfFeatureExpr {
        IfFeatureExpr::parse(text, Span::SYNTHETIC).unwrap()
    }

    #[test]
    fn test_if_feature_single_name() {
        match name_expr("routing") {
            IfFeatureExpr::Name(name) => assert_eq!(name.name, "routing"),
            other => panic!("expected name, got {other:?}"),
        }
    }

    #[test]
    fn test_if_feature_prefixed_name() {
        match name_expr("sys:ntp") {
            IfFeatureExpr::Name(name) => {
                assert_eq!(name.prefix.as_deref(), Some("sys"));
                assert_eq!(name.name, "ntp");
            }
            other => panic!("expected name, got {other:?}"),
        }
    }

    #[test]
    fn test_if_feature_precedence() {
        // "a or b and c" parses as "a or (b and c)"
        match name_expr("a or b and c") {
            IfFeatureExpr::Or(left, right) => {
                assert!(matches!(*left, IfFeatureExpr::Name(_)));
                assert!(matches!(*right, IfFeatureExpr::And(_, _)));
            }
            other => panic!("expected or, got {other:?}"),
        }
    }

    #[test]
    fn test_if_feature_parens_and_not() {
        match name_expr("not (a or b)") {
            IfFeatureExpr::Not(inner) => {
                assert!(matches!(*inner, IfFeatureExpr::Or(_, _)));
            }
            other => panic!("expected not, got {other:?}"),
        }
    }

    #[test]
    fn test_if_feature_malformed() {
        assert!(IfFeatureExpr::parse("a or", Span::SYNTHETIC).is_err());
        assert!(IfFeatureExpr::parse("(a", Span::SYNTHETIC).is_err());
        assert!(IfFeatureExpr::parse("a b", Span::SYNTHETIC).is_err());
        assert!(IfFeatureExpr::parse("", Span::SYNTHETIC).is_err());
    }

    #[test]
    fn test_if_feature_name_collection() {
        let expr = name_expr("a and not (b or c:d)");
        let mut names = Vec::new();
        expr.for_each_name(&mut |n| names.push(n.to_string()));
        assert_eq!(names, vec!["a", "b", "c:d"]);
    }

    #[test]
    fn test_latest_revision() {
        let mut info = ModuleInfo::default();
        assert!(info.latest_revision().is_none());
        for date in ["2016-05-26", "2017-03-10", "2015-01-01"] {
            info.revisions.push(Revision {
                date: date.to_string(),
                description: None,
                reference: None,
                span: Span::SYNTHETIC,
            });
        }
        assert_eq!(info.latest_revision(), Some("2017-03-10"));
    }

    #[test]
    fn test_data_node_classification() {
        assert!(NodeKind::Container.is_data_node());
        assert!(NodeKind::Choice.is_data_node());
        assert!(!NodeKind::Grouping.is_data_node());
        assert!(!NodeKind::Typedef.is_data_node());
        assert!(NodeKind::Leaf.is_terminal());
        assert!(!NodeKind::Container.is_terminal());
    }
}
