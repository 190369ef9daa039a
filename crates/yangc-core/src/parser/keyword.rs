//! YANG statement keywords.

/// The YANG statement keywords understood by this compiler.
///
/// Unrecognized unprefixed keywords are parse errors; prefixed keywords are
/// extension statements and are carried through the statement tree verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StmtKind {
    Module,
    Submodule,
    YangVersion,
    Namespace,
    Prefix,
    Import,
    Include,
    Revision,
    RevisionDate,
    BelongsTo,
    Organization,
    Contact,
    Description,
    Reference,
    Status,
    Container,
    List,
    Leaf,
    LeafList,
    Choice,
    Case,
    Grouping,
    Uses,
    Augment,
    Typedef,
    Type,
    Identity,
    Base,
    Feature,
    IfFeature,
    Rpc,
    Action,
    Input,
    Output,
    Notification,
    Anyxml,
    Anydata,
    Key,
    Unique,
    Config,
    Mandatory,
    Presence,
    Default,
    Units,
    MinElements,
    MaxElements,
    OrderedBy,
    Must,
    ErrorMessage,
    ErrorAppTag,
    When,
    Refine,
    Path,
    RequireInstance,
    Range,
    Length,
    Pattern,
    Enum,
    Value,
    Bit,
    Position,
    FractionDigits,
    Extension,
    Argument,
}

impl StmtKind {
    /// The keyword text as it appears in source.
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Submodule => "submodule",
            Self::YangVersion => "yang-version",
            Self::Namespace => "namespace",
            Self::Prefix => "prefix",
            Self::Import => "import",
            Self::Include => "include",
            Self::Revision => "revision",
            Self::RevisionDate => "revision-date",
            Self::BelongsTo => "belongs-to",
            Self::Organization => "organization",
            Self::Contact => "contact",
            Self::Description => "description",
            Self::Reference => "reference",
            Self::Status => "status",
            Self::Container => "container",
            Self::List => "list",
            Self::Leaf => "leaf",
            Self::LeafList => "leaf-list",
            Self::Choice => "choice",
            Self::Case => "case",
            Self::Grouping => "grouping",
            Self::Uses => "uses",
            Self::Augment => "augment",
            Self::Typedef => "typedef",
            Self::Type => "type",
            Self::Identity => "identity",
            Self::Base => "base",
            Self::Feature => "feature",
            Self::IfFeature => "if-feature",
            Self::Rpc => "rpc",
            Self::Action => "action",
            Self::Input => "input",
            Self::Output => "output",
            Self::Notification => "notification",
            Self::Anyxml => "anyxml",
            Self::Anydata => "anydata",
            Self::Key => "key",
            Self::Unique => "unique",
            Self::Config => "config",
            Self::Mandatory => "mandatory",
            Self::Presence => "presence",
            Self::Default => "default",
            Self::Units => "units",
            Self::MinElements => "min-elements",
            Self::MaxElements => "max-elements",
            Self::OrderedBy => "ordered-by",
            Self::Must => "must",
            Self::ErrorMessage => "error-message",
            Self::ErrorAppTag => "error-app-tag",
            Self::When => "when",
            Self::Refine => "refine",
            Self::Path => "path",
            Self::RequireInstance => "require-instance",
            Self::Range => "range",
            Self::Length => "length",
            Self::Pattern => "pattern",
            Self::Enum => "enum",
            Self::Value => "value",
            Self::Bit => "bit",
            Self::Position => "position",
            Self::FractionDigits => "fraction-digits",
            Self::Extension => "extension",
            Self::Argument => "argument",
        }
    }
}

/// Look up a statement keyword by its source text.
#[must_use]
pub fn lookup_keyword(text: &str) -> Option<StmtKind> {
    let kind = match text {
        "module" => StmtKind::Module,
        "submodule" => StmtKind::Submodule,
        "yang-version" => StmtKind::YangVersion,
        "namespace" => StmtKind::Namespace,
        "prefix" => StmtKind::Prefix,
        "import" => StmtKind::Import,
        "include" => StmtKind::Include,
        "revision" => StmtKind::Revision,
        "revision-date" => StmtKind::RevisionDate,
        "belongs-to" => StmtKind::BelongsTo,
        "organization" => StmtKind::Organization,
        "contact" => StmtKind::Contact,
        "description" => StmtKind::Description,
        "reference" => StmtKind::Reference,
        "status" => StmtKind::Status,
        "container" => StmtKind::Container,
        "list" => StmtKind::List,
        "leaf" => StmtKind::Leaf,
        "leaf-list" => StmtKind::LeafList,
        "choice" => StmtKind::Choice,
        "case" => StmtKind::Case,
        "grouping" => StmtKind::Grouping,
        "uses" => StmtKind::Uses,
        "augment" => StmtKind::Augment,
        "typedef" => StmtKind::Typedef,
        "type" => StmtKind::Type,
        "identity" => StmtKind::Identity,
        "base" => StmtKind::Base,
        "feature" => StmtKind::Feature,
        "if-feature" => StmtKind::IfFeature,
        "rpc" => StmtKind::Rpc,
        "action" => StmtKind::Action,
        "input" => StmtKind::Input,
        "output" => StmtKind::Output,
        "notification" => StmtKind::Notification,
        "anyxml" => StmtKind::Anyxml,
        "anydata" => StmtKind::Anydata,
        "key" => StmtKind::Key,
        "unique" => StmtKind::Unique,
        "config" => StmtKind::Config,
        "mandatory" => StmtKind::Mandatory,
        "presence" => StmtKind::Presence,
        "default" => StmtKind::Default,
        "units" => StmtKind::Units,
        "min-elements" => StmtKind::MinElements,
        "max-elements" => StmtKind::MaxElements,
        "ordered-by" => StmtKind::OrderedBy,
        "must" => StmtKind::Must,
        "error-message" => StmtKind::ErrorMessage,
        "error-app-tag" => StmtKind::ErrorAppTag,
        "when" => StmtKind::When,
        "refine" => StmtKind::Refine,
        "path" => StmtKind::Path,
        "require-instance" => StmtKind::RequireInstance,
        "range" => StmtKind::Range,
        "length" => StmtKind::Length,
        "pattern" => StmtKind::Pattern,
        "enum" => StmtKind::Enum,
        "value" => StmtKind::Value,
        "bit" => StmtKind::Bit,
        "position" => StmtKind::Position,
        "fraction-digits" => StmtKind::FractionDigits,
        "extension" => StmtKind::Extension,
        "argument" => StmtKind::Argument,
        _ => return None,
    };
    Some(kind)
}
