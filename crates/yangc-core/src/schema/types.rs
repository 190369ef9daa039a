//! YANG type model: built-in types, derived type references, restrictions.

use super::ids::NodeId;
use super::path::{PrefixedName, ResolvableStatus, SchemaPath};
use crate::lexer::Span;
use std::fmt;

/// The RFC 6020/7950 built-in types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Decimal64,
    String,
    Boolean,
    Enumeration,
    Bits,
    Binary,
    Leafref,
    Identityref,
    Empty,
    Union,
    InstanceIdentifier,
}

impl BuiltinType {
    /// Look up a built-in type by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let t = match name {
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint8" => Self::Uint8,
            "uint16" => Self::Uint16,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            "decimal64" => Self::Decimal64,
            "string" => Self::String,
            "boolean" => Self::Boolean,
            "enumeration" => Self::Enumeration,
            "bits" => Self::Bits,
            "binary" => Self::Binary,
            "leafref" => Self::Leafref,
            "identityref" => Self::Identityref,
            "empty" => Self::Empty,
            "union" => Self::Union,
            "instance-identifier" => Self::InstanceIdentifier,
            _ => return None,
        };
        Some(t)
    }

    /// The type's name as written in source.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Decimal64 => "decimal64",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Enumeration => "enumeration",
            Self::Bits => "bits",
            Self::Binary => "binary",
            Self::Leafref => "leafref",
            Self::Identityref => "identityref",
            Self::Empty => "empty",
            Self::Union => "union",
            Self::InstanceIdentifier => "instance-identifier",
        }
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The base of a type: built-in, or a reference to a `typedef`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeRef {
    /// A built-in type.
    Builtin(BuiltinType),
    /// A derived type, resolved to a `typedef` node by the linker.
    Derived(PrefixedName),
}

impl TypeRef {
    /// The resolved `typedef` node, when this is a resolved derived type.
    #[must_use]
    pub fn resolved(&self) -> Option<NodeId> {
        match self {
            Self::Builtin(_) => None,
            Self::Derived(name) => name.resolved,
        }
    }

    /// Resolution state; built-in types are born resolved.
    #[must_use]
    pub fn status(&self) -> ResolvableStatus {
        match self {
            Self::Builtin(_) => ResolvableStatus::Resolved,
            Self::Derived(name) => name.status,
        }
    }
}

/// A named member of an `enumeration` type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumMember {
    /// Member name.
    pub name: String,
    /// Explicit `value`, when declared.
    pub value: Option<i64>,
    /// Member description.
    pub description: Option<String>,
}

/// A named member of a `bits` type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitMember {
    /// Bit name.
    pub name: String,
    /// Explicit `position`, when declared.
    pub position: Option<u32>,
    /// Member description.
    pub description: Option<String>,
}

/// A `type` usage with its restrictions.
///
/// Restriction arguments that the runtime evaluates (`range`, `length`,
/// `pattern`) are carried verbatim; the compiler only resolves names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSpec {
    /// The base type.
    pub base: TypeRef,
    /// `range` restriction, as written.
    pub range: Option<String>,
    /// `length` restriction, as written.
    pub length: Option<String>,
    /// `pattern` restrictions, as written, in source order.
    pub patterns: Vec<String>,
    /// `enum` members (enumeration types).
    pub enums: Vec<EnumMember>,
    /// `bit` members (bits types).
    pub bits: Vec<BitMember>,
    /// `fraction-digits` (decimal64 types).
    pub fraction_digits: Option<u8>,
    /// Member types of a `union`.
    pub union_members: Vec<TypeSpec>,
    /// `path` of a `leafref`, resolved against the final tree.
    pub path: Option<SchemaPath>,
    /// The leaf/leaf-list a `leafref` path resolved to.
    pub path_target: Option<NodeId>,
    /// `require-instance` (leafref / instance-identifier).
    pub require_instance: Option<bool>,
    /// `base` identities of an `identityref`.
    pub identity_bases: Vec<PrefixedName>,
    /// Source span of the `type` statement.
    pub span: Span,
}

impl TypeSpec {
    /// Create a new type spec with no restrictions.
    #[must_use]
    pub fn new(base: TypeRef, span: Span) -> Self {
        Self {
            base,
            range: None,
            length: None,
            patterns: Vec::new(),
            enums: Vec::new(),
            bits: Vec::new(),
            fraction_digits: None,
            union_members: Vec::new(),
            path: None,
            path_target: None,
            require_instance: None,
            identity_bases: Vec::new(),
            span,
        }
    }

    /// Check whether this type (directly) is the built-in `empty`.
    #[must_use]
    pub fn is_empty_type(&self) -> bool {
        matches!(self.base, TypeRef::Builtin(BuiltinType::Empty))
    }
}
