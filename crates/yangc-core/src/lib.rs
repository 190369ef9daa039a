//! yangc-core: YANG (RFC 6020/7950) compiler front-end.
//!
//! This crate parses YANG module source into a fully resolved schema tree
//! that serializers and runtime components can query.
//!
//! # Pipeline
//!
//! ```text
//! Source → Lexer → Tokens → Parser → Statement tree → Listener → Schema tree
//!          ^^^^^            ^^^^^^                    ^^^^^^^^
//!          lexer            parser                    listener
//!                                   → Resolver → Resolved tree → SerializerContext
//!                                     ^^^^^^^^                    ^^^^^^^
//!                                     resolver                    context
//! ```
//!
//! - **Lexer** (`lexer`): tokenizes YANG source text
//! - **Parser** (`parser`): builds the generic statement tree (CST)
//! - **Listener** (`listener`): lowers statements into typed schema nodes
//! - **Schema** (`schema`): the arena-based schema tree data model
//! - **Resolver** (`resolver`): links uses/groupings, types, identities,
//!   features and augments across modules
//! - **Context** (`context`): the serializer-facing view with resource-id
//!   lookup
//!
//! # Usage
//!
//! ```no_run
//! use yangc_core::source::{parse_file, CompileOptions};
//! use yangc_core::resolver::resolve_set;
//!
//! let options = CompileOptions::with_search_dirs(["models/"]);
//! let module = parse_file(std::path::Path::new("models/acme.yang"))?;
//! let resolved = resolve_set(vec![module], &options)?;
//! for &root in resolved.modules() {
//!     println!("{}", resolved.tree().name(root));
//! }
//! # Ok::<(), yangc_core::error::CompileErrors>(())
//! ```

pub mod context;
pub mod error;
pub mod lexer;
pub mod listener;
pub mod parser;
pub mod resolver;
pub mod schema;
pub mod source;

use error::CompileErrors;
use resolver::ResolvedTree;
use source::{parse_file, CompileOptions};
use std::path::Path;

/// Parse and resolve a set of YANG files in one call.
///
/// Every file is parsed first so that all syntax and structural errors are
/// reported together; resolution runs only when every file parsed clean.
///
/// # Errors
///
/// Returns the aggregated parse errors, or the first failing resolver
/// phase's errors.
pub fn compile_files<P: AsRef<Path>>(
    paths: &[P],
    options: &CompileOptions,
) -> Result<ResolvedTree, CompileErrors> {
    let mut errors = CompileErrors::new();
    let mut modules = Vec::new();
    for path in paths {
        match parse_file(path.as_ref()) {
            Ok(module) => modules.push(module),
            Err(errs) => errors.errors.extend(errs),
        }
    }
    errors.into_result()?;
    resolver::resolve_set(modules, options)
}
