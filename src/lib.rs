//! mixfix: a user-extensible operator engine
//!
//! Operators are declared at run time with arbitrary mixfix forms and
//! grouped into tightness categories that form a partial order. The parser
//! then either finds the single reading of an expression or explains why
//! there is none (or more than one). Runs of chainable relations such as
//! `a < b <= c` fold into a single chain node.
//!
//! # Example
//!
//! ```
//! use mixfix::frontend::parser::{parse, ParseOptions};
//! use mixfix::frontend::registry::{CategoryDeclaration, OperatorDefinition, Registry, ScopeId};
//! use mixfix::frontend::tokens::from_words;
//!
//! let mut registry = Registry::new();
//! registry.declare_category(CategoryDeclaration::new("Add")).unwrap();
//! registry
//!     .declare_category(CategoryDeclaration::new("Mul").tighter_than(["Add"]))
//!     .unwrap();
//! registry
//!     .declare_operator(OperatorDefinition::from_notation("plus", "$a + $b").unwrap(), "Add")
//!     .unwrap();
//! registry
//!     .declare_operator(OperatorDefinition::from_notation("times", "$a * $b").unwrap(), "Mul")
//!     .unwrap();
//! registry.import_operator(ScopeId::ROOT, "plus").unwrap();
//! registry.import_operator(ScopeId::ROOT, "times").unwrap();
//!
//! let snapshot = registry.snapshot();
//! let tree = parse(
//!     &from_words("a + b * c"),
//!     &snapshot.grammar(),
//!     ScopeId::ROOT,
//!     &ParseOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(tree.sexp(&snapshot).to_string(), "(plus a (times b c))");
//! ```

#![warn(rust_2018_idioms)]

pub mod frontend;
pub mod util;

// Re-exports
pub use frontend::parser::{parse, Competitor, ParseError, ParseOptions};
pub use frontend::registry::{
    CategoryDeclaration, OperatorDefinition, Registry, RegistryError, ScopeId, Snapshot,
};
pub use frontend::session::{Directive, Session, UnitSource};
pub use frontend::tree::ParseNode;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Display name
pub const NAME: &str = "mixfix";
