//! Mixfix front end
//!
//! Leaf-first:
//!
//! - [`category`]: tightness categories and their partial order
//! - [`registry`]: operator declarations, scopes, snapshots
//! - [`grammar`]: a snapshot compiled for parsing
//! - [`parser`]: chart parser producing [`tree::ParseNode`]s or errors
//! - [`chain`]: folds runs of chained relations
//! - [`session`]: directive units and batch parsing

pub mod category;
pub(crate) mod chain;
pub mod grammar;
pub mod parser;
pub mod registry;
pub mod session;
pub mod tokens;
pub mod tree;
