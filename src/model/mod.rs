//! Block/attribute data model.
//!
//! The tree an external parser hands to the engine:
//!
//! - [`SourceFile`] - one parsed file with its top-level blocks
//! - [`Block`] - a typed, labelled block owning attributes and nested blocks
//! - [`Attribute`] / [`Value`] - a named, polymorphic value
//! - [`SourceRange`] - file and line span for every node
//!
//! Everything here is immutable once built and safe to share across threads.

pub mod attribute;
pub mod block;
pub mod file;
pub mod range;

pub use attribute::{Attribute, Reference, Value};
pub use block::{Block, Walk};
pub use file::SourceFile;
pub use range::SourceRange;
