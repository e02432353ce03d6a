//! # Quill AST
//!
//! Type-checked syntax tree for the Quill language, as consumed by the
//! code-generation backend.

#![warn(missing_docs)]

pub mod ast;
pub mod span;

pub use ast::*;
pub use span::Span;
