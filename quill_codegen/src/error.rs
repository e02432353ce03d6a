//! Code-generation errors.
//!
//! Every error is fatal for the unit being generated: there is no recovery
//! and no partially generated unit. Variants split into two classes:
//! source-level diagnostics (constructs the checker should have rejected,
//! reported with their coordinate) and internal invariant violations
//! (the generator was driven outside its documented precondition).

use thiserror::Error;

/// A fatal code-generation error.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CodegenError {
    /// A name was declared twice in the same scope.
    #[error("{line}:{column}: symbol '{name}' is already declared in this scope")]
    DuplicateSymbol {
        /// The redeclared name.
        name: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (0-indexed).
        column: u32,
    },

    /// A name could not be resolved in any active scope.
    #[error("{line}:{column}: unresolved symbol '{name}'")]
    UnresolvedSymbol {
        /// The unresolved name.
        name: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (0-indexed).
        column: u32,
    },

    /// Operands of a comparison have mismatched or non-comparable kinds.
    #[error("{line}:{column}: cannot compare {lhs} with {rhs}")]
    InvalidComparison {
        /// Kind of the left operand.
        lhs: &'static str,
        /// Kind of the right operand.
        rhs: &'static str,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (0-indexed).
        column: u32,
    },

    /// A call site matched no user function and no builtin overload.
    #[error("{line}:{column}: no function or builtin matches '{name}'")]
    UnknownBuiltin {
        /// The callee name.
        name: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (0-indexed).
        column: u32,
    },

    /// `break` or `continue` reached emission with no enclosing loop.
    #[error("{line}:{column}: '{what}' outside loop")]
    OutsideLoop {
        /// `"break"` or `"continue"`.
        what: &'static str,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (0-indexed).
        column: u32,
    },

    /// A local slot was demanded for a name that was never registered.
    #[error("internal error: invalid local variable '{name}' demanded")]
    UnknownLocal {
        /// The augmented name that missed the slot map.
        name: String,
    },

    /// A body was finalised while a label was still unbound.
    #[error("internal error: label {id} was never bound")]
    UnboundLabel {
        /// Label id.
        id: u32,
    },

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CodegenError {
    /// Shorthand for an [`CodegenError::Internal`] with a formatted message.
    pub fn internal(message: impl Into<String>) -> Self {
        CodegenError::Internal(message.into())
    }

    /// Whether this error reports an internal invariant violation rather
    /// than a source-level problem that escaped checking.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CodegenError::UnknownLocal { .. }
                | CodegenError::UnboundLabel { .. }
                | CodegenError::Internal(_)
        )
    }
}

/// Result type for code generation.
pub type CodegenResult<T> = Result<T, CodegenError>;
