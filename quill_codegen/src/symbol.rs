//! Symbol definitions.
//!
//! Symbols arrive from the static checker: every declaration has a resolved
//! value kind, and function symbols carry their full signature. The code
//! generator only queries them; it never re-validates.

use quill_ast::{Constant, ValueKind};
use std::sync::Arc;

/// A declared symbol.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// The source name.
    pub name: Arc<str>,
    /// Disambiguated name, unique across shadowing scopes.
    /// Used as the local-slot lookup key.
    pub augmented: Arc<str>,
    /// What the symbol is.
    pub kind: SymbolKind,
}

impl Symbol {
    /// Create a variable symbol.
    pub fn var(name: impl Into<Arc<str>>, augmented: impl Into<Arc<str>>, value: ValueKind) -> Self {
        Self {
            name: name.into(),
            augmented: augmented.into(),
            kind: SymbolKind::Var {
                value,
                folded: None,
            },
        }
    }

    /// Create a variable symbol with a checker-folded initial value.
    pub fn var_folded(
        name: impl Into<Arc<str>>,
        augmented: impl Into<Arc<str>>,
        value: ValueKind,
        folded: Constant,
    ) -> Self {
        Self {
            name: name.into(),
            augmented: augmented.into(),
            kind: SymbolKind::Var {
                value,
                folded: Some(folded),
            },
        }
    }

    /// Create a function symbol.
    pub fn function(name: impl Into<Arc<str>>, sig: FunctionSig) -> Self {
        let name = name.into();
        Self {
            augmented: name.clone(),
            name,
            kind: SymbolKind::Function(sig),
        }
    }

    /// The value kind this symbol produces when referenced in an expression.
    pub fn value_kind(&self) -> ValueKind {
        match &self.kind {
            SymbolKind::Var { value, .. } => *value,
            SymbolKind::Function(sig) => sig.returns,
        }
    }
}

/// What a symbol denotes.
#[derive(Debug, Clone)]
pub enum SymbolKind {
    /// A variable.
    Var {
        /// Declared value kind.
        value: ValueKind,
        /// Constant initial value, when the checker folded one.
        folded: Option<Constant>,
    },
    /// A declared function.
    Function(FunctionSig),
}

/// A function signature.
#[derive(Debug, Clone)]
pub struct FunctionSig {
    /// Parameters in declaration order.
    pub params: Vec<(Arc<str>, ValueKind)>,
    /// Declared return kind.
    pub returns: ValueKind,
}

impl FunctionSig {
    /// Create a new signature.
    pub fn new(params: Vec<(Arc<str>, ValueKind)>, returns: ValueKind) -> Self {
        Self { params, returns }
    }
}
