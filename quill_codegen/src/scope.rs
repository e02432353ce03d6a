//! Scoped symbol table.
//!
//! A stack of scope frames, one per lexically entered block, each keyed by
//! the coordinate of the block-opening token. Emission enters a frame when
//! it descends into a block and exits it on the way back out; the two must
//! stay perfectly balanced however emission terminates inside the block.
//!
//! Resolution walks frames innermost-to-outermost and reports the depth of
//! the declaring frame: depth 0 is the global frame (static storage),
//! anything deeper is a function-local (slot storage).

use crate::error::{CodegenError, CodegenResult};
use crate::symbol::{FunctionSig, Symbol};
use quill_ast::{Constant, Span, ValueKind};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// One lexical scope.
#[derive(Debug)]
struct ScopeFrame {
    /// Coordinate of the token that opened the block.
    origin: Span,
    /// Bindings introduced in this block.
    bindings: FxHashMap<Arc<str>, Symbol>,
}

/// Stack of active scopes.
#[derive(Debug, Default)]
pub struct ScopedTable {
    frames: Vec<ScopeFrame>,
}

impl ScopedTable {
    /// Create an empty table with no active scope.
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Number of active scopes.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Enter the scope of the block starting at `at`.
    pub fn enter_scope(&mut self, at: Span) {
        self.frames.push(ScopeFrame {
            origin: at,
            bindings: FxHashMap::default(),
        });
    }

    /// Leave the innermost scope, dropping exactly the bindings it introduced.
    pub fn exit_scope(&mut self) -> CodegenResult<()> {
        self.frames
            .pop()
            .map(|_| ())
            .ok_or_else(|| CodegenError::internal("scope exit without matching enter"))
    }

    /// The augmented name a binding of `name` would get in the innermost
    /// scope: the source name tagged with the scope's origin coordinate,
    /// unique across shadowing scopes.
    fn augment(&self, name: &str) -> CodegenResult<Arc<str>> {
        let frame = self
            .frames
            .last()
            .ok_or_else(|| CodegenError::internal("declaration with no active scope"))?;
        Ok(Arc::from(format!(
            "{name}@{}_{}",
            frame.origin.line, frame.origin.column
        )))
    }

    fn insert(&mut self, symbol: Symbol, at: Span) -> CodegenResult<()> {
        // augment() above already guaranteed a frame exists
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| CodegenError::internal("declaration with no active scope"))?;
        if frame.bindings.contains_key(&symbol.name) {
            return Err(CodegenError::DuplicateSymbol {
                name: symbol.name.to_string(),
                line: at.line,
                column: at.column,
            });
        }
        frame.bindings.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Declare a variable in the innermost scope.
    ///
    /// Returns the augmented name under which its slot is registered.
    pub fn declare_var(
        &mut self,
        name: &str,
        kind: ValueKind,
        folded: Option<Constant>,
        at: Span,
    ) -> CodegenResult<Arc<str>> {
        let augmented = self.augment(name)?;
        let symbol = match folded {
            Some(value) => Symbol::var_folded(name, augmented.clone(), kind, value),
            None => Symbol::var(name, augmented.clone(), kind),
        };
        self.insert(symbol, at)?;
        Ok(augmented)
    }

    /// Declare a function in the innermost scope.
    pub fn declare_function(
        &mut self,
        name: &str,
        sig: FunctionSig,
        at: Span,
    ) -> CodegenResult<()> {
        self.insert(Symbol::function(name, sig), at)
    }

    /// Look up `name`, innermost scope first.
    ///
    /// Returns the symbol and the depth of its declaring frame
    /// (0 = global frame).
    pub fn lookup(&self, name: &str) -> Option<(&Symbol, usize)> {
        for (depth, frame) in self.frames.iter().enumerate().rev() {
            if let Some(symbol) = frame.bindings.get(name) {
                return Some((symbol, depth));
            }
        }
        None
    }

    /// Resolve `name` or fail with an `UnresolvedSymbol` diagnostic at `at`.
    pub fn resolve(&self, name: &str, at: Span) -> CodegenResult<(&Symbol, usize)> {
        self.lookup(name).ok_or_else(|| CodegenError::UnresolvedSymbol {
            name: name.to_string(),
            line: at.line,
            column: at.column,
        })
    }
}
