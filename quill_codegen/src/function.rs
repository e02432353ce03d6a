//! Function-level emitter.
//!
//! One `FunctionEmitter` owns the generation context of a single body: the
//! body builder, the loop-context stack, and the delegation stack that
//! routes each statement to whichever construct currently owns its kind.
//! It never outlives the function it emits; every body gets a fresh one.

use crate::builtins::{BuiltinRegistry, UnitContext};
use crate::bytecode::{BodyBuilder, CompiledBody, FuncIndex, GlobalIndex, Label};
use crate::dispatch::{CategorySet, DelegationStack, Owner, OwnerToken, StmtCategory};
use crate::error::{CodegenError, CodegenResult};
use crate::scope::ScopedTable;
use crate::symbol::{FunctionSig, SymbolKind};
use quill_ast::{Block, Constant, Param, Stmt, StmtKind, ValueKind};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, trace};

/// Global field name to storage index and kind.
pub(crate) type GlobalMap = FxHashMap<Arc<str>, (GlobalIndex, ValueKind)>;

/// Function name to call index and signature.
pub(crate) type FunctionMap = FxHashMap<Arc<str>, (FuncIndex, FunctionSig)>;

/// Unit-level lookup environment shared by every function emitter.
#[derive(Clone, Copy)]
pub(crate) struct EmitEnv<'a> {
    /// Allocated global storage.
    pub globals: &'a GlobalMap,
    /// Declared functions.
    pub functions: &'a FunctionMap,
    /// Builtin resolver.
    pub builtins: &'a BuiltinRegistry,
    /// Ambient invocation parameters for builtins that need them.
    pub unit: UnitContext<'a>,
}

/// Jump targets of one active loop.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LoopContext {
    /// Target of `break`: the loop's exit label.
    pub break_label: Label,
    /// Target of `continue`: the loop's guard label.
    pub continue_label: Label,
}

/// Stack-allocated loop context stack for typical nesting depths.
type LoopStack = SmallVec<[LoopContext; 4]>;

/// Emitter for one function body.
pub struct FunctionEmitter<'a> {
    pub(crate) builder: BodyBuilder,
    pub(crate) table: &'a mut ScopedTable,
    pub(crate) env: EmitEnv<'a>,
    /// Active construct ownership; the function itself is the bottom frame.
    pub(crate) dispatch: DelegationStack,
    /// Active loops, innermost last. Indexed by `Owner::Loop` frames.
    pub(crate) loop_stack: LoopStack,
    returns: ValueKind,
    /// Whether a trailing return must be synthesised when the body does not
    /// end in one. Set once at construction: only valueless functions get one.
    synth_return: bool,
    own_token: Option<OwnerToken>,
}

impl<'a> FunctionEmitter<'a> {
    /// Create an emitter for a body with the given name and return kind.
    pub(crate) fn new(
        name: &str,
        returns: ValueKind,
        table: &'a mut ScopedTable,
        env: EmitEnv<'a>,
    ) -> Self {
        let mut dispatch = DelegationStack::new();
        let own_token = Some(dispatch.push(Owner::Function, CategorySet::ALL));
        Self {
            builder: BodyBuilder::new(name, returns),
            table,
            env,
            dispatch,
            loop_stack: LoopStack::new(),
            returns,
            synth_return: returns == ValueKind::Void,
            own_token,
        }
    }

    /// Bind each parameter to the slot matching its declaration order.
    ///
    /// Every value kind occupies exactly one slot, so slot numbers are
    /// simply 0..N-1.
    pub(crate) fn register_arguments(&mut self, params: &[Param]) -> CodegenResult<()> {
        for (position, param) in params.iter().enumerate() {
            let augmented =
                self.table
                    .declare_var(&param.name, param.kind, None, Default::default())?;
            let slot = self.builder.define_local(augmented, param.kind);
            debug_assert_eq!(slot.index(), position);
        }
        self.builder.set_param_count(params.len() as u16);
        Ok(())
    }

    /// Emit the whole body: parameters, statements, and the synthesised
    /// trailing return when the declared kind is valueless.
    pub(crate) fn emit_body(&mut self, params: &[Param], body: &Block) -> CodegenResult<()> {
        self.table.enter_scope(body.span);
        let result = self
            .register_arguments(params)
            .and_then(|()| body.body.iter().try_for_each(|stmt| self.emit_stmt(stmt)));
        self.table.exit_scope()?;
        result?;

        if self.synth_return && !self.builder.ends_with_return() {
            trace!("synthesising trailing return");
            self.builder.emit_return();
        }
        Ok(())
    }

    /// Finalise the body.
    pub(crate) fn finish(mut self) -> CodegenResult<CompiledBody> {
        if let Some(token) = self.own_token.take() {
            self.dispatch.pop(token)?;
        }
        debug!(returns = %self.returns, "function body finished");
        self.builder.finish()
    }

    // =========================================================================
    // Statement Emission
    // =========================================================================

    /// Emit one statement through the delegation stack.
    pub(crate) fn emit_stmt(&mut self, stmt: &Stmt) -> CodegenResult<()> {
        self.builder.set_line(stmt.span.line);
        let category = StmtCategory::of(&stmt.kind);
        trace!(?category, at = %stmt.span, "emit statement");

        match self.dispatch.owner_for(category) {
            Some(Owner::Loop(index)) => self.emit_loop_owned(stmt, index),
            _ => self.emit_function_owned(stmt),
        }
    }

    /// Handle a statement intercepted by an active loop.
    fn emit_loop_owned(&mut self, stmt: &Stmt, index: usize) -> CodegenResult<()> {
        let ctx = self.loop_stack[index];
        match stmt.kind {
            StmtKind::Break => {
                self.builder.emit_jump(ctx.break_label);
                Ok(())
            }
            StmtKind::Continue => {
                self.builder.emit_jump(ctx.continue_label);
                Ok(())
            }
            // Loops claim only break/continue.
            _ => Err(CodegenError::internal(
                "loop received a statement kind it never claimed",
            )),
        }
    }

    /// Handle a statement with the function as its owner.
    fn emit_function_owned(&mut self, stmt: &Stmt) -> CodegenResult<()> {
        match &stmt.kind {
            StmtKind::Decl {
                name, kind, init, ..
            } => {
                let augmented = self.table.declare_var(name, *kind, None, stmt.span)?;
                let slot = self.builder.define_local(augmented, *kind);
                match init {
                    Some(expr) => self.emit_expr(expr, *kind)?,
                    None => {
                        // Declared-but-unassigned storage starts at the
                        // kind's default value.
                        match kind.default_value() {
                            Some(value) => self.emit_const(&value),
                            None => {
                                return Err(CodegenError::internal(
                                    "declaration of a valueless kind",
                                ))
                            }
                        }
                    }
                }
                self.builder.emit_store_local(slot);
                Ok(())
            }

            StmtKind::Assign { name, value } => {
                let (symbol, depth) = self.table.resolve(name, stmt.span)?;
                if matches!(symbol.kind, SymbolKind::Function(_)) {
                    return Err(CodegenError::internal("assignment to a function symbol"));
                }
                let kind = symbol.value_kind();
                let target_name = symbol.name.clone();
                let augmented = symbol.augmented.clone();

                self.emit_expr(value, kind)?;
                if depth == 0 {
                    let index = self.global_index(&target_name)?;
                    self.builder.emit_store_global(index);
                } else {
                    let slot = self.builder.local_slot(&augmented)?;
                    self.builder.emit_store_local(slot);
                }
                Ok(())
            }

            StmtKind::Expr(expr) => self.emit_expr_stmt(expr),

            StmtKind::Return(value) => {
                if self.returns == ValueKind::Void {
                    self.builder.emit_return();
                } else {
                    match value {
                        Some(expr) => {
                            self.emit_expr(expr, self.returns)?;
                            self.builder.emit_return_value();
                        }
                        // A valueless return in a valued function is the
                        // checker's miss; close the path anyway.
                        None => self.builder.emit_return(),
                    }
                }
                Ok(())
            }

            StmtKind::If { arms, else_body } => self.emit_if(arms, else_body.as_ref()),

            StmtKind::While { cond, body } => self.emit_while(cond, body),

            StmtKind::Break => Err(CodegenError::OutsideLoop {
                what: "break",
                line: stmt.span.line,
                column: stmt.span.column,
            }),

            StmtKind::Continue => Err(CodegenError::OutsideLoop {
                what: "continue",
                line: stmt.span.line,
                column: stmt.span.column,
            }),

            StmtKind::FunctionDef { .. } => Err(CodegenError::internal(
                "function definition below unit level",
            )),
        }
    }

    /// Emit a block, entering and leaving its scope in balance however
    /// emission terminates inside it.
    pub(crate) fn emit_block(&mut self, block: &Block) -> CodegenResult<()> {
        self.table.enter_scope(block.span);
        let result = block.body.iter().try_for_each(|stmt| self.emit_stmt(stmt));
        self.table.exit_scope()?;
        result
    }

    /// Evaluate a non-constant global initialiser at the top of the entry
    /// body.
    pub(crate) fn emit_global_init(
        &mut self,
        index: GlobalIndex,
        kind: ValueKind,
        expr: &quill_ast::Expr,
    ) -> CodegenResult<()> {
        self.emit_expr(expr, kind)?;
        self.builder.emit_store_global(index);
        Ok(())
    }

    /// Push a constant of any kind.
    pub(crate) fn emit_const(&mut self, value: &Constant) {
        match value {
            Constant::Int(v) => self.builder.emit_push_int(*v),
            Constant::Bool(v) => self.builder.emit_push_bool(*v),
            Constant::Str(v) => self.builder.emit_push_str(v),
        }
    }

    /// Storage index of an allocated global field.
    pub(crate) fn global_index(&self, name: &str) -> CodegenResult<GlobalIndex> {
        self.env
            .globals
            .get(name)
            .map(|(index, _)| *index)
            .ok_or_else(|| {
                CodegenError::internal(format!("global storage for '{name}' was never allocated"))
            })
    }
}
