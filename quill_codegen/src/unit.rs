//! Unit-level emitter.
//!
//! Lowers one checked program to a [`CompiledUnit`] in two passes. The
//! first pass walks the top level and allocates: every declaration becomes
//! a global field, every function definition gets a call index in
//! declaration order. The second pass emits function bodies, then wraps
//! the remaining top-level statements in a synthesised valueless entry
//! body, prefixed with the non-constant global initialisers.

use crate::builtins::{BuiltinRegistry, UnitContext};
use crate::bytecode::{CompiledBody, CompiledUnit, FuncIndex, GlobalField, GlobalIndex};
use crate::error::{CodegenError, CodegenResult};
use crate::function::{EmitEnv, FunctionEmitter, FunctionMap, GlobalMap};
use crate::scope::ScopedTable;
use crate::symbol::FunctionSig;
use quill_ast::{Block, Expr, Param, Program, Stmt, StmtKind, ValueKind};
use std::sync::Arc;
use tracing::{debug, info};

/// Name of the synthesised entry body.
pub const ENTRY_NAME: &str = "<main>";

/// Emitter for one translation unit.
pub struct UnitEmitter {
    name: Arc<str>,
    source: Arc<str>,
}

struct FunctionItem<'a> {
    name: &'a str,
    params: &'a [Param],
    returns: ValueKind,
    body: &'a Block,
}

impl UnitEmitter {
    /// Create an emitter for the unit generated from `source`, naming the
    /// unit after the source file.
    pub fn new(source: &str) -> Self {
        Self {
            name: Arc::from(unit_name_from_source(source)),
            source: Arc::from(source),
        }
    }

    /// The unit name the emitted artifact will carry.
    pub fn unit_name(&self) -> &str {
        &self.name
    }

    /// Generate the unit. Fails fast: the first error aborts the unit.
    pub fn emit(&self, program: &Program) -> CodegenResult<CompiledUnit> {
        let mut table = ScopedTable::new();
        let builtins = BuiltinRegistry::new();

        // The global frame stays open for the whole unit; every body's
        // depth-0 resolutions land here.
        table.enter_scope(program.span);

        let mut globals = GlobalMap::default();
        let mut fields: Vec<GlobalField> = Vec::new();
        // Initialisers the checker could not fold run at the top of the
        // entry body, in declaration order.
        let mut preludes: Vec<(GlobalIndex, ValueKind, &Expr)> = Vec::new();

        let mut functions = FunctionMap::default();
        let mut items: Vec<FunctionItem<'_>> = Vec::new();
        let mut top_level: Vec<&Stmt> = Vec::new();

        for stmt in &program.body {
            match &stmt.kind {
                StmtKind::Decl {
                    name,
                    kind,
                    init,
                    folded,
                } => {
                    table.declare_var(name, *kind, folded.clone(), stmt.span)?;
                    let index = GlobalIndex::new(fields.len() as u16);
                    let name: Arc<str> = Arc::from(name.as_str());
                    globals.insert(name.clone(), (index, *kind));
                    fields.push(GlobalField {
                        name,
                        kind: *kind,
                        init: folded.clone(),
                    });
                    if folded.is_none() {
                        if let Some(expr) = init {
                            preludes.push((index, *kind, expr));
                        }
                    }
                }

                StmtKind::FunctionDef {
                    name,
                    params,
                    returns,
                    body,
                } => {
                    let sig = FunctionSig::new(
                        params
                            .iter()
                            .map(|p| (Arc::from(p.name.as_str()), p.kind))
                            .collect(),
                        *returns,
                    );
                    table.declare_function(name, sig.clone(), stmt.span)?;
                    let index = FuncIndex::new(items.len() as u16);
                    functions.insert(Arc::from(name.as_str()), (index, sig));
                    items.push(FunctionItem {
                        name,
                        params,
                        returns: *returns,
                        body,
                    });
                }

                _ => top_level.push(stmt),
            }
        }
        debug!(
            unit = %self.name,
            globals = fields.len(),
            functions = items.len(),
            "unit layout allocated"
        );

        let env = EmitEnv {
            globals: &globals,
            functions: &functions,
            builtins: &builtins,
            unit: UnitContext {
                unit_name: &self.name,
            },
        };

        let mut bodies: Vec<CompiledBody> = Vec::with_capacity(items.len() + 1);
        for item in &items {
            let mut emitter = FunctionEmitter::new(item.name, item.returns, &mut table, env);
            emitter.emit_body(item.params, item.body)?;
            bodies.push(emitter.finish()?);
        }

        let entry = if top_level.is_empty() && preludes.is_empty() {
            None
        } else {
            let mut emitter = FunctionEmitter::new(ENTRY_NAME, ValueKind::Void, &mut table, env);
            for (index, kind, expr) in &preludes {
                emitter.builder.set_line(expr.span.line);
                emitter.emit_global_init(*index, *kind, expr)?;
            }
            let entry_block = Block {
                body: top_level.into_iter().cloned().collect(),
                span: program.span,
            };
            emitter.emit_body(&[], &entry_block)?;
            let index = bodies.len() as u16;
            bodies.push(emitter.finish()?);
            Some(index)
        };

        table.exit_scope()?;
        if table.depth() != 0 {
            return Err(CodegenError::internal("unbalanced scopes after unit"));
        }

        info!(unit = %self.name, bodies = bodies.len(), "unit generated");
        Ok(CompiledUnit {
            name: self.name.clone(),
            source: self.source.clone(),
            globals: fields.into_boxed_slice(),
            functions: bodies.into_boxed_slice(),
            entry,
        })
    }
}

/// Derive the externally visible unit name from a source identifier:
/// strip any directory prefix, split the file name on dots, and title-case
/// each piece. `out/hello.ql` becomes `HelloQl`.
pub fn unit_name_from_source(source: &str) -> String {
    let file = source
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source);
    let mut name = String::with_capacity(file.len());
    for piece in file.split('.').filter(|p| !p.is_empty()) {
        let mut chars = piece.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }
    name
}
