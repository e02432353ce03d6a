//! Call-site emitter.
//!
//! User functions shadow builtins: a declared function named like a
//! builtin wins the lookup. Builtins resolve by name and exact argument
//! kinds, so `putout` lands on a different operation per argument kind.

use crate::error::{CodegenError, CodegenResult};
use crate::function::FunctionEmitter;
use quill_ast::{Expr, Span, ValueKind};
use tracing::trace;

impl FunctionEmitter<'_> {
    /// Emit a call, arguments left-to-right, and report the kind the call
    /// leaves on the stack.
    pub(crate) fn emit_call_expr(
        &mut self,
        name: &str,
        args: &[Expr],
        at: Span,
    ) -> CodegenResult<ValueKind> {
        let env = self.env;

        if let Some((index, sig)) = env.functions.get(name) {
            trace!(callee = name, "user function call");
            for (arg, (_, kind)) in args.iter().zip(sig.params.iter()) {
                self.emit_expr(arg, *kind)?;
            }
            self.builder.emit_call(*index, sig.params.len(), sig.returns);
            return Ok(sig.returns);
        }

        let kinds = self.arg_kinds(args)?;
        let descriptor =
            env.builtins
                .resolve(name, &kinds)
                .ok_or_else(|| CodegenError::UnknownBuiltin {
                    name: name.to_string(),
                    line: at.line,
                    column: at.column,
                })?;

        for (arg, kind) in args.iter().zip(descriptor.params.iter()) {
            self.emit_expr(arg, *kind)?;
        }

        // A context-carrying builtin takes the unit name as a hidden
        // trailing argument, pushed here so the channel is visible in
        // the instruction stream.
        let mut pops = descriptor.params.len();
        if descriptor.needs_unit_context {
            self.builder.emit_push_str(env.unit.unit_name);
            pops += 1;
        }

        self.builder
            .emit_call_builtin(descriptor.id, pops, descriptor.returns);
        Ok(descriptor.returns)
    }

    /// The kind a call to `name` with `args` produces, without emitting.
    pub(crate) fn call_kind(&self, name: &str, args: &[Expr], at: Span) -> CodegenResult<ValueKind> {
        if let Some((_, sig)) = self.env.functions.get(name) {
            return Ok(sig.returns);
        }
        let kinds = self.arg_kinds(args)?;
        self.env
            .builtins
            .resolve(name, &kinds)
            .map(|descriptor| descriptor.returns)
            .ok_or_else(|| CodegenError::UnknownBuiltin {
                name: name.to_string(),
                line: at.line,
                column: at.column,
            })
    }

    fn arg_kinds(&self, args: &[Expr]) -> CodegenResult<Vec<ValueKind>> {
        args.iter().map(|arg| self.expr_kind(arg)).collect()
    }
}
