//! Text expression emitter.

use crate::error::CodegenResult;
use crate::function::FunctionEmitter;
use quill_ast::{BinOp, Expr, ExprKind};
use tracing::trace;

impl FunctionEmitter<'_> {
    /// Emit `expr`, leaving one string on the stack.
    ///
    /// Concatenation lowers to the accumulator pattern: allocate, append
    /// left, append right, finalise. This is the only place two-step
    /// construction happens.
    pub(crate) fn emit_str_expr(&mut self, expr: &Expr) -> CodegenResult<()> {
        match &expr.kind {
            ExprKind::Str(value) => {
                self.builder.emit_push_str(value);
                Ok(())
            }

            ExprKind::Name(name) => self.emit_name_load(name, expr.span).map(|_| ()),

            ExprKind::Binary {
                op: BinOp::Add,
                left,
                right,
            } => {
                self.builder.emit_accum_new();
                self.emit_str_expr(left)?;
                self.builder.emit_accum_push();
                self.emit_str_expr(right)?;
                self.builder.emit_accum_push();
                self.builder.emit_accum_finish();
                Ok(())
            }

            ExprKind::Call { name, args } => {
                self.emit_call_expr(name, args, expr.span).map(|_| ())
            }

            // Not a text node; the checker gates this path.
            _ => {
                trace!(at = %expr.span, "non-text node reached the text emitter");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bytecode::Instruction;
    use crate::testutil::{compile_entry, str_global};
    use quill_ast::{BinOp, Expr, Span, Stmt, StmtKind};

    #[test]
    fn test_concat_uses_accumulator_pattern() {
        let span = Span::new(2, 0);
        let value = Expr::binary(
            BinOp::Add,
            Expr::str("foo", span),
            Expr::str("bar", span),
            span,
        );
        let body = compile_entry(vec![
            str_global("g", span),
            Stmt::new(
                StmtKind::Assign {
                    name: "g".to_string(),
                    value,
                },
                span,
            ),
        ]);

        let shapes: Vec<&Instruction> = body
            .instructions
            .iter()
            .filter(|i| {
                matches!(
                    i,
                    Instruction::NewAccum | Instruction::AccumPush | Instruction::AccumFinish
                )
            })
            .collect();
        assert_eq!(
            shapes,
            vec![
                &Instruction::NewAccum,
                &Instruction::AccumPush,
                &Instruction::AccumPush,
                &Instruction::AccumFinish,
            ]
        );
    }

    #[test]
    fn test_string_pool_deduplicates_literals() {
        let span = Span::new(2, 0);
        let value = Expr::binary(
            BinOp::Add,
            Expr::str("dup", span),
            Expr::str("dup", span),
            span,
        );
        let body = compile_entry(vec![
            str_global("g", span),
            Stmt::new(
                StmtKind::Assign {
                    name: "g".to_string(),
                    value,
                },
                span,
            ),
        ]);
        assert_eq!(body.strings.len(), 1);
    }
}
