//! Integer expression emitter.

use crate::error::CodegenResult;
use crate::function::FunctionEmitter;
use crate::bytecode::Instruction;
use quill_ast::{BinOp, Expr, ExprKind};
use tracing::trace;

impl FunctionEmitter<'_> {
    /// Emit `expr`, leaving one integer on the stack.
    ///
    /// Operands emit left-to-right, operator last; precedence is already
    /// settled by the tree shape.
    pub(crate) fn emit_int_expr(&mut self, expr: &Expr) -> CodegenResult<()> {
        match &expr.kind {
            ExprKind::Int(value) => {
                self.builder.emit_push_int(*value);
                Ok(())
            }

            ExprKind::Name(name) => self.emit_name_load(name, expr.span).map(|_| ()),

            ExprKind::Binary { op, left, right } => {
                self.emit_int_expr(left)?;
                self.emit_int_expr(right)?;
                self.builder.emit_arith(match op {
                    BinOp::Add => Instruction::Add,
                    BinOp::Sub => Instruction::Sub,
                    BinOp::Mul => Instruction::Mul,
                    BinOp::Div => Instruction::Div,
                    BinOp::Rem => Instruction::Rem,
                });
                Ok(())
            }

            ExprKind::Neg(operand) => {
                self.emit_int_expr(operand)?;
                self.builder.emit_neg();
                Ok(())
            }

            ExprKind::Call { name, args } => {
                self.emit_call_expr(name, args, expr.span).map(|_| ())
            }

            // Not an integer node; the checker gates this path.
            _ => {
                trace!(at = %expr.span, "non-integer node reached the integer emitter");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bytecode::Instruction;
    use crate::testutil::{compile_entry, int_global};
    use quill_ast::{BinOp, Expr, Span, Stmt, StmtKind};

    #[test]
    fn test_operands_emit_left_to_right() {
        let span = Span::new(2, 0);
        // g = 1 - 2 * 3, with the tree shaped as 1 - (2 * 3)
        let product = Expr::binary(
            BinOp::Mul,
            Expr::int(2, span),
            Expr::int(3, span),
            span,
        );
        let value = Expr::binary(BinOp::Sub, Expr::int(1, span), product, span);
        let body = compile_entry(
            vec![int_global("g", span), Stmt::new(
                StmtKind::Assign {
                    name: "g".to_string(),
                    value,
                },
                span,
            )],
        );

        let ops: Vec<Instruction> = body.instructions.to_vec();
        assert_eq!(
            &ops[..6],
            &[
                Instruction::PushInt(1),
                Instruction::PushInt(2),
                Instruction::PushInt(3),
                Instruction::Mul,
                Instruction::Sub,
                Instruction::StoreGlobal(crate::bytecode::GlobalIndex::new(0)),
            ]
        );
    }

    #[test]
    fn test_unary_negation() {
        let span = Span::new(2, 0);
        let value = Expr::neg(Expr::int(5, span), span);
        let body = compile_entry(vec![
            int_global("g", span),
            Stmt::new(
                StmtKind::Assign {
                    name: "g".to_string(),
                    value,
                },
                span,
            ),
        ]);
        assert!(body
            .instructions
            .windows(2)
            .any(|w| w == &[Instruction::PushInt(5), Instruction::Neg][..]));
    }
}
