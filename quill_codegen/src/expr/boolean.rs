//! Boolean expression emitter.
//!
//! Boolean trees are consumed two ways. An assignment or argument wants an
//! actual `0`/`1` on the stack; an `if` or `while` guard wants a conditional
//! jump and no residue. [`BoolDest`] names the two, and every node here
//! emits for either destination. Comparisons compile to one fused
//! compare-and-jump in branch mode; value mode wraps the same jump in the
//! jump-around-constant idiom rather than running a second lowering.

use crate::bytecode::{FrameImage, Instruction, IntCmp, Label};
use crate::error::{CodegenError, CodegenResult};
use crate::function::FunctionEmitter;
use quill_ast::{CmpOp, Expr, ExprKind, LogicOp, ValueKind};
use tracing::trace;

/// Where a boolean expression's result goes.
#[derive(Debug, Clone, Copy)]
pub enum BoolDest {
    /// Leave `0` or `1` on the operand stack.
    Value,
    /// Transfer control instead of producing a value.
    Branch {
        /// Jump target.
        target: Label,
        /// Jump when the condition is false (guard exits) rather than
        /// when it is true (chain-arm entries).
        jump_on_false: bool,
    },
}

const fn int_cmp(op: CmpOp) -> IntCmp {
    match op {
        CmpOp::Lt => IntCmp::Lt,
        CmpOp::Le => IntCmp::Le,
        CmpOp::Gt => IntCmp::Gt,
        CmpOp::Ge => IntCmp::Ge,
        CmpOp::Eq => IntCmp::Eq,
        CmpOp::Ne => IntCmp::Ne,
    }
}

impl FunctionEmitter<'_> {
    /// Emit `expr` for `dest`.
    ///
    /// Value-producing nodes finish a branch destination with a plain
    /// truthiness jump on the materialised value; comparisons skip the
    /// intermediate value entirely and jump off the comparison itself.
    pub(crate) fn emit_bool_expr(&mut self, expr: &Expr, dest: BoolDest) -> CodegenResult<()> {
        match &expr.kind {
            ExprKind::Bool(value) => {
                self.builder.emit_push_bool(*value);
                self.finish_value(dest);
                Ok(())
            }

            ExprKind::Name(name) => {
                self.emit_name_load(name, expr.span)?;
                self.finish_value(dest);
                Ok(())
            }

            // not x == x xor 1
            ExprKind::Not(operand) => {
                self.emit_bool_expr(operand, BoolDest::Value)?;
                self.builder.emit_push_bool(true);
                self.builder.emit_bool_op(Instruction::Xor);
                self.finish_value(dest);
                Ok(())
            }

            // Both operands always evaluate; `and`/`or` are the eager
            // bitwise forms, so side effects on the right are never skipped.
            ExprKind::Logical { op, left, right } => {
                self.emit_bool_expr(left, BoolDest::Value)?;
                self.emit_bool_expr(right, BoolDest::Value)?;
                self.builder.emit_bool_op(match op {
                    LogicOp::And => Instruction::And,
                    LogicOp::Or => Instruction::Or,
                    LogicOp::Xor => Instruction::Xor,
                });
                self.finish_value(dest);
                Ok(())
            }

            ExprKind::Compare { op, left, right } => {
                self.emit_comparison(*op, left, right, expr.span, dest)
            }

            ExprKind::Call { name, args } => {
                self.emit_call_expr(name, args, expr.span)?;
                self.finish_value(dest);
                Ok(())
            }

            // Not a boolean node; the checker gates this path.
            _ => {
                trace!(at = %expr.span, "non-boolean node reached the boolean emitter");
                Ok(())
            }
        }
    }

    fn emit_comparison(
        &mut self,
        op: CmpOp,
        left: &Expr,
        right: &Expr,
        at: quill_ast::Span,
        dest: BoolDest,
    ) -> CodegenResult<()> {
        let lhs = self.expr_kind(left)?;
        let rhs = self.expr_kind(right)?;
        let legal = lhs == rhs
            && if op.is_ordering() {
                lhs.is_comparable()
            } else {
                lhs.supports_equality()
            };
        if !legal {
            return Err(CodegenError::InvalidComparison {
                lhs: lhs.name(),
                rhs: rhs.name(),
                line: at.line,
                column: at.column,
            });
        }

        match lhs {
            ValueKind::Int => {
                self.emit_int_expr(left)?;
                self.emit_int_expr(right)?;
            }
            ValueKind::Bool => {
                self.emit_bool_expr(left, BoolDest::Value)?;
                self.emit_bool_expr(right, BoolDest::Value)?;
            }
            ValueKind::Str => {
                self.emit_str_expr(left)?;
                self.emit_str_expr(right)?;
            }
            ValueKind::Void => unreachable!("void never passes the equality check"),
        }

        match dest {
            BoolDest::Branch {
                target,
                jump_on_false,
            } => {
                self.emit_cmp_jump(lhs, op, target, jump_on_false);
                Ok(())
            }
            // Jump-around-constant: branch to the false arm on the inverted
            // condition, fall through into `1`, hop over `0`.
            BoolDest::Value => {
                let false_label = self.builder.create_label();
                let join = self.builder.create_label();
                self.emit_cmp_jump(lhs, op, false_label, true);
                let frame: FrameImage = self.builder.frame();
                self.builder.emit_push_bool(true);
                self.builder.emit_jump(join);
                self.builder.bind_label_at(false_label, &frame)?;
                self.builder.emit_push_bool(false);
                self.builder.bind_label(join)
            }
        }
    }

    /// Fused compare-and-jump for a comparison whose operands are already
    /// on the stack. `jump_on_false` folds into the opcode polarity, so
    /// both guard exits and arm entries cost one instruction.
    fn emit_cmp_jump(&mut self, kind: ValueKind, op: CmpOp, target: Label, jump_on_false: bool) {
        match kind {
            ValueKind::Int | ValueKind::Bool => {
                let cmp = int_cmp(op);
                let cmp = if jump_on_false { cmp.invert() } else { cmp };
                self.builder.emit_jump_int_cmp(cmp, target);
            }
            ValueKind::Str => {
                let when_equal = (op == CmpOp::Eq) != jump_on_false;
                self.builder.emit_jump_str_eq(when_equal, target);
            }
            ValueKind::Void => {}
        }
    }

    /// In branch mode, turn the value the node just pushed into a jump.
    fn finish_value(&mut self, dest: BoolDest) {
        if let BoolDest::Branch {
            target,
            jump_on_false,
        } = dest
        {
            if jump_on_false {
                self.builder.emit_jump_if_false(target);
            } else {
                self.builder.emit_jump_if_true(target);
            }
        }
    }
}
