//! `while` loops.

use crate::dispatch::{CategorySet, Owner};
use crate::error::CodegenResult;
use crate::expr::BoolDest;
use crate::function::{FunctionEmitter, LoopContext};
use quill_ast::{Block, Expr};
use tracing::trace;

impl FunctionEmitter<'_> {
    /// Emit a while loop: guard at the top, back-edge at the bottom.
    ///
    /// While the body emits, the loop owns `break` and `continue` through
    /// the delegation stack; `break` jumps to the exit label, `continue` to
    /// the guard. Both the guard label and the exit bind against the frame
    /// captured at entry.
    pub(crate) fn emit_while(&mut self, cond: &Expr, body: &Block) -> CodegenResult<()> {
        trace!(at = %cond.span, "emit while");
        let frame = self.builder.frame();
        let guard = self.builder.create_label();
        let exit = self.builder.create_label();

        self.builder.bind_label_at(guard, &frame)?;
        self.emit_bool_expr(
            cond,
            BoolDest::Branch {
                target: exit,
                jump_on_false: true,
            },
        )?;

        let index = self.loop_stack.len();
        self.loop_stack.push(LoopContext {
            break_label: exit,
            continue_label: guard,
        });
        let token = self.dispatch.push(Owner::Loop(index), CategorySet::LOOP_OWNED);

        let result = self.emit_block(body);

        self.dispatch.pop(token)?;
        self.loop_stack.pop();
        result?;

        self.builder.emit_jump(guard);
        self.builder.bind_label_at(exit, &frame)
    }
}

#[cfg(test)]
mod tests {
    use crate::bytecode::Instruction;
    use crate::testutil::{compile_entry, int_global};
    use quill_ast::{Block, CmpOp, Expr, Span, Stmt, StmtKind};

    fn counting_loop(body: Vec<Stmt>, span: Span) -> Stmt {
        Stmt::new(
            StmtKind::While {
                cond: Expr::compare(
                    CmpOp::Lt,
                    Expr::name("g", span),
                    Expr::int(3, span),
                    span,
                ),
                body: Block { body, span },
            },
            span,
        )
    }

    #[test]
    fn test_back_edge_targets_the_guard() {
        let span = Span::new(2, 0);
        let body = compile_entry(vec![
            int_global("g", span),
            counting_loop(Vec::new(), span),
        ]);

        let guard_pc = body
            .instructions
            .iter()
            .position(|i| matches!(i, Instruction::JumpIntCmp(..)))
            .unwrap();
        // The guard starts with its operand loads, two instructions back.
        let back_edge = body
            .instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Jump(l) => Some(body.targets[l.index()]),
                _ => None,
            })
            .next_back()
            .unwrap();
        assert_eq!(back_edge as usize, guard_pc - 2);
    }

    #[test]
    fn test_break_jumps_past_the_back_edge() {
        let span = Span::new(2, 0);
        let body = compile_entry(vec![
            int_global("g", span),
            counting_loop(vec![Stmt::new(StmtKind::Break, span)], span),
        ]);

        // In emission order: the break's jump, then the back-edge. The
        // break resolves to the exit, one instruction past the back-edge.
        let jumps: Vec<(usize, usize)> = body
            .instructions
            .iter()
            .enumerate()
            .filter_map(|(pc, i)| match i {
                Instruction::Jump(l) => Some((pc, body.targets[l.index()] as usize)),
                _ => None,
            })
            .collect();
        assert_eq!(jumps.len(), 2);
        let (_, break_target) = jumps[0];
        let (back_edge_pc, back_edge_target) = jumps[1];
        assert_eq!(break_target, back_edge_pc + 1);
        assert_eq!(back_edge_target, 0);
    }

    #[test]
    fn test_break_outside_loop_is_an_error() {
        use crate::error::CodegenError;
        use crate::testutil::compile_unit_result;

        let span = Span::new(4, 2);
        let err = compile_unit_result(vec![Stmt::new(StmtKind::Break, span)]).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::OutsideLoop {
                what: "break",
                line: 4,
                column: 2,
            }
        ));
    }
}
