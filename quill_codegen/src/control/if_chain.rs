//! `if` / `else if` / `else` chains.

use crate::error::CodegenResult;
use crate::expr::BoolDest;
use crate::function::FunctionEmitter;
use quill_ast::{Block, IfArm};
use tracing::trace;

impl FunctionEmitter<'_> {
    /// Emit an if-chain in two passes: dispatch, then arm bodies.
    ///
    /// Pass one evaluates each guard in order and jumps to its arm when it
    /// holds; a guard that fails falls straight into the next guard. After
    /// the last guard comes the `else` body, or nothing, then a jump to the
    /// join point. Pass two lays out the arm bodies, each ending in the
    /// same jump. Every path, arm or not, lands on the join label, and the
    /// join binds against the entry frame.
    pub(crate) fn emit_if(&mut self, arms: &[IfArm], else_body: Option<&Block>) -> CodegenResult<()> {
        trace!(arms = arms.len(), has_else = else_body.is_some(), "emit if-chain");
        let frame = self.builder.frame();
        let join = self.builder.create_label();

        let arm_labels: Vec<_> = arms.iter().map(|_| self.builder.create_label()).collect();

        for (arm, label) in arms.iter().zip(&arm_labels) {
            self.emit_bool_expr(
                &arm.cond,
                BoolDest::Branch {
                    target: *label,
                    jump_on_false: false,
                },
            )?;
        }
        if let Some(block) = else_body {
            self.emit_block(block)?;
        }
        self.builder.emit_jump(join);

        for (arm, label) in arms.iter().zip(&arm_labels) {
            self.builder.bind_label_at(*label, &frame)?;
            self.emit_block(&arm.body)?;
            self.builder.emit_jump(join);
        }

        self.builder.bind_label_at(join, &frame)
    }
}

#[cfg(test)]
mod tests {
    use crate::bytecode::Instruction;
    use crate::testutil::{compile_entry, int_global};
    use quill_ast::{Block, CmpOp, Expr, IfArm, Span, Stmt, StmtKind};

    fn assign(name: &str, value: Expr, span: Span) -> Stmt {
        Stmt::new(
            StmtKind::Assign {
                name: name.to_string(),
                value,
            },
            span,
        )
    }

    fn arm(guard: i64, set_to: i64, span: Span) -> IfArm {
        IfArm {
            cond: Expr::compare(
                CmpOp::Eq,
                Expr::name("g", span),
                Expr::int(guard, span),
                span,
            ),
            body: Block {
                body: vec![assign("g", Expr::int(set_to, span), span)],
                span,
            },
        }
    }

    #[test]
    fn test_guards_precede_all_arm_bodies() {
        let span = Span::new(2, 0);
        let body = compile_entry(vec![
            int_global("g", span),
            Stmt::new(
                StmtKind::If {
                    arms: vec![arm(1, 10, span), arm(2, 20, span)],
                    else_body: None,
                },
                span,
            ),
        ]);

        // Both guard jumps appear before the first arm body's store.
        let stores: Vec<usize> = body
            .instructions
            .iter()
            .enumerate()
            .filter(|(_, i)| matches!(i, Instruction::StoreGlobal(_)))
            .map(|(pc, _)| pc)
            .collect();
        let guards: Vec<usize> = body
            .instructions
            .iter()
            .enumerate()
            .filter(|(_, i)| matches!(i, Instruction::JumpIntCmp(..)))
            .map(|(pc, _)| pc)
            .collect();
        assert_eq!(guards.len(), 2);
        assert!(guards.iter().all(|g| *g < stores[0]));
    }

    #[test]
    fn test_every_arm_jumps_to_the_join() {
        let span = Span::new(2, 0);
        let body = compile_entry(vec![
            int_global("g", span),
            Stmt::new(
                StmtKind::If {
                    arms: vec![arm(1, 10, span), arm(2, 20, span)],
                    else_body: Some(Block {
                        body: vec![assign("g", Expr::int(30, span), span)],
                        span,
                    }),
                },
                span,
            ),
        ]);

        // Two arms plus the else path: three jumps to the same join label.
        let mut joins = body
            .instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Jump(l) => Some(*l),
                _ => None,
            })
            .collect::<Vec<_>>();
        joins.dedup();
        assert_eq!(joins.len(), 1);
        assert_eq!(
            body.instructions
                .iter()
                .filter(|i| matches!(i, Instruction::Jump(_)))
                .count(),
            3
        );
    }
}
