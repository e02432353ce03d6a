//! Abstract Syntax Tree definitions for Quill.
//!
//! This is the tree shape the code generator consumes: it models the output
//! of the static checker, not raw parser output. Declarations carry their
//! resolved value kinds, and constant-foldable initial values arrive already
//! folded.

use crate::span::Span;
use std::fmt;

// =============================================================================
// Value Kinds and Constants
// =============================================================================

/// The kind of a value in the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Signed integer.
    Int,
    /// Boolean (represented as 0/1 on the target).
    Bool,
    /// Text.
    Str,
    /// No value (function return kind only).
    Void,
}

impl ValueKind {
    /// Whether values of this kind support ordering comparisons (`<`, `<=`, ...).
    #[inline]
    pub const fn is_comparable(self) -> bool {
        matches!(self, ValueKind::Int)
    }

    /// Whether values of this kind support equality comparisons (`==`, `!=`).
    #[inline]
    pub const fn supports_equality(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Bool | ValueKind::Str)
    }

    /// The kind's name as it appears in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Bool => "bool",
            ValueKind::Str => "str",
            ValueKind::Void => "void",
        }
    }

    /// The default value storage of this kind is initialised to.
    pub fn default_value(self) -> Option<Constant> {
        match self {
            ValueKind::Int => Some(Constant::Int(0)),
            ValueKind::Bool => Some(Constant::Bool(false)),
            ValueKind::Str => Some(Constant::Str(String::new())),
            ValueKind::Void => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A checker-folded constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Integer constant.
    Int(i64),
    /// Boolean constant.
    Bool(bool),
    /// Text constant.
    Str(String),
}

impl Constant {
    /// The kind of this constant.
    pub const fn kind(&self) -> ValueKind {
        match self {
            Constant::Int(_) => ValueKind::Int,
            Constant::Bool(_) => ValueKind::Bool,
            Constant::Str(_) => ValueKind::Str,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Bool(v) => write!(f, "{v}"),
            Constant::Str(v) => write!(f, "{v:?}"),
        }
    }
}

// =============================================================================
// Program Level
// =============================================================================

/// A whole translation unit.
#[derive(Debug, Clone)]
pub struct Program {
    /// Top-level statements, including function definitions and
    /// module-level declarations.
    pub body: Vec<Stmt>,
    /// Source span.
    pub span: Span,
}

impl Program {
    /// Create a new program.
    #[must_use]
    pub fn new(body: Vec<Stmt>) -> Self {
        Self {
            body,
            span: Span::new(1, 0),
        }
    }
}

/// A braced statement block.
///
/// The span records the coordinate of the opening brace; scopes are keyed
/// by it during code generation.
#[derive(Debug, Clone)]
pub struct Block {
    /// Statements in the block.
    pub body: Vec<Stmt>,
    /// Coordinate of the block-opening token.
    pub span: Span,
}

impl Block {
    /// Create a new block.
    #[must_use]
    pub fn new(body: Vec<Stmt>, span: Span) -> Self {
        Self { body, span }
    }
}

// =============================================================================
// Statements
// =============================================================================

/// A statement node.
#[derive(Debug, Clone)]
pub struct Stmt {
    /// The statement kind.
    pub kind: StmtKind,
    /// Source span.
    pub span: Span,
}

impl Stmt {
    /// Create a new statement.
    #[must_use]
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement kinds.
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// Variable declaration: `let name: kind = init`.
    Decl {
        /// Declared name.
        name: String,
        /// Declared value kind.
        kind: ValueKind,
        /// Initialiser expression, if written.
        init: Option<Expr>,
        /// Constant initial value, when the checker could fold `init`.
        folded: Option<Constant>,
    },
    /// Assignment: `name = value`.
    Assign {
        /// Target name.
        name: String,
        /// Value being assigned.
        value: Expr,
    },
    /// Expression statement (a call whose result is discarded).
    Expr(Expr),
    /// Conditional with one or more guarded arms and an optional else body.
    If {
        /// The `if` arm followed by any `else if` arms, in source order.
        arms: Vec<IfArm>,
        /// The `else` body, if present.
        else_body: Option<Block>,
    },
    /// `while cond { body }`.
    While {
        /// Loop guard.
        cond: Expr,
        /// Loop body.
        body: Block,
    },
    /// `break`.
    Break,
    /// `continue`.
    Continue,
    /// `return` with an optional value.
    Return(Option<Expr>),
    /// Function definition (top level only).
    FunctionDef {
        /// Function name.
        name: String,
        /// Parameters in declaration order.
        params: Vec<Param>,
        /// Declared return kind.
        returns: ValueKind,
        /// Function body.
        body: Block,
    },
}

/// One boolean-guarded arm of a conditional.
#[derive(Debug, Clone)]
pub struct IfArm {
    /// The guard expression.
    pub cond: Expr,
    /// The arm body.
    pub body: Block,
}

/// A function parameter.
#[derive(Debug, Clone)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Parameter kind.
    pub kind: ValueKind,
}

impl Param {
    /// Create a new parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

// =============================================================================
// Expressions
// =============================================================================

/// An expression node.
#[derive(Debug, Clone)]
pub struct Expr {
    /// The expression kind.
    pub kind: ExprKind,
    /// Source span.
    pub span: Span,
}

impl Expr {
    /// Create a new expression.
    #[must_use]
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Integer literal.
    #[must_use]
    pub fn int(value: i64, span: Span) -> Self {
        Self::new(ExprKind::Int(value), span)
    }

    /// Boolean literal.
    #[must_use]
    pub fn bool(value: bool, span: Span) -> Self {
        Self::new(ExprKind::Bool(value), span)
    }

    /// Text literal.
    #[must_use]
    pub fn str(value: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Str(value.into()), span)
    }

    /// Identifier reference.
    #[must_use]
    pub fn name(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Name(name.into()), span)
    }

    /// Binary arithmetic (or text concatenation for `Add` on text).
    #[must_use]
    pub fn binary(op: BinOp, left: Expr, right: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    /// Comparison.
    #[must_use]
    pub fn compare(op: CmpOp, left: Expr, right: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    /// Logical connective.
    #[must_use]
    pub fn logical(op: LogicOp, left: Expr, right: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    /// Logical negation.
    #[must_use]
    pub fn not(operand: Expr, span: Span) -> Self {
        Self::new(ExprKind::Not(Box::new(operand)), span)
    }

    /// Unary arithmetic negation.
    #[must_use]
    pub fn neg(operand: Expr, span: Span) -> Self {
        Self::new(ExprKind::Neg(Box::new(operand)), span)
    }

    /// Function call.
    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<Expr>, span: Span) -> Self {
        Self::new(
            ExprKind::Call {
                name: name.into(),
                args,
            },
            span,
        )
    }
}

/// Expression kinds.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Integer literal.
    Int(i64),
    /// Boolean literal.
    Bool(bool),
    /// Text literal.
    Str(String),
    /// Identifier reference.
    Name(String),
    /// Binary arithmetic: `left op right`.
    /// `Add` doubles as text concatenation when the operands are text.
    Binary {
        /// Operator.
        op: BinOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Unary arithmetic negation.
    Neg(Box<Expr>),
    /// Comparison: `left op right`.
    Compare {
        /// Operator.
        op: CmpOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Logical connective (non-short-circuiting): `left op right`.
    Logical {
        /// Operator.
        op: LogicOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Logical negation.
    Not(Box<Expr>),
    /// Function call: `name(args...)`.
    Call {
        /// Callee name (user function or builtin).
        name: String,
        /// Arguments in source order.
        args: Vec<Expr>,
    },
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// Addition (text concatenation on text operands).
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Remainder.
    Rem,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

impl CmpOp {
    /// Whether this is an ordering comparison (as opposed to equality).
    #[inline]
    pub const fn is_ordering(self) -> bool {
        matches!(self, CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge)
    }
}

/// Logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    /// `&&` (both operands always evaluated).
    And,
    /// `||` (both operands always evaluated).
    Or,
    /// `^^`
    Xor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind_predicates() {
        assert!(ValueKind::Int.is_comparable());
        assert!(!ValueKind::Str.is_comparable());
        assert!(!ValueKind::Bool.is_comparable());

        assert!(ValueKind::Int.supports_equality());
        assert!(ValueKind::Str.supports_equality());
        assert!(!ValueKind::Void.supports_equality());
    }

    #[test]
    fn test_default_values() {
        assert_eq!(ValueKind::Int.default_value(), Some(Constant::Int(0)));
        assert_eq!(ValueKind::Bool.default_value(), Some(Constant::Bool(false)));
        assert_eq!(
            ValueKind::Str.default_value(),
            Some(Constant::Str(String::new()))
        );
        assert_eq!(ValueKind::Void.default_value(), None);
    }

    #[test]
    fn test_expr_helpers() {
        let span = Span::new(3, 7);
        let e = Expr::binary(
            BinOp::Add,
            Expr::int(1, span),
            Expr::int(2, span),
            span,
        );
        match e.kind {
            ExprKind::Binary { op, .. } => assert_eq!(op, BinOp::Add),
            _ => panic!("expected binary node"),
        }
        assert_eq!(e.span.line, 3);
    }
}
