//! Delegation dispatch.
//!
//! Statement emission is driven by one generator (the function emitter),
//! but nested constructs must intercept specific statement kinds while they
//! are actively emitting their own subtree: a loop owns `break`/`continue`
//! inside its body, and only while the body is being emitted.
//!
//! Ownership is an explicit stack of frames, each holding the owner and the
//! immutable category set it claimed at construction. Dispatch walks the
//! stack innermost-first and the first claimant wins, so nesting resolves
//! to the innermost construct automatically. Pushes return a token that the
//! matching pop must present; a mismatched pop is an internal error, which
//! keeps an enclosing construct's ownership intact when control returns
//! to it.

use crate::error::{CodegenError, CodegenResult};
use quill_ast::StmtKind;
use smallvec::SmallVec;

/// Handling category of a statement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StmtCategory {
    /// Variable declaration.
    Decl,
    /// Assignment.
    Assign,
    /// Expression statement.
    Expr,
    /// Conditional.
    If,
    /// Loop.
    While,
    /// `break`.
    Break,
    /// `continue`.
    Continue,
    /// `return`.
    Return,
    /// Function definition.
    FunctionDef,
}

impl StmtCategory {
    /// The category of a statement kind.
    pub fn of(kind: &StmtKind) -> Self {
        match kind {
            StmtKind::Decl { .. } => StmtCategory::Decl,
            StmtKind::Assign { .. } => StmtCategory::Assign,
            StmtKind::Expr(_) => StmtCategory::Expr,
            StmtKind::If { .. } => StmtCategory::If,
            StmtKind::While { .. } => StmtCategory::While,
            StmtKind::Break => StmtCategory::Break,
            StmtKind::Continue => StmtCategory::Continue,
            StmtKind::Return(_) => StmtCategory::Return,
            StmtKind::FunctionDef { .. } => StmtCategory::FunctionDef,
        }
    }

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Immutable set of categories a generator claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategorySet(u16);

impl CategorySet {
    /// Every category.
    pub const ALL: CategorySet = CategorySet(u16::MAX);
    /// The categories a loop intercepts while its body emits.
    pub const LOOP_OWNED: CategorySet =
        CategorySet(StmtCategory::Break.bit() | StmtCategory::Continue.bit());

    /// Whether the set claims `category`.
    #[inline]
    pub const fn claims(self, category: StmtCategory) -> bool {
        (self.0 & category.bit()) != 0
    }

    /// Combine sets.
    #[inline]
    pub const fn union(self, other: CategorySet) -> CategorySet {
        CategorySet(self.0 | other.0)
    }
}

impl std::ops::BitOr for CategorySet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// Who currently handles a claimed category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// The driving function emitter.
    Function,
    /// An active loop, identified by its index in the loop-context stack.
    Loop(usize),
}

/// Proof of a push, required by the matching pop.
#[derive(Debug)]
#[must_use]
pub struct OwnerToken(usize);

/// One active ownership frame.
#[derive(Debug, Clone, Copy)]
struct OwnerFrame {
    owner: Owner,
    claims: CategorySet,
}

/// Stack of active ownership frames.
#[derive(Debug, Default)]
pub struct DelegationStack {
    frames: SmallVec<[OwnerFrame; 4]>,
}

impl DelegationStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self {
            frames: SmallVec::new(),
        }
    }

    /// Push `owner` as the handler for `claims`.
    pub fn push(&mut self, owner: Owner, claims: CategorySet) -> OwnerToken {
        let token = OwnerToken(self.frames.len());
        self.frames.push(OwnerFrame { owner, claims });
        token
    }

    /// Pop the frame `token` was issued for. The token must belong to the
    /// innermost frame.
    pub fn pop(&mut self, token: OwnerToken) -> CodegenResult<()> {
        if token.0 + 1 != self.frames.len() {
            return Err(CodegenError::internal(
                "delegation pop does not match the innermost push",
            ));
        }
        self.frames.pop();
        Ok(())
    }

    /// The innermost owner claiming `category`, if any.
    pub fn owner_for(&self, category: StmtCategory) -> Option<Owner> {
        self.frames
            .iter()
            .rev()
            .find(|f| f.claims.claims(category))
            .map(|f| f.owner)
    }

    /// Number of active frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
