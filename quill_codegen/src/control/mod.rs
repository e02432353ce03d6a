//! Control-flow emitters.
//!
//! Both constructs capture the operand-stack image at entry and bind every
//! merge point against it, so any stack imbalance across a branch surfaces
//! at generation time instead of at run time.

mod if_chain;
mod while_loop;
