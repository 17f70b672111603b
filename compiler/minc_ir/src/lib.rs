//! Control-flow graph substrate for the minc compiler's middle tier.
//!
//! This crate provides:
//!
//! - **[`Type`]** — the semantic types of minc source variables.
//! - **ID newtypes** ([`VarId`], [`BlockId`], [`InstId`], [`PhiId`]) —
//!   stable handles into per-function side tables.
//! - **[`Value`]** — what a variable read can resolve to: a computed
//!   instruction result, a phi node, or the undefined sentinel.
//! - **[`Cfg`]** — a per-function control-flow graph: blocks with explicit
//!   predecessor edges, opaque instruction entries, and a phi arena.
//!
//! # Architecture
//!
//! The graph is deliberately minimal. Blocks carry an ordered predecessor
//! list and a body in which phi nodes occupy a prefix ahead of ordinary
//! instructions, the same shape LLVM basic blocks have. Instructions are
//! opaque to this tier: code generation allocates them for identity and
//! type only, and never exposes their operands here. The SSA construction
//! engine in `minc_ssa` drives all phi mutation; this crate enforces the
//! structural invariants (phi-prefix ordering, stable IDs, tombstoned
//! removal) and nothing else.

pub mod cfg;

pub use cfg::{Block, BlockId, Cfg, Entry, Inst, InstId, PhiId, PhiNode, Value, VarId, Variable};

/// Semantic type of a minc source variable.
///
/// Mirrors the type lattice of the source subset: scalars (`char`, `int`),
/// arrays of either, and `void` for functions without a return value.
/// The SSA engine consults this only to give a phi node the type of the
/// variable it merges; nothing in the middle tier inspects types beyond
/// that.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Char,
    Int,
    CharArray,
    IntArray,
}

impl Type {
    /// Returns `true` for the array types.
    #[inline]
    pub fn is_array(self) -> bool {
        matches!(self, Type::CharArray | Type::IntArray)
    }
}
