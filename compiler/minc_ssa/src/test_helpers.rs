//! Shared test utilities for SSA construction tests.
//!
//! Factory shorthands used by the builder unit tests and the scenario
//! tests in `tests.rs`. Only compiled in test builds.

use minc_ir::{BlockId, Cfg, Type, Value, VarId};

use crate::SsaBuilder;

/// Create a block and register it with the builder in one step.
pub(crate) fn block(cfg: &mut Cfg, ssa: &mut SsaBuilder, sealed: bool) -> BlockId {
    let id = cfg.add_block();
    ssa.add_block(cfg, id, sealed);
    id
}

/// Create a block with one predecessor wired, registered sealed.
pub(crate) fn block_after(cfg: &mut Cfg, ssa: &mut SsaBuilder, pred: BlockId) -> BlockId {
    let id = cfg.add_block();
    cfg.add_pred(id, pred);
    ssa.add_block(cfg, id, true);
    id
}

/// Declare an `int` variable.
pub(crate) fn int_var(cfg: &mut Cfg, name: &str) -> VarId {
    cfg.declare_var(name, Type::Int)
}

/// Append an opaque `int` computed value to `block`.
pub(crate) fn int_inst(cfg: &mut Cfg, block: BlockId) -> Value {
    cfg.append_inst(block, Type::Int)
}

/// Total live phis across the whole graph.
pub(crate) fn total_phis(cfg: &Cfg) -> usize {
    cfg.live_phi_ids().count()
}
