//! SSA construction without a dominator tree.
//!
//! Converts variable reads and writes into SSA form while the control-flow
//! graph is still being built, inserting phi nodes only at joins that
//! genuinely merge distinct definitions.
//!
//! # Algorithm
//!
//! Local value numbering per block plus a recursive predecessor search:
//!
//! 1. A write records the value as the variable's current definition at
//!    the end of the block.
//! 2. A read returns the recorded definition if one exists; otherwise it
//!    searches predecessors. An unsealed block (predecessor set not yet
//!    final) gets an operandless placeholder phi, completed at sealing. A
//!    sealed block with one predecessor forwards the read without a phi.
//!    A sealed merge block gets a phi that is written as the current
//!    definition BEFORE its operands are filled — a recursive read
//!    arriving back at the same block over a cycle finds the placeholder
//!    and terminates instead of recursing forever.
//! 3. A filled phi that merges at most one distinct value besides itself
//!    is removed and every use of it rewritten. Each removal retries the
//!    phis that used the removed one, so chains of redundant joins
//!    collapse transitively.
//!
//! Every resolved read is memoized into the current-definition table, so
//! repeated reads of the same `(variable, block)` pair are O(1).
//!
//! # References
//!
//! - Braun et al., "Simple and Efficient Construction of Static Single
//!   Assignment Form" (CC 2013) — lazy phi placement with block sealing
//! - Cytron et al. (TOPLAS 1991) — the dominance-frontier construction
//!   this algorithm avoids

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use minc_ir::{BlockId, Cfg, PhiId, Value, VarId};

/// Per-function SSA construction state.
///
/// Owns the current-definition table, the pending placeholder phis of
/// unsealed blocks, the sealed-block set, and a reverse use index over
/// phis. All of it is scoped to one function; [`reset`](SsaBuilder::reset)
/// clears everything for the next one. Phi nodes themselves are stored in
/// the [`Cfg`]'s arena and survive as ordinary block content once
/// construction finishes.
#[derive(Debug, Default)]
pub struct SsaBuilder {
    /// Per block: the value of each variable at the end of the block, as
    /// currently known. Entries appear on write or on memoized read and
    /// are rewritten when a phi they mention is removed.
    current_defs: FxHashMap<BlockId, FxHashMap<VarId, Value>>,
    /// Per unsealed block: placeholder phis awaiting predecessor
    /// finalization. Drained when the block is sealed, never repopulated.
    incomplete_phis: FxHashMap<BlockId, FxHashMap<VarId, PhiId>>,
    /// Blocks whose predecessor edge set is final.
    sealed: FxHashSet<BlockId>,
    /// Reverse use index: phi → phis currently carrying it as an operand.
    /// Maintained on operand append and on substitution; consulted when a
    /// removal cascades.
    phi_users: FxHashMap<PhiId, FxHashSet<PhiId>>,
    /// Phis whose operand lists are mid-fill. A cascade never removes
    /// these; each is re-examined when its own fill completes.
    filling: FxHashSet<PhiId>,
}

impl SsaBuilder {
    /// Create a builder with no registered blocks.
    pub fn new() -> Self {
        Self::default()
    }

    // Registration and sealing

    /// Register `block` with empty definition tables.
    ///
    /// Must be called before any read or write touching `block`. Pass
    /// `sealed = true` for blocks whose predecessor set is already final
    /// at creation (typically the function entry, or a block whose single
    /// predecessor edge was just wired).
    ///
    /// # Panics
    ///
    /// Panics if `block` is not a block of `cfg` or was already
    /// registered.
    pub fn add_block(&mut self, cfg: &mut Cfg, block: BlockId, sealed: bool) {
        assert!(
            block.index() < cfg.block_count(),
            "registering unknown block {}",
            block.raw(),
        );
        let fresh = self
            .current_defs
            .insert(block, FxHashMap::default())
            .is_none();
        assert!(fresh, "block {} registered twice", block.raw());
        self.incomplete_phis.insert(block, FxHashMap::default());
        if sealed {
            self.seal_block(cfg, block);
        }
    }

    /// Mark `block`'s predecessor set as final and complete every
    /// placeholder phi created for it.
    ///
    /// Completion may immediately remove a placeholder again (a merge of
    /// one value needs no phi). Must be called exactly once per block,
    /// only after all predecessor edges into `block` are wired.
    ///
    /// # Panics
    ///
    /// Panics if `block` was never registered or was already sealed.
    pub fn seal_block(&mut self, cfg: &mut Cfg, block: BlockId) {
        assert!(
            self.incomplete_phis.contains_key(&block),
            "sealing unregistered block {}",
            block.raw(),
        );
        assert!(
            !self.sealed.contains(&block),
            "block {} sealed twice",
            block.raw(),
        );
        let pending = self
            .incomplete_phis
            .get_mut(&block)
            .map(std::mem::take)
            .unwrap_or_default();
        for (var, phi) in pending {
            self.add_phi_operands(cfg, var, phi);
        }
        self.sealed.insert(block);
        tracing::trace!(block = block.raw(), "sealed block");
    }

    /// Returns `true` if `block` has been sealed.
    #[inline]
    pub fn is_sealed(&self, block: BlockId) -> bool {
        self.sealed.contains(&block)
    }

    // Read/write protocol

    /// Record `value` as the definition of `var` at the end of `block`.
    ///
    /// Overwrites any prior definition (source-level reassignment, or the
    /// engine substituting a removed phi).
    ///
    /// # Panics
    ///
    /// Panics if `block` was never registered.
    pub fn write_variable(&mut self, var: VarId, block: BlockId, value: Value) {
        let defs = self
            .current_defs
            .get_mut(&block)
            .unwrap_or_else(|| panic!("write to unregistered block {}", block.raw()));
        defs.insert(var, value);
    }

    /// The value of `var` visible at the end of `block`.
    ///
    /// Answers from the current-definition table when possible, otherwise
    /// searches predecessors (creating phis as needed) and memoizes the
    /// result. Never fails: a variable with no reaching definition
    /// resolves to [`Value::Undef`].
    ///
    /// # Panics
    ///
    /// Panics if `block` was never registered.
    pub fn read_variable(&mut self, cfg: &mut Cfg, var: VarId, block: BlockId) -> Value {
        let defs = self
            .current_defs
            .get(&block)
            .unwrap_or_else(|| panic!("read from unregistered block {}", block.raw()));
        if let Some(&value) = defs.get(&var) {
            return value;
        }
        self.read_variable_recursive(cfg, var, block)
    }

    /// The recorded definition of `var` at the end of `block`, if any,
    /// without searching predecessors or creating phis.
    pub fn current_def(&self, var: VarId, block: BlockId) -> Option<Value> {
        self.current_defs
            .get(&block)
            .and_then(|defs| defs.get(&var).copied())
    }

    /// Drop all per-function state. Must run before the builder is reused
    /// for another function. The previous function's graph (and the phi
    /// nodes it retains) is unaffected — it is owned by its `Cfg`.
    pub fn reset(&mut self) {
        debug_assert!(self.filling.is_empty(), "reset during operand filling");
        self.current_defs.clear();
        self.incomplete_phis.clear();
        self.sealed.clear();
        self.phi_users.clear();
        self.filling.clear();
    }

    // Cross-block resolution

    /// Resolve `var` at `block` when the block has no local definition.
    fn read_variable_recursive(&mut self, cfg: &mut Cfg, var: VarId, block: BlockId) -> Value {
        let value = if !self.sealed.contains(&block) {
            // Predecessor set not final: no merge decision is possible
            // yet. Record an operandless placeholder, completed when the
            // block is sealed.
            let ty = cfg.var_type(var);
            let phi = cfg.insert_phi(block, ty);
            tracing::trace!(
                phi = phi.raw(),
                block = block.raw(),
                var = cfg.var_name(var),
                "placeholder phi in unsealed block",
            );
            let pending = self
                .incomplete_phis
                .get_mut(&block)
                .unwrap_or_else(|| panic!("read from unregistered block {}", block.raw()));
            pending.insert(var, phi);
            Value::Phi(phi)
        } else if let Some(pred) = cfg.single_pred(block) {
            // One predecessor: the value is whatever it is there.
            self.read_variable(cfg, var, pred)
        } else {
            // Merge point, or an unreachable block with no predecessors.
            // The phi must become the current definition BEFORE operands
            // are filled: a recursive read arriving back here over a
            // back-edge finds it and stops.
            let ty = cfg.var_type(var);
            let phi = cfg.insert_phi(block, ty);
            self.write_variable(var, block, Value::Phi(phi));
            self.add_phi_operands(cfg, var, phi)
        };
        self.write_variable(var, block, value);
        value
    }

    /// Fill `phi`'s operands from the predecessors of its block, then
    /// attempt trivial removal. Returns the value the read resolves to —
    /// the phi itself, or whatever replaced it.
    fn add_phi_operands(&mut self, cfg: &mut Cfg, var: VarId, phi: PhiId) -> Value {
        self.filling.insert(phi);
        let block = cfg.phi(phi).block;
        let preds: SmallVec<[BlockId; 4]> = SmallVec::from_slice(cfg.preds(block));
        for pred in preds {
            let value = self.read_variable(cfg, var, pred);
            cfg.phi_mut(phi).operands.push((pred, value));
            if let Some(op) = value.as_phi() {
                if op != phi {
                    self.phi_users.entry(op).or_default().insert(phi);
                }
            }
        }
        self.filling.remove(&phi);
        self.try_remove_trivial_phi(cfg, phi)
    }

    // Trivial phi removal

    /// Remove `phi` if it merges at most one distinct value besides
    /// itself, rewriting every use and cascading to dependent phis.
    /// Returns the value that replaced the phi, or the phi itself if it
    /// is a genuine merge.
    fn try_remove_trivial_phi(&mut self, cfg: &mut Cfg, phi: PhiId) -> Value {
        let mut same: Option<Value> = None;
        for &(_, op) in &cfg.phi(phi).operands {
            if op == Value::Phi(phi) || Some(op) == same {
                continue; // self-reference over a back-edge, or a duplicate
            }
            if same.is_some() {
                return Value::Phi(phi); // merges two distinct values
            }
            same = Some(op);
        }
        // No operand besides the phi itself: nothing reaches this point,
        // so the merged variable is undefined here.
        let same = same.unwrap_or(Value::Undef);

        tracing::debug!(
            phi = phi.raw(),
            block = cfg.phi(phi).block.raw(),
            "removing trivial phi",
        );

        // Snapshot users before rewriting; substitution mutates the index.
        let users = self.phi_users.remove(&phi).unwrap_or_default();

        self.replace_all_uses(cfg, phi, same);
        cfg.remove_phi(phi);

        // Rewriting may have left a user merging a single value; retry
        // each so chains of redundant joins collapse. Phis mid-fill are
        // skipped here and re-examined when their own fill completes.
        for user in users {
            if cfg.phi_exists(user) && !self.filling.contains(&user) {
                self.try_remove_trivial_phi(cfg, user);
            }
        }
        same
    }

    /// Rewrite every reference to `phi` — in the current-definition table
    /// and in every live phi's operand list — to `replacement`.
    fn replace_all_uses(&mut self, cfg: &mut Cfg, phi: PhiId, replacement: Value) {
        let old = Value::Phi(phi);
        for defs in self.current_defs.values_mut() {
            for value in defs.values_mut() {
                if *value == old {
                    *value = replacement;
                }
            }
        }
        let live: SmallVec<[PhiId; 8]> = cfg.live_phi_ids().collect();
        for other in live {
            if other == phi {
                continue;
            }
            let mut rewritten = false;
            for (_, op) in &mut cfg.phi_mut(other).operands {
                if *op == old {
                    *op = replacement;
                    rewritten = true;
                }
            }
            if !rewritten {
                continue;
            }
            if let Some(rep) = replacement.as_phi() {
                if rep != other {
                    self.phi_users.entry(rep).or_default().insert(other);
                }
            }
        }
    }
}

// Tests
