//! Per-function control-flow graph with explicit predecessor edges.
//!
//! A [`Cfg`] is built incrementally while code generation walks a function
//! body: blocks may be created before all of their predecessor edges
//! exist, and edges are wired one at a time as branches are emitted. The
//! graph therefore never assumes its own shape is final — the SSA engine
//! layered on top is told separately (by sealing) when a block's
//! predecessor set will no longer change.
//!
//! Phi nodes live in an arena owned by the graph. Removal tombstones the
//! arena slot instead of shifting it, so a [`PhiId`] handed out earlier
//! stays valid as an identity even though dereferencing a removed phi is
//! a hard error.

use smallvec::SmallVec;

use crate::Type;

// ── ID newtypes ─────────────────────────────────────────────────────

/// Source variable ID within one function.
///
/// Allocated by [`Cfg::declare_var`], sequentially from 0. The scope
/// resolution layer declares every variable before code generation
/// reads or writes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct VarId(u32);

impl VarId {
    /// Create a new variable ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Basic block ID within one function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    /// Create a new block ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opaque instruction ID within one function.
///
/// Instructions are computed values produced by expression code
/// generation. This tier tracks their identity and result type only;
/// operands and opcodes belong to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct InstId(u32);

impl InstId {
    /// Create a new instruction ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Phi node ID within one function.
///
/// Stays a valid identity for the whole function even after the phi is
/// removed; only dereferencing a removed phi is an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PhiId(u32);

impl PhiId {
    /// Create a new phi ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// What a variable resolves to at a program point.
///
/// - [`Inst`](Value::Inst) — a computed value from expression codegen,
///   borrowed by identity; this tier never owns or rewrites it.
/// - [`Phi`](Value::Phi) — a join of definitions arriving over multiple
///   predecessor edges.
/// - [`Undef`](Value::Undef) — no definition reaches this point on any
///   path. A legitimate outcome (use of an uninitialized variable), not
///   an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Inst(InstId),
    Phi(PhiId),
    Undef,
}

impl Value {
    /// The phi ID if this value is a phi.
    #[inline]
    pub fn as_phi(self) -> Option<PhiId> {
        match self {
            Value::Phi(phi) => Some(phi),
            Value::Inst(_) | Value::Undef => None,
        }
    }
}

// ── Phi nodes ───────────────────────────────────────────────────────

/// A phi node: the join of a variable's definitions at a block head.
///
/// Operands are `(predecessor, incoming value)` pairs in predecessor
/// wiring order. The list is empty while the phi is incomplete (its
/// block is unsealed) and is filled exactly once when the block's
/// predecessor set becomes final.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhiNode {
    /// The block this phi belongs to.
    pub block: BlockId,
    /// Result type — the type of the variable being merged.
    pub ty: Type,
    /// Incoming `(predecessor, value)` pairs.
    pub operands: Vec<(BlockId, Value)>,
}

impl PhiNode {
    /// The incoming value for a given predecessor edge, if present.
    pub fn operand_for(&self, pred: BlockId) -> Option<Value> {
        self.operands
            .iter()
            .find(|(from, _)| *from == pred)
            .map(|&(_, value)| value)
    }
}

// ── Blocks ──────────────────────────────────────────────────────────

/// One entry in a block body: a phi or an ordinary instruction.
///
/// Phis always occupy a prefix of the body; [`Cfg::insert_phi`] maintains
/// that ordering on insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entry {
    Phi(PhiId),
    Inst(InstId),
}

/// A basic block: predecessor edges plus an ordered body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// This block's identifier.
    pub id: BlockId,
    preds: SmallVec<[BlockId; 2]>,
    body: Vec<Entry>,
}

impl Block {
    /// Predecessor blocks in edge wiring order. Duplicates are kept: two
    /// edges from the same block (e.g. a two-armed switch) appear twice.
    #[inline]
    pub fn preds(&self) -> &[BlockId] {
        &self.preds
    }

    /// The block body: phis first, then ordinary instructions.
    #[inline]
    pub fn body(&self) -> &[Entry] {
        &self.body
    }
}

// ── Instructions ────────────────────────────────────────────────────

/// An opaque computed value: position and result type only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Inst {
    /// The block this instruction was appended to.
    pub block: BlockId,
    /// Result type.
    pub ty: Type,
}

// ── Variables ───────────────────────────────────────────────────────

/// A scope-resolved source variable: name plus semantic type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    /// Source-level name.
    pub name: String,
    /// Semantic type, used for phi typing.
    pub ty: Type,
}

// ── Cfg ─────────────────────────────────────────────────────────────

/// Per-function control-flow graph.
///
/// Owns the blocks, the opaque instruction table, the phi arena, and the
/// variable registry for one function. All state is scoped to a single
/// function's compilation; start the next function with a fresh `Cfg`.
#[derive(Clone, Debug, Default)]
pub struct Cfg {
    blocks: Vec<Block>,
    insts: Vec<Inst>,
    phis: Vec<Option<PhiNode>>,
    vars: Vec<Variable>,
}

impl Cfg {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Variables ───────────────────────────────────────────────

    /// Declare a source variable, returning its ID.
    pub fn declare_var(&mut self, name: impl Into<String>, ty: Type) -> VarId {
        let id = VarId::new(
            u32::try_from(self.vars.len())
                .unwrap_or_else(|_| panic!("variable count exceeds u32::MAX")),
        );
        self.vars.push(Variable {
            name: name.into(),
            ty,
        });
        id
    }

    /// Look up a variable's type.
    ///
    /// # Panics
    ///
    /// Panics if `var` was not declared on this graph.
    #[inline]
    pub fn var_type(&self, var: VarId) -> Type {
        self.var(var).ty
    }

    /// Look up a variable's source name.
    #[inline]
    pub fn var_name(&self, var: VarId) -> &str {
        &self.var(var).name
    }

    fn var(&self, var: VarId) -> &Variable {
        assert!(
            var.index() < self.vars.len(),
            "VarId {} out of bounds (have {} vars)",
            var.raw(),
            self.vars.len(),
        );
        &self.vars[var.index()]
    }

    // ── Blocks and edges ────────────────────────────────────────

    /// Append a new empty block and return its ID.
    pub fn add_block(&mut self) -> BlockId {
        let id = BlockId::new(
            u32::try_from(self.blocks.len())
                .unwrap_or_else(|_| panic!("block count exceeds u32::MAX")),
        );
        self.blocks.push(Block {
            id,
            preds: SmallVec::new(),
            body: Vec::new(),
        });
        id
    }

    /// Number of blocks in the graph.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Access a block.
    ///
    /// # Panics
    ///
    /// Panics if `block` is not a block of this graph.
    #[inline]
    pub fn block(&self, block: BlockId) -> &Block {
        assert!(
            block.index() < self.blocks.len(),
            "BlockId {} out of bounds (have {} blocks)",
            block.raw(),
            self.blocks.len(),
        );
        &self.blocks[block.index()]
    }

    fn block_mut(&mut self, block: BlockId) -> &mut Block {
        assert!(
            block.index() < self.blocks.len(),
            "BlockId {} out of bounds (have {} blocks)",
            block.raw(),
            self.blocks.len(),
        );
        &mut self.blocks[block.index()]
    }

    /// Wire a predecessor edge `pred → block`.
    ///
    /// Edges are kept in wiring order and never deduplicated; operand
    /// order of any later phi in `block` follows this order.
    pub fn add_pred(&mut self, block: BlockId, pred: BlockId) {
        assert!(
            pred.index() < self.blocks.len(),
            "BlockId {} out of bounds (have {} blocks)",
            pred.raw(),
            self.blocks.len(),
        );
        self.block_mut(block).preds.push(pred);
    }

    /// Predecessors of `block` in wiring order.
    #[inline]
    pub fn preds(&self, block: BlockId) -> &[BlockId] {
        self.block(block).preds()
    }

    /// The single predecessor of `block`, if it has exactly one
    /// predecessor edge. Counts edges, not distinct blocks: a block
    /// reached twice from the same predecessor does not qualify.
    pub fn single_pred(&self, block: BlockId) -> Option<BlockId> {
        match self.block(block).preds() {
            [pred] => Some(*pred),
            _ => None,
        }
    }

    // ── Instructions ────────────────────────────────────────────

    /// Append an opaque computed value to `block`, returning it as a
    /// [`Value`].
    pub fn append_inst(&mut self, block: BlockId, ty: Type) -> Value {
        let id = InstId::new(
            u32::try_from(self.insts.len())
                .unwrap_or_else(|_| panic!("instruction count exceeds u32::MAX")),
        );
        self.insts.push(Inst { block, ty });
        self.block_mut(block).body.push(Entry::Inst(id));
        Value::Inst(id)
    }

    /// Access an instruction.
    ///
    /// # Panics
    ///
    /// Panics if `inst` is not an instruction of this graph.
    #[inline]
    pub fn inst(&self, inst: InstId) -> &Inst {
        assert!(
            inst.index() < self.insts.len(),
            "InstId {} out of bounds (have {} insts)",
            inst.raw(),
            self.insts.len(),
        );
        &self.insts[inst.index()]
    }

    // ── Phi nodes ───────────────────────────────────────────────

    /// Create an empty phi node in `block`, inserted before the first
    /// non-phi body entry (appended if the body has no such entry), so
    /// phis always precede ordinary computation.
    pub fn insert_phi(&mut self, block: BlockId, ty: Type) -> PhiId {
        let id = PhiId::new(
            u32::try_from(self.phis.len())
                .unwrap_or_else(|_| panic!("phi count exceeds u32::MAX")),
        );
        self.phis.push(Some(PhiNode {
            block,
            ty,
            operands: Vec::new(),
        }));
        let body = &mut self.block_mut(block).body;
        let at = body
            .iter()
            .position(|entry| !matches!(entry, Entry::Phi(_)))
            .unwrap_or(body.len());
        body.insert(at, Entry::Phi(id));
        id
    }

    /// Remove a phi from its block and tombstone its arena slot.
    ///
    /// # Panics
    ///
    /// Panics if the phi was already removed.
    pub fn remove_phi(&mut self, phi: PhiId) {
        let block = self.phi(phi).block;
        let body = &mut self.block_mut(block).body;
        let at = body
            .iter()
            .position(|entry| *entry == Entry::Phi(phi))
            .unwrap_or_else(|| panic!("phi {} missing from block {}", phi.raw(), block.raw()));
        body.remove(at);
        self.phis[phi.index()] = None;
    }

    /// Access a phi node.
    ///
    /// # Panics
    ///
    /// Panics if `phi` is out of bounds or was removed.
    #[inline]
    pub fn phi(&self, phi: PhiId) -> &PhiNode {
        self.phi_slot(phi)
            .as_ref()
            .unwrap_or_else(|| panic!("phi {} was removed", phi.raw()))
    }

    /// Mutable access to a phi node.
    ///
    /// # Panics
    ///
    /// Panics if `phi` is out of bounds or was removed.
    #[inline]
    pub fn phi_mut(&mut self, phi: PhiId) -> &mut PhiNode {
        assert!(
            phi.index() < self.phis.len(),
            "PhiId {} out of bounds (have {} phis)",
            phi.raw(),
            self.phis.len(),
        );
        self.phis[phi.index()]
            .as_mut()
            .unwrap_or_else(|| panic!("phi {} was removed", phi.raw()))
    }

    /// Returns `true` if `phi` has not been removed.
    #[inline]
    pub fn phi_exists(&self, phi: PhiId) -> bool {
        self.phi_slot(phi).is_some()
    }

    fn phi_slot(&self, phi: PhiId) -> &Option<PhiNode> {
        assert!(
            phi.index() < self.phis.len(),
            "PhiId {} out of bounds (have {} phis)",
            phi.raw(),
            self.phis.len(),
        );
        &self.phis[phi.index()]
    }

    /// IDs of all live (not removed) phis, in creation order.
    pub fn live_phi_ids(&self) -> impl Iterator<Item = PhiId> + '_ {
        self.phis.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref().map(|_| {
                PhiId::new(u32::try_from(i).unwrap_or_else(|_| panic!("phi index exceeds u32")))
            })
        })
    }

    /// Phis at the head of `block`, in body order.
    pub fn block_phis(&self, block: BlockId) -> impl Iterator<Item = PhiId> + '_ {
        self.block(block).body().iter().filter_map(|entry| match entry {
            Entry::Phi(phi) => Some(*phi),
            Entry::Inst(_) => None,
        })
    }

    /// Number of phis currently in `block`.
    pub fn phi_count(&self, block: BlockId) -> usize {
        self.block_phis(block).count()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
