//! On-the-fly SSA construction for the minc compiler.
//!
//! This crate provides [`SsaBuilder`], the engine that turns source-level
//! variable reads and writes into SSA values while code generation walks a
//! function body — no dominator tree, no separate renaming pass. Phi nodes
//! are created lazily at join points, completed once a block's predecessor
//! set is final, and pruned again when they turn out to merge nothing.
//!
//! # Driver protocol
//!
//! The code generation driver, while lowering one function:
//!
//! - registers every block with [`SsaBuilder::add_block`] before touching
//!   it (sealed immediately if its predecessors are already final);
//! - calls [`SsaBuilder::write_variable`] for each assignment and
//!   [`SsaBuilder::read_variable`] for each use, in lowering order;
//! - calls [`SsaBuilder::seal_block`] once all predecessor edges into a
//!   block have been wired;
//! - calls [`SsaBuilder::reset`] before starting the next function.
//!
//! Reads are answered immediately and never fail: a variable with no
//! reaching definition resolves to [`minc_ir::Value::Undef`] rather than
//! an error. Violating the protocol itself (unregistered blocks, double
//! sealing) is a driver bug and panics.

pub mod builder;

pub use builder::SsaBuilder;

#[cfg(test)]
mod test_helpers;
#[cfg(test)]
mod tests;
