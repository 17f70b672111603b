//! Scenario tests driving the builder the way code generation does:
//! create blocks, wire edges, read and write while lowering, seal once a
//! block's predecessors are final.

use minc_ir::{Cfg, Value};
use pretty_assertions::assert_eq;

use crate::test_helpers::{block, block_after, int_inst, int_var, total_phis};
use crate::SsaBuilder;

/// Straight-line flow needs no phi: a read in a single-predecessor block
/// returns the exact value written upstream.
#[test]
fn single_assignment_single_predecessor() {
    let mut cfg = Cfg::new();
    let mut ssa = SsaBuilder::new();
    let x = int_var(&mut cfg, "x");

    let entry = block(&mut cfg, &mut ssa, true);
    let v = int_inst(&mut cfg, entry);
    ssa.write_variable(x, entry, v);

    let next = block_after(&mut cfg, &mut ssa, entry);
    assert_eq!(ssa.read_variable(&mut cfg, x, next), v);
    assert_eq!(total_phis(&cfg), 0);
}

/// A diamond whose arms write distinct values produces exactly one phi,
/// with one operand per predecessor edge in wiring order.
#[test]
fn diamond_merge_creates_phi() {
    let mut cfg = Cfg::new();
    let mut ssa = SsaBuilder::new();
    let x = int_var(&mut cfg, "x");

    let entry = block(&mut cfg, &mut ssa, true);
    let then_bb = block_after(&mut cfg, &mut ssa, entry);
    let else_bb = block_after(&mut cfg, &mut ssa, entry);
    let v1 = int_inst(&mut cfg, then_bb);
    let v2 = int_inst(&mut cfg, else_bb);
    ssa.write_variable(x, then_bb, v1);
    ssa.write_variable(x, else_bb, v2);

    let join = cfg.add_block();
    cfg.add_pred(join, then_bb);
    cfg.add_pred(join, else_bb);
    ssa.add_block(&mut cfg, join, true);

    let merged = ssa.read_variable(&mut cfg, x, join);
    let phi = merged
        .as_phi()
        .unwrap_or_else(|| panic!("expected a phi, got {merged:?}"));
    assert_eq!(cfg.phi(phi).block, join);
    assert_eq!(cfg.phi(phi).operands, vec![(then_bb, v1), (else_bb, v2)]);
    assert_eq!(cfg.phi_count(join), 1);
    assert_eq!(total_phis(&cfg), 1);
}

/// A diamond whose arms carry the same value merges nothing: the phi is
/// created, found trivial, and removed again.
#[test]
fn same_value_diamond_collapses() {
    let mut cfg = Cfg::new();
    let mut ssa = SsaBuilder::new();
    let x = int_var(&mut cfg, "x");

    let entry = block(&mut cfg, &mut ssa, true);
    let v = int_inst(&mut cfg, entry);
    ssa.write_variable(x, entry, v);

    // Neither arm writes x: both forward the entry definition.
    let then_bb = block_after(&mut cfg, &mut ssa, entry);
    let else_bb = block_after(&mut cfg, &mut ssa, entry);

    let join = cfg.add_block();
    cfg.add_pred(join, then_bb);
    cfg.add_pred(join, else_bb);
    ssa.add_block(&mut cfg, join, true);

    assert_eq!(ssa.read_variable(&mut cfg, x, join), v);
    assert_eq!(cfg.phi_count(join), 0);
    assert_eq!(total_phis(&cfg), 0);
}

/// One arm rewrites the variable, the other forwards the entry value:
/// a genuine merge that must keep its phi.
#[test]
fn diamond_with_one_writing_arm_keeps_phi() {
    let mut cfg = Cfg::new();
    let mut ssa = SsaBuilder::new();
    let x = int_var(&mut cfg, "x");

    let entry = block(&mut cfg, &mut ssa, true);
    let v0 = int_inst(&mut cfg, entry);
    ssa.write_variable(x, entry, v0);

    let then_bb = block_after(&mut cfg, &mut ssa, entry);
    let v1 = int_inst(&mut cfg, then_bb);
    ssa.write_variable(x, then_bb, v1);
    let else_bb = block_after(&mut cfg, &mut ssa, entry);

    let join = cfg.add_block();
    cfg.add_pred(join, then_bb);
    cfg.add_pred(join, else_bb);
    ssa.add_block(&mut cfg, join, true);

    let merged = ssa.read_variable(&mut cfg, x, join);
    let phi = merged
        .as_phi()
        .unwrap_or_else(|| panic!("expected a phi, got {merged:?}"));
    assert_eq!(cfg.phi(phi).operands, vec![(then_bb, v1), (else_bb, v0)]);
}

/// A loop that never rewrites the variable: the header placeholder turns
/// out to carry only the entry value plus itself, and collapses once the
/// back-edge is wired and the header sealed.
#[test]
fn loop_invariant_value_collapses() {
    let mut cfg = Cfg::new();
    let mut ssa = SsaBuilder::new();
    let x = int_var(&mut cfg, "x");

    let entry = block(&mut cfg, &mut ssa, true);
    let v0 = int_inst(&mut cfg, entry);
    ssa.write_variable(x, entry, v0);

    // while (...) { use x; } — header unsealed until the latch is wired.
    let header = cfg.add_block();
    cfg.add_pred(header, entry);
    ssa.add_block(&mut cfg, header, false);
    let body = block_after(&mut cfg, &mut ssa, header);
    let exit = block_after(&mut cfg, &mut ssa, header);

    let in_loop = ssa.read_variable(&mut cfg, x, body);
    assert!(in_loop.as_phi().is_some(), "placeholder expected in body read");

    cfg.add_pred(header, body);
    ssa.seal_block(&mut cfg, header);

    assert_eq!(ssa.read_variable(&mut cfg, x, exit), v0);
    assert_eq!(total_phis(&cfg), 0);
}

/// A loop that rewrites the variable each iteration keeps exactly one
/// phi in the header, merging the entry value with the loop-carried one.
#[test]
fn loop_carried_value_keeps_single_phi() {
    let mut cfg = Cfg::new();
    let mut ssa = SsaBuilder::new();
    let x = int_var(&mut cfg, "x");

    let entry = block(&mut cfg, &mut ssa, true);
    let v0 = int_inst(&mut cfg, entry);
    ssa.write_variable(x, entry, v0);

    let header = cfg.add_block();
    cfg.add_pred(header, entry);
    ssa.add_block(&mut cfg, header, false);
    let body = block_after(&mut cfg, &mut ssa, header);
    let exit = block_after(&mut cfg, &mut ssa, header);

    // x = f(x) in the body: read the carried value, then overwrite it.
    let _use = ssa.read_variable(&mut cfg, x, body);
    let v1 = int_inst(&mut cfg, body);
    ssa.write_variable(x, body, v1);

    cfg.add_pred(header, body);
    ssa.seal_block(&mut cfg, header);

    let out = ssa.read_variable(&mut cfg, x, exit);
    let phi = out
        .as_phi()
        .unwrap_or_else(|| panic!("expected a phi, got {out:?}"));
    assert_eq!(cfg.phi(phi).block, header);
    assert_eq!(cfg.phi(phi).operands, vec![(entry, v0), (body, v1)]);
    assert_eq!(total_phis(&cfg), 1);
}

/// Three joins chained through merge blocks, each non-trivial only
/// because of its predecessor's join: sealing the loop header collapses
/// the first, and the removal cascades down the whole chain.
#[test]
fn cascading_elimination_collapses_chain() {
    let mut cfg = Cfg::new();
    let mut ssa = SsaBuilder::new();
    let x = int_var(&mut cfg, "x");

    let entry = block(&mut cfg, &mut ssa, true);
    let v = int_inst(&mut cfg, entry);
    ssa.write_variable(x, entry, v);

    // A loop header whose placeholder phi stays unresolved for now.
    let header = cfg.add_block();
    cfg.add_pred(header, entry);
    ssa.add_block(&mut cfg, header, false);
    let latch = block_after(&mut cfg, &mut ssa, header);
    let in_loop = ssa.read_variable(&mut cfg, x, latch);
    assert!(in_loop.as_phi().is_some());

    // First merge: header value vs. a path that skips the loop.
    let skip1 = block_after(&mut cfg, &mut ssa, entry);
    let merge1 = cfg.add_block();
    cfg.add_pred(merge1, header);
    cfg.add_pred(merge1, skip1);
    ssa.add_block(&mut cfg, merge1, true);
    let m1 = ssa.read_variable(&mut cfg, x, merge1);
    assert!(m1.as_phi().is_some());

    // Second merge: first merge vs. another skip path.
    let skip2 = block_after(&mut cfg, &mut ssa, entry);
    let merge2 = cfg.add_block();
    cfg.add_pred(merge2, merge1);
    cfg.add_pred(merge2, skip2);
    ssa.add_block(&mut cfg, merge2, true);
    let m2 = ssa.read_variable(&mut cfg, x, merge2);
    assert!(m2.as_phi().is_some());

    assert_eq!(total_phis(&cfg), 3);

    // The variable never changes around the loop, so sealing the header
    // collapses its phi — and with it the whole dependent chain.
    cfg.add_pred(header, latch);
    ssa.seal_block(&mut cfg, header);

    assert_eq!(total_phis(&cfg), 0);
    assert_eq!(ssa.read_variable(&mut cfg, x, merge2), v);
    assert_eq!(ssa.read_variable(&mut cfg, x, merge1), v);
    assert_eq!(ssa.read_variable(&mut cfg, x, latch), v);
}

/// A variable that is never written resolves to the undefined sentinel,
/// not an error, on every path.
#[test]
fn undefined_on_unwritten_path() {
    let mut cfg = Cfg::new();
    let mut ssa = SsaBuilder::new();
    let x = int_var(&mut cfg, "x");
    let y = int_var(&mut cfg, "y");

    let entry = block(&mut cfg, &mut ssa, true);
    let v = int_inst(&mut cfg, entry);
    ssa.write_variable(x, entry, v);

    let next = block_after(&mut cfg, &mut ssa, entry);
    assert_eq!(ssa.read_variable(&mut cfg, y, next), Value::Undef);
    assert_eq!(ssa.read_variable(&mut cfg, y, entry), Value::Undef);
    // The defined variable is unaffected.
    assert_eq!(ssa.read_variable(&mut cfg, x, next), v);
    assert_eq!(total_phis(&cfg), 0);
}

/// After reset, nothing from the previous function is observable, even
/// when the new function reuses the same block identities.
#[test]
fn reset_isolates_functions() {
    let mut ssa = SsaBuilder::new();

    let mut first = Cfg::new();
    let x = int_var(&mut first, "x");
    let entry = block(&mut first, &mut ssa, true);
    let v = int_inst(&mut first, entry);
    ssa.write_variable(x, entry, v);
    assert_eq!(ssa.read_variable(&mut first, x, entry), v);

    ssa.reset();

    // Fresh graph; BlockId(0) and VarId(0) identities recur.
    let mut second = Cfg::new();
    let y = int_var(&mut second, "y");
    let entry2 = second.add_block();
    assert_eq!(entry2, entry);
    ssa.add_block(&mut second, entry2, true);

    assert_eq!(ssa.current_def(y, entry2), None);
    assert_eq!(ssa.read_variable(&mut second, y, entry2), Value::Undef);

    let w = int_inst(&mut second, entry2);
    ssa.write_variable(y, entry2, w);
    assert_eq!(ssa.read_variable(&mut second, y, entry2), w);
}
