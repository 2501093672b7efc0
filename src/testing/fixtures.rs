//! Small symbolic-graph fixtures, one per scenario exercised by the
//! integration tests under `tests/`.

use super::GraphBuilder;
use crate::organizer::SymbolOrganizer;

/// `t0 -[e0]-> t1 -[e1]-> t2 -[e2]-> t3`, a straight line of three kernels.
#[must_use]
pub fn linear_chain_3() -> SymbolOrganizer {
    let mut g = GraphBuilder::new();
    let t0 = g.tensor(&[4]);
    let t1 = g.tensor(&[4]);
    let t2 = g.tensor(&[4]);
    let t3 = g.tensor(&[4]);

    let e0 = g.exec(&[t0], &[t1], false);
    let e1 = g.exec(&[t1], &[t2], false);
    let e2 = g.exec(&[t2], &[t3], false);
    g.link(e0, e1).link(e1, e2);
    g.source(e0).destination(e2);
    g.build()
}

/// `t0, t1 -[e0]-> t2`: a single kernel with two inputs.
#[must_use]
pub fn two_input_sum() -> SymbolOrganizer {
    let mut g = GraphBuilder::new();
    let t0 = g.tensor(&[4]);
    let t1 = g.tensor(&[4]);
    let t2 = g.tensor(&[4]);

    let e0 = g.exec(&[t0, t1], &[t2], false);
    g.source(e0).destination(e0);
    g.build()
}

/// A tensor read by two kernels but produced by neither — classified
/// `Const` since liveness never sees a producer for it.
#[must_use]
pub fn const_tensor_fanout() -> SymbolOrganizer {
    let mut g = GraphBuilder::new();
    let weight = g.tensor(&[4]);
    let t0 = g.tensor(&[4]);
    let t1 = g.tensor(&[4]);
    let t2 = g.tensor(&[4]);
    let t3 = g.tensor(&[4]);

    let e0 = g.exec(&[t0, weight], &[t1], false);
    let e1 = g.exec(&[t1, weight], &[t2], false);
    let e2 = g.exec(&[t2], &[t3], false);
    g.link(e0, e1).link(e1, e2);
    g.source(e0).destination(e2);
    g.build()
}

/// `t0 -[e0, inplace]-> t1 -[e1]-> t2`: `e0`'s output should fold into its
/// input since `t1`'s single head matches `t0`'s single tail exactly.
#[must_use]
pub fn inplace_fold_chain() -> SymbolOrganizer {
    let mut g = GraphBuilder::new();
    let t0 = g.tensor(&[4]);
    let t1 = g.tensor(&[4]);
    let t2 = g.tensor(&[4]);

    let e0 = g.exec(&[t0], &[t1], true);
    let e1 = g.exec(&[t1], &[t2], false);
    g.link(e0, e1);
    g.source(e0).destination(e1);
    g.build()
}

/// Two independent chains whose middle tensors don't interfere until a
/// later tensor is marked zero-init, forcing a SET node ahead of its use.
#[must_use]
pub fn zero_init_reuse() -> SymbolOrganizer {
    let mut g = GraphBuilder::new();
    let t0 = g.tensor(&[4]);
    let t1 = g.tensor(&[4]);
    let t2 = g.tensor(&[4]);
    let acc = g.tensor(&[4]);
    let t3 = g.tensor(&[4]);

    let e0 = g.exec(&[t0], &[t1], false);
    let e1 = g.exec(&[t1], &[t2], false);
    g.zero_init(acc);
    let e2 = g.exec(&[t2, acc], &[t3], false);
    g.link(e0, e1).link(e1, e2);
    g.source(e0).destination(e2);
    g.build()
}

/// A sequential chain of four differently-sized tensors, each read
/// alongside a `Const` weight tensor that interferes with all of them.
///
/// `t0`/`t1` and `t2`/`t3` are each non-interfering pairs with one tensor
/// strictly bigger than the other, so the Packer's companion-expansion
/// branch (`bytes[k] > bytes[a]`) actually fires — every other fixture in
/// this module uses identically-sized tensors, which never does. `weight`
/// interferes with every other tensor here, so if a companion ever gets
/// assigned the wrong AllocGraph endpoint, its region can clobber
/// `weight`'s and the non-overlap invariant catches it.
#[must_use]
pub fn companion_sizes_with_interference() -> SymbolOrganizer {
    let mut g = GraphBuilder::new();
    let weight = g.tensor(&[4]); // 16 bytes, Const
    let t0 = g.tensor(&[2]); // 8 bytes -> 16 aligned
    let t1 = g.tensor(&[16]); // 64 bytes, companion of t0
    let t2 = g.tensor(&[4]); // 16 bytes
    let t3 = g.tensor(&[32]); // 128 bytes, companion of t2

    let e0 = g.exec(&[t0, weight], &[t1], false);
    let e1 = g.exec(&[t1], &[t2], false);
    let e2 = g.exec(&[t2, weight], &[t3], false);
    g.link(e0, e1).link(e1, e2);
    g.source(e0).destination(e2);
    g.build()
}

/// Two independent source chains feeding two independent destinations:
/// exercises synthetic source/sink fan-in and fan-out wrapping.
#[must_use]
pub fn multi_source_multi_dest() -> SymbolOrganizer {
    let mut g = GraphBuilder::new();
    let a0 = g.tensor(&[4]);
    let a1 = g.tensor(&[4]);
    let b0 = g.tensor(&[4]);
    let b1 = g.tensor(&[4]);

    let ea = g.exec(&[a0], &[a1], false);
    let eb = g.exec(&[b0], &[b1], false);
    g.source(ea).source(eb);
    g.destination(ea).destination(eb);
    g.build()
}
