use arenac::backend::HostBackend;
use arenac::dep_matrix::DepMatrix;
use arenac::interference::Interference;
use arenac::liveness;
use arenac::symbol::TensorState;
use arenac::testing::{
    assert_arena_invariants, assert_non_overlapping, assert_packing_idempotent, companion_sizes_with_interference,
    const_tensor_fanout, inplace_fold_chain, linear_chain_3, multi_source_multi_dest, two_input_sum, zero_init_reuse,
};
use arenac::{compile, CompileOptions};
use std::sync::Arc;

fn backend() -> Arc<HostBackend> {
    Arc::new(HostBackend)
}

/// S1: a straight chain of three kernels compiles to a single buffer large
/// enough for the widest tensor live at once, with every tensor covered.
#[test]
fn s1_linear_chain() {
    let organizer = linear_chain_3();
    let output = compile(&organizer, backend(), CompileOptions::default()).expect("compile");
    assert_eq!(output.exec_arena.nodes.iter().filter(|n| matches!(n.kind, arenac::materialize::ExecKind::Kernel(_))).count(), 3);
    assert!(!output.packing.buffer_sizes.is_empty());
    for i in 0..organizer.tensors.len() {
        let id = arenac::symbol::TensorId::new(i as u32);
        assert!(output.arena.vt_tensor.contains_key(&id), "tensor {id:?} missing from arena");
    }
}

/// S2: a single two-input kernel compiles with both inputs alive
/// simultaneously, so they must land in non-overlapping ranges.
#[test]
fn s2_two_input_sum() {
    let organizer = two_input_sum();
    let output = compile(&organizer, backend(), CompileOptions::default()).expect("compile");
    let t0 = arenac::symbol::TensorId::new(0);
    let t1 = arenac::symbol::TensorId::new(1);
    let (b0, o0) = (output.packing.assigned[&t0], output.packing.offset[&t0]);
    let (b1, o1) = (output.packing.assigned[&t1], output.packing.offset[&t1]);
    if b0 == b1 {
        let s0 = organizer.tensor(t0).byte_size();
        let s1 = organizer.tensor(t1).byte_size();
        assert!(o0 >= o1 + s1 || o1 >= o0 + s0, "simultaneously live inputs overlap");
    }
}

/// S3: a tensor with no producer in the subgraph is classified `Const` and
/// therefore interferes with (shares no storage with) every other tensor.
#[test]
fn s3_const_tensor_fanout() {
    let organizer = const_tensor_fanout();
    let order = organizer.topological_order().expect("toposort");
    let dm = DepMatrix::build(&organizer, &order);
    let states = liveness::compute(&organizer, &order, &dm).expect("liveness");
    let weight = arenac::symbol::TensorId::new(0);
    assert!(matches!(states[weight.index()], TensorState::Const), "weight tensor should classify as Const");

    let output = compile(&organizer, backend(), CompileOptions::default()).expect("compile");
    assert!(output.arena.vt_tensor.contains_key(&weight));
}

/// S4: an inplace kernel whose output's single head matches its input's
/// single tail folds away — the output tensor becomes `Unassigned`,
/// resolving through to the input's concrete tensor.
#[test]
fn s4_inplace_fold() {
    let organizer = inplace_fold_chain();
    let order = organizer.topological_order().expect("toposort");
    let dm = DepMatrix::build(&organizer, &order);
    let mut states = liveness::compute(&organizer, &order, &dm).expect("liveness");
    arenac::inplace::fold(&organizer, &order, &mut states);

    let t1 = arenac::symbol::TensorId::new(1);
    assert!(matches!(states[t1.index()], TensorState::Unassigned { ref_to: Some(_) }), "inplace output should fold into its input");

    let output = compile(&organizer, backend(), CompileOptions::default()).expect("compile");
    let t0 = arenac::symbol::TensorId::new(0);
    assert_eq!(output.arena.vt_tensor[&t0].as_ptr(), output.arena.vt_tensor[&t1].as_ptr(), "folded tensor should share the input's bytes");
}

/// S5: a zero-init tensor reusing a prior tenant's storage gets a SET node
/// materialized ahead of its first real use.
#[test]
fn s5_zero_init_reuse() {
    let organizer = zero_init_reuse();
    let output = compile(&organizer, backend(), CompileOptions::default()).expect("compile");
    let zero_inits: Vec<_> = output
        .exec_arena
        .nodes
        .iter()
        .filter(|n| matches!(n.kind, arenac::materialize::ExecKind::ZeroInit(_)))
        .collect();
    assert_eq!(zero_inits.len(), 1, "expected exactly one zero-init node");
    assert!(!zero_inits[0].successors.is_empty());
}

/// S6: two independent source chains feeding two independent destinations
/// get synthetic fan-in/fan-out noops, and both sinks remain reachable.
#[test]
fn s6_multi_source_multi_dest() {
    let organizer = multi_source_multi_dest();
    let output = compile(&organizer, backend(), CompileOptions::default()).expect("compile");
    assert_ne!(output.exec_arena.source, output.exec_arena.sink);
    assert!(output.exec_arena.nodes[output.exec_arena.source].successors.len() >= 2, "source should fan out to both chains");
}

/// Two differently-sized, non-interfering tensors in the same chain must
/// still trigger the Packer's companion-expansion branch without letting
/// either one's region overlap the `Const` weight tensor they're read
/// alongside, which interferes with both.
#[test]
fn companion_sizes_do_not_overlap_interfering_tensor() {
    let organizer = companion_sizes_with_interference();
    let order = organizer.topological_order().expect("toposort");
    let dm = DepMatrix::build(&organizer, &order);
    let mut states = liveness::compute(&organizer, &order, &dm).expect("liveness");
    arenac::inplace::fold(&organizer, &order, &mut states);
    let mut interference = Interference::build(&organizer, &states, &dm, 16, false).expect("interference");
    let packing = arenac::packer::pack(&organizer, &states, &mut interference, &dm);

    assert_non_overlapping(&organizer, &interference, &packing);

    let weight = arenac::symbol::TensorId::new(0);
    assert!(matches!(states[weight.index()], TensorState::Const), "weight tensor should classify as Const");

    let (w_buf, w_off) = (packing.assigned[&weight], packing.offset[&weight]);
    let w_size = organizer.tensor(weight).byte_size();
    for (&id, &buf) in &packing.assigned {
        if id == weight || buf != w_buf {
            continue;
        }
        let off = packing.offset[&id];
        let size = organizer.tensor(id).byte_size();
        let overlap = off < w_off + w_size && w_off < off + size;
        assert!(!overlap, "tensor {id:?} at [{off}, {}) overlaps Const weight at [{w_off}, {})", off + size, w_off + w_size);
    }
}

/// Invariants 1-5 hold for every scenario fixture.
#[test]
fn invariants_hold_across_fixtures() {
    let fixtures: Vec<arenac::organizer::SymbolOrganizer> = vec![
        linear_chain_3(),
        two_input_sum(),
        const_tensor_fanout(),
        inplace_fold_chain(),
        zero_init_reuse(),
        multi_source_multi_dest(),
        companion_sizes_with_interference(),
    ];

    for organizer in fixtures {
        let order = organizer.topological_order().expect("toposort");
        let dm = DepMatrix::build(&organizer, &order);
        let mut states = liveness::compute(&organizer, &order, &dm).expect("liveness");
        arenac::inplace::fold(&organizer, &order, &mut states);
        let mut interference = Interference::build(&organizer, &states, &dm, 16, false).expect("interference");
        let packing = arenac::packer::pack(&organizer, &states, &mut interference, &dm);
        let arena = arenac::arena::build(&organizer, &states, &packing, backend(), 16).expect("arena");
        let exec_arena = arenac::materialize::materialize(&organizer, &states, &packing, &order);

        assert_arena_invariants(&organizer, &states, &interference, &packing, &arena, &exec_arena);
        assert_packing_idempotent(&organizer, &states, &dm);
    }
}
