//! Tests for the fatal invariant violations in `CompileError`. A well-formed
//! symbolic graph never triggers these; these tests construct the malformed
//! inputs directly rather than through `GraphBuilder`, since the builder
//! only ever emits well-formed graphs.

use arenac::backend::{ArenaBackend, HostBackend};
use arenac::error::{BackendError, CompileError};
use arenac::organizer::SymbolOrganizer;
use arenac::symbol::{ExecId, ExecSymbol, MemType, TensorId, TensorSymbol};
use arenac::CompileOptions;
use std::sync::Arc;

fn tensor(dims: &[usize], mem_type: MemType, device_id: u32, alias_of: Option<TensorId>) -> TensorSymbol {
    TensorSymbol {
        dims: dims.iter().copied().collect(),
        mem_type,
        device_id,
        elem_size: 4,
        alias_of,
        init_to_zero: false,
    }
}

fn exec(inputs: Vec<TensorId>, outputs: Vec<TensorId>, successors: Vec<ExecId>) -> ExecSymbol {
    ExecSymbol {
        cmd: Arc::new(()),
        hint: Arc::new(()),
        inputs,
        outputs,
        inplace: false,
        successors,
    }
}

#[test]
fn test_alias_of_alias_is_rejected() {
    let t0 = TensorId::new(0);
    let t1 = TensorId::new(1);
    let t2 = TensorId::new(2);
    let organizer = SymbolOrganizer {
        tensors: vec![
            tensor(&[4], MemType::Host, 0, None),
            tensor(&[4], MemType::Host, 0, Some(t0)),
            // t2 aliases t1, which is itself an alias: forbidden by the
            // one-level-only invariant in the data model.
            tensor(&[4], MemType::Host, 0, Some(t1)),
        ],
        execs: vec![exec(vec![t0], vec![t2], vec![])],
        sources: vec![ExecId::new(0)],
        destinations: vec![ExecId::new(0)],
        prebinds: vec![],
    };

    let err = arenac::compile(&organizer, Arc::new(HostBackend), CompileOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::AliasOfAlias(id) if id == t2), "expected AliasOfAlias(t2), got {err:?}");
}

#[test]
fn test_mixed_memory_type_is_rejected() {
    let t0 = TensorId::new(0);
    let t1 = TensorId::new(1);
    let t2 = TensorId::new(2);
    let e0 = ExecId::new(0);
    let e1 = ExecId::new(1);
    let organizer = SymbolOrganizer {
        tensors: vec![
            // t0 has no producer in the subgraph, so it classifies `Const`
            // and never enters the computable comparison below.
            tensor(&[4], MemType::Host, 0, None),
            tensor(&[4], MemType::Host, 0, None),
            // t2 is produced by e1 on a different device than t1: no
            // backend run ever produces this, but a caller-assembled graph
            // could.
            tensor(&[4], MemType::Device, 1, None),
        ],
        execs: vec![exec(vec![t0], vec![t1], vec![e1]), exec(vec![t1], vec![t2], vec![])],
        sources: vec![e0],
        destinations: vec![e1],
        prebinds: vec![],
    };

    let err = arenac::compile(&organizer, Arc::new(HostBackend), CompileOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::MixedMemoryType { .. }), "expected MixedMemoryType, got {err:?}");
}

#[test]
fn test_ordering_cycle_is_rejected() {
    // e0 -> e1 -> e0 is a genuine cycle; e1 also reaches the destination
    // e2. The back-edge to e0 isn't cut by the "destinations don't
    // propagate forward" rule (only e2 is a destination, and e1 isn't one),
    // so the reachable subgraph is not a DAG and `topological_order` must
    // reject it before DepMatrix or Interference ever run.
    let e0 = ExecId::new(0);
    let e1 = ExecId::new(1);
    let e2 = ExecId::new(2);
    let organizer = SymbolOrganizer {
        tensors: vec![],
        execs: vec![exec(vec![], vec![], vec![e1]), exec(vec![], vec![], vec![e0, e2]), exec(vec![], vec![], vec![])],
        sources: vec![e0],
        destinations: vec![e2],
        prebinds: vec![],
    };

    let err = organizer.topological_order().unwrap_err();
    assert!(matches!(err, CompileError::OrderingCycle { .. }), "expected OrderingCycle, got {err:?}");
}

#[test]
fn test_backend_allocation_failure_becomes_arena_exhausted() {
    struct FailingBackend;
    impl ArenaBackend for FailingBackend {
        fn allocate(&self, _mem_type: MemType, _device_id: u32, bytes: u64) -> Result<*mut u8, BackendError> {
            Err(BackendError::AllocationFailed { bytes })
        }
        unsafe fn release(&self, _mem_type: MemType, _device_id: u32, _ptr: *mut u8, _bytes: u64) {}
    }

    let t0 = TensorId::new(0);
    let t1 = TensorId::new(1);
    let e0 = ExecId::new(0);
    let organizer = SymbolOrganizer {
        tensors: vec![tensor(&[4], MemType::Host, 0, None), tensor(&[4], MemType::Host, 0, None)],
        execs: vec![exec(vec![t0], vec![t1], vec![])],
        sources: vec![e0],
        destinations: vec![e0],
        prebinds: vec![],
    };

    let err = arenac::compile(&organizer, Arc::new(FailingBackend), CompileOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::ArenaExhausted { .. }), "expected ArenaExhausted, got {err:?}");
}

#[test]
fn test_align_up_rounds_to_16_bytes() {
    let t = tensor(&[3], MemType::Host, 0, None);
    // 3 elements * 4 bytes = 12, rounded up to the next 16-byte multiple.
    assert_eq!(t.byte_size(), 16);
}
