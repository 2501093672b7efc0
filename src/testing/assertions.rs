//! Invariant assertions for a completed [`crate::compile`] run, shared
//! across the scenario tests under `tests/` instead of ad hoc checks per
//! test.

use crate::arena::Arena;
use crate::dep_matrix::DepMatrix;
use crate::interference::Interference;
use crate::materialize::{ExecArena, ExecKind};
use crate::organizer::SymbolOrganizer;
use crate::packer::{self, Packing};
use crate::symbol::TensorState;

/// Invariant 1 (Non-overlap): no two tensors that interfere share any byte
/// range within the same buffer.
///
/// # Panics
/// If two interfering tensors were assigned overlapping ranges.
pub fn assert_non_overlapping(organizer: &SymbolOrganizer, interference: &Interference, packing: &Packing) {
    let ids: Vec<_> = packing.assigned.keys().copied().collect();
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            let (a, b) = (ids[i], ids[j]);
            if packing.assigned[&a] != packing.assigned[&b] {
                continue;
            }
            if !interference.interferes(a, b) {
                continue;
            }
            let (oa, ob) = (packing.offset[&a], packing.offset[&b]);
            let (sa, sb) = (organizer.tensor(a).byte_size(), organizer.tensor(b).byte_size());
            let overlap = oa < ob + sb && ob < oa + sa;
            assert!(
                !overlap,
                "tensors {a:?} and {b:?} interfere but overlap in buffer {}: [{oa}, {}) vs [{ob}, {})",
                packing.assigned[&a],
                oa + sa,
                ob + sb
            );
        }
    }
}

/// Invariant 2 (Containment): every assigned range fits inside its buffer.
///
/// # Panics
/// If a tensor's `[offset, offset + size)` range exceeds its buffer size.
pub fn assert_containment(organizer: &SymbolOrganizer, packing: &Packing) {
    for (&id, &buf) in &packing.assigned {
        let off = packing.offset[&id];
        let size = organizer.tensor(id).byte_size();
        let buf_size = packing.buffer_sizes[buf];
        assert!(
            off + size <= buf_size,
            "tensor {id:?} at [{off}, {}) exceeds buffer {buf} of size {buf_size}",
            off + size
        );
    }
}

/// Invariant 3 (Coverage): every `Computable` tensor was assigned a
/// `(buffer, offset)` pair by the Packer.
///
/// # Panics
/// If a computable tensor has no packing assignment.
pub fn assert_coverage(states: &[TensorState], packing: &Packing) {
    for (i, state) in states.iter().enumerate() {
        if !state.is_computable() {
            continue;
        }
        let id = crate::symbol::TensorId::new(i as u32);
        assert!(packing.assigned.contains_key(&id), "computable tensor {id:?} has no packing assignment");
    }
}

/// Invariant 4 (Alias integrity): every alias tensor resolved to a
/// concrete tensor sharing its parent's memory type and device.
///
/// # Panics
/// If an alias's resolved tensor disagrees with its parent's placement, or
/// didn't resolve at all.
pub fn assert_alias_integrity(states: &[TensorState], arena: &Arena) {
    for (i, state) in states.iter().enumerate() {
        let TensorState::Alias { parent } = state else { continue };
        let id = crate::symbol::TensorId::new(i as u32);
        let Some(parent_tensor) = arena.vt_tensor.get(parent) else {
            panic!("alias {id:?}'s parent {parent:?} was never resolved");
        };
        let Some(view) = arena.vt_tensor.get(&id) else {
            panic!("alias {id:?} was never resolved to a concrete tensor");
        };
        assert_eq!(view.mem_type, parent_tensor.mem_type, "alias {id:?} disagrees with parent {parent:?} on memory type");
        assert_eq!(view.device_id, parent_tensor.device_id, "alias {id:?} disagrees with parent {parent:?} on device id");
    }
}

/// Invariant 5 (Init-zero precedence): every synthesized zero-init node is
/// wired ahead of at least one consumer, never left dangling.
///
/// # Panics
/// If a `ZeroInit` node has no successors.
pub fn assert_zero_init_precedes_use(exec_arena: &ExecArena) {
    for (idx, node) in exec_arena.nodes.iter().enumerate() {
        if matches!(node.kind, ExecKind::ZeroInit(_)) {
            assert!(!node.successors.is_empty(), "zero-init node {idx} has no consumer wired after it");
        }
    }
}

/// Invariant 6 (Idempotence): packing the same liveness state twice
/// produces the same assignment.
///
/// # Panics
/// If two independent `pack()` runs over the same input disagree.
pub fn assert_packing_idempotent(organizer: &SymbolOrganizer, states: &[TensorState], dm: &DepMatrix) {
    let mut i1 = Interference::build(organizer, states, dm, 16, false).expect("interference build");
    let p1 = packer::pack(organizer, states, &mut i1, dm);
    let mut i2 = Interference::build(organizer, states, dm, 16, false).expect("interference build");
    let p2 = packer::pack(organizer, states, &mut i2, dm);
    assert_eq!(p1.assigned, p2.assigned, "packing is not idempotent: assignment differs across runs");
    assert_eq!(p1.offset, p2.offset, "packing is not idempotent: offsets differ across runs");
}

/// Run every invariant check above in one call.
///
/// # Panics
/// If any of invariants 1-5 fails. Invariant 6 is a separate call
/// ([`assert_packing_idempotent`]) since it re-runs the Packer and needs
/// `states`/`dm` rather than the already-built output.
pub fn assert_arena_invariants(
    organizer: &SymbolOrganizer,
    states: &[TensorState],
    interference: &Interference,
    packing: &Packing,
    arena: &Arena,
    exec_arena: &ExecArena,
) {
    assert_non_overlapping(organizer, interference, packing);
    assert_containment(organizer, packing);
    assert_coverage(states, packing);
    assert_alias_integrity(states, arena);
    assert_zero_init_precedes_use(exec_arena);
}
