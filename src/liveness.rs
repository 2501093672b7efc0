//! Per-tensor head/tail antichains: the earliest and latest exec that
//! touches each computable tensor.
//!
//! Every exec that references a tensor (as input or output) tries to join
//! both antichains with the same insertion rule, mirroring the original's
//! single `_ccv_nnc_tensor_expect_add_exec` call site — the direction of
//! "precedes" flips between head and tail, nothing else does.

use crate::dep_matrix::DepMatrix;
use crate::error::CompileError;
use crate::organizer::SymbolOrganizer;
use crate::symbol::{Antichain, ExecId, TensorId, TensorState};
use std::collections::HashSet;

/// Insert `x` into antichain `s`, keeping it minimal under `dm`'s partial
/// order. `head == true` inserts with the head rule (keep earliest);
/// `head == false` inserts with the tail rule (keep latest).
///
/// Uses swap-remove while scanning for elements newly dominated by `x`,
/// re-testing the swapped-in element at the same index rather than
/// advancing past it — the original does the same in
/// `_ccv_nnc_tensor_expect_add_exec`, which matters because a naive
/// `retain` would skip an element that needs re-testing after the swap.
pub fn insert_antichain(s: &mut Antichain, x: ExecId, dm: &DepMatrix, head: bool) {
    let precedes = |a: ExecId, b: ExecId| dm.precedes(a, b);

    let mut i = 0;
    while i < s.len() {
        let existing = s[i];
        let (reject, replace) = if head {
            (precedes(existing, x), precedes(x, existing))
        } else {
            (precedes(x, existing), precedes(existing, x))
        };

        if reject {
            return;
        }
        if replace {
            s[i] = x;
            let mut j = i + 1;
            while j < s.len() {
                let other = s[j];
                let also_dominated = if head {
                    precedes(x, other)
                } else {
                    precedes(other, x)
                };
                if also_dominated {
                    s.swap_remove(j);
                } else {
                    j += 1;
                }
            }
            return;
        }
        i += 1;
    }
    s.push(x);
}

#[derive(Clone, Copy)]
enum Kind {
    Skip,
    ConstNow,
    Touch,
}

/// Resolve an alias to its parent (one level only, enforced at
/// classification time).
fn resolve(id: TensorId, states: &[TensorState]) -> TensorId {
    match &states[id.index()] {
        TensorState::Alias { parent } => *parent,
        _ => id,
    }
}

fn classify_input(states: &[TensorState], d: TensorId) -> Kind {
    match &states[d.index()] {
        TensorState::Unassigned { .. } | TensorState::Const => Kind::Skip,
        TensorState::Computable { head, .. } if head.is_empty() => Kind::ConstNow,
        TensorState::Computable { .. } => Kind::Touch,
        TensorState::Alias { .. } => unreachable!("resolved before classification"),
    }
}

fn classify_output(states: &[TensorState], d: TensorId) -> Kind {
    match &states[d.index()] {
        TensorState::Unassigned { .. } | TensorState::Const => Kind::Skip,
        TensorState::Computable { .. } => Kind::Touch,
        TensorState::Alias { .. } => unreachable!("resolved before classification"),
    }
}

fn add_exec(states: &mut [TensorState], d: TensorId, idx: ExecId, dm: &DepMatrix) {
    if let TensorState::Computable { head, tail } = &mut states[d.index()] {
        insert_antichain(head, idx, dm, true);
        insert_antichain(tail, idx, dm, false);
    }
}

/// Compute initial tensor classification (`Unassigned`/`Alias`/`Computable`
/// shell) and then populate head/tail antichains by a single topological
/// walk, reclassifying to `Const` where an input is observed before any
/// producer.
///
/// # Errors
/// [`CompileError::AliasOfAlias`] if an alias's parent is itself an alias.
pub fn compute(
    organizer: &SymbolOrganizer,
    order: &[ExecId],
    dm: &DepMatrix,
) -> Result<Vec<TensorState>, CompileError> {
    let n = organizer.tensors.len();
    let prebound: HashSet<TensorId> = organizer.prebinds.iter().map(|b| b.symbol).collect();

    let mut touched = vec![false; n];
    for &id in order {
        let e = organizer.exec(id);
        for &t in e.inputs.iter().chain(e.outputs.iter()) {
            touched[t.index()] = true;
        }
    }

    let mut states = Vec::with_capacity(n);
    for i in 0..n {
        let id = TensorId::new(i as u32);
        let sym = &organizer.tensors[i];
        let state = if prebound.contains(&id) {
            TensorState::Unassigned { ref_to: None }
        } else if let Some(parent) = sym.alias_of {
            if organizer.tensors[parent.index()].alias_of.is_some() {
                return Err(CompileError::AliasOfAlias(id));
            }
            TensorState::Alias { parent }
        } else if touched[i] {
            TensorState::Computable {
                head: Antichain::new(),
                tail: Antichain::new(),
            }
        } else {
            TensorState::Unassigned { ref_to: None }
        };
        states.push(state);
    }

    for &v in order {
        let e = organizer.exec(v);
        for &input in &e.inputs {
            let d = resolve(input, &states);
            match classify_input(&states, d) {
                Kind::Skip => {}
                Kind::ConstNow => states[d.index()] = TensorState::Const,
                Kind::Touch => add_exec(&mut states, d, v, dm),
            }
        }
        for &output in &e.outputs {
            let d = resolve(output, &states);
            match classify_output(&states, d) {
                Kind::Skip => {}
                Kind::ConstNow => unreachable!("outputs never reclassify to Const"),
                Kind::Touch => add_exec(&mut states, d, v, dm),
            }
        }
    }

    Ok(states)
}
