//! Folds an inplace kernel's output tensor identity into its input tensor
//! identity when their lifetimes touch at exactly one point.
//!
//! This is a pure lifetime merge, not a storage decision — the Packer never
//! sees the folded-away output; `vt_tensor` resolution at arena-build time
//! is what actually makes reads of the folded output land on the input's
//! bytes.

use crate::organizer::SymbolOrganizer;
use crate::symbol::{ExecId, TensorId, TensorState};

fn follow_ref(mut id: TensorId, states: &[TensorState]) -> TensorId {
    loop {
        match &states[id.index()] {
            TensorState::Unassigned { ref_to: Some(r) } => id = *r,
            _ => return id,
        }
    }
}

/// Walk execs in topological order; for each kernel declaring `inplace`,
/// try to fold one (input, output) pair per input.
///
/// The match condition requires the *exact same* exec id at the input's
/// singleton tail and the output's singleton head — a stronger check than
/// "both antichains have length one", since two different singleton exec
/// ids would mean the lifetimes abut without actually coinciding.
pub fn fold(organizer: &SymbolOrganizer, order: &[ExecId], states: &mut [TensorState]) {
    for &idx in order {
        let e = organizer.exec(idx);
        if !e.inplace {
            continue;
        }
        for &raw_input in &e.inputs {
            let ref_id = follow_ref(raw_input, states);

            let tail_singleton: Option<ExecId> = match &states[ref_id.index()] {
                TensorState::Computable { tail, .. } if tail.len() == 1 => Some(tail[0]),
                _ => None,
            };
            let Some(tail_val) = tail_singleton else {
                continue;
            };
            let ref_dims = organizer.tensor(ref_id).dims.clone();

            for &output in &e.outputs {
                if output == ref_id {
                    continue;
                }
                let head_singleton: Option<ExecId> = match &states[output.index()] {
                    TensorState::Computable { head, .. } if head.len() == 1 => Some(head[0]),
                    _ => None,
                };
                let Some(head_val) = head_singleton else {
                    continue;
                };
                if head_val != tail_val {
                    continue;
                }
                if organizer.tensor(output).dims != ref_dims {
                    continue;
                }

                let output_tail = match &states[output.index()] {
                    TensorState::Computable { tail, .. } => tail.clone(),
                    _ => unreachable!("checked above"),
                };
                if let TensorState::Computable { tail, .. } = &mut states[ref_id.index()] {
                    *tail = output_tail;
                }
                states[output.index()] = TensorState::Unassigned {
                    ref_to: Some(ref_id),
                };
                // Only one output folds per input per exec: `ref_id`'s
                // state just changed, so a second match this round would
                // be against a stale cached tail value.
                break;
            }
        }
    }
}
