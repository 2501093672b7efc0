//! Pairwise "storage may not be reused" relation over computable tensors,
//! derived from [`crate::dep_matrix::DepMatrix`] and the liveness states.
//!
//! Unknown ordering is treated as interference — this matrix is consulted
//! by the Packer to decide what may share a buffer, and a false negative
//! there corrupts data, while a false positive only costs bytes.

use crate::dep_matrix::DepMatrix;
use crate::error::CompileError;
use crate::organizer::SymbolOrganizer;
use crate::symbol::{TensorId, TensorState};
use std::collections::HashMap;

/// `(a_after_b, b_after_a)`: whether every head of one strictly follows
/// every tail of the other. Both `a` and `b` must be `Computable`; callers
/// that already know a pair does not interfere (e.g. a companion pair in
/// [`crate::packer`]) use this to recover which one comes first.
#[must_use]
pub fn ordering(states: &[TensorState], dm: &DepMatrix, a: TensorId, b: TensorId) -> (bool, bool) {
    let (TensorState::Computable { head: head_a, tail: tail_a }, TensorState::Computable { head: head_b, tail: tail_b }) =
        (&states[a.index()], &states[b.index()])
    else {
        return (false, false);
    };

    let a_after_b = head_a
        .iter()
        .all(|&h| tail_b.iter().all(|&t| dm.precedes(t, h)));
    let b_after_a = head_b
        .iter()
        .all(|&h| tail_a.iter().all(|&t| dm.precedes(t, h)));
    (a_after_b, b_after_a)
}

/// Symmetric interference matrix plus per-tensor byte size and overlap
/// count, keyed by the full `TensorId` space (non-computable entries are
/// simply never consulted).
pub struct Interference {
    size: Vec<u64>,
    /// `pairs[(min(a,b), max(a,b))] = true` iff `a` and `b` interfere.
    pairs: HashMap<(TensorId, TensorId), bool>,
    oc: Vec<u32>,
}

impl Interference {
    /// `alignment` rounds each tensor's byte size the same way the Packer
    /// and `ArenaBuilder` do ([`crate::CompileOptions::alignment`]).
    /// `parallel` opts into a `rayon`-parallel build when the
    /// `parallel-interference` feature is compiled in
    /// ([`crate::CompileOptions::parallel_interference`]); ignored
    /// otherwise.
    ///
    /// # Errors
    /// [`CompileError::OrderingCycle`] if both `a_after_b` and `b_after_a`
    /// hold for some pair, which would mean DepMatrix recorded a cycle.
    pub fn build(
        organizer: &SymbolOrganizer,
        states: &[TensorState],
        dm: &DepMatrix,
        alignment: u64,
        parallel: bool,
    ) -> Result<Self, CompileError> {
        let n = organizer.tensors.len();
        let size: Vec<u64> = organizer.tensors.iter().map(|t| t.byte_size_aligned(alignment)).collect();
        let mut oc = vec![0u32; n];

        // Const tensors participate in the matrix (they always interfere)
        // even though the Packer never assigns them storage directly; only
        // `TensorState::Computable` entries are ever candidates in the
        // Packer's main loop.
        let sized: Vec<TensorId> = (0..n)
            .map(|i| TensorId::new(i as u32))
            .filter(|id| matches!(states[id.index()], TensorState::Computable { .. } | TensorState::Const))
            .collect();

        let pair_idx: Vec<(usize, usize)> = (0..sized.len())
            .flat_map(|i| ((i + 1)..sized.len()).map(move |j| (i, j)))
            .collect();

        let compute = |&(i, j): &(usize, usize)| {
            let (a, b) = (sized[i], sized[j]);
            Self::pair_interferes(states, dm, a, b).map(|v| (a, b, v))
        };

        #[cfg(feature = "parallel-interference")]
        let results: Vec<(TensorId, TensorId, bool)> = if parallel {
            use rayon::prelude::*;
            pair_idx.par_iter().map(compute).collect::<Result<Vec<_>, _>>()?
        } else {
            pair_idx.iter().map(compute).collect::<Result<Vec<_>, _>>()?
        };
        #[cfg(not(feature = "parallel-interference"))]
        let results: Vec<(TensorId, TensorId, bool)> = {
            let _ = parallel;
            pair_idx.iter().map(compute).collect::<Result<Vec<_>, _>>()?
        };

        let mut pairs = HashMap::new();
        for (a, b, interferes) in results {
            pairs.insert((a, b), interferes);
            if interferes {
                oc[a.index()] += 1;
                oc[b.index()] += 1;
            }
        }

        Ok(Self { size, pairs, oc })
    }

    fn pair_interferes(
        states: &[TensorState],
        dm: &DepMatrix,
        a: TensorId,
        b: TensorId,
    ) -> Result<bool, CompileError> {
        if matches!(states[a.index()], TensorState::Const)
            || matches!(states[b.index()], TensorState::Const)
        {
            return Ok(true);
        }

        let (a_after_b, b_after_a) = ordering(states, dm, a, b);
        if a_after_b && b_after_a {
            return Err(CompileError::OrderingCycle { a, b });
        }

        Ok(!(a_after_b || b_after_a))
    }

    #[must_use]
    pub fn bytes(&self, id: TensorId) -> u64 {
        self.size[id.index()]
    }

    #[must_use]
    pub fn overlap_count(&self, id: TensorId) -> u32 {
        self.oc[id.index()]
    }

    #[must_use]
    pub fn overlap_count_mut(&mut self, id: TensorId) -> &mut u32 {
        &mut self.oc[id.index()]
    }

    #[must_use]
    pub fn interferes(&self, a: TensorId, b: TensorId) -> bool {
        if a == b {
            return false;
        }
        let key = if a < b { (a, b) } else { (b, a) };
        self.pairs.get(&key).copied().unwrap_or(false)
    }
}
