//! Wraps the arrays handed over by the external symbol organizer.
//!
//! Symbolic-graph construction, auto-shape filling, and symbol tables are
//! someone else's problem (see `spec.md` non-goals); this module just holds
//! the two resolved arrays plus the source/destination/pre-bind sets and
//! exposes the one thing every downstream pass needs: a topological walk of
//! the bounded subgraph. Grounded on the teacher's `Pipeline`/`snapshot()`
//! pattern (a thin, shared container the planner passes take a read of).

use crate::arena::ConcreteTensor;
use crate::error::CompileError;
use crate::symbol::{ExecId, ExecSymbol, TensorId, TensorSymbol};
use std::collections::{HashSet, VecDeque};

/// A caller-supplied concrete tensor for a given symbol; the planner skips
/// allocation for it.
pub struct PreBind {
    pub symbol: TensorId,
    pub tensor: ConcreteTensor,
}

/// The resolved input to a `compile()` call.
pub struct SymbolOrganizer {
    pub tensors: Vec<TensorSymbol>,
    pub execs: Vec<ExecSymbol>,
    pub sources: Vec<ExecId>,
    pub destinations: Vec<ExecId>,
    pub prebinds: Vec<PreBind>,
}

impl SymbolOrganizer {
    #[must_use]
    pub fn tensor(&self, id: TensorId) -> &TensorSymbol {
        &self.tensors[id.index()]
    }

    #[must_use]
    pub fn exec(&self, id: ExecId) -> &ExecSymbol {
        &self.execs[id.index()]
    }

    /// Topological order of the subgraph reachable forward from `sources`,
    /// not walking past `destinations` — destination execs are visited but
    /// their successors are never enqueued, matching the DepMatrix
    /// contract that terminal nodes don't propagate themselves forward.
    ///
    /// # Errors
    /// Returns [`CompileError::OrderingCycle`] if the reachable subgraph is
    /// not a DAG (a malformed symbolic graph — a programmer contract
    /// violation, not a recoverable condition).
    pub fn topological_order(&self) -> Result<Vec<ExecId>, CompileError> {
        let dest_set: HashSet<ExecId> = self.destinations.iter().copied().collect();

        // Restrict the graph to what's reachable from `sources` without
        // stepping past a destination.
        let mut reachable: HashSet<ExecId> = HashSet::new();
        let mut frontier: VecDeque<ExecId> = self.sources.iter().copied().collect();
        while let Some(id) = frontier.pop_front() {
            if !reachable.insert(id) {
                continue;
            }
            if dest_set.contains(&id) {
                continue;
            }
            for &succ in &self.exec(id).successors {
                frontier.push_back(succ);
            }
        }

        let mut indegree: std::collections::HashMap<ExecId, usize> =
            reachable.iter().map(|&id| (id, 0)).collect();
        for &id in &reachable {
            if dest_set.contains(&id) {
                continue;
            }
            for &succ in &self.exec(id).successors {
                if reachable.contains(&succ) {
                    *indegree.get_mut(&succ).unwrap() += 1;
                }
            }
        }

        let mut queue: VecDeque<ExecId> = indegree
            .iter()
            .filter(|&(_, &d)| d == 0)
            .map(|(&id, _)| id)
            .collect();
        // Deterministic order: sort the initial frontier by raw id.
        let mut queue: Vec<ExecId> = queue.drain(..).collect();
        queue.sort_by_key(ExecId::index);
        let mut queue: VecDeque<ExecId> = queue.into();

        let mut order = Vec::with_capacity(reachable.len());
        while let Some(id) = queue.pop_front() {
            order.push(id);
            if dest_set.contains(&id) {
                continue;
            }
            for &succ in &self.exec(id).successors {
                if !reachable.contains(&succ) {
                    continue;
                }
                let d = indegree.get_mut(&succ).unwrap();
                *d -= 1;
                if *d == 0 {
                    queue.push_back(succ);
                }
            }
        }

        if order.len() != reachable.len() {
            // A cycle exists somewhere in the reachable subgraph; name an
            // arbitrary still-blocked pair to aid diagnosis.
            let stuck: Vec<ExecId> = reachable
                .into_iter()
                .filter(|id| !order.contains(id))
                .collect();
            let a = stuck.first().copied().unwrap_or(ExecId::new(0));
            let b = stuck.get(1).copied().unwrap_or(a);
            let a = self.exec(a).inputs.first().copied().unwrap_or(TensorId::new(0));
            let b = self.exec(b).inputs.first().copied().unwrap_or(TensorId::new(0));
            return Err(CompileError::OrderingCycle { a, b });
        }

        Ok(order)
    }
}
