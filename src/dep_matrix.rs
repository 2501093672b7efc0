//! Sparse longest-path partial order over exec symbols.
//!
//! Consulted at every tiebreak in [`crate::packer::Packer`]; a dense
//! `N×N` matrix would overbook memory at the graph sizes this crate is
//! built for (hundreds to low thousands of nodes), so this stores only the
//! `(successor, ancestor) -> hop_count` pairs that are actually comparable.

use crate::organizer::SymbolOrganizer;
use crate::symbol::ExecId;
use std::collections::HashMap;

/// `rows[successor][ancestor] = hop_count`, the longest directed path
/// length from `ancestor` to `successor`. Absence means incomparable.
pub struct DepMatrix {
    rows: HashMap<ExecId, HashMap<ExecId, u32>>,
    num_execs: usize,
}

impl DepMatrix {
    /// Build the matrix by a single topological visit of `order`
    /// (sources first). For each node `v`, propagate `v`'s own recorded
    /// ancestor column to every successor `w`, recording `(w, v) := 1` and
    /// `(w, a) := max(old, h + 1)` for every `(v, a) = h` already known.
    #[must_use]
    pub fn build(organizer: &SymbolOrganizer, order: &[ExecId]) -> Self {
        let mut rows: HashMap<ExecId, HashMap<ExecId, u32>> = HashMap::new();
        let order_set: std::collections::HashSet<ExecId> = order.iter().copied().collect();

        for &v in order {
            let ancestors_v = rows.get(&v).cloned().unwrap_or_default();
            for &w in &organizer.exec(v).successors {
                if !order_set.contains(&w) {
                    continue;
                }
                let entry = rows.entry(w).or_default();
                entry.entry(v).or_insert(1);
                for (&a, &h) in &ancestors_v {
                    let slot = entry.entry(a).or_insert(0);
                    *slot = (*slot).max(h + 1);
                }
            }
        }

        Self {
            rows,
            num_execs: order.len(),
        }
    }

    /// The longest path length from `ancestor` to `successor`, or `None`
    /// if they are incomparable (including when `ancestor == successor`).
    #[must_use]
    pub fn hop(&self, successor: ExecId, ancestor: ExecId) -> Option<u32> {
        self.rows.get(&successor)?.get(&ancestor).copied()
    }

    /// `true` iff `ancestor` strictly precedes `successor`.
    #[must_use]
    pub fn precedes(&self, ancestor: ExecId, successor: ExecId) -> bool {
        self.hop(successor, ancestor).is_some()
    }

    /// Number of nodes the matrix was built over. Used only to size
    /// diagnostics; the packer's "no edge qualified" sentinel is an
    /// explicit `None`, not a multiple of this.
    #[must_use]
    pub const fn num_execs(&self) -> usize {
        self.num_execs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organizer::PreBind;
    use crate::symbol::{ExecSymbol, MemType, TensorSymbol};
    use smallvec::smallvec;
    use std::sync::Arc;

    fn exec(successors: Vec<ExecId>) -> ExecSymbol {
        ExecSymbol {
            cmd: Arc::new(()),
            hint: Arc::new(()),
            inputs: vec![],
            outputs: vec![],
            inplace: false,
            successors,
        }
    }

    #[test]
    fn linear_chain_has_monotonic_hops() {
        let organizer = SymbolOrganizer {
            tensors: vec![TensorSymbol {
                dims: smallvec![1],
                mem_type: MemType::Host,
                device_id: 0,
                elem_size: 4,
                alias_of: None,
                init_to_zero: false,
            }],
            execs: vec![
                exec(vec![ExecId::new(1)]),
                exec(vec![ExecId::new(2)]),
                exec(vec![]),
            ],
            sources: vec![ExecId::new(0)],
            destinations: vec![ExecId::new(2)],
            prebinds: Vec::<PreBind>::new(),
        };
        let order = organizer.topological_order().unwrap();
        let dm = DepMatrix::build(&organizer, &order);

        assert_eq!(dm.hop(ExecId::new(1), ExecId::new(0)), Some(1));
        assert_eq!(dm.hop(ExecId::new(2), ExecId::new(0)), Some(2));
        assert_eq!(dm.hop(ExecId::new(2), ExecId::new(1)), Some(1));
        assert_eq!(dm.hop(ExecId::new(0), ExecId::new(2)), None);
    }
}
