//! Walks the symbolic graph once more, after the Packer has run, to build
//! the concrete exec graph: one node per kernel invocation plus whatever
//! zero-init and source/sink noops the packing demands.
//!
//! Grounded on the teacher's `runner.rs` + `node.rs`: a plain walk over a
//! topological order dispatching per node kind, the same shape, just
//! building a graph instead of executing one.

use crate::organizer::SymbolOrganizer;
use crate::packer::Packing;
use crate::symbol::{ExecId, TensorId, TensorState};
use std::collections::HashMap;

/// What a materialized exec node actually does.
pub enum ExecKind {
    /// Runs the kernel named by the original exec symbol.
    Kernel(ExecId),
    /// Zeroes `tensor` before its first real use; synthesized because the
    /// tensor's storage was reused from a prior tenant.
    ZeroInit(TensorId),
    /// A synthetic fan-in/fan-out point with no tensor effect.
    Noop,
}

pub struct ConcreteExec {
    pub kind: ExecKind,
    pub inputs: Vec<TensorId>,
    pub outputs: Vec<TensorId>,
    pub successors: Vec<usize>,
}

/// The materialized graph: every concrete node plus the resolved source
/// and sink.
pub struct ExecArena {
    pub nodes: Vec<ConcreteExec>,
    pub symbol_to_node: HashMap<ExecId, usize>,
    pub source: usize,
    pub sink: usize,
}

fn resolve_to_computable(mut id: TensorId, states: &[TensorState]) -> Option<TensorId> {
    loop {
        match &states[id.index()] {
            TensorState::Alias { parent } => id = *parent,
            TensorState::Unassigned { ref_to: Some(r) } => id = *r,
            TensorState::Computable { .. } => return Some(id),
            _ => return None,
        }
    }
}

/// Build the concrete exec graph for the already-packed plan.
#[must_use]
pub fn materialize(organizer: &SymbolOrganizer, states: &[TensorState], packing: &Packing, order: &[ExecId]) -> ExecArena {
    let mut nodes: Vec<ConcreteExec> = Vec::with_capacity(order.len());
    let mut symbol_to_node: HashMap<ExecId, usize> = HashMap::with_capacity(order.len());

    for &id in order {
        let e = organizer.exec(id);
        let idx = nodes.len();
        nodes.push(ConcreteExec {
            kind: ExecKind::Kernel(id),
            inputs: e.inputs.clone(),
            outputs: e.outputs.clone(),
            successors: Vec::new(),
        });
        symbol_to_node.insert(id, idx);
    }
    for &id in order {
        let idx = symbol_to_node[&id];
        for &succ in &organizer.exec(id).successors {
            if let Some(&sidx) = symbol_to_node.get(&succ) {
                nodes[idx].successors.push(sidx);
            }
        }
    }

    let mut lazy_source_noop: Option<usize> = None;
    let mut zero_init_created = false;

    for i in 0..organizer.tensors.len() {
        let id = TensorId::new(i as u32);
        if !organizer.tensor(id).init_to_zero {
            continue;
        }
        let Some(resolved) = resolve_to_computable(id, states) else {
            continue;
        };
        let TensorState::Computable { head, .. } = &states[resolved.index()] else {
            continue;
        };
        if head.is_empty() {
            continue;
        }

        let set_idx = nodes.len();
        nodes.push(ConcreteExec {
            kind: ExecKind::ZeroInit(resolved),
            inputs: Vec::new(),
            outputs: vec![resolved],
            successors: Vec::new(),
        });
        for &h in head {
            nodes[set_idx].successors.push(symbol_to_node[&h]);
        }
        zero_init_created = true;

        let preds = packing.alloc_dep.get(&resolved).filter(|ps| !ps.is_empty());
        if let Some(preds) = preds {
            for &p in preds {
                let TensorState::Computable { tail, .. } = &states[p.index()] else {
                    continue;
                };
                for &t in tail {
                    let tidx = symbol_to_node[&t];
                    nodes[tidx].successors.push(set_idx);
                }
            }
        } else {
            let src_idx = match lazy_source_noop {
                Some(idx) => idx,
                None => {
                    let idx = nodes.len();
                    nodes.push(ConcreteExec { kind: ExecKind::Noop, inputs: Vec::new(), outputs: Vec::new(), successors: Vec::new() });
                    lazy_source_noop = Some(idx);
                    idx
                }
            };
            nodes[src_idx].successors.push(set_idx);
        }
    }

    let need_source_wrap = zero_init_created || organizer.sources.len() > 1;
    let source = if need_source_wrap {
        let idx = match lazy_source_noop {
            Some(idx) => idx,
            None => {
                let idx = nodes.len();
                nodes.push(ConcreteExec { kind: ExecKind::Noop, inputs: Vec::new(), outputs: Vec::new(), successors: Vec::new() });
                idx
            }
        };
        for &s in &organizer.sources {
            if let Some(&sidx) = symbol_to_node.get(&s) {
                nodes[idx].successors.push(sidx);
            }
        }
        idx
    } else {
        symbol_to_node[&organizer.sources[0]]
    };

    let need_sink_wrap = organizer.destinations.len() > 1;
    let sink = if need_sink_wrap {
        let idx = nodes.len();
        nodes.push(ConcreteExec { kind: ExecKind::Noop, inputs: Vec::new(), outputs: Vec::new(), successors: Vec::new() });
        for &d in &organizer.destinations {
            if let Some(&didx) = symbol_to_node.get(&d) {
                nodes[didx].successors.push(idx);
            }
        }
        idx
    } else {
        symbol_to_node[&organizer.destinations[0]]
    };

    ExecArena { nodes, symbol_to_node, source, sink }
}
