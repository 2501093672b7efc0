//! Greedy best-fit-into-reusable-region allocator.
//!
//! This is the planner's centerpiece: it assigns every computable tensor a
//! `(buffer, offset)` pair such that interfering tensors never overlap,
//! while threading non-interfering tensors through shared buffer regions
//! as aggressively as it can. Grounded on the teacher's `planner.rs`
//! tracked-decision style, though the algorithm here is a single
//! fixed-point loop rather than a sequence of named passes.

use crate::dep_matrix::DepMatrix;
use crate::interference::{ordering, Interference};
use crate::organizer::SymbolOrganizer;
use crate::symbol::{TensorId, TensorState};
use std::collections::HashMap;

const SRC: usize = 0;

const fn snk(n: usize) -> usize {
    n + 1
}

const fn node_of(id: TensorId) -> usize {
    id.index() + 1
}

fn tensor_of(node: usize) -> TensorId {
    TensorId::new((node - 1) as u32)
}

#[derive(Clone, Copy)]
struct Edge {
    from: usize,
    to: usize,
    free: u64,
    offset: u64,
}

/// Assignment of every computable tensor to a buffer and byte offset,
/// plus the `alloc_dep` relation the materializer uses to order zero-init
/// operations safely.
pub struct Packing {
    pub assigned: HashMap<TensorId, usize>,
    pub offset: HashMap<TensorId, u64>,
    pub buffer_sizes: Vec<u64>,
    pub alloc_dep: HashMap<TensorId, Vec<TensorId>>,
}

struct OptEntry {
    index: TensorId,
    size: u64,
    companion: Option<TensorId>,
}

/// Hop contribution of one AllocGraph endpoint node. Sentinel nodes
/// (SRC/SNK) are always satisfied and contribute zero; an interior node
/// must have a strictly positive, defined hop against `tensor` in `dm` or
/// the edge doesn't qualify at all (`None` propagates up and disqualifies
/// the whole edge — the marker sentinel the design notes prescribe in
/// place of the source's `3 * rows` bound).
fn endpoint_hop(dm: &DepMatrix, node: usize, n: usize, tensor: TensorId, node_is_ancestor: bool) -> Option<u32> {
    if node == SRC || node == snk(n) {
        return Some(0);
    }
    let t = tensor_of(node);
    if node_is_ancestor {
        dm.hop(tensor, t)
    } else {
        dm.hop(t, tensor)
    }
}

/// Hop sum for placing `entry` at edge `e`, or `None` if `e` doesn't
/// qualify for this entry (an endpoint fails its ordering requirement).
fn edge_hop(dm: &DepMatrix, states: &[TensorState], e: Edge, n: usize, entry: &OptEntry) -> Option<u32> {
    let a = entry.index;
    match entry.companion {
        None => {
            let y_hop = endpoint_hop(dm, e.from, n, a, true);
            let a_hop = endpoint_hop(dm, e.to, n, a, false);
            Some(y_hop? + a_hop?)
        }
        Some(c) => {
            // `ordering(a, c)` returns `(a_after_c, c_after_a)`. "`a` before
            // companion" is `c_after_a` (every head of `c` follows every
            // tail of `a`), the *second* element, not the first.
            let (a_after_c, c_after_a) = ordering(states, dm, a, c);
            if c_after_a {
                let y_hop = endpoint_hop(dm, e.from, n, a, true);
                let c_hop = endpoint_hop(dm, e.to, n, c, false);
                Some(y_hop? + c_hop?)
            } else {
                debug_assert!(a_after_c, "non-interfering companion pair must have an order");
                let y_hop = endpoint_hop(dm, e.from, n, c, true);
                let a_hop = endpoint_hop(dm, e.to, n, a, false);
                Some(y_hop? + a_hop?)
            }
        }
    }
}

/// Run the packer to completion over every `Computable` tensor.
#[must_use]
pub fn pack(
    organizer: &SymbolOrganizer,
    states: &[TensorState],
    interference: &mut Interference,
    dm: &DepMatrix,
) -> Packing {
    let n = organizer.tensors.len();
    let mut unassigned: Vec<TensorId> = (0..n)
        .map(|i| TensorId::new(i as u32))
        .filter(|id| states[id.index()].is_computable())
        .collect();

    let mut assigned: HashMap<TensorId, usize> = HashMap::new();
    let mut offset: HashMap<TensorId, u64> = HashMap::new();
    let mut buffer_sizes: Vec<u64> = Vec::new();
    let mut edges: Vec<Edge> = Vec::new();

    while !unassigned.is_empty() {
        let max_oc = unassigned
            .iter()
            .map(|&id| interference.overlap_count(id))
            .max()
            .unwrap_or(0);
        let candidates: Vec<TensorId> = unassigned
            .iter()
            .copied()
            .filter(|&id| interference.overlap_count(id) == max_oc)
            .collect();

        let mut opt: Vec<OptEntry> = Vec::new();
        for &a in &candidates {
            let bytes_a = interference.bytes(a);
            opt.push(OptEntry { index: a, size: bytes_a, companion: None });
            for &k in &unassigned {
                if k == a {
                    continue;
                }
                let bytes_k = interference.bytes(k);
                if bytes_k > bytes_a && !interference.interferes(a, k) {
                    opt.push(OptEntry { index: a, size: bytes_k, companion: Some(k) });
                }
            }
        }
        // Larger entries first: on a hop tie the first-found wins, so
        // sorting by descending size makes the packer prefer filling wide
        // edges with the biggest tensor it can.
        opt.sort_by(|l, r| r.size.cmp(&l.size));

        // Pick the single (entry, edge) pair with the overall minimum hop
        // sum across every opt entry; an entry with no qualifying edge at
        // all falls back to opening a fresh buffer only if nothing else
        // qualifies anywhere.
        let mut global_best: Option<(usize, usize, u32)> = None;
        for (oi, entry) in opt.iter().enumerate() {
            let per_entry_best = edges
                .iter()
                .enumerate()
                .filter(|(_, &e)| e.free >= entry.size)
                .filter_map(|(ei, &e)| edge_hop(dm, states, e, n, entry).map(|h| (ei, h)))
                .min_by_key(|&(_, h)| h);
            if let Some((ei, h)) = per_entry_best {
                if global_best.is_none_or(|(_, _, best_h)| h < best_h) {
                    global_best = Some((oi, ei, h));
                }
            }
        }

        let (opt_idx, edge_idx) = match global_best {
            Some((oi, ei, _)) => (oi, Some(ei)),
            None => (0, None),
        };
        let a = opt[opt_idx].index;
        let size = opt[opt_idx].size;
        let companion = opt[opt_idx].companion;

        let (group, y, x, free, off) = match edge_idx {
            Some(idx) => {
                let e = edges[idx];
                let group = if e.from != SRC {
                    assigned[&tensor_of(e.from)]
                } else if e.to != snk(n) {
                    assigned[&tensor_of(e.to)]
                } else {
                    buffer_sizes.len()
                };
                (group, e.from, e.to, e.free, e.offset)
            }
            None => (buffer_sizes.len(), SRC, snk(n), size, 0u64),
        };

        if group == buffer_sizes.len() {
            buffer_sizes.push(size);
        } else if size > buffer_sizes[group] {
            buffer_sizes[group] = size;
        }

        assigned.insert(a, group);
        offset.insert(a, off);
        if let Some(c) = companion {
            assigned.insert(c, group);
            offset.insert(c, off);
        }

        if let Some(idx) = edge_idx {
            edges.remove(idx);
            let residual = free - size;
            if residual > 0 {
                edges.push(Edge { from: y, to: x, free: residual, offset: off + size });
            }
        }

        match companion {
            None => {
                edges.push(Edge { from: y, to: node_of(a), free: size, offset: off });
                edges.push(Edge { from: node_of(a), to: x, free: size, offset: off });
            }
            Some(c) => {
                // `ordering(a, c)` returns `(a_after_c, c_after_a)`; `a`
                // precedes the companion iff `c_after_a` holds (the second
                // element), not the first.
                let (_, a_before_c) = ordering(states, dm, a, c);
                let bytes_a = interference.bytes(a);
                let (near, far) = if a_before_c { (node_of(a), node_of(c)) } else { (node_of(c), node_of(a)) };
                edges.push(Edge { from: y, to: near, free: bytes_a, offset: off });
                edges.push(Edge { from: near, to: far, free: size, offset: off });
                edges.push(Edge { from: far, to: x, free: size, offset: off });
                // The residual always anchors at the companion's node, not
                // whichever of the two is temporally "far" — on the Y
                // side when `a` precedes the companion, on the X side
                // when the companion precedes `a`.
                if size > bytes_a {
                    let residual = size - bytes_a;
                    let off_c = off + bytes_a;
                    if a_before_c {
                        edges.push(Edge { from: y, to: node_of(c), free: residual, offset: off_c });
                    } else {
                        edges.push(Edge { from: node_of(c), to: x, free: residual, offset: off_c });
                    }
                }
            }
        }

        for &k in &unassigned {
            if k == a || Some(k) == companion {
                continue;
            }
            if interference.interferes(a, k) {
                *interference.overlap_count_mut(k) -= 1;
            }
            if let Some(c) = companion {
                if interference.interferes(c, k) {
                    *interference.overlap_count_mut(k) -= 1;
                }
            }
        }

        unassigned.retain(|&id| id != a && Some(id) != companion);
    }

    let mut alloc_dep: HashMap<TensorId, Vec<TensorId>> = HashMap::new();
    for e in &edges {
        if e.free > 0 && e.from != SRC && e.to != snk(n) {
            alloc_dep.entry(tensor_of(e.to)).or_default().push(tensor_of(e.from));
        }
    }

    Packing { assigned, offset, buffer_sizes, alloc_dep }
}
