//! Debug printers for inspecting a compiled graph during test development.

use crate::materialize::{ExecArena, ExecKind};
use crate::packer::Packing;

/// Print each buffer and the tensors packed into it, in offset order.
pub fn print_packing(packing: &Packing) {
    eprintln!("[Debug: packing] {} buffer(s)", packing.buffer_sizes.len());
    for (buf, &size) in packing.buffer_sizes.iter().enumerate() {
        eprintln!("  buffer {buf}: {size} bytes");
        let mut tenants: Vec<_> = packing
            .assigned
            .iter()
            .filter(|&(_, &b)| b == buf)
            .map(|(&id, _)| (id, packing.offset[&id]))
            .collect();
        tenants.sort_by_key(|&(_, off)| off);
        for (id, off) in tenants {
            eprintln!("    {id:?} @ {off}");
        }
    }
}

/// Print each materialized node and its successors.
pub fn print_exec_arena(exec_arena: &ExecArena) {
    eprintln!(
        "[Debug: exec_arena] {} node(s), source={}, sink={}",
        exec_arena.nodes.len(),
        exec_arena.source,
        exec_arena.sink
    );
    for (idx, node) in exec_arena.nodes.iter().enumerate() {
        let kind = match node.kind {
            ExecKind::Kernel(id) => format!("Kernel({id:?})"),
            ExecKind::ZeroInit(id) => format!("ZeroInit({id:?})"),
            ExecKind::Noop => "Noop".to_string(),
        };
        eprintln!("  [{idx}] {kind} -> {:?}", node.successors);
    }
}
