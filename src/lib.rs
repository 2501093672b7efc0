//! # arenac
//!
//! Lowers a symbolic tensor dataflow graph — kernel invocations over
//! [`symbol::TensorSymbol`]/[`symbol::ExecSymbol`] handles with no storage
//! yet assigned — into a runnable graph backed by a single pre-planned
//! memory arena.
//!
//! The symbolic graph itself (shape inference, symbol tables, the kernel
//! registry) is built by someone else; this crate only does the hard part
//! in between: given the finished symbol arrays, decide which tensors can
//! share storage, pack them into as few buffers as possible, and emit a
//! runnable graph of kernel/zero-init/fan-in nodes that reads and writes
//! the packed layout correctly.
//!
//! ## Pipeline
//!
//! [`compile`] runs seven stages in sequence, each pass consuming the
//! previous one's output:
//!
//! 1. [`organizer::SymbolOrganizer::topological_order`] — bound the subgraph
//!    reachable from the caller's sources without stepping past destinations.
//! 2. [`dep_matrix::DepMatrix::build`] — sparse longest-path partial order.
//! 3. [`liveness::compute`] — per-tensor head/tail antichains.
//! 4. [`inplace::fold`] — merge an inplace kernel's output identity into its
//!    input where lifetimes touch at exactly one point.
//! 5. [`interference::Interference::build`] — symmetric "may not share
//!    storage" relation plus per-tensor overlap counts.
//! 6. [`packer::pack`] — greedy best-fit placement into as few buffers as
//!    possible.
//! 7. [`arena::build`] + [`materialize::materialize`] — allocate the
//!    buffers and emit the runnable graph.
//!
//! ## Example
//!
//! ```no_run
//! use arenac::backend::HostBackend;
//! use arenac::organizer::SymbolOrganizer;
//! use std::sync::Arc;
//!
//! # fn build_organizer() -> SymbolOrganizer { unimplemented!() }
//! let organizer = build_organizer();
//! let output = arenac::compile(&organizer, Arc::new(HostBackend), arenac::CompileOptions::default())?;
//! let _ = output.arena.vt_tensor.len();
//! # Ok::<(), arenac::error::CompileError>(())
//! ```

pub mod arena;
pub mod backend;
pub mod dep_matrix;
pub mod error;
pub mod inplace;
pub mod interference;
pub mod liveness;
pub mod materialize;
pub mod organizer;
pub mod packer;
pub mod symbol;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod testing;

use std::sync::Arc;

use backend::ArenaBackend;
use error::CompileError;
use organizer::SymbolOrganizer;

/// Tunables for a single [`compile`] call. Not a config file or CLI (the
/// symbolic graph and its symbol tables are built elsewhere, per the
/// crate's non-goals) — just a `Default`-able struct the caller fills in,
/// the way `ironbeam::runner::Runner` took an `ExecMode`.
#[derive(Clone, Copy, Debug)]
pub struct CompileOptions {
    /// Byte alignment the Packer and ArenaBuilder round buffer sizes to.
    pub alignment: u64,
    /// Build the Interference matrix with `rayon` if the
    /// `parallel-interference` feature is enabled. Ignored otherwise.
    pub parallel_interference: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            alignment: 16,
            parallel_interference: cfg!(feature = "parallel-interference"),
        }
    }
}

/// Everything `compile()` produces: the packing decision, the physical
/// arena it was realized into, and the runnable exec graph over it.
pub struct CompileOutput {
    pub packing: packer::Packing,
    pub arena: arena::Arena,
    pub exec_arena: materialize::ExecArena,
    #[cfg(feature = "metrics")]
    pub metrics: metrics::CompileMetrics,
}

/// Run the full pipeline described in the crate's module docs.
///
/// # Errors
/// See [`CompileError`] for the invariant violations this can surface. A
/// well-formed symbolic graph never triggers any of them.
pub fn compile(
    organizer: &SymbolOrganizer,
    backend: Arc<dyn ArenaBackend>,
    options: CompileOptions,
) -> Result<CompileOutput, CompileError> {
    let order = organizer.topological_order()?;
    tracing::debug!(execs = order.len(), "topological order computed");

    let dm = dep_matrix::DepMatrix::build(organizer, &order);
    tracing::debug!(execs = dm.num_execs(), "dependency matrix built");

    let mut states = liveness::compute(organizer, &order, &dm)?;
    let computable = states.iter().filter(|s| s.is_computable()).count();
    tracing::debug!(computable, "liveness computed");

    inplace::fold(organizer, &order, &mut states);
    tracing::debug!("inplace folding complete");

    let mut interference = interference::Interference::build(organizer, &states, &dm, options.alignment, options.parallel_interference)?;
    tracing::debug!("interference matrix built");

    let packing = packer::pack(organizer, &states, &mut interference, &dm);
    tracing::debug!(buffers = packing.buffer_sizes.len(), "packing complete");

    let arena = arena::build(organizer, &states, &packing, backend, options.alignment)?;
    tracing::debug!(tensors = arena.vt_tensor.len(), "arena built");

    let exec_arena = materialize::materialize(organizer, &states, &packing, &order);
    tracing::debug!(nodes = exec_arena.nodes.len(), "exec graph materialized");

    #[cfg(feature = "metrics")]
    let metrics = metrics::CompileMetrics {
        tensors_total: organizer.tensors.len(),
        tensors_computable: computable,
        tensors_const: states.iter().filter(|s| matches!(s, symbol::TensorState::Const)).count(),
        inplace_folds: states.iter().filter(|s| matches!(s, symbol::TensorState::Unassigned { ref_to: Some(_) })).count(),
        buffers_opened: packing.buffer_sizes.len(),
        bytes_allocated: packing.buffer_sizes.iter().sum(),
        execs_materialized: exec_arena.nodes.len(),
        zero_init_nodes: exec_arena.nodes.iter().filter(|n| matches!(n.kind, materialize::ExecKind::ZeroInit(_))).count(),
    };

    Ok(CompileOutput {
        packing,
        arena,
        exec_arena,
        #[cfg(feature = "metrics")]
        metrics,
    })
}
