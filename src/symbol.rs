//! Symbol-level data model: the typed IDs and descriptors the rest of the
//! crate operates on.
//!
//! [`TensorId`] and [`ExecId`] are small `Copy` handles into the arrays
//! handed over by the symbol organizer (see [`crate::organizer`]) — only the
//! planner and materializer inspect them directly, the same way a node id
//! was an opaque handle into a pipeline graph in the teacher crate.

use smallvec::SmallVec;
use std::any::Any;
use std::sync::Arc;

/// Unique numeric identifier for a tensor symbol.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TensorId(u32);

impl TensorId {
    /// Construct from a raw index (used internally by the organizer).
    #[must_use]
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unique numeric identifier for an exec symbol.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ExecId(u32);

impl ExecId {
    /// Construct from a raw index (used internally by the organizer).
    #[must_use]
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a tensor's bytes live.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MemType {
    Host,
    Device,
}

/// An opaque, caller-supplied payload (kernel command, hint, ...).
///
/// The kernel registry and hint inference are external collaborators; the
/// planner never inspects these, it only threads them through to the
/// materialized graph. Grounded on the teacher's `type_token::Partition`
/// type-erasure pattern.
pub type OpaquePayload = Arc<dyn Any + Send + Sync>;

/// A symbolic tensor: shape and placement metadata, no storage yet.
#[derive(Clone)]
pub struct TensorSymbol {
    pub dims: SmallVec<[usize; 4]>,
    pub mem_type: MemType,
    pub device_id: u32,
    /// Bytes per element of this tensor's dtype. Opaque to the planner
    /// beyond this multiplier — dtype registries live outside this crate.
    pub elem_size: u32,
    /// Parent tensor if this is a view. Invariant: the parent is never
    /// itself an alias.
    pub alias_of: Option<TensorId>,
    pub init_to_zero: bool,
}

impl TensorSymbol {
    #[must_use]
    pub fn elem_count(&self) -> u64 {
        self.dims.iter().product::<usize>() as u64
    }

    /// Storage footprint rounded up to `alignment` bytes, the unit the
    /// Packer and ArenaBuilder reason about. `alignment` comes from
    /// [`crate::CompileOptions::alignment`] at compile time.
    #[must_use]
    pub fn byte_size_aligned(&self, alignment: u64) -> u64 {
        align_up(self.elem_count() * u64::from(self.elem_size), alignment)
    }

    /// [`Self::byte_size_aligned`] at the crate's default 16-byte alignment.
    /// Kept for callers (tests, fixtures) that don't thread a
    /// [`crate::CompileOptions`] through.
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        self.byte_size_aligned(16)
    }
}

/// Round `n` up to the next multiple of `alignment` (`alignment` a power of
/// two).
#[must_use]
pub const fn align_up(n: u64, alignment: u64) -> u64 {
    (n + alignment - 1) & !(alignment - 1)
}

/// A symbolic kernel invocation: inputs, outputs, and successors.
#[derive(Clone)]
pub struct ExecSymbol {
    pub cmd: OpaquePayload,
    pub hint: OpaquePayload,
    pub inputs: Vec<TensorId>,
    pub outputs: Vec<TensorId>,
    pub inplace: bool,
    pub successors: Vec<ExecId>,
}

/// Minimal antichain of exec ids: no element dominates another in
/// [`crate::dep_matrix::DepMatrix`] order. Small by construction (most
/// tensors have one producer and a handful of consumers), so a `SmallVec`
/// avoids a heap allocation in the common case.
pub type Antichain = SmallVec<[ExecId; 2]>;

/// Per-tensor planner state. Replaces a bit-flag with an explicit sum type:
/// `head`/`tail` only make sense for `Computable`.
#[derive(Clone)]
pub enum TensorState {
    /// Never referenced, pre-bound by the caller, or folded away by
    /// [`crate::inplace::InplaceFolder`] (in which case `ref_to` is set).
    Unassigned { ref_to: Option<TensorId> },
    /// A view into `parent`'s storage; never planned independently.
    Alias { parent: TensorId },
    /// Read before any write was observed: live across the whole subgraph.
    Const,
    /// Has a liveness range and gets a planner assignment.
    Computable { head: Antichain, tail: Antichain },
}

impl TensorState {
    #[must_use]
    pub const fn is_computable(&self) -> bool {
        matches!(self, Self::Computable { .. })
    }
}
