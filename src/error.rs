//! Fatal, typed compile errors.
//!
//! A well-formed symbolic graph never triggers these (see spec §7 in
//! DESIGN.md's terms: "failure semantics"). They exist to name programmer
//! contract violations with the offending symbol id(s), not to model
//! recoverable conditions — there is no partial-failure path in `compile()`.

use crate::symbol::TensorId;
use thiserror::Error;

/// Errors surfaced by [`crate::backend::ArenaBackend`] implementations.
/// Wrapped into [`CompileError::ArenaExhausted`] at the `ArenaBuilder`
/// boundary, the way the teacher's `planner.rs`/`runner.rs` convert
/// `anyhow::Error` into caller-facing types at the edge.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend does not support this memory type")]
    UnsupportedMemType,
    #[error("invalid allocation layout for {bytes} bytes")]
    InvalidLayout { bytes: u64 },
    #[error("allocation of {bytes} bytes failed")]
    AllocationFailed { bytes: u64 },
}

/// All fatal invariant violations a `compile()` call can raise.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("tensors {a:?} and {b:?} have different memory types/devices")]
    MixedMemoryType { a: TensorId, b: TensorId },

    #[error("alias tensor {0:?} has an alias as its parent")]
    AliasOfAlias(TensorId),

    #[error("tensors {a:?} and {b:?} both precede each other in dependency order")]
    OrderingCycle { a: TensorId, b: TensorId },

    #[error(
        "tensor {tensor:?} offset {offset} + size {size} exceeds buffer {buffer} of size {buffer_size}"
    )]
    OverflowOffset {
        tensor: TensorId,
        offset: u64,
        size: u64,
        buffer: usize,
        buffer_size: u64,
    },

    #[error("backend failed to allocate {bytes} bytes for buffer {buffer}")]
    ArenaExhausted { buffer: usize, bytes: u64 },
}
