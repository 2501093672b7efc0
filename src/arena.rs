//! Physical buffers and the concrete tensors laid out over them.
//!
//! Allocation itself is delegated to a [`crate::backend::ArenaBackend`];
//! this module only decides *what* to allocate (one buffer per Packer
//! group) and builds the `vt_tensor` lookup the materializer consumes.
//! Grounded on the teacher's `runner.rs`, which owns the resources a plan
//! is executed against the same way this owns the buffers a graph runs
//! against.

use crate::backend::ArenaBackend;
use crate::error::CompileError;
use crate::organizer::SymbolOrganizer;
use crate::packer::Packing;
use crate::symbol::{MemType, TensorId, TensorState};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// A tensor backed by real bytes: either a freshly packed allocation, a
/// view sharing another tensor's storage, or a caller-supplied bind.
///
/// Holds a raw pointer rather than a borrow because its lifetime is tied
/// to the owning [`Arena`], not to any single Rust scope the planner runs
/// in; `Arena::vt_tensor` is the only supported way to reach one.
pub struct ConcreteTensor {
    pub dims: SmallVec<[usize; 4]>,
    pub mem_type: MemType,
    pub device_id: u32,
    ptr: *mut u8,
    pub byte_offset: u64,
}

// SAFETY: a `ConcreteTensor` is a plain descriptor over bytes owned by the
// `Arena` (or borrowed from the caller for pre-binds); it performs no
// interior mutation and the backend guarantees the pointer is valid for
// any thread the caller's runtime allows (spec §5).
unsafe impl Send for ConcreteTensor {}
unsafe impl Sync for ConcreteTensor {}

impl Clone for ConcreteTensor {
    fn clone(&self) -> Self {
        Self {
            dims: self.dims.clone(),
            mem_type: self.mem_type,
            device_id: self.device_id,
            ptr: self.ptr,
            byte_offset: self.byte_offset,
        }
    }
}

impl ConcreteTensor {
    #[must_use]
    pub fn new(dims: SmallVec<[usize; 4]>, mem_type: MemType, device_id: u32, ptr: *mut u8, byte_offset: u64) -> Self {
        Self { dims, mem_type, device_id, ptr, byte_offset }
    }

    /// The tensor's first byte. Valid only as long as the owning
    /// [`Arena`] (or, for a pre-bind, the caller's tensor) is alive.
    #[must_use]
    pub fn as_ptr(&self) -> *mut u8 {
        // SAFETY: `byte_offset` was computed to stay within the backing
        // buffer's allocated size at build time (`CompileError::OverflowOffset`
        // catches violations before this tensor is ever constructed).
        unsafe { self.ptr.add(self.byte_offset as usize) }
    }
}

struct Buffer {
    mem_type: MemType,
    device_id: u32,
    bytes: u64,
    ptr: *mut u8,
}

/// Owns every physical buffer the Packer decided to allocate, plus the
/// resolved `symbol_id -> concrete tensor` map.
pub struct Arena {
    backend: Arc<dyn ArenaBackend>,
    buffers: Vec<Buffer>,
    pub vt_tensor: HashMap<TensorId, ConcreteTensor>,
}

impl Drop for Arena {
    fn drop(&mut self) {
        for b in &self.buffers {
            // SAFETY: each `Buffer` was produced by a matching `allocate`
            // call on `self.backend` with these exact mem_type/device_id/bytes,
            // and is only ever released here, once.
            unsafe { self.backend.release(b.mem_type, b.device_id, b.ptr, b.bytes) };
        }
    }
}

fn resolve_alias_view(parent: &ConcreteTensor, dims: &SmallVec<[usize; 4]>) -> ConcreteTensor {
    // Tensor aliases are modeled but not algorithmically planned (non-goal):
    // an alias always inherits its parent's base pointer and byte offset,
    // re-declared with its own shape. A stride-aware view would need an
    // explicit per-alias byte offset and stride list, which the symbol
    // model here does not carry.
    ConcreteTensor::new(dims.clone(), parent.mem_type, parent.device_id, parent.ptr, parent.byte_offset)
}

/// Build the arena from a completed [`Packing`]. `alignment` must match the
/// value the Packer was run with ([`crate::CompileOptions::alignment`]); a
/// mismatch would make the containment check below meaningless.
///
/// # Errors
/// [`CompileError::MixedMemoryType`] if two computable tensors disagree on
/// memory type or device id. [`CompileError::OverflowOffset`] if the
/// Packer ever produced an offset past its own buffer's declared size (an
/// internal consistency check, not a caller-triggerable condition).
/// [`CompileError::ArenaExhausted`] if the backend fails to allocate.
pub fn build(
    organizer: &SymbolOrganizer,
    states: &[TensorState],
    packing: &Packing,
    backend: Arc<dyn ArenaBackend>,
    alignment: u64,
) -> Result<Arena, CompileError> {
    let mut shared: Option<(TensorId, MemType, u32)> = None;
    for i in 0..organizer.tensors.len() {
        let id = TensorId::new(i as u32);
        if !states[id.index()].is_computable() {
            continue;
        }
        let t = organizer.tensor(id);
        match shared {
            None => shared = Some((id, t.mem_type, t.device_id)),
            Some((first, mt, dev)) if mt != t.mem_type || dev != t.device_id => {
                return Err(CompileError::MixedMemoryType { a: first, b: id });
            }
            Some(_) => {}
        }
    }

    let mut buffers = Vec::with_capacity(packing.buffer_sizes.len());
    if let Some((_, mem_type, device_id)) = shared {
        for &bytes in &packing.buffer_sizes {
            let ptr = backend
                .allocate(mem_type, device_id, bytes)
                .map_err(|_| CompileError::ArenaExhausted { buffer: buffers.len(), bytes })?;
            buffers.push(Buffer { mem_type, device_id, bytes, ptr });
        }
    }

    let mut vt_tensor: HashMap<TensorId, ConcreteTensor> = HashMap::new();
    for i in 0..organizer.tensors.len() {
        let id = TensorId::new(i as u32);
        if !states[id.index()].is_computable() {
            continue;
        }
        let group = packing.assigned[&id];
        let offset = packing.offset[&id];
        let buf = &buffers[group];
        if offset + organizer.tensor(id).byte_size_aligned(alignment) > buf.bytes {
            return Err(CompileError::OverflowOffset {
                tensor: id,
                offset,
                size: organizer.tensor(id).byte_size_aligned(alignment),
                buffer: group,
                buffer_size: buf.bytes,
            });
        }
        vt_tensor.insert(id, ConcreteTensor::new(organizer.tensor(id).dims.clone(), buf.mem_type, buf.device_id, buf.ptr, offset));
    }

    // Unassigned-with-ref_to (inplace folds and bind forwards): the ref
    // always resolves in a single hop since InplaceFolder chases the
    // chain eagerly before recording it.
    for i in 0..organizer.tensors.len() {
        let id = TensorId::new(i as u32);
        if let TensorState::Unassigned { ref_to: Some(r) } = &states[id.index()] {
            if let Some(target) = vt_tensor.get(r).cloned() {
                vt_tensor.insert(id, target);
            }
        }
    }

    for i in 0..organizer.tensors.len() {
        let id = TensorId::new(i as u32);
        if let TensorState::Alias { parent } = &states[id.index()] {
            if let Some(parent_tensor) = vt_tensor.get(parent).cloned() {
                let view = resolve_alias_view(&parent_tensor, &organizer.tensor(id).dims);
                vt_tensor.insert(id, view);
            }
        }
    }

    for bind in &organizer.prebinds {
        debug_assert!(
            vt_tensor.get(&bind.symbol).is_none(),
            "pre-bound symbol {:?} was already built before the overlay",
            bind.symbol
        );
        vt_tensor.insert(bind.symbol, bind.tensor.clone());
    }

    Ok(Arena { backend, buffers, vt_tensor })
}
