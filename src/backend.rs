//! Device-agnostic allocation backend.
//!
//! The planner never allocates bytes itself; it hands sizes to a
//! `dyn ArenaBackend` and gets pointers back. This mirrors the teacher's
//! `Runner` talking to a `VecOps`/payload abstraction without knowing the
//! concrete element type — here the unknown is the device, not the type.

use crate::error::BackendError;
use crate::symbol::MemType;
use std::alloc::{alloc_zeroed, dealloc, Layout};

/// Host/device allocation contract. GPU backends are an extension point
/// only; this crate does not vendor one.
pub trait ArenaBackend: Send + Sync {
    /// Allocate `bytes` for `mem_type`/`device_id`. Returns a null-free
    /// pointer or a [`BackendError`].
    fn allocate(&self, mem_type: MemType, device_id: u32, bytes: u64) -> Result<*mut u8, BackendError>;

    /// Release a pointer previously returned by `allocate` for the same
    /// `mem_type`/`device_id`.
    ///
    /// # Safety
    /// `ptr` must have come from a prior `allocate` call on this backend
    /// with the same `mem_type`/`device_id`/`bytes`, and must not have
    /// already been released.
    unsafe fn release(&self, mem_type: MemType, device_id: u32, ptr: *mut u8, bytes: u64);
}

/// The only built-in backend: 16-byte-aligned host allocation via
/// `std::alloc`, zeroed so tensors that are never explicitly zero-inited
/// still start from a deterministic state. Device ids are ignored.
#[derive(Default)]
pub struct HostBackend;

const HOST_ALIGN: usize = 16;

impl ArenaBackend for HostBackend {
    fn allocate(&self, mem_type: MemType, _device_id: u32, bytes: u64) -> Result<*mut u8, BackendError> {
        if mem_type == MemType::Device {
            return Err(BackendError::UnsupportedMemType);
        }
        if bytes == 0 {
            // A zero-size allocation still needs a non-null, well-aligned
            // pointer other code can dangling-dereference safely.
            return Ok(std::ptr::NonNull::<u8>::dangling().as_ptr());
        }
        let layout = Layout::from_size_align(bytes as usize, HOST_ALIGN)
            .map_err(|_| BackendError::InvalidLayout { bytes })?;
        // SAFETY: layout has nonzero size, checked above.
        let ptr = unsafe { alloc_zeroed(layout) };
        if ptr.is_null() {
            return Err(BackendError::AllocationFailed { bytes });
        }
        Ok(ptr)
    }

    unsafe fn release(&self, _mem_type: MemType, _device_id: u32, ptr: *mut u8, bytes: u64) {
        if bytes == 0 {
            return;
        }
        if let Ok(layout) = Layout::from_size_align(bytes as usize, HOST_ALIGN) {
            // SAFETY: caller guarantees `ptr`/`bytes` match a prior `allocate`.
            unsafe { dealloc(ptr, layout) };
        }
    }
}
