//! # libc Memory Accessor
//!
//! Memory mechanics backed by the C library.
//!
//! ## C APIs Used
//!
//! - **sysconf(_SC_PAGESIZE)**: native page size, queried once
//! - **memset()**: fill a block with a byte value
//! - **memcpy()**: copy between non-overlapping blocks
//! - **memmove()**: copy between possibly overlapping blocks
//!
//! ## References
//!
//! - [sysconf(3) man page](https://man7.org/linux/man-pages/man3/sysconf.3.html)
//! - [memcpy(3) man page](https://man7.org/linux/man-pages/man3/memcpy.3.html)

use std::mem;

use libc::{c_int, c_void};
use once_cell::sync::Lazy;

use super::{AccessorKind, MemoryAccessor, Rebind};
use crate::types::Address;
use crate::view::RawView;

static SYSTEM_PAGE_SIZE: Lazy<usize> = Lazy::new(|| {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(size).ok().filter(|&size| size > 0).unwrap_or(4096)
});

/// Accessor backed by `libc`.
///
/// Views are plain values, so rebinding always succeeds in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibcAccessor;

impl LibcAccessor
{
    /// Create the accessor.
    pub fn new() -> Self
    {
        Self
    }
}

impl MemoryAccessor for LibcAccessor
{
    fn kind(&self) -> AccessorKind
    {
        AccessorKind::Libc
    }

    fn page_size(&self) -> usize
    {
        *SYSTEM_PAGE_SIZE
    }

    fn pointer_size(&self) -> usize
    {
        mem::size_of::<*const c_void>()
    }

    fn rebind_view(&self, view: &mut RawView, address: Address, capacity: usize) -> Rebind
    {
        view.rebind(address, capacity);
        Rebind::InPlace
    }

    unsafe fn raw_set(&self, address: Address, value: u8, count: usize)
    {
        // SAFETY: the caller guarantees the range is writable.
        unsafe { libc::memset(address.as_mut_ptr::<c_void>(), c_int::from(value), count) };
    }

    unsafe fn raw_copy(&self, src: Address, dst: Address, count: usize)
    {
        // SAFETY: the caller guarantees both ranges are valid and disjoint.
        unsafe { libc::memcpy(dst.as_mut_ptr::<c_void>(), src.as_ptr::<c_void>(), count) };
    }

    unsafe fn raw_move(&self, src: Address, dst: Address, count: usize)
    {
        // SAFETY: the caller guarantees both ranges are valid.
        unsafe { libc::memmove(dst.as_mut_ptr::<c_void>(), src.as_ptr::<c_void>(), count) };
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::types::ElementKind;
    use crate::view::Origin;

    #[test]
    fn test_page_size_is_power_of_two()
    {
        let accessor = LibcAccessor::new();
        assert!(accessor.page_size().is_power_of_two());
        assert_eq!(accessor.page_size(), accessor.page_size());
    }

    #[test]
    fn test_rebind_is_in_place()
    {
        let accessor = LibcAccessor::new();
        let mut view = accessor.new_view(ElementKind::Int, Address::new(0x1000), 4);
        let outcome = accessor.rebind_view(&mut view, Address::new(0x2000), 16);
        assert_eq!(outcome, Rebind::InPlace);
        assert_eq!(accessor.address_of(&view), Address::new(0x2000));
        assert_eq!(view.capacity(), 16);
        assert_eq!(view.origin(), Origin::Native);
    }

    #[test]
    fn test_probe_passes()
    {
        assert!(LibcAccessor::new().probe().is_ok());
    }
}
