//! Portable memory accessor built on `core::ptr`.

use std::mem;
use std::ptr;

use super::{AccessorKind, MemoryAccessor, Rebind};
use crate::types::Address;
use crate::view::RawView;

/// Page size assumed when the platform cannot be asked.
pub const FALLBACK_PAGE_SIZE: usize = 4096;

/// Accessor that works on every target.
///
/// It never mutates a view in place; rebinding hands back a fresh view.
#[derive(Debug, Default, Clone, Copy)]
pub struct PortableAccessor;

impl PortableAccessor
{
    /// Create the accessor.
    pub fn new() -> Self
    {
        Self
    }
}

impl MemoryAccessor for PortableAccessor
{
    fn kind(&self) -> AccessorKind
    {
        AccessorKind::Portable
    }

    fn page_size(&self) -> usize
    {
        FALLBACK_PAGE_SIZE
    }

    fn pointer_size(&self) -> usize
    {
        mem::size_of::<usize>()
    }

    fn rebind_view(&self, view: &mut RawView, address: Address, capacity: usize) -> Rebind
    {
        Rebind::Fresh(self.new_view(view.kind(), address, capacity))
    }

    unsafe fn raw_set(&self, address: Address, value: u8, count: usize)
    {
        // SAFETY: the caller guarantees the range is writable.
        unsafe { ptr::write_bytes(address.as_mut_ptr::<u8>(), value, count) };
    }

    unsafe fn raw_copy(&self, src: Address, dst: Address, count: usize)
    {
        // SAFETY: the caller guarantees both ranges are valid and disjoint.
        unsafe { ptr::copy_nonoverlapping(src.as_ptr::<u8>(), dst.as_mut_ptr::<u8>(), count) };
    }

    unsafe fn raw_move(&self, src: Address, dst: Address, count: usize)
    {
        // SAFETY: the caller guarantees both ranges are valid.
        unsafe { ptr::copy(src.as_ptr::<u8>(), dst.as_mut_ptr::<u8>(), count) };
    }
}
