//! # Owned Buffers
//!
//! Heap storage owned by this crate, used wherever fresh backing memory is
//! needed (encoded text, scratch space). The allocation is zeroed, aligned to
//! [`BUFFER_ALIGN`] bytes so any element kind can be viewed over it, and freed
//! when the buffer is dropped.

use std::alloc::{self, Layout};
use std::fmt;
use std::mem;
use std::ptr::{self, NonNull};

use crate::error::{MemoryError, MemoryResult};
use crate::types::{Address, Element};
use crate::view::{ByteView, Origin, RawView, View};

/// Alignment of every `OwnedBuffer` allocation.
pub const BUFFER_ALIGN: usize = 16;

/// Zeroed, owning heap allocation.
pub struct OwnedBuffer
{
    ptr: NonNull<u8>,
    len: usize,
    layout: Layout,
}

// SAFETY: the buffer uniquely owns its allocation; shared access only hands out
// shared slices.
unsafe impl Send for OwnedBuffer {}
// SAFETY: see above.
unsafe impl Sync for OwnedBuffer {}

impl OwnedBuffer
{
    /// Allocate `size` zeroed bytes.
    ///
    /// ## Errors
    ///
    /// - `AllocationFailed`: the size is too large for a layout or the
    ///   allocator returned null.
    pub fn allocate(size: usize) -> MemoryResult<Self>
    {
        // Zero-sized requests still get a real allocation so the address is never null.
        let layout =
            Layout::from_size_align(size.max(1), BUFFER_ALIGN).map_err(|_| MemoryError::AllocationFailed { size })?;
        // SAFETY: the layout has a non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(MemoryError::AllocationFailed { size })?;
        Ok(Self { ptr, len: size, layout })
    }

    /// Allocate a buffer holding a copy of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> MemoryResult<Self>
    {
        let mut buffer = Self::allocate(bytes.len())?;
        buffer.as_mut_slice().copy_from_slice(bytes);
        Ok(buffer)
    }

    /// Allocate a larger buffer of `size` bytes holding the first `keep` bytes of this one.
    pub(crate) fn grown(&self, size: usize, keep: usize) -> MemoryResult<Self>
    {
        let mut next = Self::allocate(size)?;
        let keep = keep.min(self.len).min(size);
        next.as_mut_slice()[..keep].copy_from_slice(&self.as_slice()[..keep]);
        Ok(next)
    }

    /// Length in bytes.
    pub fn len(&self) -> usize
    {
        self.len
    }

    /// Returns `true` if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool
    {
        self.len == 0
    }

    /// Address of the first byte.
    pub fn address(&self) -> Address
    {
        Address::from_ptr(self.ptr.as_ptr())
    }

    /// Shorten the buffer. Has no effect if `len` is not smaller.
    pub fn truncate(&mut self, len: usize)
    {
        self.len = self.len.min(len);
    }

    /// The buffer's bytes.
    pub fn as_slice(&self) -> &[u8]
    {
        // SAFETY: `len` never exceeds the allocated size and the memory is initialised.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The buffer's bytes, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8]
    {
        // SAFETY: as above, and `&mut self` guarantees exclusivity.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Byte view over the whole buffer, marked as owned.
    pub fn view(&mut self) -> ByteView<'_>
    {
        self.typed_view()
    }

    /// Typed view over the whole buffer. Trailing bytes that do not fill a
    /// whole element are not covered.
    pub fn typed_view<T: Element>(&mut self) -> View<'_, T>
    {
        let capacity = self.len / mem::size_of::<T>();
        View::from_raw(RawView::new(T::KIND, self.address(), capacity, Origin::Owned))
    }
}

impl Drop for OwnedBuffer
{
    fn drop(&mut self)
    {
        // SAFETY: allocated in `allocate` with exactly this layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl AsRef<[u8]> for OwnedBuffer
{
    fn as_ref(&self) -> &[u8]
    {
        self.as_slice()
    }
}

impl Clone for OwnedBuffer
{
    fn clone(&self) -> Self
    {
        match Self::allocate(self.len) {
            Ok(mut copy) => {
                // SAFETY: both allocations hold at least `len` bytes and are distinct.
                unsafe { ptr::copy_nonoverlapping(self.ptr.as_ptr(), copy.ptr.as_ptr(), self.len) };
                copy
            }
            Err(_) => alloc::handle_alloc_error(self.layout),
        }
    }
}

impl fmt::Debug for OwnedBuffer
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("OwnedBuffer")
            .field("address", &self.address())
            .field("len", &self.len)
            .finish()
    }
}

impl PartialEq for OwnedBuffer
{
    fn eq(&self, other: &Self) -> bool
    {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for OwnedBuffer {}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_allocate_is_zeroed_and_aligned()
    {
        let buffer = OwnedBuffer::allocate(33).unwrap();
        assert_eq!(buffer.len(), 33);
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
        assert_eq!(buffer.address().value() % BUFFER_ALIGN, 0);
    }

    #[test]
    fn test_zero_sized_buffer_has_address()
    {
        let buffer = OwnedBuffer::allocate(0).unwrap();
        assert!(buffer.is_empty());
        assert!(!buffer.address().is_null());
    }

    #[test]
    fn test_grown_keeps_prefix()
    {
        let buffer = OwnedBuffer::from_slice(&[1, 2, 3, 4]).unwrap();
        let grown = buffer.grown(9, 3).unwrap();
        assert_eq!(grown.as_slice(), &[1, 2, 3, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_truncate()
    {
        let mut buffer = OwnedBuffer::from_slice(b"hello").unwrap();
        buffer.truncate(2);
        assert_eq!(buffer.as_slice(), b"he");
        buffer.truncate(10);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_views_are_owned()
    {
        let mut buffer = OwnedBuffer::allocate(10).unwrap();
        let address = buffer.address();
        {
            let view = buffer.typed_view::<i32>();
            assert_eq!(view.capacity(), 2);
            assert_eq!(view.origin(), Origin::Owned);
        }
        let mut view = buffer.view();
        view.put(9, 0xAB).unwrap();
        assert_eq!(view.address(), address);
        assert_eq!(buffer.as_slice()[9], 0xAB);
    }

    #[test]
    fn test_clone_is_deep()
    {
        let original = OwnedBuffer::from_slice(b"abc").unwrap();
        let copy = original.clone();
        assert_eq!(original, copy);
        assert_ne!(original.address(), copy.address());
    }
}
