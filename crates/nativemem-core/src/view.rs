//! # Typed Views
//!
//! Bounded, non-owning windows over native memory.
//!
//! A view is a plain value: base address, element capacity and a cursor. It
//! never frees the memory it names. Views over foreign memory are created
//! through the `unsafe` constructors on [`Memory`](crate::Memory), where the
//! caller picks the lifetime `'a` (the same contract as
//! `std::slice::from_raw_parts`). Views over an [`OwnedBuffer`](crate::OwnedBuffer)
//! borrow the buffer instead.
//!
//! Element access is always bounds-checked against the capacity and uses
//! unaligned, native-endian loads and stores.

use std::marker::PhantomData;
use std::mem;
use std::ptr;

use crate::error::{MemoryError, MemoryResult};
use crate::types::{Address, Element, ElementKind};

/// Who owns the memory behind a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin
{
    /// Foreign memory named by a raw address; the view may be rebound.
    Native,
    /// Memory owned by an `OwnedBuffer`; rebinding is rejected in checked mode.
    Owned,
}

/// Byte order of multi-byte elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder
{
    /// Least significant byte first
    LittleEndian,
    /// Most significant byte first
    BigEndian,
}

impl ByteOrder
{
    /// Byte order of the target platform.
    pub const NATIVE: ByteOrder = if cfg!(target_endian = "big") {
        ByteOrder::BigEndian
    } else {
        ByteOrder::LittleEndian
    };
}

/// Untyped binding of a view, as handled by memory accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawView
{
    address: Address,
    capacity: usize,
    kind: ElementKind,
    origin: Origin,
}

impl RawView
{
    pub(crate) const fn new(kind: ElementKind, address: Address, capacity: usize, origin: Origin) -> Self
    {
        Self {
            address,
            capacity,
            kind,
            origin,
        }
    }

    /// Base address.
    pub const fn address(&self) -> Address
    {
        self.address
    }

    /// Capacity in elements.
    pub const fn capacity(&self) -> usize
    {
        self.capacity
    }

    /// Element kind.
    pub const fn kind(&self) -> ElementKind
    {
        self.kind
    }

    /// Owner of the backing memory.
    pub const fn origin(&self) -> Origin
    {
        self.origin
    }

    /// Point this binding at different native memory.
    ///
    /// A rebound view always names foreign memory, whatever it named before.
    pub(crate) fn rebind(&mut self, address: Address, capacity: usize)
    {
        self.address = address;
        self.capacity = capacity;
        self.origin = Origin::Native;
    }
}

/// Bounded window over native memory holding elements of type `T`.
///
/// Views are neither `Send` nor `Sync`; concurrent use of the same memory
/// must be synchronised by the caller.
#[derive(Debug)]
pub struct View<'a, T: Element>
{
    raw: RawView,
    position: usize,
    _marker: PhantomData<(&'a mut [T], *mut T)>,
}

/// View over bytes.
pub type ByteView<'a> = View<'a, u8>;
/// View over 16-bit signed integers.
pub type ShortView<'a> = View<'a, i16>;
/// View over UTF-16 code units.
pub type CharView<'a> = View<'a, u16>;
/// View over 32-bit signed integers.
pub type IntView<'a> = View<'a, i32>;
/// View over 32-bit floats.
pub type FloatView<'a> = View<'a, f32>;
/// View over 64-bit signed integers.
pub type LongView<'a> = View<'a, i64>;
/// View over 64-bit floats.
pub type DoubleView<'a> = View<'a, f64>;
/// View over pointer-sized values.
pub type PointerView<'a> = View<'a, usize>;

impl<'a, T: Element> View<'a, T>
{
    /// Wrap an accessor-produced binding.
    ///
    /// The binding's kind must be `T::KIND`; memory validity is the
    /// responsibility of whoever produced the binding.
    pub(crate) fn from_raw(raw: RawView) -> Self
    {
        debug_assert_eq!(raw.kind(), T::KIND);
        Self {
            raw,
            position: 0,
            _marker: PhantomData,
        }
    }

    /// Consume the view, returning its binding.
    pub fn into_raw(self) -> RawView
    {
        self.raw
    }

    /// The view's binding.
    pub fn raw(&self) -> &RawView
    {
        &self.raw
    }

    /// Base address of the view.
    pub fn address(&self) -> Address
    {
        self.raw.address()
    }

    /// Capacity in elements.
    pub fn capacity(&self) -> usize
    {
        self.raw.capacity()
    }

    /// Element kind of the view.
    pub fn kind(&self) -> ElementKind
    {
        T::KIND
    }

    /// Owner of the backing memory.
    pub fn origin(&self) -> Origin
    {
        self.raw.origin()
    }

    /// Byte order of multi-byte elements; always the native order.
    pub fn byte_order(&self) -> ByteOrder
    {
        ByteOrder::NATIVE
    }

    /// Current cursor position, in elements.
    pub fn position(&self) -> usize
    {
        self.position
    }

    /// Move the cursor. `position` may equal the capacity.
    pub fn set_position(&mut self, position: usize) -> MemoryResult<()>
    {
        if position > self.capacity() {
            return Err(MemoryError::OutOfBounds {
                index: position,
                capacity: self.capacity(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Reset the cursor to zero.
    pub fn rewind(&mut self)
    {
        self.position = 0;
    }

    /// Elements between the cursor and the capacity.
    pub fn remaining(&self) -> usize
    {
        self.capacity() - self.position
    }

    /// Returns `true` if the cursor has not reached the capacity.
    pub fn has_remaining(&self) -> bool
    {
        self.position < self.capacity()
    }

    fn check_index(&self, index: usize) -> MemoryResult<()>
    {
        if index >= self.capacity() {
            return Err(MemoryError::OutOfBounds {
                index,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    /// Absolute read without bounds checking.
    ///
    /// # Safety
    ///
    /// `index` must name an element inside readable memory.
    pub(crate) unsafe fn read_unchecked(&self, index: usize) -> T
    {
        let ptr = self.address().as_ptr::<u8>().wrapping_add(index * mem::size_of::<T>());
        // SAFETY: guaranteed by the caller.
        unsafe { ptr::read_unaligned(ptr.cast::<T>()) }
    }

    /// Read the element at `index`.
    pub fn get(&self, index: usize) -> MemoryResult<T>
    {
        self.check_index(index)?;
        // SAFETY: the index is within the capacity the view was created with.
        Ok(unsafe { self.read_unchecked(index) })
    }

    /// Write `value` at `index`.
    pub fn put(&mut self, index: usize, value: T) -> MemoryResult<()>
    {
        self.check_index(index)?;
        let ptr = self.address().as_mut_ptr::<u8>().wrapping_add(index * mem::size_of::<T>());
        // SAFETY: the index is within the capacity the view was created with.
        unsafe { ptr::write_unaligned(ptr.cast::<T>(), value) };
        Ok(())
    }

    /// Read the element at the cursor and advance it.
    pub fn read(&mut self) -> MemoryResult<T>
    {
        let value = self.get(self.position)?;
        self.position += 1;
        Ok(value)
    }

    /// Write `value` at the cursor and advance it.
    pub fn write(&mut self, value: T) -> MemoryResult<()>
    {
        self.put(self.position, value)?;
        self.position += 1;
        Ok(())
    }

    /// Copy the elements between the cursor and the capacity.
    pub fn to_vec(&self) -> Vec<T>
    {
        // SAFETY: every index in position..capacity is inside the view.
        (self.position..self.capacity()).map(|index| unsafe { self.read_unchecked(index) }).collect()
    }
}

impl View<'_, u8>
{
    /// All bytes of the view.
    pub fn as_slice(&self) -> &[u8]
    {
        if self.capacity() == 0 {
            return &[];
        }
        // SAFETY: the view names `capacity` readable bytes for its lifetime and
        // byte slices have no alignment requirement.
        unsafe { std::slice::from_raw_parts(self.address().as_ptr::<u8>(), self.capacity()) }
    }

    /// Bytes between the cursor and the capacity.
    pub fn remaining_bytes(&self) -> &[u8]
    {
        &self.as_slice()[self.position..]
    }

    /// Native-endian 16-bit load at a byte offset, without bounds checking.
    ///
    /// # Safety
    ///
    /// Two readable bytes must exist at `byte_index`.
    pub(crate) unsafe fn read_u16_unchecked(&self, byte_index: usize) -> u16
    {
        let ptr = self.address().as_ptr::<u8>().wrapping_add(byte_index);
        // SAFETY: guaranteed by the caller.
        unsafe { ptr::read_unaligned(ptr.cast::<u16>()) }
    }

    /// Native-endian 16-bit load at a byte offset.
    pub fn get_u16(&self, byte_index: usize) -> MemoryResult<u16>
    {
        self.check_index(byte_index.saturating_add(1))?;
        // SAFETY: both bytes are inside the view.
        Ok(unsafe { self.read_u16_unchecked(byte_index) })
    }

    /// Native-endian 16-bit store at a byte offset.
    pub fn put_u16(&mut self, byte_index: usize, value: u16) -> MemoryResult<()>
    {
        self.check_index(byte_index.saturating_add(1))?;
        let ptr = self.address().as_mut_ptr::<u8>().wrapping_add(byte_index);
        // SAFETY: both bytes are inside the view.
        unsafe { ptr::write_unaligned(ptr.cast::<u16>(), value) };
        Ok(())
    }
}
