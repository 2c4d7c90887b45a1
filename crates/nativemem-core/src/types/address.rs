//! Memory address type.

use std::fmt;
use std::ops::{Add, Sub};

/// Strongly typed native memory address
///
/// This wrapper around `usize` keeps addresses from being mixed up with
/// sizes, counts or element offsets. Zero is the reserved null sentinel and is
/// never a valid target for a read or write.
///
/// ## Example
///
/// ```rust
/// use nativemem_core::types::Address;
///
/// let addr = Address::from(0x1000);
/// let next_addr = addr + 0x100; // Add offset
/// assert_eq!(next_addr.value(), 0x1100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(usize);

impl Address
{
    /// The null address (0x0)
    pub const NULL: Self = Address(0);

    /// Create a new address from a `usize` value
    ///
    /// Usable in const contexts.
    ///
    /// ```rust
    /// use nativemem_core::types::Address;
    ///
    /// const BASE: Address = Address::new(0x7fff_0000);
    /// assert!(!BASE.is_null());
    /// ```
    pub const fn new(value: usize) -> Self
    {
        Address(value)
    }

    /// Get the raw `usize` value of this address
    pub const fn value(self) -> usize
    {
        self.0
    }

    /// Returns `true` for the null sentinel.
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Returns `true` if the address is neither null nor negative when read as
    /// a signed pointer-sized integer.
    pub const fn is_positive(self) -> bool
    {
        (self.0 as isize) > 0
    }

    /// Address of a raw pointer.
    pub fn from_ptr<T>(ptr: *const T) -> Self
    {
        Address(ptr as usize)
    }

    /// Reinterpret the address as a const pointer.
    pub const fn as_ptr<T>(self) -> *const T
    {
        self.0 as *const T
    }

    /// Reinterpret the address as a mutable pointer.
    pub const fn as_mut_ptr<T>(self) -> *mut T
    {
        self.0 as *mut T
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ```rust
    /// use nativemem_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(addr.checked_add(usize::MAX), None);
    /// ```
    pub fn checked_add(self, offset: usize) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Subtract an offset from this address, checking for underflow
    pub fn checked_sub(self, offset: usize) -> Option<Self>
    {
        self.0.checked_sub(offset).map(Address)
    }

    /// Add an offset to this address, saturating at the maximum value
    pub fn saturating_add(self, offset: usize) -> Self
    {
        Address(self.0.saturating_add(offset))
    }

    /// Distance in bytes from `other` up to `self`, or `None` if `other` lies above.
    pub fn offset_from(self, other: Address) -> Option<usize>
    {
        self.0.checked_sub(other.0)
    }
}

impl From<usize> for Address
{
    fn from(value: usize) -> Self
    {
        Address(value)
    }
}

impl From<Address> for usize
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl Add<usize> for Address
{
    type Output = Address;

    fn add(self, rhs: usize) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<usize> for Address
{
    type Output = Address;

    fn sub(self, rhs: usize) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}
