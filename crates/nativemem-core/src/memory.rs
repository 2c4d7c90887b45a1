//! # Memory Handle
//!
//! [`Memory`] is the entry point for every operation in this crate. It owns
//! the selected [`MemoryAccessor`], the page and pointer sizes cached at
//! initialisation, the checked-mode flag and the pin table.
//!
//! ## Lifecycle
//!
//! 1. Build a handle explicitly with [`Memory::init`] or
//!    [`Memory::with_config`], or let [`Memory::global`] build the
//!    process-wide one from the environment on first use
//! 2. Resolve addresses, construct views, copy memory
//! 3. The handle is never torn down or re-selected
//!
//! ## Checked mode
//!
//! With checks on, every entry point validates its arguments (non-null,
//! non-negative addresses, capacities whose byte size fits in `isize`, no
//! rebinding of owned views, no overlap for `copy`) and reports violations
//! as [`MemoryError`]s. With checks off the arguments go to the accessor
//! as-is; invalid input is then undefined behaviour.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::config::MemoryConfig;
use crate::error::{MemoryError, MemoryResult};
use crate::pin::{PinHandle, PinTable};
use crate::platform::{self, MemoryAccessor, Rebind};
use crate::types::{Address, Element, ElementKind};
use crate::view::{
    ByteView, CharView, DoubleView, FloatView, IntView, LongView, Origin, PointerView, ShortView, View,
};

static GLOBAL: OnceCell<Memory> = OnceCell::new();

/// Process-wide handle to the selected memory accessor.
pub struct Memory
{
    accessor: Box<dyn MemoryAccessor>,
    page_size: usize,
    pointer_size: usize,
    checked: bool,
    pins: PinTable,
}

impl fmt::Debug for Memory
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Memory")
            .field("accessor", &self.accessor.name())
            .field("page_size", &self.page_size)
            .field("pointer_size", &self.pointer_size)
            .field("checked", &self.checked)
            .field("pinned", &self.pins.len())
            .finish()
    }
}

macro_rules! typed_views {
    ($($(#[$doc:meta])* $name:ident => $view:ident;)*) => {
        $(
            $(#[$doc])*
            ///
            /// # Safety
            ///
            /// Same contract as [`Memory::view`].
            pub unsafe fn $name<'a>(&self, address: Address, capacity: usize) -> MemoryResult<$view<'a>>
            {
                // SAFETY: forwarded to the caller.
                unsafe { self.view(address, capacity) }
            }
        )*
    };
}

impl Memory
{
    /// Select an accessor using the configuration found in the environment.
    ///
    /// ## Errors
    ///
    /// - `AccessorUnavailable`: no strategy satisfied the minimal contract.
    pub fn init() -> MemoryResult<Self>
    {
        Self::with_config(&MemoryConfig::from_env())
    }

    /// Select an accessor using an explicit configuration.
    ///
    /// ## Errors
    ///
    /// - `AccessorUnavailable`: no strategy satisfied the minimal contract.
    pub fn with_config(config: &MemoryConfig) -> MemoryResult<Self>
    {
        let accessor = platform::select_accessor(config)?;
        Ok(Self::with_accessor(accessor, config.checked))
    }

    /// Wrap an already chosen accessor.
    pub fn with_accessor(accessor: Box<dyn MemoryAccessor>, checked: bool) -> Self
    {
        Self {
            page_size: accessor.page_size(),
            pointer_size: accessor.pointer_size(),
            accessor,
            checked,
            pins: PinTable::new(),
        }
    }

    /// The process-wide handle, initialised from the environment on first use.
    ///
    /// # Panics
    ///
    /// Panics if no accessor satisfies the minimal contract. The process
    /// cannot do anything useful without one.
    pub fn global() -> &'static Memory
    {
        GLOBAL.get_or_init(|| match Memory::init() {
            Ok(memory) => memory,
            Err(err) => panic!("native memory initialisation failed: {err}"),
        })
    }

    /// Install `self` as the process-wide handle.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: a global handle already exists.
    pub fn install(self) -> MemoryResult<&'static Memory>
    {
        GLOBAL
            .set(self)
            .map_err(|_| MemoryError::InvalidArgument("a global memory handle is already installed".to_string()))?;
        Ok(Self::global())
    }

    /// Name of the selected accessor strategy.
    pub fn accessor_name(&self) -> &'static str
    {
        self.accessor.name()
    }

    /// The selected accessor.
    pub fn accessor(&self) -> &dyn MemoryAccessor
    {
        self.accessor.as_ref()
    }

    /// Native page size in bytes; always a power of two.
    pub fn page_size(&self) -> usize
    {
        self.page_size
    }

    /// Native pointer size in bytes.
    pub fn pointer_size(&self) -> usize
    {
        self.pointer_size
    }

    /// Whether precondition checks are enabled.
    pub fn is_checked(&self) -> bool
    {
        self.checked
    }

    /// Width in bytes of an element of `kind`.
    pub fn element_width(&self, kind: ElementKind) -> usize
    {
        kind.width(self.pointer_size)
    }

    // --- Checks ---

    fn check_address(&self, address: Address, role: &str) -> MemoryResult<()>
    {
        if self.checked && !address.is_positive() {
            return Err(MemoryError::InvalidArgument(format!(
                "{role} address {address} must be non-null and non-negative"
            )));
        }
        Ok(())
    }

    fn check_byte_count(&self, bytes: usize) -> MemoryResult<()>
    {
        if self.checked && isize::try_from(bytes).is_err() {
            return Err(MemoryError::InvalidArgument(format!("byte count {bytes} exceeds isize::MAX")));
        }
        Ok(())
    }

    fn check_view_args(&self, kind: ElementKind, address: Address, capacity: usize) -> MemoryResult<()>
    {
        self.check_address(address, "view")?;
        if self.checked {
            let fits = capacity
                .checked_mul(self.element_width(kind))
                .is_some_and(|bytes| isize::try_from(bytes).is_ok());
            if !fits {
                return Err(MemoryError::InvalidArgument(format!(
                    "capacity {capacity} of {kind} elements exceeds isize::MAX bytes"
                )));
            }
        }
        Ok(())
    }

    // --- Address resolution ---

    /// Base address of `view`.
    pub fn address0<T: Element>(&self, view: &View<'_, T>) -> Address
    {
        self.accessor.address_of(view.raw())
    }

    /// Base address of `view`, or null if there is no view.
    pub fn address0_safe<T: Element>(&self, view: Option<&View<'_, T>>) -> Address
    {
        view.map_or(Address::NULL, |view| self.address0(view))
    }

    /// Address of the element at the view's cursor.
    pub fn address<T: Element>(&self, view: &View<'_, T>) -> Address
    {
        self.address_at(view, view.position())
    }

    /// Address of the element at `offset`.
    ///
    /// Computed as `address0(view) + offset * element_width(kind)`; the offset
    /// is not checked against the capacity.
    pub fn address_at<T: Element>(&self, view: &View<'_, T>, offset: usize) -> Address
    {
        self.address0(view) + offset.wrapping_mul(self.element_width(T::KIND))
    }

    /// [`Memory::address`], or null if there is no view.
    pub fn address_safe<T: Element>(&self, view: Option<&View<'_, T>>) -> Address
    {
        view.map_or(Address::NULL, |view| self.address(view))
    }

    /// [`Memory::address_at`], or null if there is no view.
    pub fn address_at_safe<T: Element>(&self, view: Option<&View<'_, T>>, offset: usize) -> Address
    {
        view.map_or(Address::NULL, |view| self.address_at(view, offset))
    }

    // --- View construction ---

    /// Create a view over `capacity` elements at `address`.
    ///
    /// The cursor starts at zero and the byte order is native.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument` (checked mode): null or negative address, or a
    ///   capacity whose byte size exceeds `isize::MAX`.
    ///
    /// # Safety
    ///
    /// For the whole lifetime `'a`, `address` must point to `capacity`
    /// elements of memory that stay allocated and are not accessed through
    /// other means in a conflicting way.
    pub unsafe fn view<'a, T: Element>(&self, address: Address, capacity: usize) -> MemoryResult<View<'a, T>>
    {
        self.check_view_args(T::KIND, address, capacity)?;
        Ok(View::from_raw(self.accessor.new_view(T::KIND, address, capacity)))
    }

    typed_views! {
        /// Byte view over native memory.
        byte_view => ByteView;
        /// Short view over native memory.
        short_view => ShortView;
        /// UTF-16 code unit view over native memory.
        char_view => CharView;
        /// Int view over native memory.
        int_view => IntView;
        /// Float view over native memory.
        float_view => FloatView;
        /// Long view over native memory.
        long_view => LongView;
        /// Double view over native memory.
        double_view => DoubleView;
        /// Pointer view over native memory.
        pointer_view => PointerView;
    }

    /// Point an existing view at different memory.
    ///
    /// Always use the returned view; the cursor of the result is zero.
    /// Depending on the accessor the binding is updated in place or a new
    /// view is built.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument` (checked mode): as for [`Memory::view`].
    /// - `RebindOwned` (checked mode): `view` borrows an `OwnedBuffer`.
    ///
    /// # Safety
    ///
    /// Same contract as [`Memory::view`] for the new address, capacity and
    /// lifetime `'b`.
    pub unsafe fn rebind<'b, T: Element>(
        &self,
        view: View<'_, T>,
        address: Address,
        capacity: usize,
    ) -> MemoryResult<View<'b, T>>
    {
        self.check_view_args(T::KIND, address, capacity)?;
        if self.checked && view.origin() == Origin::Owned {
            return Err(MemoryError::RebindOwned { address: view.address() });
        }

        let mut raw = view.into_raw();
        let raw = match self.accessor.rebind_view(&mut raw, address, capacity) {
            Rebind::InPlace => raw,
            Rebind::Fresh(fresh) => fresh,
        };
        Ok(View::from_raw(raw))
    }

    /// Byte view over the null-terminated string at `address`.
    ///
    /// The capacity is the number of bytes before the first zero byte; the
    /// terminator is not included. Returns `None` for a null address. Suitable
    /// for ASCII and UTF-8 text.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument` (checked mode): negative address, rejected before
    ///   anything is read.
    ///
    /// # Safety
    ///
    /// `address` must be null or point to readable memory containing a zero
    /// byte, and the bytes before it must stay valid for `'a`.
    pub unsafe fn byte_view_nt1<'a>(&self, address: Address) -> MemoryResult<Option<ByteView<'a>>>
    {
        if address.is_null() {
            return Ok(None);
        }
        self.check_address(address, "string")?;

        let probe: ByteView<'a> = View::from_raw(self.accessor.new_view(ElementKind::Byte, address, isize::MAX as usize));
        let mut size = 0;
        // SAFETY: the caller guarantees a terminator is reachable.
        while unsafe { probe.read_unchecked(size) } != 0 {
            size += 1;
        }

        // SAFETY: the scanned bytes are readable per the caller's contract.
        unsafe { self.rebind(probe, address, size) }.map(Some)
    }

    /// Byte view over the string at `address` terminated by a zero 16-bit unit.
    ///
    /// Units are read in native byte order two bytes at a time. The capacity
    /// is in bytes and excludes the terminator. Returns `None` for a null
    /// address. Suitable for UTF-16 text.
    ///
    /// ## Errors
    ///
    /// As for [`Memory::byte_view_nt1`].
    ///
    /// # Safety
    ///
    /// `address` must be null or point to readable memory containing a zero
    /// 16-bit unit at an even byte offset, and the bytes before it must stay
    /// valid for `'a`.
    pub unsafe fn byte_view_nt2<'a>(&self, address: Address) -> MemoryResult<Option<ByteView<'a>>>
    {
        if address.is_null() {
            return Ok(None);
        }
        self.check_address(address, "string")?;

        let probe: ByteView<'a> = View::from_raw(self.accessor.new_view(ElementKind::Byte, address, isize::MAX as usize));
        let mut size = 0;
        // SAFETY: the caller guarantees a terminator is reachable.
        while unsafe { probe.read_u16_unchecked(size) } != 0 {
            size += 2;
        }

        // SAFETY: the scanned bytes are readable per the caller's contract.
        unsafe { self.rebind(probe, address, size) }.map(Some)
    }

    // --- Direct memory access ---

    /// Fill `bytes` bytes at `address` with `value`.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument` (checked mode): null or negative address.
    ///
    /// # Safety
    ///
    /// `address..address + bytes` must be writable.
    pub unsafe fn set(&self, address: Address, value: u8, bytes: usize) -> MemoryResult<()>
    {
        self.check_address(address, "destination")?;
        self.check_byte_count(bytes)?;
        // SAFETY: forwarded to the caller.
        unsafe { self.accessor.raw_set(address, value, bytes) };
        Ok(())
    }

    /// Copy `bytes` bytes from `src` to `dst`.
    ///
    /// This has the `memcpy` contract: the ranges must not overlap. Use
    /// [`Memory::copy_overlapping`] when they may.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument` (checked mode): null or negative address, or
    ///   overlapping ranges.
    ///
    /// # Safety
    ///
    /// `src..src + bytes` must be readable, `dst..dst + bytes` writable, and
    /// the ranges must not overlap.
    pub unsafe fn copy(&self, src: Address, dst: Address, bytes: usize) -> MemoryResult<()>
    {
        self.check_address(src, "source")?;
        self.check_address(dst, "destination")?;
        self.check_byte_count(bytes)?;
        if self.checked && ranges_overlap(src, dst, bytes) {
            return Err(MemoryError::InvalidArgument(format!(
                "copy of {bytes} bytes from {src} to {dst} overlaps; use copy_overlapping"
            )));
        }
        // SAFETY: forwarded to the caller.
        unsafe { self.accessor.raw_copy(src, dst, bytes) };
        Ok(())
    }

    /// Copy `bytes` bytes from `src` to `dst`; the ranges may overlap.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument` (checked mode): null or negative address.
    ///
    /// # Safety
    ///
    /// `src..src + bytes` must be readable and `dst..dst + bytes` writable.
    pub unsafe fn copy_overlapping(&self, src: Address, dst: Address, bytes: usize) -> MemoryResult<()>
    {
        self.check_address(src, "source")?;
        self.check_address(dst, "destination")?;
        self.check_byte_count(bytes)?;
        // SAFETY: forwarded to the caller.
        unsafe { self.accessor.raw_move(src, dst, bytes) };
        Ok(())
    }

    // --- Pinning ---

    /// Pin `value` so native code can hold it as an opaque handle.
    pub fn pin<T: Any + Send + Sync>(&self, value: Arc<T>) -> PinHandle
    {
        self.pins.pin(value)
    }

    /// Look up a pinned value.
    pub fn resolve<T: Any + Send + Sync>(&self, handle: PinHandle) -> Option<Arc<T>>
    {
        self.pins.resolve(handle)
    }

    /// Release a pin. Must be called exactly once per handle.
    ///
    /// ## Errors
    ///
    /// - `InvalidPin`: the handle is unknown or already released.
    pub fn release(&self, handle: PinHandle) -> MemoryResult<Arc<dyn Any + Send + Sync>>
    {
        self.pins.release(handle)
    }

    /// Number of values currently pinned.
    pub fn pinned_count(&self) -> usize
    {
        self.pins.len()
    }
}

fn ranges_overlap(src: Address, dst: Address, bytes: usize) -> bool
{
    if bytes == 0 {
        return false;
    }
    match dst.offset_from(src) {
        Some(distance) => distance < bytes,
        None => src.offset_from(dst).is_some_and(|distance| distance < bytes),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::platform::AccessorKind;

    fn checked(kind: AccessorKind) -> Memory
    {
        Memory::with_config(&MemoryConfig::default().with_preferred(kind).with_checked(true)).unwrap()
    }

    #[test]
    fn test_ranges_overlap()
    {
        let a = Address::new(0x1000);
        assert!(ranges_overlap(a, a + 4, 8));
        assert!(ranges_overlap(a + 4, a, 8));
        assert!(!ranges_overlap(a, a + 8, 8));
        assert!(!ranges_overlap(a, a, 0));
    }

    #[test]
    fn test_handle_reports_accessor()
    {
        let memory = checked(AccessorKind::Portable);
        assert_eq!(memory.accessor_name(), "portable");
        assert_eq!(memory.accessor().kind(), AccessorKind::Portable);
        assert!(memory.is_checked());
        assert!(memory.page_size().is_power_of_two());
        assert_eq!(memory.pointer_size(), std::mem::size_of::<usize>());
        assert_eq!(memory.element_width(ElementKind::Pointer), memory.pointer_size());
        assert!(format!("{memory:?}").contains("portable"));
    }

    #[test]
    fn test_null_view_rejected_when_checked()
    {
        let memory = checked(AccessorKind::Portable);
        // SAFETY: rejected before any memory is touched.
        let result = unsafe { memory.byte_view(Address::NULL, 4) };
        assert!(matches!(result, Err(MemoryError::InvalidArgument(_))));
    }

    #[test]
    fn test_negative_address_rejected_when_checked()
    {
        let memory = checked(AccessorKind::Portable);
        let negative = Address::new(usize::MAX);
        // SAFETY: rejected before any memory is touched.
        assert!(unsafe { memory.set(negative, 0, 1) }.is_err());
        // SAFETY: as above.
        assert!(unsafe { memory.int_view(negative, 1) }.is_err());
    }

    #[test]
    fn test_terminated_scans_reject_negative_address_before_reading()
    {
        let memory = checked(AccessorKind::Portable);
        let negative = Address::new(usize::MAX - 7);
        // SAFETY: rejected before the scan reads anything.
        let narrow = unsafe { memory.byte_view_nt1(negative) };
        assert!(matches!(narrow, Err(MemoryError::InvalidArgument(_))));
        // SAFETY: as above.
        let wide = unsafe { memory.byte_view_nt2(negative) };
        assert!(matches!(wide, Err(MemoryError::InvalidArgument(_))));
    }

    #[test]
    fn test_oversized_capacity_rejected_when_checked()
    {
        let memory = checked(AccessorKind::Portable);
        // SAFETY: rejected before any memory is touched.
        let result = unsafe { memory.long_view(Address::new(0x1000), usize::MAX / 4) };
        assert!(matches!(result, Err(MemoryError::InvalidArgument(_))));
    }

    #[test]
    fn test_unchecked_mode_skips_validation()
    {
        let memory = Memory::with_config(&MemoryConfig::default().with_checked(false)).unwrap();
        // SAFETY: the view is never read.
        let view = unsafe { memory.byte_view(Address::NULL, 0) }.unwrap();
        assert!(view.address().is_null());
        assert_eq!(memory.address0_safe(Some(&view)), Address::NULL);
    }

    #[test]
    fn test_overlapping_copy_rejected_when_checked()
    {
        let memory = checked(AccessorKind::Portable);
        let mut bytes = [0u8; 16];
        let base = Address::from_ptr(bytes.as_mut_ptr());
        // SAFETY: rejected before any memory is touched.
        assert!(unsafe { memory.copy(base, base + 4, 8) }.is_err());
        // SAFETY: both ranges lie inside `bytes`.
        assert!(unsafe { memory.copy_overlapping(base, base + 4, 8) }.is_ok());
    }
}
