//! # Memory Accessor Strategies
//!
//! This module contains the platform strategies that perform the low-level
//! memory mechanics: address lookup, view construction, rebinding, and bulk
//! set/copy.
//!
//! Each strategy implements the [`MemoryAccessor`] trait:
//!
//! - **libc** (`cfg(unix)`): `memset`/`memcpy`/`memmove` from the C library,
//!   page size from `sysconf(_SC_PAGESIZE)`, rebinds views in place
//! - **portable** (all targets): `core::ptr` intrinsics, fixed 4096-byte page
//!   size, always constructs a fresh view when rebinding
//!
//! Exactly one strategy is selected at initialisation by
//! [`select_accessor`], in a fixed preference order. The selection is never
//! revisited.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use crate::config::MemoryConfig;
use crate::error::{MemoryError, MemoryResult};
use crate::types::{Address, ElementKind};
use crate::view::{Origin, RawView};

pub mod portable;
#[cfg(unix)]
pub mod unix;

pub use portable::PortableAccessor;
#[cfg(unix)]
pub use unix::LibcAccessor;

/// Identity of an accessor strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind
{
    /// C library routines (unix only)
    Libc,
    /// `core::ptr` intrinsics, available everywhere
    Portable,
}

impl AccessorKind
{
    /// Preference order used when nothing is configured.
    pub const PREFERENCE: [AccessorKind; 2] = [AccessorKind::Libc, AccessorKind::Portable];

    /// Short lowercase name, as accepted by `FromStr`.
    pub const fn name(self) -> &'static str
    {
        match self {
            AccessorKind::Libc => "libc",
            AccessorKind::Portable => "portable",
        }
    }
}

impl fmt::Display for AccessorKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

impl FromStr for AccessorKind
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.trim().to_lowercase().as_str() {
            "libc" | "native" => Ok(AccessorKind::Libc),
            "portable" | "fallback" => Ok(AccessorKind::Portable),
            _ => Err(format!("Unknown memory accessor: {s}. Use 'libc' or 'portable'")),
        }
    }
}

/// Outcome of [`MemoryAccessor::rebind_view`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebind
{
    /// The passed view was updated in place
    InPlace,
    /// The strategy could not mutate the view; use this one instead
    Fresh(RawView),
}

/// Minimal contract every memory access strategy provides
///
/// Implementations must be stateless after construction: one instance is
/// shared by every thread for the life of the process.
pub trait MemoryAccessor: Send + Sync + fmt::Debug
{
    /// Which strategy this is.
    fn kind(&self) -> AccessorKind;

    /// Name recorded in diagnostics.
    fn name(&self) -> &'static str
    {
        self.kind().name()
    }

    /// Native page size in bytes.
    fn page_size(&self) -> usize;

    /// Size of a native pointer in bytes.
    fn pointer_size(&self) -> usize;

    /// Base address of a native-backed view.
    fn address_of(&self, view: &RawView) -> Address
    {
        view.address()
    }

    /// Build a view over `capacity` elements at `address`.
    fn new_view(&self, kind: ElementKind, address: Address, capacity: usize) -> RawView
    {
        RawView::new(kind, address, capacity, Origin::Native)
    }

    /// Point `view` at different memory, in place if the strategy allows it.
    fn rebind_view(&self, view: &mut RawView, address: Address, capacity: usize) -> Rebind;

    /// Fill `count` bytes at `address` with `value`.
    ///
    /// # Safety
    ///
    /// `address..address + count` must be writable.
    unsafe fn raw_set(&self, address: Address, value: u8, count: usize);

    /// Copy `count` bytes from `src` to `dst` (memcpy contract).
    ///
    /// # Safety
    ///
    /// Both ranges must be valid and must not overlap.
    unsafe fn raw_copy(&self, src: Address, dst: Address, count: usize);

    /// Copy `count` bytes from `src` to `dst`, tolerating overlap (memmove contract).
    ///
    /// # Safety
    ///
    /// Both ranges must be valid.
    unsafe fn raw_move(&self, src: Address, dst: Address, count: usize);

    /// Verify the strategy satisfies the minimal contract on this machine.
    fn probe(&self) -> MemoryResult<()>
    {
        probe_contract(self)
    }
}

/// Self-test shared by all strategies.
///
/// Checks the page size is a power of two, the pointer size is 4 or 8, that
/// set and copy produce the expected bytes on a scratch buffer, and that an
/// overlapping move shifts a distinct pattern intact.
pub fn probe_contract<A: MemoryAccessor + ?Sized>(accessor: &A) -> MemoryResult<()>
{
    let page_size = accessor.page_size();
    if !page_size.is_power_of_two() {
        return Err(MemoryError::AccessorUnavailable(format!(
            "{}: page size {page_size} is not a power of two",
            accessor.name()
        )));
    }

    let pointer_size = accessor.pointer_size();
    if pointer_size != 4 && pointer_size != 8 {
        return Err(MemoryError::AccessorUnavailable(format!(
            "{}: unsupported pointer size {pointer_size}",
            accessor.name()
        )));
    }

    let mut scratch = [0u8; 64];
    let base = Address::from_ptr(scratch.as_mut_ptr());
    // SAFETY: both ranges lie inside `scratch` and are disjoint.
    unsafe {
        accessor.raw_set(base, 0xA5, 32);
        accessor.raw_copy(base, base + 32, 32);
    }
    if scratch.iter().any(|&b| b != 0xA5) {
        return Err(MemoryError::AccessorUnavailable(format!(
            "{}: set/copy self-test produced unexpected bytes",
            accessor.name()
        )));
    }

    let mut pattern = [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
    let base = Address::from_ptr(pattern.as_mut_ptr());
    // SAFETY: both ranges lie inside `pattern`; they overlap on purpose.
    unsafe { accessor.raw_move(base, base + 1, 8) };
    if pattern[..10] != [0, 0, 1, 2, 3, 4, 5, 6, 7, 9] {
        return Err(MemoryError::AccessorUnavailable(format!(
            "{}: overlapping move self-test produced unexpected bytes",
            accessor.name()
        )));
    }

    Ok(())
}

fn candidate(kind: AccessorKind) -> Option<Box<dyn MemoryAccessor>>
{
    match kind {
        #[cfg(unix)]
        AccessorKind::Libc => Some(Box::new(LibcAccessor::new())),
        #[cfg(not(unix))]
        AccessorKind::Libc => None,
        AccessorKind::Portable => Some(Box::new(PortableAccessor::new())),
    }
}

/// Pick the first strategy, in preference order, that passes its probe.
///
/// A configured preferred strategy is tried first; the remaining strategies
/// keep their default order.
///
/// ## Errors
///
/// - `AccessorUnavailable`: no strategy passed its probe. This is fatal.
pub fn select_accessor(config: &MemoryConfig) -> MemoryResult<Box<dyn MemoryAccessor>>
{
    let mut order = AccessorKind::PREFERENCE.to_vec();
    if let Some(preferred) = config.preferred {
        order.retain(|kind| *kind != preferred);
        order.insert(0, preferred);
    }

    let mut failures = Vec::new();
    for kind in order {
        let Some(accessor) = candidate(kind) else {
            debug!(accessor = %kind, "Memory accessor not available on this platform");
            failures.push(format!("{kind}: not available on {}", std::env::consts::OS));
            continue;
        };

        match accessor.probe() {
            Ok(()) => {
                info!(
                    accessor = accessor.name(),
                    page_size = accessor.page_size(),
                    pointer_size = accessor.pointer_size(),
                    "Selected memory accessor"
                );
                return Ok(accessor);
            }
            Err(err) => {
                debug!(accessor = %kind, "Memory accessor probe failed: {err}");
                failures.push(err.to_string());
            }
        }
    }

    Err(MemoryError::AccessorUnavailable(failures.join("; ")))
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_accessor_kind_from_str()
    {
        assert_eq!("libc".parse::<AccessorKind>().unwrap(), AccessorKind::Libc);
        assert_eq!("NATIVE".parse::<AccessorKind>().unwrap(), AccessorKind::Libc);
        assert_eq!(" portable ".parse::<AccessorKind>().unwrap(), AccessorKind::Portable);
        assert!("unsafe".parse::<AccessorKind>().is_err());
    }

    #[test]
    fn test_default_selection_prefers_native()
    {
        let accessor = select_accessor(&MemoryConfig::default()).unwrap();
        if cfg!(unix) {
            assert_eq!(accessor.kind(), AccessorKind::Libc);
        } else {
            assert_eq!(accessor.kind(), AccessorKind::Portable);
        }
    }

    #[test]
    fn test_preferred_accessor_goes_first()
    {
        let config = MemoryConfig::default().with_preferred(AccessorKind::Portable);
        let accessor = select_accessor(&config).unwrap();
        assert_eq!(accessor.kind(), AccessorKind::Portable);
        assert_eq!(accessor.name(), "portable");
    }

    #[derive(Debug)]
    struct BrokenPageSize;

    impl MemoryAccessor for BrokenPageSize
    {
        fn kind(&self) -> AccessorKind
        {
            AccessorKind::Portable
        }

        fn page_size(&self) -> usize
        {
            3000
        }

        fn pointer_size(&self) -> usize
        {
            8
        }

        fn rebind_view(&self, view: &mut RawView, address: Address, capacity: usize) -> Rebind
        {
            view.rebind(address, capacity);
            Rebind::InPlace
        }

        unsafe fn raw_set(&self, _address: Address, _value: u8, _count: usize) {}

        unsafe fn raw_copy(&self, _src: Address, _dst: Address, _count: usize) {}

        unsafe fn raw_move(&self, _src: Address, _dst: Address, _count: usize) {}
    }

    #[test]
    fn test_probe_rejects_bad_page_size()
    {
        let err = BrokenPageSize.probe().unwrap_err();
        assert!(matches!(err, MemoryError::AccessorUnavailable(_)));
        assert!(err.to_string().contains("power of two"));
    }

    /// Sets and copies correctly but ignores moves.
    #[derive(Debug)]
    struct IgnoresMoves;

    impl MemoryAccessor for IgnoresMoves
    {
        fn kind(&self) -> AccessorKind
        {
            AccessorKind::Portable
        }

        fn page_size(&self) -> usize
        {
            4096
        }

        fn pointer_size(&self) -> usize
        {
            8
        }

        fn rebind_view(&self, view: &mut RawView, address: Address, capacity: usize) -> Rebind
        {
            view.rebind(address, capacity);
            Rebind::InPlace
        }

        unsafe fn raw_set(&self, address: Address, value: u8, count: usize)
        {
            // SAFETY: forwarded from the caller.
            unsafe { PortableAccessor::new().raw_set(address, value, count) };
        }

        unsafe fn raw_copy(&self, src: Address, dst: Address, count: usize)
        {
            // SAFETY: forwarded from the caller.
            unsafe { PortableAccessor::new().raw_copy(src, dst, count) };
        }

        unsafe fn raw_move(&self, _src: Address, _dst: Address, _count: usize) {}
    }

    #[test]
    fn test_probe_rejects_ignored_move()
    {
        let err = IgnoresMoves.probe().unwrap_err();
        assert!(matches!(err, MemoryError::AccessorUnavailable(_)));
        assert!(err.to_string().contains("overlapping move"));
    }
}
