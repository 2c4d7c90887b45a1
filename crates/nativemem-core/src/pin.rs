//! # Pinned Objects
//!
//! Opaque, address-sized handles for passing Rust values through native code
//! that expects a `void *` "user data" argument.
//!
//! Pinning moves a strong reference into a table keyed by a fresh nonzero
//! handle. The value stays alive and does not move until the handle is
//! released. Each handle must be released exactly once; releasing it again
//! is reported as an error.

use std::any::Any;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::error::{MemoryError, MemoryResult};
use crate::types::Address;

type Pinned = Arc<dyn Any + Send + Sync>;

/// Opaque handle of a pinned value. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinHandle(NonZeroUsize);

impl PinHandle
{
    /// Rebuild a handle from the raw value native code handed back.
    pub fn from_raw(value: usize) -> Option<Self>
    {
        NonZeroUsize::new(value).map(PinHandle)
    }

    /// Raw handle value.
    pub fn value(self) -> usize
    {
        self.0.get()
    }

    /// The handle as an address-sized value for native calls.
    pub fn address(self) -> Address
    {
        Address::new(self.value())
    }
}

/// Table of pinned values.
#[derive(Debug)]
pub struct PinTable
{
    next: AtomicUsize,
    entries: Mutex<HashMap<usize, Pinned>>,
}

impl Default for PinTable
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl PinTable
{
    /// Create an empty table.
    pub fn new() -> Self
    {
        Self {
            next: AtomicUsize::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<usize, Pinned>>
    {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_handle(&self, entries: &HashMap<usize, Pinned>) -> PinHandle
    {
        loop {
            let raw = self.next.fetch_add(1, Ordering::Relaxed);
            if let Some(handle) = PinHandle::from_raw(raw) {
                if !entries.contains_key(&handle.value()) {
                    return handle;
                }
            }
        }
    }

    /// Pin `value` and return its handle.
    pub fn pin<T: Any + Send + Sync>(&self, value: Arc<T>) -> PinHandle
    {
        let mut entries = self.entries();
        let handle = self.next_handle(&entries);
        entries.insert(handle.value(), value);
        trace!(handle = handle.value(), "Pinned object");
        handle
    }

    /// Look up a pinned value by handle.
    ///
    /// Returns `None` if the handle is not pinned or names a value of another type.
    pub fn resolve<T: Any + Send + Sync>(&self, handle: PinHandle) -> Option<Arc<T>>
    {
        let pinned = self.entries().get(&handle.value()).cloned()?;
        pinned.downcast::<T>().ok()
    }

    /// Release a pin, handing back the reference the table held.
    ///
    /// ## Errors
    ///
    /// - `InvalidPin`: the handle was never issued or was already released.
    pub fn release(&self, handle: PinHandle) -> MemoryResult<Arc<dyn Any + Send + Sync>>
    {
        let released = self
            .entries()
            .remove(&handle.value())
            .ok_or(MemoryError::InvalidPin(handle.value()))?;
        trace!(handle = handle.value(), "Released pinned object");
        Ok(released)
    }

    /// Number of values currently pinned.
    pub fn len(&self) -> usize
    {
        self.entries().len()
    }

    /// Returns `true` if nothing is pinned.
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }
}
