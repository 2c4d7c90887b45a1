//! # Error Types
//!
//! General error handling for native memory operations.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

use crate::types::Address;

/// What went wrong inside a charset coder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecFailure
{
    /// The input is not a legal sequence for the charset
    Malformed,
    /// The input is legal but has no mapping in the target charset
    Unmappable,
}

impl std::fmt::Display for CodecFailure
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        match self {
            CodecFailure::Malformed => f.write_str("malformed input"),
            CodecFailure::Unmappable => f.write_str("unmappable character"),
        }
    }
}

/// Main error type for native memory operations
///
/// ## Error Categories
///
/// 1. **Precondition errors**: InvalidArgument, RebindOwned, OutOfBounds
///    (raised only when checked mode is enabled, except bounds checks)
/// 2. **Codec errors**: Codec, UnsupportedCharset
/// 3. **Resource errors**: AllocationFailed
/// 4. **Initialisation errors**: AccessorUnavailable
/// 5. **Pin errors**: InvalidPin
#[derive(Error, Debug)]
pub enum MemoryError
{
    /// Invalid argument passed to a memory function
    ///
    /// Examples:
    /// - A null or negative address where a valid one is required
    /// - A capacity whose byte size does not fit in `isize`
    /// - Overlapping ranges passed to a memcpy-style copy
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Attempted to rebind a view whose memory is owned by an `OwnedBuffer`
    ///
    /// Only views over foreign native memory may be rebound. Rebinding an owning
    /// buffer's view would detach it from the allocation that backs it.
    #[error("Cannot rebind a view over owned memory at {address}")]
    RebindOwned
    {
        /// Base address of the rejected view
        address: Address,
    },

    /// Element index outside the view's capacity
    #[error("Index {index} out of bounds for view of capacity {capacity}")]
    OutOfBounds
    {
        /// Requested element index
        index: usize,
        /// Capacity of the view, in elements
        capacity: usize,
    },

    /// The input text could not be encoded or decoded
    ///
    /// Inputs are expected to be well-formed, so this aborts the whole
    /// operation; no partial output is ever returned.
    #[error("{charset} codec failed at position {position}: {kind}")]
    Codec
    {
        /// Canonical name of the charset
        charset: &'static str,
        /// Failure reported by the coder
        kind: CodecFailure,
        /// Offset into the input (code units or bytes) where coding stopped
        position: usize,
    },

    /// No charset is registered under the given name
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),

    /// The allocator could not provide the requested storage
    #[error("Failed to allocate {size} bytes")]
    AllocationFailed
    {
        /// Requested allocation size in bytes
        size: usize,
    },

    /// No memory accessor strategy satisfied the minimal contract
    ///
    /// This is a fatal configuration error. `Memory::global()` panics on it.
    #[error("No usable memory accessor: {0}")]
    AccessorUnavailable(String),

    /// The pin handle is unknown or was already released
    #[error("Invalid pin handle: 0x{0:x}")]
    InvalidPin(usize),
}

/// Convenience type alias for `Result<T, MemoryError>`
///
/// ```rust
/// use nativemem_core::error::MemoryResult;
/// fn foo() -> MemoryResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type MemoryResult<T> = std::result::Result<T, MemoryError>;
