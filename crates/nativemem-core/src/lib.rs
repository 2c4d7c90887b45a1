//! # nativemem-core
//!
//! Memory primitives for native library bindings.
//!
//! This crate provides the plumbing a binding layer needs to exchange data
//! with C libraries:
//! - Typed, bounded views over native memory, and owning heap buffers
//! - Resolution of a view's base or cursor address for passing to native code
//! - Rebinding views to different memory, and scanning null-terminated strings
//! - Text encoding and decoding (ASCII, Latin-1, UTF-8, UTF-16)
//! - `memset`/`memcpy`/`memmove` style direct memory operations
//! - Pinning Rust values behind opaque handles native code can hold
//!
//! ## Platform Support
//!
//! The low-level mechanics are delegated to a [`MemoryAccessor`] selected once
//! at start-up:
//! - **libc** (unix): C library routines, page size from `sysconf`
//! - **portable** (everywhere): `core::ptr` intrinsics
//!
//! ## Why unsafe code is needed
//!
//! Native libraries hand out raw addresses with no ownership or lifetime
//! attached. Turning those into views, or copying memory between them, cannot
//! be verified by the compiler, so the constructors that accept raw addresses
//! are `unsafe fn`s with documented contracts. Everything built on top of a
//! view (element access, decoding, hexdumps) is safe and bounds-checked.
//!
//! ## Example
//!
//! ```rust
//! use nativemem_core::prelude::*;
//!
//! let memory = Memory::with_config(&MemoryConfig::default())?;
//! let buffer = text::encode_ascii("ABC", Termination::NullTerminated)?;
//!
//! // SAFETY: the buffer outlives the view and holds a terminator.
//! let view = unsafe { memory.byte_view_nt1(buffer.address())? }.expect("non-null address");
//! assert_eq!(view.capacity(), 3);
//! assert_eq!(text::decode_ascii(Some(&view)).as_deref(), Some("ABC"));
//! # Ok::<(), MemoryError>(())
//! ```

#![allow(unsafe_code)] // Required for raw memory access on addresses handed out by native code
#![deny(unsafe_op_in_unsafe_fn)]

pub mod buffer;
pub mod config;
pub mod dump;
pub mod error;
pub mod memory;
pub mod pin;
pub mod platform;
pub mod prelude;
pub mod text;
pub mod types;
pub mod view;

pub use buffer::OwnedBuffer;
pub use config::MemoryConfig;
// Re-export commonly used types
pub use error::{MemoryError, MemoryResult};
pub use memory::Memory;
pub use pin::PinHandle;
pub use platform::{AccessorKind, MemoryAccessor};
pub use types::{Address, Element, ElementKind};
pub use view::{ByteOrder, ByteView, Origin, View};
