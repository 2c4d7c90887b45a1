//! Common module for library exports

pub use crate::buffer::OwnedBuffer;
pub use crate::config::MemoryConfig;
pub use crate::error::{MemoryError, MemoryResult};
pub use crate::memory::Memory;
pub use crate::pin::PinHandle;
pub use crate::platform::{AccessorKind, MemoryAccessor};
pub use crate::text::{self, Charset, Termination};
pub use crate::types::{Address, Element, ElementKind};
pub use crate::view::{
    ByteOrder, ByteView, CharView, DoubleView, FloatView, IntView, LongView, Origin, PointerView, ShortView, View,
};
