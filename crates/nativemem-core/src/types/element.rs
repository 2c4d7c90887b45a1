//! Element kinds for typed views.

use std::fmt;

/// Width class of the elements a view exposes
///
/// The fixed kinds map directly onto C scalar types. `Pointer` has no fixed
/// width; it is resolved once from the selected accessor (4 or 8 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind
{
    /// 1 byte (`char`, `int8_t`, `uint8_t`)
    Byte,
    /// 2 bytes (`short`)
    Short,
    /// 2 bytes, UTF-16 code unit
    Char,
    /// 4 bytes (`int`)
    Int,
    /// 4 bytes (`float`)
    Float,
    /// 8 bytes (`long long`)
    Long,
    /// 8 bytes (`double`)
    Double,
    /// Platform pointer width
    Pointer,
}

impl ElementKind
{
    /// All kinds, in declaration order.
    pub const ALL: [ElementKind; 8] = [
        ElementKind::Byte,
        ElementKind::Short,
        ElementKind::Char,
        ElementKind::Int,
        ElementKind::Float,
        ElementKind::Long,
        ElementKind::Double,
        ElementKind::Pointer,
    ];

    /// Width in bytes for kinds with a fixed width; `None` for `Pointer`.
    pub const fn fixed_width(self) -> Option<usize>
    {
        match self {
            ElementKind::Byte => Some(1),
            ElementKind::Short | ElementKind::Char => Some(2),
            ElementKind::Int | ElementKind::Float => Some(4),
            ElementKind::Long | ElementKind::Double => Some(8),
            ElementKind::Pointer => None,
        }
    }

    /// Width in bytes, resolving `Pointer` with the given pointer size.
    pub const fn width(self, pointer_size: usize) -> usize
    {
        match self.fixed_width() {
            Some(width) => width,
            None => pointer_size,
        }
    }
}

impl fmt::Display for ElementKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            ElementKind::Byte => "byte",
            ElementKind::Short => "short",
            ElementKind::Char => "char",
            ElementKind::Int => "int",
            ElementKind::Float => "float",
            ElementKind::Long => "long",
            ElementKind::Double => "double",
            ElementKind::Pointer => "pointer",
        };
        f.write_str(name)
    }
}

mod sealed
{
    pub trait Sealed {}
}

/// A Rust scalar that can be read from and written to native memory.
///
/// Sealed: views rely on every implementor being plain old data whose size
/// equals the width of its kind.
pub trait Element: sealed::Sealed + Copy + fmt::Debug + 'static
{
    /// Kind this scalar is stored as.
    const KIND: ElementKind;
}

macro_rules! element {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty
            {
                const KIND: ElementKind = ElementKind::$kind;
            }
        )*
    };
}

element! {
    u8 => Byte,
    i16 => Short,
    u16 => Char,
    i32 => Int,
    f32 => Float,
    i64 => Long,
    f64 => Double,
    usize => Pointer,
}
