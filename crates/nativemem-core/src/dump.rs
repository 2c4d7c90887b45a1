//! Hex + ASCII rendering of memory, for diagnostics.

use std::fmt::Write;

use crate::types::Address;
use crate::view::ByteView;

/// Narrowest and widest supported row widths.
pub const ROW_WIDTH_RANGE: (usize, usize) = (8, 32);

/// Formats bytes into a traditional hex + ASCII view.
///
/// Each row starts with the address of its first byte, computed from `base`.
/// `width` is clamped to [`ROW_WIDTH_RANGE`].
pub fn format_hexdump(base: Address, bytes: &[u8], width: usize) -> String
{
    let width = width.clamp(ROW_WIDTH_RANGE.0, ROW_WIDTH_RANGE.1);
    let mut out = String::new();
    for (row, chunk) in bytes.chunks(width).enumerate() {
        let address = base.saturating_add(row * width);
        let _ = write!(out, "{:016x}: ", address.value());

        for column in 0..width {
            match chunk.get(column) {
                Some(byte) => {
                    let _ = write!(out, "{byte:02x} ");
                }
                None => out.push_str("   "),
            }
        }

        out.push(' ');
        out.extend(chunk.iter().map(|&byte| {
            if byte.is_ascii_graphic() || byte == b' ' {
                char::from(byte)
            } else {
                '.'
            }
        }));
        out.push('\n');
    }
    out
}

/// Hexdump of the bytes between a view's cursor and its capacity.
pub fn hexdump_view(view: &ByteView<'_>, width: usize) -> String
{
    format_hexdump(view.address() + view.position(), view.remaining_bytes(), width)
}
