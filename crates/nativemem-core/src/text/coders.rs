//! Encoder and decoder implementations for every [`Charset`].
//!
//! All coders are stateless between calls: anything incomplete at the end of
//! a chunk is left in the input cursor, so `reset` and `flush` keep their
//! default no-op behaviour.

use super::charset::{ByteCursor, CharCursor, Charset, CharsetDecoder, CharsetEncoder, CoderResult};
use crate::view::ByteOrder;

/// Next scalar value in a UTF-16 unit sequence.
enum Scalar
{
    /// A valid character spanning this many units
    Char(char, usize),
    /// A high surrogate at the end of the input; more input may complete it
    Incomplete,
    /// A lone surrogate
    Malformed,
}

fn next_scalar(units: &[u16], end_of_input: bool) -> Scalar
{
    let Some(&first) = units.first() else {
        return Scalar::Incomplete;
    };
    match first {
        0xD800..=0xDBFF => match units.get(1) {
            Some(&low) if (0xDC00..=0xDFFF).contains(&low) => {
                let code = 0x10000 + (((u32::from(first) - 0xD800) << 10) | (u32::from(low) - 0xDC00));
                char::from_u32(code).map_or(Scalar::Malformed, |ch| Scalar::Char(ch, 2))
            }
            None if !end_of_input => Scalar::Incomplete,
            _ => Scalar::Malformed,
        },
        0xDC00..=0xDFFF => Scalar::Malformed,
        _ => char::from_u32(u32::from(first)).map_or(Scalar::Malformed, |ch| Scalar::Char(ch, 1)),
    }
}

fn read_unit(order: ByteOrder, bytes: [u8; 2]) -> u16
{
    match order {
        ByteOrder::LittleEndian => u16::from_le_bytes(bytes),
        ByteOrder::BigEndian => u16::from_be_bytes(bytes),
    }
}

fn write_unit(order: ByteOrder, unit: u16) -> [u8; 2]
{
    match order {
        ByteOrder::LittleEndian => unit.to_le_bytes(),
        ByteOrder::BigEndian => unit.to_be_bytes(),
    }
}

// --- Single-byte charsets ---

fn encode_single_byte(
    input: &mut CharCursor<'_>,
    output: &mut [u8],
    end_of_input: bool,
    max: u16,
) -> (CoderResult, usize)
{
    let mut written = 0;
    while let Some(&unit) = input.as_slice().first() {
        if unit > max {
            let result = match next_scalar(input.as_slice(), end_of_input) {
                Scalar::Char(_, len) => CoderResult::Unmappable(len),
                Scalar::Incomplete => CoderResult::Underflow,
                Scalar::Malformed => CoderResult::Malformed(1),
            };
            return (result, written);
        }
        let Some(slot) = output.get_mut(written) else {
            return (CoderResult::Overflow, written);
        };
        *slot = (unit & 0xFF) as u8;
        written += 1;
        input.advance(1);
    }
    (CoderResult::Underflow, written)
}

/// US-ASCII encoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsciiEncoder;

impl CharsetEncoder for AsciiEncoder
{
    fn charset(&self) -> Charset
    {
        Charset::UsAscii
    }

    fn average_bytes_per_char(&self) -> f32
    {
        1.0
    }

    fn encode(&mut self, input: &mut CharCursor<'_>, output: &mut [u8], end_of_input: bool) -> (CoderResult, usize)
    {
        encode_single_byte(input, output, end_of_input, 0x7F)
    }
}

/// ISO-8859-1 encoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct Latin1Encoder;

impl CharsetEncoder for Latin1Encoder
{
    fn charset(&self) -> Charset
    {
        Charset::Iso8859_1
    }

    fn average_bytes_per_char(&self) -> f32
    {
        1.0
    }

    fn encode(&mut self, input: &mut CharCursor<'_>, output: &mut [u8], end_of_input: bool) -> (CoderResult, usize)
    {
        encode_single_byte(input, output, end_of_input, 0xFF)
    }
}

/// US-ASCII decoder. Bytes above 0x7F are malformed.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsciiDecoder;

impl CharsetDecoder for AsciiDecoder
{
    fn charset(&self) -> Charset
    {
        Charset::UsAscii
    }

    fn average_chars_per_byte(&self) -> f32
    {
        1.0
    }

    fn decode(&mut self, input: &mut ByteCursor<'_>, output: &mut [u16], _end_of_input: bool) -> (CoderResult, usize)
    {
        let mut written = 0;
        while let Some(&byte) = input.as_slice().first() {
            if byte > 0x7F {
                return (CoderResult::Malformed(1), written);
            }
            let Some(slot) = output.get_mut(written) else {
                return (CoderResult::Overflow, written);
            };
            *slot = u16::from(byte);
            written += 1;
            input.advance(1);
        }
        (CoderResult::Underflow, written)
    }
}

/// ISO-8859-1 decoder. Every byte maps to the code point of the same value.
#[derive(Debug, Default, Clone, Copy)]
pub struct Latin1Decoder;

impl CharsetDecoder for Latin1Decoder
{
    fn charset(&self) -> Charset
    {
        Charset::Iso8859_1
    }

    fn average_chars_per_byte(&self) -> f32
    {
        1.0
    }

    fn decode(&mut self, input: &mut ByteCursor<'_>, output: &mut [u16], _end_of_input: bool) -> (CoderResult, usize)
    {
        let count = input.remaining().min(output.len());
        for (slot, &byte) in output.iter_mut().zip(&input.as_slice()[..count]) {
            *slot = u16::from(byte);
        }
        input.advance(count);
        let result = if input.has_remaining() {
            CoderResult::Overflow
        } else {
            CoderResult::Underflow
        };
        (result, count)
    }
}

// --- UTF-8 ---

/// UTF-8 encoder. Lone surrogates are malformed.
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8Encoder;

impl CharsetEncoder for Utf8Encoder
{
    fn charset(&self) -> Charset
    {
        Charset::Utf8
    }

    fn average_bytes_per_char(&self) -> f32
    {
        1.1
    }

    fn encode(&mut self, input: &mut CharCursor<'_>, output: &mut [u8], end_of_input: bool) -> (CoderResult, usize)
    {
        let mut written = 0;
        while input.has_remaining() {
            let (ch, consumed) = match next_scalar(input.as_slice(), end_of_input) {
                Scalar::Char(ch, consumed) => (ch, consumed),
                Scalar::Incomplete => return (CoderResult::Underflow, written),
                Scalar::Malformed => return (CoderResult::Malformed(1), written),
            };
            let len = ch.len_utf8();
            if output.len() - written < len {
                return (CoderResult::Overflow, written);
            }
            ch.encode_utf8(&mut output[written..written + len]);
            written += len;
            input.advance(consumed);
        }
        (CoderResult::Underflow, written)
    }
}

enum Utf8Step
{
    Char(char),
    Incomplete,
    Malformed(usize),
}

fn next_utf8(bytes: &[u8]) -> Utf8Step
{
    let head = &bytes[..bytes.len().min(4)];
    let valid = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(err) if err.valid_up_to() > 0 => std::str::from_utf8(&head[..err.valid_up_to()]).unwrap_or_default(),
        Err(err) => return err.error_len().map_or(Utf8Step::Incomplete, Utf8Step::Malformed),
    };
    valid.chars().next().map_or(Utf8Step::Incomplete, Utf8Step::Char)
}

/// UTF-8 decoder. Invalid and truncated sequences are malformed.
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8Decoder;

impl CharsetDecoder for Utf8Decoder
{
    fn charset(&self) -> Charset
    {
        Charset::Utf8
    }

    fn average_chars_per_byte(&self) -> f32
    {
        1.0
    }

    fn decode(&mut self, input: &mut ByteCursor<'_>, output: &mut [u16], end_of_input: bool) -> (CoderResult, usize)
    {
        let mut written = 0;
        while input.has_remaining() {
            let ch = match next_utf8(input.as_slice()) {
                Utf8Step::Char(ch) => ch,
                Utf8Step::Incomplete if end_of_input => return (CoderResult::Malformed(input.remaining()), written),
                Utf8Step::Incomplete => return (CoderResult::Underflow, written),
                Utf8Step::Malformed(len) => return (CoderResult::Malformed(len), written),
            };
            let units = ch.len_utf16();
            if output.len() - written < units {
                return (CoderResult::Overflow, written);
            }
            ch.encode_utf16(&mut output[written..written + units]);
            written += units;
            input.advance(ch.len_utf8());
        }
        (CoderResult::Underflow, written)
    }
}

// --- UTF-16 ---

/// UTF-16 encoder for one byte order, without a byte order mark.
#[derive(Debug, Clone, Copy)]
pub struct Utf16Encoder
{
    order: ByteOrder,
}

impl Utf16Encoder
{
    /// Encoder writing units in `order`.
    pub fn new(order: ByteOrder) -> Self
    {
        Self { order }
    }
}

impl CharsetEncoder for Utf16Encoder
{
    fn charset(&self) -> Charset
    {
        match self.order {
            ByteOrder::LittleEndian => Charset::Utf16Le,
            ByteOrder::BigEndian => Charset::Utf16Be,
        }
    }

    fn average_bytes_per_char(&self) -> f32
    {
        2.0
    }

    fn encode(&mut self, input: &mut CharCursor<'_>, output: &mut [u8], end_of_input: bool) -> (CoderResult, usize)
    {
        let mut written = 0;
        while input.has_remaining() {
            let consumed = match next_scalar(input.as_slice(), end_of_input) {
                Scalar::Char(_, consumed) => consumed,
                Scalar::Incomplete => return (CoderResult::Underflow, written),
                Scalar::Malformed => return (CoderResult::Malformed(1), written),
            };
            if output.len() - written < consumed * 2 {
                return (CoderResult::Overflow, written);
            }
            for &unit in &input.as_slice()[..consumed] {
                output[written..written + 2].copy_from_slice(&write_unit(self.order, unit));
                written += 2;
            }
            input.advance(consumed);
        }
        (CoderResult::Underflow, written)
    }
}

/// UTF-16 decoder for one byte order. Lone surrogates are malformed.
#[derive(Debug, Clone, Copy)]
pub struct Utf16Decoder
{
    order: ByteOrder,
}

impl Utf16Decoder
{
    /// Decoder reading units in `order`.
    pub fn new(order: ByteOrder) -> Self
    {
        Self { order }
    }

    fn unit_at(&self, bytes: &[u8], index: usize) -> Option<u16>
    {
        let pair = bytes.get(index * 2..index * 2 + 2)?;
        Some(read_unit(self.order, [pair[0], pair[1]]))
    }
}

impl CharsetDecoder for Utf16Decoder
{
    fn charset(&self) -> Charset
    {
        match self.order {
            ByteOrder::LittleEndian => Charset::Utf16Le,
            ByteOrder::BigEndian => Charset::Utf16Be,
        }
    }

    fn average_chars_per_byte(&self) -> f32
    {
        0.5
    }

    fn decode(&mut self, input: &mut ByteCursor<'_>, output: &mut [u16], end_of_input: bool) -> (CoderResult, usize)
    {
        let mut written = 0;
        while input.has_remaining() {
            let bytes = input.as_slice();
            let incomplete = if end_of_input {
                CoderResult::Malformed(bytes.len())
            } else {
                CoderResult::Underflow
            };

            let Some(first) = self.unit_at(bytes, 0) else {
                return (incomplete, written);
            };
            let units = match first {
                0xD800..=0xDBFF => match self.unit_at(bytes, 1) {
                    Some(0xDC00..=0xDFFF) => 2,
                    Some(_) => return (CoderResult::Malformed(2), written),
                    None => return (incomplete, written),
                },
                0xDC00..=0xDFFF => return (CoderResult::Malformed(2), written),
                _ => 1,
            };

            if output.len() - written < units {
                return (CoderResult::Overflow, written);
            }
            for index in 0..units {
                output[written] = self.unit_at(bytes, index).unwrap_or_default();
                written += 1;
            }
            input.advance(units * 2);
        }
        (CoderResult::Underflow, written)
    }
}
