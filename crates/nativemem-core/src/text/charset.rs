//! # Charsets
//!
//! Named character encodings and the stateful coder interface the generic
//! encode/decode loops drive.
//!
//! Text is handled as UTF-16 code units on the character side, the unit the
//! native libraries this crate serves exchange with managed runtimes. A coder
//! consumes from an input cursor and writes into whatever output space it is
//! given, stopping with a [`CoderResult`] that tells the caller what to do
//! next.

use std::fmt;
use std::str::FromStr;

use super::coders::{
    AsciiDecoder, AsciiEncoder, Latin1Decoder, Latin1Encoder, Utf16Decoder, Utf16Encoder, Utf8Decoder,
    Utf8Encoder,
};
use crate::error::{MemoryError, MemoryResult};
use crate::view::ByteOrder;

/// Supported character encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset
{
    /// 7-bit ASCII; anything above 0x7F is rejected
    UsAscii,
    /// ISO-8859-1 (Latin-1); anything above 0xFF is rejected
    Iso8859_1,
    /// UTF-8
    Utf8,
    /// UTF-16, little-endian, no byte order mark
    Utf16Le,
    /// UTF-16, big-endian, no byte order mark
    Utf16Be,
}

impl Charset
{
    /// Every supported charset.
    pub const ALL: [Charset; 5] = [
        Charset::UsAscii,
        Charset::Iso8859_1,
        Charset::Utf8,
        Charset::Utf16Le,
        Charset::Utf16Be,
    ];

    /// UTF-16 in the platform's byte order.
    pub const UTF_16: Charset = match ByteOrder::NATIVE {
        ByteOrder::LittleEndian => Charset::Utf16Le,
        ByteOrder::BigEndian => Charset::Utf16Be,
    };

    /// Canonical name.
    pub const fn name(self) -> &'static str
    {
        match self {
            Charset::UsAscii => "US-ASCII",
            Charset::Iso8859_1 => "ISO-8859-1",
            Charset::Utf8 => "UTF-8",
            Charset::Utf16Le => "UTF-16LE",
            Charset::Utf16Be => "UTF-16BE",
        }
    }

    /// Resolve a charset by name or alias, ignoring case.
    ///
    /// `UTF-16` resolves to [`Charset::UTF_16`].
    ///
    /// ## Errors
    ///
    /// - `UnsupportedCharset`: the name is not known.
    pub fn for_name(name: &str) -> MemoryResult<Charset>
    {
        let normalized = name.trim().to_ascii_uppercase().replace('_', "-");
        let charset = match normalized.as_str() {
            "US-ASCII" | "ASCII" | "ISO646-US" => Charset::UsAscii,
            "ISO-8859-1" | "ISO8859-1" | "LATIN1" | "LATIN-1" => Charset::Iso8859_1,
            "UTF-8" | "UTF8" => Charset::Utf8,
            "UTF-16LE" | "UTF16LE" => Charset::Utf16Le,
            "UTF-16BE" | "UTF16BE" => Charset::Utf16Be,
            "UTF-16" | "UTF16" => Charset::UTF_16,
            _ => return Err(MemoryError::UnsupportedCharset(name.to_string())),
        };
        Ok(charset)
    }

    /// Number of zero bytes terminating a string in this charset.
    pub const fn terminator_len(self) -> usize
    {
        match self {
            Charset::Utf16Le | Charset::Utf16Be => 2,
            Charset::UsAscii | Charset::Iso8859_1 | Charset::Utf8 => 1,
        }
    }

    /// A fresh encoder.
    pub fn new_encoder(self) -> Box<dyn CharsetEncoder>
    {
        match self {
            Charset::UsAscii => Box::new(AsciiEncoder),
            Charset::Iso8859_1 => Box::new(Latin1Encoder),
            Charset::Utf8 => Box::new(Utf8Encoder),
            Charset::Utf16Le => Box::new(Utf16Encoder::new(ByteOrder::LittleEndian)),
            Charset::Utf16Be => Box::new(Utf16Encoder::new(ByteOrder::BigEndian)),
        }
    }

    /// A fresh decoder.
    pub fn new_decoder(self) -> Box<dyn CharsetDecoder>
    {
        match self {
            Charset::UsAscii => Box::new(AsciiDecoder),
            Charset::Iso8859_1 => Box::new(Latin1Decoder),
            Charset::Utf8 => Box::new(Utf8Decoder),
            Charset::Utf16Le => Box::new(Utf16Decoder::new(ByteOrder::LittleEndian)),
            Charset::Utf16Be => Box::new(Utf16Decoder::new(ByteOrder::BigEndian)),
        }
    }
}

impl fmt::Display for Charset
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

impl FromStr for Charset
{
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        Charset::for_name(s)
    }
}

/// Why a coder stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoderResult
{
    /// All input that can be processed has been; supply more or finish
    Underflow,
    /// The output is full
    Overflow,
    /// The next `n` input units form an illegal sequence
    Malformed(usize),
    /// The next `n` input units are legal but cannot be represented
    Unmappable(usize),
}

macro_rules! cursor {
    ($(#[$doc:meta])* $name:ident, $unit:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name<'a>
        {
            data: &'a [$unit],
            position: usize,
        }

        impl<'a> $name<'a>
        {
            /// Cursor at the start of `data`.
            pub fn new(data: &'a [$unit]) -> Self
            {
                Self { data, position: 0 }
            }

            /// Units consumed so far.
            pub fn position(&self) -> usize
            {
                self.position
            }

            /// Units not yet consumed.
            pub fn remaining(&self) -> usize
            {
                self.data.len() - self.position
            }

            /// Returns `true` if there is input left.
            pub fn has_remaining(&self) -> bool
            {
                self.position < self.data.len()
            }

            /// The unconsumed input.
            pub fn as_slice(&self) -> &'a [$unit]
            {
                &self.data[self.position..]
            }

            /// Consume `count` units.
            pub fn advance(&mut self, count: usize)
            {
                self.position = (self.position + count).min(self.data.len());
            }
        }
    };
}

cursor! {
    /// Input cursor over UTF-16 code units.
    CharCursor, u16
}

cursor! {
    /// Input cursor over encoded bytes.
    ByteCursor, u8
}

/// Stateful conversion from UTF-16 code units to bytes.
pub trait CharsetEncoder
{
    /// Charset this encoder produces.
    fn charset(&self) -> Charset;

    /// Expected bytes per input unit, used to size the first output buffer.
    fn average_bytes_per_char(&self) -> f32;

    /// Forget any state carried between calls.
    fn reset(&mut self) {}

    /// Encode as much of `input` as fits in `output`.
    ///
    /// Returns why encoding stopped and how many bytes were written. When
    /// `end_of_input` is false, an incomplete trailing sequence is left in
    /// the input and reported as `Underflow`.
    fn encode(&mut self, input: &mut CharCursor<'_>, output: &mut [u8], end_of_input: bool) -> (CoderResult, usize);

    /// Write any bytes held back after the final `encode` call.
    fn flush(&mut self, _output: &mut [u8]) -> (CoderResult, usize)
    {
        (CoderResult::Underflow, 0)
    }
}

/// Stateful conversion from bytes to UTF-16 code units.
pub trait CharsetDecoder
{
    /// Charset this decoder reads.
    fn charset(&self) -> Charset;

    /// Expected units per input byte, used to size the first output buffer.
    fn average_chars_per_byte(&self) -> f32;

    /// Forget any state carried between calls.
    fn reset(&mut self) {}

    /// Decode as much of `input` as fits in `output`.
    ///
    /// Same contract as [`CharsetEncoder::encode`].
    fn decode(&mut self, input: &mut ByteCursor<'_>, output: &mut [u16], end_of_input: bool) -> (CoderResult, usize);

    /// Write any units held back after the final `decode` call.
    fn flush(&mut self, _output: &mut [u16]) -> (CoderResult, usize)
    {
        (CoderResult::Underflow, 0)
    }
}
