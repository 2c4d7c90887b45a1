//! # Text Codec
//!
//! Conversion between Rust strings and encoded text in native memory.
//!
//! ## Encoding
//!
//! Encoded text always lands in a fresh [`OwnedBuffer`], optionally followed
//! by a terminator of one zero byte (ASCII, Latin-1, UTF-8) or two zero bytes
//! (UTF-16). Pass the buffer's address to native code and keep the buffer
//! alive for as long as native code reads it.
//!
//! - [`encode_ascii`] and [`encode_utf16`] are direct fast paths with no
//!   validation
//! - [`encode_utf8`] and [`encode`] run the generic coder loop and fail on
//!   input the charset cannot represent
//!
//! ## Decoding
//!
//! Decoders read the bytes between a view's cursor and its capacity. A
//! missing view decodes to `None` without touching a coder.
//!
//! ## Example
//!
//! ```rust
//! use nativemem_core::text::{self, Termination};
//!
//! let mut buffer = text::encode_utf8("héllo", Termination::NullTerminated)?;
//! assert_eq!(buffer.as_slice(), b"h\xc3\xa9llo\0");
//!
//! let view = buffer.view();
//! let decoded = text::decode_ascii(Some(&view));
//! assert_eq!(decoded.as_deref(), Some("hÃ©llo\0"));
//! # Ok::<(), nativemem_core::MemoryError>(())
//! ```

mod charset;
mod coders;

pub use charset::{ByteCursor, CharCursor, Charset, CharsetDecoder, CharsetEncoder, CoderResult};
pub use coders::{
    AsciiDecoder, AsciiEncoder, Latin1Decoder, Latin1Encoder, Utf16Decoder, Utf16Encoder, Utf8Decoder,
    Utf8Encoder,
};
use tracing::trace;

use crate::buffer::OwnedBuffer;
use crate::error::{CodecFailure, MemoryError, MemoryResult};
use crate::view::ByteView;

/// Whether encoded text ends with a zero terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Termination
{
    /// Append the charset's terminator
    #[default]
    NullTerminated,
    /// Emit the text only
    Unterminated,
}

impl Termination
{
    /// Returns `true` for [`Termination::NullTerminated`].
    pub fn is_terminated(self) -> bool
    {
        self == Termination::NullTerminated
    }
}

impl From<bool> for Termination
{
    fn from(terminated: bool) -> Self
    {
        if terminated {
            Termination::NullTerminated
        } else {
            Termination::Unterminated
        }
    }
}

fn utf16_units(text: &str, termination: Termination) -> Vec<u16>
{
    let mut units: Vec<u16> = text.encode_utf16().collect();
    if termination.is_terminated() {
        units.push(0);
    }
    units
}

/// First output size: `ceil(remaining * average)`, computed in `f32` like the average itself.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn estimate(remaining: usize, average: f32) -> usize
{
    (remaining as f32 * average).ceil() as usize
}

fn codec_error(charset: Charset, kind: CodecFailure, position: usize) -> MemoryError
{
    MemoryError::Codec {
        charset: charset.name(),
        kind,
        position,
    }
}

// --- Encoding ---

/// Encode `text` as ASCII.
///
/// Each UTF-16 code unit is truncated to its low eight bits; nothing is
/// validated. Callers are expected to pass ASCII text.
///
/// ## Errors
///
/// - `AllocationFailed`: the buffer could not be allocated.
pub fn encode_ascii(text: &str, termination: Termination) -> MemoryResult<OwnedBuffer>
{
    let units = utf16_units(text, termination);
    let mut buffer = OwnedBuffer::allocate(units.len())?;
    for (byte, unit) in buffer.as_mut_slice().iter_mut().zip(units) {
        *byte = (unit & 0xFF) as u8;
    }
    Ok(buffer)
}

/// Encode `text` as UTF-16 in native byte order.
///
/// Code units are copied as-is, two bytes each, with no byte order mark.
///
/// ## Errors
///
/// - `AllocationFailed`: the buffer could not be allocated.
pub fn encode_utf16(text: &str, termination: Termination) -> MemoryResult<OwnedBuffer>
{
    let units = utf16_units(text, termination);
    let mut buffer = OwnedBuffer::allocate(units.len() * 2)?;
    for (pair, unit) in buffer.as_mut_slice().chunks_exact_mut(2).zip(units) {
        pair.copy_from_slice(&unit.to_ne_bytes());
    }
    Ok(buffer)
}

/// Encode `text` as UTF-8 using the generic coder loop.
///
/// ## Errors
///
/// - `AllocationFailed`: a buffer could not be allocated.
pub fn encode_utf8(text: &str, termination: Termination) -> MemoryResult<OwnedBuffer>
{
    encode(text, Charset::Utf8, termination)
}

/// Encode `text` in `charset`.
///
/// The first buffer is sized from the encoder's average bytes per character.
/// Whenever the encoder runs out of room the buffer grows to `2n + 1` bytes,
/// keeping what was already written, and encoding resumes where it stopped.
/// The result is trimmed to the bytes actually written.
///
/// ## Errors
///
/// - `Codec`: the text cannot be represented in `charset`. No partial
///   output is returned.
/// - `AllocationFailed`: a buffer could not be allocated.
pub fn encode(text: &str, charset: Charset, termination: Termination) -> MemoryResult<OwnedBuffer>
{
    let units = utf16_units(text, termination);
    encode_units(&units, charset)
}

/// Encode raw UTF-16 code units in `charset`.
///
/// Unlike [`encode`] the input may contain lone surrogates, which every
/// charset rejects as malformed.
///
/// ## Errors
///
/// As for [`encode`].
pub fn encode_units(units: &[u16], charset: Charset) -> MemoryResult<OwnedBuffer>
{
    let mut encoder = charset.new_encoder();
    encoder.reset();

    let mut input = CharCursor::new(units);
    let mut size = estimate(input.remaining(), encoder.average_bytes_per_char());
    if size == 0 && !input.has_remaining() {
        return OwnedBuffer::allocate(0);
    }

    let mut buffer = OwnedBuffer::allocate(size)?;
    let mut written = 0;
    loop {
        let (mut result, count) = encoder.encode(&mut input, &mut buffer.as_mut_slice()[written..], true);
        written += count;
        if result == CoderResult::Underflow {
            let (flushed, count) = encoder.flush(&mut buffer.as_mut_slice()[written..]);
            written += count;
            result = flushed;
        }

        match result {
            CoderResult::Underflow => break,
            CoderResult::Overflow => {
                size = 2 * size + 1;
                trace!(charset = %charset, size, written, "Growing encode buffer");
                buffer = buffer.grown(size, written)?;
            }
            CoderResult::Malformed(_) => {
                return Err(codec_error(charset, CodecFailure::Malformed, input.position()));
            }
            CoderResult::Unmappable(_) => {
                return Err(codec_error(charset, CodecFailure::Unmappable, input.position()));
            }
        }
    }

    buffer.truncate(written);
    Ok(buffer)
}

// --- Decoding ---

/// Decode ASCII text, widening every byte to the character of the same value.
///
/// Bytes above 0x7F are not rejected; they decode as Latin-1.
pub fn decode_ascii(view: Option<&ByteView<'_>>) -> Option<String>
{
    view.map(|view| view.remaining_bytes().iter().map(|&byte| char::from(byte)).collect())
}

/// Decode native-endian UTF-16 text.
///
/// Two bytes make one code unit; a trailing odd byte is ignored. Lone
/// surrogates are replaced with U+FFFD.
pub fn decode_utf16(view: Option<&ByteView<'_>>) -> Option<String>
{
    view.map(|view| {
        let units = view
            .remaining_bytes()
            .chunks_exact(2)
            .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]));
        char::decode_utf16(units)
            .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    })
}

/// Decode UTF-8 text using the generic coder loop.
///
/// ## Errors
///
/// - `Codec`: the bytes are not valid UTF-8.
pub fn decode_utf8(view: Option<&ByteView<'_>>) -> MemoryResult<Option<String>>
{
    decode(view, Charset::Utf8)
}

/// Decode text in `charset`.
///
/// Mirrors [`encode`]: the output starts at the decoder's average characters
/// per byte and grows to `2n + 1` units whenever it fills up.
///
/// ## Errors
///
/// - `Codec`: the bytes are not valid in `charset`.
pub fn decode(view: Option<&ByteView<'_>>, charset: Charset) -> MemoryResult<Option<String>>
{
    let Some(view) = view else {
        return Ok(None);
    };

    let mut decoder = charset.new_decoder();
    decode_bytes(view.remaining_bytes(), decoder.as_mut()).map(Some)
}

/// Run the generic decode loop over `bytes` with an already chosen decoder.
fn decode_bytes(bytes: &[u8], decoder: &mut dyn CharsetDecoder) -> MemoryResult<String>
{
    let charset = decoder.charset();
    decoder.reset();

    let mut input = ByteCursor::new(bytes);
    let mut size = estimate(input.remaining(), decoder.average_chars_per_byte());
    if size == 0 && !input.has_remaining() {
        return Ok(String::new());
    }

    let mut output = vec![0u16; size];
    let mut written = 0;
    loop {
        let (mut result, count) = decoder.decode(&mut input, &mut output[written..], true);
        written += count;
        if result == CoderResult::Underflow {
            let (flushed, count) = decoder.flush(&mut output[written..]);
            written += count;
            result = flushed;
        }

        match result {
            CoderResult::Underflow => break,
            CoderResult::Overflow => {
                size = 2 * size + 1;
                trace!(charset = %charset, size, written, "Growing decode buffer");
                output.resize(size, 0);
            }
            CoderResult::Malformed(_) => {
                return Err(codec_error(charset, CodecFailure::Malformed, input.position()));
            }
            CoderResult::Unmappable(_) => {
                return Err(codec_error(charset, CodecFailure::Unmappable, input.position()));
            }
        }
    }

    output.truncate(written);
    String::from_utf16(&output).map_err(|_| codec_error(charset, CodecFailure::Malformed, input.position()))
}
