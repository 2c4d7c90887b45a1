//! Property tests for text round trips and address arithmetic

use nativemem_core::prelude::*;
use proptest::prelude::*;

fn memory() -> Memory
{
    Memory::with_config(&MemoryConfig::default().with_checked(true)).unwrap()
}

/// Text without interior NULs, so terminated scans see the whole string.
fn text_without_nul() -> impl Strategy<Value = String>
{
    any::<String>().prop_map(|text| text.replace('\0', ""))
}

proptest! {
    #[test]
    fn prop_ascii_roundtrip(original in "[ -~]{0,64}") {
        let memory = memory();
        let buffer = text::encode_ascii(&original, Termination::NullTerminated).unwrap();
        prop_assert_eq!(buffer.len(), original.len() + 1);

        // SAFETY: the buffer is terminated and outlives the view.
        let view = unsafe { memory.byte_view_nt1(buffer.address()) }.unwrap().unwrap();
        prop_assert_eq!(text::decode_ascii(Some(&view)), Some(original));
    }

    #[test]
    fn prop_utf8_roundtrip(original in text_without_nul()) {
        let memory = memory();
        let buffer = text::encode_utf8(&original, Termination::NullTerminated).unwrap();
        prop_assert_eq!(&buffer.as_slice()[..original.len()], original.as_bytes());

        // SAFETY: the buffer is terminated and outlives the view.
        let view = unsafe { memory.byte_view_nt1(buffer.address()) }.unwrap().unwrap();
        prop_assert_eq!(text::decode_utf8(Some(&view)).unwrap(), Some(original));
    }

    #[test]
    fn prop_utf16_roundtrip(original in text_without_nul()) {
        let memory = memory();
        let buffer = text::encode_utf16(&original, Termination::NullTerminated).unwrap();

        // SAFETY: the buffer is terminated and outlives the view.
        let view = unsafe { memory.byte_view_nt2(buffer.address()) }.unwrap().unwrap();
        prop_assert_eq!(view.capacity(), original.encode_utf16().count() * 2);
        prop_assert_eq!(text::decode_utf16(Some(&view)), Some(original));
    }

    #[test]
    fn prop_unterminated_generic_roundtrip(original in text_without_nul(), big_endian in any::<bool>()) {
        let charset = if big_endian { Charset::Utf16Be } else { Charset::Utf16Le };
        let mut buffer = text::encode(&original, charset, Termination::Unterminated).unwrap();
        let view = buffer.view();
        prop_assert_eq!(text::decode(Some(&view), charset).unwrap(), Some(original));
    }

    #[test]
    fn prop_address_at_is_linear(offset in 0usize..4096, capacity in 1usize..4096) {
        let memory = memory();
        let base = Address::new(0x1000_0000);
        // SAFETY: the views are only used for address arithmetic.
        let ints = unsafe { memory.int_view(base, capacity) }.unwrap();
        // SAFETY: as above.
        let pointers = unsafe { memory.pointer_view(base, capacity) }.unwrap();

        prop_assert_eq!(memory.address_at(&ints, offset), memory.address0(&ints) + offset * 4);
        prop_assert_eq!(
            memory.address_at(&pointers, offset),
            memory.address0(&pointers) + offset * memory.pointer_size()
        );
    }

    #[test]
    fn prop_set_then_copy(value in any::<u8>(), bytes in proptest::collection::vec(any::<u8>(), 1..256)) {
        let memory = memory();
        let mut filled = vec![0u8; bytes.len()];
        let mut copied = vec![0u8; bytes.len()];

        // SAFETY: every range covers exactly one of the vectors above.
        unsafe {
            memory.set(Address::from_ptr(filled.as_mut_ptr()), value, filled.len()).unwrap();
            memory
                .copy(Address::from_ptr(bytes.as_ptr()), Address::from_ptr(copied.as_mut_ptr()), bytes.len())
                .unwrap();
        }

        prop_assert!(filled.iter().all(|&b| b == value));
        prop_assert_eq!(copied, bytes);
    }
}
