//! Tests for view construction, address resolution and rebinding

use nativemem_core::prelude::*;

fn memory(kind: AccessorKind) -> Memory
{
    Memory::with_config(&MemoryConfig::default().with_preferred(kind).with_checked(true)).unwrap()
}

fn strategies() -> Vec<Memory>
{
    let mut kinds = vec![AccessorKind::Portable];
    if cfg!(unix) {
        kinds.push(AccessorKind::Libc);
    }
    kinds.into_iter().map(memory).collect()
}

#[test]
fn test_view_reports_address_and_capacity()
{
    for memory in strategies() {
        let mut storage = [0i32; 8];
        let base = Address::from_ptr(storage.as_mut_ptr());

        // SAFETY: `storage` outlives the view.
        let view = unsafe { memory.int_view(base, storage.len()) }.unwrap();
        assert_eq!(view.address(), base);
        assert_eq!(view.capacity(), 8);
        assert_eq!(view.position(), 0);
        assert_eq!(view.kind(), ElementKind::Int);
        assert_eq!(view.origin(), Origin::Native);
        assert_eq!(view.byte_order(), ByteOrder::NATIVE);
        assert_eq!(memory.address0(&view), base);
    }
}

#[test]
fn test_views_share_memory()
{
    let memory = memory(AccessorKind::Portable);
    let mut storage = [0u8; 8];
    let base = Address::from_ptr(storage.as_mut_ptr());

    // SAFETY: `storage` outlives both views and is not touched directly while they live.
    let mut longs = unsafe { memory.long_view(base, 1) }.unwrap();
    // SAFETY: as above.
    let bytes = unsafe { memory.byte_view(base, 8) }.unwrap();

    longs.put(0, 0x0102_0304_0506_0708).unwrap();
    assert_eq!(bytes.as_slice(), &0x0102_0304_0506_0708i64.to_ne_bytes());
}

#[test]
fn test_address_at_scales_by_element_width()
{
    let memory = memory(AccessorKind::Portable);
    let base = Address::new(0x10_0000);

    macro_rules! check {
        ($ctor:ident, $kind:expr) => {{
            // SAFETY: the view is only used for address arithmetic.
            let view = unsafe { memory.$ctor(base, 16) }.unwrap();
            for offset in [0usize, 1, 7, 15] {
                let expected = base + offset * memory.element_width($kind);
                assert_eq!(memory.address_at(&view, offset), expected);
            }
        }};
    }

    check!(byte_view, ElementKind::Byte);
    check!(short_view, ElementKind::Short);
    check!(char_view, ElementKind::Char);
    check!(int_view, ElementKind::Int);
    check!(float_view, ElementKind::Float);
    check!(long_view, ElementKind::Long);
    check!(double_view, ElementKind::Double);
    check!(pointer_view, ElementKind::Pointer);
}

#[test]
fn test_address_follows_cursor()
{
    let memory = memory(AccessorKind::Portable);
    let mut storage = [0f64; 4];
    let base = Address::from_ptr(storage.as_mut_ptr());

    // SAFETY: `storage` outlives the view.
    let mut view = unsafe { memory.double_view(base, 4) }.unwrap();
    view.write(1.5).unwrap();
    view.write(2.5).unwrap();
    assert_eq!(memory.address(&view), base + 16);
    assert_eq!(memory.address(&view), memory.address_at(&view, view.position()));
}

#[test]
fn test_safe_variants()
{
    let memory = memory(AccessorKind::Portable);
    let base = Address::new(0x2000);
    let mut covered = Vec::new();

    macro_rules! check {
        ($ctor:ident, $elem:ty) => {{
            // SAFETY: the view is only used for address arithmetic.
            let mut view = unsafe { memory.$ctor(base, 4) }.unwrap();
            view.set_position(3).unwrap();
            let width = memory.element_width(view.kind());

            assert_eq!(memory.address0_safe::<$elem>(None), Address::NULL);
            assert_eq!(memory.address_safe::<$elem>(None), Address::NULL);
            assert_eq!(memory.address_at_safe::<$elem>(None, 2), Address::NULL);

            assert_eq!(memory.address0_safe(Some(&view)), memory.address0(&view));
            assert_eq!(memory.address_safe(Some(&view)), base + 3 * width);
            assert_eq!(memory.address_at_safe(Some(&view), 1), base + width);
            covered.push(view.kind());
        }};
    }

    check!(byte_view, u8);
    check!(short_view, i16);
    check!(char_view, u16);
    check!(int_view, i32);
    check!(float_view, f32);
    check!(long_view, i64);
    check!(double_view, f64);
    check!(pointer_view, usize);
    assert_eq!(covered, ElementKind::ALL);
}

#[test]
fn test_rebind_native_view()
{
    for memory in strategies() {
        let mut first = [1u16; 4];
        let mut second = [2u16; 12];

        // SAFETY: both arrays outlive the views.
        let mut view = unsafe { memory.char_view(Address::from_ptr(first.as_mut_ptr()), 4) }.unwrap();
        view.set_position(2).unwrap();
        let target = Address::from_ptr(second.as_mut_ptr());
        // SAFETY: as above.
        let rebound = unsafe { memory.rebind(view, target, 12) }.unwrap();

        assert_eq!(memory.address0(&rebound), target);
        assert_eq!(rebound.capacity(), 12);
        assert_eq!(rebound.position(), 0);
        assert_eq!(rebound.origin(), Origin::Native);
        assert_eq!(rebound.get(11).unwrap(), 2);
    }
}

#[test]
fn test_rebind_owned_view_rejected_when_checked()
{
    for memory in strategies() {
        let mut buffer = OwnedBuffer::allocate(16).unwrap();
        let address = buffer.address();
        let view = buffer.view();
        let mut other = [0u8; 4];

        // SAFETY: rejected before the view is touched.
        let result = unsafe { memory.rebind(view, Address::from_ptr(other.as_mut_ptr()), 4) };
        assert!(matches!(result, Err(MemoryError::RebindOwned { address: a }) if a == address));
    }
}

#[test]
fn test_rebind_owned_view_allowed_when_unchecked()
{
    let memory = Memory::with_config(&MemoryConfig::default().with_checked(false)).unwrap();
    let mut buffer = OwnedBuffer::allocate(16).unwrap();
    let view = buffer.view();
    let mut other = [7u8; 4];
    let target = Address::from_ptr(other.as_mut_ptr());

    // SAFETY: `other` outlives the rebound view.
    let rebound = unsafe { memory.rebind(view, target, 4) }.unwrap();
    assert_eq!(rebound.address(), target);
    assert_eq!(rebound.origin(), Origin::Native);
    assert_eq!(rebound.as_slice(), &[7, 7, 7, 7]);
}

#[test]
fn test_nt1_scan()
{
    for memory in strategies() {
        let bytes = [65u8, 66, 67, 0];
        // SAFETY: `bytes` holds a terminator and outlives the view.
        let view = unsafe { memory.byte_view_nt1(Address::from_ptr(bytes.as_ptr())) }
            .unwrap()
            .unwrap();
        assert_eq!(view.capacity(), 3);
        assert_eq!(view.as_slice(), b"ABC");
    }
}

#[test]
fn test_nt2_scan()
{
    for memory in strategies() {
        let units = [0x41u16, 0x42, 0];
        // SAFETY: `units` holds a zero unit and outlives the view.
        let view = unsafe { memory.byte_view_nt2(Address::from_ptr(units.as_ptr())) }
            .unwrap()
            .unwrap();
        assert_eq!(view.capacity(), 4);
        assert_eq!(text::decode_utf16(Some(&view)).as_deref(), Some("AB"));
    }
}

#[test]
fn test_nt_scans_of_null_and_empty()
{
    let memory = memory(AccessorKind::Portable);
    // SAFETY: null addresses are never dereferenced.
    assert!(unsafe { memory.byte_view_nt1(Address::NULL) }.unwrap().is_none());
    // SAFETY: as above.
    assert!(unsafe { memory.byte_view_nt2(Address::NULL) }.unwrap().is_none());

    let empty = [0u16; 1];
    // SAFETY: `empty` is a lone terminator.
    let view = unsafe { memory.byte_view_nt1(Address::from_ptr(empty.as_ptr())) }
        .unwrap()
        .unwrap();
    assert_eq!(view.capacity(), 0);
    // SAFETY: as above.
    let view = unsafe { memory.byte_view_nt2(Address::from_ptr(empty.as_ptr())) }
        .unwrap()
        .unwrap();
    assert_eq!(view.capacity(), 0);
}

#[test]
fn test_owned_buffer_typed_view()
{
    let memory = memory(AccessorKind::Portable);
    let mut buffer = OwnedBuffer::allocate(10).unwrap();
    let base = buffer.address();
    let mut view = buffer.typed_view::<i32>();
    assert_eq!(view.capacity(), 2);
    assert_eq!(view.origin(), Origin::Owned);
    view.put(1, -1).unwrap();
    assert_eq!(memory.address_at(&view, 1), base + 4);
    assert_eq!(&buffer.as_slice()[4..8], &[0xFF; 4]);
}
