//! Tests for direct memory operations and pinning

use std::sync::Arc;

use nativemem_core::prelude::*;

fn strategies() -> Vec<Memory>
{
    let mut kinds = vec![AccessorKind::Portable];
    if cfg!(unix) {
        kinds.push(AccessorKind::Libc);
    }
    kinds
        .into_iter()
        .map(|kind| Memory::with_config(&MemoryConfig::default().with_preferred(kind).with_checked(true)).unwrap())
        .collect()
}

#[test]
fn test_selected_accessor_matches_preference()
{
    for memory in strategies() {
        assert_eq!(memory.accessor_name(), memory.accessor().kind().name());
        assert!(memory.page_size().is_power_of_two());
        assert!(memory.pointer_size() == 4 || memory.pointer_size() == 8);
    }
}

#[test]
fn test_set_fills_bytes()
{
    for memory in strategies() {
        let mut storage = [0u8; 32];
        let base = Address::from_ptr(storage.as_mut_ptr());

        // SAFETY: the first 16 bytes of `storage` are writable.
        unsafe { memory.set(base, 0xFF, 16) }.unwrap();

        // SAFETY: `storage` outlives the view.
        let view = unsafe { memory.byte_view(base, 32) }.unwrap();
        assert!(view.as_slice()[..16].iter().all(|&b| b == 0xFF));
        assert!(view.as_slice()[16..].iter().all(|&b| b == 0));
    }
}

#[test]
fn test_set_zero_bytes_is_a_no_op()
{
    for memory in strategies() {
        let mut storage = [9u8; 4];
        // SAFETY: nothing is written.
        unsafe { memory.set(Address::from_ptr(storage.as_mut_ptr()), 0, 0) }.unwrap();
        assert_eq!(storage, [9; 4]);
    }
}

#[test]
fn test_copy_reproduces_bytes()
{
    for memory in strategies() {
        let source: Vec<u8> = (0..=255).collect();
        let mut target = vec![0u8; 256];

        // SAFETY: both vectors hold 256 bytes and do not overlap.
        unsafe {
            memory
                .copy(Address::from_ptr(source.as_ptr()), Address::from_ptr(target.as_mut_ptr()), 256)
                .unwrap();
        }
        assert_eq!(source, target);
    }
}

#[test]
fn test_copy_overlapping_both_directions()
{
    for memory in strategies() {
        let mut forward = *b"0123456789";
        let base = Address::from_ptr(forward.as_mut_ptr());
        // SAFETY: both ranges lie inside `forward`.
        unsafe { memory.copy_overlapping(base, base + 2, 6) }.unwrap();
        assert_eq!(&forward, b"0101234589");

        let mut backward = *b"0123456789";
        let base = Address::from_ptr(backward.as_mut_ptr());
        // SAFETY: both ranges lie inside `backward`.
        unsafe { memory.copy_overlapping(base + 2, base, 6) }.unwrap();
        assert_eq!(&backward, b"2345676789");
    }
}

#[test]
fn test_checked_mode_rejects_bad_arguments()
{
    for memory in strategies() {
        let mut storage = [0u8; 8];
        let base = Address::from_ptr(storage.as_mut_ptr());

        // SAFETY: each call is rejected before memory is touched.
        unsafe {
            assert!(matches!(memory.set(Address::NULL, 0, 8), Err(MemoryError::InvalidArgument(_))));
            assert!(matches!(memory.copy(Address::NULL, base, 8), Err(MemoryError::InvalidArgument(_))));
            assert!(matches!(memory.copy(base, Address::NULL, 8), Err(MemoryError::InvalidArgument(_))));
            assert!(matches!(memory.copy(base, base + 1, 4), Err(MemoryError::InvalidArgument(_))));
            assert!(matches!(
                memory.copy_overlapping(base, Address::new(usize::MAX), 1),
                Err(MemoryError::InvalidArgument(_))
            ));
        }
        assert_eq!(storage, [0; 8]);
    }
}

#[test]
fn test_pin_through_handle()
{
    let memory = Memory::with_config(&MemoryConfig::default()).unwrap();
    let callback_state = Arc::new(vec![1u32, 2, 3]);
    let handle = memory.pin(Arc::clone(&callback_state));
    assert_eq!(memory.pinned_count(), 1);

    // Native code hands the handle back as an address-sized value.
    let raw = handle.address().value();
    let restored = PinHandle::from_raw(raw).unwrap();
    let resolved = memory.resolve::<Vec<u32>>(restored).unwrap();
    assert!(Arc::ptr_eq(&resolved, &callback_state));

    memory.release(restored).unwrap();
    assert_eq!(memory.pinned_count(), 0);
    assert!(memory.resolve::<Vec<u32>>(restored).is_none());
    assert!(matches!(memory.release(restored), Err(MemoryError::InvalidPin(_))));
}

#[test]
fn test_global_handle_is_shared()
{
    let first = Memory::global();
    let second = Memory::global();
    assert!(std::ptr::eq(first, second));
    assert!(first.page_size().is_power_of_two());
}
