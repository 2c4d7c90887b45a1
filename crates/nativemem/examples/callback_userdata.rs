//! Example: handing Rust state and strings to a C-style callback API
//!
//! Native libraries commonly take a `void *user_data` argument next to a
//! callback and later pass it back unchanged. This example shows:
//!
//! 1. Pinning Rust state behind an address-sized handle
//! 2. Encoding a null-terminated string for the native side
//! 3. Reading it back the way native code would (scanning for the terminator)
//! 4. Releasing the pin once the native side is done
//!
//! Run with `RUST_LOG=trace` to see the pin and codec events.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use nativemem_core::prelude::*;
use nativemem_utils::{info, init_logging};

/// State the callback updates.
#[derive(Debug, Default)]
struct Counter
{
    calls: AtomicUsize,
}

/// Stand-in for a native library invoking a callback with `(user_data, const char *)`.
fn native_invoke(callback: fn(Address, Address), user_data: Address, message: Address)
{
    for _ in 0..3 {
        callback(user_data, message);
    }
}

fn on_message(user_data: Address, message: Address)
{
    let memory = Memory::global();
    let Some(handle) = PinHandle::from_raw(user_data.value()) else {
        return;
    };
    let Some(counter) = memory.resolve::<Counter>(handle) else {
        return;
    };

    // SAFETY: the message buffer is terminated and kept alive by `main` for the whole call.
    let view = match unsafe { memory.byte_view_nt1(message) } {
        Ok(view) => view,
        Err(err) => {
            eprintln!("Error: {err}");
            return;
        }
    };
    let calls = counter.calls.fetch_add(1, Ordering::Relaxed) + 1;
    if let Ok(Some(text)) = text::decode_utf8(view.as_ref()) {
        info!(calls, "Callback received {text:?}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>>
{
    let _guard = init_logging()?;
    let memory = Memory::global();

    let counter = Arc::new(Counter::default());
    let handle = memory.pin(Arc::clone(&counter));
    let message = text::encode_utf8("héllo from Rust", Termination::NullTerminated)?;

    native_invoke(on_message, handle.address(), message.address());

    memory.release(handle)?;
    println!("Callback ran {} times", counter.calls.load(Ordering::Relaxed));
    println!("Pinned objects left: {}", memory.pinned_count());
    Ok(())
}
