//! Build script for nativemem-core
//!
//! This script checks build requirements before compilation:
//! - Minimum Rust version (`Option::is_some_and` = Rust 1.70.0+)
//! - Supported pointer width (32 or 64 bits)
//!
//! ## Requirements
//!
//! - **Rust**: 1.70.0 or newer
//! - **Target**: 32-bit or 64-bit pointers; other widths build, but no
//!   accessor will pass its start-up probe

use std::env;

fn main()
{
    println!("cargo:rerun-if-changed=build.rs");

    // Check minimum Rust version
    if let Ok(rustc_version) = rustc_version::version() {
        let min_rust_version = rustc_version::Version::new(1, 70, 0);

        assert!(
            rustc_version >= min_rust_version,
            "nativemem-core requires Rust {min_rust_version} or newer, found {rustc_version}"
        );
    } else {
        // If we can't get version (e.g., in some build environments), just warn
        println!("cargo:warning=could not verify Rust version");
    }

    check_pointer_width();
}

fn check_pointer_width()
{
    match env::var("CARGO_CFG_TARGET_POINTER_WIDTH").as_deref() {
        Ok("32" | "64") => {}
        Ok(width) => println!("cargo:warning=nativemem-core supports 32 and 64-bit targets, found {width}-bit pointers"),
        Err(_) => println!("cargo:warning=could not detect target pointer width"),
    }
}
