//! # Types
//!
//! Platform-agnostic value types used throughout the crate.
//!
//! These types abstract away raw integers, so the rest of the crate can talk
//! about "addresses" and "element kinds" without mixing them up with sizes.

pub mod address;
pub mod element;

// Re-export all public types
pub use address::Address;
pub use element::{Element, ElementKind};
