//! Integration tests for warloader resolution.
//!
//! Run with: `cargo test --test integration`

mod packed_bundle;
mod resolution;
