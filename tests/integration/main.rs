//! Integration tests for the locked ring buffer.
//!
//! Run with: `cargo test --test integration`

mod concurrency;
mod scenarios;
