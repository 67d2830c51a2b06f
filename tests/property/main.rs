//! Property-based tests against a `VecDeque` model.
//!
//! Run with: `cargo test --test property`
