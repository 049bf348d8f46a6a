//! Shared utilities.
//!
//! Currently just the cancellable-delay primitive backing debounced search.

mod debounce;

pub use debounce::Debouncer;
