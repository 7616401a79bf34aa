//! Coalescing scheduler for Stylus
//!
//! This crate provides:
//! - Per-callback debouncing keyed by callback identity
//! - Argument-aware coalescing (same args absorb, new args reschedule)
//! - Explicit cancellation
//! - A pluggable timer driver (tokio by default)

pub mod debounce;
pub mod timer;

// Re-exports
pub use debounce::{Callback, CallbackId, Scheduler};
pub use timer::{TimerDriver, TokioTimers};
