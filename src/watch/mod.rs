// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Resolving watch paths/globs and exclude globs into a [`WatchMatcher`].
//! - Wiring up a cross-platform filesystem watcher (`notify`) that forwards
//!   relevant changes into the runtime channel.
//! - Coalescing bursts of changes into a single trigger ([`Debouncer`]).
//!
//! It does **not** know about processes; it only turns filesystem changes into
//! runtime events.

pub mod debounce;
pub mod event_handler;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use debounce::{Debouncer, Trigger};
pub use patterns::{WatchMatcher, WatchSpec, WatchTarget};
pub use watcher::{WatcherHandle, spawn_watcher};
