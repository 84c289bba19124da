//! Common utilities for the Bilby styling engine.
//!
//! This crate provides shared infrastructure used by the styling components:
//! - **Warning System** - colored, deduplicated terminal output for recoverable problems
//! - **Diagnostics** - a process-wide switch controlling where style diagnostics go

pub mod diagnostics;
pub mod warning;
