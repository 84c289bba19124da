//! Process-wide destination switch for style diagnostics.
//!
//! Lex/parse errors are accumulated on the stylesheet that produced them, and
//! value-conversion failures degrade to documented fallbacks; in both cases a
//! diagnostic can additionally be routed here. Embedders that want silence
//! (e.g. release builds) set the destination to [`Destination::None`].

use std::sync::atomic::{AtomicU8, Ordering};

use crate::warning::warn_once;

/// Where recoverable style diagnostics are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Drop diagnostics entirely.
    None,
    /// Print deduplicated warnings to the console.
    Console,
}

/// Current destination. 0 = None, 1 = Console.
static DESTINATION: AtomicU8 = AtomicU8::new(1);

/// Set the process-wide diagnostic destination.
pub fn set_destination(destination: Destination) {
    let raw = match destination {
        Destination::None => 0,
        Destination::Console => 1,
    };
    DESTINATION.store(raw, Ordering::Relaxed);
}

/// Get the current diagnostic destination.
#[must_use]
pub fn destination() -> Destination {
    match DESTINATION.load(Ordering::Relaxed) {
        0 => Destination::None,
        _ => Destination::Console,
    }
}

/// Report a recoverable styling problem to the configured destination.
///
/// Messages are deduplicated per unique (component, message) pair, so a bad
/// declaration that is decoded on every restyle pass only warns once.
pub fn report(component: &str, message: &str) {
    if destination() == Destination::Console {
        warn_once(component, message);
    }
}
