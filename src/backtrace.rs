//! Call-site lookup for log rows.
//!
//! Every public logging entry point is `#[track_caller]`, so
//! [`Location::caller`] resolves to the application code that issued the call
//! rather than to a frame inside this crate.

use std::panic::Location;

/// Produces the `backtrace` column of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacktraceResolver {
    enabled: bool,
}

impl Default for BacktraceResolver {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl BacktraceResolver {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Resolver that suppresses every location
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// `"<file>:<line>:<column>"` of the first caller outside the
    /// `#[track_caller]` chain, or `""` when disabled
    #[track_caller]
    pub fn resolve(&self) -> String {
        if !self.enabled {
            return String::new();
        }
        format_location(Location::caller())
    }
}

fn format_location(location: &Location<'_>) -> String {
    format!(
        "{}:{}:{}",
        location.file(),
        location.line(),
        location.column()
    )
}
