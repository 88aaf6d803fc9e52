//! Stderr diagnostics. The teacher has no logging dependency; it prints
//! short, prefixed lines to stderr for anything the host isn't positioned
//! to react to (a failed reconnect, a dropped CTF write). This module
//! keeps that pattern rather than reaching for a crate the rest of the
//! dependency stack never needed.

use std::error::Error;
use std::fmt::Display;

const PREFIX: &str = "crocket";

/// Print a one-line status message, e.g. a reconnect attempt or a mode
/// change the host didn't directly ask to be told about.
pub fn print_msg(msg: impl Display) {
    eprintln!("{PREFIX}: {msg}");
}

/// Print an error the session recovered from on its own (the host's
/// `update` return value has no slot for it), walking its `source()` chain
/// the way the teacher's `print_errors` does, so the underlying I/O reason
/// behind a `thiserror` message isn't silently dropped.
pub fn print_errors(context: &str, err: &dyn Error) {
    eprintln!("{PREFIX}: {context}: {err}");
    let mut source = err.source();
    while let Some(e) = source {
        eprintln!("{PREFIX}:     Caused by: {e}");
        source = e.source();
    }
}
