//! Low level API.
//!
//! This module contains the track/keyframe engine ([`track`],
//! [`interpolation`]), the Compact Track Format codec ([`ctf`]), and, when
//! the `client` feature is enabled, the wire primitives ([`wire`]), the
//! socket ownership layer ([`transport`]), and the editor protocol state
//! machine ([`protocol`]). See each module for its own documentation.
//!
//! Most callers should use [`crate::Session`] rather than these pieces
//! directly.

pub mod ctf;
pub mod interpolation;
pub mod track;

#[cfg(feature = "client")]
pub mod protocol;
#[cfg(feature = "client")]
pub mod transport;
#[cfg(feature = "client")]
pub mod wire;
