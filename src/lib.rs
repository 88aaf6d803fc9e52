//! A client implementation of the [GNU Rocket](https://github.com/rocket/rocket)-style sync
//! tracker protocol and its compact binary track format (CTF).
//!
//! This crate keeps a set of named floating-point "sync variables" in step with either a live
//! external editor over TCP (`Client` mode) or a pre-recorded CTF archive loaded from disk
//! (`Player` mode). The host declares its variables once via a [`registry::Registry`], builds a
//! [`Session`] from it, and calls [`Session::update`] once per frame.
//!
//! # Usage
//!
//! ```rust,no_run
//! use crocket::{Registry, Session};
//!
//! let registry = Registry::new(["camera:fov", "tempo"]).unwrap();
//! let fov_id = registry.get("camera:fov").unwrap();
//! let tempo_id = registry.get("tempo").unwrap();
//!
//! let mut session = Session::init(registry, None, None, 60.0);
//!
//! let mut time = 0.0f64;
//! loop {
//!     let events = session.update(&mut time);
//!     let fov = session.get_value(fov_id, time);
//!     let tempo = session.get_value(tempo_id, time);
//!     // ... render a frame using `fov`/`tempo` ...
//!     # let _ = (events, fov, tempo);
//!     # break;
//! }
//! ```
//!
//! # Low-level API
//!
//! The pieces `Session` is built from — the keyframe engine, the CTF codec, and (with the
//! `client` feature) the wire protocol and transport — are public in [`lowlevel`]. Most callers
//! should not need them directly.
//!
//! # Features
//!
//! | Feature  | Purpose                                                                      |
//! | ---      | ---                                                                           |
//! | `client` | Enables the TCP editor client: handshake, reconnection, and CTF encoding.    |
//!
//! Without the `client` feature (enabled by default), the crate is a pure CTF player:
//! [`Session::init`] always returns [`session::Mode::Player`], [`Session::set_mode`] is inert,
//! and [`Session::serialize`] returns an empty buffer.

pub mod lowlevel;
pub mod registry;
pub mod session;

pub use registry::{Registry, RegistryError, VarId};
pub use session::{EventMask, Mode, Session};
