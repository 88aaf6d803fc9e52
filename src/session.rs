//! The mode manager: the crate's orchestration layer, tying together the
//! track engine, the editor protocol, and the CTF codec behind one
//! `update`-per-frame call.

mod diagnostics;

use crate::lowlevel::ctf;
use crate::lowlevel::track::Track;
use crate::registry::{Registry, VarId};
use std::path::PathBuf;

#[cfg(feature = "client")]
use crate::lowlevel::protocol::{self, Command};
#[cfg(feature = "client")]
use crate::lowlevel::transport::{self, Transport};
#[cfg(feature = "client")]
use std::net::SocketAddr;
#[cfg(feature = "client")]
use std::time::Duration;

/// How long the handshake waits, after the last `GET_TRACK`, for trailing
/// `SET_KEY` replies before declaring the connection settled.
#[cfg(feature = "client")]
const HANDSHAKE_SETTLE_TIMEOUT: Duration = Duration::from_millis(100);

/// The fractional offset added to a non-zero authoritative editor row
/// before it is converted back to host time, so the host's next derived
/// row lands on the same integer row rather than rounding down into the
/// previous one. Row 0 is left exact, since there is no "previous" row to
/// round into.
pub const SEEK_EPSILON_ROWS: f32 = 1.0 / 65536.0;

/// Whether this session is driven by a live editor connection or replaying
/// a loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Player,
    Client,
}

/// Persistent and one-shot bits reported by [`Session::update`].
///
/// Persistent bits (`PLAYING`, `CONNECTED`) reflect standing state and
/// survive across updates. The rest are one-shot: set during the update
/// that produced them, cleared at the end of that same update unless the
/// next update retriggers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventMask(u32);

impl EventMask {
    pub const PLAYING: EventMask = EventMask(1 << 0);
    pub const CONNECTED: EventMask = EventMask(1 << 1);
    pub const STOP: EventMask = EventMask(1 << 2);
    pub const PLAY: EventMask = EventMask(1 << 3);
    pub const SEEK: EventMask = EventMask(1 << 4);
    pub const CONNECT: EventMask = EventMask(1 << 5);
    pub const DISCONNECT: EventMask = EventMask(1 << 6);
    pub const SAVE: EventMask = EventMask(1 << 7);
    pub const ACTION: EventMask = EventMask(1 << 8);

    const PERSISTENT: u32 = Self::PLAYING.0 | Self::CONNECTED.0;

    pub const fn empty() -> EventMask {
        EventMask(0)
    }

    pub fn contains(self, bit: EventMask) -> bool {
        self.0 & bit.0 == bit.0
    }

    fn set(&mut self, bit: EventMask) {
        self.0 |= bit.0;
    }

    fn unset(&mut self, bit: EventMask) {
        self.0 &= !bit.0;
    }

    fn retain_persistent(&mut self) {
        self.0 &= Self::PERSISTENT;
    }
}

/// Mode manager and the crate's main entry point.
///
/// One `Session` owns one track registry, the playback state machine, and
/// (with the `client` feature) at most one TCP connection to an editor.
pub struct Session {
    mode: Mode,
    registry: Registry,
    tracks: Vec<Track>,
    timescale: f32,
    /// `-1` means no row has been reported by the editor yet.
    editor_row: i64,
    state: EventMask,
    pending_action: Option<u32>,
    save_path: Option<PathBuf>,
    #[cfg(feature = "client")]
    endpoint: Option<SocketAddr>,
    #[cfg(feature = "client")]
    transport: Option<Transport>,
}

impl Session {
    /// Build a session over `registry` and attempt to reach a live editor.
    ///
    /// `rpm`, rows per minute, sets `timescale = rpm / 60`; the sentinel
    /// value `60.0` leaves the timescale at `1` (time already expressed in
    /// rows). `initial_data`, if given, is a previously-saved CTF image
    /// loaded into `tracks` before any connection attempt, so a failed
    /// connect still leaves useful data behind. `save_path`, if given, is
    /// where [`Session::update`] writes a fresh CTF image when the editor
    /// requests `SAVE_TRACKS`.
    ///
    /// Mirrors spec.md's `init(save_file?, data?, rpm) -> Mode`: query the
    /// resulting mode afterwards with [`Session::mode`].
    pub fn init(
        registry: Registry,
        save_path: Option<PathBuf>,
        initial_data: Option<&[u8]>,
        rpm: f32,
    ) -> Session {
        const SECS_PER_MINUTE: f32 = 60.0;

        let tracks = registry
            .iter()
            .map(|(_, name)| Track::new(name))
            .collect();

        let mut session = Session {
            mode: Mode::Player,
            registry,
            tracks,
            timescale: rpm / SECS_PER_MINUTE,
            editor_row: -1,
            state: EventMask::empty(),
            pending_action: None,
            save_path,
            #[cfg(feature = "client")]
            endpoint: transport::resolve_endpoint(),
            #[cfg(feature = "client")]
            transport: None,
        };

        if let Some(data) = initial_data {
            session.load_ctf(data);
        }

        #[cfg(feature = "client")]
        {
            if session.try_connect() {
                session.mode = Mode::Client;
            }
        }

        if session.mode == Mode::Player {
            session.state.set(EventMask::PLAYING);
            session.state.set(EventMask::PLAY);
        }

        session
    }

    /// The mode resulting from [`Session::init`] or the last
    /// [`Session::set_mode`].
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The track registry this session was built with.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Close any connection and release resources. Equivalent to dropping
    /// the session; exists as an explicit operation so callers don't need
    /// to rely on `Drop` ordering to observe the disconnect.
    pub fn shutdown(self) {
        drop(self);
    }

    /// Advance by one frame. `time`, in seconds, is read to derive the
    /// current row and may be corrected in place if the editor just set
    /// an authoritative row via `SET_ROW`/seek.
    ///
    /// Returns the event bitmask accumulated during this update; one-shot
    /// bits are cleared again before the next call.
    pub fn update(&mut self, time: &mut f64) -> EventMask {
        #[cfg(feature = "client")]
        {
            if self.mode == Mode::Client {
                self.reconnect_if_needed();
                self.drain_messages();
            }
        }

        self.reconcile_seek(time);

        let result = self.state;
        self.state.retain_persistent();
        self.pending_action = None;
        result
    }

    /// Sample `id`'s track at `time` (seconds). Does not mutate session
    /// state; call after [`Session::update`] once `time` has been
    /// corrected for any seek.
    pub fn get_value(&self, id: VarId, time: f64) -> f32 {
        let row_f = (time * self.timescale as f64) as f32;
        self.tracks[id.index()].sample(row_f)
    }

    /// Any pending `ACTION(n)` payload from this update, if
    /// [`EventMask::ACTION`] is set.
    pub fn pending_action(&self) -> Option<u32> {
        self.pending_action
    }

    /// Switch modes. `Player` closes any connection immediately; `Client`
    /// only marks intent; the next `update` performs the actual connect.
    pub fn set_mode(&mut self, mode: Mode) {
        match mode {
            Mode::Player => {
                #[cfg(feature = "client")]
                {
                    self.transport = None;
                }
                self.state.unset(EventMask::CONNECTED);
                self.state.set(EventMask::PLAYING);
                self.state.set(EventMask::PLAY);
                self.mode = Mode::Player;
            }
            Mode::Client => {
                self.mode = Mode::Client;
            }
        }
    }

    /// Encode the current tracks as a CTF image. Empty (all-player-mode,
    /// no `client` feature) builds return an empty buffer.
    pub fn serialize(&self) -> Vec<u8> {
        #[cfg(feature = "client")]
        {
            ctf::encode(&self.tracks)
        }
        #[cfg(not(feature = "client"))]
        {
            Vec::new()
        }
    }

    fn load_ctf(&mut self, data: &[u8]) {
        if let Err(err) = ctf::decode(data, &self.registry, &mut self.tracks) {
            diagnostics::print_errors("loading CTF data", &err);
        }
    }

    #[cfg(feature = "client")]
    fn try_connect(&mut self) -> bool {
        let Some(addr) = self.endpoint else {
            return false;
        };

        let mut transport = match Transport::connect(addr) {
            Ok(transport) => transport,
            Err(err) => {
                diagnostics::print_errors("connecting to editor", &err);
                return false;
            }
        };

        if let Err(err) = protocol::handshake(&mut transport) {
            diagnostics::print_errors("editor handshake", &err);
            return false;
        }
        if let Err(err) = transport.handshake_complete() {
            diagnostics::print_errors("clearing handshake timeouts", &err);
            return false;
        }

        for (id, name) in self.registry.iter() {
            self.tracks[id.index()].clear();
            if let Err(err) = protocol::send_get_track(&mut transport, name) {
                diagnostics::print_errors("requesting track", &err);
                return false;
            }
            loop {
                match Self::drain_into(
                    &mut transport,
                    Duration::ZERO,
                    &mut self.tracks,
                    &mut self.editor_row,
                    &mut self.state,
                    &mut self.pending_action,
                    self.save_path.as_deref(),
                ) {
                    Ok(true) => continue,
                    Ok(false) => break,
                    Err(err) => {
                        diagnostics::print_errors("reading track response", &err);
                        return false;
                    }
                }
            }
        }

        loop {
            match Self::drain_into(
                &mut transport,
                HANDSHAKE_SETTLE_TIMEOUT,
                &mut self.tracks,
                &mut self.editor_row,
                &mut self.state,
                &mut self.pending_action,
                self.save_path.as_deref(),
            ) {
                Ok(true) => continue,
                Ok(false) => break,
                Err(err) => {
                    diagnostics::print_errors("settling handshake", &err);
                    return false;
                }
            }
        }

        self.transport = Some(transport);
        self.state.set(EventMask::CONNECTED);
        self.state.set(EventMask::CONNECT);
        true
    }

    #[cfg(feature = "client")]
    fn reconnect_if_needed(&mut self) {
        if self.state.contains(EventMask::CONNECTED) {
            return;
        }
        self.try_connect();
    }

    #[cfg(feature = "client")]
    fn drain_messages(&mut self) {
        let Some(mut transport) = self.transport.take() else {
            return;
        };

        loop {
            match Self::drain_into(
                &mut transport,
                Duration::ZERO,
                &mut self.tracks,
                &mut self.editor_row,
                &mut self.state,
                &mut self.pending_action,
                self.save_path.as_deref(),
            ) {
                Ok(true) => continue,
                Ok(false) => {
                    self.transport = Some(transport);
                    return;
                }
                Err(err) => {
                    diagnostics::print_errors("editor connection", &err);
                    self.state.unset(EventMask::CONNECTED);
                    self.state.set(EventMask::DISCONNECT);
                    return;
                }
            }
        }
    }

    /// Poll once and, if a command arrived, apply it. Returns `Ok(true)`
    /// if a command was processed (caller should poll again), `Ok(false)`
    /// if nothing was waiting.
    ///
    /// A free function over borrowed pieces of `Session` rather than a
    /// `&mut self` method, so [`Session::try_connect`] can drain into a
    /// not-yet-stored `Transport` during the handshake.
    #[cfg(feature = "client")]
    #[allow(clippy::too_many_arguments)]
    fn drain_into(
        transport: &mut Transport,
        timeout: Duration,
        tracks: &mut [Track],
        editor_row: &mut i64,
        state: &mut EventMask,
        pending_action: &mut Option<u32>,
        save_path: Option<&std::path::Path>,
    ) -> Result<bool, transport::Error> {
        let command = match protocol::try_recv_command(transport, timeout) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(false),
            Err(protocol::Error::Transport(err)) => return Err(err),
            Err(err) => {
                diagnostics::print_errors("decoding editor message", &err);
                return Ok(false);
            }
        };

        apply_command(command, tracks, editor_row, state, pending_action);

        if state.contains(EventMask::SAVE) {
            if let Some(path) = save_path {
                let image = ctf::encode(tracks);
                if let Err(err) = std::fs::write(path, image) {
                    diagnostics::print_errors("writing CTF save file", &err);
                }
            }
        }

        Ok(true)
    }

    fn reconcile_seek(&mut self, time: &mut f64) {
        if self.state.contains(EventMask::SEEK) {
            let row_f = if self.editor_row <= 0 {
                0.0
            } else {
                self.editor_row as f32 + SEEK_EPSILON_ROWS
            };
            *time = row_f as f64 / self.timescale as f64;
            return;
        }

        let derived_row = (*time * self.timescale as f64) as i64;
        if derived_row != self.editor_row {
            self.editor_row = derived_row;
            #[cfg(feature = "client")]
            {
                if let Some(transport) = self.transport.as_mut() {
                    let row = derived_row.max(0) as u32;
                    if let Err(err) = protocol::send_set_row(transport, row) {
                        diagnostics::print_errors("sending row update", &err);
                        self.state.unset(EventMask::CONNECTED);
                        self.state.set(EventMask::DISCONNECT);
                        self.transport = None;
                    }
                }
            }
        }
    }
}

/// Apply one decoded command to session state. Free function (not a
/// `Session` method) for the same reason as
/// [`Session::drain_into`](Session::drain_into): it runs during the
/// handshake, before `tracks`/`state` are wrapped back up in a `Session`.
#[cfg(feature = "client")]
#[allow(clippy::too_many_arguments)]
fn apply_command(
    command: Command,
    tracks: &mut [Track],
    editor_row: &mut i64,
    state: &mut EventMask,
    pending_action: &mut Option<u32>,
) {
    match command {
        Command::SetKey {
            track,
            row,
            value,
            interpolation,
        } => {
            if let Some(track) = tracks.get_mut(track as usize) {
                track.set_key(row, value, interpolation);
            }
        }
        Command::DeleteKey { track, row } => {
            if let Some(track) = tracks.get_mut(track as usize) {
                track.delete_key(row);
            }
        }
        Command::SetRow(row) => {
            *editor_row = row as i64;
            state.set(EventMask::SEEK);
        }
        Command::Pause(paused) => {
            if paused {
                state.unset(EventMask::PLAYING);
                state.set(EventMask::STOP);
            } else {
                state.set(EventMask::PLAYING);
                state.set(EventMask::PLAY);
            }
        }
        Command::SaveTracks => {
            state.set(EventMask::SAVE);
        }
        Command::Action(payload) => {
            *pending_action = Some(payload);
            state.set(EventMask::ACTION);
        }
        Command::Unknown(_) => {}
    }
}
