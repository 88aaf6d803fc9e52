//! The editor protocol state machine: handshake, inbound command
//! decoding, and the one outbound message (`SET_ROW`) the client sends
//! beyond the handshake.

use crate::lowlevel::interpolation::Interpolation;
use crate::lowlevel::transport::{self, Readiness, Transport};
use crate::lowlevel::wire;
use std::time::Duration;
use thiserror::Error;

const CLIENT_GREETING: &[u8; 19] = b"hello, synctracker!";
const SERVER_GREETING: &[u8; 12] = b"hello, demo!";

const TAG_SET_KEY: u8 = 0;
const TAG_DELETE_KEY: u8 = 1;
const TAG_GET_TRACK: u8 = 2;
const TAG_SET_ROW: u8 = 3;
const TAG_PAUSE: u8 = 4;
const TAG_SAVE_TRACKS: u8 = 5;
const TAG_ACTION: u8 = 6;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] transport::Error),
    #[error("Rocket server sent an unexpected greeting: {0:?}")]
    GreetingMismatch([u8; SERVER_GREETING.len()]),
}

/// A fully decoded inbound message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetKey {
        track: u32,
        row: u32,
        value: f32,
        interpolation: Interpolation,
    },
    DeleteKey {
        track: u32,
        row: u32,
    },
    SetRow(u32),
    Pause(bool),
    SaveTracks,
    Action(u32),
    /// An unrecognized tag. Per the wire format, an unknown tag's payload
    /// has no documented length and cannot be safely skipped, so nothing
    /// past the tag byte is read.
    Unknown(u8),
}

/// Send the client greeting and verify the server's reply.
pub fn handshake(transport: &mut Transport) -> Result<(), Error> {
    transport.send_all(CLIENT_GREETING)?;
    let mut reply = [0u8; SERVER_GREETING.len()];
    transport.recv_all(&mut reply)?;
    if &reply == SERVER_GREETING {
        Ok(())
    } else {
        Err(Error::GreetingMismatch(reply))
    }
}

/// Send `GET_TRACK` for `name`.
pub fn send_get_track(transport: &mut Transport, name: &str) -> Result<(), Error> {
    let mut buf = Vec::with_capacity(1 + 4 + name.len());
    // Writes into a `Vec<u8>` are infallible; `wire`'s helpers return
    // `io::Result` only because they're generic over any `Write`.
    wire::write_u8(&mut buf, TAG_GET_TRACK).expect("writing to a Vec cannot fail");
    let len = u32::try_from(name.len()).expect("track name longer than u32::MAX bytes");
    wire::write_u32(&mut buf, len).expect("writing to a Vec cannot fail");
    buf.extend_from_slice(name.as_bytes());
    transport.send_all(&buf)?;
    Ok(())
}

/// Send `SET_ROW(row)`.
pub fn send_set_row(transport: &mut Transport, row: u32) -> Result<(), Error> {
    let mut buf = [0u8; 5];
    buf[0] = TAG_SET_ROW;
    buf[1..].copy_from_slice(&row.to_be_bytes());
    transport.send_all(&buf)?;
    Ok(())
}

/// Poll for and, if ready, decode exactly one inbound command.
///
/// `timeout` is forwarded to [`Transport::poll_readable`]; pass
/// `Duration::ZERO` for the per-frame drain, which never blocks.
pub fn try_recv_command(
    transport: &mut Transport,
    timeout: Duration,
) -> Result<Option<Command>, Error> {
    if transport.poll_readable(timeout)? == Readiness::Empty {
        return Ok(None);
    }

    let mut tag = [0u8; 1];
    transport.recv_all(&mut tag)?;

    let command = match tag[0] {
        TAG_SET_KEY => {
            let track = recv_u32(transport)?;
            let row = recv_u32(transport)?;
            let value = recv_f32(transport)?;
            let mut interp = [0u8; 1];
            transport.recv_all(&mut interp)?;
            Command::SetKey {
                track,
                row,
                value,
                interpolation: Interpolation::from(interp[0]),
            }
        }
        TAG_DELETE_KEY => {
            let track = recv_u32(transport)?;
            let row = recv_u32(transport)?;
            Command::DeleteKey { track, row }
        }
        TAG_SET_ROW => Command::SetRow(recv_u32(transport)?),
        TAG_PAUSE => {
            let mut flag = [0u8; 1];
            transport.recv_all(&mut flag)?;
            Command::Pause(flag[0] != 0)
        }
        TAG_SAVE_TRACKS => Command::SaveTracks,
        TAG_ACTION => Command::Action(recv_u32(transport)?),
        other => Command::Unknown(other),
    };

    Ok(Some(command))
}

fn recv_u32(transport: &mut Transport) -> Result<u32, Error> {
    let mut buf = [0u8; 4];
    transport.recv_all(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn recv_f32(transport: &mut Transport) -> Result<f32, Error> {
    Ok(f32::from_bits(recv_u32(transport)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    fn loopback_pair() -> (Transport, TcpStream) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let addr = listener.local_addr().unwrap();
        let client = thread::spawn(move || Transport::connect(addr).unwrap());
        let (server, _) = listener.accept().unwrap();
        (client.join().unwrap(), server)
    }

    #[test]
    fn handshake_succeeds_on_correct_greeting() {
        let (mut transport, mut server) = loopback_pair();
        let server_thread = thread::spawn(move || {
            let mut greeting = [0u8; 19];
            server.read_exact(&mut greeting).unwrap();
            assert_eq!(&greeting, CLIENT_GREETING);
            server.write_all(SERVER_GREETING).unwrap();
        });
        handshake(&mut transport).unwrap();
        server_thread.join().unwrap();
    }

    #[test]
    fn handshake_fails_on_wrong_greeting() {
        let (mut transport, mut server) = loopback_pair();
        let server_thread = thread::spawn(move || {
            let mut greeting = [0u8; 19];
            server.read_exact(&mut greeting).unwrap();
            server.write_all(b"nope, get lost!").unwrap();
        });
        assert!(matches!(
            handshake(&mut transport),
            Err(Error::GreetingMismatch(_))
        ));
        server_thread.join().unwrap();
    }

    #[test]
    fn decodes_set_key() {
        let (mut transport, mut server) = loopback_pair();
        transport.handshake_complete().unwrap();
        server
            .write_all(&[0, 0, 0, 0, 0, 0, 0, 0, 10])
            .unwrap(); // track=0
        let value_bytes = 2.5f32.to_bits().to_be_bytes();
        server.write_all(&value_bytes).unwrap();
        server.write_all(&[1]).unwrap(); // Linear

        let cmd = try_recv_command(&mut transport, Duration::from_millis(200))
            .unwrap()
            .unwrap();
        assert_eq!(
            cmd,
            Command::SetKey {
                track: 0,
                row: 10,
                value: 2.5,
                interpolation: Interpolation::Linear,
            }
        );
    }

    #[test]
    fn unknown_tag_does_not_consume_further_bytes() {
        let (mut transport, mut server) = loopback_pair();
        transport.handshake_complete().unwrap();
        server.write_all(&[200]).unwrap();
        let cmd = try_recv_command(&mut transport, Duration::from_millis(200))
            .unwrap()
            .unwrap();
        assert_eq!(cmd, Command::Unknown(200));
    }

    #[test]
    fn no_data_returns_none() {
        let (mut transport, _server) = loopback_pair();
        transport.handshake_complete().unwrap();
        assert_eq!(
            try_recv_command(&mut transport, Duration::ZERO).unwrap(),
            None
        );
    }
}
