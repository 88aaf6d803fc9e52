//! The Compact Track Format (CTF): a self-describing binary archive for
//! all tracks, used for both loading and saving.
//!
//! Unlike the wire protocol, CTF keyframe values are stored in
//! native-endian layout (the signature's embedded float and trailer bytes
//! exist precisely to detect cross-machine endianness and text-mode
//! transport mismatches, not to normalize them away).

use crate::lowlevel::interpolation::Interpolation;
use crate::lowlevel::track::{Key, Track};
use crate::registry::Registry;
use std::io::{self, Cursor, Read};
use thiserror::Error;

const SIGNATURE_LEN: usize = 16;

/// A LEB128 value is rejected past this many continuation bytes. Five
/// bytes carry 35 bits, more than enough for any `u32`; the reference
/// encoder never emits more, but its decoder doesn't enforce the limit on
/// read. This implementation does, turning an ambiguous edge case into a
/// typed error instead of undefined behavior.
const MAX_LEB128_BYTES: u32 = 5;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a crocket track file (signature mismatch)")]
    SignatureMismatch,
    #[error("truncated or corrupt CTF archive")]
    UnexpectedEof(#[from] io::Error),
    #[error("LEB128-encoded value exceeded {MAX_LEB128_BYTES} bytes")]
    Leb128Overflow,
}

fn signature() -> [u8; SIGNATURE_LEN] {
    let mut sig = [0u8; SIGNATURE_LEN];
    sig[0..8].copy_from_slice(b"crocket\n");
    sig[8..12].copy_from_slice(&1.0f32.to_ne_bytes());
    sig[12..16].copy_from_slice(&[0x0D, 0x0A, 0x00, 0x1A]);
    sig
}

fn write_leb128(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}

fn read_leb128(cursor: &mut Cursor<&[u8]>) -> Result<u32, DecodeError> {
    let mut result: u32 = 0;
    let mut byte = [0u8; 1];
    for i in 0..MAX_LEB128_BYTES {
        cursor.read_exact(&mut byte)?;
        result |= u32::from(byte[0] & 0x7f) << (7 * i);
        if byte[0] & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(DecodeError::Leb128Overflow)
}

/// Serialize every non-empty track, in registry order, into a fresh CTF
/// image. Empty tracks are dropped; the caller owns the returned buffer.
///
/// Gated behind the `client` feature: a player-only build never saves, only
/// loads (see [`decode`]).
#[cfg(feature = "client")]
pub fn encode(tracks: &[Track]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&signature());

    let nonempty: Vec<&Track> = tracks.iter().filter(|t| !t.keys().is_empty()).collect();
    write_leb128(&mut out, nonempty.len() as u32);

    for track in nonempty {
        let name_bytes = track.name().as_bytes();
        write_leb128(&mut out, name_bytes.len() as u32);
        out.extend_from_slice(name_bytes);

        write_leb128(&mut out, track.keys().len() as u32);

        let mut reference: u32 = 0;
        for key in track.keys() {
            let delta = key.row - reference;
            write_leb128(&mut out, delta);
            reference = key.row + 1;

            out.extend_from_slice(&key.value.to_ne_bytes());
            out.push(key.interpolation as u8);
        }
    }

    out
}

/// Decode a CTF archive into `tracks`, indexed the same way as `registry`.
///
/// A signature mismatch leaves `tracks` untouched and is reported, not
/// treated as a hard failure — callers following spec.md's trusted-input
/// stance may choose to ignore it and keep playing with empty tracks.
/// Unknown track names are read and discarded to keep the byte stream
/// aligned for the tracks that follow.
pub fn decode(data: &[u8], registry: &Registry, tracks: &mut [Track]) -> Result<(), DecodeError> {
    if data.len() < SIGNATURE_LEN || data[..SIGNATURE_LEN] != signature() {
        return Err(DecodeError::SignatureMismatch);
    }

    let mut cursor = Cursor::new(&data[SIGNATURE_LEN..]);
    let track_count = read_leb128(&mut cursor)?;

    for _ in 0..track_count {
        let name_len = read_leb128(&mut cursor)? as usize;
        let mut name_buf = vec![0u8; name_len];
        cursor.read_exact(&mut name_buf)?;
        let key_count = read_leb128(&mut cursor)?;

        let known = std::str::from_utf8(&name_buf)
            .ok()
            .and_then(|name| registry.get(name))
            .filter(|id| id.index() < tracks.len());

        match known {
            Some(id) => {
                let track = &mut tracks[id.index()];
                track.clear();
                decode_keys(&mut cursor, key_count, |key| track.push_sorted(key))?;
            }
            None => decode_keys(&mut cursor, key_count, |_| {})?,
        }
    }

    Ok(())
}

fn decode_keys(
    cursor: &mut Cursor<&[u8]>,
    count: u32,
    mut sink: impl FnMut(Key),
) -> Result<(), DecodeError> {
    let mut reference: u32 = 0;
    for _ in 0..count {
        let delta = read_leb128(cursor)?;
        let row = reference + delta;
        reference = row + 1;

        let mut value_buf = [0u8; 4];
        cursor.read_exact(&mut value_buf)?;
        let value = f32::from_ne_bytes(value_buf);

        let mut interp_buf = [0u8; 1];
        cursor.read_exact(&mut interp_buf)?;

        sink(Key::new(row, value, Interpolation::from(interp_buf[0])));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn leb128_round_trips_representative_values() {
        let mut values: Vec<u32> = vec![0, 1, 63, 64, 127, 128];
        for shift in 0..32 {
            let base = 1u32 << shift;
            values.push(base);
            values.push(base.wrapping_sub(1));
            values.push(base.wrapping_add(1));
        }
        values.push(u32::MAX);

        for value in values {
            let mut buf = Vec::new();
            write_leb128(&mut buf, value);
            assert!(buf.len() <= MAX_LEB128_BYTES as usize);
            let mut cursor = Cursor::new(buf.as_slice());
            assert_eq!(read_leb128(&mut cursor).unwrap(), value);
        }
    }

    #[test]
    fn leb128_rejects_sixth_continuation_byte() {
        let bytes = [0x80u8, 0x80, 0x80, 0x80, 0x80, 0x01];
        let mut cursor = Cursor::new(&bytes[..]);
        assert!(matches!(
            read_leb128(&mut cursor),
            Err(DecodeError::Leb128Overflow)
        ));
    }

    fn make_registry() -> (Registry, Vec<Track>) {
        let registry = Registry::new(["empty", "one", "many"]).unwrap();
        let tracks = vec![
            Track::new("empty"),
            Track::new("one"),
            Track::new("many"),
        ];
        (registry, tracks)
    }

    #[test]
    fn round_trip_preserves_keys_and_drops_empty_tracks() {
        let (registry, mut tracks) = make_registry();
        tracks[1].set_key(5, 1.5, Interpolation::Step);
        for row in 0..100u32 {
            tracks[2].set_key(
                row,
                row as f32 * 0.5,
                match row % 4 {
                    0 => Interpolation::Step,
                    1 => Interpolation::Linear,
                    2 => Interpolation::Smooth,
                    _ => Interpolation::Ramp,
                },
            );
        }

        let encoded = encode(&tracks);

        let mut restored = vec![Track::new("empty"), Track::new("one"), Track::new("many")];
        decode(&encoded, &registry, &mut restored).unwrap();

        assert!(restored[0].keys().is_empty());
        assert_eq!(restored[1].keys(), tracks[1].keys());
        assert_eq!(restored[2].keys(), tracks[2].keys());
    }

    #[test]
    fn signature_mismatch_leaves_tracks_untouched() {
        let (registry, mut tracks) = make_registry();
        tracks[1].set_key(1, 1.0, Interpolation::Step);
        let before = tracks[1].keys().to_vec();

        let garbage = vec![0u8; 32];
        let result = decode(&garbage, &registry, &mut tracks);

        assert!(matches!(result, Err(DecodeError::SignatureMismatch)));
        assert_eq!(tracks[1].keys(), before.as_slice());
    }

    #[test]
    fn unknown_track_name_is_skipped_without_desync() {
        // The archive carries a track the decoding registry has never heard
        // of; its bytes must still be consumed so the following track (if
        // any) stays aligned.
        let registry = Registry::new(["known"]).unwrap();
        let mut source_tracks = vec![Track::new("known"), Track::new("mystery")];
        source_tracks[1].set_key(3, 9.0, Interpolation::Ramp);
        source_tracks[0].set_key(1, 2.0, Interpolation::Linear);

        let encoded = encode(&source_tracks);

        let mut restored = vec![Track::new("known")];
        decode(&encoded, &registry, &mut restored).unwrap();

        assert_eq!(restored[0].keys().len(), 1);
        assert_eq!(restored[0].keys()[0].row, 1);
    }
}
