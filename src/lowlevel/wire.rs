//! Shared big-endian wire primitives used by the protocol parser.
//!
//! Floats are transmitted as a 4-byte blob whose bit pattern travels the
//! same big-endian convention as a `u32` — an explicit `from_bits`/
//! `to_bits` round trip rather than a raw memcpy, so this is portable to
//! non-x86 and strict-aliasing-sensitive targets.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

pub fn read_u8<R: Read>(r: &mut R) -> io::Result<u8> {
    r.read_u8()
}

pub fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    r.read_u32::<BigEndian>()
}

pub fn read_f32<R: Read>(r: &mut R) -> io::Result<f32> {
    Ok(f32::from_bits(r.read_u32::<BigEndian>()?))
}

pub fn write_u8<W: Write>(w: &mut W, value: u8) -> io::Result<()> {
    w.write_u8(value)
}

pub fn write_u32<W: Write>(w: &mut W, value: u32) -> io::Result<()> {
    w.write_u32::<BigEndian>(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn u32_round_trips_big_endian() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0x0102_0304).unwrap();
        assert_eq!(buf, vec![0x01, 0x02, 0x03, 0x04]);
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_u32(&mut cursor).unwrap(), 0x0102_0304);
    }

    #[test]
    fn f32_bit_pattern_travels_big_endian() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 1.0f32.to_bits()).unwrap();
        assert_eq!(buf, vec![0x3f, 0x80, 0x00, 0x00]);
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_f32(&mut cursor).unwrap(), 1.0);
    }
}
