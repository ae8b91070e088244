use arrayvec::ArrayVec;
use binrw::{BinRead, BinResult, Endian};
use std::io::{Read, Seek};

/// A fixed-width, NUL-padded string embedded inline in a record (used by
/// the static prop dictionary in the game lump). Reads exactly `N` bytes
/// and trims at the first NUL.
#[derive(Debug, Clone)]
pub struct FixedString<const N: usize>(ArrayVec<u8, N>);

impl<const N: usize> FixedString<N> {
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl<const N: usize> BinRead for FixedString<N> {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut buf = [0u8; N];
        reader.read_exact(&mut buf)?;
        let len = buf.iter().position(|&b| b == 0).unwrap_or(N);
        Ok(FixedString(buf[..len].iter().copied().collect()))
    }
}
