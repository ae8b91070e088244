use crate::error::{BspError, BspResult};
use crate::lzma::lzma_decompress_with_header;
use binrw::BinRead;
use bitflags::bitflags;
use std::borrow::Cow;

/// The game lump is a sub-container of per-game sub-lumps (static props,
/// detail props, ...), each independently compressible. This core parses
/// the directory — enough to bounds-check and, on request, hand back a
/// sub-lump's decompressed byte range — but never interprets a payload:
/// that's an external collaborator's job per this crate's scope.
#[derive(Debug, Clone, BinRead)]
pub struct GameLumpHeader {
    pub count: i32,
    #[br(count = count)]
    pub lumps: Vec<GameLumpEntry>,
}

impl GameLumpHeader {
    /// Resolve a sub-lump's raw bytes by its four-byte id (e.g. `sprp` for
    /// static props), transparently decompressing it if flagged.
    pub fn raw_sub_lump<'a>(&self, id: i32, data: &'a [u8]) -> Option<BspResult<Cow<'a, [u8]>>> {
        let (i, lump) = self
            .lumps
            .iter()
            .enumerate()
            .find(|(_, lump)| lump.id == id)?;

        Some(self.sub_lump_bytes(i, lump, data))
    }

    fn sub_lump_bytes<'a>(
        &self,
        i: usize,
        lump: &GameLumpEntry,
        data: &'a [u8],
    ) -> BspResult<Cow<'a, [u8]>> {
        if lump.flags.contains(GameLumpFlags::COMPRESSED) {
            let next = self
                .lumps
                .get(i + 1)
                .map(|l| l.offset)
                .unwrap_or(lump.offset + lump.length);
            let compressed_size = (next - lump.offset) as usize;
            let raw = data
                .get(lump.offset as usize..lump.offset as usize + compressed_size)
                .ok_or_else(|| BspError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "game lump sub-entry out of bounds of the file",
                )))?;
            let decompressed = lzma_decompress_with_header(raw, Some(lump.length as usize))?;
            Ok(Cow::Owned(decompressed))
        } else {
            let raw = data
                .get(lump.offset as usize..(lump.offset + lump.length) as usize)
                .ok_or_else(|| BspError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "game lump sub-entry out of bounds of the file",
                )))?;
            Ok(Cow::Borrowed(raw))
        }
    }
}

#[derive(Debug, Clone, BinRead)]
pub struct GameLumpEntry {
    pub id: i32,
    pub flags: GameLumpFlags,
    pub version: u16,
    pub offset: i32,
    pub length: i32,
}

#[derive(BinRead, Debug, Clone, Copy)]
pub struct GameLumpFlags(u16);

bitflags! {
    impl GameLumpFlags: u16 {
        const COMPRESSED = 0b0000_0000_0000_0001;
    }
}
