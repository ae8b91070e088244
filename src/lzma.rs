use crate::error::{BspError, BspResult};
use binrw::io::Cursor;

/// Length of the custom 17-byte LZMA frame header prefixed to a compressed
/// lump: a 4-byte ident, the decompressed size, the compressed size, and a
/// 5-byte LZMA properties block.
const LZMA_FRAME_HEADER_LEN: usize = 17;
const LZMA_IDENT: &[u8; 4] = b"LZMA";

/// Decompress a lump payload that begins with the 17-byte LZMA frame header
/// described in the file format. `expected_size`, when given, is cross
/// checked against the frame's own `actual_size` field (used for game lump
/// sub-frames, whose directory entry separately records the expected
/// decompressed length).
pub fn lzma_decompress_with_header(raw: &[u8], expected_size: Option<usize>) -> BspResult<Vec<u8>> {
    if raw.len() < LZMA_FRAME_HEADER_LEN || &raw[0..4] != LZMA_IDENT {
        return Err(BspError::LzmaHeader);
    }

    let actual_size = u32::from_le_bytes(raw[4..8].try_into().unwrap());
    let lzma_size = u32::from_le_bytes(raw[8..12].try_into().unwrap());
    let properties = &raw[12..LZMA_FRAME_HEADER_LEN];

    if let Some(expected) = expected_size {
        if expected != actual_size as usize {
            return Err(BspError::LzmaHeader);
        }
    }

    let payload = raw
        .get(LZMA_FRAME_HEADER_LEN..LZMA_FRAME_HEADER_LEN + lzma_size as usize)
        .ok_or(BspError::LzmaHeader)?;

    // lzma-rs expects the classic 13-byte `.lzma` stream header (5
    // properties bytes followed by an 8-byte little-endian decompressed
    // size) rather than our custom 17-byte frame, so splice one together
    // in front of the compressed payload.
    let mut stream = Vec::with_capacity(5 + 8 + payload.len());
    stream.extend_from_slice(properties);
    stream.extend_from_slice(&(actual_size as u64).to_le_bytes());
    stream.extend_from_slice(payload);

    let mut reader = Cursor::new(stream);
    let mut output = Vec::with_capacity(actual_size as usize);
    lzma_rs::lzma_decompress(&mut reader, &mut output)?;

    Ok(output)
}
