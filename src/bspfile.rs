use crate::error::{BspError, BspResult};
use crate::lzma::lzma_decompress_with_header;
use binrw::io::Cursor;
use binrw::{BinRead, BinReaderExt};
use num_enum::TryFromPrimitive;
use std::borrow::Cow;
use std::ops::Index;

/// A single entry in the 64-slot lump directory.
#[derive(BinRead, Debug, Clone, Copy, Default)]
pub struct LumpEntry {
    pub file_offset: i32,
    pub file_size: i32,
    pub version: i32,
    pub four_cc: [u8; 4],
}

/// The fixed-arity lump directory: exactly 64 entries, regardless of how
/// many the engine version in question actually populates.
#[derive(BinRead, Debug, Clone)]
pub struct Directories {
    #[br(count = 64)]
    entries: Vec<LumpEntry>,
}

impl Index<LumpType> for Directories {
    type Output = LumpEntry;

    fn index(&self, lump: LumpType) -> &LumpEntry {
        &self.entries[lump as usize]
    }
}

/// The 1036-byte on-disk header: ident, version, lump directory, revision.
#[derive(BinRead, Debug, Clone)]
pub struct Header {
    pub ident: [u8; 4],
    pub version: i32,
    pub lumps: Directories,
    pub map_revision: i32,
}

pub const EXPECTED_IDENT: [u8; 4] = *b"VBSP";

/// Closed enumeration over the 64 lump slots, in on-disk order.
///
/// Most of these are never touched by this crate's query surface (entities,
/// visibility, lighting, the pak file) — they're kept so a lump index can
/// always be named and bounds-checked, and so `game_lump`/`pak_file` can be
/// singled out as never-LZMA-framed-as-a-whole by the lump reader.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, TryFromPrimitive)]
pub enum LumpType {
    Entities,
    Planes,
    TextureData,
    Vertices,
    Visibility,
    Nodes,
    TextureInfo,
    Faces,
    Lighting,
    Occlusion,
    Leaves,
    FaceIds,
    Edges,
    SurfaceEdges,
    Models,
    WorldLights,
    LeafFaces,
    LeafBrushes,
    Brushes,
    BrushSides,
    Areas,
    AreaPortals,
    Unused0,
    Unused1,
    Unused2,
    Unused3,
    DisplacementInfo,
    OriginalFaces,
    PhysDisplacement,
    PhysCollide,
    VertNormals,
    VertNormalIndices,
    DisplacementLightMapAlphas,
    DisplacementVertices,
    DisplacementLightMapSamplePositions,
    GameLump,
    LeafWaterData,
    Primitives,
    PrimVertices,
    PrimIndices,
    PakFile,
    ClipPortalVertices,
    CubeMaps,
    TextureDataStringData,
    TextureDataStringTable,
    Overlays,
    LeafMinimumDistanceToWater,
    FaceMacroTextureInfo,
    DisplacementTris,
    PhysicsCollideSurface,
    WaterOverlays,
    LeafAmbientIndexHdr,
    LeafAmbientIndex,
    LightingHdr,
    WorldLightsHdr,
    LeafAmbientLightingHdr,
    LeafAmbientLighting,
    XZipPakFile,
    FacesHdr,
    MapFlags,
    OverlayFades,
    OverlaySystemLevels,
    PhysLevel,
    DisplacementMultiBlend,
}

static_assertions::const_assert_eq!(LumpType::DisplacementMultiBlend as usize, 63);

impl LumpType {
    /// Lumps whose payload is its own sub-framed container and must never
    /// be handed to the transparent LZMA path.
    fn is_opaque_container(self) -> bool {
        matches!(self, LumpType::GameLump | LumpType::PakFile)
    }
}

/// A fixed-size on-disk record making up a lump's typed array.
///
/// `SIZE` is the *on-disk* record size and is intentionally not derived
/// from `mem::size_of` — Rust is free to insert padding a struct definition
/// doesn't ask binrw to write, so reinterpreting a raw buffer by
/// `size_of`-based chunking can silently desync on platforms where a
/// record's natural alignment exceeds its packed size. Declaring `SIZE`
/// alongside each record keeps decoding anchored to the documented
/// little-endian on-disk layout instead of the host's struct layout.
pub trait LumpRecord: for<'a> BinRead<Args<'a> = ()> {
    const SIZE: usize;
}

/// The read half of the file: owns the raw bytes and the parsed header,
/// and knows how to resolve and decompress any lump.
pub struct BspFile<'a> {
    data: &'a [u8],
    header: Header,
}

impl<'a> BspFile<'a> {
    pub fn new(data: &'a [u8]) -> BspResult<Self> {
        let mut cursor = Cursor::new(data);
        let header: Header = cursor
            .read_le()
            .map_err(|e| BspError::malformed("header", e))?;

        if header.ident != EXPECTED_IDENT {
            return Err(BspError::BadIdent(header.ident));
        }

        Ok(BspFile { data, header })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    fn entry(&self, lump: LumpType) -> &LumpEntry {
        &self.header.lumps[lump]
    }

    /// Resolve a lump to its raw bytes, transparently decompressing an
    /// LZMA-framed payload. `game_lump` and `pak_file` are returned as-is:
    /// they carry their own internal sub-framing.
    pub fn raw_lump(&self, lump: LumpType) -> BspResult<Cow<'a, [u8]>> {
        let entry = self.entry(lump);
        if entry.file_size == 0 {
            return Ok(Cow::Borrowed(&[]));
        }

        let start = entry.file_offset as usize;
        let end = start + entry.file_size as usize;
        let raw = self
            .data
            .get(start..end)
            .ok_or_else(|| BspError::Io(unexpected_eof("lump extends past end of file")))?;

        if !lump.is_opaque_container() && raw.len() >= 4 && &raw[..4] == b"LZMA" {
            let decompressed = lzma_decompress_with_header(raw, None)?;
            Ok(Cow::Owned(decompressed))
        } else {
            Ok(Cow::Borrowed(raw))
        }
    }

    /// Read a lump as a dense typed array, per the lump reader's contract:
    /// seek/read, sniff + decompress, then chunk the resulting buffer into
    /// fixed `T::SIZE` records.
    pub fn read_lump<T: LumpRecord>(&self, lump: LumpType) -> BspResult<Vec<T>> {
        let data = self.raw_lump(lump)?;
        if data.len() % T::SIZE != 0 {
            return Err(BspError::Alignment {
                lump,
                element_size: T::SIZE,
                size: data.len(),
            });
        }

        let count = data.len() / T::SIZE;
        let mut out = Vec::with_capacity(count);
        let mut cursor = Cursor::new(&data[..]);
        for _ in 0..count {
            let record: T = cursor
                .read_le()
                .map_err(|e| BspError::malformed("lump record", e))?;
            out.push(record);
        }
        Ok(out)
    }
}

fn unexpected_eof(msg: &'static str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::UnexpectedEof, msg)
}

/// Convert a raw directory slot index, validating it against the fixed
/// 64-entry directory. Used by callers that only have a numeric lump id
/// (e.g. diagnostics) rather than a `LumpType` in hand.
pub fn lump_from_index(index: usize) -> BspResult<LumpType> {
    u8::try_from(index)
        .ok()
        .and_then(|index| LumpType::try_from_primitive(index).ok())
        .ok_or(BspError::LumpOutOfRange(index))
}
