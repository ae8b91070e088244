use crate::bspfile::LumpType;
use thiserror::Error;

/// Errors surfaced at the `load_map` boundary.
///
/// `trace_ray` and `is_visible` never fail: once a map is loaded its tables
/// are assumed valid and traversal is total over them.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BspError {
    #[error("map file not found: {0}")]
    NotFound(std::path::PathBuf),
    #[error("unexpected bsp header identifier {0:?}, expected \"VBSP\"")]
    BadIdent([u8; 4]),
    #[error("io error while reading bsp data: {0}")]
    Io(#[from] std::io::Error),
    #[error("lump index {0} is out of range of the 64 entry directory")]
    LumpOutOfRange(usize),
    #[error("lump begins with an LZMA ident but the frame header is malformed")]
    LzmaHeader,
    #[error("failed to decompress LZMA-framed lump: {0}")]
    Decompress(lzma_rs::error::Error),
    #[error("{lump:?} payload of {size} bytes does not divide evenly into records of {element_size} bytes")]
    Alignment {
        lump: LumpType,
        element_size: usize,
        size: usize,
    },
    #[error(transparent)]
    IndexOutOfRange(#[from] ValidationError),
    #[error("malformed binary data while parsing {what}: {source:#}")]
    MalformedData {
        what: &'static str,
        source: binrw::Error,
    },
}

impl BspError {
    pub(crate) fn malformed(what: &'static str, source: binrw::Error) -> Self {
        match source {
            binrw::Error::Io(e) => BspError::Io(e),
            source => BspError::MalformedData { what, source },
        }
    }
}

impl From<lzma_rs::error::Error> for BspError {
    fn from(e: lzma_rs::error::Error) -> Self {
        use lzma_rs::error::Error;

        match e {
            Error::IoError(e) => BspError::Io(e),
            e => BspError::Decompress(e),
        }
    }
}

/// Structural faults in an otherwise well-formed file: an index that doesn't
/// actually land inside the table it's supposed to reference.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(
        "a {source_} indexes into {target} but the index {index} is out of range of the size {size}"
    )]
    ReferenceOutOfRange {
        source_: &'static str,
        target: &'static str,
        index: i64,
        size: usize,
    },
    #[error("bsp contains no root node")]
    NoRootNode,
}

pub type BspResult<T> = Result<T, BspError>;
