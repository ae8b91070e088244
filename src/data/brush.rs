use crate::bspfile::LumpRecord;
use crate::data::Contents;
use binrw::BinRead;

/// A convex solid defined as the intersection of half-spaces (brush-sides).
#[derive(BinRead, Debug, Clone, Copy)]
pub struct Brush {
    pub first_side: i32,
    pub num_sides: i32,
    pub contents: Contents,
}

impl LumpRecord for Brush {
    const SIZE: usize = 12;
}

/// One half-space of a brush.
#[derive(BinRead, Debug, Clone, Copy)]
pub struct BrushSide {
    pub plane_index: u16,
    pub tex_info: i16,
    pub disp_info: i16,
    #[br(pad_after = 1)]
    pub bevel: u8,
}

impl LumpRecord for BrushSide {
    const SIZE: usize = 8;
}
