use crate::bspfile::LumpRecord;
use crate::data::Contents;
use binrw::BinRead;

/// A convex region of space at a tree tip; carries the surface and brush
/// lists it bounds.
#[derive(BinRead, Debug, Clone, Copy)]
pub struct Leaf {
    pub contents: Contents,
    pub cluster: i16,
    pub area_flags: i16,
    pub mins: [i16; 3],
    pub maxs: [i16; 3],
    pub first_leaf_face: u16,
    pub num_leaf_faces: u16,
    pub first_leaf_brush: u16,
    pub num_leaf_brushes: u16,
    #[br(pad_after = 2)]
    pub water_data_id: i16,
}

impl LumpRecord for Leaf {
    const SIZE: usize = 32;
}
