use crate::bspfile::LumpRecord;
use binrw::BinRead;

/// An internal split in the tree. A negative child encodes a leaf at index
/// `-1 - child`; a non-negative child is another node index.
#[derive(BinRead, Debug, Clone, Copy)]
pub struct Node {
    pub plane_index: i32,
    pub children: [i32; 2],
    pub mins: [i16; 3],
    pub maxs: [i16; 3],
    pub first_face: u16,
    pub num_faces: u16,
    #[br(pad_after = 2)]
    pub area: i16,
}

impl LumpRecord for Node {
    const SIZE: usize = 32;
}

/// Decode a node/leaf child index as stored on disk.
///
/// Returns `Ok(node_index)` for a non-negative child, `Err(leaf_index)` for
/// a negative one.
pub fn decode_child(child: i32) -> Result<usize, usize> {
    if child >= 0 {
        Ok(child as usize)
    } else {
        Err((-1 - child) as usize)
    }
}
