use crate::bspfile::LumpRecord;
use binrw::BinRead;

/// A pair of vertex indices. `surf_edges` signs select which endpoint of
/// the referenced edge comes first when walking a face's perimeter.
#[derive(BinRead, Debug, Clone, Copy)]
pub struct Edge {
    pub v0: u16,
    pub v1: u16,
}

impl LumpRecord for Edge {
    const SIZE: usize = 4;
}

impl crate::bspfile::LumpRecord for i32 {
    const SIZE: usize = 4;
}

impl crate::bspfile::LumpRecord for u16 {
    const SIZE: usize = 2;
}
