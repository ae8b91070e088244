use crate::bspfile::LumpRecord;
use crate::data::SurfFlags;
use binrw::BinRead;

/// Texture/surface mapping info; this core only consults `flags`.
#[derive(BinRead, Debug, Clone, Copy)]
pub struct TexInfo {
    pub texture_vecs: [[f32; 4]; 2],
    pub lightmap_vecs: [[f32; 4]; 2],
    pub flags: SurfFlags,
    pub tex_data: i32,
}

impl LumpRecord for TexInfo {
    const SIZE: usize = 72;
}
