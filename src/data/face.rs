use crate::bspfile::LumpRecord;
use binrw::BinRead;

/// A polygon on the boundary of a brush. `disp_info >= 0` marks a
/// displacement surface; such faces are skipped when building the polygon
/// table and by the ray tests that walk it.
#[derive(BinRead, Debug, Clone, Copy)]
pub struct Face {
    pub plane_index: u16,
    pub side: u8,
    pub on_node: u8,
    pub first_edge: i32,
    pub num_edges: i16,
    pub tex_info: i16,
    pub disp_info: i16,
    pub surface_fog_volume_id: i16,
    pub styles: [u8; 4],
    pub light_offset: i32,
    pub area: f32,
    pub lightmap_texture_mins_in_luxels: [i32; 2],
    pub lightmap_texture_size_in_luxels: [i32; 2],
    pub orig_face: i32,
    pub num_prims: u16,
    pub first_prim_id: u16,
    pub smoothing_groups: u32,
}

impl Face {
    pub fn is_displacement(&self) -> bool {
        self.disp_info >= 0
    }
}

impl LumpRecord for Face {
    const SIZE: usize = 56;
}
