use crate::bspfile::LumpRecord;
use crate::data::Vector;
use binrw::BinRead;

/// `normal · p = distance`; the primitive along which nodes split space.
///
/// `sign_bits` isn't stored on disk — it's derived once at load time (one
/// bit per axis where the normal component is negative) and cached here
/// since every brush-side clip and AABB test against this plane needs it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector,
    pub distance: f32,
    pub plane_type: i32,
    pub sign_bits: u8,
}

#[derive(BinRead, Debug, Clone, Copy)]
pub(crate) struct RawPlane {
    normal: Vector,
    distance: f32,
    plane_type: i32,
}

impl LumpRecord for RawPlane {
    const SIZE: usize = 20;
}

impl From<RawPlane> for Plane {
    fn from(raw: RawPlane) -> Self {
        Plane {
            normal: raw.normal,
            distance: raw.distance,
            plane_type: raw.plane_type,
            sign_bits: sign_bits_for(raw.normal),
        }
    }
}

fn sign_bits_for(normal: Vector) -> u8 {
    let mut bits = 0u8;
    if normal.x < 0.0 {
        bits |= 1;
    }
    if normal.y < 0.0 {
        bits |= 2;
    }
    if normal.z < 0.0 {
        bits |= 4;
    }
    bits
}

impl Plane {
    /// Signed distance of `point` from the plane: positive in front.
    pub fn distance_to(&self, point: Vector) -> f32 {
        self.normal.dot(point) - self.distance
    }
}
