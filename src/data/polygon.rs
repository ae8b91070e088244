use crate::data::{Edge, Face, Plane, SurfFlags, TexInfo, Vector};
use crate::error::{BspResult, ValidationError};

/// The ordered perimeter of a non-displacement face, plus the plane it
/// lies on. Built once in `load_map` by walking `surf_edges` and is kept in
/// 1:1 order with the filtered (non-displacement) face list.
#[derive(Debug, Clone)]
pub struct Polygon {
    pub vertices: Vec<Vector>,
    pub plane: Plane,
    /// `true` for `SURF_NODRAW`/`SURF_HINT`/`SURF_SKIP` surfaces, which
    /// ray tests skip even though the polygon is retained in the table.
    pub skip_test: bool,
}

impl Polygon {
    /// Degenerate faces are retained as empty polygons so indices still
    /// line up, but are skipped by surface tests.
    pub fn is_degenerate(&self) -> bool {
        self.vertices.len() < 3
    }
}

const NON_COLLIDING: SurfFlags = SurfFlags::NODRAW.union(SurfFlags::HINT).union(SurfFlags::SKIP);

pub(crate) fn build_polygon(
    face: &Face,
    planes: &[Plane],
    edges: &[Edge],
    surf_edges: &[i32],
    vertices: &[Vector],
    tex_infos: &[TexInfo],
) -> BspResult<Polygon> {
    let skip_test = usize::try_from(face.tex_info)
        .ok()
        .and_then(|index| tex_infos.get(index))
        .is_some_and(|info| info.flags.intersects(NON_COLLIDING));

    let plane = *planes
        .get(face.plane_index as usize)
        .ok_or_else(|| ValidationError::ReferenceOutOfRange {
            source_: "face",
            target: "planes",
            index: face.plane_index as i64,
            size: planes.len(),
        })?;

    let first = face.first_edge as usize;
    let count = face.num_edges.max(0) as usize;
    let mut ring = Vec::with_capacity(count);

    for offset in 0..count {
        let se = *surf_edges
            .get(first + offset)
            .ok_or_else(|| ValidationError::ReferenceOutOfRange {
                source_: "face",
                target: "surf_edges",
                index: (first + offset) as i64,
                size: surf_edges.len(),
            })?;

        let edge = edges
            .get(se.unsigned_abs() as usize)
            .ok_or_else(|| ValidationError::ReferenceOutOfRange {
                source_: "surf_edge",
                target: "edges",
                index: se.unsigned_abs() as i64,
                size: edges.len(),
            })?;

        let vertex_index = if se >= 0 { edge.v0 } else { edge.v1 };
        let vertex = *vertices.get(vertex_index as usize).ok_or_else(|| {
            ValidationError::ReferenceOutOfRange {
                source_: "edge",
                target: "vertices",
                index: vertex_index as i64,
                size: vertices.len(),
            }
        })?;

        ring.push(vertex);
    }

    Ok(Polygon {
        vertices: ring,
        plane,
        skip_test,
    })
}
