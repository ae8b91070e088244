use crate::data::{decode_child, Contents, Plane, Vector};
use crate::map::Tables;

/// `ε = 1/32`: the historical Source-engine split epsilon. It's tied to the
/// map-compilation grid; changing it risks subtly different behavior on
/// co-planar surfaces (see the grazing-segment scenario in the tests below).
const DIST_EPSILON: f32 = 1.0 / 32.0;

/// Result of a swept-point query: first-hit fraction, plane, and contents.
#[derive(Debug, Clone)]
pub struct TraceResult {
    /// Fraction of the segment traveled before the first hit, in `[0, 1]`.
    /// `1.0` means the segment reached `dest` unobstructed.
    pub fraction: f32,
    pub end_pos: Vector,
    pub plane: Option<Plane>,
    pub contents: Contents,
    pub start_solid: bool,
    pub all_solid: bool,
}

impl Default for TraceResult {
    fn default() -> Self {
        TraceResult {
            fraction: 1.0,
            end_pos: Vector::ZERO,
            plane: None,
            contents: Contents::EMPTY,
            start_solid: false,
            all_solid: false,
        }
    }
}

pub(crate) fn trace_ray(
    tables: &Tables,
    origin: Vector,
    dest: Vector,
    mask: Contents,
    out: &mut TraceResult,
) {
    *out = TraceResult::default();

    if tables.nodes.is_empty() {
        out.end_pos = dest;
        return;
    }

    ray_cast_node(tables, 0, 0.0, 1.0, origin, dest, mask, out);

    out.end_pos = if out.fraction >= 1.0 {
        dest
    } else {
        origin.lerp(dest, out.fraction.clamp(0.0, 1.0))
    };
}

fn ray_cast_node(
    tables: &Tables,
    node_index: i32,
    start_frac: f32,
    end_frac: f32,
    origin: Vector,
    dest: Vector,
    mask: Contents,
    out: &mut TraceResult,
) {
    // No reachable hit in this subtree can beat a fraction already found
    // closer to the origin than where this interval begins.
    if out.fraction <= start_frac {
        return;
    }

    let node_idx = match decode_child(node_index) {
        Err(leaf_index) => {
            ray_cast_leaf(tables, leaf_index, origin, dest, mask, out);
            return;
        }
        Ok(node_idx) => node_idx,
    };

    let node = &tables.nodes[node_idx];
    let plane = &tables.planes[node.plane_index as usize];
    let t1 = plane.distance_to(origin);
    let t2 = plane.distance_to(dest);

    if t1 >= 0.0 && t2 >= 0.0 {
        ray_cast_node(
            tables,
            node.children[0],
            start_frac,
            end_frac,
            origin,
            dest,
            mask,
            out,
        );
        return;
    }
    if t1 < 0.0 && t2 < 0.0 {
        ray_cast_node(
            tables,
            node.children[1],
            start_frac,
            end_frac,
            origin,
            dest,
            mask,
            out,
        );
        return;
    }

    if (t1 - t2).abs() < DIST_EPSILON {
        // Segment runs (near-)parallel to the plane: classify by which side
        // it's mostly on rather than recursing into both, which would
        // otherwise split on a near-zero denominator below.
        let side = if t1 + t2 >= 0.0 { 0 } else { 1 };
        ray_cast_node(
            tables,
            node.children[side],
            start_frac,
            end_frac,
            origin,
            dest,
            mask,
            out,
        );
        return;
    }

    let near_side = if t1 < 0.0 { 1 } else { 0 };
    let far_side = 1 - near_side;
    let inv_delta = 1.0 / (t1 - t2);
    let frac1 = ((t1 + DIST_EPSILON) * inv_delta).clamp(0.0, 1.0);
    let frac2 = ((t1 - DIST_EPSILON) * inv_delta).clamp(0.0, 1.0);
    let mid1 = start_frac + (end_frac - start_frac) * frac1;
    let mid2 = start_frac + (end_frac - start_frac) * frac2;

    ray_cast_node(
        tables,
        node.children[near_side],
        start_frac,
        mid1,
        origin,
        dest,
        mask,
        out,
    );
    ray_cast_node(
        tables,
        node.children[far_side],
        mid2,
        end_frac,
        origin,
        dest,
        mask,
        out,
    );
}

fn ray_cast_leaf(
    tables: &Tables,
    leaf_index: usize,
    origin: Vector,
    dest: Vector,
    mask: Contents,
    out: &mut TraceResult,
) {
    let Some(leaf) = tables.leaves.get(leaf_index) else {
        return;
    };

    let face_start = leaf.first_leaf_face as usize;
    let face_end = face_start + leaf.num_leaf_faces as usize;
    for &face_index in tables.leaf_faces[face_start..face_end].iter() {
        ray_cast_surface(tables, face_index as usize, origin, dest, out);
    }

    let brush_start = leaf.first_leaf_brush as usize;
    let brush_end = brush_start + leaf.num_leaf_brushes as usize;
    for &brush_index in tables.leaf_brushes[brush_start..brush_end].iter() {
        ray_cast_brush(tables, brush_index as usize, origin, dest, mask, out);
    }
}

fn ray_cast_surface(
    tables: &Tables,
    face_index: usize,
    origin: Vector,
    dest: Vector,
    out: &mut TraceResult,
) {
    let Some(Some(polygon_index)) = tables.face_to_polygon.get(face_index) else {
        return;
    };
    let polygon = &tables.polygons[*polygon_index];
    if polygon.is_degenerate() || polygon.skip_test {
        return;
    }

    let t1 = polygon.plane.distance_to(origin);
    let t2 = polygon.plane.distance_to(dest);
    if (t1 >= 0.0) == (t2 >= 0.0) {
        return;
    }
    if (t1 - t2).abs() < f32::EPSILON {
        return;
    }

    let frac = (t1 / (t1 - t2)).clamp(0.0, 1.0);
    if frac >= out.fraction {
        return;
    }

    let hit_point = origin.lerp(dest, frac);
    if !point_in_polygon(polygon, hit_point) {
        return;
    }

    out.fraction = frac;
    out.plane = Some(polygon.plane);
}

fn point_in_polygon(polygon: &crate::data::Polygon, point: Vector) -> bool {
    use itertools::Itertools;

    let normal = polygon.plane.normal;
    polygon
        .vertices
        .iter()
        .copied()
        .circular_tuple_windows()
        .all(|(a, b)| normal.dot((b - a).cross(point - a)) >= 0.0)
}

fn ray_cast_brush(
    tables: &Tables,
    brush_index: usize,
    origin: Vector,
    dest: Vector,
    mask: Contents,
    out: &mut TraceResult,
) {
    let Some(brush) = tables.brushes.get(brush_index) else {
        return;
    };
    if !brush.contents.intersects(mask) {
        return;
    }

    let side_start = brush.first_side as usize;
    let side_end = side_start + brush.num_sides as usize;
    let sides = &tables.brush_sides[side_start..side_end];

    let mut enter_frac = -1.0f32;
    let mut leave_frac = 1.0f32;
    let mut enter_plane: Option<Plane> = None;
    let mut start_inside = true;
    let mut end_inside = true;

    for side in sides {
        let plane = &tables.planes[side.plane_index as usize];
        let d1 = plane.distance_to(origin);
        let d2 = plane.distance_to(dest);

        if d1 > 0.0 {
            start_inside = false;
        }
        if d2 > 0.0 {
            end_inside = false;
        }

        if d1 > 0.0 && d2 > 0.0 {
            // Entirely in front of this side: segment misses the brush.
            return;
        }
        if d1 <= 0.0 && d2 <= 0.0 {
            continue;
        }

        let frac = (d1 / (d1 - d2)).clamp(0.0, 1.0);
        if d1 > d2 {
            if frac > enter_frac {
                enter_frac = frac;
                enter_plane = Some(*plane);
            }
        } else if frac < leave_frac {
            leave_frac = frac;
        }
    }

    if start_inside && end_inside {
        out.all_solid = true;
        out.start_solid = true;
        out.contents = brush.contents;
        return;
    }

    if enter_frac < 0.0 && leave_frac > 0.0 {
        out.start_solid = true;
    }

    // `<=`, not `<`: a brush side coplanar with an already-hit surface (the
    // common case for solid world geometry, where the visible face and its
    // backing brush share a plane) ties the surface hit's fraction exactly
    // and must still report the brush's contents.
    if enter_frac <= leave_frac && (0.0..=1.0).contains(&enter_frac) && enter_frac <= out.fraction {
        out.fraction = enter_frac;
        out.plane = enter_plane.or(out.plane);
        out.contents = brush.contents;
    }
}
