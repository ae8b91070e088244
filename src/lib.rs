//! Loader and ray-caster for Valve Source-engine BSP maps.
//!
//! Decodes the lump-indexed on-disk container (including transparent
//! decompression of LZMA-framed lumps) into typed in-memory tables, then
//! answers segment-vs-world-geometry queries by descending the compiled
//! BSP tree. Entity/PAK/game-lump payload interpretation, displacements,
//! visibility, lighting, and rendering are all out of scope: this crate
//! only loads enough to answer "is the line from A to B blocked, and if so
//! by what, where, and facing which way".

mod bspfile;
pub mod data;
mod error;
mod lzma;
mod map;
mod trace;

pub use bspfile::{BspFile, Header, LumpEntry, LumpType};
pub use data::Vector;
pub use error::{BspError, BspResult, ValidationError};
pub use map::BspMap;
pub use trace::TraceResult;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Contents, SurfFlags};

    /// Builds a minimal, valid VBSP byte buffer in memory so tests never
    /// depend on a real `.bsp` fixture file.
    struct MapBuilder {
        lumps: [Vec<u8>; 64],
    }

    impl MapBuilder {
        fn new() -> Self {
            MapBuilder {
                lumps: std::array::from_fn(|_| Vec::new()),
            }
        }

        fn set(&mut self, lump: LumpType, bytes: Vec<u8>) -> &mut Self {
            self.lumps[lump as usize] = bytes;
            self
        }

        fn build(&self) -> Vec<u8> {
            let mut out = Vec::new();
            out.extend_from_slice(b"VBSP");
            out.extend_from_slice(&20i32.to_le_bytes());

            let mut offset = 4 + 4 + 64 * 16 + 4;
            let mut directory = Vec::with_capacity(64 * 16);
            let mut payload = Vec::new();
            for lump in &self.lumps {
                directory.extend_from_slice(&(offset as i32).to_le_bytes());
                directory.extend_from_slice(&(lump.len() as i32).to_le_bytes());
                directory.extend_from_slice(&0i32.to_le_bytes());
                directory.extend_from_slice(&[0u8; 4]);
                offset += lump.len();
                payload.extend_from_slice(lump);
            }

            out.extend_from_slice(&directory);
            out.extend_from_slice(&0i32.to_le_bytes());
            out.extend_from_slice(&payload);
            out
        }
    }

    fn vec3(x: f32, y: f32, z: f32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&x.to_le_bytes());
        out.extend_from_slice(&y.to_le_bytes());
        out.extend_from_slice(&z.to_le_bytes());
        out
    }

    /// One plane (x = 50, facing -x), one node splitting on it, two leaves
    /// (empty front, solid back), a quad face sitting on the plane and a
    /// single-sided brush backing it with that same plane — an unbounded
    /// solid half-space behind the wall, sufficient for segment tests that
    /// never reach its other sides.
    fn build_single_wall_map() -> Vec<u8> {
        let mut b = MapBuilder::new();

        let mut entities = b"{\"classname\" \"worldspawn\"}\0".to_vec();
        entities.push(0);
        b.set(LumpType::Entities, entities);

        // vertices: quad in the x=50 plane, spanning y/z -100..100
        let mut vertices = Vec::new();
        vertices.extend(vec3(50.0, -100.0, -100.0));
        vertices.extend(vec3(50.0, 100.0, -100.0));
        vertices.extend(vec3(50.0, 100.0, 100.0));
        vertices.extend(vec3(50.0, -100.0, 100.0));
        b.set(LumpType::Vertices, vertices);

        // edges: (0,1) (1,2) (2,3) (3,0)
        let mut edges = Vec::new();
        for &(a, c) in &[(0u16, 1u16), (1, 2), (2, 3), (3, 0)] {
            edges.extend_from_slice(&a.to_le_bytes());
            edges.extend_from_slice(&c.to_le_bytes());
        }
        b.set(LumpType::Edges, edges);

        let mut surf_edges = Vec::new();
        for i in 0..4i32 {
            surf_edges.extend_from_slice(&i.to_le_bytes());
        }
        b.set(LumpType::SurfaceEdges, surf_edges);

        // plane 0: normal (-1,0,0), distance -50 (front = x<50, i.e. normal
        // points towards the origin side)
        let mut planes = Vec::new();
        planes.extend(vec3(-1.0, 0.0, 0.0));
        planes.extend_from_slice(&(-50.0f32).to_le_bytes());
        planes.extend_from_slice(&0i32.to_le_bytes());
        b.set(LumpType::Planes, planes);

        // texinfo 0: no special flags
        let mut texinfo = Vec::new();
        texinfo.extend(std::iter::repeat(0u8).take(4 * 4 * 4 * 2));
        texinfo.extend_from_slice(&SurfFlags::empty().bits().to_le_bytes());
        texinfo.extend_from_slice(&0i32.to_le_bytes());
        b.set(LumpType::TextureInfo, texinfo);

        // face 0: plane 0, edges 0..4, texinfo 0, not a displacement
        let mut faces = Vec::new();
        faces.extend_from_slice(&0u16.to_le_bytes()); // plane_index
        faces.push(0); // side
        faces.push(0); // on_node
        faces.extend_from_slice(&0i32.to_le_bytes()); // first_edge
        faces.extend_from_slice(&4i16.to_le_bytes()); // num_edges
        faces.extend_from_slice(&0i16.to_le_bytes()); // tex_info
        faces.extend_from_slice(&(-1i16).to_le_bytes()); // disp_info
        faces.extend_from_slice(&0i16.to_le_bytes()); // surface_fog_volume_id
        faces.extend_from_slice(&[0u8; 4]); // styles
        faces.extend_from_slice(&0i32.to_le_bytes()); // light_offset
        faces.extend_from_slice(&0f32.to_le_bytes()); // area
        faces.extend_from_slice(&[0u8; 8]); // lightmap mins
        faces.extend_from_slice(&[0u8; 8]); // lightmap size
        faces.extend_from_slice(&0i32.to_le_bytes()); // orig_face
        faces.extend_from_slice(&0u16.to_le_bytes()); // num_prims
        faces.extend_from_slice(&0u16.to_le_bytes()); // first_prim_id
        faces.extend_from_slice(&0u32.to_le_bytes()); // smoothing_groups
        b.set(LumpType::Faces, faces);

        // node 0: plane 0, front child = leaf 0 (empty), back child = leaf 1 (solid)
        let mut nodes = Vec::new();
        nodes.extend_from_slice(&0i32.to_le_bytes()); // plane_index
        nodes.extend_from_slice(&(-1i32).to_le_bytes()); // children[0] -> leaf 0
        nodes.extend_from_slice(&(-2i32).to_le_bytes()); // children[1] -> leaf 1
        nodes.extend_from_slice(&[0u8; 12]); // mins/maxs
        nodes.extend_from_slice(&0u16.to_le_bytes()); // first_face
        nodes.extend_from_slice(&1u16.to_le_bytes()); // num_faces
        nodes.extend_from_slice(&0i16.to_le_bytes()); // area
        nodes.extend_from_slice(&0i16.to_le_bytes()); // pad
        b.set(LumpType::Nodes, nodes);

        // leaf 0: empty, sees the face, no brushes
        let mut leaves = Vec::new();
        leaves.extend_from_slice(&(Contents::EMPTY.bits()).to_le_bytes());
        leaves.extend_from_slice(&0i16.to_le_bytes()); // cluster
        leaves.extend_from_slice(&0i16.to_le_bytes()); // area_flags
        leaves.extend_from_slice(&[0u8; 12]); // mins/maxs
        leaves.extend_from_slice(&0u16.to_le_bytes()); // first_leaf_face
        leaves.extend_from_slice(&1u16.to_le_bytes()); // num_leaf_faces
        leaves.extend_from_slice(&0u16.to_le_bytes()); // first_leaf_brush
        leaves.extend_from_slice(&0u16.to_le_bytes()); // num_leaf_brushes
        leaves.extend_from_slice(&0i16.to_le_bytes()); // water_data_id
        leaves.extend_from_slice(&[0u8; 2]); // pad

        // leaf 1: solid, one brush
        leaves.extend_from_slice(&(Contents::SOLID.bits()).to_le_bytes());
        leaves.extend_from_slice(&0i16.to_le_bytes());
        leaves.extend_from_slice(&0i16.to_le_bytes());
        leaves.extend_from_slice(&[0u8; 12]);
        leaves.extend_from_slice(&0u16.to_le_bytes()); // first_leaf_face
        leaves.extend_from_slice(&0u16.to_le_bytes()); // num_leaf_faces
        leaves.extend_from_slice(&0u16.to_le_bytes()); // first_leaf_brush
        leaves.extend_from_slice(&1u16.to_le_bytes()); // num_leaf_brushes
        leaves.extend_from_slice(&0i16.to_le_bytes());
        leaves.extend_from_slice(&[0u8; 2]); // pad
        b.set(LumpType::Leaves, leaves);

        let mut leaf_faces = Vec::new();
        leaf_faces.extend_from_slice(&0u16.to_le_bytes());
        b.set(LumpType::LeafFaces, leaf_faces);

        let mut leaf_brushes = Vec::new();
        leaf_brushes.extend_from_slice(&0u16.to_le_bytes());
        b.set(LumpType::LeafBrushes, leaf_brushes);

        let mut brushes = Vec::new();
        brushes.extend_from_slice(&0i32.to_le_bytes()); // first_side
        brushes.extend_from_slice(&1i32.to_le_bytes()); // num_sides
        brushes.extend_from_slice(&(Contents::SOLID.bits()).to_le_bytes());
        b.set(LumpType::Brushes, brushes);

        let mut brush_sides = Vec::new();
        brush_sides.extend_from_slice(&0u16.to_le_bytes()); // plane_index
        brush_sides.extend_from_slice(&(-1i16).to_le_bytes()); // tex_info
        brush_sides.extend_from_slice(&(-1i16).to_le_bytes()); // disp_info
        brush_sides.push(0); // bevel
        brush_sides.push(0); // pad
        b.set(LumpType::BrushSides, brush_sides);

        b.build()
    }

    #[test]
    fn bad_ident_is_rejected() {
        let mut data = build_single_wall_map();
        data[0] = b'X';
        let err = BspFile::new(&data).unwrap_err();
        assert!(matches!(err, BspError::BadIdent(_)));
    }

    #[test]
    fn header_round_trips_lump_directory() {
        let data = build_single_wall_map();
        let file = BspFile::new(&data).unwrap();
        assert_eq!(file.header().ident, *b"VBSP");
    }

    #[test]
    fn lzma_frame_with_bad_ident_is_rejected() {
        let err = crate::lzma::lzma_decompress_with_header(b"NOTLZMA\0\0\0\0\0\0\0\0\0\0", None)
            .unwrap_err();
        assert!(matches!(err, BspError::LzmaHeader));
    }

    #[test]
    fn lzma_frame_with_truncated_payload_is_rejected() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"LZMA");
        raw.extend_from_slice(&100u32.to_le_bytes()); // actual_size
        raw.extend_from_slice(&50u32.to_le_bytes()); // lzma_size, but no payload follows
        raw.extend_from_slice(&[0u8; 5]); // properties
        let err = crate::lzma::lzma_decompress_with_header(&raw, None).unwrap_err();
        assert!(matches!(err, BspError::LzmaHeader));
    }

    #[test]
    fn polygon_vertex_count_matches_face_edge_count() {
        use crate::data::{build_polygon, Edge, Face, Plane, SurfFlags, TexInfo, Vector};

        let planes = vec![Plane {
            normal: Vector::new(-1.0, 0.0, 0.0),
            distance: -50.0,
            plane_type: 0,
            sign_bits: 1,
        }];
        let edges = vec![
            Edge { v0: 0, v1: 1 },
            Edge { v0: 1, v1: 2 },
            Edge { v0: 2, v1: 3 },
            Edge { v0: 3, v1: 0 },
        ];
        let surf_edges = vec![0i32, 1, 2, 3];
        let vertices = vec![
            Vector::new(50.0, -100.0, -100.0),
            Vector::new(50.0, 100.0, -100.0),
            Vector::new(50.0, 100.0, 100.0),
            Vector::new(50.0, -100.0, 100.0),
        ];
        let tex_infos = vec![TexInfo {
            texture_vecs: [[0.0; 4]; 2],
            lightmap_vecs: [[0.0; 4]; 2],
            flags: SurfFlags::empty(),
            tex_data: 0,
        }];
        let face = Face {
            plane_index: 0,
            side: 0,
            on_node: 0,
            first_edge: 0,
            num_edges: 4,
            tex_info: 0,
            disp_info: -1,
            surface_fog_volume_id: 0,
            styles: [0; 4],
            light_offset: 0,
            area: 0.0,
            lightmap_texture_mins_in_luxels: [0, 0],
            lightmap_texture_size_in_luxels: [0, 0],
            orig_face: 0,
            num_prims: 0,
            first_prim_id: 0,
            smoothing_groups: 0,
        };

        let polygon =
            build_polygon(&face, &planes, &edges, &surf_edges, &vertices, &tex_infos).unwrap();
        assert_eq!(polygon.vertices.len(), face.num_edges as usize);
        assert!(!polygon.skip_test);
    }

    #[test]
    fn nodraw_texinfo_marks_the_polygon_skip_test() {
        use crate::data::{build_polygon, Edge, Face, Plane, SurfFlags, TexInfo, Vector};

        let planes = vec![Plane {
            normal: Vector::new(-1.0, 0.0, 0.0),
            distance: -50.0,
            plane_type: 0,
            sign_bits: 1,
        }];
        let edges = vec![
            Edge { v0: 0, v1: 1 },
            Edge { v0: 1, v1: 2 },
            Edge { v0: 2, v1: 3 },
        ];
        let surf_edges = vec![0i32, 1, 2];
        let vertices = vec![
            Vector::new(50.0, 0.0, 0.0),
            Vector::new(50.0, 1.0, 0.0),
            Vector::new(50.0, 0.0, 1.0),
        ];
        let tex_infos = vec![TexInfo {
            texture_vecs: [[0.0; 4]; 2],
            lightmap_vecs: [[0.0; 4]; 2],
            flags: SurfFlags::NODRAW,
            tex_data: 0,
        }];
        let face = Face {
            plane_index: 0,
            side: 0,
            on_node: 0,
            first_edge: 0,
            num_edges: 3,
            tex_info: 0,
            disp_info: -1,
            surface_fog_volume_id: 0,
            styles: [0; 4],
            light_offset: 0,
            area: 0.0,
            lightmap_texture_mins_in_luxels: [0, 0],
            lightmap_texture_size_in_luxels: [0, 0],
            orig_face: 0,
            num_prims: 0,
            first_prim_id: 0,
            smoothing_groups: 0,
        };

        let polygon =
            build_polygon(&face, &planes, &edges, &surf_edges, &vertices, &tex_infos).unwrap();
        assert!(polygon.skip_test);
    }

    mod facade {
        use super::*;
        use std::io::Write;

        fn write_temp_map() -> (tempfile::TempDir, String) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("test.bsp");
            let mut f = std::fs::File::create(&path).unwrap();
            f.write_all(&build_single_wall_map()).unwrap();
            (dir, "test".to_string())
        }

        #[test]
        fn open_sky_is_unobstructed() {
            let (dir, name) = write_temp_map();
            let map = BspMap::new();
            assert!(map.load_map(dir.path().to_str().unwrap(), &name));

            let mut out = TraceResult::default();
            map.trace_ray(Vector::new(0.0, 0.0, 0.0), Vector::new(40.0, 0.0, 0.0), &mut out);
            assert_eq!(out.fraction, 1.0);
        }

        #[test]
        fn wall_at_x_50_blocks_the_trace() {
            let (dir, name) = write_temp_map();
            let map = BspMap::new();
            assert!(map.load_map(dir.path().to_str().unwrap(), &name));

            let mut out = TraceResult::default();
            map.trace_ray(Vector::new(0.0, 0.0, 0.0), Vector::new(100.0, 0.0, 0.0), &mut out);
            assert!((out.fraction - 0.5).abs() < 1e-3);
            assert!(!map.is_visible(Vector::new(0.0, 0.0, 0.0), Vector::new(100.0, 0.0, 0.0)));

            let plane = out.plane.expect("trace should report the hit plane");
            assert!((plane.normal.x - (-1.0)).abs() < 1e-3);
            assert!(plane.normal.y.abs() < 1e-3);
            assert!(plane.normal.z.abs() < 1e-3);
            assert!(out.contents.intersects(Contents::SOLID));
        }

        #[test]
        fn bad_ident_leaves_prior_map_loaded() {
            let (dir, name) = write_temp_map();
            let map = BspMap::new();
            assert!(map.load_map(dir.path().to_str().unwrap(), &name));

            assert!(!map.load_map(dir.path().to_str().unwrap(), "does-not-exist"));
            assert_eq!(map.map_name().as_deref(), Some(name.as_str()));
        }

        #[test]
        fn degenerate_segment_is_unobstructed() {
            let (dir, name) = write_temp_map();
            let map = BspMap::new();
            assert!(map.load_map(dir.path().to_str().unwrap(), &name));

            let mut out = TraceResult::default();
            let p = Vector::new(0.0, 0.0, 0.0);
            map.trace_ray(p, p, &mut out);
            assert_eq!(out.fraction, 1.0);
        }

        #[test]
        fn trace_is_symmetric_across_the_wall() {
            let (dir, name) = write_temp_map();
            let map = BspMap::new();
            assert!(map.load_map(dir.path().to_str().unwrap(), &name));

            let a = Vector::new(0.0, 0.0, 0.0);
            let b = Vector::new(100.0, 0.0, 0.0);

            let mut forward = TraceResult::default();
            map.trace_ray(a, b, &mut forward);
            let mut backward = TraceResult::default();
            map.trace_ray(b, a, &mut backward);

            assert!(forward.fraction < 1.0);
            assert!(backward.fraction < 1.0);
            assert!((forward.fraction - (1.0 - backward.fraction)).abs() < 1e-3);
        }

        #[test]
        fn is_visible_agrees_with_trace_ray_fraction() {
            let (dir, name) = write_temp_map();
            let map = BspMap::new();
            assert!(map.load_map(dir.path().to_str().unwrap(), &name));

            let clear = (Vector::new(0.0, 0.0, 0.0), Vector::new(40.0, 0.0, 0.0));
            let blocked = (Vector::new(0.0, 0.0, 0.0), Vector::new(100.0, 0.0, 0.0));

            let mut out = TraceResult::default();
            map.trace_ray(clear.0, clear.1, &mut out);
            assert_eq!(out.fraction >= 1.0, map.is_visible(clear.0, clear.1));

            let mut out = TraceResult::default();
            map.trace_ray(blocked.0, blocked.1, &mut out);
            assert_eq!(out.fraction >= 1.0, map.is_visible(blocked.0, blocked.1));
        }

        #[test]
        fn tracing_from_inside_the_solid_brush_reports_start_solid() {
            let (dir, name) = write_temp_map();
            let map = BspMap::new();
            assert!(map.load_map(dir.path().to_str().unwrap(), &name));

            let mut out = TraceResult::default();
            map.trace_ray(
                Vector::new(100.0, 0.0, 0.0),
                Vector::new(200.0, 0.0, 0.0),
                &mut out,
            );
            assert!(out.start_solid);
            assert!(out.all_solid);
        }

        #[test]
        fn raw_entities_exposes_the_unparsed_lump_text() {
            let (dir, name) = write_temp_map();
            let map = BspMap::new();
            assert!(map.load_map(dir.path().to_str().unwrap(), &name));

            let entities = map.raw_entities().unwrap();
            assert!(entities.contains("worldspawn"));
        }

        #[test]
        fn grazing_segment_near_the_plane_terminates() {
            let (dir, name) = write_temp_map();
            let map = BspMap::new();
            assert!(map.load_map(dir.path().to_str().unwrap(), &name));

            // Both endpoints sit within DIST_EPSILON of the splitting plane on
            // opposite sides, exercising the near-parallel branch in
            // ray_cast_node rather than the ordinary split path. The segment
            // still pierces the wall's polygon at the midpoint, so it should
            // come back blocked (and, above all, return promptly rather than
            // recurse forever).
            let mut out = TraceResult::default();
            map.trace_ray(
                Vector::new(49.99, 0.0, 0.0),
                Vector::new(50.01, 0.0, 0.0),
                &mut out,
            );
            assert!((out.fraction - 0.5).abs() < 1e-3);
        }
    }
}
