use crate::bspfile::{BspFile, LumpType};
use crate::data::{
    build_polygon, Brush, BrushSide, Contents, Edge, Face, GameLumpHeader, Leaf, Node, Plane,
    Polygon, RawPlane, TexInfo, Vector,
};
use crate::error::{BspError, BspResult, ValidationError};
use crate::trace::{self, TraceResult};
use binrw::io::Cursor;
use binrw::BinReaderExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

/// The parsed, cross-referenced in-memory tables for one loaded map.
/// Immutable for the life of the map; replaced atomically by the next
/// successful `load_map`.
pub(crate) struct Tables {
    pub map_name: String,
    /// The raw entity lump: a nul-separated soup of `{"key" "value" ...}`
    /// blocks. Key/value parsing is out of scope; callers that need it
    /// parse this string themselves.
    pub entities: String,
    pub vertices: Vec<Vector>,
    pub planes: Vec<Plane>,
    pub edges: Vec<Edge>,
    pub surf_edges: Vec<i32>,
    pub leaves: Vec<Leaf>,
    pub nodes: Vec<Node>,
    pub faces: Vec<Face>,
    pub tex_infos: Vec<TexInfo>,
    pub brushes: Vec<Brush>,
    pub brush_sides: Vec<BrushSide>,
    pub leaf_faces: Vec<u16>,
    pub leaf_brushes: Vec<u16>,
    pub polygons: Vec<Polygon>,
    /// Index from a face's position in `faces` to its entry in `polygons`,
    /// or `None` for displacement faces, which are excluded from both the
    /// polygon table and surface tests.
    pub face_to_polygon: Vec<Option<usize>>,
    /// The game lump directory, parsed and bounds-checked but never
    /// interpreted: sub-lump payloads (static props, detail props, ...)
    /// are an external collaborator's concern.
    pub game_lump: Option<GameLumpHeader>,
}

/// Owns the loaded map tables behind a readers/writer lock. `load_map`
/// takes the lock exclusively; `trace_ray`/`is_visible` take it as a shared
/// reader. Move-only: holds unique ownership of the tables and is never
/// cloned.
#[derive(Debug)]
pub struct BspMap {
    tables: RwLock<Option<Tables>>,
    last_error: Mutex<Option<BspError>>,
}

impl std::fmt::Debug for Tables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tables")
            .field("map_name", &self.map_name)
            .field("vertices", &self.vertices.len())
            .field("planes", &self.planes.len())
            .field("nodes", &self.nodes.len())
            .field("leaves", &self.leaves.len())
            .field("faces", &self.faces.len())
            .field("brushes", &self.brushes.len())
            .finish()
    }
}

impl Default for BspMap {
    fn default() -> Self {
        BspMap {
            tables: RwLock::new(None),
            last_error: Mutex::new(None),
        }
    }
}

impl BspMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `directory`/`map_name[.bsp]`, parse it, and atomically swap
    /// it in as the loaded map. Returns `true` on success; on failure the
    /// previously loaded map (if any) is left untouched and the error is
    /// retained for [`BspMap::last_error`].
    pub fn load_map(&self, directory: &str, map_name: &str) -> bool {
        match load_tables(directory, map_name) {
            Ok(tables) => {
                *self.tables.write().unwrap_or_else(|e| e.into_inner()) = Some(tables);
                *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = None;
                true
            }
            Err(e) => {
                log::warn!("failed to load map {map_name}: {e}");
                *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(e);
                false
            }
        }
    }

    /// The error from the most recent failed `load_map`, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(ToString::to_string)
    }

    /// `true` iff the segment `a -> b` is unobstructed by world geometry
    /// under the default `CONTENTS_SOLID` mask.
    pub fn is_visible(&self, a: Vector, b: Vector) -> bool {
        let mut result = TraceResult::default();
        self.trace_ray(a, b, &mut result);
        result.fraction >= 1.0
    }

    /// Trace the segment `a -> b` against `CONTENTS_SOLID` geometry,
    /// filling in `out` with the first hit (if any).
    pub fn trace_ray(&self, a: Vector, b: Vector, out: &mut TraceResult) {
        self.trace_ray_masked(a, b, Contents::SOLID, out);
    }

    /// As [`BspMap::trace_ray`], but only brushes whose contents intersect
    /// `mask` participate in the brush-clipping half of the test.
    pub fn trace_ray_masked(&self, a: Vector, b: Vector, mask: Contents, out: &mut TraceResult) {
        let guard = self.tables.read().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(tables) => trace::trace_ray(tables, a, b, mask, out),
            None => {
                *out = TraceResult::default();
                out.end_pos = b;
            }
        }
    }

    pub fn map_name(&self) -> Option<String> {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|t| t.map_name.clone())
    }

    /// The raw entity lump text, decompressed if LZMA-framed but otherwise
    /// unparsed. `None` if no map is loaded.
    pub fn raw_entities(&self) -> Option<String> {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|t| t.entities.clone())
    }
}

fn resolve_path(directory: &str, map_name: &str) -> PathBuf {
    let mut path = Path::new(directory).join(map_name);
    if path.extension().is_none() {
        path.set_extension("bsp");
    }
    path
}

fn load_tables(directory: &str, map_name: &str) -> BspResult<Tables> {
    let path = resolve_path(directory, map_name);
    let data = std::fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BspError::NotFound(path.clone())
        } else {
            BspError::Io(e)
        }
    })?;

    let file = BspFile::new(&data)?;

    let entities = String::from_utf8_lossy(&file.raw_lump(LumpType::Entities)?)
        .trim_end_matches('\0')
        .to_string();

    let vertices: Vec<Vector> = file.read_lump(LumpType::Vertices)?;
    let raw_planes: Vec<RawPlane> = file.read_lump(LumpType::Planes)?;
    let planes: Vec<Plane> = raw_planes.into_iter().map(Plane::from).collect();
    let edges: Vec<Edge> = file.read_lump(LumpType::Edges)?;
    let surf_edges: Vec<i32> = file.read_lump(LumpType::SurfaceEdges)?;
    let leaves: Vec<Leaf> = file.read_lump(LumpType::Leaves)?;
    let nodes: Vec<Node> = file.read_lump(LumpType::Nodes)?;
    let faces: Vec<Face> = file.read_lump(LumpType::Faces)?;
    let tex_infos: Vec<TexInfo> = file.read_lump(LumpType::TextureInfo)?;
    let brushes: Vec<Brush> = file.read_lump(LumpType::Brushes)?;
    let brush_sides: Vec<BrushSide> = file.read_lump(LumpType::BrushSides)?;
    let leaf_faces: Vec<u16> = file.read_lump(LumpType::LeafFaces)?;
    let leaf_brushes: Vec<u16> = file.read_lump(LumpType::LeafBrushes)?;

    let game_lump_bytes = file.raw_lump(LumpType::GameLump)?;
    let game_lump = if game_lump_bytes.is_empty() {
        None
    } else {
        let mut cursor = Cursor::new(&game_lump_bytes[..]);
        let header: GameLumpHeader = cursor
            .read_le()
            .map_err(|e| BspError::malformed("game lump directory", e))?;
        Some(header)
    };

    validate(
        &planes,
        &nodes,
        &leaves,
        &faces,
        &brushes,
        &brush_sides,
        &leaf_faces,
        &leaf_brushes,
    )?;

    let mut polygons = Vec::new();
    let mut face_to_polygon = Vec::with_capacity(faces.len());
    for face in &faces {
        if face.is_displacement() {
            face_to_polygon.push(None);
            continue;
        }
        let polygon = build_polygon(face, &planes, &edges, &surf_edges, &vertices, &tex_infos)?;
        face_to_polygon.push(Some(polygons.len()));
        polygons.push(polygon);
    }

    log::debug!(
        "loaded {}: {} planes, {} nodes, {} leaves, {} faces ({} polygons), {} brushes",
        map_name,
        planes.len(),
        nodes.len(),
        leaves.len(),
        faces.len(),
        polygons.len(),
        brushes.len(),
    );

    Ok(Tables {
        map_name: map_name.to_string(),
        entities,
        vertices,
        planes,
        edges,
        surf_edges,
        leaves,
        nodes,
        faces,
        tex_infos,
        brushes,
        brush_sides,
        leaf_faces,
        leaf_brushes,
        polygons,
        face_to_polygon,
        game_lump,
    })
}

#[allow(clippy::too_many_arguments)]
fn validate(
    planes: &[Plane],
    nodes: &[Node],
    leaves: &[Leaf],
    faces: &[Face],
    brushes: &[Brush],
    brush_sides: &[BrushSide],
    leaf_faces: &[u16],
    leaf_brushes: &[u16],
) -> BspResult<()> {
    if nodes.is_empty() {
        return Err(ValidationError::NoRootNode.into());
    }

    let plane_ref = |source_: &'static str, index: i64| -> BspResult<()> {
        if index < 0 || index as usize >= planes.len() {
            return Err(ValidationError::ReferenceOutOfRange {
                source_,
                target: "planes",
                index,
                size: planes.len(),
            }
            .into());
        }
        Ok(())
    };

    for node in nodes {
        plane_ref("node", node.plane_index as i64)?;
        for &child in &node.children {
            match crate::data::decode_child(child) {
                Ok(node_index) if node_index >= nodes.len() => {
                    return Err(ValidationError::ReferenceOutOfRange {
                        source_: "node child",
                        target: "nodes",
                        index: node_index as i64,
                        size: nodes.len(),
                    }
                    .into())
                }
                Err(leaf_index) if leaf_index >= leaves.len() => {
                    return Err(ValidationError::ReferenceOutOfRange {
                        source_: "node child",
                        target: "leaves",
                        index: leaf_index as i64,
                        size: leaves.len(),
                    }
                    .into())
                }
                _ => {}
            }
        }
    }

    for face in faces {
        plane_ref("face", face.plane_index as i64)?;
    }

    for side in brush_sides {
        plane_ref("brush side", side.plane_index as i64)?;
    }

    for brush in brushes {
        let end = brush.first_side as usize + brush.num_sides.max(0) as usize;
        if end > brush_sides.len() {
            return Err(ValidationError::ReferenceOutOfRange {
                source_: "brush",
                target: "brush_sides",
                index: end as i64,
                size: brush_sides.len(),
            }
            .into());
        }
    }

    for leaf in leaves {
        let face_end = leaf.first_leaf_face as usize + leaf.num_leaf_faces as usize;
        if face_end > leaf_faces.len() {
            return Err(ValidationError::ReferenceOutOfRange {
                source_: "leaf",
                target: "leaf_faces",
                index: face_end as i64,
                size: leaf_faces.len(),
            }
            .into());
        }
        let brush_end = leaf.first_leaf_brush as usize + leaf.num_leaf_brushes as usize;
        if brush_end > leaf_brushes.len() {
            return Err(ValidationError::ReferenceOutOfRange {
                source_: "leaf",
                target: "leaf_brushes",
                index: brush_end as i64,
                size: leaf_brushes.len(),
            }
            .into());
        }
    }

    for &face_index in leaf_faces {
        if face_index as usize >= faces.len() {
            return Err(ValidationError::ReferenceOutOfRange {
                source_: "leaf_face",
                target: "faces",
                index: face_index as i64,
                size: faces.len(),
            }
            .into());
        }
    }

    for &brush_index in leaf_brushes {
        if brush_index as usize >= brushes.len() {
            return Err(ValidationError::ReferenceOutOfRange {
                source_: "leaf_brush",
                target: "brushes",
                index: brush_index as i64,
                size: brushes.len(),
            }
            .into());
        }
    }

    Ok(())
}
