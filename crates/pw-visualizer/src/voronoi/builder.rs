use std::cell::RefCell;
use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, PI};
use std::rc::Rc;
use std::time::Instant;

use pw_engine::render::{IndexBuffer, Renderable, Shader, Uniforms, VertexArray, VertexBuffer, VertexLayout};

use super::tessellate::{tessellate, Cell, Edge};
use crate::util::{BBox, Point, PointKey};

/// Floats per vertex: position, site center, site id, own flag.
pub const VORONOI_STRIDE: usize = 6;

/// Edges shorter than this share of the cell's mean edge length collapse.
const MERGE_RATIO: f64 = 0.03;

/// Interleaved vertex data and triangle list for all cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoronoiMesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    /// Triangles emitted per site, in site order.
    pub cell_triangles: Vec<usize>,
}

impl VoronoiMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VORONOI_STRIDE
    }
}

/// Tessellates `sites` inside `bbox` and turns every cell into a rounded fan.
///
/// Each surviving edge contributes two triangles around the site center:
/// (center, start, mid) and (center, mid, end). Cells left with fewer than
/// two edges after merging emit nothing.
pub fn build_mesh(sites: &[Point], bbox: &BBox) -> VoronoiMesh {
    let mut mesh = VoronoiMesh::default();

    for cell in tessellate(sites, bbox) {
        let before = mesh.indices.len();
        emit_cell(&cell, &mut mesh);
        mesh.cell_triangles.push((mesh.indices.len() - before) / 3);
    }

    mesh
}

fn emit_cell(cell: &Cell, mesh: &mut VoronoiMesh) {
    let edges = merge_edges(&cell.edges);
    if edges.len() < 2 {
        return;
    }

    // Mean radius over the edges as tessellated, before merging.
    let site = cell.site;
    let mean = cell
        .edges
        .iter()
        .map(|e| site.dist(e.start) + site.dist(e.midpoint()))
        .sum::<f64>()
        / cell.edges.len() as f64
        / 2.0;
    if !(mean > 0.0) {
        return;
    }

    let id = cell.site_index as f32;
    let center = push_vertex(mesh, site, site, id, 1.0);

    for edge in &edges {
        let s = push_vertex(mesh, round_point(site, edge.start, mean), site, id, 0.0);
        let m = push_vertex(mesh, round_point(site, edge.midpoint(), mean), site, id, 0.0);
        let e = push_vertex(mesh, round_point(site, edge.end, mean), site, id, 0.0);
        mesh.indices.extend_from_slice(&[center, s, m, center, m, e]);
    }
}

fn push_vertex(mesh: &mut VoronoiMesh, pos: Point, site: Point, id: f32, own: f32) -> u32 {
    let index = mesh.vertex_count() as u32;
    mesh.vertices.extend_from_slice(&[
        pos.x as f32,
        pos.y as f32,
        site.x as f32,
        site.y as f32,
        id,
        own,
    ]);
    index
}

/// Applies the merge map and drops edges that collapsed to a point.
pub(crate) fn merge_edges(edges: &[Edge]) -> Vec<Edge> {
    let map = merge_map(edges);
    let resolve = |p: Point| map.get(&p.key()).copied().unwrap_or(p);

    edges
        .iter()
        .map(|e| Edge { start: resolve(e.start), end: resolve(e.end) })
        .filter(|e| e.start.key() != e.end.key())
        .collect()
}

/// Maps endpoints of short edges to a shared coordinate.
///
/// Short edges are grouped transitively, so a chain of tiny edges collapses
/// onto one point (the centroid of the group); an isolated short edge maps
/// both endpoints to its midpoint. Points outside any group are absent.
pub(crate) fn merge_map(edges: &[Edge]) -> HashMap<PointKey, Point> {
    let mut out = HashMap::new();
    if edges.is_empty() {
        return out;
    }

    let mean_len = edges.iter().map(Edge::len).sum::<f64>() / edges.len() as f64;
    let threshold = MERGE_RATIO * mean_len;

    let mut slots: HashMap<PointKey, usize> = HashMap::new();
    let mut points: Vec<Point> = Vec::new();
    let mut intern = |p: Point| {
        *slots.entry(p.key()).or_insert_with(|| {
            points.push(p);
            points.len() - 1
        })
    };
    let pairs: Vec<(usize, usize, bool)> = edges
        .iter()
        .map(|e| (intern(e.start), intern(e.end), e.len() < threshold))
        .collect();

    let mut parent: Vec<usize> = (0..points.len()).collect();
    for &(a, b, short) in &pairs {
        if short {
            let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
            if ra != rb {
                parent[rb] = ra;
            }
        }
    }

    let mut groups: HashMap<usize, (f64, f64, usize)> = HashMap::new();
    for (i, p) in points.iter().enumerate() {
        let root = find(&mut parent, i);
        let g = groups.entry(root).or_insert((0.0, 0.0, 0));
        g.0 += p.x;
        g.1 += p.y;
        g.2 += 1;
    }

    for (i, p) in points.iter().enumerate() {
        let root = find(&mut parent, i);
        if let Some(&(sx, sy, n)) = groups.get(&root) {
            if n > 1 {
                out.insert(p.key(), Point::new(sx / n as f64, sy / n as f64));
            }
        }
    }

    out
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Share of the way from the site to a point at distance `d` that survives
/// rounding. Near points stay put; far corners are pulled in toward 0.6.
pub(crate) fn blend(d: f64, mean: f64) -> f64 {
    let arccot = FRAC_PI_2 - ((d - mean) / mean).atan();
    (arccot / PI + 0.6).min(1.0)
}

pub(crate) fn round_point(site: Point, p: Point, mean: f64) -> Point {
    site.lerp(p, blend(site.dist(p), mean))
}

/// Owns the background renderable and rebuilds its mesh on demand.
pub struct VoronoiBuilder {
    sites: Vec<Point>,
    bbox: BBox,
    renderable: Rc<RefCell<Renderable>>,
}

impl VoronoiBuilder {
    /// Builds the initial mesh for `sites` inside `bbox`.
    pub fn new(shader: Rc<Shader>, sites: Vec<Point>, bbox: BBox) -> Self {
        let mut layout = VertexLayout::new();
        layout
            .push_float(2, "a_pos")
            .push_float(2, "a_center")
            .push_float(1, "a_site")
            .push_float(1, "a_own");

        let mut va = VertexArray::new();
        va.add_buffer(VertexBuffer::vertex(Vec::new()), layout);

        let renderable = Renderable::new(IndexBuffer::index(Vec::new()), va, shader, Vec::new(), Uniforms::new());

        let mut builder = Self {
            sites,
            bbox,
            renderable: Rc::new(RefCell::new(renderable)),
        };
        builder.recompute(bbox);
        builder
    }

    /// Recomputes the mesh for a new clip rectangle.
    pub fn recompute(&mut self, bbox: BBox) {
        self.bbox = bbox;

        let started = Instant::now();
        let mesh = build_mesh(&self.sites, &bbox);
        log::debug!(
            "voronoi: {} sites, {} triangles in {:.2?}",
            self.sites.len(),
            mesh.indices.len() / 3,
            started.elapsed()
        );

        let mut r = self.renderable.borrow_mut();
        r.update_vertex_buffer(0, mesh.vertices);
        r.update_index_buffer(mesh.indices);
    }

    /// Replaces the sites and recomputes with the current rectangle.
    pub fn set_sites(&mut self, sites: Vec<Point>) {
        self.sites = sites;
        self.recompute(self.bbox);
    }

    pub fn sites(&self) -> &[Point] {
        &self.sites
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn renderable(&self) -> Rc<RefCell<Renderable>> {
        Rc::clone(&self.renderable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BBox {
        BBox { left: -10.0, right: 10.0, top: -10.0, bottom: 10.0 }
    }

    fn sites() -> Vec<Point> {
        vec![
            Point::new(-5.0, -4.0),
            Point::new(6.0, -3.0),
            Point::new(0.5, 7.0),
            Point::new(1.0, 0.0),
        ]
    }

    fn vertex(mesh: &VoronoiMesh, i: usize) -> &[f32] {
        &mesh.vertices[i * VORONOI_STRIDE..(i + 1) * VORONOI_STRIDE]
    }

    // ── mesh shape ────────────────────────────────────────────────────────

    #[test]
    fn one_fan_per_site() {
        let mesh = build_mesh(&sites(), &bbox());
        assert_eq!(mesh.cell_triangles.len(), 4);

        for cell in tessellate(&sites(), &bbox()) {
            let surviving = merge_edges(&cell.edges).len();
            assert!(surviving >= 2);
            assert_eq!(mesh.cell_triangles[cell.site_index], 2 * surviving);
        }
        assert_eq!(mesh.indices.len(), 3 * mesh.cell_triangles.iter().sum::<usize>());
    }

    #[test]
    fn indices_stay_in_range() {
        let mesh = build_mesh(&sites(), &bbox());
        assert_eq!(mesh.vertices.len() % VORONOI_STRIDE, 0);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn center_vertices_are_flagged() {
        let mesh = build_mesh(&sites(), &bbox());
        for tri in mesh.indices.chunks_exact(3) {
            let c = vertex(&mesh, tri[0] as usize);
            assert_eq!(c[5], 1.0);
            assert_eq!((c[0], c[1]), (c[2], c[3]));
            assert_eq!(vertex(&mesh, tri[1] as usize)[5], 0.0);
            assert_eq!(vertex(&mesh, tri[2] as usize)[5], 0.0);
        }
    }

    #[test]
    fn rebuild_is_deterministic() {
        assert_eq!(build_mesh(&sites(), &bbox()), build_mesh(&sites(), &bbox()));
    }

    #[test]
    fn empty_cells_emit_nothing() {
        let sites = vec![Point::new(0.0, 0.0), Point::new(500.0, 0.0), Point::new(-500.0, 0.0)];
        let mesh = build_mesh(&sites, &bbox());
        assert_eq!(mesh.cell_triangles[1], 0);
        assert_eq!(mesh.cell_triangles[2], 0);
        assert_eq!(mesh.cell_triangles[0], 8);
    }

    // ── merging ───────────────────────────────────────────────────────────

    #[test]
    fn short_edge_endpoints_share_a_point() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(10.01, 10.0),
            Point::new(0.0, 10.0),
        ];
        let edges: Vec<Edge> = (0..square.len())
            .map(|i| Edge { start: square[i], end: square[(i + 1) % square.len()] })
            .collect();

        let map = merge_map(&edges);
        let (a, b) = (map[&square[2].key()], map[&square[3].key()]);
        assert_eq!(a, b);
        assert_eq!(a, square[2].midpoint(square[3]));
        assert!(!map.contains_key(&square[0].key()));

        let merged = merge_edges(&edges);
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn chained_short_edges_collapse_together() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(10.01, 10.0),
            Point::new(10.02, 10.0),
            Point::new(0.0, 10.0),
        ];
        let edges: Vec<Edge> = (0..pts.len())
            .map(|i| Edge { start: pts[i], end: pts[(i + 1) % pts.len()] })
            .collect();

        let map = merge_map(&edges);
        assert_eq!(map[&pts[2].key()], map[&pts[4].key()]);
        assert_eq!(merge_edges(&edges).len(), 4);
    }

    // ── rounding ──────────────────────────────────────────────────────────

    #[test]
    fn blend_never_pushes_outward() {
        let mean = 4.0;
        let mut last = f64::INFINITY;
        for step in 0..200 {
            let d = step as f64 * 0.1;
            let b = blend(d, mean);
            assert!(b > 0.0 && b <= 1.0, "blend({d}) = {b}");
            assert!(b <= last + 1e-12);
            last = b;
        }
    }

    #[test]
    fn rounded_points_move_toward_site() {
        let site = Point::new(1.0, 2.0);
        for p in [Point::new(9.0, 2.0), Point::new(-3.0, 7.0), Point::new(1.5, 2.5)] {
            let r = round_point(site, p, 3.0);
            assert!(site.dist(r) <= site.dist(p) + 1e-12);
        }
    }

    #[test]
    fn boundary_vertices_stay_in_their_cell() {
        let sites = sites();
        let mesh = build_mesh(&sites, &bbox());

        for i in 0..mesh.vertex_count() {
            let v = vertex(&mesh, i);
            if v[5] != 0.0 {
                continue;
            }
            let p = Point::new(v[0] as f64, v[1] as f64);
            let own = sites[v[4] as usize].dist(p);
            for other in &sites {
                assert!(own <= other.dist(p) + 1e-3);
            }
        }
    }

    #[test]
    fn every_boundary_vertex_is_pulled_toward_its_site() {
        let sites = sites();
        let mesh = build_mesh(&sites, &bbox());

        for cell in tessellate(&sites, &bbox()) {
            let site = cell.site;
            let mean = cell
                .edges
                .iter()
                .map(|e| site.dist(e.start) + site.dist(e.midpoint()))
                .sum::<f64>()
                / cell.edges.len() as f64
                / 2.0;

            let raw: Vec<Point> = merge_edges(&cell.edges)
                .iter()
                .flat_map(|e| [e.start, e.midpoint(), e.end])
                .collect();
            let emitted: Vec<&[f32]> = (0..mesh.vertex_count())
                .map(|i| vertex(&mesh, i))
                .filter(|v| v[4] == cell.site_index as f32 && v[5] == 0.0)
                .collect();
            assert_eq!(emitted.len(), raw.len());

            for (p, v) in raw.iter().zip(&emitted) {
                let r = round_point(site, *p, mean);
                assert_eq!((v[0], v[1]), (r.x as f32, r.y as f32));
                assert!(site.dist(r) <= site.dist(*p) + 1e-9, "{p:?} moved outward to {r:?}");
            }
        }
    }

    // ── builder ───────────────────────────────────────────────────────────

    const SHADER: &str = r#"
@vertex
fn vs_main(@location(0) a_pos: vec2<f32>, @location(1) a_own: f32) -> @builtin(position) vec4<f32> {
    return vec4<f32>(a_pos, a_own, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;

    #[test]
    fn builder_writes_mesh_into_renderable() {
        let shader = Rc::new(Shader::from_wgsl("vor", SHADER.to_owned()).expect("compiles"));
        let mut builder = VoronoiBuilder::new(shader, sites(), bbox());

        let expected = build_mesh(&sites(), &bbox());
        {
            let r = builder.renderable();
            let r = r.borrow();
            assert_eq!(r.index_buffer().data(), expected.indices.as_slice());
            assert_eq!(r.vertex_array().buffers()[0].data(), expected.vertices.as_slice());
            assert_eq!(r.vertex_array().layouts()[0].stride() as usize, VORONOI_STRIDE * 4);
        }

        let smaller = BBox { left: -5.0, right: 5.0, top: -5.0, bottom: 5.0 };
        builder.recompute(smaller);
        assert_eq!(builder.bbox(), smaller);
        let r = builder.renderable();
        assert_eq!(r.borrow().index_buffer().data(), build_mesh(&sites(), &smaller).indices.as_slice());
    }

    #[test]
    fn recompute_with_the_same_bbox_is_idempotent() {
        let shader = Rc::new(Shader::from_wgsl("vor", SHADER.to_owned()).expect("compiles"));
        let mut builder = VoronoiBuilder::new(shader, sites(), bbox());
        let r = builder.renderable();

        builder.recompute(bbox());
        let indices = r.borrow().index_buffer().data().to_vec();
        let vertices = r.borrow().vertex_array().buffers()[0].data().to_vec();
        assert!(!indices.is_empty());

        builder.recompute(bbox());
        assert_eq!(r.borrow().index_buffer().data(), indices.as_slice());
        assert_eq!(r.borrow().vertex_array().buffers()[0].data(), vertices.as_slice());
    }
}
