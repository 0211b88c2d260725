use crate::util::{BBox, Point};

/// Directed cell boundary segment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Edge {
    pub start: Point,
    pub end: Point,
}

impl Edge {
    #[inline]
    pub fn len(&self) -> f64 {
        self.start.dist(self.end)
    }

    #[inline]
    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }
}

/// One site's region restricted to the bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub site: Point,
    pub site_index: usize,
    /// Counter-clockwise boundary; empty when the region misses the box.
    pub edges: Vec<Edge>,
}

/// Computes one cell per site, in input order.
///
/// Each cell starts as the box polygon and is clipped against the bisector
/// half-plane of every other site. Sites sharing a position with `site` are
/// not clipped against, so coincident sites get identical cells.
pub fn tessellate(sites: &[Point], bbox: &BBox) -> Vec<Cell> {
    sites
        .iter()
        .enumerate()
        .map(|(site_index, &site)| {
            let mut poly: Vec<Point> = bbox.corners().to_vec();
            let key = site.key();

            for other in sites.iter().filter(|o| o.key() != key) {
                poly = clip_half_plane(&poly, site, *other);
                if poly.is_empty() {
                    break;
                }
            }

            dedup_ring(&mut poly);
            let edges = if poly.len() < 3 {
                Vec::new()
            } else {
                (0..poly.len())
                    .map(|i| Edge { start: poly[i], end: poly[(i + 1) % poly.len()] })
                    .collect()
            };

            Cell { site, site_index, edges }
        })
        .collect()
}

/// Signed side of `p` relative to the bisector of `site` and `other`;
/// non-positive means `p` is at least as close to `site`.
#[inline]
fn side(p: Point, site: Point, other: Point) -> f64 {
    let (nx, ny) = (other.x - site.x, other.y - site.y);
    let c = (other.x * other.x + other.y * other.y - site.x * site.x - site.y * site.y) / 2.0;
    p.x * nx + p.y * ny - c
}

/// Sutherland–Hodgman against a single half-plane.
fn clip_half_plane(poly: &[Point], site: Point, other: Point) -> Vec<Point> {
    let mut out = Vec::with_capacity(poly.len() + 1);

    for (i, &cur) in poly.iter().enumerate() {
        let prev = poly[(i + poly.len() - 1) % poly.len()];
        let (sc, sp) = (side(cur, site, other), side(prev, site, other));

        if sc <= 0.0 {
            if sp > 0.0 {
                out.push(prev.lerp(cur, sp / (sp - sc)));
            }
            out.push(cur);
        } else if sp <= 0.0 {
            out.push(prev.lerp(cur, sp / (sp - sc)));
        }
    }

    out
}

fn dedup_ring(poly: &mut Vec<Point>) {
    poly.dedup_by(|a, b| a.key() == b.key());
    while poly.len() > 1 && poly[0].key() == poly[poly.len() - 1].key() {
        poly.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BBox {
        BBox { left: 0.0, right: 10.0, top: 0.0, bottom: 10.0 }
    }

    fn area(cell: &Cell) -> f64 {
        cell.edges.iter().map(|e| e.start.x * e.end.y - e.end.x * e.start.y).sum::<f64>() / 2.0
    }

    // ── cells ─────────────────────────────────────────────────────────────

    #[test]
    fn single_site_owns_the_box() {
        let cells = tessellate(&[Point::new(3.0, 3.0)], &bbox());
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].edges.len(), 4);
        assert!((area(&cells[0]) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn two_sites_split_along_bisector() {
        let cells = tessellate(&[Point::new(2.0, 5.0), Point::new(8.0, 5.0)], &bbox());
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().all(|c| (area(c) - 50.0).abs() < 1e-9));
        assert!(cells[0].edges.iter().all(|e| e.start.x <= 5.0 + 1e-9));
        assert!(cells[1].edges.iter().all(|e| e.start.x >= 5.0 - 1e-9));
    }

    #[test]
    fn cells_partition_the_box() {
        let sites = [
            Point::new(1.0, 1.0),
            Point::new(7.0, 2.0),
            Point::new(4.0, 8.0),
            Point::new(9.0, 9.0),
            Point::new(5.0, 5.0),
        ];
        let cells = tessellate(&sites, &bbox());
        assert_eq!(cells.len(), sites.len());

        let total: f64 = cells.iter().map(area).sum();
        assert!((total - 100.0).abs() < 1e-6);
        assert!(cells.iter().all(|c| area(c) > 0.0));
    }

    #[test]
    fn edges_form_closed_ring() {
        let sites = [Point::new(1.0, 1.0), Point::new(7.0, 2.0), Point::new(4.0, 8.0)];
        for cell in tessellate(&sites, &bbox()) {
            for (i, e) in cell.edges.iter().enumerate() {
                let next = cell.edges[(i + 1) % cell.edges.len()];
                assert_eq!(e.end, next.start);
                assert!(e.len() > 0.0);
            }
        }
    }

    // ── degenerate input ──────────────────────────────────────────────────

    #[test]
    fn coincident_sites_share_a_cell() {
        let sites = [Point::new(2.0, 2.0), Point::new(2.0, 2.0), Point::new(8.0, 8.0)];
        let cells = tessellate(&sites, &bbox());
        assert_eq!(cells[0].edges, cells[1].edges);
        assert!(!cells[0].edges.is_empty());
    }

    #[test]
    fn site_far_outside_can_vanish() {
        let sites = [Point::new(5.0, 5.0), Point::new(100.0, 5.0), Point::new(-100.0, 5.0)];
        let cells = tessellate(&sites, &bbox());
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].edges.len(), 4);
        assert!(cells[1].edges.is_empty());
    }
}
