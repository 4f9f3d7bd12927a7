use std::collections::HashSet;

use crate::foundation::core::{BezPath, EntityId, Point, Rect};

/// Seed of the subdivision: one entity at one plot-local position.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SpatialPoint {
    pub id: EntityId,
    pub position: Point,
}

impl SpatialPoint {
    pub fn new(id: impl Into<EntityId>, position: Point) -> Self {
        Self {
            id: id.into(),
            position,
        }
    }
}

/// Region of the bounds closer to `seed` than to any other seed.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct VoronoiCell {
    pub id: EntityId,
    pub seed: Point,
    /// Convex polygon, clipped to the index bounds. Empty when the seed owns no area inside them.
    pub polygon: Vec<Point>,
}

impl VoronoiCell {
    pub fn path(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut it = self.polygon.iter();
        if let Some(first) = it.next() {
            path.move_to(*first);
            for p in it {
                path.line_to(*p);
            }
            path.close_path();
        }
        path
    }

    pub fn bbox(&self) -> Option<Rect> {
        let first = self.polygon.first()?;
        Some(
            self.polygon
                .iter()
                .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
        )
    }
}

const MAX_GRID: usize = 64;

/// Voronoi cells over a point set plus a uniform grid of cell bounding boxes.
///
/// Queries agree with a brute-force nearest search: smallest squared distance, ties broken by the
/// lowest entity id.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    bounds: Rect,
    cells: Vec<VoronoiCell>,
    cols: usize,
    rows: usize,
    buckets: Vec<Vec<usize>>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self {
            bounds: Rect::ZERO,
            cells: Vec::new(),
            cols: 1,
            rows: 1,
            buckets: vec![Vec::new()],
        }
    }
}

impl SpatialIndex {
    /// Build the subdivision of `bounds`.
    ///
    /// Points with non-finite coordinates are skipped. Of several points at the same position,
    /// or carrying the same id, only the one with the lowest id survives.
    #[tracing::instrument(skip_all, fields(points = points.len()))]
    pub fn build(points: &[SpatialPoint], bounds: Rect) -> Self {
        let bounds = bounds.abs();
        let seeds = dedup_seeds(points);
        let cells: Vec<VoronoiCell> = (0..seeds.len())
            .map(|i| VoronoiCell {
                id: seeds[i].id.clone(),
                seed: seeds[i].position,
                polygon: clip_cell(&seeds, i, bounds),
            })
            .collect();

        let side = (cells.len() as f64).sqrt().ceil() as usize;
        let cols = side.clamp(1, MAX_GRID);
        let rows = cols;
        let mut index = Self {
            bounds,
            cells,
            cols,
            rows,
            buckets: vec![Vec::new(); cols * rows],
        };
        let eps = index.eps();
        for (i, cell) in index.cells.iter().enumerate() {
            let Some(b) = cell.bbox() else {
                continue;
            };
            let b = b.inflate(eps, eps);
            let (c0, r0) = index.bucket_of(Point::new(b.x0, b.y0));
            let (c1, r1) = index.bucket_of(Point::new(b.x1, b.y1));
            for r in r0..=r1 {
                for c in c0..=c1 {
                    index.buckets[r * cols + c].push(i);
                }
            }
        }
        tracing::debug!(cells = index.cells.len(), grid = cols, "built spatial index");
        index
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn cells(&self) -> &[VoronoiCell] {
        &self.cells
    }

    pub fn cell_path(&self, i: usize) -> Option<BezPath> {
        self.cells.get(i).map(VoronoiCell::path)
    }

    /// Nearest seed to `p`, or `None` for an empty index or a point outside the bounds.
    pub fn query(&self, p: Point) -> Option<&EntityId> {
        if self.cells.is_empty() || !p.is_finite() || !contains_inclusive(self.bounds, p) {
            return None;
        }
        let (c, r) = self.bucket_of(p);
        let eps = self.eps();
        let best = self.buckets[r * self.cols + c]
            .iter()
            .map(|&i| &self.cells[i])
            .filter(|cell| {
                cell.bbox()
                    .is_some_and(|b| contains_inclusive(b.inflate(eps, eps), p))
            })
            .min_by(|a, b| closer(a, b, p));
        match best {
            Some(cell) => Some(&cell.id),
            None => self.cells.iter().min_by(|a, b| closer(a, b, p)).map(|c| &c.id),
        }
    }

    fn eps(&self) -> f64 {
        1e-7 * self.bounds.width().hypot(self.bounds.height()).max(1.0)
    }

    fn bucket_of(&self, p: Point) -> (usize, usize) {
        let fx = if self.bounds.width() > 0.0 {
            (p.x - self.bounds.x0) / self.bounds.width()
        } else {
            0.0
        };
        let fy = if self.bounds.height() > 0.0 {
            (p.y - self.bounds.y0) / self.bounds.height()
        } else {
            0.0
        };
        let c = ((fx * self.cols as f64).floor().max(0.0) as usize).min(self.cols - 1);
        let r = ((fy * self.rows as f64).floor().max(0.0) as usize).min(self.rows - 1);
        (c, r)
    }
}

fn closer(a: &VoronoiCell, b: &VoronoiCell, p: Point) -> std::cmp::Ordering {
    (a.seed - p)
        .hypot2()
        .total_cmp(&(b.seed - p).hypot2())
        .then_with(|| a.id.cmp(&b.id))
}

fn contains_inclusive(r: Rect, p: Point) -> bool {
    p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
}

fn dedup_seeds(points: &[SpatialPoint]) -> Vec<SpatialPoint> {
    let mut sorted: Vec<&SpatialPoint> = points
        .iter()
        .filter(|p| p.position.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut seen_pos = HashSet::new();
    let mut seen_id = HashSet::new();
    let mut out = Vec::with_capacity(sorted.len());
    for p in sorted {
        // `+ 0.0` folds -0.0 into 0.0.
        let key = ((p.position.x + 0.0).to_bits(), (p.position.y + 0.0).to_bits());
        if !seen_id.insert(&p.id) {
            tracing::warn!(id = %p.id, "duplicate id in spatial index; keeping the first");
            continue;
        }
        if !seen_pos.insert(key) {
            tracing::debug!(id = %p.id, "coincident seed dropped");
            continue;
        }
        out.push(p.clone());
    }
    out
}

/// Cell of `seeds[i]`: the bounds rectangle clipped by the bisector half-plane of every other
/// seed, nearest first, stopping once no remaining bisector can reach the polygon.
fn clip_cell(seeds: &[SpatialPoint], i: usize, bounds: Rect) -> Vec<Point> {
    let s = seeds[i].position;
    let mut poly = vec![
        Point::new(bounds.x0, bounds.y0),
        Point::new(bounds.x1, bounds.y0),
        Point::new(bounds.x1, bounds.y1),
        Point::new(bounds.x0, bounds.y1),
    ];

    let mut others: Vec<(f64, Point)> = seeds
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != i)
        .map(|(_, o)| ((o.position - s).hypot(), o.position))
        .collect();
    others.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (d, o) in others {
        let reach = poly
            .iter()
            .map(|v| (*v - s).hypot())
            .fold(0.0_f64, f64::max);
        if d > 2.0 * reach {
            break;
        }
        poly = clip_half_plane(&poly, s, o);
        if poly.is_empty() {
            break;
        }
    }
    poly
}

/// Keep the part of `poly` at least as close to `s` as to `o`.
fn clip_half_plane(poly: &[Point], s: Point, o: Point) -> Vec<Point> {
    // Measured from the midpoint so close seeds far from the origin keep their precision.
    let n = o - s;
    let mid = s.midpoint(o);
    let side = |p: Point| n.dot(p - mid);

    let mut out = Vec::with_capacity(poly.len() + 1);
    for (k, &a) in poly.iter().enumerate() {
        let b = poly[(k + 1) % poly.len()];
        let (fa, fb) = (side(a), side(b));
        if fa <= 0.0 {
            out.push(a);
        }
        if (fa <= 0.0) != (fb <= 0.0) {
            let t = fa / (fa - fb);
            out.push(a.lerp(b, t));
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/spatial/voronoi.rs"]
mod tests;
