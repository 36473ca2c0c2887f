use glam::Vec2;

pub const DEFAULT_CELL_SIZE: f32 = 8.0;

/// Uniform bucket grid over a bounded world for radius queries.
///
/// Positions outside the covered area are bucketed at the nearest edge, so
/// every inserted item remains findable.
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    cell_size: f32,
    cols: usize,
    rows: usize,
    buckets: Vec<Vec<(T, Vec2)>>,
}

impl<T: Copy> SpatialIndex<T> {
    pub fn new(width: f32, height: f32, cell_size: f32) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { DEFAULT_CELL_SIZE };
        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((height / cell_size).ceil() as usize).max(1);
        SpatialIndex {
            cell_size,
            cols,
            rows,
            buckets: vec![Vec::new(); cols * rows],
        }
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    fn cell_of(&self, pos: Vec2) -> (usize, usize) {
        let cx = (pos.x / self.cell_size).floor();
        let cy = (pos.y / self.cell_size).floor();
        let cx = if cx.is_nan() { 0.0 } else { cx.clamp(0.0, (self.cols - 1) as f32) };
        let cy = if cy.is_nan() { 0.0 } else { cy.clamp(0.0, (self.rows - 1) as f32) };
        (cx as usize, cy as usize)
    }

    pub fn insert(&mut self, item: T, pos: Vec2) {
        let (cx, cy) = self.cell_of(pos);
        self.buckets[cy * self.cols + cx].push((item, pos));
    }

    /// Visit every item within `radius` of `center` (inclusive), in bucket
    /// scan order, along with its squared distance.
    pub fn for_each_within(&self, center: Vec2, radius: f32, mut f: impl FnMut(T, Vec2, f32)) {
        if radius < 0.0 || !radius.is_finite() {
            return;
        }
        let r2 = radius * radius;
        let (x0, y0) = self.cell_of(center - Vec2::splat(radius));
        let (x1, y1) = self.cell_of(center + Vec2::splat(radius));
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                for &(item, pos) in &self.buckets[cy * self.cols + cx] {
                    let d2 = pos.distance_squared(center);
                    if d2 <= r2 {
                        f(item, pos, d2);
                    }
                }
            }
        }
    }

    pub fn query(&self, center: Vec2, radius: f32) -> Vec<T> {
        let mut out = Vec::new();
        self.for_each_within(center, radius, |item, _, _| out.push(item));
        out
    }
}
