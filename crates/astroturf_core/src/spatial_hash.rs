use astroturf_data::AgentId;

#[derive(Clone, Debug, Default)]
/// Uniform grid index over agent positions.
///
/// Each cell keeps the ids of the agents whose position falls inside it.
/// Unlike a rebuild-per-tick index, cells are updated incrementally so an
/// agent that moves mid-tick is immediately visible at its new position to
/// agents stepping after it.
///
/// # Performance Characteristics
/// - Range queries: O(agents in the covered cells)
/// - Insert: O(1), remove/relocate: O(agents in the cell)
/// - Memory: O(agent_count + cols * rows), with at most
///   [`MAX_CELLS_PER_AXIS`] cells along each axis
///
/// # Implementation Notes
/// - Coordinates on the far edge (`x == width`) belong to the last column
/// - A requested cell size smaller than `extent / MAX_CELLS_PER_AXIS` is
///   widened to it; queries stay exact, buckets just get coarser
/// - Non-finite coordinates map to no cell
/// - Cell order within a query is row-major, and bucket order is stable, so
///   results are deterministic for a given history of mutations
///
/// # Examples
/// ```
/// use astroturf_core::spatial_hash::SpatialHash;
/// use astroturf_data::AgentId;
///
/// let mut grid = SpatialHash::new(10.0, 100.0, 100.0);
/// grid.insert(AgentId(1), 15.0, 15.0);
/// grid.insert(AgentId(2), 85.0, 85.0);
///
/// let mut nearby = Vec::new();
/// grid.query_callback(15.0, 15.0, 5.0, false, |id| nearby.push(id));
/// assert_eq!(nearby, vec![AgentId(1)]);
/// ```
pub struct SpatialHash {
    pub cell_size: f64,
    pub width: f64,
    pub height: f64,
    pub cols: usize,
    pub rows: usize,
    cells: Vec<Vec<AgentId>>,
}

/// Upper bound on grid columns and rows.
pub const MAX_CELLS_PER_AXIS: usize = 512;

impl SpatialHash {
    /// Creates an empty grid covering `[0, width] x [0, height]`.
    pub fn new(cell_size: f64, width: f64, height: f64) -> Self {
        let cell_size = cell_size.max(width.max(height) / MAX_CELLS_PER_AXIS as f64);
        let cols = ((width / cell_size).ceil() as usize).clamp(1, MAX_CELLS_PER_AXIS);
        let rows = ((height / cell_size).ceil() as usize).clamp(1, MAX_CELLS_PER_AXIS);
        Self {
            cell_size,
            width,
            height,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    /// Computes the cell index for a given world coordinate.
    ///
    /// Returns `None` for non-finite coordinates and for coordinates outside
    /// `[0, width] x [0, height]`.
    #[inline]
    pub fn get_cell_idx(&self, x: f64, y: f64) -> Option<usize> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        if x < 0.0 || y < 0.0 || x > self.width || y > self.height {
            return None;
        }
        let cx = ((x / self.cell_size) as usize).min(self.cols - 1);
        let cy = ((y / self.cell_size) as usize).min(self.rows - 1);
        Some(cy * self.cols + cx)
    }

    /// Adds an id at the given coordinate and returns its cell.
    pub fn insert(&mut self, id: AgentId, x: f64, y: f64) -> Option<usize> {
        let idx = self.get_cell_idx(x, y)?;
        self.cells[idx].push(id);
        Some(idx)
    }

    /// Drops an id from a cell. Returns whether it was present.
    pub fn remove(&mut self, id: AgentId, cell: usize) -> bool {
        let Some(bucket) = self.cells.get_mut(cell) else {
            return false;
        };
        match bucket.iter().position(|&e| e == id) {
            Some(pos) => {
                bucket.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Moves an id to the cell of a new coordinate, returning the new cell.
    pub fn relocate(&mut self, id: AgentId, from: usize, x: f64, y: f64) -> Option<usize> {
        let to = self.get_cell_idx(x, y)?;
        if to != from {
            if !self.remove(id, from) {
                return None;
            }
            self.cells[to].push(id);
        }
        Some(to)
    }

    /// Cells covering `[lo, hi]` along one axis, each cell visited once.
    ///
    /// With `wrap`, the range is folded onto `[0, extent)` before it is mapped
    /// to cells, so a partial last cell is still reached from either side.
    fn axis_cells(&self, lo: f64, hi: f64, extent: f64, count: usize, wrap: bool) -> Vec<usize> {
        if !wrap {
            return self.cell_span(lo, hi, count);
        }
        if hi - lo >= extent {
            return (0..count).collect();
        }
        let start = lo.rem_euclid(extent);
        let end = start + (hi - lo);
        if end <= extent {
            return self.cell_span(start, end, count);
        }
        let mut cells = self.cell_span(start, extent, count);
        for c in self.cell_span(0.0, end - extent, count) {
            if !cells.contains(&c) {
                cells.push(c);
            }
        }
        cells
    }

    fn cell_span(&self, lo: f64, hi: f64, count: usize) -> Vec<usize> {
        let min_c = ((lo / self.cell_size).floor() as i64).max(0);
        let max_c = ((hi / self.cell_size).floor() as i64).min(count as i64 - 1);
        if min_c > max_c {
            return Vec::new();
        }
        (min_c as usize..=max_c as usize).collect()
    }

    /// Visits every id in the cells overlapping the square around `(x, y)`.
    ///
    /// Candidates still need an exact distance check by the caller.
    pub fn query_callback<F>(&self, x: f64, y: f64, radius: f64, wrap: bool, mut callback: F)
    where
        F: FnMut(AgentId),
    {
        if !x.is_finite() || !y.is_finite() || !radius.is_finite() {
            return;
        }
        let xs = self.axis_cells(x - radius, x + radius, self.width, self.cols, wrap);
        let ys = self.axis_cells(y - radius, y + radius, self.height, self.rows, wrap);
        for &cy in &ys {
            for &cx in &xs {
                for &id in &self.cells[cy * self.cols + cx] {
                    callback(id);
                }
            }
        }
    }
}
