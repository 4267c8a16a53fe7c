use glam::Vec2;

/// Default broad-phase cell size in pixels.
pub const DEFAULT_CELL_SIZE: f32 = 128.0;

/// Uniform broad-phase grid over the map's pixel extent.
///
/// Each cell holds the actors currently overlapping it, in insertion order;
/// removal swaps with the last entry so membership indices stay dense (the
/// displaced actor's own index is fixed up by the spatial system). Cell
/// coordinates outside the map resolve to `None` and callers treat that as a
/// no-op rather than an error.
pub struct AreaGrid {
    cell_width: f32,
    cell_height: f32,
    cols: i32,
    rows: i32,
    cells: Vec<Vec<hecs::Entity>>,
}

impl AreaGrid {
    pub fn new(
        map_pixel_width: f32,
        map_pixel_height: f32,
        cell_width: f32,
        cell_height: f32,
    ) -> Self {
        let cols = (map_pixel_width / cell_width).ceil().max(1.0) as i32;
        let rows = (map_pixel_height / cell_height).ceil().max(1.0) as i32;
        Self {
            cell_width,
            cell_height,
            cols,
            rows,
            cells: vec![Vec::new(); (cols * rows) as usize],
        }
    }

    pub fn cell_width(&self) -> f32 {
        self.cell_width
    }

    pub fn cell_height(&self) -> f32 {
        self.cell_height
    }

    /// Cell coordinates of a world point (may be off-grid).
    pub fn cell_coords(&self, point: Vec2) -> (i32, i32) {
        (
            (point.x / self.cell_width).floor() as i32,
            (point.y / self.cell_height).floor() as i32,
        )
    }

    fn index(&self, coords: (i32, i32)) -> Option<usize> {
        let (cx, cy) = coords;
        if cx < 0 || cy < 0 || cx >= self.cols || cy >= self.rows {
            return None;
        }
        Some((cy * self.cols + cx) as usize)
    }

    pub fn cell(&self, coords: (i32, i32)) -> Option<&Vec<hecs::Entity>> {
        self.index(coords).map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, coords: (i32, i32)) -> Option<&mut Vec<hecs::Entity>> {
        self.index(coords).map(move |i| &mut self.cells[i])
    }

    /// All cells in row-major order; pair enumeration walks this.
    pub fn cells(&self) -> impl Iterator<Item = &Vec<hecs::Entity>> {
        self.cells.iter()
    }
}
