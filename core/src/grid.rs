//! Discrete grid coordinates and the fixed affine map onto logical pixels.

use serde::Deserialize;

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Rows are signed because agents enter the field from rows above the
/// visible area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    column: i32,
    row: i32,
}

impl GridCell {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the cell; negative rows lie above the visible field.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the cell reached by applying the provided offset.
    #[must_use]
    pub const fn offset(self, offset: CellOffset) -> Self {
        Self {
            column: self.column.saturating_add(offset.column),
            row: self.row.saturating_add(offset.row),
        }
    }

    /// Cell directly below this one.
    #[must_use]
    pub const fn below(self) -> Self {
        self.offset(CellOffset::new(0, 1))
    }

    /// Cell directly above this one.
    #[must_use]
    pub const fn above(self) -> Self {
        self.offset(CellOffset::new(0, -1))
    }
}

/// Relative displacement between two grid cells.
///
/// Deserialises from a two-element `[column, row]` array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "[i32; 2]")]
pub struct CellOffset {
    column: i32,
    row: i32,
}

impl CellOffset {
    /// Creates an offset from column and row deltas.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Rounds the unit vector pointing along `degrees` onto the nearest cell step.
    ///
    /// Zero degrees points toward increasing columns and ninety degrees toward
    /// increasing rows (screen-down).
    #[must_use]
    pub fn from_degrees(degrees: f32) -> Self {
        let radians = degrees.to_radians();
        Self {
            column: radians.cos().round() as i32,
            row: radians.sin().round() as i32,
        }
    }

    /// Column delta.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row delta.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Reports whether the offset leaves the cell unchanged.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.column == 0 && self.row == 0
    }
}

impl From<[i32; 2]> for CellOffset {
    fn from(value: [i32; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

/// Position expressed in logical screen units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelPoint {
    /// Horizontal coordinate, increasing to the right.
    pub x: f32,
    /// Vertical coordinate, increasing downward.
    pub y: f32,
}

impl PixelPoint {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: PixelPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: PixelPoint) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Linear interpolation toward `other`; `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: PixelPoint, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Logical screen layout that fixes the grid mapping for a session.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Logical screen width; the grid spans it exactly.
    pub screen_width: f32,
    /// Logical screen height.
    pub screen_height: f32,
    /// Number of grid columns across the screen.
    pub columns: u32,
    /// Vertical margin reserved above row zero for UI.
    pub offset_y: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            screen_width: 360.0,
            screen_height: 640.0,
            columns: 9,
            offset_y: 80.0,
        }
    }
}

/// Pure conversion between pixel space and the column/row grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridMapper {
    columns: u32,
    cell_size: f32,
    offset_y: f32,
    screen_width: f32,
    screen_height: f32,
}

impl GridMapper {
    /// Builds the mapper for the provided layout.
    ///
    /// A layout without columns produces a degenerate mapper whose cell size
    /// is zero; validation rejects such layouts before a session starts.
    #[must_use]
    pub fn new(config: &GridConfig) -> Self {
        let cell_size = if config.columns == 0 {
            0.0
        } else {
            config.screen_width / config.columns as f32
        };
        Self {
            columns: config.columns,
            cell_size,
            offset_y: config.offset_y,
            screen_width: config.screen_width,
            screen_height: config.screen_height,
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Side length of a square cell in logical units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Logical screen width.
    #[must_use]
    pub const fn screen_width(&self) -> f32 {
        self.screen_width
    }

    /// Logical screen height.
    #[must_use]
    pub const fn screen_height(&self) -> f32 {
        self.screen_height
    }

    /// Number of whole rows that fit below the UI margin.
    #[must_use]
    pub fn visible_rows(&self) -> i32 {
        if self.cell_size <= 0.0 {
            return 0;
        }
        ((self.screen_height - self.offset_y) / self.cell_size).floor() as i32
    }

    /// Centre of the provided cell in pixel space.
    #[must_use]
    pub fn grid_to_pixel(&self, cell: GridCell) -> PixelPoint {
        let half = self.cell_size / 2.0;
        PixelPoint {
            x: cell.column() as f32 * self.cell_size + half,
            y: cell.row() as f32 * self.cell_size + half + self.offset_y,
        }
    }

    /// Cell containing the provided point.
    #[must_use]
    pub fn pixel_to_grid(&self, point: PixelPoint) -> GridCell {
        if self.cell_size <= 0.0 {
            return GridCell::new(0, 0);
        }
        GridCell::new(
            (point.x / self.cell_size).floor() as i32,
            ((point.y - self.offset_y) / self.cell_size).floor() as i32,
        )
    }

    /// Reports whether the column lies within `[0, columns)`.
    #[must_use]
    pub fn contains_column(&self, column: i32) -> bool {
        u32::try_from(column).map_or(false, |column| column < self.columns)
    }

    /// Target used when no player is available: bottom centre of the screen.
    #[must_use]
    pub fn fallback_target(&self) -> PixelPoint {
        PixelPoint::new(self.screen_width / 2.0, self.screen_height)
    }
}

impl Default for GridMapper {
    fn default() -> Self {
        Self::new(&GridConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_round_trips_through_pixel_space() {
        let mapper = GridMapper::default();
        for column in 0..9 {
            for row in -12..16 {
                let cell = GridCell::new(column, row);
                assert_eq!(mapper.pixel_to_grid(mapper.grid_to_pixel(cell)), cell);
            }
        }
    }

    #[test]
    fn round_trip_survives_fractional_cell_sizes() {
        let mapper = GridMapper::new(&GridConfig {
            screen_width: 100.0,
            screen_height: 300.0,
            columns: 3,
            offset_y: 17.5,
        });
        for column in 0..3 {
            for row in -4..8 {
                let cell = GridCell::new(column, row);
                assert_eq!(mapper.pixel_to_grid(mapper.grid_to_pixel(cell)), cell);
            }
        }
    }

    #[test]
    fn grid_to_pixel_returns_cell_centre_below_margin() {
        let mapper = GridMapper::default();
        assert_eq!(mapper.cell_size(), 40.0);
        assert_eq!(
            mapper.grid_to_pixel(GridCell::new(0, 0)),
            PixelPoint::new(20.0, 100.0)
        );
        assert_eq!(
            mapper.grid_to_pixel(GridCell::new(2, -1)),
            PixelPoint::new(100.0, 60.0)
        );
    }

    #[test]
    fn visible_rows_exclude_margin() {
        assert_eq!(GridMapper::default().visible_rows(), 14);
    }

    #[test]
    fn column_bounds_are_half_open() {
        let mapper = GridMapper::default();
        assert!(mapper.contains_column(0));
        assert!(mapper.contains_column(8));
        assert!(!mapper.contains_column(9));
        assert!(!mapper.contains_column(-1));
    }

    #[test]
    fn angles_round_to_neighbouring_cells() {
        assert_eq!(CellOffset::from_degrees(0.0), CellOffset::new(1, 0));
        assert_eq!(CellOffset::from_degrees(90.0), CellOffset::new(0, 1));
        assert_eq!(CellOffset::from_degrees(135.0), CellOffset::new(-1, 1));
        assert_eq!(CellOffset::from_degrees(270.0), CellOffset::new(0, -1));
    }

    #[test]
    fn fallback_target_is_bottom_centre() {
        let mapper = GridMapper::default();
        assert_eq!(mapper.fallback_target(), PixelPoint::new(180.0, 640.0));
    }
}
