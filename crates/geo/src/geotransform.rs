use std::fmt::Debug;

use approx::{AbsDiffEq, RelativeEq};

/// Affine transformation from pixel indices to world coordinates.
#[derive(Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoTransform([f64; 6]);

impl GeoTransform {
    /// Creates a new `GeoTransform` from the provided coefficients.
    ///
    /// The coefficients are in the order: [top left x, pixel width, rotation (0 if north is up),
    /// top left y, rotation (0 if north is up), pixel height].
    pub const fn new(coefficients: [f64; 6]) -> Self {
        GeoTransform(coefficients)
    }

    /// North up transform with square cells.
    pub const fn north_up(top_left_x: f64, top_left_y: f64, cell_size: f64) -> Self {
        Self::new([top_left_x, cell_size, 0.0, top_left_y, 0.0, -cell_size])
    }

    /// Translates a cell to a point in world coordinates.
    /// Cell (0, 0) is the top left corner of the raster.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.0[0] + self.0[1] * col + self.0[2] * row;
        let y = self.0[3] + self.0[4] * col + self.0[5] * row;
        (x, y)
    }

    pub fn top_left(&self) -> (f64, f64) {
        (self.0[0], self.0[3])
    }

    /// The horizontal cell size
    pub fn cell_size_x(&self) -> f64 {
        self.0[1]
    }

    /// The vertical cell size
    pub fn cell_size_y(&self) -> f64 {
        self.0[5]
    }

    /// Transform of a raster whose cells each cover `factor` x `factor` cells of this raster.
    /// The origin and rotation terms are left untouched.
    pub fn with_cells_scaled_by(&self, factor: usize) -> Self {
        let mut coefficients = self.0;
        coefficients[1] *= factor as f64;
        coefficients[5] *= factor as f64;
        Self(coefficients)
    }

    /// Returns the coefficients of the transformation.
    pub fn coefficients(&self) -> [f64; 6] {
        self.0
    }
}

impl From<[f64; 6]> for GeoTransform {
    fn from(coefficients: [f64; 6]) -> Self {
        GeoTransform(coefficients)
    }
}

impl From<GeoTransform> for [f64; 6] {
    fn from(geo_trans: GeoTransform) -> [f64; 6] {
        geo_trans.0
    }
}

impl Debug for GeoTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GeoTransform(topleft: ({}, {}), pixel_width: {}, pixel_height: {})",
            self.0[0],
            self.0[3],
            self.cell_size_x(),
            self.cell_size_y()
        )
    }
}

impl AbsDiffEq for GeoTransform {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.0.abs_diff_eq(&other.0, epsilon)
    }
}

impl RelativeEq for GeoTransform {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: Self::Epsilon, max_relative: Self::Epsilon) -> bool {
        self.0.relative_eq(&other.0, epsilon, max_relative)
    }
}
