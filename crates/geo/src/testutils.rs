use crate::{ArrayDataType, GeoTransform, MemoryGrid, PixelBlock, RasterSize};

pub const PROJECTION: &str = "EPSG:31370";

pub fn geo_transform() -> GeoTransform {
    GeoTransform::new([100.0, 10.0, 0.0, 500.0, 0.0, -10.0])
}

/// Grid where every pixel holds `band * 100 + row * width + col` (zero-based band number).
pub fn sequential_grid(size: RasterSize, band_count: usize) -> MemoryGrid {
    let bands = (0..band_count)
        .map(|band_nr| PixelBlock::from_fn(size, |row, col| (band_nr * 100 + row * size.width() + col) as f64))
        .collect();

    MemoryGrid::from_bands(bands, ArrayDataType::Float32)
        .expect("valid bands")
        .with_geo_transform(geo_transform())
        .with_projection(PROJECTION)
}

pub fn filled_grid(size: RasterSize, band_count: usize, value: f64) -> MemoryGrid {
    MemoryGrid::filled_with(size, band_count, ArrayDataType::Float32, value)
        .with_geo_transform(geo_transform())
        .with_projection(PROJECTION)
}
