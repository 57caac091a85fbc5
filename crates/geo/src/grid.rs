//! The contracts through which the windowing engines read source grids and materialize output grids.
//! The engines are format agnostic, anything that implements these traits can be processed.

use crate::{ArrayDataType, BandIndex, GeoTransform, PixelBlock, RasterSize, Result, Tile, band_index, windowing::Window};

/// Read-only, random access to a gridded dataset.
pub trait GridProvider {
    fn raster_size(&self) -> RasterSize;

    fn band_count(&self) -> usize;

    /// The nodata value of the band, `None` if the band has no nodata value.
    fn nodata(&self, band: BandIndex) -> Option<f64>;

    fn data_type(&self) -> ArrayDataType;

    fn geo_transform(&self) -> GeoTransform;

    fn projection(&self) -> String;

    /// Reads the pixels of a window of one band.
    /// The window must be contained within the raster.
    fn read_window(&self, band: BandIndex, window: &Window) -> Result<PixelBlock>;

    fn width(&self) -> usize {
        self.raster_size().width()
    }

    fn height(&self) -> usize {
        self.raster_size().height()
    }

    /// Reads the pixels of a window for every band.
    fn read_tile(&self, window: &Window) -> Result<Tile> {
        let bands = (0..self.band_count())
            .map(|band_nr| self.read_window(band_index(band_nr), window))
            .collect::<Result<Vec<_>>>()?;

        Tile::from_bands(bands)
    }
}

/// Shape and pixel type of a grid that is about to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub size: RasterSize,
    pub band_count: usize,
    pub data_type: ArrayDataType,
}

/// Creates output grids, the location of the output is a property of the sink.
pub trait GridSink {
    type Writer: GridWriter;

    fn create(self, layout: &GridLayout) -> Result<Self::Writer>;
}

/// Write access to a freshly created grid.
/// The grid is only considered valid once [`GridWriter::close`] returned successfully.
pub trait GridWriter {
    /// The finished grid handed back to the caller.
    type Output;

    fn set_geo_transform(&mut self, geo_transform: GeoTransform) -> Result;

    fn set_projection(&mut self, projection: &str) -> Result;

    fn set_nodata(&mut self, band: BandIndex, nodata: f64) -> Result;

    fn write_window(&mut self, band: BandIndex, block: &PixelBlock, x_off: usize, y_off: usize) -> Result;

    fn close(self) -> Result<Self::Output>;
}
