use crate::{
    ArrayDataType, BandIndex, Error, GeoTransform, GridLayout, GridProvider, GridSink, GridWriter, PixelBlock, RasterSize, Result,
    windowing::Window,
};

/// Grid that keeps all of its bands in memory.
/// Serves as source and as output of the windowing engines when no file based storage is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryGrid {
    size: RasterSize,
    data_type: ArrayDataType,
    geo_transform: GeoTransform,
    projection: String,
    nodata: Vec<Option<f64>>,
    bands: Vec<PixelBlock>,
}

impl MemoryGrid {
    /// Creates a grid with all pixels set to 0.
    pub fn new(size: RasterSize, band_count: usize, data_type: ArrayDataType) -> Self {
        Self::filled_with(size, band_count, data_type, 0.0)
    }

    pub fn filled_with(size: RasterSize, band_count: usize, data_type: ArrayDataType, value: f64) -> Self {
        Self {
            size,
            data_type,
            geo_transform: GeoTransform::default(),
            projection: String::new(),
            nodata: vec![None; band_count],
            bands: vec![PixelBlock::filled_with(size, value); band_count],
        }
    }

    /// Creates a grid from the band data, the values are stored as they are.
    pub fn from_bands(bands: Vec<PixelBlock>, data_type: ArrayDataType) -> Result<Self> {
        let Some(size) = bands.first().map(PixelBlock::size) else {
            return Err(Error::InvalidArgument("A grid needs at least one band".to_string()));
        };

        if let Some(band) = bands.iter().find(|b| b.size() != size) {
            return Err(Error::ShapeMismatch(format!(
                "Grid bands differ in size: {size} <-> {}",
                band.size()
            )));
        }

        Ok(Self {
            size,
            data_type,
            geo_transform: GeoTransform::default(),
            projection: String::new(),
            nodata: vec![None; bands.len()],
            bands,
        })
    }

    pub fn with_geo_transform(mut self, geo_transform: GeoTransform) -> Self {
        self.geo_transform = geo_transform;
        self
    }

    pub fn with_projection(mut self, projection: impl Into<String>) -> Self {
        self.projection = projection.into();
        self
    }

    /// Sets the same nodata value on every band.
    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata.iter_mut().for_each(|v| *v = nodata);
        self
    }

    pub fn set_band_nodata(&mut self, band: BandIndex, nodata: Option<f64>) -> Result {
        let index = self.band_position(band)?;
        self.nodata[index] = nodata;
        Ok(())
    }

    pub fn band(&self, band: BandIndex) -> Result<&PixelBlock> {
        Ok(&self.bands[self.band_position(band)?])
    }

    pub fn bands(&self) -> &[PixelBlock] {
        &self.bands
    }

    fn band_position(&self, band: BandIndex) -> Result<usize> {
        let index = band.get() - 1;
        if index >= self.bands.len() {
            return Err(Error::InvalidArgument(format!(
                "Band {band} does not exist, the grid has {} band(s)",
                self.bands.len()
            )));
        }

        Ok(index)
    }
}

impl GridProvider for MemoryGrid {
    fn raster_size(&self) -> RasterSize {
        self.size
    }

    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn nodata(&self, band: BandIndex) -> Option<f64> {
        self.nodata.get(band.get() - 1).copied().flatten()
    }

    fn data_type(&self) -> ArrayDataType {
        self.data_type
    }

    fn geo_transform(&self) -> GeoTransform {
        self.geo_transform
    }

    fn projection(&self) -> String {
        self.projection.clone()
    }

    fn read_window(&self, band: BandIndex, window: &Window) -> Result<PixelBlock> {
        self.band(band)?.sub_block(window)
    }
}

/// Sink that materializes output grids in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryGridSink;

impl GridSink for MemoryGridSink {
    type Writer = MemoryGridWriter;

    fn create(self, layout: &GridLayout) -> Result<MemoryGridWriter> {
        Ok(MemoryGridWriter {
            grid: MemoryGrid::new(layout.size, layout.band_count, layout.data_type),
            written: vec![false; layout.band_count],
        })
    }
}

pub struct MemoryGridWriter {
    grid: MemoryGrid,
    written: Vec<bool>,
}

impl GridWriter for MemoryGridWriter {
    type Output = MemoryGrid;

    fn set_geo_transform(&mut self, geo_transform: GeoTransform) -> Result {
        self.grid.geo_transform = geo_transform;
        Ok(())
    }

    fn set_projection(&mut self, projection: &str) -> Result {
        self.grid.projection = projection.to_string();
        Ok(())
    }

    /// Pixels of a band that has not been written yet are initialized with the nodata value.
    fn set_nodata(&mut self, band: BandIndex, nodata: f64) -> Result {
        let index = self.grid.band_position(band)?;
        if !self.grid.data_type.can_represent(nodata) {
            return Err(Error::InvalidArgument(format!(
                "Nodata value {nodata} can not be stored as {}",
                self.grid.data_type
            )));
        }

        self.grid.nodata[index] = Some(nodata);
        if !self.written[index] {
            self.grid.bands[index].as_mut_slice().fill(nodata);
        }

        Ok(())
    }

    fn write_window(&mut self, band: BandIndex, block: &PixelBlock, x_off: usize, y_off: usize) -> Result {
        let index = self.grid.band_position(band)?;
        let data_type = self.grid.data_type;

        let mut stored = Vec::with_capacity(block.len());
        for &v in block.iter() {
            stored.push(data_type.cast_value(v).ok_or_else(|| {
                Error::InvalidArgument(format!("Pixel value {v} can not be stored as {data_type}"))
            })?);
        }

        self.grid.bands[index].write_block(&PixelBlock::new(block.size(), stored)?, x_off, y_off)?;
        self.written[index] = true;
        Ok(())
    }

    fn close(self) -> Result<MemoryGrid> {
        Ok(self.grid)
    }
}

#[cfg(test)]
mod tests {
    use crate::{FIRST_BAND, band_index};

    use super::*;

    #[test]
    fn read_window_from_band() -> Result {
        let band = PixelBlock::from_fn(RasterSize::with_width_height(4, 3), |row, col| (row * 4 + col) as f64);
        let grid = MemoryGrid::from_bands(vec![band], ArrayDataType::Float32)?.with_nodata(Some(-1.0));

        assert_eq!(grid.read_window(FIRST_BAND, &Window::new(2, 1, 2, 2))?.as_slice(), &[6.0, 7.0, 10.0, 11.0]);
        assert_eq!(grid.nodata(FIRST_BAND), Some(-1.0));
        assert!(grid.read_window(band_index(1), &Window::new(0, 0, 1, 1)).is_err());
        assert!(grid.read_window(FIRST_BAND, &Window::new(3, 0, 2, 1)).is_err());
        Ok(())
    }

    #[test]
    fn writer_initializes_unwritten_bands_with_nodata() -> Result {
        let layout = GridLayout {
            size: RasterSize::with_width_height(2, 2),
            band_count: 2,
            data_type: ArrayDataType::Uint8,
        };

        let mut writer = MemoryGridSink.create(&layout)?;
        writer.write_window(FIRST_BAND, &PixelBlock::row_vector(vec![1.4, 2.6]), 0, 1)?;
        writer.set_nodata(FIRST_BAND, 255.0)?;
        writer.set_nodata(band_index(1), 255.0)?;
        assert!(writer.set_nodata(band_index(1), -1.0).is_err());
        assert!(writer.write_window(FIRST_BAND, &PixelBlock::row_vector(vec![300.0]), 0, 0).is_err());

        let grid = writer.close()?;
        assert_eq!(grid.band(FIRST_BAND)?.as_slice(), &[0.0, 0.0, 1.0, 3.0]);
        assert_eq!(grid.band(band_index(1))?.as_slice(), &[255.0; 4]);
        Ok(())
    }
}
