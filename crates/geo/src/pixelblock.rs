use crate::{Error, RasterSize, Result, windowing::Window};

/// Single band pixel data of one window, stored row-major as f64 regardless of the band data type.
#[derive(Clone, PartialEq)]
pub struct PixelBlock {
    size: RasterSize,
    data: Vec<f64>,
}

impl PixelBlock {
    pub fn new(size: RasterSize, data: Vec<f64>) -> Result<Self> {
        if data.len() != size.cell_count() {
            return Err(Error::ShapeMismatch(format!(
                "Pixel data length ({}) does not match the block size {size}",
                data.len()
            )));
        }

        Ok(Self { size, data })
    }

    pub fn filled_with(size: RasterSize, value: f64) -> Self {
        Self {
            size,
            data: vec![value; size.cell_count()],
        }
    }

    pub fn from_fn(size: RasterSize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(size.cell_count());
        for row in 0..size.height() {
            for col in 0..size.width() {
                data.push(f(row, col));
            }
        }

        Self { size, data }
    }

    /// A single row block, the shape the executor writes back for every output row.
    pub fn row_vector(data: Vec<f64>) -> Self {
        Self {
            size: RasterSize::with_width_height(data.len(), 1),
            data,
        }
    }

    pub fn size(&self) -> RasterSize {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.width()
    }

    pub fn height(&self) -> usize {
        self.size.height()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height() || col >= self.width() {
            return None;
        }

        Some(self.data[row * self.width() + col])
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let width = self.width();
        &self.data[row * width..(row + 1) * width]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.data.iter()
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> PixelBlock {
        PixelBlock {
            size: self.size,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combines two blocks of identical size pixel by pixel.
    pub fn zip_map(&self, other: &PixelBlock, f: impl Fn(f64, f64) -> f64) -> Result<PixelBlock> {
        if self.size != other.size {
            return Err(Error::ShapeMismatch(format!(
                "Pixel block sizes do not match {} <-> {}",
                self.size, other.size
            )));
        }

        Ok(PixelBlock {
            size: self.size,
            data: self.data.iter().zip(other.data.iter()).map(|(&a, &b)| f(a, b)).collect(),
        })
    }

    /// Sum of the values that are not nodata, `None` if the block holds no data.
    pub fn sum(&self, nodata: Option<f64>) -> Option<f64> {
        let mut values = self.iter().copied().filter(|&v| !is_nodata(v, nodata)).peekable();
        values.peek()?;
        Some(values.sum())
    }

    /// Mean of the values that are not nodata, `None` if the block holds no data.
    pub fn mean(&self, nodata: Option<f64>) -> Option<f64> {
        let count = self.iter().filter(|&&v| !is_nodata(v, nodata)).count();
        self.sum(nodata).map(|sum| sum / count as f64)
    }

    pub fn min(&self, nodata: Option<f64>) -> Option<f64> {
        self.iter().copied().filter(|&v| !is_nodata(v, nodata)).reduce(f64::min)
    }

    pub fn max(&self, nodata: Option<f64>) -> Option<f64> {
        self.iter().copied().filter(|&v| !is_nodata(v, nodata)).reduce(f64::max)
    }

    /// Copies the pixels covered by `window` into a new block.
    pub fn sub_block(&self, window: &Window) -> Result<PixelBlock> {
        self.check_window_on_block(window)?;

        let mut data = Vec::with_capacity(window.size().cell_count());
        for row in window.y_off..window.y_off + window.height {
            let start = row * self.width() + window.x_off;
            data.extend_from_slice(&self.data[start..start + window.width]);
        }

        Ok(PixelBlock { size: window.size(), data })
    }

    /// Overwrites the pixels at the given offset with the contents of `block`.
    pub fn write_block(&mut self, block: &PixelBlock, x_off: usize, y_off: usize) -> Result {
        let window = Window::new(x_off, y_off, block.width(), block.height());
        self.check_window_on_block(&window)?;

        let width = self.width();
        for (block_row, row) in (y_off..y_off + block.height()).enumerate() {
            let start = row * width + x_off;
            self.data[start..start + block.width()].copy_from_slice(block.row(block_row));
        }

        Ok(())
    }

    fn check_window_on_block(&self, window: &Window) -> Result {
        if window.x_off + window.width > self.width() || window.y_off + window.height > self.height() {
            return Err(Error::InvalidArgument(format!(
                "Window {window} is not contained in a block of size {}",
                self.size
            )));
        }

        Ok(())
    }
}

impl std::fmt::Debug for PixelBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PixelBlock{} {:?}", self.size, self.data)
    }
}

/// Checks a pixel against an optional nodata value, a NaN nodata matches NaN pixels.
pub fn is_nodata(value: f64, nodata: Option<f64>) -> bool {
    match nodata {
        Some(nod) if nod.is_nan() => value.is_nan(),
        Some(nod) => value == nod,
        None => false,
    }
}

/// The pixel data of one window for every band: shape `(bands, h, w)`.
/// A tile always holds at least one band and all bands share the same size.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    bands: Vec<PixelBlock>,
}

impl Tile {
    pub fn single(block: PixelBlock) -> Self {
        Self { bands: vec![block] }
    }

    pub fn from_bands(bands: Vec<PixelBlock>) -> Result<Self> {
        let Some(first) = bands.first() else {
            return Err(Error::ShapeMismatch("A tile needs at least one band".to_string()));
        };

        let size = first.size();
        if let Some((index, band)) = bands.iter().enumerate().find(|(_, b)| b.size() != size) {
            return Err(Error::ShapeMismatch(format!(
                "Tile band {} has size {} but band 1 has size {size}",
                index + 1,
                band.size()
            )));
        }

        Ok(Self { bands })
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn size(&self) -> RasterSize {
        self.bands[0].size()
    }

    /// Zero-based band access.
    pub fn band(&self, index: usize) -> Option<&PixelBlock> {
        self.bands.get(index)
    }

    pub fn first_band(&self) -> &PixelBlock {
        &self.bands[0]
    }

    pub fn bands(&self) -> &[PixelBlock] {
        &self.bands
    }

    pub fn into_bands(self) -> Vec<PixelBlock> {
        self.bands
    }
}

impl From<PixelBlock> for Tile {
    fn from(block: PixelBlock) -> Self {
        Tile::single(block)
    }
}
