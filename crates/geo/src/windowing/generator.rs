use crate::{
    BandIndex, GeoTransform, GridProvider, PixelBlock, RasterSize, Result, band_index,
    windowing::{
        WindowMethod,
        index::{self, BlockWindows, MovingWindows, Window},
    },
};

/// The pixels of one window of one band.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowBlock {
    pub band: BandIndex,
    pub window: Window,
    pub block: PixelBlock,
}

enum Windows {
    Block(BlockWindows),
    Moving(MovingWindows),
}

impl Iterator for Windows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        match self {
            Windows::Block(windows) => windows.next(),
            Windows::Moving(windows) => windows.next(),
        }
    }
}

/// Windows of a single grid for one window method, together with the layout of the grid that
/// receives one pixel per window.
pub struct WindowGenerator<'a, G: GridProvider + ?Sized> {
    grid: &'a G,
    window_size: usize,
    method: WindowMethod,
    output_size: RasterSize,
    output_geo_transform: GeoTransform,
}

impl<'a, G: GridProvider + ?Sized> WindowGenerator<'a, G> {
    pub fn new(grid: &'a G, window_size: usize, method: WindowMethod) -> Result<Self> {
        let source_size = grid.raster_size();
        let (output_size, output_geo_transform) = match method {
            WindowMethod::Block => {
                index::block_windows(window_size, source_size.width(), source_size.height())?;
                (
                    RasterSize::with_width_height(
                        source_size.width().div_ceil(window_size),
                        source_size.height().div_ceil(window_size),
                    ),
                    grid.geo_transform().with_cells_scaled_by(window_size),
                )
            }
            WindowMethod::Moving => {
                index::check_moving_window_size(window_size)?;
                (source_size, grid.geo_transform())
            }
        };

        Ok(Self {
            grid,
            window_size,
            method,
            output_size,
            output_geo_transform,
        })
    }

    pub fn grid(&self) -> &'a G {
        self.grid
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn method(&self) -> WindowMethod {
        self.method
    }

    pub fn band_count(&self) -> usize {
        self.grid.band_count()
    }

    /// Size of the grid holding one pixel per window.
    pub fn output_dimensions(&self) -> RasterSize {
        self.output_size
    }

    pub fn output_geo_transform(&self) -> GeoTransform {
        self.output_geo_transform
    }

    /// Number of windows over all bands.
    pub fn len(&self) -> usize {
        self.output_size.cell_count() * self.band_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The windows of a single band in row-major order.
    pub fn windows(&self) -> impl Iterator<Item = Window> + use<G> {
        let size = self.grid.raster_size();
        match self.method {
            WindowMethod::Block => Windows::Block(BlockWindows::new(self.window_size, size.width(), size.height())),
            WindowMethod::Moving => Windows::Moving(MovingWindows::new(self.window_size, size.width(), size.height(), 1)),
        }
    }

    /// Reads the pixels of every window, band by band and row-major within a band.
    pub fn iter(&self) -> impl Iterator<Item = Result<WindowBlock>> + '_ {
        (0..self.band_count()).flat_map(move |band_nr| {
            let band = band_index(band_nr);
            self.windows().map(move |window| {
                self.grid
                    .read_window(band, &window)
                    .map(|block| WindowBlock { band, window, block })
            })
        })
    }
}
