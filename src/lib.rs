//! Windowed parallel computations on raster grids.
//!
//! The functionality lives in the workspace crates, this crate bundles them:
//! - [`geo`]: the grid model and the windowing engines
//! - [`inf`]: shared infrastructure (temporary files, progress reporting, numeric casts)

pub use geo;
pub use inf;

#[doc(inline)]
pub use geo::{
    ArrayDataType, Error, GridProvider, GridSink, GridWriter, MemoryGrid, MemoryGridSink, PixelBlock, Result, Tile,
    windowing::{
        AlgebraOptions, ArithmeticOp, NumWorkers, Operand, Window, WindowMethod, WindowOptions, arithmetic, raster_calculation,
        windowing,
    },
};

#[cfg(feature = "gdal")]
#[doc(inline)]
pub use geo::{GdalGrid, GdalGridSink};
