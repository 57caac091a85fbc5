#![warn(clippy::unwrap_used)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Raster grids and the windowed computation engines that run on top of them.
//!
//! Grids are accessed through the [`GridProvider`] (read) and [`GridSink`]/[`GridWriter`] (write)
//! traits, so the engines in [`windowing`] stay independent of the storage format.

pub type Result<T = ()> = std::result::Result<T, Error>;

mod arraydatatype;
mod bandindex;
mod error;
#[cfg(feature = "gdal")]
mod gdalgrid;
mod geotransform;
mod grid;
mod memorygrid;
mod pixelblock;
mod rastersize;
pub mod windowing;

#[cfg(test)]
pub(crate) mod testutils;

#[doc(inline)]
pub use arraydatatype::ArrayDataType;
#[doc(inline)]
pub use bandindex::{BandIndex, FIRST_BAND, band_index};
#[doc(inline)]
pub use error::{Error, WorkerError, WorkerResult};
#[cfg(feature = "gdal")]
#[cfg_attr(docsrs, doc(cfg(feature = "gdal")))]
pub use gdalgrid::{GdalGrid, GdalGridSink, GdalGridWriter};
#[doc(inline)]
pub use geotransform::GeoTransform;
#[doc(inline)]
pub use grid::{GridLayout, GridProvider, GridSink, GridWriter};
#[doc(inline)]
pub use memorygrid::{MemoryGrid, MemoryGridSink, MemoryGridWriter};
#[doc(inline)]
pub use pixelblock::{PixelBlock, Tile, is_nodata};
#[doc(inline)]
pub use rastersize::{Columns, RasterSize, Rows};
