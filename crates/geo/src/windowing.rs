//! Windowed raster computations.
//!
//! A source grid is partitioned in windows ([`index`]), every window is handed to a bounded
//! worker pool and the results are written back in row-major order into a newly created grid.
//!
//! - [`windowing`] applies a function to every block or moving window of a single grid ([`WindowGenerator`], [`WindowedExecutor`])
//! - [`raster_calculation`] applies a function to aligned tiles of several grids, the output band count is taken from the first result
//! - [`arithmetic`] performs element-wise arithmetic between a grid and another grid or a scalar

mod algebra;
mod arithmetic;
mod executor;
mod generator;
pub mod index;
mod options;
mod pool;

#[doc(inline)]
pub use algebra::{TiledAlgebraEngine, raster_calculation};
#[doc(inline)]
pub use arithmetic::{ArithmeticOp, Operand, arithmetic};
#[doc(inline)]
pub use executor::{WindowedExecutor, windowing};
#[doc(inline)]
pub use generator::{WindowBlock, WindowGenerator};
#[doc(inline)]
pub use index::{BlockWindows, MovingWindows, Window, block_windows, moving_windows};
#[doc(inline)]
pub use options::{AlgebraOptions, NumWorkers, WindowMethod, WindowOptions};
