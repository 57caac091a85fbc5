use std::str::FromStr;

use inf::ProgressCallback;

use crate::{ArrayDataType, Error};

/// Window topology used to partition a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WindowMethod {
    /// Non-overlapping windows, the output has one pixel per window
    #[default]
    Block,
    /// Overlapping windows centered on every pixel, the output has the size of the input
    Moving,
}

impl WindowMethod {
    pub fn to_str(&self) -> &'static str {
        match self {
            WindowMethod::Block => "block",
            WindowMethod::Moving => "moving",
        }
    }
}

impl std::fmt::Display for WindowMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for WindowMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block" => Ok(WindowMethod::Block),
            "moving" => Ok(WindowMethod::Moving),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

/// Size of the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumWorkers {
    /// One worker per available cpu core
    #[default]
    AllCpus,
    Count(usize),
}

/// Configuration of a [`crate::windowing::windowing`] run.
#[derive(bon::Builder)]
pub struct WindowOptions {
    /// Window extent in pixels, must be odd for moving windows
    pub window_size: usize,
    /// Window topology (default = `WindowMethod::Block`)
    #[builder(default)]
    pub method: WindowMethod,
    /// Pixel type of the output grid (default = `ArrayDataType::Float32`)
    #[builder(default = ArrayDataType::Float32)]
    pub data_type: ArrayDataType,
    /// Output nodata per band.
    /// Empty: use the nodata of the corresponding source band, one value: used for every band,
    /// otherwise one value per band is required.
    #[builder(default)]
    pub nodata: Vec<f64>,
    /// Size of the worker pool (default = `NumWorkers::AllCpus`)
    #[builder(default)]
    pub num_workers: NumWorkers,
    /// Minimum number of windows handed to a worker at once (default = 1)
    #[builder(default = 1)]
    pub chunk_granularity: usize,
    /// Invoked with the number of processed windows after every output row
    pub progress: Option<ProgressCallback>,
}

/// Configuration of a [`crate::windowing::raster_calculation`] run.
#[derive(bon::Builder)]
pub struct AlgebraOptions {
    /// Extent of the square tiles in pixels (default = 1000)
    #[builder(default = 1000)]
    pub tile_size: usize,
    /// Pixel type of the output grid (default = `ArrayDataType::Float32`)
    #[builder(default = ArrayDataType::Float32)]
    pub data_type: ArrayDataType,
    /// Nodata value for every output band
    pub nodata: Option<f64>,
    /// Size of the worker pool (default = `NumWorkers::AllCpus`)
    #[builder(default)]
    pub num_workers: NumWorkers,
    /// Minimum number of tiles handed to a worker at once (default = 1)
    #[builder(default = 1)]
    pub chunk_granularity: usize,
    /// Invoked with the number of processed tiles after every row of tiles
    pub progress: Option<ProgressCallback>,
}
