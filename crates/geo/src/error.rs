use thiserror::Error;

use crate::{RasterSize, windowing::Window};

/// Error type returned by user supplied window and tile functions.
pub type WorkerError = Box<dyn std::error::Error + Send + Sync>;
pub type WorkerResult<T> = std::result::Result<T, WorkerError>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid window size ({size}): {reason}")]
    InvalidWindowSize { size: usize, reason: &'static str },
    #[error("Invalid sliding window method: '{0}' (expected 'block' or 'moving')")]
    InvalidMethod(String),
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("Worker failed on window {window}: {source}")]
    WorkerFailure {
        window: Window,
        #[source]
        source: WorkerError,
    },
    #[error("Raster dimensions do not match {size1} <-> {size2}")]
    AlignmentError { size1: RasterSize, size2: RasterSize },
    #[error("Invalid path: {0}")]
    InvalidPath(std::path::PathBuf),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Runtime error: {0}")]
    Runtime(String),
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error(transparent)]
    Infra(#[from] inf::Error),
    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    GdalError(#[from] gdal::errors::GdalError),
}
