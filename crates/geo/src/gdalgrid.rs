use std::path::{Path, PathBuf};

use gdal::{
    Dataset, DriverManager,
    errors::GdalError,
    raster::{Buffer, GdalDataType, GdalType},
};
use inf::fs::TempFile;
use num::NumCast;

use crate::{
    ArrayDataType, BandIndex, Error, GeoTransform, GridLayout, GridProvider, GridSink, GridWriter, PixelBlock, RasterSize, Result,
    windowing::Window,
};

impl TryFrom<GdalDataType> for ArrayDataType {
    type Error = Error;

    fn try_from(value: GdalDataType) -> Result<Self> {
        match value {
            GdalDataType::UInt8 => Ok(ArrayDataType::Uint8),
            GdalDataType::UInt16 => Ok(ArrayDataType::Uint16),
            GdalDataType::UInt32 => Ok(ArrayDataType::Uint32),
            GdalDataType::UInt64 => Ok(ArrayDataType::Uint64),
            GdalDataType::Int8 => Ok(ArrayDataType::Int8),
            GdalDataType::Int16 => Ok(ArrayDataType::Int16),
            GdalDataType::Int32 => Ok(ArrayDataType::Int32),
            GdalDataType::Int64 => Ok(ArrayDataType::Int64),
            GdalDataType::Float32 => Ok(ArrayDataType::Float32),
            GdalDataType::Float64 => Ok(ArrayDataType::Float64),
            GdalDataType::Unknown => Err(Error::Runtime(format!("Unknown GDAL data type: {value:?}"))),
        }
    }
}

fn open_dataset(path: &Path) -> Result<Dataset> {
    Dataset::open(path).map_err(|err| match err {
        GdalError::NullPointer { .. } if !path.exists() => Error::InvalidPath(path.to_path_buf()),
        _ => Error::Runtime(format!("Failed to open raster dataset: {} ({err})", path.to_string_lossy())),
    })
}

/// Grid backed by a raster file that is read through GDAL.
///
/// The layout of the file is read once when the grid is opened.
pub struct GdalGrid {
    ds: Dataset,
    path: PathBuf,
    size: RasterSize,
    data_type: ArrayDataType,
    nodata: Vec<Option<f64>>,
    geo_transform: GeoTransform,
    projection: String,
    // dropped after the dataset is closed
    temp_file: Option<TempFile>,
}

impl GdalGrid {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_dataset(open_dataset(path.as_ref())?, path.as_ref().to_path_buf(), None)
    }

    fn from_dataset(ds: Dataset, path: PathBuf, temp_file: Option<TempFile>) -> Result<Self> {
        let (width, height) = ds.raster_size();
        let band_count = ds.raster_count();
        if band_count == 0 {
            return Err(Error::InvalidArgument(format!("Raster {} has no bands", path.display())));
        }

        let data_type = ds.rasterband(1)?.band_type().try_into()?;
        let nodata = (1..=band_count)
            .map(|band_nr| Ok(ds.rasterband(band_nr)?.no_data_value()))
            .collect::<Result<Vec<_>>>()?;
        // files without georeference report an error, use the identity transform for those
        let geo_transform = ds.geo_transform().map(GeoTransform::from).unwrap_or_default();
        let projection = ds.projection();

        Ok(Self {
            ds,
            path,
            size: RasterSize::with_width_height(width, height),
            data_type,
            nodata,
            geo_transform,
            projection,
            temp_file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the grid lives in a temporary file that is removed when the grid is dropped.
    pub fn is_temporary(&self) -> bool {
        self.temp_file.is_some()
    }

    /// Closes the grid and moves a temporary grid to `destination`.
    /// A grid that is not temporary is copied, the original file stays in place.
    pub fn keep(self, destination: impl AsRef<Path>) -> Result<PathBuf> {
        let GdalGrid { ds, path, temp_file, .. } = self;
        drop(ds);

        match temp_file {
            Some(temp_file) => Ok(temp_file.keep(destination)?),
            None => {
                let destination = destination.as_ref();
                inf::fs::create_directory_for_file(destination)?;
                std::fs::copy(&path, destination)?;
                Ok(destination.to_path_buf())
            }
        }
    }
}

impl GridProvider for GdalGrid {
    fn raster_size(&self) -> RasterSize {
        self.size
    }

    fn band_count(&self) -> usize {
        self.nodata.len()
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
        if window.x_off + window.width > self.size.width() || window.y_off + window.height > self.size.height() {
            return Err(Error::InvalidArgument(format!(
                "Window {window} is outside of the raster {}",
                self.size
            )));
        }

        let buffer = self.ds.rasterband(band.get())?.read_as::<f64>(
            (window.x_off as isize, window.y_off as isize),
            (window.width, window.height),
            (window.width, window.height),
            None,
        )?;

        let (_, data) = buffer.into_shape_and_vec();
        PixelBlock::new(window.size(), data)
    }
}

enum Destination {
    File(PathBuf),
    Temporary(TempFile),
}

/// Creates output grids with a GDAL driver, either at a fixed path or in a temporary file.
pub struct GdalGridSink {
    destination: Destination,
    driver: String,
}

impl GdalGridSink {
    pub fn new(path: impl Into<PathBuf>, driver: &str) -> Self {
        Self {
            destination: Destination::File(path.into()),
            driver: driver.to_string(),
        }
    }

    /// The output is written to a temporary file that lives as long as the returned grid,
    /// use [`GdalGrid::keep`] to preserve it.
    pub fn temporary(driver: &str, extension: &str) -> Result<Self> {
        Ok(Self {
            destination: Destination::Temporary(TempFile::with_extension(extension)?),
            driver: driver.to_string(),
        })
    }

    /// Location of the grid that will be created.
    pub fn path(&self) -> &Path {
        match &self.destination {
            Destination::File(path) => path,
            Destination::Temporary(temp_file) => temp_file.path(),
        }
    }
}

impl GridSink for GdalGridSink {
    type Writer = GdalGridWriter;

    fn create(self, layout: &GridLayout) -> Result<GdalGridWriter> {
        let driver = DriverManager::get_driver_by_name(&self.driver)?;
        // a fixed destination is staged next to its final path and moved there on close
        let (temp_file, destination) = match self.destination {
            Destination::File(path) => {
                let dir = match path.parent() {
                    Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
                    _ => PathBuf::from("."),
                };
                let extension = path.extension().map(|ext| ext.to_string_lossy().into_owned()).unwrap_or_default();
                (TempFile::in_directory(dir, &extension)?, Some(path))
            }
            Destination::Temporary(temp_file) => (temp_file, None),
        };
        let path = temp_file.path().to_path_buf();

        let (width, height, bands) = (layout.size.width(), layout.size.height(), layout.band_count);
        let ds = match layout.data_type {
            ArrayDataType::Int8 => driver.create_with_band_type::<i8, _>(&path, width, height, bands),
            ArrayDataType::Uint8 => driver.create_with_band_type::<u8, _>(&path, width, height, bands),
            ArrayDataType::Int16 => driver.create_with_band_type::<i16, _>(&path, width, height, bands),
            ArrayDataType::Uint16 => driver.create_with_band_type::<u16, _>(&path, width, height, bands),
            ArrayDataType::Int32 => driver.create_with_band_type::<i32, _>(&path, width, height, bands),
            ArrayDataType::Uint32 => driver.create_with_band_type::<u32, _>(&path, width, height, bands),
            ArrayDataType::Int64 => driver.create_with_band_type::<i64, _>(&path, width, height, bands),
            ArrayDataType::Uint64 => driver.create_with_band_type::<u64, _>(&path, width, height, bands),
            ArrayDataType::Float32 => driver.create_with_band_type::<f32, _>(&path, width, height, bands),
            ArrayDataType::Float64 => driver.create_with_band_type::<f64, _>(&path, width, height, bands),
        }?;

        log::debug!("Created {} output grid {} ({})", self.driver, path.display(), layout.size);
        Ok(GdalGridWriter {
            ds,
            data_type: layout.data_type,
            temp_file,
            destination,
        })
    }
}

pub struct GdalGridWriter {
    ds: Dataset,
    data_type: ArrayDataType,
    // removed on drop when the writer is not closed
    temp_file: TempFile,
    destination: Option<PathBuf>,
}

impl GdalGridWriter {
    fn write_as<T: GdalType + NumCast + Copy>(&mut self, band: BandIndex, block: &PixelBlock, x_off: usize, y_off: usize) -> Result {
        let data = block
            .iter()
            .map(|&v| {
                T::from(v).ok_or_else(|| Error::InvalidArgument(format!("Pixel value {v} can not be stored as {}", self.data_type)))
            })
            .collect::<Result<Vec<T>>>()?;

        let mut buffer = Buffer::new((block.width(), block.height()), data);
        self.ds
            .rasterband(band.get())?
            .write((x_off as isize, y_off as isize), (block.width(), block.height()), &mut buffer)?;
        Ok(())
    }
}

impl GridWriter for GdalGridWriter {
    type Output = GdalGrid;

    fn set_geo_transform(&mut self, geo_transform: GeoTransform) -> Result {
        self.ds.set_geo_transform(&geo_transform.coefficients())?;
        Ok(())
    }

    fn set_projection(&mut self, projection: &str) -> Result {
        if !projection.is_empty() {
            self.ds.set_projection(projection)?;
        }
        Ok(())
    }

    fn set_nodata(&mut self, band: BandIndex, nodata: f64) -> Result {
        if !self.data_type.can_represent(nodata) {
            return Err(Error::InvalidArgument(format!(
                "Nodata value {nodata} can not be stored as {}",
                self.data_type
            )));
        }

        self.ds.rasterband(band.get())?.set_no_data_value(Some(nodata))?;
        Ok(())
    }

    fn write_window(&mut self, band: BandIndex, block: &PixelBlock, x_off: usize, y_off: usize) -> Result {
        match self.data_type {
            ArrayDataType::Int8 => self.write_as::<i8>(band, block, x_off, y_off),
            ArrayDataType::Uint8 => self.write_as::<u8>(band, block, x_off, y_off),
            ArrayDataType::Int16 => self.write_as::<i16>(band, block, x_off, y_off),
            ArrayDataType::Uint16 => self.write_as::<u16>(band, block, x_off, y_off),
            ArrayDataType::Int32 => self.write_as::<i32>(band, block, x_off, y_off),
            ArrayDataType::Uint32 => self.write_as::<u32>(band, block, x_off, y_off),
            ArrayDataType::Int64 => self.write_as::<i64>(band, block, x_off, y_off),
            ArrayDataType::Uint64 => self.write_as::<u64>(band, block, x_off, y_off),
            ArrayDataType::Float32 => self.write_as::<f32>(band, block, x_off, y_off),
            ArrayDataType::Float64 => self.write_as::<f64>(band, block, x_off, y_off),
        }
    }

    /// Closes the dataset so everything is flushed to disk, moves it to its destination and reopens it for reading.
    fn close(self) -> Result<GdalGrid> {
        let GdalGridWriter {
            ds,
            temp_file,
            destination,
            ..
        } = self;
        drop(ds);

        match destination {
            Some(destination) => {
                let path = temp_file.keep(destination)?;
                GdalGrid::from_dataset(open_dataset(&path)?, path, None)
            }
            None => {
                let path = temp_file.path().to_path_buf();
                GdalGrid::from_dataset(open_dataset(&path)?, path, Some(temp_file))
            }
        }
    }
}
