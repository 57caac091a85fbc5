use inf::progressinfo::ProgressTracker;

use crate::{
    ArrayDataType, Error, GeoTransform, GridLayout, GridProvider, GridSink, GridWriter, PixelBlock, RasterSize, Result, Tile,
    WorkerResult, band_index,
    windowing::{
        AlgebraOptions,
        executor::storage_values,
        index::{self, Window},
        pool::{self, WorkerPool},
    },
};

/// Evaluates a function on aligned tiles of one or more grids and assembles the resulting tiles in a new grid.
///
/// The number of output bands is a property of the function: the output grid is only created once the
/// first tile was computed, every later tile must produce the same number of bands.
pub struct TiledAlgebraEngine<'a> {
    sources: Vec<&'a dyn GridProvider>,
    size: RasterSize,
    geo_transform: GeoTransform,
    projection: String,
    tile_size: usize,
    data_type: ArrayDataType,
    nodata: Option<f64>,
    pool: WorkerPool,
    progress: ProgressTracker,
}

impl<'a> TiledAlgebraEngine<'a> {
    /// The first source determines the extent and georeference of the output.
    pub fn new(sources: &[&'a dyn GridProvider], opts: AlgebraOptions) -> Result<Self> {
        let Some(master) = sources.first() else {
            return Err(Error::InvalidArgument("Raster calculation needs at least one source grid".to_string()));
        };

        let size = master.raster_size();
        if let Some(other) = sources.iter().find(|g| g.raster_size() != size) {
            return Err(Error::AlignmentError {
                size1: size,
                size2: other.raster_size(),
            });
        }

        if let Some(nodata) = opts.nodata.filter(|&nodata| !opts.data_type.can_represent(nodata)) {
            return Err(Error::InvalidArgument(format!(
                "Nodata value {nodata} can not be stored as {}",
                opts.data_type
            )));
        }

        let tile_count = index::block_windows(opts.tile_size, size.width(), size.height())?.len();
        let pool = WorkerPool::new(opts.num_workers, opts.chunk_granularity)?;

        Ok(Self {
            sources: sources.to_vec(),
            size,
            geo_transform: master.geo_transform(),
            projection: master.projection(),
            tile_size: opts.tile_size,
            data_type: opts.data_type,
            nodata: opts.nodata,
            pool,
            progress: ProgressTracker::new(tile_count as u64, opts.progress),
        })
    }

    /// Tiles are passed to `func` in the order of the sources.
    pub fn execute<S, F>(mut self, sink: S, func: F) -> Result<<S::Writer as GridWriter>::Output>
    where
        S: GridSink,
        F: Fn(&[Tile]) -> WorkerResult<Tile> + Sync,
    {
        let tiles_per_row = self.size.width().div_ceil(self.tile_size);
        log::debug!(
            "Raster calculation on {} source(s) of {}: tiles of {} pixels, {} worker(s)",
            self.sources.len(),
            self.size,
            self.tile_size,
            self.pool.worker_count()
        );

        let windows: Vec<Window> = index::block_windows(self.tile_size, self.size.width(), self.size.height())?.collect();

        let mut sink = Some(sink);
        let mut output: Option<(S::Writer, usize)> = None;

        for row in windows.chunks(tiles_per_row.max(1)) {
            let jobs = row
                .iter()
                .map(|window| Ok((*window, self.read_tiles(window)?)))
                .collect::<Result<Vec<_>>>()?;

            let results = self
                .pool
                .map_ordered(jobs, |(window, tiles)| Ok((window, pool::run_job(window, || func(&tiles))?)))?;

            for (window, tile) in results {
                if tile.size() != window.size() {
                    return Err(Error::ShapeMismatch(format!(
                        "Result tile of window {window} has size {}, expected {}",
                        tile.size(),
                        window.size()
                    )));
                }

                if output.is_none() {
                    let band_count = tile.band_count();
                    log::debug!("Output grid has {band_count} band(s)");
                    output = Some((self.create_output(&mut sink, band_count)?, band_count));
                }

                let Some((writer, band_count)) = output.as_mut() else {
                    return Err(Error::Runtime("The output grid was not created".to_string()));
                };

                if tile.band_count() != *band_count {
                    return Err(Error::ShapeMismatch(format!(
                        "Result tile of window {window} has {} band(s), expected {band_count}",
                        tile.band_count()
                    )));
                }

                for (band_nr, block) in tile.into_bands().into_iter().enumerate() {
                    let band = band_index(band_nr);
                    let size = block.size();
                    let values = storage_values(block.into_vec(), self.data_type, self.nodata, band)?;
                    writer.write_window(band, &PixelBlock::new(size, values)?, window.x_off, window.y_off)?;
                }
            }

            log::trace!("Wrote tile row at y offset {}", row[0].y_off);
            self.progress.advance(row.len() as u64);
        }

        let writer = match output {
            Some((writer, _)) => writer,
            None => {
                // no tiles, so the function never revealed its band count
                let band_count = self.sources.iter().map(|g| g.band_count()).max().unwrap_or(1);
                self.create_output(&mut sink, band_count)?
            }
        };

        writer.close()
    }

    fn read_tiles(&self, window: &Window) -> Result<Vec<Tile>> {
        self.sources.iter().map(|grid| grid.read_tile(window)).collect()
    }

    fn create_output<S: GridSink>(&self, sink: &mut Option<S>, band_count: usize) -> Result<S::Writer> {
        let sink = sink
            .take()
            .ok_or_else(|| Error::Runtime("The output grid was already created".to_string()))?;

        let mut writer = sink.create(&GridLayout {
            size: self.size,
            band_count,
            data_type: self.data_type,
        })?;

        writer.set_geo_transform(self.geo_transform)?;
        writer.set_projection(&self.projection)?;
        if let Some(nodata) = self.nodata {
            for band_nr in 0..band_count {
                writer.set_nodata(band_index(band_nr), nodata)?;
            }
        }

        Ok(writer)
    }
}

/// Evaluates `func` tile by tile over the aligned `sources` and returns the output grid created by `sink`.
pub fn raster_calculation<S, F>(
    sources: &[&dyn GridProvider],
    sink: S,
    opts: AlgebraOptions,
    func: F,
) -> Result<<S::Writer as GridWriter>::Output>
where
    S: GridSink,
    F: Fn(&[Tile]) -> WorkerResult<Tile> + Sync,
{
    TiledAlgebraEngine::new(sources, opts)?.execute(sink, func)
}
