use inf::progressinfo::ProgressTracker;
use itertools::Itertools as _;

use crate::{
    ArrayDataType, BandIndex, Error, GridLayout, GridProvider, GridSink, GridWriter, PixelBlock, Result, WorkerResult, band_index,
    windowing::{
        WindowOptions,
        generator::{WindowBlock, WindowGenerator},
        pool::{self, WorkerPool},
    },
};

/// Applies a function to every window of a [`WindowGenerator`] and writes one pixel per window
/// into a newly created grid.
///
/// The windows are processed one output row at a time: the row is computed by the worker pool,
/// its results are collected in window order and written before the next row is started.
/// Any failure aborts the run, the partially written output is dropped and never returned.
pub struct WindowedExecutor<'a, G: GridProvider + ?Sized> {
    generator: WindowGenerator<'a, G>,
    data_type: ArrayDataType,
    nodata: Vec<Option<f64>>,
    pool: WorkerPool,
    progress: ProgressTracker,
}

impl<'a, G: GridProvider + ?Sized> WindowedExecutor<'a, G> {
    pub fn new(grid: &'a G, opts: WindowOptions) -> Result<Self> {
        let generator = WindowGenerator::new(grid, opts.window_size, opts.method)?;
        let nodata = output_nodata(grid, &opts.nodata, opts.data_type)?;
        let pool = WorkerPool::new(opts.num_workers, opts.chunk_granularity)?;
        let progress = ProgressTracker::new(generator.len() as u64, opts.progress);

        Ok(Self {
            generator,
            data_type: opts.data_type,
            nodata,
            pool,
            progress,
        })
    }

    pub fn generator(&self) -> &WindowGenerator<'a, G> {
        &self.generator
    }

    /// Nodata value of every output band, `None` for bands without nodata.
    pub fn output_nodata(&self) -> &[Option<f64>] {
        &self.nodata
    }

    pub fn execute<S, F>(mut self, sink: S, func: F) -> Result<<S::Writer as GridWriter>::Output>
    where
        S: GridSink,
        F: Fn(&PixelBlock) -> WorkerResult<f64> + Sync,
    {
        let output_size = self.generator.output_dimensions();
        let row_width = output_size.width();
        log::debug!(
            "{} windows of size {}: output {output_size} with {} band(s), {} worker(s)",
            self.generator.method(),
            self.generator.window_size(),
            self.generator.band_count(),
            self.pool.worker_count()
        );

        let mut sink = Some(sink);
        let mut writer: Option<S::Writer> = None;
        let mut rows_written = 0;

        if row_width > 0 {
            for chunk in &self.generator.iter().chunks(row_width) {
                let blocks = chunk.collect::<Result<Vec<WindowBlock>>>()?;
                let band = band_index(rows_written / output_size.height());
                let row = rows_written % output_size.height();
                debug_assert!(blocks.iter().all(|b| b.band == band));

                let values = self.pool.map_ordered(blocks, |b| pool::run_job(b.window, || func(&b.block)))?;
                if values.len() != row_width {
                    return Err(Error::ShapeMismatch(format!(
                        "Row {row} of band {band} has {} values, expected {row_width}",
                        values.len()
                    )));
                }

                let row_data = storage_values(values, self.data_type, self.nodata[band.get() - 1], band)?;
                if writer.is_none() {
                    writer = Some(self.create_output(&mut sink)?);
                }

                if let Some(writer) = writer.as_mut() {
                    writer.write_window(band, &PixelBlock::row_vector(row_data), 0, row)?;
                }

                log::trace!("Wrote row {row} of band {band}");
                rows_written += 1;
                self.progress.advance(row_width as u64);
            }
        }

        let writer = match writer {
            Some(writer) => writer,
            None => self.create_output(&mut sink)?,
        };

        writer.close()
    }

    fn create_output<S: GridSink>(&self, sink: &mut Option<S>) -> Result<S::Writer> {
        let sink = sink
            .take()
            .ok_or_else(|| Error::Runtime("The output grid was already created".to_string()))?;

        let layout = GridLayout {
            size: self.generator.output_dimensions(),
            band_count: self.generator.band_count(),
            data_type: self.data_type,
        };

        let grid = self.generator.grid();
        let mut writer = sink.create(&layout)?;
        writer.set_geo_transform(self.generator.output_geo_transform())?;
        writer.set_projection(&grid.projection())?;
        for (band_nr, nodata) in self.nodata.iter().enumerate() {
            if let Some(nodata) = nodata {
                writer.set_nodata(band_index(band_nr), *nodata)?;
            }
        }

        Ok(writer)
    }
}

/// Applies `func` to every window of `grid` and returns the output grid created by `sink`.
///
/// For block windows the output has one pixel per window and a proportionally larger cell size,
/// for moving windows the output has the size and georeference of the input.
pub fn windowing<G, S, F>(grid: &G, sink: S, opts: WindowOptions, func: F) -> Result<<S::Writer as GridWriter>::Output>
where
    G: GridProvider + ?Sized,
    S: GridSink,
    F: Fn(&PixelBlock) -> WorkerResult<f64> + Sync,
{
    WindowedExecutor::new(grid, opts)?.execute(sink, func)
}

/// Converts function results to the values stored in an output band.
/// NaN results mark pixels without a value and become nodata.
pub(super) fn storage_values(values: Vec<f64>, data_type: ArrayDataType, nodata: Option<f64>, band: BandIndex) -> Result<Vec<f64>> {
    values
        .into_iter()
        .map(|v| {
            let v = match nodata {
                Some(nod) if v.is_nan() => nod,
                _ => v,
            };

            data_type
                .cast_value(v)
                .ok_or_else(|| Error::ShapeMismatch(format!("Result {v} of band {band} can not be stored as {data_type}")))
        })
        .collect()
}

/// Resolves the nodata value of every output band.
/// Configured values must be representable in the output type, values inherited from
/// the source that do not fit are dropped with a warning.
fn output_nodata<G: GridProvider + ?Sized>(grid: &G, configured: &[f64], data_type: ArrayDataType) -> Result<Vec<Option<f64>>> {
    let band_count = grid.band_count();

    let check = |nodata: f64| -> Result<Option<f64>> {
        if data_type.can_represent(nodata) {
            Ok(Some(nodata))
        } else {
            Err(Error::InvalidArgument(format!("Nodata value {nodata} can not be stored as {data_type}")))
        }
    };

    match configured {
        [] => Ok((0..band_count)
            .map(|band_nr| {
                let band = band_index(band_nr);
                grid.nodata(band).and_then(|nodata| {
                    if data_type.can_represent(nodata) {
                        Some(nodata)
                    } else {
                        log::warn!("Source nodata {nodata} of band {band} can not be stored as {data_type}, output band has no nodata");
                        None
                    }
                })
            })
            .collect()),
        [nodata] => {
            let nodata = check(*nodata)?;
            Ok(vec![nodata; band_count])
        }
        values if values.len() == band_count => values.iter().map(|&v| check(v)).collect(),
        values => Err(Error::InvalidArgument(format!(
            "Expected 1 or {band_count} nodata values, got {}",
            values.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::{FIRST_BAND, GeoTransform, MemoryGrid, MemoryGridSink, RasterSize, testutils, windowing::WindowMethod};

    use super::*;

    fn block_mean(block: &PixelBlock) -> WorkerResult<f64> {
        Ok(block.mean(None).unwrap_or(f64::NAN))
    }

    #[test_log::test]
    fn block_mean_of_sequential_grid() -> Result {
        let grid = testutils::sequential_grid(RasterSize::with_width_height(4, 3), 1);
        let opts = WindowOptions::builder().window_size(2).build();
        let output = windowing(&grid, MemoryGridSink, opts, block_mean)?;

        assert_eq!(output.raster_size(), RasterSize::with_width_height(2, 2));
        assert_eq!(output.band(FIRST_BAND)?.as_slice(), &[2.5, 4.5, 8.5, 10.5]);
        assert_eq!(output.geo_transform(), GeoTransform::new([100.0, 20.0, 0.0, 500.0, 0.0, -20.0]));
        assert_eq!(output.projection(), testutils::PROJECTION);
        assert_eq!(output.data_type(), ArrayDataType::Float32);
        Ok(())
    }

    #[test_log::test]
    fn moving_sum_over_all_bands() -> Result {
        let grid = testutils::filled_grid(RasterSize::with_width_height(4, 3), 2, 1.0);
        let opts = WindowOptions::builder()
            .window_size(3)
            .method(WindowMethod::Moving)
            .data_type(ArrayDataType::Int16)
            .build();
        let output = windowing(&grid, MemoryGridSink, opts, |block| Ok(block.sum(None).unwrap_or(0.0)))?;

        #[rustfmt::skip]
        let expected = [
            4.0, 6.0, 6.0, 4.0,
            6.0, 9.0, 9.0, 6.0,
            4.0, 6.0, 6.0, 4.0,
        ];
        assert_eq!(output.raster_size(), grid.raster_size());
        assert_eq!(output.band(FIRST_BAND)?.as_slice(), &expected);
        assert_eq!(output.band(band_index(1))?.as_slice(), &expected);
        assert_eq!(output.geo_transform(), grid.geo_transform());
        Ok(())
    }

    #[test_log::test]
    fn nan_results_become_nodata() -> Result {
        let grid = testutils::sequential_grid(RasterSize::with_width_height(3, 1), 1);
        let opts = WindowOptions::builder()
            .window_size(1)
            .data_type(ArrayDataType::Uint8)
            .nodata(vec![255.0])
            .build();
        let output = windowing(&grid, MemoryGridSink, opts, |block| {
            let v = block.as_slice()[0];
            Ok(if v == 1.0 { f64::NAN } else { v })
        })?;

        assert_eq!(output.band(FIRST_BAND)?.as_slice(), &[0.0, 255.0, 2.0]);
        assert_eq!(output.nodata(FIRST_BAND), Some(255.0));
        Ok(())
    }

    #[test_log::test]
    fn unrepresentable_results_are_fatal() {
        let grid = testutils::sequential_grid(RasterSize::with_width_height(3, 1), 1);
        let opts = WindowOptions::builder().window_size(1).data_type(ArrayDataType::Uint8).build();
        let result = windowing(&grid, MemoryGridSink, opts, |_| Ok(-5.0));
        assert!(matches!(result, Err(Error::ShapeMismatch(_))));
    }

    #[test_log::test]
    fn nodata_resolution() -> Result {
        let grid = testutils::sequential_grid(RasterSize::square(2), 2).with_nodata(Some(-9999.0));

        let executor = WindowedExecutor::new(&grid, WindowOptions::builder().window_size(1).build())?;
        assert_eq!(executor.output_nodata(), &[Some(-9999.0), Some(-9999.0)]);

        let opts = WindowOptions::builder().window_size(1).data_type(ArrayDataType::Uint8).build();
        let executor = WindowedExecutor::new(&grid, opts)?;
        assert_eq!(executor.output_nodata(), &[None, None]);

        let opts = WindowOptions::builder().window_size(1).nodata(vec![1.0, 2.0]).build();
        assert_eq!(WindowedExecutor::new(&grid, opts)?.output_nodata(), &[Some(1.0), Some(2.0)]);

        let opts = WindowOptions::builder().window_size(1).nodata(vec![1.0, 2.0, 3.0]).build();
        assert!(matches!(WindowedExecutor::new(&grid, opts), Err(Error::InvalidArgument(_))));

        let opts = WindowOptions::builder()
            .window_size(1)
            .data_type(ArrayDataType::Uint8)
            .nodata(vec![-1.0])
            .build();
        assert!(matches!(WindowedExecutor::new(&grid, opts), Err(Error::InvalidArgument(_))));
        Ok(())
    }

    #[test_log::test]
    fn progress_is_reported_per_row() -> Result {
        let updates = Arc::new(Mutex::new(Vec::new()));
        let recorder = updates.clone();

        let grid = testutils::sequential_grid(RasterSize::with_width_height(5, 3), 2);
        let opts = WindowOptions::builder()
            .window_size(3)
            .method(WindowMethod::Moving)
            .progress(Box::new(move |p: inf::ProgressNotification| {
                recorder.lock().expect("poisoned").push((p.completed, p.total));
            }))
            .build();
        windowing(&grid, MemoryGridSink, opts, block_mean)?;

        let updates = updates.lock().expect("poisoned");
        assert_eq!(updates.len(), 6);
        assert_eq!(updates.first(), Some(&(5, 30)));
        assert_eq!(updates.last(), Some(&(30, 30)));
        Ok(())
    }

    #[test_log::test]
    fn empty_grid_still_produces_output() -> Result {
        let grid = MemoryGrid::new(RasterSize::with_width_height(0, 3), 1, ArrayDataType::Float32);
        let output = windowing(&grid, MemoryGridSink, WindowOptions::builder().window_size(3).build(), block_mean)?;
        assert_eq!(output.raster_size(), RasterSize::with_width_height(0, 1));
        assert_eq!(output.band_count(), 1);
        Ok(())
    }
}
