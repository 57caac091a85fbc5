use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use approx::assert_relative_eq;
use geo::{
    ArrayDataType, BandIndex, Error, FIRST_BAND, GeoTransform, GridLayout, GridProvider, GridSink, GridWriter, MemoryGrid,
    MemoryGridSink, MemoryGridWriter, PixelBlock, RasterSize, Result, Tile, band_index,
    windowing::{
        AlgebraOptions, NumWorkers, Window, WindowMethod, WindowOptions, block_windows, moving_windows, raster_calculation, windowing,
    },
};

const NODATA: f64 = -9999.0;

fn source_grid(size: RasterSize, band_count: usize) -> MemoryGrid {
    let bands = (0..band_count)
        .map(|band_nr| {
            PixelBlock::from_fn(size, |row, col| {
                if (row + col + band_nr) % 7 == 0 {
                    NODATA
                } else {
                    ((row * 31 + col * 17 + band_nr * 3) % 101) as f64 * 0.5
                }
            })
        })
        .collect();

    MemoryGrid::from_bands(bands, ArrayDataType::Float32)
        .expect("valid bands")
        .with_geo_transform(GeoTransform::north_up(150000.0, 220000.0, 25.0))
        .with_projection("EPSG:31370")
        .with_nodata(Some(NODATA))
}

/// Wraps the in-memory sink and counts the output grids that are created and closed.
#[derive(Clone, Default)]
struct CountingSink {
    created: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

struct CountingWriter {
    inner: MemoryGridWriter,
    closed: Arc<AtomicUsize>,
}

impl GridSink for CountingSink {
    type Writer = CountingWriter;

    fn create(self, layout: &GridLayout) -> Result<CountingWriter> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(CountingWriter {
            inner: MemoryGridSink.create(layout)?,
            closed: self.closed,
        })
    }
}

impl GridWriter for CountingWriter {
    type Output = MemoryGrid;

    fn set_geo_transform(&mut self, geo_transform: GeoTransform) -> Result {
        self.inner.set_geo_transform(geo_transform)
    }

    fn set_projection(&mut self, projection: &str) -> Result {
        self.inner.set_projection(projection)
    }

    fn set_nodata(&mut self, band: BandIndex, nodata: f64) -> Result {
        self.inner.set_nodata(band, nodata)
    }

    fn write_window(&mut self, band: BandIndex, block: &PixelBlock, x_off: usize, y_off: usize) -> Result {
        self.inner.write_window(band, block, x_off, y_off)
    }

    fn close(self) -> Result<MemoryGrid> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        self.inner.close()
    }
}

#[test_log::test]
fn block_windows_edge_clipping() -> Result {
    let windows: Vec<Window> = block_windows(4, 10, 10)?.collect();
    let expected: Vec<Window> = [
        (0, 0, 4, 4),
        (4, 0, 4, 4),
        (8, 0, 2, 4),
        (0, 4, 4, 4),
        (4, 4, 4, 4),
        (8, 4, 2, 4),
        (0, 8, 4, 2),
        (4, 8, 4, 2),
        (8, 8, 2, 2),
    ]
    .into_iter()
    .map(|(x, y, w, h)| Window::new(x, y, w, h))
    .collect();

    assert_eq!(windows, expected);
    Ok(())
}

#[test_log::test]
fn moving_window_edge() -> Result {
    assert_eq!(moving_windows(3, 5, 5, 1)?.next(), Some(Window::new(0, 0, 2, 2)));
    Ok(())
}

#[test_log::test]
fn identity_round_trip_with_a_single_tile() -> Result {
    let size = RasterSize::with_width_height(13, 9);
    let grid = source_grid(size, 2);

    let opts = AlgebraOptions::builder()
        .tile_size(size.width().max(size.height()))
        .nodata(NODATA)
        .build();
    let output = raster_calculation(&[&grid], MemoryGridSink, opts, |tiles| Ok(tiles[0].clone()))?;

    assert_eq!(output.raster_size(), size);
    assert_eq!(output.band_count(), 2);
    assert_eq!(output.bands(), grid.bands());
    assert_eq!(output.nodata(FIRST_BAND), Some(NODATA));
    assert_eq!(output.nodata(band_index(1)), Some(NODATA));
    assert_eq!(output.geo_transform(), grid.geo_transform());
    assert_eq!(output.projection(), grid.projection());
    Ok(())
}

#[test_log::test]
fn identity_round_trip_with_unit_windows() -> Result {
    let grid = source_grid(RasterSize::with_width_height(8, 5), 1);
    let opts = WindowOptions::builder().window_size(1).build();
    let output = windowing(&grid, MemoryGridSink, opts, |block| Ok(block.as_slice()[0]))?;

    assert_eq!(output, grid);
    Ok(())
}

#[test_log::test]
fn output_does_not_depend_on_worker_count() -> Result {
    let grid = source_grid(RasterSize::with_width_height(37, 23), 2);

    let run = |method: WindowMethod, num_workers: NumWorkers, chunk_granularity: usize| {
        let opts = WindowOptions::builder()
            .window_size(5)
            .method(method)
            .num_workers(num_workers)
            .chunk_granularity(chunk_granularity)
            .data_type(ArrayDataType::Float64)
            .build();
        windowing(&grid, MemoryGridSink, opts, |block| {
            Ok(block.mean(Some(NODATA)).unwrap_or(f64::NAN))
        })
    };

    for method in [WindowMethod::Block, WindowMethod::Moving] {
        let sequential = run(method, NumWorkers::Count(1), 1)?;
        let parallel = run(method, NumWorkers::Count(6), 1)?;
        let coarse = run(method, NumWorkers::Count(3), 4)?;

        for (reference, other) in [(&sequential, &parallel), (&sequential, &coarse)] {
            for (a, b) in reference.bands().iter().zip(other.bands()) {
                assert!(
                    a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits()),
                    "{method} output differs between worker counts"
                );
            }
        }
    }
    Ok(())
}

#[test_log::test]
fn add_two_grids_of_ones() -> Result {
    let size = RasterSize::with_width_height(2500, 3);
    let ones = MemoryGrid::filled_with(size, 1, ArrayDataType::Float32, 1.0);

    let output = raster_calculation(&[&ones, &ones], MemoryGridSink, AlgebraOptions::builder().build(), |tiles| {
        Ok(Tile::single(tiles[0].first_band().zip_map(tiles[1].first_band(), |a, b| a + b)?))
    })?;

    assert_eq!(output.band_count(), 1);
    assert!(output.band(FIRST_BAND)?.iter().all(|&v| v == 2.0));
    Ok(())
}

#[test_log::test]
fn moving_window_mean_keeps_georeference() -> Result {
    let grid = source_grid(RasterSize::with_width_height(6, 4), 1).with_nodata(None);
    let opts = WindowOptions::builder().window_size(3).method(WindowMethod::Moving).build();
    let output = windowing(&grid, MemoryGridSink, opts, |block| Ok(block.mean(None).unwrap_or(f64::NAN)))?;

    assert_eq!(output.raster_size(), grid.raster_size());
    assert_eq!(output.geo_transform(), grid.geo_transform());

    let source = grid.band(FIRST_BAND)?;
    let window = Window::new(1, 0, 3, 2);
    let expected = source.sub_block(&window)?.mean(None).unwrap_or(f64::NAN);
    assert_relative_eq!(output.band(FIRST_BAND)?.value(0, 2).unwrap_or(f64::NAN), expected, epsilon = 1e-4);
    Ok(())
}

#[test_log::test]
fn worker_failure_produces_no_output() {
    let grid = source_grid(RasterSize::with_width_height(20, 20), 1);

    for rows_before_failure in [0, 3] {
        let sink = CountingSink::default();
        let opts = WindowOptions::builder().window_size(2).num_workers(NumWorkers::Count(4)).build();
        let failing_row = rows_before_failure * 2;
        let result = windowing(&grid, sink.clone(), opts, move |block| {
            if block.size() == RasterSize::square(2) && block.as_slice()[0] == grid_value(failing_row, 4) {
                return Err(format!("cannot process row {failing_row}").into());
            }
            Ok(1.0)
        });

        assert!(matches!(result, Err(Error::WorkerFailure { .. })));
        assert_eq!(sink.closed.load(Ordering::SeqCst), 0);
        assert!(sink.created.load(Ordering::SeqCst) <= 1);
    }

    let sink = CountingSink::default();
    let result = raster_calculation(&[&grid], sink.clone(), AlgebraOptions::builder().tile_size(4).build(), |_| {
        panic!("tile function crashed")
    });
    assert!(matches!(result, Err(Error::WorkerFailure { .. })));
    assert_eq!(sink.created.load(Ordering::SeqCst), 0);
    assert_eq!(sink.closed.load(Ordering::SeqCst), 0);
}

fn grid_value(row: usize, col: usize) -> f64 {
    if (row + col) % 7 == 0 {
        NODATA
    } else {
        ((row * 31 + col * 17) % 101) as f64 * 0.5
    }
}

#[test_log::test]
fn invalid_configuration_is_rejected_before_processing() {
    let grid = source_grid(RasterSize::square(5), 1);
    let sink = CountingSink::default();

    let opts = WindowOptions::builder().window_size(4).method(WindowMethod::Moving).build();
    let result = windowing(&grid, sink.clone(), opts, |_| Ok(0.0));
    assert!(matches!(result, Err(Error::InvalidWindowSize { size: 4, .. })));

    let result = "diagonal".parse::<WindowMethod>();
    assert!(matches!(result, Err(Error::InvalidMethod(_))));

    let opts = WindowOptions::builder().window_size(3).num_workers(NumWorkers::Count(0)).build();
    assert!(matches!(windowing(&grid, sink.clone(), opts, |_| Ok(0.0)), Err(Error::InvalidArgument(_))));

    assert_eq!(sink.created.load(Ordering::SeqCst), 0);
}
