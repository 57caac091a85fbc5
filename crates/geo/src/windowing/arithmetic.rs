use std::str::FromStr;

use crate::{
    ArrayDataType, Error, GridProvider, GridSink, GridWriter, PixelBlock, Result, Tile, WorkerResult, band_index, is_nodata,
    windowing::{AlgebraOptions, NumWorkers, TiledAlgebraEngine},
};

const ARITHMETIC_TILE_SIZE: usize = 1000;

/// Right hand side of an arithmetic operation.
#[derive(Clone, Copy)]
pub enum Operand<'a> {
    Grid(&'a dyn GridProvider),
    Scalar(f64),
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

impl<'a, G: GridProvider> From<&'a G> for Operand<'a> {
    fn from(grid: &'a G) -> Self {
        Operand::Grid(grid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOp {
    /// Applies the operation in single precision, overflow saturates to infinity.
    pub fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        let (lhs, rhs) = (lhs as f32, rhs as f32);
        let result = match self {
            ArithmeticOp::Add => lhs + rhs,
            ArithmeticOp::Sub => lhs - rhs,
            ArithmeticOp::Mul => lhs * rhs,
            ArithmeticOp::Div => lhs / rhs,
        };

        result as f64
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Mul => "mul",
            ArithmeticOp::Div => "div",
        }
    }
}

impl std::fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for ArithmeticOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" | "+" => Ok(ArithmeticOp::Add),
            "sub" | "-" => Ok(ArithmeticOp::Sub),
            "mul" | "*" => Ok(ArithmeticOp::Mul),
            "div" | "truediv" | "/" => Ok(ArithmeticOp::Div),
            _ => Err(Error::InvalidArgument(format!("Unsupported arithmetic operation: {s}"))),
        }
    }
}

/// Element-wise `lhs op rhs`, band by band, stored as `Float32`.
///
/// A grid operand must have the extent of `lhs` and either the same number of bands or a single band
/// that is combined with every band of `lhs`. Nodata pixels of either side are nodata in the output.
pub fn arithmetic<S: GridSink>(
    lhs: &dyn GridProvider,
    op: ArithmeticOp,
    rhs: Operand<'_>,
    sink: S,
    num_workers: NumWorkers,
) -> Result<<S::Writer as GridWriter>::Output> {
    let band_count = lhs.band_count();
    let lhs_nodata: Vec<Option<f64>> = (0..band_count).map(|nr| lhs.nodata(band_index(nr))).collect();

    let (sources, rhs_nodata): (Vec<&dyn GridProvider>, Vec<Option<f64>>) = match rhs {
        Operand::Grid(grid) => {
            if grid.band_count() != band_count && grid.band_count() != 1 {
                return Err(Error::ShapeMismatch(format!(
                    "Can not {op} a grid with {} band(s) to a grid with {band_count} band(s)",
                    grid.band_count()
                )));
            }

            let nodata = (0..grid.band_count()).map(|nr| grid.nodata(band_index(nr))).collect();
            (vec![lhs, grid], nodata)
        }
        Operand::Scalar(_) => (vec![lhs], Vec::new()),
    };

    let output_nodata = arithmetic_nodata(lhs_nodata.first().copied().flatten(), rhs_nodata.first().copied().flatten());
    log::debug!("Arithmetic {op} on {band_count} band(s), output nodata {output_nodata:?}");

    let opts = AlgebraOptions::builder()
        .tile_size(ARITHMETIC_TILE_SIZE)
        .data_type(ArrayDataType::Float32)
        .maybe_nodata(output_nodata)
        .num_workers(num_workers)
        .build();

    let fill = output_nodata.unwrap_or(f64::NAN);
    let scalar = match rhs {
        Operand::Scalar(value) => Some(value),
        Operand::Grid(_) => None,
    };

    TiledAlgebraEngine::new(&sources, opts)?.execute(sink, |tiles: &[Tile]| -> WorkerResult<Tile> {
        let bands = tiles[0]
            .bands()
            .iter()
            .enumerate()
            .map(|(index, lhs_block)| {
                let lhs_nod = lhs_nodata[index];
                match scalar {
                    Some(value) => Ok(lhs_block.map(|v| if is_nodata(v, lhs_nod) { fill } else { op.apply(v, value) })),
                    None => {
                        let rhs_index = if rhs_nodata.len() == 1 { 0 } else { index };
                        let rhs_nod = rhs_nodata[rhs_index];
                        let rhs_block = tiles[1]
                            .band(rhs_index)
                            .ok_or_else(|| Error::ShapeMismatch(format!("Missing band {} of the right hand side", rhs_index + 1)))?;

                        lhs_block.zip_map(rhs_block, |l, r| {
                            if is_nodata(l, lhs_nod) || is_nodata(r, rhs_nod) {
                                fill
                            } else {
                                op.apply(l, r)
                            }
                        })
                    }
                }
            })
            .collect::<Result<Vec<PixelBlock>>>()?;

        Ok(Tile::from_bands(bands)?)
    })
}

/// The output uses the nodata of the left hand side, or else that of the right hand side.
/// Values that do not fit in `Float32` are replaced by NaN.
fn arithmetic_nodata(lhs: Option<f64>, rhs: Option<f64>) -> Option<f64> {
    let nodata = lhs.or(rhs)?;
    if ArrayDataType::Float32.can_represent(nodata) {
        Some(nodata)
    } else {
        log::warn!("Nodata {nodata} can not be stored as float32, using NaN");
        Some(f64::NAN)
    }
}
