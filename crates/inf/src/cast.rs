use num::{NumCast, ToPrimitive};

/// Stores the value as `T` and widens it back to f64, which is what a pixel value becomes
/// after being written to a band of type `T`.
/// Fractional values are rounded to the nearest integer for integral types.
/// Returns `None` when the value is NaN or out of range for `T`.
pub fn store_as<T: NumCast + ToPrimitive>(v: f64) -> Option<f64> {
    let stored: T = NumCast::from(v.round())?;
    stored.to_f64()
}
