//! Band index utilities.

/// 1-based raster band index.
///
/// The band api's use a 1-based index for bands. We use `NonZeroUsize` to
/// make it impossible to represent band index 0.
pub type BandIndex = std::num::NonZeroUsize;

/// Convenience constant for the first band (band 1).
pub const FIRST_BAND: BandIndex = std::num::NonZeroUsize::MIN;

/// Band index for the zero-based band number `band_nr`.
pub const fn band_index(band_nr: usize) -> BandIndex {
    FIRST_BAND.saturating_add(band_nr)
}
