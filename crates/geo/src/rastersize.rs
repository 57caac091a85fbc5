/// Number of rows of a raster (its height in pixels).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Rows(pub usize);

/// Number of columns of a raster (its width in pixels).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Columns(pub usize);

impl Rows {
    pub const fn count(&self) -> usize {
        self.0
    }
}

impl Columns {
    pub const fn count(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for Rows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Columns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for Rows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rows({})", self.0)
    }
}

impl std::fmt::Debug for Columns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Columns({})", self.0)
    }
}

impl std::ops::Mul<Columns> for Rows {
    type Output = usize;

    fn mul(self, rhs: Columns) -> usize {
        self.0 * rhs.0
    }
}

/// Raster size represented by rows and columns.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RasterSize {
    pub rows: Rows,
    pub cols: Columns,
}

impl RasterSize {
    pub const fn with_rows_cols(rows: Rows, cols: Columns) -> Self {
        RasterSize { rows, cols }
    }

    /// Size of a raster `width` pixels wide and `height` pixels high.
    pub const fn with_width_height(width: usize, height: usize) -> Self {
        RasterSize {
            rows: Rows(height),
            cols: Columns(width),
        }
    }

    pub const fn square(size: usize) -> Self {
        Self::with_width_height(size, size)
    }

    pub const fn empty() -> Self {
        Self::with_width_height(0, 0)
    }

    pub const fn width(&self) -> usize {
        self.cols.count()
    }

    pub const fn height(&self) -> usize {
        self.rows.count()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.count() == 0 || self.cols.count() == 0
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

impl std::fmt::Display for RasterSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(rows: {}, cols: {})", self.rows, self.cols)
    }
}

impl std::fmt::Debug for RasterSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::{Columns, Rows};

    macro_rules! serde_newtype {
        ( $t:ident ) => {
            impl serde::Serialize for $t {
                fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_u64(self.0 as u64)
                }
            }

            impl<'de> serde::Deserialize<'de> for $t {
                fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    let value = u64::deserialize(deserializer)?;
                    Ok($t(value as usize))
                }
            }
        };
    }

    serde_newtype!(Rows);
    serde_newtype!(Columns);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_accessors() {
        let size = RasterSize::with_width_height(10, 4);
        assert_eq!(size.width(), 10);
        assert_eq!(size.height(), 4);
        assert_eq!(size.cell_count(), 40);
        assert!(!size.is_empty());
        assert!(RasterSize::with_width_height(0, 4).is_empty());
        assert_eq!(size.to_string(), "(rows: 4, cols: 10)");
    }
}
