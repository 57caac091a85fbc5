//! Enumeration of window coordinates over a raster.
//!
//! Both topologies are row-major and clip windows at the raster edges, windows never wrap around.

use crate::{Error, RasterSize, Result};

/// Pixel region of a raster: `width` x `height` pixels starting at column `x_off`, row `y_off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    pub x_off: usize,
    pub y_off: usize,
    pub width: usize,
    pub height: usize,
}

impl Window {
    pub const fn new(x_off: usize, y_off: usize, width: usize, height: usize) -> Self {
        Window {
            x_off,
            y_off,
            width,
            height,
        }
    }

    pub const fn size(&self) -> RasterSize {
        RasterSize::with_width_height(self.width, self.height)
    }

    pub const fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x_off && x < self.x_off + self.width && y >= self.y_off && y < self.y_off + self.height
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x_off, self.y_off, self.width, self.height)
    }
}

/// Non-overlapping windows of `window_size` x `window_size` pixels that together tile the raster.
pub fn block_windows(window_size: usize, width: usize, height: usize) -> Result<BlockWindows> {
    if window_size == 0 {
        return Err(Error::InvalidWindowSize {
            size: window_size,
            reason: "window size must be positive",
        });
    }

    Ok(BlockWindows::new(window_size, width, height))
}

/// One window per visited pixel, centered on that pixel and clipped at the raster edges.
/// Pixels are visited every `step` rows and columns.
pub fn moving_windows(window_size: usize, width: usize, height: usize, step: usize) -> Result<MovingWindows> {
    check_moving_window_size(window_size)?;
    if step == 0 {
        return Err(Error::InvalidArgument("Moving window step must be positive".to_string()));
    }

    Ok(MovingWindows::new(window_size, width, height, step))
}

pub(crate) fn check_moving_window_size(window_size: usize) -> Result {
    if window_size == 0 {
        return Err(Error::InvalidWindowSize {
            size: window_size,
            reason: "window size must be positive",
        });
    }

    if window_size % 2 == 0 {
        return Err(Error::InvalidWindowSize {
            size: window_size,
            reason: "moving windows need an odd window size",
        });
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct BlockWindows {
    window_size: usize,
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    remaining: usize,
}

impl BlockWindows {
    /// Callers guarantee a positive window size.
    pub(crate) fn new(window_size: usize, width: usize, height: usize) -> Self {
        debug_assert!(window_size > 0);
        Self {
            window_size,
            width,
            height,
            x: 0,
            y: 0,
            remaining: width.div_ceil(window_size) * height.div_ceil(window_size),
        }
    }
}

impl Iterator for BlockWindows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.remaining == 0 {
            return None;
        }

        let window = Window::new(
            self.x,
            self.y,
            self.window_size.min(self.width - self.x),
            self.window_size.min(self.height - self.y),
        );

        self.remaining -= 1;
        self.x += self.window_size;
        if self.x >= self.width {
            self.x = 0;
            self.y += self.window_size;
        }

        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for BlockWindows {}

#[derive(Debug, Clone)]
pub struct MovingWindows {
    offset: usize,
    step: usize,
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    remaining: usize,
}

impl MovingWindows {
    /// Callers guarantee an odd window size and a positive step.
    pub(crate) fn new(window_size: usize, width: usize, height: usize, step: usize) -> Self {
        debug_assert!(window_size % 2 == 1 && step > 0);
        Self {
            offset: (window_size - 1) / 2,
            step,
            width,
            height,
            x: 0,
            y: 0,
            remaining: width.div_ceil(step) * height.div_ceil(step),
        }
    }
}

impl Iterator for MovingWindows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.remaining == 0 {
            return None;
        }

        let x1 = self.x.saturating_sub(self.offset);
        let x2 = (self.width - 1).min(self.x + self.offset);
        let y1 = self.y.saturating_sub(self.offset);
        let y2 = (self.height - 1).min(self.y + self.offset);
        let window = Window::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1);

        self.remaining -= 1;
        self.x += self.step;
        if self.x >= self.width {
            self.x = 0;
            self.y += self.step;
        }

        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for MovingWindows {}
