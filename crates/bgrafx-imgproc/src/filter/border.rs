use bgrafx_image::{Bgra, BgraView, ImageSize};

/// Decides which pixels have a complete convolution window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderPolicy {
    /// Window validity measured from the image center.
    ///
    /// With `cx = width / 2` and `cy = height / 2`, the pixel `(x, y)` is skipped
    /// when `|x - cx| > cx - radius` or `|cy - y| > cy - radius`. Pixels whose
    /// window would leave the image are skipped as well, which only matters for
    /// even dimensions, where the center test admits one extra column or row.
    Radial {
        /// The radius of the window.
        radius: usize,
    },

    /// Only the outermost ring of pixels is skipped, for 3x3 kernels.
    Ring,
}

impl BorderPolicy {
    /// Whether the pixel at `(x, y)` gets a computed value.
    #[inline]
    pub fn contains(&self, x: usize, y: usize, size: ImageSize) -> bool {
        match *self {
            BorderPolicy::Radial { radius } => {
                let (w, h, r) = (size.width as isize, size.height as isize, radius as isize);
                let (cx, cy) = (w / 2, h / 2);
                let (x, y) = (x as isize, y as isize);

                let radial = (x - cx).abs() <= cx - r && (cy - y).abs() <= cy - r;
                let in_bounds = x >= r && y >= r && x + r < w && y + r < h;
                radial && in_bounds
            }
            BorderPolicy::Ring => {
                x > 0 && y > 0 && x + 1 < size.width && y + 1 < size.height
            }
        }
    }

    /// Whether no pixel of an image of `size` gets a computed value.
    ///
    /// A radial window fits somewhere only when `2 * radius` is below both
    /// dimensions.
    pub fn is_empty(&self, size: ImageSize) -> bool {
        let span = match *self {
            BorderPolicy::Radial { radius } => radius.checked_mul(2),
            BorderPolicy::Ring => Some(2),
        };
        span.map_or(true, |span| span >= size.width || span >= size.height)
    }

    /// The number of pixels around a valid center that its window may read.
    pub fn reach(&self) -> usize {
        match *self {
            BorderPolicy::Radial { radius } => radius,
            BorderPolicy::Ring => 1,
        }
    }
}

/// What a skipped pixel becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderFill {
    /// Copy the input pixel unchanged.
    CopyInput,
    /// Write a fixed pixel.
    Constant(Bgra),
}

impl BorderFill {
    /// The pixel written at `(x, y)` when it is skipped.
    #[inline]
    pub fn pixel(&self, src: &BgraView<'_>, x: usize, y: usize) -> Bgra {
        match *self {
            BorderFill::CopyInput => src.pixel(x, y),
            BorderFill::Constant(px) => px,
        }
    }
}
