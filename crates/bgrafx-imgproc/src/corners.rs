//! Structure tensor corner detection.
//!
//! This module provides a Shi-Tomasi style corner detector on BGRA images.
//!
//! # Algorithm
//!
//! For every pixel far enough from the border:
//! 1. The Sobel gradients `(Tx, Ty)` of the grayscale image are computed at
//!    every offset of a square window of side `2 * radius + 1`.
//! 2. The products `Tx²`, `Ty²` and `Tx·Ty` are smoothed with a gaussian kernel
//!    of the same size, giving the structure tensor `[[Sxx, Sxy], [Sxy, Syy]]`.
//! 3. The pixel is a corner when the smallest eigenvalue of the tensor exceeds
//!    [`CORNER_EIGENVALUE_THRESHOLD`].
//!
//! Corners are written white, every other pixel opaque black, border included.
//!
//! # References
//!
//! - Shi, J., & Tomasi, C. (1994). Good features to track.
//!   In IEEE Conference on Computer Vision and Pattern Recognition (pp. 593-600).
use bgrafx_image::{Bgra, BgraView, BgraViewMut, ImageAllocator};

use crate::{
    error::FilterError,
    filter::{
        border::{BorderFill, BorderPolicy},
        convolution::{apply_windowed, fill_border, green_response},
        grayscale_scratch,
        kernels::{self, Kernel2d, SOBEL_X_3X3, SOBEL_Y_3X3},
    },
    parallel::{ExecutionStrategy, WorkerLocal},
};

/// Default radius of the corner window.
pub const DEFAULT_CORNER_RADIUS: usize = 3;

/// Smallest eigenvalue a structure tensor must exceed to be a corner.
pub const CORNER_EIGENVALUE_THRESHOLD: f64 = 10_000.0;

/// The gradient products of one window, owned by a single worker.
///
/// The three tensors are square, row-major, and sized to the window. They are
/// zero between two pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureTensorScratch {
    size: usize,
    ixx: Vec<f64>,
    iyy: Vec<f64>,
    ixy: Vec<f64>,
}

impl StructureTensorScratch {
    /// Create zeroed tensors for a window of side `size`.
    pub fn new(size: usize) -> Self {
        let cells = size * size;
        Self {
            size,
            ixx: vec![0.0; cells],
            iyy: vec![0.0; cells],
            ixy: vec![0.0; cells],
        }
    }

    /// The side of the window.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Store the gradient products at `(row, col)` of the window.
    #[inline]
    pub fn accumulate(&mut self, row: usize, col: usize, tx: f64, ty: f64) {
        let idx = row * self.size + col;
        self.ixx[idx] += tx * tx;
        self.iyy[idx] += ty * ty;
        self.ixy[idx] += tx * ty;
    }

    /// Weight the tensors with `kernel` and return `(Sxx, Syy, Sxy)`.
    ///
    /// The tensors are zeroed on the way, ready for the next pixel.
    ///
    /// PRECONDITION: `kernel.size() == self.size()`.
    pub fn smooth_and_reset(&mut self, kernel: &Kernel2d) -> (f64, f64, f64) {
        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        // column-major, the summation order changes the last bits
        for col in 0..self.size {
            for row in 0..self.size {
                let idx = row * self.size + col;
                let w = kernel.get(row, col);
                sxx += w * std::mem::take(&mut self.ixx[idx]);
                syy += w * std::mem::take(&mut self.iyy[idx]);
                sxy += w * std::mem::take(&mut self.ixy[idx]);
            }
        }
        (sxx, syy, sxy)
    }
}

/// The smallest eigenvalue of the symmetric matrix `[[sxx, sxy], [sxy, syy]]`.
///
/// Both roots of `λ² - trace·λ + det` are taken in absolute value. The
/// discriminant is clamped at zero so that rounding never yields NaN: a
/// nearly isotropic tensor gets both eigenvalues equal to `trace / 2`.
///
/// # Examples
///
/// ```
/// use bgrafx_imgproc::corners::min_eigenvalue;
///
/// assert_eq!(min_eigenvalue(4.0, 9.0, 0.0), 4.0);
/// assert_eq!(min_eigenvalue(5.0, 5.0, 3.0), 2.0);
/// ```
pub fn min_eigenvalue(sxx: f64, syy: f64, sxy: f64) -> f64 {
    let det = sxx * syy - sxy * sxy;
    let trace = sxx + syy;
    let disc = (trace * trace - 4.0 * det).max(0.0).sqrt();
    let l1 = ((trace - disc) / 2.0).abs();
    let l2 = ((trace + disc) / 2.0).abs();
    l1.min(l2)
}

struct CornerKernels {
    gaussian: Kernel2d,
    sobel_x: Kernel2d,
    sobel_y: Kernel2d,
}

impl CornerKernels {
    fn new(radius: usize) -> Result<Self, FilterError> {
        Ok(Self {
            gaussian: kernels::gaussian_kernel_2d(kernels::kernel_size(radius)?)?,
            sobel_x: Kernel2d::from_rows(&SOBEL_X_3X3)?,
            sobel_y: Kernel2d::from_rows(&SOBEL_Y_3X3)?,
        })
    }

    /// Smallest eigenvalue of the structure tensor centered at `(x, y)`.
    fn response(
        &self,
        gray: &BgraView<'_>,
        scratch: &mut StructureTensorScratch,
        x: usize,
        y: usize,
    ) -> f64 {
        let r = self.gaussian.radius();
        for (row, wy) in (y - r..=y + r).enumerate() {
            for (col, wx) in (x - r..=x + r).enumerate() {
                let tx = green_response(gray, &self.sobel_x, wx, wy);
                let ty = green_response(gray, &self.sobel_y, wx, wy);
                scratch.accumulate(row, col, tx, ty);
            }
        }
        let (sxx, syy, sxy) = scratch.smooth_and_reset(&self.gaussian);
        min_eigenvalue(sxx, syy, sxy)
    }
}

/// Detect corners with the Shi-Tomasi criterion.
///
/// A pixel is eligible when its window of radius `kernel_radius + 1` fits the
/// radial border test; the extra ring holds the Sobel neighborhood. Eligible
/// pixels become white when their smallest structure tensor eigenvalue exceeds
/// [`CORNER_EIGENVALUE_THRESHOLD`] and opaque black otherwise. Every other
/// pixel is opaque black. When the window fits nowhere, the image is filled
/// black without building kernels or allocating the grayscale buffer.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image.
/// * `kernel_radius` - The radius of the gaussian window.
/// * `strategy` - How the rows are dispatched.
/// * `alloc` - Allocator of the grayscale buffer.
///
/// # Errors
///
/// Returns an allocation error, before writing to `dst`, if the grayscale
/// buffer cannot be allocated, and [`FilterError::InvalidRadius`] if the
/// window side overflows.
///
/// PRECONDITION: `src` and `dst` must have the same layout.
pub fn shi_tomasi_corners<A: ImageAllocator>(
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    kernel_radius: usize,
    strategy: ExecutionStrategy,
    alloc: &A,
) -> Result<(), FilterError> {
    src.layout().check_same(&dst.layout())?;
    log::debug!(
        "shi_tomasi_corners: {} radius={kernel_radius} {strategy:?}",
        src.layout()
    );

    // the extra ring holds the Sobel neighborhood
    let border = kernel_radius
        .checked_add(1)
        .map(|radius| BorderPolicy::Radial { radius })
        .ok_or(FilterError::InvalidRadius(kernel_radius as f64))?;
    if border.is_empty(src.size()) {
        log::debug!("shi_tomasi_corners: radius {kernel_radius} fits nowhere");
        return fill_border(src, dst, BorderFill::Constant(Bgra::BLACK), strategy);
    }

    let kernels = CornerKernels::new(kernel_radius)?;
    let gray = grayscale_scratch(src, strategy, alloc)?;
    let gray = gray.view();

    // one set of tensors per worker of the pool that runs the rows
    let window = kernels.gaussian.size();
    let scratch = WorkerLocal::new(strategy.num_workers(), || {
        StructureTensorScratch::new(window)
    });

    apply_windowed(
        src,
        dst,
        border,
        BorderFill::Constant(Bgra::BLACK),
        strategy,
        |worker, x, y| {
            let lambda = scratch.with(worker, |s| kernels.response(&gray, s, x, y));
            if lambda > CORNER_EIGENVALUE_THRESHOLD {
                Bgra::WHITE
            } else {
                Bgra::BLACK
            }
        },
    )
}
