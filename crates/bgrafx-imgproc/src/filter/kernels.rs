use bgrafx_image::ImageError;

use crate::error::FilterError;

/// Laplacian kernel, second order derivative in both directions.
pub const LAPLACIAN_3X3: [[f64; 3]; 3] = [[-1.0, -1.0, -1.0], [-1.0, 8.0, -1.0], [-1.0, -1.0, -1.0]];

/// Sobel kernel for the horizontal gradient, indexed `[dy][dx]`.
pub const SOBEL_X_3X3: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];

/// Sobel kernel for the vertical gradient, indexed `[dy][dx]`.
pub const SOBEL_Y_3X3: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// A square convolution kernel of side `2 * radius + 1`, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel2d {
    size: usize,
    data: Vec<f64>,
}

impl Kernel2d {
    /// Create a kernel from row-major weights.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidKernelSize`] if `size` is even or zero, or
    /// if `data` does not hold `size * size` weights.
    pub fn new(size: usize, data: Vec<f64>) -> Result<Self, FilterError> {
        check_kernel_size(size)?;
        if data.len() != size * size {
            return Err(FilterError::InvalidKernelSize(size));
        }
        Ok(Self { size, data })
    }

    /// Create a kernel from a fixed-size matrix.
    pub fn from_rows<const N: usize>(rows: &[[f64; N]; N]) -> Result<Self, FilterError> {
        Self::new(N, rows.iter().flatten().copied().collect())
    }

    /// The side length of the kernel.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The radius of the kernel, `(size - 1) / 2`.
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// The weight at `row`, `col`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.size + col]
    }

    /// The weights of row `row`.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.size..(row + 1) * self.size]
    }

    /// The weights in row-major order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// The sum of every weight.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

/// The side length `2 * radius + 1` of a kernel with the given radius.
///
/// # Errors
///
/// Returns [`FilterError::InvalidRadius`] if the side does not fit in a `usize`.
pub fn kernel_size(radius: usize) -> Result<usize, FilterError> {
    radius
        .checked_mul(2)
        .and_then(|d| d.checked_add(1))
        .ok_or(FilterError::InvalidRadius(radius as f64))
}

/// Reserve room for the `size * size` weights of a kernel.
fn weights_buffer(size: usize) -> Result<Vec<f64>, FilterError> {
    let cells = size
        .checked_mul(size)
        .ok_or(FilterError::InvalidKernelSize(size))?;
    let mut data = Vec::new();
    data.try_reserve_exact(cells).map_err(|_| {
        ImageError::AllocationFailed(cells.saturating_mul(std::mem::size_of::<f64>()))
    })?;
    Ok(data)
}

fn check_kernel_size(size: usize) -> Result<(), FilterError> {
    if size == 0 || size % 2 == 0 {
        return Err(FilterError::InvalidKernelSize(size));
    }
    Ok(())
}

/// Create a normalized gaussian kernel.
///
/// The radius is `(size - 1) / 2` and sigma is a third of the radius. Each
/// weight is `exp(-(x² + y²) / 2σ²) / 2πσ²`, then every weight is divided by
/// the sum of the raw weights. A kernel of size one is the identity `[1.0]`.
///
/// # Arguments
///
/// * `kernel_size` - The side length of the kernel, odd and positive.
///
/// # Examples
///
/// ```
/// use bgrafx_imgproc::filter::kernels::gaussian_kernel_2d;
///
/// let kernel = gaussian_kernel_2d(5).unwrap();
/// assert_eq!(kernel.radius(), 2);
/// assert!((kernel.sum() - 1.0).abs() < 1e-12);
/// ```
pub fn gaussian_kernel_2d(kernel_size: usize) -> Result<Kernel2d, FilterError> {
    check_kernel_size(kernel_size)?;
    if kernel_size == 1 {
        return Kernel2d::new(1, vec![1.0]);
    }

    let radius = (kernel_size - 1) as f64 / 2.0;
    let sigma = radius / 3.0;
    let dsq_sigma = 2.0 * sigma * sigma;
    let k = 1.0 / (std::f64::consts::PI * dsq_sigma);

    let mut data = weights_buffer(kernel_size)?;
    let mut total = 0.0;
    for i in 0..kernel_size {
        let y = radius - i as f64;
        for j in 0..kernel_size {
            let x = j as f64 - radius;
            let g = k * (-(x * x + y * y) / dsq_sigma).exp();
            total += g;
            data.push(g);
        }
    }

    // normalize so that the weights sum to one
    data.iter_mut().for_each(|w| *w /= total);

    Kernel2d::new(kernel_size, data)
}

/// Create a normalized box kernel where every weight is `1 / size²`.
pub fn box_kernel_2d(kernel_size: usize) -> Result<Kernel2d, FilterError> {
    check_kernel_size(kernel_size)?;
    let mut data = weights_buffer(kernel_size)?;
    let cells = kernel_size * kernel_size;
    data.resize(cells, 1.0 / cells as f64);
    Kernel2d::new(kernel_size, data)
}
