use bgrafx_image::{Bgra, BgraView, BgraViewMut, BYTES_PER_PIXEL};

use super::{
    border::{BorderFill, BorderPolicy},
    kernels::Kernel2d,
};
use crate::{error::FilterError, narrow::Narrowing, parallel};

/// Run a windowed filter over every pixel of `dst`.
///
/// Pixels accepted by `border` get `combine(worker, x, y)`; the others get the
/// `fill` value, read from `src` when copying. Rows are independent and are
/// dispatched with `strategy`; `worker` identifies the executing thread so that
/// `combine` can reach per-worker scratch state.
///
/// The window itself is read by `combine`, which may look at a different
/// buffer than `src` (e.g. a grayscale copy of it).
///
/// PRECONDITION: `src` and `dst` share the same layout.
pub fn apply_windowed<F>(
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    border: BorderPolicy,
    fill: BorderFill,
    strategy: parallel::ExecutionStrategy,
    combine: F,
) -> Result<(), FilterError>
where
    F: Fn(usize, usize, usize) -> Bgra + Send + Sync,
{
    src.layout().check_same(&dst.layout())?;
    let size = src.size();

    parallel::for_each_row(dst, strategy, |worker, y, dst_row| {
        for (x, dst_pixel) in dst_row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            let px = if border.contains(x, y, size) {
                combine(worker, x, y)
            } else {
                fill.pixel(src, x, y)
            };
            px.write_to(dst_pixel);
        }
    })?;

    Ok(())
}

/// Write the border `fill` to every pixel of `dst`.
///
/// Used when no window fits the image, so that no kernel has to be built.
///
/// PRECONDITION: `src` and `dst` share the same layout.
pub fn fill_border(
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    fill: BorderFill,
    strategy: parallel::ExecutionStrategy,
) -> Result<(), FilterError> {
    src.layout().check_same(&dst.layout())?;

    parallel::for_each_row(dst, strategy, |_, y, dst_row| {
        for (x, dst_pixel) in dst_row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            fill.pixel(src, x, y).write_to(dst_pixel);
        }
    })?;

    Ok(())
}

/// Weighted sum of the blue, green and red channels over the window centered at `(x, y)`.
///
/// PRECONDITION: the window lies inside the image.
#[inline]
pub fn bgr_response(window: &BgraView<'_>, kernel: &Kernel2d, x: usize, y: usize) -> [f64; 3] {
    let r = kernel.radius();
    let mut acc = [0.0f64; 3];
    for (ky, wy) in (y - r..=y + r).enumerate() {
        let row = &window.row(wy)[(x - r) * BYTES_PER_PIXEL..(x + r + 1) * BYTES_PER_PIXEL];
        for (px, &w) in row.chunks_exact(BYTES_PER_PIXEL).zip(kernel.row(ky)) {
            acc[0] += px[0] as f64 * w;
            acc[1] += px[1] as f64 * w;
            acc[2] += px[2] as f64 * w;
        }
    }
    acc
}

/// Weighted sum of the green channel over the window centered at `(x, y)`.
///
/// PRECONDITION: the window lies inside the image.
#[inline]
pub fn green_response(window: &BgraView<'_>, kernel: &Kernel2d, x: usize, y: usize) -> f64 {
    let r = kernel.radius();
    let mut acc = 0.0f64;
    for (ky, wy) in (y - r..=y + r).enumerate() {
        let row = &window.row(wy)[(x - r) * BYTES_PER_PIXEL..(x + r + 1) * BYTES_PER_PIXEL];
        for (px, &w) in row.chunks_exact(BYTES_PER_PIXEL).zip(kernel.row(ky)) {
            acc += px[1] as f64 * w;
        }
    }
    acc
}

/// Linear convolution of the color channels, alpha forced to 255.
///
/// Pixels outside the radial window of the kernel are copied from `src`.
pub fn convolve_bgr(
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    kernel: &Kernel2d,
    strategy: parallel::ExecutionStrategy,
    narrowing: Narrowing,
) -> Result<(), FilterError> {
    let border = BorderPolicy::Radial {
        radius: kernel.radius(),
    };
    apply_windowed(src, dst, border, BorderFill::CopyInput, strategy, |_, x, y| {
        let [b, g, r] = bgr_response(src, kernel, x, y);
        Bgra::opaque(narrowing.narrow(b), narrowing.narrow(g), narrowing.narrow(r))
    })
}
