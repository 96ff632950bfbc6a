use bgrafx_image::{Bgra, BgraImage, BgraView, BgraViewMut, ImageAllocator};

use super::{
    border::{BorderFill, BorderPolicy},
    convolution::{apply_windowed, convolve_bgr, fill_border, green_response},
    kernels::{self, Kernel2d, LAPLACIAN_3X3, SOBEL_X_3X3, SOBEL_Y_3X3},
};
use crate::{color::gray_from_bgra, error::FilterError, narrow::Narrowing, parallel};

/// Default radius of the gaussian blur kernel.
pub const DEFAULT_BLUR_RADIUS: usize = 2;

/// Default radius of the box blur kernel.
pub const DEFAULT_BOX_RADIUS: usize = 1;

/// Edge response a pixel must exceed to be kept by the edge detectors.
pub const EDGE_THRESHOLD: f64 = 0.20 * 255.0;

/// Blur an image using a gaussian kernel of side `2 * radius + 1`.
///
/// Pixels closer to the border than `radius`, measured from the image center,
/// are copied unchanged. The others get the weighted sum of their window in
/// each color channel, narrowed to a byte, with alpha 255. When the window fits
/// nowhere in the image, the whole image is copied and no kernel is built.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image.
/// * `radius` - The radius of the kernel.
/// * `strategy` - How the rows are dispatched.
/// * `narrowing` - How the accumulators become bytes.
///
/// # Errors
///
/// Returns [`FilterError::InvalidRadius`] if `2 * radius + 1` overflows.
///
/// PRECONDITION: `src` and `dst` must have the same layout.
pub fn gaussian_blur(
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    radius: usize,
    strategy: parallel::ExecutionStrategy,
    narrowing: Narrowing,
) -> Result<(), FilterError> {
    log::debug!(
        "gaussian_blur: {} radius={radius} {strategy:?}",
        src.layout()
    );
    let size = kernels::kernel_size(radius)?;
    if (BorderPolicy::Radial { radius }).is_empty(src.size()) {
        log::debug!("gaussian_blur: radius {radius} fits nowhere, copying the input");
        return fill_border(src, dst, BorderFill::CopyInput, strategy);
    }
    let kernel = kernels::gaussian_kernel_2d(size)?;
    convolve_bgr(src, dst, &kernel, strategy, narrowing)
}

/// Blur an image using a box kernel of side `2 * radius + 1`.
///
/// Same border handling as [`gaussian_blur`].
///
/// PRECONDITION: `src` and `dst` must have the same layout.
pub fn box_blur(
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    radius: usize,
    strategy: parallel::ExecutionStrategy,
    narrowing: Narrowing,
) -> Result<(), FilterError> {
    log::debug!("box_blur: {} radius={radius} {strategy:?}", src.layout());
    let size = kernels::kernel_size(radius)?;
    if (BorderPolicy::Radial { radius }).is_empty(src.size()) {
        log::debug!("box_blur: radius {radius} fits nowhere, copying the input");
        return fill_border(src, dst, BorderFill::CopyInput, strategy);
    }
    let kernel = kernels::box_kernel_2d(size)?;
    convolve_bgr(src, dst, &kernel, strategy, narrowing)
}

/// Allocate a grayscale copy of `src`.
pub(crate) fn grayscale_scratch<A: ImageAllocator>(
    src: &BgraView<'_>,
    strategy: parallel::ExecutionStrategy,
    alloc: &A,
) -> Result<BgraImage, FilterError> {
    let mut gray = BgraImage::zeros(src.layout(), alloc).inspect_err(|e| {
        log::warn!("failed to allocate the grayscale buffer: {e}");
    })?;
    gray_from_bgra(src, &mut gray.view_mut(), strategy)?;
    Ok(gray)
}

/// Detect edges with the 3x3 Laplacian kernel.
///
/// The image is converted to grayscale first. A pixel whose Laplacian response
/// `t` exceeds [`EDGE_THRESHOLD`] becomes `(t, t, t, 255)` with `t` narrowed to
/// a byte, any other interior pixel becomes opaque black. The outermost ring of
/// pixels is copied from `src`.
///
/// # Errors
///
/// Returns an allocation error, before writing to `dst`, if the grayscale
/// buffer cannot be allocated.
///
/// PRECONDITION: `src` and `dst` must have the same layout.
pub fn laplacian_edge_detector<A: ImageAllocator>(
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    strategy: parallel::ExecutionStrategy,
    narrowing: Narrowing,
    alloc: &A,
) -> Result<(), FilterError> {
    src.layout().check_same(&dst.layout())?;
    log::debug!("laplacian_edge_detector: {} {strategy:?}", src.layout());

    let kernel = Kernel2d::from_rows(&LAPLACIAN_3X3)?;
    let gray = grayscale_scratch(src, strategy, alloc)?;
    let gray = gray.view();

    apply_windowed(
        src,
        dst,
        BorderPolicy::Ring,
        BorderFill::CopyInput,
        strategy,
        |_, x, y| {
            let t = green_response(&gray, &kernel, x, y);
            if t > EDGE_THRESHOLD {
                Bgra::gray(narrowing.narrow(t))
            } else {
                Bgra::BLACK
            }
        },
    )
}

/// Detect edges with the 3x3 Sobel kernels.
///
/// The image is converted to grayscale first. The gradient magnitude
/// `sqrt(gx² + gy²)` is narrowed to a byte `a`; the pixel becomes `(a, a, a, 255)`
/// when `a` exceeds [`EDGE_THRESHOLD`] and opaque black otherwise. The
/// outermost ring of pixels is copied from `src`.
///
/// # Errors
///
/// Returns an allocation error, before writing to `dst`, if the grayscale
/// buffer cannot be allocated.
///
/// PRECONDITION: `src` and `dst` must have the same layout.
pub fn sobel_edge_detector<A: ImageAllocator>(
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    strategy: parallel::ExecutionStrategy,
    narrowing: Narrowing,
    alloc: &A,
) -> Result<(), FilterError> {
    src.layout().check_same(&dst.layout())?;
    log::debug!("sobel_edge_detector: {} {strategy:?}", src.layout());

    let kernel_x = Kernel2d::from_rows(&SOBEL_X_3X3)?;
    let kernel_y = Kernel2d::from_rows(&SOBEL_Y_3X3)?;
    let gray = grayscale_scratch(src, strategy, alloc)?;
    let gray = gray.view();

    apply_windowed(
        src,
        dst,
        BorderPolicy::Ring,
        BorderFill::CopyInput,
        strategy,
        |_, x, y| {
            let gx = green_response(&gray, &kernel_x, x, y);
            let gy = green_response(&gray, &kernel_y, x, y);
            // the comparison is made on the narrowed magnitude
            let a = narrowing.narrow((gx * gx + gy * gy).sqrt());
            if a as f64 > EDGE_THRESHOLD {
                Bgra::gray(a)
            } else {
                Bgra::BLACK
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::ExecutionStrategy;
    use bgrafx_image::{CpuAllocator, ImageError, ImageLayout};

    struct NoMemory;

    impl ImageAllocator for NoMemory {
        fn allocate(&self, len: usize) -> Result<Vec<u8>, ImageError> {
            Err(ImageError::AllocationFailed(len))
        }
    }

    fn assert_border_copied(src: &BgraImage, dst: &BgraImage, reach: usize) {
        let size = src.size();
        for y in 0..size.height {
            for x in 0..size.width {
                let inner = x >= reach
                    && y >= reach
                    && x + reach < size.width
                    && y + reach < size.height;
                if !inner {
                    assert_eq!(dst.pixel(x, y), src.pixel(x, y), "at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_gaussian_blur_solid_red_4x4() -> Result<(), FilterError> {
        let layout = ImageLayout::new([4, 4].into(), 16)?;
        let red = Bgra::opaque(0, 0, 255);
        let src = BgraImage::from_layout_val(layout, red, &CpuAllocator)?;
        let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
        gaussian_blur(
            &src.view(),
            &mut dst.view_mut(),
            1,
            ExecutionStrategy::Serial,
            Narrowing::Wrapping,
        )?;

        // the normalized weights sum to slightly less than one and the
        // narrowing truncates, so the interior loses one level
        for y in 1..3 {
            for x in 1..3 {
                assert_eq!(dst.pixel(x, y), Bgra::opaque(0, 0, 254), "at ({x}, {y})");
            }
        }
        assert_border_copied(&src, &dst, 1);
        Ok(())
    }

    #[test]
    fn test_gaussian_blur_uniform_truncates() -> Result<(), FilterError> {
        let layout = ImageLayout::packed([7, 7].into())?;
        for (value, expected) in [(255, 254), (128, 127), (1, 0)] {
            let src = BgraImage::from_layout_val(layout, Bgra::gray(value), &CpuAllocator)?;
            let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
            gaussian_blur(
                &src.view(),
                &mut dst.view_mut(),
                1,
                ExecutionStrategy::Serial,
                Narrowing::Wrapping,
            )?;
            for y in 1..6 {
                for x in 1..6 {
                    assert_eq!(dst.pixel(x, y), Bgra::gray(expected), "{value} at ({x}, {y})");
                }
            }
            assert_border_copied(&src, &dst, 1);
        }
        Ok(())
    }

    #[test]
    fn test_blur_radius_larger_than_image() -> Result<(), FilterError> {
        let layout = ImageLayout::new([5, 4].into(), 24)?;
        let mut src = BgraImage::zeros(layout, &CpuAllocator)?;
        {
            let mut view = src.view_mut();
            for y in 0..4 {
                for x in 0..5 {
                    view.set(x, y, Bgra::new((x * 40) as u8, (y * 60) as u8, 9, 100));
                }
            }
        }

        for radius in [3, 50_000, usize::MAX / 2] {
            let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
            gaussian_blur(
                &src.view(),
                &mut dst.view_mut(),
                radius,
                ExecutionStrategy::ParallelRows,
                Narrowing::Wrapping,
            )?;
            assert_eq!(dst, src, "gaussian radius {radius}");

            let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
            box_blur(
                &src.view(),
                &mut dst.view_mut(),
                radius,
                ExecutionStrategy::Serial,
                Narrowing::Saturating,
            )?;
            assert_eq!(dst, src, "box radius {radius}");
        }

        let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
        let res = gaussian_blur(
            &src.view(),
            &mut dst.view_mut(),
            usize::MAX,
            ExecutionStrategy::Serial,
            Narrowing::Wrapping,
        );
        assert!(matches!(res, Err(FilterError::InvalidRadius(_))));
        assert_eq!(dst, BgraImage::zeros(layout, &CpuAllocator)?);
        Ok(())
    }

    #[test]
    fn test_gaussian_blur_border_passthrough() -> Result<(), FilterError> {
        let layout = ImageLayout::new([9, 8].into(), 40)?;
        let mut src = BgraImage::zeros(layout, &CpuAllocator)?;
        {
            let mut view = src.view_mut();
            for y in 0..8 {
                for x in 0..9 {
                    view.set(x, y, Bgra::new((x * 20) as u8, (y * 30) as u8, 77, 3));
                }
            }
        }
        let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
        gaussian_blur(
            &src.view(),
            &mut dst.view_mut(),
            2,
            ExecutionStrategy::ParallelRows,
            Narrowing::Wrapping,
        )?;

        assert_border_copied(&src, &dst, 2);
        // interior pixels are computed and opaque
        assert_eq!(dst.pixel(4, 4).a, 255);
        Ok(())
    }

    #[test]
    fn test_gaussian_blur_radius_zero_identity() -> Result<(), FilterError> {
        let pixels = [Bgra::new(1, 2, 3, 255), Bgra::new(4, 5, 6, 255)];
        let src = BgraImage::from_pixels([1, 2].into(), &pixels)?;
        let mut dst = BgraImage::zeros(src.layout(), &CpuAllocator)?;
        gaussian_blur(
            &src.view(),
            &mut dst.view_mut(),
            0,
            ExecutionStrategy::Serial,
            Narrowing::Wrapping,
        )?;
        assert_eq!(dst, src);
        Ok(())
    }

    #[test]
    fn test_box_blur_uniform() -> Result<(), FilterError> {
        let layout = ImageLayout::packed([6, 6].into())?;
        let src = BgraImage::from_layout_val(layout, Bgra::opaque(90, 45, 18), &CpuAllocator)?;
        let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
        box_blur(
            &src.view(),
            &mut dst.view_mut(),
            1,
            ExecutionStrategy::Serial,
            Narrowing::Wrapping,
        )?;
        let px = dst.pixel(2, 2);
        assert!(px.b.abs_diff(90) <= 1 && px.g.abs_diff(45) <= 1 && px.r.abs_diff(18) <= 1);
        assert_border_copied(&src, &dst, 1);
        Ok(())
    }

    #[test]
    fn test_laplacian_uniform_is_black() -> Result<(), FilterError> {
        let layout = ImageLayout::new([6, 5].into(), 32)?;
        let src = BgraImage::from_layout_val(layout, Bgra::new(10, 200, 90, 40), &CpuAllocator)?;
        let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
        laplacian_edge_detector(
            &src.view(),
            &mut dst.view_mut(),
            ExecutionStrategy::Serial,
            Narrowing::Wrapping,
            &CpuAllocator,
        )?;
        for y in 1..4 {
            for x in 1..5 {
                assert_eq!(dst.pixel(x, y), Bgra::BLACK);
            }
        }
        assert_border_copied(&src, &dst, 1);
        Ok(())
    }

    #[test]
    fn test_laplacian_bright_dot_wraps() -> Result<(), FilterError> {
        // the dot has a gray level of 117, so its response is 8 * 117 = 936
        let layout = ImageLayout::packed([5, 5].into())?;
        let mut src = BgraImage::from_layout_val(layout, Bgra::BLACK, &CpuAllocator)?;
        src.view_mut().set(2, 2, Bgra::opaque(0, 200, 0));

        let mut wrapped = BgraImage::zeros(layout, &CpuAllocator)?;
        laplacian_edge_detector(
            &src.view(),
            &mut wrapped.view_mut(),
            ExecutionStrategy::Serial,
            Narrowing::Wrapping,
            &CpuAllocator,
        )?;
        assert_eq!(wrapped.pixel(2, 2), Bgra::gray((936 % 256) as u8));
        assert_eq!(wrapped.pixel(1, 2), Bgra::BLACK);

        let mut saturated = BgraImage::zeros(layout, &CpuAllocator)?;
        laplacian_edge_detector(
            &src.view(),
            &mut saturated.view_mut(),
            ExecutionStrategy::Serial,
            Narrowing::Saturating,
            &CpuAllocator,
        )?;
        assert_eq!(saturated.pixel(2, 2), Bgra::WHITE);
        Ok(())
    }

    #[test]
    fn test_sobel_vertical_step() -> Result<(), FilterError> {
        // left half black, right half gray 117
        let layout = ImageLayout::packed([6, 4].into())?;
        let mut src = BgraImage::from_layout_val(layout, Bgra::BLACK, &CpuAllocator)?;
        {
            let mut view = src.view_mut();
            for y in 0..4 {
                for x in 3..6 {
                    view.set(x, y, Bgra::opaque(0, 200, 0));
                }
            }
        }
        let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
        sobel_edge_detector(
            &src.view(),
            &mut dst.view_mut(),
            ExecutionStrategy::Serial,
            Narrowing::Saturating,
            &CpuAllocator,
        )?;

        // |gx| = 4 * 117 = 468 on both sides of the step
        assert_eq!(dst.pixel(2, 1), Bgra::WHITE);
        assert_eq!(dst.pixel(3, 2), Bgra::WHITE);
        assert_eq!(dst.pixel(1, 1), Bgra::BLACK);
        assert_eq!(dst.pixel(4, 2), Bgra::BLACK);
        assert_border_copied(&src, &dst, 1);

        sobel_edge_detector(
            &src.view(),
            &mut dst.view_mut(),
            ExecutionStrategy::Serial,
            Narrowing::Wrapping,
            &CpuAllocator,
        )?;
        // 468 wraps to 212
        assert_eq!(dst.pixel(2, 1), Bgra::gray(212));
        Ok(())
    }

    #[test]
    fn test_edge_detectors_allocation_failure() -> Result<(), FilterError> {
        let layout = ImageLayout::packed([4, 4].into())?;
        let src = BgraImage::from_layout_val(layout, Bgra::WHITE, &CpuAllocator)?;
        let mut dst = BgraImage::from_layout_val(layout, Bgra::gray(9), &CpuAllocator)?;
        let before = dst.clone();

        let res = laplacian_edge_detector(
            &src.view(),
            &mut dst.view_mut(),
            ExecutionStrategy::Serial,
            Narrowing::Wrapping,
            &NoMemory,
        );
        assert_eq!(
            res,
            Err(FilterError::Image(ImageError::AllocationFailed(64)))
        );
        let res = sobel_edge_detector(
            &src.view(),
            &mut dst.view_mut(),
            ExecutionStrategy::Serial,
            Narrowing::Wrapping,
            &NoMemory,
        );
        assert!(res.is_err());
        assert_eq!(dst, before);
        Ok(())
    }
}
