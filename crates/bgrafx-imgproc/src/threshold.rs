use bgrafx_image::{Bgra, BgraView, BgraViewMut};

use crate::{color::luminance, error::FilterError, parallel};

/// Keep the pixels brighter than a fraction of full scale, blacken the others.
///
/// A pixel passes through unchanged, alpha included, when its relative
/// luminance is strictly greater than `threshold * 255`; otherwise it becomes
/// opaque black. There is no spatial window, every pixel is evaluated.
///
/// # Arguments
///
/// * `src` - The input BGRA image.
/// * `dst` - The output BGRA image.
/// * `threshold` - The threshold as a fraction in `[0, 1]`.
/// * `strategy` - How the rows are dispatched.
///
/// # Examples
///
/// ```
/// use bgrafx_image::{Bgra, BgraImage, CpuAllocator, ImageLayout};
/// use bgrafx_imgproc::parallel::ExecutionStrategy;
/// use bgrafx_imgproc::threshold::threshold_luminance;
///
/// let pixels = [Bgra::opaque(0, 0, 255), Bgra::opaque(0, 255, 0)];
/// let image = BgraImage::from_pixels([2, 1].into(), &pixels).unwrap();
/// let mut out = BgraImage::zeros(image.layout(), &CpuAllocator).unwrap();
///
/// threshold_luminance(&image.view(), &mut out.view_mut(), 0.5, ExecutionStrategy::Serial).unwrap();
/// assert_eq!(out.pixel(0, 0), Bgra::BLACK);
/// assert_eq!(out.pixel(1, 0), Bgra::opaque(0, 255, 0));
/// ```
pub fn threshold_luminance(
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    threshold: f64,
    strategy: parallel::ExecutionStrategy,
) -> Result<(), FilterError> {
    src.layout().check_same(&dst.layout())?;
    log::debug!(
        "threshold: {} threshold={threshold} {strategy:?}",
        src.layout()
    );

    let level = threshold * 255.0;

    // run the thresholding operation in parallel
    parallel::par_iter_pixels(src, dst, strategy, |px| {
        if luminance(px) > level {
            px
        } else {
            Bgra::BLACK
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::ExecutionStrategy;
    use bgrafx_image::{BgraImage, CpuAllocator, ImageLayout};

    #[test]
    fn test_threshold_solid_red() -> Result<(), FilterError> {
        // luminance 76.2 is below 127.5
        let layout = ImageLayout::new([4, 4].into(), 16)?;
        let red = Bgra::opaque(0, 0, 255);
        let src = BgraImage::from_layout_val(layout, red, &CpuAllocator)?;
        let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
        threshold_luminance(&src.view(), &mut dst.view_mut(), 0.5, ExecutionStrategy::Serial)?;
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(dst.pixel(x, y), Bgra::BLACK);
            }
        }

        threshold_luminance(&src.view(), &mut dst.view_mut(), 0.25, ExecutionStrategy::Serial)?;
        assert_eq!(dst.pixel(2, 3), red);
        Ok(())
    }

    #[test]
    fn test_threshold_keeps_alpha() -> Result<(), FilterError> {
        let pixels = [Bgra::new(250, 250, 250, 17), Bgra::new(1, 1, 1, 17)];
        let src = BgraImage::from_pixels([2, 1].into(), &pixels)?;
        let mut dst = BgraImage::zeros(src.layout(), &CpuAllocator)?;
        threshold_luminance(&src.view(), &mut dst.view_mut(), 0.75, ExecutionStrategy::Serial)?;
        assert_eq!(dst.pixel(0, 0), Bgra::new(250, 250, 250, 17));
        assert_eq!(dst.pixel(1, 0), Bgra::BLACK);
        Ok(())
    }

    #[test]
    fn test_threshold_idempotent() -> Result<(), FilterError> {
        let layout = ImageLayout::packed([16, 3].into())?;
        let mut src = BgraImage::zeros(layout, &CpuAllocator)?;
        {
            let mut view = src.view_mut();
            for y in 0..3 {
                for x in 0..16 {
                    let v = (x * 16 + y * 5) as u8;
                    view.set(x, y, Bgra::new(v, v.wrapping_mul(3), 255 - v, v));
                }
            }
        }

        let mut once = BgraImage::zeros(layout, &CpuAllocator)?;
        threshold_luminance(&src.view(), &mut once.view_mut(), 0.4, ExecutionStrategy::ParallelRows)?;
        let mut twice = BgraImage::zeros(layout, &CpuAllocator)?;
        threshold_luminance(&once.view(), &mut twice.view_mut(), 0.4, ExecutionStrategy::ParallelRows)?;
        assert_eq!(once, twice);
        Ok(())
    }
}
