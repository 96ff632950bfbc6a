use bgrafx_image::{Bgra, BgraView, BgraViewMut};

use crate::{error::FilterError, narrow::Narrowing, parallel};

/// Define the RGB weights for the grayscale conversion.
const RW: f64 = 0.299;
const GW: f64 = 0.587;
const BW: f64 = 0.114;

/// The relative luminance of a pixel:
///
/// Y = 0.299 * R + 0.587 * G + 0.114 * B
#[inline]
pub fn luminance(px: Bgra) -> f64 {
    (RW * px.r as f64) + (GW * px.g as f64) + (BW * px.b as f64)
}

/// Convert a BGRA image to grayscale.
///
/// The luminance is truncated to a byte and written to the blue, green and
/// red channels; alpha is set to 255.
///
/// # Arguments
///
/// * `src` - The input BGRA image.
/// * `dst` - The output grayscale image, still 4 bytes per pixel.
/// * `strategy` - How the rows are dispatched.
///
/// Precondition: the input and output images must have the same layout.
///
/// # Example
///
/// ```
/// use bgrafx_image::{Bgra, BgraImage, CpuAllocator, ImageLayout};
/// use bgrafx_imgproc::color::gray_from_bgra;
/// use bgrafx_imgproc::parallel::ExecutionStrategy;
///
/// let layout = ImageLayout::packed([4, 5].into()).unwrap();
/// let image = BgraImage::from_layout_val(layout, Bgra::opaque(0, 0, 255), &CpuAllocator).unwrap();
/// let mut gray = BgraImage::zeros(layout, &CpuAllocator).unwrap();
///
/// gray_from_bgra(&image.view(), &mut gray.view_mut(), ExecutionStrategy::Serial).unwrap();
/// assert_eq!(gray.pixel(3, 4), Bgra::gray(76));
/// ```
pub fn gray_from_bgra(
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    strategy: parallel::ExecutionStrategy,
) -> Result<(), FilterError> {
    src.layout().check_same(&dst.layout())?;

    // parallelize the grayscale conversion by rows
    parallel::par_iter_pixels(src, dst, strategy, |px| {
        Bgra::gray(Narrowing::Wrapping.narrow(luminance(px)))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::ExecutionStrategy;
    use bgrafx_image::{BgraImage, CpuAllocator, ImageLayout};

    #[test]
    fn test_luminance_weights() {
        assert_eq!(luminance(Bgra::BLACK), 0.0);
        assert!((luminance(Bgra::opaque(0, 0, 255)) - 76.245).abs() < 1e-9);
        assert!((luminance(Bgra::opaque(0, 255, 0)) - 149.685).abs() < 1e-9);
        assert!((luminance(Bgra::opaque(255, 0, 0)) - 29.07).abs() < 1e-9);
    }

    #[test]
    fn test_gray_from_bgra() -> Result<(), FilterError> {
        let pixels = [
            Bgra::new(0, 0, 255, 0),
            Bgra::opaque(0, 255, 0),
            Bgra::opaque(255, 0, 0),
            Bgra::opaque(0, 200, 0),
        ];
        let src = BgraImage::from_pixels([2, 2].into(), &pixels)?;
        let mut dst = BgraImage::zeros(src.layout(), &CpuAllocator)?;
        gray_from_bgra(&src.view(), &mut dst.view_mut(), ExecutionStrategy::Serial)?;

        assert_eq!(dst.pixel(0, 0), Bgra::gray(76));
        assert_eq!(dst.pixel(1, 0), Bgra::gray(149));
        assert_eq!(dst.pixel(0, 1), Bgra::gray(29));
        assert_eq!(dst.pixel(1, 1), Bgra::gray(117));
        Ok(())
    }

    #[test]
    fn test_gray_uniform_parallel() -> Result<(), FilterError> {
        let layout = ImageLayout::new([9, 7].into(), 40)?;
        let src = BgraImage::from_layout_val(layout, Bgra::opaque(12, 34, 56), &CpuAllocator)?;
        let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
        gray_from_bgra(&src.view(), &mut dst.view_mut(), ExecutionStrategy::ParallelRows)?;

        let expected = Bgra::gray(luminance(Bgra::opaque(12, 34, 56)) as u8);
        for y in 0..7 {
            for x in 0..9 {
                assert_eq!(dst.pixel(x, y), expected);
            }
        }
        Ok(())
    }
}
