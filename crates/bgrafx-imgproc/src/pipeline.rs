use bgrafx_image::{BgraImage, BgraView, BgraViewMut, ImageAllocator};

use crate::{
    error::FilterError,
    filter::{gaussian_blur, laplacian_edge_detector},
    narrow::Narrowing,
    parallel::ExecutionStrategy,
};

/// Chain two filters through an intermediate image.
///
/// The intermediate image has the layout of `src` and is allocated with
/// `alloc`. `second` only runs when `first` succeeds. The intermediate image
/// is dropped before returning, whatever the outcome.
///
/// # Errors
///
/// Returns an allocation error without running either filter if the
/// intermediate image cannot be allocated, otherwise the first error of
/// the two filters.
///
/// PRECONDITION: `src` and `dst` must have the same layout.
pub fn compose<A, F, G>(
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    alloc: &A,
    first: F,
    second: G,
) -> Result<(), FilterError>
where
    A: ImageAllocator,
    F: FnOnce(&BgraView<'_>, &mut BgraViewMut<'_>) -> Result<(), FilterError>,
    G: FnOnce(&BgraView<'_>, &mut BgraViewMut<'_>) -> Result<(), FilterError>,
{
    src.layout().check_same(&dst.layout())?;

    let mut scratch = BgraImage::zeros(src.layout(), alloc).inspect_err(|e| {
        log::warn!("failed to allocate the intermediate image: {e}");
    })?;

    first(src, &mut scratch.view_mut())?;
    second(&scratch.view(), dst)
}

/// Laplacian of Gaussian: a gaussian blur followed by the Laplacian edge detector.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image.
/// * `radius` - The radius of the gaussian kernel.
/// * `strategy` - How the rows of both stages are dispatched.
/// * `narrowing` - How the accumulators of both stages become bytes.
/// * `alloc` - Allocator of the intermediate and grayscale images.
///
/// PRECONDITION: `src` and `dst` must have the same layout.
pub fn laplacian_of_gaussian<A: ImageAllocator>(
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    radius: usize,
    strategy: ExecutionStrategy,
    narrowing: Narrowing,
    alloc: &A,
) -> Result<(), FilterError> {
    log::debug!(
        "laplacian_of_gaussian: {} radius={radius} {strategy:?}",
        src.layout()
    );
    compose(
        src,
        dst,
        alloc,
        |src, blurred| gaussian_blur(src, blurred, radius, strategy, narrowing),
        |blurred, dst| laplacian_edge_detector(blurred, dst, strategy, narrowing, alloc),
    )
}
