use std::{fmt, fs::File, io::BufReader, path::Path, str::FromStr};

use bgrafx_image::{BgraView, BgraViewMut, CpuAllocator, ImageAllocator, ImageLayout};
use bgrafx_imgproc::{
    color::gray_from_bgra,
    corners::{shi_tomasi_corners, DEFAULT_CORNER_RADIUS},
    filter::{
        box_blur, gaussian_blur, laplacian_edge_detector, sobel_edge_detector,
        DEFAULT_BLUR_RADIUS, DEFAULT_BOX_RADIUS,
    },
    params::{FilterParams, ParameterSet},
    pipeline::laplacian_of_gaussian,
    threshold::threshold_luminance,
    FilterError, STATUS_OK,
};

use crate::error::BgrafxError;

/// Status returned by [`run_by_name`] when no filter goes by the given name.
pub const STATUS_UNKNOWN_FILTER: i32 = -6;

/// The filters exposed to the host, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Uniform blur, `radius` defaults to 1.
    BoxBlur,
    /// Gaussian blur, `radius` defaults to 2.
    GaussianBlur,
    /// Luminance threshold, `threshold` defaults to 0.75.
    Threshold,
    /// Sobel gradient magnitude edges.
    SobelEdgeDetector,
    /// Laplacian edges.
    LaplacianEdgeDetector,
    /// Gaussian blur then Laplacian edges, `radius` defaults to 2.
    LaplacianOfGaussian,
    /// Structure tensor corners, `radius` defaults to 3.
    ShiTomasiCornerDetector,
    /// Plain grayscale conversion.
    Grayscale,
}

impl FilterKind {
    /// Every filter, in menu order.
    pub const ALL: [FilterKind; 8] = [
        FilterKind::BoxBlur,
        FilterKind::GaussianBlur,
        FilterKind::Threshold,
        FilterKind::SobelEdgeDetector,
        FilterKind::LaplacianEdgeDetector,
        FilterKind::LaplacianOfGaussian,
        FilterKind::ShiTomasiCornerDetector,
        FilterKind::Grayscale,
    ];

    /// The name shown to users, e.g. `Gaussian Blur`.
    pub fn display_name(&self) -> &'static str {
        match self {
            FilterKind::BoxBlur => "Box Blur",
            FilterKind::GaussianBlur => "Gaussian Blur",
            FilterKind::Threshold => "Threshold",
            FilterKind::SobelEdgeDetector => "Sobel Edge Detector",
            FilterKind::LaplacianEdgeDetector => "Laplacian Edge Detector",
            FilterKind::LaplacianOfGaussian => "Laplacian of Gaussian",
            FilterKind::ShiTomasiCornerDetector => "Shi-Tomasi Corner Detector",
            FilterKind::Grayscale => "Grayscale",
        }
    }

    /// The name of the entry point, e.g. `GaussianBlur`.
    pub fn export_name(&self) -> &'static str {
        match self {
            FilterKind::BoxBlur => "BoxBlur",
            FilterKind::GaussianBlur => "GaussianBlur",
            FilterKind::Threshold => "Threshold",
            FilterKind::SobelEdgeDetector => "SobelEdgeDetector",
            FilterKind::LaplacianEdgeDetector => "LaplacianEdgeDetector",
            FilterKind::LaplacianOfGaussian => "LaplacianOfGaussian",
            FilterKind::ShiTomasiCornerDetector => "ShiTomasiCornerDetector",
            FilterKind::Grayscale => "Grayscale",
        }
    }

    /// The radius used when the parameters do not name one.
    ///
    /// Filters without a kernel radius report 0.
    pub fn default_radius(&self) -> usize {
        match self {
            FilterKind::BoxBlur => DEFAULT_BOX_RADIUS,
            FilterKind::GaussianBlur | FilterKind::LaplacianOfGaussian => DEFAULT_BLUR_RADIUS,
            FilterKind::ShiTomasiCornerDetector => DEFAULT_CORNER_RADIUS,
            _ => 0,
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for FilterKind {
    type Err = BgrafxError;

    /// Parse either the display name or the export name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        FilterKind::ALL
            .into_iter()
            .find(|kind| kind.display_name() == name || kind.export_name() == name)
            .ok_or_else(|| BgrafxError::UnknownFilter(s.to_string()))
    }
}

/// Run a filter on views, allocating scratch space on the heap.
///
/// See [`apply_with_allocator`].
pub fn apply(
    kind: FilterKind,
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    params: &ParameterSet,
) -> Result<(), FilterError> {
    apply_with_allocator(kind, src, dst, params, &CpuAllocator)
}

/// Run a filter on views.
///
/// The parameters are resolved with the default radius of `kind`, then the
/// filter runs with the resolved execution strategy and narrowing rule.
///
/// # Errors
///
/// Returns an error if the parameters are invalid, the layouts of `src` and
/// `dst` differ, or a scratch image cannot be allocated.
pub fn apply_with_allocator<A: ImageAllocator>(
    kind: FilterKind,
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    params: &ParameterSet,
    alloc: &A,
) -> Result<(), FilterError> {
    let p = FilterParams::resolve(params, kind.default_radius())?;
    log::debug!("{kind}: {p:?}");

    match kind {
        FilterKind::BoxBlur => box_blur(src, dst, p.radius, p.execution, p.narrowing),
        FilterKind::GaussianBlur => gaussian_blur(src, dst, p.radius, p.execution, p.narrowing),
        FilterKind::Threshold => threshold_luminance(src, dst, p.threshold, p.execution),
        FilterKind::SobelEdgeDetector => {
            sobel_edge_detector(src, dst, p.execution, p.narrowing, alloc)
        }
        FilterKind::LaplacianEdgeDetector => {
            laplacian_edge_detector(src, dst, p.execution, p.narrowing, alloc)
        }
        FilterKind::LaplacianOfGaussian => {
            laplacian_of_gaussian(src, dst, p.radius, p.execution, p.narrowing, alloc)
        }
        FilterKind::ShiTomasiCornerDetector => {
            shi_tomasi_corners(src, dst, p.radius, p.execution, alloc)
        }
        FilterKind::Grayscale => gray_from_bgra(src, dst, p.execution),
    }
}

fn run_checked(
    kind: FilterKind,
    input: &[u8],
    output: &mut [u8],
    layout: (usize, usize, usize),
    params: &ParameterSet,
) -> Result<(), FilterError> {
    let (stride, width, height) = layout;
    let layout = ImageLayout::new([width, height].into(), stride)?;
    let src = BgraView::new(input, layout)?;
    let mut dst = BgraViewMut::new(output, layout)?;
    apply(kind, &src, &mut dst, params)
}

/// Run a filter over caller-owned buffers and report an integer status.
///
/// Both buffers hold `height` rows of `stride` bytes. Returns [`STATUS_OK`]
/// on success and the non-zero [`FilterError::status_code`] otherwise; the
/// output buffer is not written when the layout is invalid or a scratch image
/// cannot be allocated.
///
/// # Examples
///
/// ```
/// use bgrafx::registry::{run, FilterKind};
/// use bgrafx::imgproc::{params::ParameterSet, STATUS_OK};
///
/// let input = [0u8, 0, 255, 255].repeat(16);
/// let mut output = vec![0u8; input.len()];
/// let params = ParameterSet::new().with("threshold", 0.25);
///
/// let status = run(FilterKind::Threshold, &input, &mut output, 16, 4, 4, &params);
/// assert_eq!(status, STATUS_OK);
/// assert_eq!(output, input);
/// ```
pub fn run(
    kind: FilterKind,
    input: &[u8],
    output: &mut [u8],
    stride: usize,
    width: usize,
    height: usize,
    params: &ParameterSet,
) -> i32 {
    match run_checked(kind, input, output, (stride, width, height), params) {
        Ok(()) => STATUS_OK,
        Err(e) => {
            log::warn!("{kind} failed: {e}");
            e.status_code()
        }
    }
}

/// Same as [`run`] with the filter looked up by display or export name.
///
/// Returns [`STATUS_UNKNOWN_FILTER`] if no filter goes by `name`.
pub fn run_by_name(
    name: &str,
    input: &[u8],
    output: &mut [u8],
    stride: usize,
    width: usize,
    height: usize,
    params: &ParameterSet,
) -> i32 {
    match name.parse::<FilterKind>() {
        Ok(kind) => run(kind, input, output, stride, width, height, params),
        Err(e) => {
            log::warn!("{e}");
            STATUS_UNKNOWN_FILTER
        }
    }
}

/// Read a parameter set stored as a JSON array of `{"key", "value"}` records.
pub fn read_parameters(path: impl AsRef<Path>) -> Result<ParameterSet, BgrafxError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
