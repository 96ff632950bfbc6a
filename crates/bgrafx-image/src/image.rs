use crate::{
    allocator::ImageAllocator,
    error::ImageError,
    pixel::{Bgra, BYTES_PER_PIXEL},
    view::{BgraView, BgraViewMut},
};

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use bgrafx_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// The memory layout of a BGRA image: its size and the byte distance between rows.
///
/// Invariant: `stride >= width * 4` and both dimensions are non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageLayout {
    size: ImageSize,
    stride: usize,
}

impl ImageLayout {
    /// Create a layout from a size and a row stride in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero or the stride cannot hold a row.
    ///
    /// # Examples
    ///
    /// ```
    /// use bgrafx_image::{ImageLayout, ImageSize};
    ///
    /// let layout = ImageLayout::new([4, 4].into(), 16).unwrap();
    /// assert_eq!(layout.len(), 64);
    ///
    /// assert!(ImageLayout::new([4, 4].into(), 12).is_err());
    /// ```
    pub fn new(size: ImageSize, stride: usize) -> Result<Self, ImageError> {
        if size.width == 0 || size.height == 0 {
            return Err(ImageError::InvalidImageSize(size.width, size.height));
        }

        let row_bytes = size
            .width
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or(ImageError::InvalidImageSize(size.width, size.height))?;
        if stride < row_bytes {
            return Err(ImageError::InvalidStride(stride, row_bytes));
        }

        stride
            .checked_mul(size.height)
            .ok_or(ImageError::InvalidImageSize(size.width, size.height))?;

        Ok(Self { size, stride })
    }

    /// Create a layout whose rows carry no padding.
    pub fn packed(size: ImageSize) -> Result<Self, ImageError> {
        Self::new(size, size.width.saturating_mul(BYTES_PER_PIXEL))
    }

    /// The size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// The height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// The distance in bytes between the starts of two consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The number of pixel bytes in one row, padding excluded.
    pub fn row_bytes(&self) -> usize {
        self.size.width * BYTES_PER_PIXEL
    }

    /// The number of bytes the image spans: `stride * height`.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.stride * self.size.height
    }

    /// Byte offset of the pixel at `(x, y)`.
    #[inline]
    pub fn offset(&self, x: usize, y: usize) -> usize {
        y * self.stride + x * BYTES_PER_PIXEL
    }

    /// Check that a buffer of `len` bytes can hold this layout.
    pub fn check_buffer(&self, len: usize) -> Result<(), ImageError> {
        if len < self.len() {
            return Err(ImageError::BufferTooSmall(len, self.len()));
        }
        Ok(())
    }

    /// Check that two images share the same layout.
    pub fn check_same(&self, other: &ImageLayout) -> Result<(), ImageError> {
        if self != other {
            return Err(ImageError::LayoutMismatch(
                self.to_string(),
                other.to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for ImageLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}x{} (stride {})",
            self.size.width, self.size.height, self.stride
        )
    }
}

/// An owned BGRA image.
///
/// Filters use it for their intermediate buffers; the storage comes from an
/// [`ImageAllocator`] so that allocation failures are reported as errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BgraImage {
    data: Vec<u8>,
    layout: ImageLayout,
}

impl BgraImage {
    /// Create a new image from raw bytes.
    ///
    /// # Errors
    ///
    /// If the length of the data does not match `stride * height`, an error is returned.
    pub fn new(layout: ImageLayout, data: Vec<u8>) -> Result<Self, ImageError> {
        if data.len() != layout.len() {
            return Err(ImageError::InvalidDataLength(data.len(), layout.len()));
        }
        Ok(Self { data, layout })
    }

    /// Create a zero-filled image with the given layout.
    pub fn zeros<A: ImageAllocator>(layout: ImageLayout, alloc: &A) -> Result<Self, ImageError> {
        let data = alloc.allocate(layout.len())?;
        Self::new(layout, data)
    }

    /// Create an image where every pixel holds `val`. Row padding stays zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use bgrafx_image::{Bgra, BgraImage, CpuAllocator, ImageLayout};
    ///
    /// let layout = ImageLayout::new([3, 2].into(), 16).unwrap();
    /// let image = BgraImage::from_layout_val(layout, Bgra::WHITE, &CpuAllocator).unwrap();
    ///
    /// assert_eq!(image.pixel(2, 1), Bgra::WHITE);
    /// assert_eq!(image.as_slice()[12..16], [0, 0, 0, 0]);
    /// ```
    pub fn from_layout_val<A: ImageAllocator>(
        layout: ImageLayout,
        val: Bgra,
        alloc: &A,
    ) -> Result<Self, ImageError> {
        let mut image = Self::zeros(layout, alloc)?;
        let row_bytes = layout.row_bytes();
        for row in image.data.chunks_exact_mut(layout.stride()) {
            row[..row_bytes]
                .chunks_exact_mut(BYTES_PER_PIXEL)
                .for_each(|px| val.write_to(px));
        }
        Ok(image)
    }

    /// Create a packed image from row-major pixels.
    pub fn from_pixels(size: ImageSize, pixels: &[Bgra]) -> Result<Self, ImageError> {
        let layout = ImageLayout::packed(size)?;
        if pixels.len() != size.width * size.height {
            return Err(ImageError::InvalidDataLength(
                pixels.len() * BYTES_PER_PIXEL,
                layout.len(),
            ));
        }
        let data = pixels.iter().flat_map(|px| px.to_bytes()).collect();
        Self::new(layout, data)
    }

    /// The layout of the image.
    pub fn layout(&self) -> ImageLayout {
        self.layout
    }

    /// The size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.layout.size()
    }

    /// Read the pixel at `(x, y)`.
    ///
    /// PRECONDITION: `x < width` and `y < height`.
    pub fn pixel(&self, x: usize, y: usize) -> Bgra {
        let offset = self.layout.offset(x, y);
        Bgra::from_bytes(&self.data[offset..offset + BYTES_PER_PIXEL])
    }

    /// Read the pixel at `(x, y)`, or `None` if it lies outside the image.
    pub fn get(&self, x: usize, y: usize) -> Option<Bgra> {
        (x < self.layout.width() && y < self.layout.height()).then(|| self.pixel(x, y))
    }

    /// The raw bytes of the image, padding included.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// The raw mutable bytes of the image, padding included.
    pub fn as_slice_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the image and return its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Borrow the image as a read-only view.
    pub fn view(&self) -> BgraView<'_> {
        BgraView::from_parts(&self.data, self.layout)
    }

    /// Borrow the image as a mutable view.
    pub fn view_mut(&mut self) -> BgraViewMut<'_> {
        BgraViewMut::from_parts(&mut self.data, self.layout)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Bgra, BgraImage, CpuAllocator, ImageError, ImageLayout, ImageSize};

    #[test]
    fn image_size() {
        let image_size = ImageSize {
            width: 10,
            height: 20,
        };
        assert_eq!(image_size.width, 10);
        assert_eq!(image_size.height, 20);
    }

    #[test]
    fn layout_rejects_short_stride() {
        let res = ImageLayout::new([5, 2].into(), 19);
        assert_eq!(res, Err(ImageError::InvalidStride(19, 20)));
    }

    #[test]
    fn layout_rejects_empty() {
        let res = ImageLayout::new([0, 2].into(), 16);
        assert_eq!(res, Err(ImageError::InvalidImageSize(0, 2)));
    }

    #[test]
    fn layout_offsets() -> Result<(), ImageError> {
        let layout = ImageLayout::new([3, 4].into(), 20)?;
        assert_eq!(layout.row_bytes(), 12);
        assert_eq!(layout.len(), 80);
        assert_eq!(layout.offset(2, 3), 3 * 20 + 8);
        assert!(layout.check_buffer(79).is_err());
        assert!(layout.check_buffer(80).is_ok());
        Ok(())
    }

    #[test]
    fn image_smoke() -> Result<(), ImageError> {
        let layout = ImageLayout::packed([10, 20].into())?;
        let image = BgraImage::from_layout_val(layout, Bgra::opaque(1, 2, 3), &CpuAllocator)?;
        assert_eq!(image.size().width, 10);
        assert_eq!(image.size().height, 20);
        assert_eq!(image.as_slice().len(), 10 * 20 * 4);
        assert_eq!(image.pixel(9, 19), Bgra::opaque(1, 2, 3));
        assert_eq!(image.get(10, 0), None);
        Ok(())
    }

    #[test]
    fn image_from_pixels() -> Result<(), ImageError> {
        let pixels = [Bgra::BLACK, Bgra::WHITE, Bgra::gray(3), Bgra::new(1, 2, 3, 4)];
        let image = BgraImage::from_pixels([2, 2].into(), &pixels)?;
        assert_eq!(image.pixel(1, 0), Bgra::WHITE);
        assert_eq!(image.pixel(1, 1), Bgra::new(1, 2, 3, 4));
        assert_eq!(&image.as_slice()[8..12], &[3, 3, 3, 255]);
        Ok(())
    }

    #[test]
    fn image_from_vec_wrong_length() -> Result<(), ImageError> {
        let layout = ImageLayout::packed([2, 2].into())?;
        let res = BgraImage::new(layout, vec![0u8; 15]);
        assert_eq!(res, Err(ImageError::InvalidDataLength(15, 16)));
        Ok(())
    }
}
