use crate::{
    error::ImageError,
    image::{ImageLayout, ImageSize},
    pixel::{Bgra, BYTES_PER_PIXEL},
};

/// A read-only view of a caller-owned BGRA buffer.
///
/// Rows are `stride` bytes apart; only the first `width * 4` bytes of a row
/// hold pixels. The view never touches bytes past `stride * height`.
///
/// # Examples
///
/// ```
/// use bgrafx_image::{Bgra, BgraView, ImageLayout};
///
/// let data = [0u8, 0, 255, 255, 9, 9, 9, 9];
/// let layout = ImageLayout::new([1, 2].into(), 4).unwrap();
/// let view = BgraView::new(&data, layout).unwrap();
///
/// assert_eq!(view.pixel(0, 0), Bgra::opaque(0, 0, 255));
/// assert_eq!(view.row(1), &[9, 9, 9, 9]);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct BgraView<'a> {
    data: &'a [u8],
    layout: ImageLayout,
}

impl<'a> BgraView<'a> {
    /// Create a view over `data` with the given layout.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is shorter than `stride * height`.
    pub fn new(data: &'a [u8], layout: ImageLayout) -> Result<Self, ImageError> {
        layout.check_buffer(data.len())?;
        Ok(Self::from_parts(data, layout))
    }

    pub(crate) fn from_parts(data: &'a [u8], layout: ImageLayout) -> Self {
        Self {
            data: &data[..layout.len()],
            layout,
        }
    }

    /// The layout of the viewed image.
    pub fn layout(&self) -> ImageLayout {
        self.layout
    }

    /// The size of the viewed image in pixels.
    pub fn size(&self) -> ImageSize {
        self.layout.size()
    }

    /// The width of the viewed image in pixels.
    pub fn width(&self) -> usize {
        self.layout.width()
    }

    /// The height of the viewed image in pixels.
    pub fn height(&self) -> usize {
        self.layout.height()
    }

    /// The row stride in bytes.
    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    /// The pixel bytes of row `y`, padding excluded.
    ///
    /// PRECONDITION: `y < height`.
    #[inline]
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.layout.stride();
        &self.data[start..start + self.layout.row_bytes()]
    }

    /// Read the pixel at `(x, y)`.
    ///
    /// PRECONDITION: `x < width` and `y < height`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Bgra {
        let offset = self.layout.offset(x, y);
        Bgra::from_bytes(&self.data[offset..offset + BYTES_PER_PIXEL])
    }

    /// Read the pixel at `(x, y)`, checking the bounds.
    pub fn get(&self, x: usize, y: usize) -> Result<Bgra, ImageError> {
        if x >= self.width() || y >= self.height() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }
        Ok(self.pixel(x, y))
    }

    /// Read the green channel of the pixel at `(x, y)`.
    ///
    /// Grayscale buffers carry the same value in every color channel, so this
    /// is the luminance of a grayscale image.
    #[inline]
    pub fn green(&self, x: usize, y: usize) -> u8 {
        self.data[self.layout.offset(x, y) + 1]
    }

    /// The viewed bytes, `stride * height` long.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }
}

/// A mutable view of a caller-owned BGRA buffer.
#[derive(Debug)]
pub struct BgraViewMut<'a> {
    data: &'a mut [u8],
    layout: ImageLayout,
}

impl<'a> BgraViewMut<'a> {
    /// Create a mutable view over `data` with the given layout.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is shorter than `stride * height`.
    pub fn new(data: &'a mut [u8], layout: ImageLayout) -> Result<Self, ImageError> {
        layout.check_buffer(data.len())?;
        Ok(Self::from_parts(data, layout))
    }

    pub(crate) fn from_parts(data: &'a mut [u8], layout: ImageLayout) -> Self {
        Self {
            data: &mut data[..layout.len()],
            layout,
        }
    }

    /// The layout of the viewed image.
    pub fn layout(&self) -> ImageLayout {
        self.layout
    }

    /// The size of the viewed image in pixels.
    pub fn size(&self) -> ImageSize {
        self.layout.size()
    }

    /// The width of the viewed image in pixels.
    pub fn width(&self) -> usize {
        self.layout.width()
    }

    /// The height of the viewed image in pixels.
    pub fn height(&self) -> usize {
        self.layout.height()
    }

    /// The row stride in bytes.
    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    /// Reborrow as a read-only view.
    pub fn as_view(&self) -> BgraView<'_> {
        BgraView::from_parts(&*self.data, self.layout)
    }

    /// Reborrow as a shorter-lived mutable view.
    pub fn reborrow(&mut self) -> BgraViewMut<'_> {
        BgraViewMut::from_parts(&mut *self.data, self.layout)
    }

    /// The pixel bytes of row `y`, padding excluded.
    ///
    /// PRECONDITION: `y < height`.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.layout.stride();
        let end = start + self.layout.row_bytes();
        &mut self.data[start..end]
    }

    /// Read the pixel at `(x, y)`.
    ///
    /// PRECONDITION: `x < width` and `y < height`.
    pub fn pixel(&self, x: usize, y: usize) -> Bgra {
        self.as_view().pixel(x, y)
    }

    /// Write the pixel at `(x, y)`.
    ///
    /// PRECONDITION: `x < width` and `y < height`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, px: Bgra) {
        let offset = self.layout.offset(x, y);
        px.write_to(&mut self.data[offset..offset + BYTES_PER_PIXEL]);
    }

    /// The viewed bytes, `stride * height` long.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    /// Copy the pixels of `src` into this view, leaving row padding untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the layouts differ.
    pub fn copy_from(&mut self, src: &BgraView<'_>) -> Result<(), ImageError> {
        self.layout.check_same(&src.layout())?;
        for y in 0..self.height() {
            self.row_mut(y).copy_from_slice(src.row(y));
        }
        Ok(())
    }
}
