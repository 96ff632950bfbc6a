/// Number of bytes occupied by one pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A pixel stored as Blue, Green, Red, Alpha bytes, in that order.
///
/// The layout matches the in-memory order of the buffers the engine filters,
/// so a pixel can be read from or written to any 4-byte slot of a row.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bgra {
    /// Blue channel
    pub b: u8,
    /// Green channel
    pub g: u8,
    /// Red channel
    pub r: u8,
    /// Alpha channel
    pub a: u8,
}

impl Bgra {
    /// Opaque black.
    pub const BLACK: Bgra = Bgra::opaque(0, 0, 0);

    /// Opaque white.
    pub const WHITE: Bgra = Bgra::opaque(255, 255, 255);

    /// Create a pixel from its four channels.
    pub const fn new(b: u8, g: u8, r: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Create a pixel with alpha fixed at 255.
    pub const fn opaque(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r, a: 255 }
    }

    /// Create an opaque pixel with the same value in every color channel.
    pub const fn gray(v: u8) -> Self {
        Self::opaque(v, v, v)
    }

    /// Read a pixel from the first four bytes of `bytes`.
    ///
    /// PRECONDITION: `bytes.len() >= 4`.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            b: bytes[0],
            g: bytes[1],
            r: bytes[2],
            a: bytes[3],
        }
    }

    /// Write the pixel into the first four bytes of `bytes`.
    ///
    /// PRECONDITION: `bytes.len() >= 4`.
    #[inline]
    pub fn write_to(self, bytes: &mut [u8]) {
        bytes[..BYTES_PER_PIXEL].copy_from_slice(&self.to_bytes());
    }

    /// The pixel as `[b, g, r, a]`.
    #[inline]
    pub const fn to_bytes(self) -> [u8; BYTES_PER_PIXEL] {
        [self.b, self.g, self.r, self.a]
    }
}

impl From<[u8; BYTES_PER_PIXEL]> for Bgra {
    fn from(bytes: [u8; BYTES_PER_PIXEL]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

impl From<Bgra> for [u8; BYTES_PER_PIXEL] {
    fn from(px: Bgra) -> Self {
        px.to_bytes()
    }
}
