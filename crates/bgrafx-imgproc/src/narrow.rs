use num_traits::ToPrimitive;

/// How a real-valued accumulator is narrowed to an 8-bit channel value.
///
/// Both modes truncate toward zero first. `NaN` narrows to `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Narrowing {
    /// Keep the low 8 bits of the truncated value, so `300.0` becomes `44`
    /// and `-1.0` becomes `255`. Bit-exact with a plain double to byte cast.
    #[default]
    Wrapping,

    /// Clamp the truncated value to `[0, 255]`.
    Saturating,
}

impl Narrowing {
    /// Map the `saturate` flag to a narrowing mode.
    pub fn from_flag(saturate: bool) -> Self {
        if saturate {
            Narrowing::Saturating
        } else {
            Narrowing::Wrapping
        }
    }

    /// Narrow `value` to a byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use bgrafx_imgproc::narrow::Narrowing;
    ///
    /// assert_eq!(Narrowing::Wrapping.narrow(300.7), 44);
    /// assert_eq!(Narrowing::Saturating.narrow(300.7), 255);
    /// assert_eq!(Narrowing::Wrapping.narrow(76.245), 76);
    /// ```
    #[inline]
    pub fn narrow(self, value: f64) -> u8 {
        match self {
            Narrowing::Wrapping => value.trunc().to_i64().map_or(0, |v| v as u8),
            Narrowing::Saturating => {
                if value.is_nan() {
                    0
                } else {
                    value.trunc().clamp(0.0, 255.0) as u8
                }
            }
        }
    }
}
