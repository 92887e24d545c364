//! Borrowed input raster as handed over by the caller.

use serde::{Deserialize, Serialize};

/// Transfer function of the raster samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Gamma-encoded sRGB (the usual camera/JPEG/PNG output).
    #[default]
    Srgb,
    /// Linear-light RGB (raw developers, HDR pipelines).
    Linear,
}

/// Interleaved pixel storage.
#[derive(Clone, Copy, Debug)]
pub enum PixelData<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
}

impl PixelData<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            PixelData::U8(d) => d.len(),
            PixelData::U16(d) => d.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Raster construction and format errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("unsupported raster format: {channels} channel(s) at {bit_depth} bit(s)")]
    UnsupportedFormat { channels: usize, bit_depth: u8 },
    #[error("invalid raster buffer length (expected {expected} samples, got {got})")]
    BufferSize { expected: usize, got: usize },
    #[error("invalid raster dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
}

/// Immutable 2D grid of interleaved pixels, borrowed from the caller.
///
/// Rows are stored top to bottom with no padding; every pixel carries
/// `channels` samples. `bit_depth` is the number of significant bits per
/// sample: 8 for [`PixelData::U8`], up to 16 for [`PixelData::U16`].
#[derive(Clone, Copy, Debug)]
pub struct Raster<'a> {
    width: usize,
    height: usize,
    channels: usize,
    bit_depth: u8,
    encoding: Encoding,
    data: PixelData<'a>,
}

impl<'a> Raster<'a> {
    /// Wrap an 8-bit buffer.
    pub fn from_u8(
        width: usize,
        height: usize,
        channels: usize,
        data: &'a [u8],
    ) -> Result<Self, RasterError> {
        Self::new(width, height, channels, 8, PixelData::U8(data))
    }

    /// Wrap a 16-bit container buffer with `bit_depth` significant bits.
    pub fn from_u16(
        width: usize,
        height: usize,
        channels: usize,
        bit_depth: u8,
        data: &'a [u16],
    ) -> Result<Self, RasterError> {
        Self::new(width, height, channels, bit_depth, PixelData::U16(data))
    }

    /// Build a raster, checking the buffer size against the declared shape.
    ///
    /// Channel count and bit depth are *not* checked here; the normalizer
    /// rejects unsupported combinations with [`RasterError::UnsupportedFormat`].
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        bit_depth: u8,
        data: PixelData<'a>,
    ) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions { width, height });
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .ok_or(RasterError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(RasterError::BufferSize {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            bit_depth,
            encoding: Encoding::Srgb,
            data,
        })
    }

    /// Declare the transfer function of the samples (sRGB by default).
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[inline]
    pub fn data(&self) -> PixelData<'a> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_buffers() {
        let data = [0u8; 11];
        let err = Raster::from_u8(2, 2, 3, &data).unwrap_err();
        assert_eq!(
            err,
            RasterError::BufferSize {
                expected: 12,
                got: 11
            }
        );
    }

    #[test]
    fn rejects_empty_dimensions() {
        let err = Raster::from_u8(0, 4, 1, &[]).unwrap_err();
        assert!(matches!(err, RasterError::InvalidDimensions { .. }));
    }

    #[test]
    fn encoding_defaults_to_srgb() {
        let data = [0u16; 4];
        let raster = Raster::from_u16(2, 2, 1, 12, &data).expect("raster");
        assert_eq!(raster.encoding(), Encoding::Srgb);
        assert_eq!(raster.bit_depth(), 12);
        let linear = raster.with_encoding(Encoding::Linear);
        assert_eq!(linear.encoding(), Encoding::Linear);
    }
}
