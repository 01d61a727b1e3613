//! Pixel data of loaded tiles.

use crate::error::GeotileError;

/// An image that has been decoded into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Raw bytes of the image, in RGBA order.
    bytes: Vec<u8>,
    /// Width and height of the image.
    dimensions: (u32, u32),
}

impl DecodedImage {
    /// Decode an image from a byte slice.
    ///
    /// Attempts to guess the format of the image from the data. Non-RGBA images
    /// will be converted to RGBA.
    pub fn decode(bytes: &[u8]) -> Result<Self, GeotileError> {
        use image::GenericImageView;
        let decoded = image::load_from_memory(bytes)?;
        let dimensions = decoded.dimensions();
        let bytes = decoded.to_rgba8();

        Ok(Self {
            bytes: bytes.into_vec(),
            dimensions,
        })
    }

    /// Creates an image from raw RGBA bytes.
    ///
    /// Returns an error if the length of `bytes` does not match the dimensions.
    pub fn from_raw(bytes: Vec<u8>, width: u32, height: u32) -> Result<Self, GeotileError> {
        if bytes.len() != width as usize * height as usize * 4 {
            return Err(GeotileError::Generic(format!(
                "image buffer of {} bytes does not match size {width}x{height}",
                bytes.len()
            )));
        }

        Ok(Self {
            bytes,
            dimensions: (width, height),
        })
    }

    /// Square image of one color, used as the "loading" placeholder for tiles.
    pub fn solid(size: u32, rgba: [u8; 4]) -> Self {
        let pixels = size as usize * size as usize;
        let mut bytes = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            bytes.extend_from_slice(&rgba);
        }

        Self {
            bytes,
            dimensions: (size, size),
        }
    }

    /// RGBA bytes of the image.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    /// Height of the image in pixels.
    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    /// Approximate size of the image in memory in bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use assert_matches::assert_matches;

    use super::*;

    /// Encodes a small PNG image filled with one color.
    pub(crate) fn png_bytes(size: u32, rgba: [u8; 4]) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(size, size, image::Rgba(rgba));
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, image::ImageOutputFormat::Png)
            .expect("png encoding never fails for rgba");
        buffer.into_inner()
    }

    #[test]
    fn decodes_png() {
        let image = DecodedImage::decode(&png_bytes(4, [10, 20, 30, 255])).expect("valid png");
        assert_eq!(image.width(), 4);
        assert_eq!(image.height(), 4);
        assert_eq!(&image.bytes()[0..4], &[10, 20, 30, 255]);
        assert_eq!(image.byte_size(), 64);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert_matches!(
            DecodedImage::decode(b"definitely not an image"),
            Err(GeotileError::ImageDecode(_))
        );
    }

    #[test]
    fn raw_size_is_checked() {
        assert!(DecodedImage::from_raw(vec![0; 16], 2, 2).is_ok());
        assert!(DecodedImage::from_raw(vec![0; 15], 2, 2).is_err());
    }

    #[test]
    fn solid_fills_every_pixel() {
        let image = DecodedImage::solid(3, [1, 2, 3, 4]);
        assert_eq!(image.byte_size(), 36);
        assert!(image.bytes().chunks(4).all(|px| px == [1, 2, 3, 4]));
    }
}
