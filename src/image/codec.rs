//! Wire-format conversion for edit requests and responses.

use crate::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

/// Quality used for every outgoing image (0.8 on a 0..1 scale).
pub const JPEG_QUALITY: u8 = 80;

/// Encodes `image` as baseline JPEG. Alpha is dropped since JPEG has none.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(&rgb)
        .map_err(Error::ImageEncoding)?;
    Ok(bytes)
}

/// Decodes bytes in any format the `image` crate recognises.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::ImageFormat;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            8,
            6,
            image::Rgba([10, 20, 30, 128]),
        ));

        let jpeg = encode_jpeg(&img, JPEG_QUALITY).unwrap();
        assert_eq!(&jpeg[..3], &[0xFF, 0xD8, 0xFF]);

        let decoded = decode_image(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_fn(64, 64, |x, y| {
            image::Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
        }));

        let high = encode_jpeg(&img, 100).unwrap();
        let low = encode_jpeg(&img, 10).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_decode_png() {
        let decoded = decode_image(&png_bytes(3, 5)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 5));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Image(_)));
    }
}
