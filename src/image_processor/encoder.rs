//! JPEG 编码。
//!
//! 固定质量参数，相同画布总是得到相同字节。

use bytes::Bytes;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;

use super::ImageError;

pub const JPEG_MIME_TYPE: &str = "image/jpeg";

pub(crate) fn encode_jpeg(canvas: &RgbImage, quality: u8) -> Result<Bytes, ImageError> {
    let quality = quality.clamp(1, 100);
    let (width, height) = canvas.dimensions();

    let mut buf = Vec::with_capacity((width as usize * height as usize) / 4);
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(canvas)
        .map_err(|e| ImageError::Encode(format!("JPEG 编码失败：{}", e)))?;

    Ok(Bytes::from(buf))
}
