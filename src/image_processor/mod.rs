//! # 图片处理模块（image_processor）
//!
//! ## 设计思路
//!
//! 该模块将“来源加载 → 解码校验 → 画布适配 → JPEG 编码”按职责拆分为多个子模块，
//! 每个阶段都是纯函数式的：不持有图片状态，失败只影响当前这一张输入。
//!
//! - `processor`：编排整条处理流水线，持有可切换的配置
//! - `loader`：负责字节/Base64/文件加载与签名、体积校验
//! - `pipeline`：负责解码与像素/内存上限
//! - `fit`：等比缩放、居中、左上角取色补边
//! - `encoder`：固定质量 JPEG 编码
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! 调用方（上传事件）
//!    ↓
//! processor.rs（配置快照 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 体积/签名校验）
//!    ├─ pipeline.rs（解码 + 像素限制）
//!    ├─ fit.rs（FitLayout + 补边画布）
//!    └─ encoder.rs（JPEG 95）
//!    ↓
//! FittedImage → store::CollectionStore
//! ```

mod config;
mod encoder;
mod error;
mod fit;
mod loader;
mod pipeline;
mod processor;
mod source;

pub use config::{DEFAULT_JPEG_QUALITY, ImageConfig, ImagePerformanceProfile, ImageSettings};
pub use encoder::JPEG_MIME_TYPE;
pub use error::ImageError;
pub use fit::{FitCanvas, FitLayout, fit_to_canvas};
pub use processor::ImageProcessor;
pub use source::{FittedImage, ImageSource, SourceImage};

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Cursor;

    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba, RgbaImage};

    use super::SourceImage;

    pub(crate) fn gradient_pixels(width: u32, height: u32) -> RgbaImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x % 255) as u8;
            let g = (y % 255) as u8;
            let b = ((x + y) % 255) as u8;
            Rgba([r, g, b, 255])
        })
    }

    pub(crate) fn solid_source(width: u32, height: u32, rgba: [u8; 4]) -> SourceImage {
        SourceImage::from_rgba(RgbaImage::from_pixel(width, height, Rgba(rgba)))
            .expect("solid source should be valid")
    }

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(gradient_pixels(width, height))
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }
}
