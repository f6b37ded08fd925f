//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `RawImageData` 表示已加载但未解码的字节
//! - `SourceImage` 表示解码后的 RGBA 源图（不可变）
//! - `FittedImage` 表示已适配到目标画布并完成 JPEG 编码的结果

use std::path::PathBuf;

use bytes::Bytes;
use image::{Rgb, RgbaImage};

use super::fit::FitLayout;
use super::ImageError;

/// 图片输入来源。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// 已在内存中的原始字节（文件选择器直接交付）。
    Bytes(Vec<u8>),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 本地文件路径来源。
    FilePath(PathBuf),
}

impl ImageSource {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
            Self::Base64(_) => "base64",
            Self::FilePath(_) => "file",
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 解码后的源图。
///
/// 宽高均保证大于 0。
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self, ImageError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidDimensions(format!(
                "源图尺寸为 {}x{}",
                width, height
            )));
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// 左上角 (0,0) 像素的 RGB 值，忽略 alpha。
    pub fn top_left_rgb(&self) -> Rgb<u8> {
        let [r, g, b, _] = self.pixels.get_pixel(0, 0).0;
        Rgb([r, g, b])
    }
}

/// 适配完成的输出图片。
///
/// `bytes` 为 JPEG 数据，宽高恒等于生成它时的目标尺寸。
#[derive(Debug, Clone)]
pub struct FittedImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) bytes: Bytes,
    pub(crate) layout: FitLayout,
    pub(crate) background: Rgb<u8>,
}

impl FittedImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// JPEG 编码后的字节。
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// 内容区域在画布中的位置。
    pub fn layout(&self) -> &FitLayout {
        &self.layout
    }

    /// 填充条带使用的背景色。
    pub fn background(&self) -> Rgb<u8> {
        self.background
    }
}
