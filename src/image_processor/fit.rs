//! # 画布适配模块
//!
//! ## 设计思路
//!
//! 把任意尺寸的源图“等比缩放 + 居中 + 纯色补边”到固定画布上。
//! 背景色取源图左上角 (0,0) 像素的 RGB，只取这一个像素，不做平均；
//! 该行为与历史输出保持一致，不要改成主色提取。
//!
//! ## 实现思路
//!
//! 1. `FitLayout::compute` 计算缩放比例与内容矩形（整数像素）
//! 2. 以背景色填满整张 RGB 画布
//! 3. 用 `fast_image_resize` 卷积缩放源图（失败时回退 `image::imageops::resize`）
//! 4. 按 alpha 将内容混合到画布上，画布始终不透明
//!
//! 本模块不做编码，输出的 `FitCanvas` 是纯像素结果，便于逐像素校验。

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{ImageBuffer, Rgb, RgbImage, Rgba, RgbaImage};

use super::source::SourceImage;
use super::ImageError;

/// 内容矩形在画布中的布局。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitLayout {
    /// 统一缩放比例 `min(tw / sw, th / sh)`。
    pub scale: f64,
    pub offset_x: u32,
    pub offset_y: u32,
    pub content_width: u32,
    pub content_height: u32,
}

impl FitLayout {
    /// 计算等比适配布局。
    ///
    /// 内容宽高四舍五入到整数像素并限制在 `1..=目标尺寸` 内，
    /// 偏移量向下取整，因此奇数余量时右/下条带多 1 像素。
    ///
    /// ```rust
    /// use store_image_processor::image_processor::FitLayout;
    ///
    /// let layout = FitLayout::compute(2000, 1000, 1280, 800)?;
    /// assert_eq!((layout.content_width, layout.content_height), (1280, 640));
    /// assert_eq!((layout.offset_x, layout.offset_y), (0, 80));
    /// # Ok::<(), store_image_processor::image_processor::ImageError>(())
    /// ```
    pub fn compute(
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> Result<Self, ImageError> {
        if target_width == 0 || target_height == 0 {
            return Err(ImageError::InvalidDimensions(format!(
                "目标尺寸为 {}x{}",
                target_width, target_height
            )));
        }
        if source_width == 0 || source_height == 0 {
            return Err(ImageError::InvalidDimensions(format!(
                "源图尺寸为 {}x{}",
                source_width, source_height
            )));
        }

        let scale = (target_width as f64 / source_width as f64)
            .min(target_height as f64 / source_height as f64);

        let content_width = Self::scaled_extent(source_width, scale, target_width);
        let content_height = Self::scaled_extent(source_height, scale, target_height);

        Ok(Self {
            scale,
            offset_x: (target_width - content_width) / 2,
            offset_y: (target_height - content_height) / 2,
            content_width,
            content_height,
        })
    }

    fn scaled_extent(extent: u32, scale: f64, limit: u32) -> u32 {
        ((extent as f64 * scale).round() as u32).clamp(1, limit)
    }

    /// 坐标是否落在内容矩形内。
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.offset_x
            && y >= self.offset_y
            && x < self.offset_x + self.content_width
            && y < self.offset_y + self.content_height
    }

    /// 内容是否铺满整张画布（无补边）。
    pub fn covers(&self, target_width: u32, target_height: u32) -> bool {
        self.offset_x == 0
            && self.offset_y == 0
            && self.content_width == target_width
            && self.content_height == target_height
    }
}

/// 适配后的未编码画布。
#[derive(Debug, Clone)]
pub struct FitCanvas {
    pub canvas: RgbImage,
    pub layout: FitLayout,
    pub background: Rgb<u8>,
}

/// 将源图适配到 `target_width x target_height` 的画布上。
pub fn fit_to_canvas(
    source: &SourceImage,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<FitCanvas, ImageError> {
    let layout = FitLayout::compute(source.width(), source.height(), target_width, target_height)?;
    let background = source.top_left_rgb();

    let mut canvas = RgbImage::from_pixel(target_width, target_height, background);
    let content = resize_content(source, layout.content_width, layout.content_height, filter)?;
    composite_over(&mut canvas, &content, &layout, background);

    Ok(FitCanvas {
        canvas,
        layout,
        background,
    })
}

fn resize_content(
    source: &SourceImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<RgbaImage, ImageError> {
    if (width, height) == (source.width(), source.height()) {
        return Ok(source.pixels().clone());
    }

    match resize_with_fast_image_resize(source.pixels(), width, height, filter) {
        Ok(resized) => Ok(resized),
        Err(err) => {
            log::warn!(
                "⚠️ fast_image_resize 缩放失败，回退 image::imageops::resize：{}",
                err
            );
            Ok(image::imageops::resize(source.pixels(), width, height, filter))
        }
    }
}

fn resize_with_fast_image_resize(
    src: &RgbaImage,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<RgbaImage, ImageError> {
    let (src_width, src_height) = src.dimensions();

    let src_image = fr::images::Image::from_vec_u8(
        src_width,
        src_height,
        src.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| ImageError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new()
        .resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ImageError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| ImageError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))
}

// 卷积核不提供最近邻，Nearest 一律按双线性处理。
fn to_fast_filter(filter: FilterType) -> fr::FilterType {
    match filter {
        FilterType::Nearest | FilterType::Triangle => fr::FilterType::Bilinear,
        FilterType::CatmullRom => fr::FilterType::CatmullRom,
        FilterType::Gaussian => fr::FilterType::Mitchell,
        FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}

fn composite_over(canvas: &mut RgbImage, content: &RgbaImage, layout: &FitLayout, background: Rgb<u8>) {
    for (x, y, pixel) in content.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let out = match a {
            255 => Rgb([r, g, b]),
            0 => background,
            _ => Rgb([
                blend_channel(r, background[0], a),
                blend_channel(g, background[1], a),
                blend_channel(b, background[2], a),
            ]),
        };
        canvas.put_pixel(layout.offset_x + x, layout.offset_y + y, out);
    }
}

fn blend_channel(foreground: u8, background: u8, alpha: u8) -> u8 {
    let alpha = alpha as u32;
    ((foreground as u32 * alpha + background as u32 * (255 - alpha) + 127) / 255) as u8
}
