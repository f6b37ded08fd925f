//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ImageConfig`，画布尺寸本身不在此列（见 `store::target`），
//! 这里只管输入上限、重采样滤镜与 JPEG 质量。
//! 性能档位（quality / balanced / speed）作为高层语义，映射到底层滤镜。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用配置（最佳画质 + JPEG 95）。
//! - `ImagePerformanceProfile` 负责档位字符串解析与反向输出。
//! - `ImageSettings` 是 JSON 设置文件的形状，`apply_to` 校验后写回配置。
//! - 任何档位都不会选择最近邻采样：输出必须是平滑插值。

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::ImageError;

/// JPEG 输出的默认质量（对应 0.95）。
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// 图片处理配置。
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 缩放滤镜。
    pub resize_filter: FilterType,
    /// JPEG 编码质量（1..=100）。
    pub jpeg_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            resize_filter: FilterType::Lanczos3,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// 图片性能档位（面向产品/用户语义）。
///
/// - `Quality`：Lanczos3，尽量保真（默认）
/// - `Balanced`：CatmullRom
/// - `Speed`：双线性，仍满足平滑插值要求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePerformanceProfile {
    Quality,
    Balanced,
    Speed,
}

impl ImagePerformanceProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use store_image_processor::image_processor::ImagePerformanceProfile;
    ///
    /// let p = ImagePerformanceProfile::from_str("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), store_image_processor::image_processor::ImageError>(())
    /// ```
    pub fn from_str(profile: &str) -> Result<Self, ImageError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(ImageError::Config(format!(
                "未知性能档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串，供前端展示与持久化。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }

    fn filter(self) -> FilterType {
        match self {
            Self::Quality => FilterType::Lanczos3,
            Self::Balanced => FilterType::CatmullRom,
            Self::Speed => FilterType::Triangle,
        }
    }
}

impl ImageConfig {
    /// 基于当前滤镜反推性能档位。
    pub fn infer_performance_profile(&self) -> ImagePerformanceProfile {
        match self.resize_filter {
            FilterType::Lanczos3 | FilterType::Gaussian => ImagePerformanceProfile::Quality,
            FilterType::CatmullRom => ImagePerformanceProfile::Balanced,
            FilterType::Triangle | FilterType::Nearest => ImagePerformanceProfile::Speed,
        }
    }

    /// 应用指定性能档位到实际参数。
    pub fn apply_performance_profile(&mut self, profile: ImagePerformanceProfile) {
        self.resize_filter = profile.filter();
    }
}

/// 持久化设置的 JSON 形状。
///
/// 所有字段可选，缺省即沿用当前配置。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size_mb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_decoded_pixels: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jpeg_quality: Option<u8>,
}

impl ImageSettings {
    pub fn from_json_str(content: &str) -> Result<Self, ImageError> {
        serde_json::from_str(content)
            .map_err(|e| ImageError::Config(format!("解析设置失败：{}", e)))
    }

    pub fn to_json_string(&self) -> Result<String, ImageError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ImageError::Config(format!("序列化设置失败：{}", e)))
    }

    /// 从当前配置导出设置快照。
    pub fn from_config(config: &ImageConfig) -> Self {
        Self {
            profile: Some(config.infer_performance_profile().as_str().to_string()),
            max_file_size_mb: Some(config.max_file_size / 1024 / 1024),
            max_decoded_pixels: Some(config.max_decoded_pixels),
            jpeg_quality: Some(config.jpeg_quality),
        }
    }

    /// 校验全部字段后再写入配置；任一字段非法则配置保持不变。
    pub fn apply_to(&self, config: &mut ImageConfig) -> Result<(), ImageError> {
        let profile = self
            .profile
            .as_deref()
            .map(ImagePerformanceProfile::from_str)
            .transpose()?;

        if let Some(mb) = self.max_file_size_mb {
            if !(1..=512).contains(&mb) {
                return Err(ImageError::Config(
                    "maxFileSizeMb 必须在 1~512 之间".to_string(),
                ));
            }
        }
        if let Some(pixels) = self.max_decoded_pixels {
            if pixels < 1_000_000 {
                return Err(ImageError::Config(
                    "maxDecodedPixels 不能小于 1000000".to_string(),
                ));
            }
        }
        if let Some(quality) = self.jpeg_quality {
            if !(1..=100).contains(&quality) {
                return Err(ImageError::Config(
                    "jpegQuality 必须在 1~100 之间".to_string(),
                ));
            }
        }

        if let Some(profile) = profile {
            config.apply_performance_profile(profile);
        }
        if let Some(mb) = self.max_file_size_mb {
            config.max_file_size = mb * 1024 * 1024;
        }
        if let Some(pixels) = self.max_decoded_pixels {
            config.max_decoded_pixels = pixels;
            config.max_decoded_bytes = config.max_decoded_bytes.max(pixels.saturating_mul(4));
        }
        if let Some(quality) = self.jpeg_quality {
            config.jpeg_quality = quality;
        }

        Ok(())
    }
}
