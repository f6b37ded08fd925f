//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageProcessor` 只负责流程编排与配置管理，不持有任何图片状态。
//! 处理链路固定为：
//! 1. 读取配置快照
//! 2. 按来源加载原始字节
//! 3. 解码为 `SourceImage`
//! 4. 适配到目标画布
//! 5. JPEG 编码为 `FittedImage`
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ImageConfig>>` 支持运行时动态切档。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 记录 `load/decode/fit/encode/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::config::ImageSettings;
use super::encoder::encode_jpeg;
use super::fit::fit_to_canvas;
use super::source::{FittedImage, SourceImage};
use super::{ImageConfig, ImageError, ImagePerformanceProfile, ImageSource};

/// 图片处理器。
///
/// 可在线程间共享；克隆得到的处理器共用同一份配置。
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    config: Arc<RwLock<ImageConfig>>,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new(ImageConfig::default())
    }
}

impl ImageProcessor {
    pub fn new(config: ImageConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置快照。
    pub fn config_snapshot(&self) -> Result<ImageConfig, ImageError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ImageError::Config("配置读取锁已中毒".to_string()))
    }

    /// 设置性能档位。
    ///
    /// # 示例
    /// ```rust
    /// use store_image_processor::image_processor::{ImagePerformanceProfile, ImageProcessor};
    ///
    /// let processor = ImageProcessor::default();
    /// processor.set_performance_profile(ImagePerformanceProfile::Balanced)?;
    /// assert_eq!(processor.get_performance_profile()?, ImagePerformanceProfile::Balanced);
    /// # Ok::<(), store_image_processor::image_processor::ImageError>(())
    /// ```
    pub fn set_performance_profile(&self, profile: ImagePerformanceProfile) -> Result<(), ImageError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| ImageError::Config("配置写入锁已中毒".to_string()))?;
        config.apply_performance_profile(profile);

        log::info!(
            "⚙️ 已切换图片性能档位：{:?}（filter={:?}）",
            profile,
            config.resize_filter
        );

        Ok(())
    }

    /// 获取当前生效档位。
    pub fn get_performance_profile(&self) -> Result<ImagePerformanceProfile, ImageError> {
        let config = self
            .config
            .read()
            .map_err(|_| ImageError::Config("配置读取锁已中毒".to_string()))?;
        Ok(config.infer_performance_profile())
    }

    /// 应用持久化设置；校验失败时配置保持不变。
    pub fn apply_settings(&self, settings: &ImageSettings) -> Result<(), ImageError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| ImageError::Config("配置写入锁已中毒".to_string()))?;

        let mut updated = config.clone();
        settings.apply_to(&mut updated)?;
        *config = updated;

        log::info!(
            "⚙️ 已应用图片设置（filter={:?}, max_file_size={}, max_pixels={}, jpeg_quality={}）",
            config.resize_filter,
            config.max_file_size,
            config.max_decoded_pixels,
            config.jpeg_quality
        );

        Ok(())
    }

    /// 仅解码，不做适配。
    pub fn decode(&self, source: ImageSource) -> Result<SourceImage, ImageError> {
        let config = self.config_snapshot()?;
        let raw = self.load_source(source, &config)?;
        self.decode_source(raw, &config)
    }

    /// 将已解码源图适配到目标尺寸并编码。
    pub fn fit(
        &self,
        source: &SourceImage,
        target_width: u32,
        target_height: u32,
    ) -> Result<FittedImage, ImageError> {
        let config = self.config_snapshot()?;
        Self::fit_with_config(source, target_width, target_height, &config)
    }

    fn fit_with_config(
        source: &SourceImage,
        target_width: u32,
        target_height: u32,
        config: &ImageConfig,
    ) -> Result<FittedImage, ImageError> {
        let fitted = fit_to_canvas(source, target_width, target_height, config.resize_filter)?;
        let bytes = encode_jpeg(&fitted.canvas, config.jpeg_quality)?;

        Ok(FittedImage {
            width: target_width,
            height: target_height,
            bytes,
            layout: fitted.layout,
            background: fitted.background,
        })
    }

    /// 处理主入口：从任意来源加载、解码、适配并编码。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use store_image_processor::image_processor::{ImageProcessor, ImageSource};
    ///
    /// let processor = ImageProcessor::default();
    /// let fitted = processor.process(ImageSource::FilePath("shot.png".into()), 1280, 800)?;
    /// assert_eq!(fitted.dimensions(), (1280, 800));
    /// # Ok::<(), store_image_processor::image_processor::ImageError>(())
    /// ```
    pub fn process(
        &self,
        source: ImageSource,
        target_width: u32,
        target_height: u32,
    ) -> Result<FittedImage, ImageError> {
        let config = self.config_snapshot()?;
        let source_kind = source.kind();
        let total_start = Instant::now();

        let load_start = Instant::now();
        let raw = self.load_source(source, &config)?;
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let decoded = self.decode_source(raw, &config)?;
        let decode_elapsed = decode_start.elapsed();

        let fit_start = Instant::now();
        let fitted = fit_to_canvas(&decoded, target_width, target_height, config.resize_filter)?;
        let fit_elapsed = fit_start.elapsed();

        let encode_start = Instant::now();
        let bytes = encode_jpeg(&fitted.canvas, config.jpeg_quality)?;
        let encode_elapsed = encode_start.elapsed();

        log::info!(
            "✅ 图片处理完成 - 来源: {} {}x{} -> {}x{} load={}ms decode={}ms fit={}ms encode={}ms total={}ms",
            source_kind,
            decoded.width(),
            decoded.height(),
            target_width,
            target_height,
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            fit_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(FittedImage {
            width: target_width,
            height: target_height,
            bytes,
            layout: fitted.layout,
            background: fitted.background,
        })
    }
}
