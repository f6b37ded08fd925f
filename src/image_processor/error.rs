//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载图片链路（加载 → 解码 → 适配 → 编码）中的所有错误来源，
//! 调用侧可按分支匹配，也可通过 `code()` / `stage()` 获得稳定的机器可读标识。

/// 图片处理统一错误类型。
///
/// 任何一个变体都只代表“本次输入被拒绝”，不会影响集合中已有的图片。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("尺寸无效：{0}")]
    InvalidDimensions(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    /// 设置非法或配置锁不可用，与具体输入无关。
    #[error("配置错误：{0}")]
    Config(String),
}

impl ImageError {
    /// 稳定的错误码，供 UI 侧做分支提示。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_failed",
            Self::InvalidFormat(_) => "invalid_format",
            Self::InvalidDimensions(_) => "invalid_dimensions",
            Self::ResourceLimit(_) => "resource_limit",
            Self::Encode(_) => "encode_failed",
            Self::FileSystem(_) => "file_system",
            Self::Config(_) => "invalid_config",
        }
    }

    /// 出错所在的流水线阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::FileSystem(_) => "load",
            Self::Decode(_) | Self::InvalidFormat(_) | Self::ResourceLimit(_) => "decode",
            Self::InvalidDimensions(_) => "fit",
            Self::Encode(_) => "encode",
            Self::Config(_) => "config",
        }
    }

    /// 输入本身无法作为图片使用（而非配置或编码问题）。
    pub fn is_rejected_input(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::InvalidFormat(_))
    }
}

impl From<ImageError> for String {
    fn from(error: ImageError) -> Self {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_stages_are_stable() {
        let err = ImageError::Decode("bad".to_string());
        assert_eq!(err.code(), "decode_failed");
        assert_eq!(err.stage(), "decode");
        assert!(err.is_rejected_input());

        let err = ImageError::InvalidDimensions("0x0".to_string());
        assert_eq!(err.code(), "invalid_dimensions");
        assert_eq!(err.stage(), "fit");
        assert!(!err.is_rejected_input());
    }

    #[test]
    fn config_errors_report_config_stage() {
        let err = ImageError::Config("jpegQuality".to_string());
        assert_eq!(err.code(), "invalid_config");
        assert_eq!(err.stage(), "config");
        assert!(!err.is_rejected_input());
    }

    #[test]
    fn display_keeps_detail() {
        let message: String = ImageError::Encode("jpeg".to_string()).into();
        assert!(message.contains("jpeg"));
    }
}
