//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，会话层所有对外函数统一返回 `Result<T, AppError>`。
//! UI 侧通过 `Serialize` 获得可直接展示的错误信息。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ImageError` / `StoreError` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串。

use serde::Serialize;

use crate::image_processor::ImageError;
use crate::store::StoreError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片处理流水线错误（加载 / 解码 / 适配 / 编码）
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 槽位或导出错误
    #[error("{0}")]
    Store(#[from] StoreError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 会话内部状态异常（锁中毒、后台任务丢失）
    #[error("会话状态异常: {0}")]
    State(String),
}

impl AppError {
    /// 稳定的错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Image(e) => e.code(),
            Self::Store(e) => e.code(),
            Self::Io(_) => "io",
            Self::State(_) => "state",
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
