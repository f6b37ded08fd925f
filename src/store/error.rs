//! 集合存储的错误类型。

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 导出时截图槽位为空。
    #[error("请至少上传一张截图后再导出")]
    EmptyExport,

    #[error("图片尺寸与槽位 {slot} 不符：期望 {expected:?}，实际 {actual:?}")]
    DimensionMismatch {
        slot: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("未知槽位：{0}")]
    UnknownSlot(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyExport => "empty_export",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::UnknownSlot(_) => "unknown_slot",
        }
    }
}
