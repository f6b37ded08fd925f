//! # 导出数据
//!
//! 导出只返回 `(文件名, 字节, MIME)`，落盘或触发下载由调用方负责。

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;

use crate::image_processor::JPEG_MIME_TYPE;

/// 一张待交付的输出图片。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Bytes,
}

impl ExportedImage {
    pub(crate) fn jpeg(file_name: String, bytes: Bytes) -> Self {
        Self {
            file_name,
            mime_type: JPEG_MIME_TYPE,
            bytes,
        }
    }

    /// 渲染为 `data:image/jpeg;base64,...`，可直接作为下载链接或预览地址。
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}
