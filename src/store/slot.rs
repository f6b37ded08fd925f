//! # 槽位
//!
//! 单图槽位（`max_count == 1`）每次上传整体替换；
//! 多图槽位先追加再截断到前 `max_count` 张，即满了之后新图被丢弃，旧图保留。
//! 这不是滑动窗口，不要改成淘汰最旧的一张。

use crate::image_processor::FittedImage;

use super::{StoreError, TargetSpec};

/// `Slot::push` 的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// 单图槽位被替换；`previous` 表示此前是否已有图片。
    Replaced { previous: bool },
    /// 追加到多图槽位，`index` 为从 0 开始的位置。
    Appended { index: usize },
    /// 多图槽位已满，新图被丢弃，槽位内容不变。
    Dropped,
}

#[derive(Debug, Clone)]
pub struct Slot {
    spec: &'static TargetSpec,
    images: Vec<FittedImage>,
}

impl Slot {
    pub fn new(spec: &'static TargetSpec) -> Self {
        Self {
            spec,
            images: Vec::with_capacity(spec.max_count),
        }
    }

    pub fn spec(&self) -> &'static TargetSpec {
        self.spec
    }

    pub fn images(&self) -> &[FittedImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.images.len() >= self.spec.max_count
    }

    /// 放入一张图片。尺寸与规格不符时拒绝且不修改槽位。
    pub fn push(&mut self, image: FittedImage) -> Result<AcceptOutcome, StoreError> {
        let expected = (self.spec.width, self.spec.height);
        if image.dimensions() != expected {
            return Err(StoreError::DimensionMismatch {
                slot: self.spec.name,
                expected,
                actual: image.dimensions(),
            });
        }

        if self.spec.max_count == 1 {
            let previous = !self.images.is_empty();
            self.images.clear();
            self.images.push(image);
            return Ok(AcceptOutcome::Replaced { previous });
        }

        let before = self.images.len();
        self.images.push(image);
        self.images.truncate(self.spec.max_count);

        if self.images.len() == before {
            return Ok(AcceptOutcome::Dropped);
        }
        Ok(AcceptOutcome::Appended { index: before })
    }
}
