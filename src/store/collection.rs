//! # 集合存储
//!
//! ## 设计思路
//!
//! `CollectionStore` 是一次处理会话内所有输出图片的唯一持有者，
//! 每个 `SlotKind` 对应一个 `Slot`。没有清空操作：会话结束即丢弃整个存储。
//!
//! ## 实现思路
//!
//! - `accept` 委托给槽位策略（替换 / 追加后截断），失败时存储保持不变。
//! - `export_all` 先检查截图槽位非空，再按“截图 → 小宣传图 → 横幅宣传图”顺序产出文件。

use crate::image_processor::FittedImage;

use super::{AcceptOutcome, ExportedImage, Slot, SlotKind, StoreError};

#[derive(Debug, Clone)]
pub struct CollectionStore {
    slots: [Slot; 3],
}

impl Default for CollectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionStore {
    pub fn new() -> Self {
        Self {
            slots: SlotKind::ALL.map(|kind| Slot::new(kind.spec())),
        }
    }

    fn slot(&self, kind: SlotKind) -> &Slot {
        &self.slots[Self::index(kind)]
    }

    fn slot_mut(&mut self, kind: SlotKind) -> &mut Slot {
        &mut self.slots[Self::index(kind)]
    }

    fn index(kind: SlotKind) -> usize {
        match kind {
            SlotKind::Screenshot => 0,
            SlotKind::SmallPromo => 1,
            SlotKind::MarqueePromo => 2,
        }
    }

    /// 将一张已适配图片放入槽位。
    pub fn accept(&mut self, kind: SlotKind, image: FittedImage) -> Result<AcceptOutcome, StoreError> {
        let outcome = self.slot_mut(kind).push(image)?;

        match outcome {
            AcceptOutcome::Dropped => log::warn!(
                "🚫 槽位 {} 已满（{} 张），丢弃新上传的图片",
                kind,
                kind.spec().max_count
            ),
            AcceptOutcome::Replaced { previous } => {
                log::debug!("🔁 槽位 {} 已更新（替换旧图：{}）", kind, previous)
            }
            AcceptOutcome::Appended { index } => {
                log::debug!("➕ 槽位 {} 追加第 {} 张", kind, index + 1)
            }
        }

        Ok(outcome)
    }

    /// 按名称放入，名称解析规则见 `SlotKind::from_str`。
    pub fn accept_named(&mut self, slot_name: &str, image: FittedImage) -> Result<AcceptOutcome, StoreError> {
        let kind = SlotKind::from_str(slot_name)?;
        self.accept(kind, image)
    }

    pub fn images(&self, kind: SlotKind) -> &[FittedImage] {
        self.slot(kind).images()
    }

    pub fn len(&self, kind: SlotKind) -> usize {
        self.slot(kind).len()
    }

    pub fn is_empty(&self, kind: SlotKind) -> bool {
        self.slot(kind).is_empty()
    }

    /// 所有必选槽位都有内容时才可导出。
    pub fn can_export(&self) -> bool {
        SlotKind::ALL
            .iter()
            .all(|kind| !kind.required_for_export() || !self.is_empty(*kind))
    }

    /// 导出全部图片。
    ///
    /// 截图槽位为空时返回 `StoreError::EmptyExport`，即使宣传图已就绪。
    pub fn export_all(&self) -> Result<Vec<ExportedImage>, StoreError> {
        if !self.can_export() {
            return Err(StoreError::EmptyExport);
        }

        let exported: Vec<ExportedImage> = SlotKind::ALL
            .iter()
            .flat_map(|kind| {
                self.images(*kind)
                    .iter()
                    .enumerate()
                    .map(move |(index, image)| {
                        ExportedImage::jpeg(kind.file_name(index), image.bytes().clone())
                    })
            })
            .collect();

        log::info!("📦 导出 {} 张图片", exported.len());
        Ok(exported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::fitted;
    use crate::store::{MARQUEE_PROMO, SCREENSHOT, SMALL_PROMO};

    fn names(exported: &[ExportedImage]) -> Vec<&str> {
        exported.iter().map(|e| e.file_name.as_str()).collect()
    }

    #[test]
    fn export_requires_a_screenshot_even_with_promos() {
        let mut store = CollectionStore::new();
        store.accept(SlotKind::SmallPromo, fitted(&SMALL_PROMO, 1)).expect("accept");
        store.accept(SlotKind::MarqueePromo, fitted(&MARQUEE_PROMO, 2)).expect("accept");

        assert!(!store.can_export());
        assert!(matches!(store.export_all(), Err(StoreError::EmptyExport)));
    }

    #[test]
    fn export_names_screenshots_then_promos() {
        let mut store = CollectionStore::new();
        for tag in 1..=3u8 {
            store.accept(SlotKind::Screenshot, fitted(&SCREENSHOT, tag)).expect("accept");
        }
        store.accept(SlotKind::MarqueePromo, fitted(&MARQUEE_PROMO, 9)).expect("accept");
        store.accept(SlotKind::SmallPromo, fitted(&SMALL_PROMO, 8)).expect("accept");

        let exported = store.export_all().expect("export");

        assert_eq!(
            names(&exported),
            vec![
                "screenshot_1.jpg",
                "screenshot_2.jpg",
                "screenshot_3.jpg",
                "small_promo.jpg",
                "marquee_promo.jpg"
            ]
        );
        assert_eq!(exported[0].bytes.as_ref(), &[1]);
        assert_eq!(exported[3].bytes.as_ref(), &[8]);
        assert!(exported.iter().all(|e| e.mime_type == "image/jpeg"));
    }

    #[test]
    fn empty_promos_are_omitted() {
        let mut store = CollectionStore::new();
        store.accept(SlotKind::Screenshot, fitted(&SCREENSHOT, 1)).expect("accept");

        let exported = store.export_all().expect("export");
        assert_eq!(names(&exported), vec!["screenshot_1.jpg"]);
    }

    #[test]
    fn second_small_promo_replaces_first() {
        let mut store = CollectionStore::new();
        store.accept_named("smallPromo", fitted(&SMALL_PROMO, 1)).expect("accept");
        store.accept_named("smallPromo", fitted(&SMALL_PROMO, 2)).expect("accept");

        assert_eq!(store.len(SlotKind::SmallPromo), 1);
        assert_eq!(store.images(SlotKind::SmallPromo)[0].bytes().as_ref(), &[2]);
    }

    #[test]
    fn sixth_screenshot_is_absent() {
        let mut store = CollectionStore::new();
        for tag in 1..=6u8 {
            store.accept(SlotKind::Screenshot, fitted(&SCREENSHOT, tag)).expect("accept");
        }

        let tags: Vec<u8> = store
            .images(SlotKind::Screenshot)
            .iter()
            .map(|img| img.bytes()[0])
            .collect();
        assert_eq!(tags, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn mismatched_image_leaves_store_untouched() {
        let mut store = CollectionStore::new();
        store.accept(SlotKind::SmallPromo, fitted(&SMALL_PROMO, 1)).expect("accept");

        let result = store.accept(SlotKind::SmallPromo, fitted(&SCREENSHOT, 2));

        assert!(matches!(result, Err(StoreError::DimensionMismatch { .. })));
        assert_eq!(store.images(SlotKind::SmallPromo)[0].bytes().as_ref(), &[1]);
    }

    #[test]
    fn unknown_slot_name_is_rejected() {
        let mut store = CollectionStore::new();
        let result = store.accept_named("icon", fitted(&SCREENSHOT, 1));
        assert!(matches!(result, Err(StoreError::UnknownSlot(_))));
        assert!(store.is_empty(SlotKind::Screenshot));
    }
}
