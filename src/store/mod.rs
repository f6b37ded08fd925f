//! # 集合存储模块（store）
//!
//! ## 设计思路
//!
//! 把“哪张图放在哪个槽位、最多几张、导出叫什么名字”集中在这里，
//! 与图片处理流水线完全解耦：这里只接收已经适配好的 `FittedImage`。
//!
//! - `target`：三种固定输出规格与 `SlotKind`
//! - `slot`：替换 / 追加后截断策略
//! - `collection`：`CollectionStore`，`accept` 与 `export_all`
//! - `export`：导出结果（文件名 + JPEG 字节）

mod collection;
mod error;
mod export;
mod slot;
mod target;

pub use collection::CollectionStore;
pub use error::StoreError;
pub use export::ExportedImage;
pub use slot::{AcceptOutcome, Slot};
pub use target::{MARQUEE_PROMO, SCREENSHOT, SMALL_PROMO, SlotKind, TargetSpec};
