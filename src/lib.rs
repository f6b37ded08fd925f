//! # 商店图片处理器（库入口）
//!
//! 把用户上传的任意尺寸图片适配到游戏商店要求的固定画布上
//! （截图 1280×800、小宣传图 440×280、横幅宣传图 1400×560），
//! 等比缩放居中，剩余区域用源图左上角像素颜色填充，输出 JPEG。
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            UI（文件选择 / 预览 / 下载，不在本库内）         │
//! └───────┬──────────────────────────────────▲───────────────┘
//!         │ ImageSource + 槽位名              │ ExportedImage
//! ┌───────▼──────────────────────────────────┼───────────────┐
//! │  session ── ProcessorSession（上传序号 + 按序写入）       │
//! │     │                                                    │
//! │     ├─ image_processor   加载·解码·适配·编码             │
//! │     │   └─ fit           FitLayout + 左上角取色补边       │
//! │     │                                                    │
//! │     └─ store             CollectionStore                 │
//! │         ├─ target        三种固定输出规格                 │
//! │         ├─ slot          替换 / 追加后截断                │
//! │         └─ export        文件名 + JPEG 字节               │
//! │                                                          │
//! │  error ── AppError（统一错误类型）                         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，会话层对外函数的返回类型 |
//! | [`image_processor`] | 从字节/Base64/文件加载图片，解码、适配画布并编码为 JPEG |
//! | [`store`] | 槽位规格、替换/截断策略、批量导出 |
//! | [`session`] | 会话级所有者，保证上传按发起顺序写入存储 |
//!
//! ## 快速上手
//!
//! ```rust,no_run
//! use store_image_processor::image_processor::ImageSource;
//! use store_image_processor::session::ProcessorSession;
//! use store_image_processor::store::SlotKind;
//!
//! let session = ProcessorSession::default();
//! session.upload(SlotKind::Screenshot, ImageSource::FilePath("shot.png".into()))?;
//! for file in session.export_all()? {
//!     std::fs::write(&file.file_name, &file.bytes)?;
//! }
//! # Ok::<(), store_image_processor::error::AppError>(())
//! ```

pub mod error;
pub mod image_processor;
pub mod session;
pub mod store;

pub use error::AppError;
pub use image_processor::{FittedImage, ImageProcessor, ImageSource, SourceImage};
pub use session::ProcessorSession;
pub use store::{CollectionStore, ExportedImage, SlotKind};
