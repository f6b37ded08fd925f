//! # 输出规格
//!
//! 三种固定画布在编译期确定，运行时不可修改。

use std::fmt;

use super::StoreError;

/// 一种输出格式：目标画布尺寸与该槽位最多容纳的图片数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub max_count: usize,
}

pub const SCREENSHOT: TargetSpec = TargetSpec {
    name: "screenshot",
    width: 1280,
    height: 800,
    max_count: 5,
};

pub const SMALL_PROMO: TargetSpec = TargetSpec {
    name: "small_promo",
    width: 440,
    height: 280,
    max_count: 1,
};

pub const MARQUEE_PROMO: TargetSpec = TargetSpec {
    name: "marquee_promo",
    width: 1400,
    height: 560,
    max_count: 1,
};

/// 槽位标识，与 `TargetSpec` 一一对应。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotKind {
    Screenshot,
    SmallPromo,
    MarqueePromo,
}

impl SlotKind {
    /// 导出顺序：截图在前，其后小宣传图、横幅宣传图。
    pub const ALL: [SlotKind; 3] = [Self::Screenshot, Self::SmallPromo, Self::MarqueePromo];

    pub fn spec(self) -> &'static TargetSpec {
        match self {
            Self::Screenshot => &SCREENSHOT,
            Self::SmallPromo => &SMALL_PROMO,
            Self::MarqueePromo => &MARQUEE_PROMO,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.spec().name
    }

    /// 解析 UI 传入的槽位名，同时接受 snake_case 与 camelCase。
    pub fn from_str(name: &str) -> Result<Self, StoreError> {
        match name.trim() {
            "screenshot" | "screenshots" => Ok(Self::Screenshot),
            "small_promo" | "smallPromo" => Ok(Self::SmallPromo),
            "marquee_promo" | "marqueePromo" => Ok(Self::MarqueePromo),
            other => Err(StoreError::UnknownSlot(other.to_string())),
        }
    }

    /// 导出文件名；`index` 为槽位内从 0 开始的位置。
    pub fn file_name(self, index: usize) -> String {
        match self {
            Self::Screenshot => format!("screenshot_{}.jpg", index + 1),
            Self::SmallPromo => "small_promo.jpg".to_string(),
            Self::MarqueePromo => "marquee_promo.jpg".to_string(),
        }
    }

    /// 导出时该槽位是否不能为空。
    pub fn required_for_export(self) -> bool {
        matches!(self, Self::Screenshot)
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
