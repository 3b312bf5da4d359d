//! 通用常量.

/// 单通道颜色与三值掩码标签.
pub mod gray {
    /// 三值掩码中, 背景的像素值.
    pub const IF_BACKGROUND: u8 = 0;

    /// 三值掩码中, 细胞核的像素值.
    pub const IF_NUCLEUS: u8 = 1;

    /// 三值掩码中, 胞质的像素值.
    pub const IF_CYTOPLASM: u8 = 2;

    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道灰色.
    pub const GRAY: u8 = 0b_1000_0000;

    /// 单通道亮灰色.
    pub const LIGHT_GRAY: u8 = 0b_1100_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;

    /// 像素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, IF_BACKGROUND)
    }

    /// 像素是否是细胞核?
    #[inline]
    pub const fn is_nucleus(p: u8) -> bool {
        matches!(p, IF_NUCLEUS)
    }

    /// 像素是否是胞质?
    #[inline]
    pub const fn is_cytoplasm(p: u8) -> bool {
        matches!(p, IF_CYTOPLASM)
    }

    /// 像素是否属于细胞 (细胞核或胞质)?
    #[inline]
    pub const fn is_cell(p: u8) -> bool {
        matches!(p, IF_NUCLEUS | IF_CYTOPLASM)
    }
}

/// 传感器有效强度窗口 (下限, 上限).
///
/// 采集设备以 16-bit 容器保存 12-bit 有效载荷, 故窗口固定为
/// `[0, 4095]`. 该值是领域常量, 不开放给用户配置.
pub const CLIP_WINDOW: (f32, f32) = (0.0, 4095.0);

/// 胞质通道归一化的百分位区间 (下百分位, 上百分位).
pub const CYTO_PERCENTILES: (f64, f64) = (0.0, 95.0);

/// 细胞核通道归一化的百分位区间 (下百分位, 上百分位).
pub const NUCLEUS_PERCENTILES: (f64, f64) = (0.0, 98.0);
