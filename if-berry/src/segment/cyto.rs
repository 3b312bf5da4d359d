//! 从标记通道的预处理图像中分割胞质.

use ndarray::Array2;

use crate::morph;
use crate::regions::remove_small;
use crate::BinaryMask;

/// 阈值上限: σ 异常偏大时阻止阈值失控.
const CUTOFF_CAP: f32 = 0.75;
/// 形态学扩张及回缩的迭代次数.
const EXPAND_ITERS: u32 = 3;
/// 清理阶段可填充的最大空洞面积 (像素).
const MAX_HOLE_AREA: usize = 1200;
/// 小于该面积的连通区域视为噪声.
const MIN_OBJECT_AREA: usize = 600;

/// 由预处理后的胞质通道图像分割出二值胞质掩码.
///
/// 阈值取 `min(0.75, μ + 5σ)`, 其中 μ, σ 是亮度低于 1 的像素的统计量;
/// 之后做形态学清理: 膨胀 3 次以桥接胞质内部的小缝隙, 填充面积不超过
/// 1200 像素的空洞, 腐蚀 3 次恢复原尺寸, 最后去除小于 600 像素的噪声区域.
///
/// # 注意
///
/// 输入必须是单通道二维浮点图像. 输出掩码与输入形状一致.
pub fn segment_cytoplasm(img: &Array2<f32>) -> BinaryMask {
    let cutoff = super::stats_cutoff(img, CUTOFF_CAP);
    let raw = img.mapv(|v| v > cutoff);
    cleanup(&raw)
}

/// 分割后的形态学清理. 在自身输出上重复执行不再产生变化.
fn cleanup(mask: &BinaryMask) -> BinaryMask {
    let mut bridged = morph::dilate(mask, EXPAND_ITERS);
    morph::fill_holes(&mut bridged, MAX_HOLE_AREA);
    let mut shrunk = morph::erode(&bridged, EXPAND_ITERS);
    remove_small(&mut shrunk, MIN_OBJECT_AREA);
    shrunk
}
