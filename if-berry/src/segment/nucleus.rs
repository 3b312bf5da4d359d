//! 从核通道的预处理图像中分割细胞核, 并按胞质邻近性验证.

use ndarray::Array2;

use crate::distance::DistanceField;
use crate::morph;
use crate::regions::{outer_boundary, regions, remove_small};
use crate::BinaryMask;

/// 阈值上限. 与胞质的 0.75 不同, 这个不对称是刻意保留的.
const CUTOFF_CAP: f32 = 0.0;
/// 噪声去除的最小细胞核面积 (像素).
const MIN_NUCLEUS_AREA: usize = 300;
/// 验证后平滑用的闭运算迭代次数.
const SMOOTH_ITERS: u32 = 1;
/// 验证后可填充的最大空洞面积 (像素).
const MAX_HOLE_AREA: usize = 100;

/// 由预处理后的核通道图像与胞质掩码分割出验证过的细胞核掩码,
/// 同时返回通过验证的细胞核个数.
///
/// 阈值取 `min(0, μ + 5σ)` (μ, σ 为亮度低于 1 的像素的统计量),
/// 去除小于 300 像素的噪声区域后, 对每个连通区域执行多数票验证:
/// 区域外边界像素中到胞质的距离恰为 0 的至少要占一半, 才保留该区域.
/// 不合格的区域整体丢弃. 全部判定结束后对保留掩码做一次闭运算,
/// 并填充面积不超过 100 像素的空洞.
///
/// # 注意
///
/// 图像与胞质掩码的形状必须一致, 否则 panic.
/// 验证以只读距离场为准, 区域之间互不影响, 判定次序不改变结果.
pub fn segment_nucleus(img: &Array2<f32>, cytoplasm: &BinaryMask) -> (BinaryMask, u32) {
    assert_eq!(
        img.dim(),
        cytoplasm.dim(),
        "图像与胞质掩码的形状必须一致"
    );

    let cutoff = super::stats_cutoff(img, CUTOFF_CAP);
    let mut candidates = img.mapv(|v| v > cutoff);
    remove_small(&mut candidates, MIN_NUCLEUS_AREA);

    let field = DistanceField::new(cytoplasm);
    let mut accepted = BinaryMask::from_elem(img.dim(), false);
    let mut count = 0u32;
    for region in regions(&candidates) {
        let boundary = outer_boundary(&candidates, &region);
        let touching = boundary.iter().filter(|&&pos| field.at(pos) == 0.0).count();
        // 多数票, 取等号: 恰好一半贴着胞质也算合格.
        if touching * 2 >= boundary.len() {
            count += 1;
            for pos in region.iter() {
                accepted[pos] = true;
            }
        }
    }

    let mut smoothed = morph::close(&accepted, SMOOTH_ITERS);
    morph::fill_holes(&mut smoothed, MAX_HOLE_AREA);
    (smoothed, count)
}
