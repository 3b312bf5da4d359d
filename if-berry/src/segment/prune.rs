//! 修剪不挨着任何合格细胞核的胞质区域.

use crate::distance::DistanceField;
use crate::regions::regions;
use crate::BinaryMask;

/// 胞质区域到最近细胞核的最大允许距离.
///
/// 取 1.0 意味着只认同一行或同一列的紧邻; 对角相邻的距离是 √2, 不算数.
const MAX_NUCLEUS_DISTANCE: f64 = 1.0;

/// 去除与验证后细胞核既不重叠也不相邻的胞质连通区域.
///
/// 对胞质掩码的每个连通区域, 在细胞核距离场上取区域内最小距离,
/// 超过 1.0 的整个区域丢弃. 细胞核掩码为空时输出为全背景.
///
/// # 注意
///
/// 两个掩码的形状必须一致, 否则 panic.
pub fn prune_cytoplasm(cytoplasm: &BinaryMask, nuclei: &BinaryMask) -> BinaryMask {
    assert_eq!(
        cytoplasm.dim(),
        nuclei.dim(),
        "胞质与细胞核掩码的形状必须一致"
    );

    let field = DistanceField::new(nuclei);
    let mut kept = BinaryMask::from_elem(cytoplasm.dim(), false);
    for region in regions(cytoplasm) {
        if field.region_min(&region) <= MAX_NUCLEUS_DISTANCE {
            for pos in region.iter() {
                kept[pos] = true;
            }
        }
    }
    kept
}
