//! 把细胞核掩码与修剪后的胞质掩码合成为单个三值标签掩码.

use crate::consts::gray::{IF_CYTOPLASM, IF_NUCLEUS};
use crate::data::LabelMask;
use crate::regions::{regions, touches_border};
use crate::BinaryMask;

/// 合成足迹中可按胞质缝隙填充的最大空洞面积 (像素).
const MAX_HOLE_AREA: usize = 200;

/// 合成三值掩码: 背景 0, 细胞核 1, 胞质 2.
///
/// 先写胞质标签再写细胞核标签, 两掩码重叠的像素一律判给细胞核.
/// 随后取 `标签 > 0` 的足迹, 把其中面积不超过 200 像素的封闭空洞
/// 填为胞质标签: 组织内部的小缝隙按约定视为胞质间隙, 而不是核.
///
/// # 注意
///
/// 两个掩码的形状必须一致, 否则 panic.
pub fn compose_trinary(nuclei: &BinaryMask, cytoplasm: &BinaryMask) -> LabelMask {
    assert_eq!(
        nuclei.dim(),
        cytoplasm.dim(),
        "细胞核与胞质掩码的形状必须一致"
    );

    let shape = nuclei.dim();
    let mut labels = LabelMask::zeros(shape);
    for (pos, &fg) in cytoplasm.indexed_iter() {
        if fg {
            labels[pos] = IF_CYTOPLASM;
        }
    }
    for (pos, &fg) in nuclei.indexed_iter() {
        if fg {
            labels[pos] = IF_NUCLEUS;
        }
    }

    let footprint = labels.cell_mask();
    let gaps: BinaryMask = footprint.mapv(|v| !v);
    for hole in regions(&gaps) {
        if touches_border(shape, &hole) || hole.len() > MAX_HOLE_AREA {
            continue;
        }
        for pos in hole.iter() {
            labels[pos] = IF_CYTOPLASM;
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::gray::IF_BACKGROUND;

    fn stamp(mask: &mut BinaryMask, top: usize, left: usize, height: usize, width: usize) {
        for h in top..top + height {
            for w in left..left + width {
                mask[(h, w)] = true;
            }
        }
    }

    #[test]
    fn test_nucleus_wins_overlap() {
        let mut nuclei = BinaryMask::from_elem((8, 8), false);
        stamp(&mut nuclei, 2, 2, 3, 3);
        let mut cytoplasm = BinaryMask::from_elem((8, 8), false);
        stamp(&mut cytoplasm, 2, 2, 5, 5);

        let labels = compose_trinary(&nuclei, &cytoplasm);
        // 重叠处必须是 1, 不能是 2.
        assert_eq!(labels[(3, 3)], IF_NUCLEUS);
        assert_eq!(labels[(6, 6)], IF_CYTOPLASM);
        assert_eq!(labels[(0, 0)], IF_BACKGROUND);
    }

    #[test]
    fn test_enclosed_gap_becomes_cytoplasm() {
        // 两块胞质夹住一个被细胞核围合的缝隙, 缝隙填成 2 而不是 1.
        let mut cytoplasm = BinaryMask::from_elem((12, 12), false);
        stamp(&mut cytoplasm, 2, 2, 8, 3);
        stamp(&mut cytoplasm, 2, 7, 8, 3);
        let mut nuclei = BinaryMask::from_elem((12, 12), false);
        stamp(&mut nuclei, 2, 5, 2, 2);
        stamp(&mut nuclei, 8, 5, 2, 2);

        let labels = compose_trinary(&nuclei, &cytoplasm);
        assert_eq!(labels[(5, 5)], IF_CYTOPLASM);
        assert_eq!(labels[(6, 6)], IF_CYTOPLASM);
        assert_eq!(labels[(2, 5)], IF_NUCLEUS);
    }

    #[test]
    fn test_oversized_hole_stays_background() {
        // 环形胞质围出 16x16 = 256 像素的空洞, 超出 200 的上限.
        let mut cytoplasm = BinaryMask::from_elem((24, 24), false);
        stamp(&mut cytoplasm, 2, 2, 20, 20);
        for h in 4..20 {
            for w in 4..20 {
                cytoplasm[(h, w)] = false;
            }
        }
        let nuclei = BinaryMask::from_elem((24, 24), false);

        let labels = compose_trinary(&nuclei, &cytoplasm);
        assert_eq!(labels[(10, 10)], IF_BACKGROUND);
        assert_eq!(labels[(2, 2)], IF_CYTOPLASM);
    }

    #[test]
    fn test_label_census() {
        let mut nuclei = BinaryMask::from_elem((6, 6), false);
        nuclei[(1, 1)] = true;
        let mut cytoplasm = BinaryMask::from_elem((6, 6), false);
        cytoplasm[(1, 1)] = true;
        cytoplasm[(1, 2)] = true;

        let labels = compose_trinary(&nuclei, &cytoplasm);
        assert_eq!(labels.numeric_statistics(), [34, 1, 1]);
    }
}
