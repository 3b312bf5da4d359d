//! 分割管线的核心: 通道预处理, 胞质分割, 细胞核分割与验证, 胞质修剪.
//!
//! 各阶段的衔接顺序固定: 先得到胞质掩码, 细胞核验证依赖它;
//! 再用验证后的细胞核掩码修剪胞质. 每一步都输出新掩码, 不原地修改输入.

mod cyto;
mod nucleus;
mod prune;

pub use cyto::segment_cytoplasm;
pub use nucleus::segment_nucleus;
pub use prune::prune_cytoplasm;

use ndarray::{Array2, ArrayView3};

use crate::consts::{CYTO_PERCENTILES, NUCLEUS_PERCENTILES};
use crate::normalize::{clip_range, percentile_normalize, project_z, Projection};

/// 胞质通道预处理: z 投影, 裁剪到固定亮度窗口, 再按 (0, 95) 百分位归一化.
pub fn preprocess_cytoplasm(channel: ArrayView3<'_, f32>, projection: Projection) -> Array2<f32> {
    let flat = clip_range(&project_z(channel, projection));
    let (lo, hi) = CYTO_PERCENTILES;
    percentile_normalize(&flat, lo, hi)
}

/// 细胞核通道预处理: 与胞质预处理相同, 但按 (0, 98) 百分位归一化.
pub fn preprocess_nucleus(channel: ArrayView3<'_, f32>, projection: Projection) -> Array2<f32> {
    let flat = clip_range(&project_z(channel, projection));
    let (lo, hi) = NUCLEUS_PERCENTILES;
    percentile_normalize(&flat, lo, hi)
}

/// 由背景统计量推导前景阈值: 对亮度低于 1 的像素求均值 μ 与总体标准差 σ,
/// 取 `μ + 5σ` 与 `cap` 中较小者.
///
/// # 注意
///
/// 没有亮度低于 1 的像素时返回 NaN. 此时任何像素都不大于该阈值,
/// 分割结果为全背景掩码, 与对"图像中没有可检出结构"的约定一致.
pub(crate) fn stats_cutoff(img: &Array2<f32>, cap: f32) -> f32 {
    let dim: Vec<f32> = img.iter().copied().filter(|&v| v < 1.0).collect();
    if dim.is_empty() {
        return f32::NAN;
    }
    let n = dim.len() as f32;
    let mean = dim.iter().sum::<f32>() / n;
    let var = dim.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / n;
    (mean + 5.0 * var.sqrt()).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn float_eq(f1: f32, f2: f32) -> bool {
        (f1 - f2).abs() < 1e-5
    }

    #[test]
    fn test_stats_cutoff_caps() {
        // 均值 0.5, 标准差 0, `μ + 5σ` = 0.5 < 2.0.
        let img = Array2::from_elem((4, 4), 0.5f32);
        assert!(float_eq(stats_cutoff(&img, 2.0), 0.5));
        // 上限更小时取上限.
        assert!(float_eq(stats_cutoff(&img, 0.3), 0.3));
    }

    #[test]
    fn test_stats_cutoff_excludes_bright_pixels() {
        let mut img = Array2::from_elem((4, 4), 0.25f32);
        img[(0, 0)] = 3.0;
        img[(3, 3)] = 100.0;
        // 亮像素不参与统计.
        assert!(float_eq(stats_cutoff(&img, 1.0), 0.25));
    }

    #[test]
    fn test_stats_cutoff_without_population_is_nan() {
        let img = Array2::from_elem((3, 3), 1.5f32);
        assert!(stats_cutoff(&img, 0.75).is_nan());
    }

    #[test]
    fn test_preprocess_shapes() {
        let stack = Array3::from_shape_fn((4, 6, 8), |(z, h, w)| (z + h * w) as f32);
        let cyto = preprocess_cytoplasm(stack.view(), Projection::Max);
        let nucleus = preprocess_nucleus(stack.view(), Projection::Mean);
        assert_eq!(cyto.dim(), (6, 8));
        assert_eq!(nucleus.dim(), (6, 8));
    }
}
