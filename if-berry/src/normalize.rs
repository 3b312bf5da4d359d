//! 强度归一化与 z 方向投影.

use crate::consts::CLIP_WINDOW;
use ndarray::{Array2, ArrayView3, Axis};
use std::fmt;
use std::str::FromStr;

/// 求图像数据的第 `pct` 百分位数, 插值规则与 numpy 的线性插值一致.
///
/// # 注意
///
/// 1. `image` 必须非空, 否则程序 panic.
/// 2. `pct` 必须在 `[0, 100]` 范围内, 否则程序 panic.
/// 3. 若数据中存在 NaN, 则结果未定义.
pub fn percentile(image: &Array2<f32>, pct: f64) -> f32 {
    assert!(!image.is_empty(), "不能对空图像求百分位数");
    assert!((0.0..=100.0).contains(&pct), "百分位数必须在 [0, 100] 内");

    let mut sorted: Vec<f32> = image.iter().copied().collect();
    sorted.sort_unstable_by(f32::total_cmp);

    let rank = (sorted.len() - 1) as f64 * pct / 100.0;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = (rank - lo as f64) as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// 百分位归一化: 将第 `lo_pct` 百分位的强度线性映射到 0, 第 `hi_pct`
/// 百分位映射到 1.
///
/// 超出 \[0, 1\] 的值 **不会** 被截断. 当两个百分位数的强度值重合时,
/// 除零产生的 NaN/inf 会原样保留在结果中.
///
/// # 注意
///
/// `lo_pct` 不能大于 `hi_pct`, 且两者都必须在 `[0, 100]` 内, 否则程序 panic.
pub fn percentile_normalize(image: &Array2<f32>, lo_pct: f64, hi_pct: f64) -> Array2<f32> {
    assert!(lo_pct <= hi_pct, "下百分位不能高于上百分位");
    let lo = percentile(image, lo_pct);
    let hi = percentile(image, hi_pct);
    image.mapv(|v| (v - lo) / (hi - lo))
}

/// 将强度截断到 `[lo, hi]` 闭区间. NaN 保持原样.
///
/// # 注意
///
/// `lo` 不能大于 `hi`, 否则程序 panic.
pub fn clip_to(image: &Array2<f32>, lo: f32, hi: f32) -> Array2<f32> {
    assert!(lo <= hi, "截断区间下限不能高于上限");
    image.mapv(|v| v.clamp(lo, hi))
}

/// 将强度截断到传感器有效窗口 [`CLIP_WINDOW`].
#[inline]
pub fn clip_range(image: &Array2<f32>) -> Array2<f32> {
    let (lo, hi) = CLIP_WINDOW;
    clip_to(image, lo, hi)
}

/// z 方向投影模式.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Projection {
    /// 逐像素取 z 方向最大值.
    Max,

    /// 逐像素取 z 方向算术平均值.
    Mean,
}

/// 解析投影模式字符串错误.
#[derive(Debug, Clone)]
pub struct ParseProjectionError(String);

impl fmt::Display for ParseProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "未知的投影模式 `{}`, 只支持 max/mean/avg", self.0)
    }
}

impl std::error::Error for ParseProjectionError {}

/// 大小写不敏感. `"avg"` 是 `"mean"` 的别名.
impl FromStr for Projection {
    type Err = ParseProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "max" => Ok(Self::Max),
            "mean" | "avg" => Ok(Self::Mean),
            _ => Err(ParseProjectionError(s.to_owned())),
        }
    }
}

/// 将 z-stack 沿第一轴投影为单张 2D 图像.
///
/// # 注意
///
/// `stack` 的 z 轴必须非空, 否则程序 panic.
pub fn project_z(stack: ArrayView3<'_, f32>, mode: Projection) -> Array2<f32> {
    assert!(stack.len_of(Axis(0)) > 0, "z-stack 不能为空");
    match mode {
        Projection::Max => stack.fold_axis(Axis(0), f32::NEG_INFINITY, |acc, &v| acc.max(v)),

        // z 轴已验证非空, 此处 unwrap 不会失败.
        Projection::Mean => stack.mean_axis(Axis(0)).unwrap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_percentile_linear_interpolation() {
        let img = array![[1.0f32, 2.0], [3.0, 4.0]];
        assert!(float_eq(percentile(&img, 0.0), 1.0));
        assert!(float_eq(percentile(&img, 100.0), 4.0));
        assert!(float_eq(percentile(&img, 50.0), 2.5));
        // rank = 3 * 0.25 = 0.75, 在 1.0 和 2.0 之间插值.
        assert!(float_eq(percentile(&img, 25.0), 1.75));
    }

    #[test]
    fn test_percentile_is_order_free() {
        let img = array![[4.0f32, 1.0], [3.0, 2.0]];
        assert!(float_eq(percentile(&img, 50.0), 2.5));
    }

    #[test]
    fn test_normalize_endpoints_without_clipping() {
        let img = array![[0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]];
        let out = percentile_normalize(&img, 0.0, 50.0);

        // 第 0 百分位 (0.0) 映射到 0, 第 50 百分位 (5.0) 映射到 1.
        assert!(float_eq(out[(0, 0)], 0.0));
        assert!(float_eq(out[(0, 5)], 1.0));

        // 上百分位以上的强度不截断.
        assert!(float_eq(out[(0, 10)], 2.0));
    }

    #[test]
    fn test_normalize_degenerate_percentiles_propagate_nan() {
        let img = Array2::from_elem((3, 3), 7.0f32);
        let out = percentile_normalize(&img, 0.0, 95.0);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_clip_range_sensor_window() {
        let img = array![[-5.0f32, 0.0, 100.0, 5000.0]];
        let out = clip_range(&img);
        assert_eq!(out, array![[0.0f32, 0.0, 100.0, 4095.0]]);
    }

    #[test]
    fn test_projection_parse() {
        assert_eq!("max".parse::<Projection>().unwrap(), Projection::Max);
        assert_eq!("MAX".parse::<Projection>().unwrap(), Projection::Max);
        assert_eq!("mean".parse::<Projection>().unwrap(), Projection::Mean);
        assert_eq!("Avg".parse::<Projection>().unwrap(), Projection::Mean);
        assert!("tilted".parse::<Projection>().is_err());
    }

    #[test]
    fn test_project_z_max_and_mean() {
        let mut stack = Array3::<f32>::zeros((2, 1, 2));
        stack[(0, 0, 0)] = 1.0;
        stack[(0, 0, 1)] = 5.0;
        stack[(1, 0, 0)] = 3.0;
        stack[(1, 0, 1)] = 1.0;

        let max = project_z(stack.view(), Projection::Max);
        assert_eq!(max, array![[3.0f32, 5.0]]);

        let mean = project_z(stack.view(), Projection::Mean);
        assert_eq!(mean, array![[2.0f32, 3.0]]);
    }
}
