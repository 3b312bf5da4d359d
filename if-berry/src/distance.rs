//! 到前景像素的精确欧氏距离场.
//!
//! 采用逐维抛物线下包络算法, 先沿列后沿行对平方距离做两趟一维变换,
//! 最后开方. 结果与逐像素暴力枚举完全一致, 复杂度为线性.

use ndarray::Array2;
use ordered_float::NotNan;

use crate::regions::Region;
use crate::{BinaryMask, Idx2d};

/// 只读的欧氏距离场: 每个像素到最近前景像素的距离.
///
/// 构造一次后可对任意多个区域做查询, 查询互不影响.
/// 掩码全为背景时, 场中所有值为正无穷.
#[derive(Debug, Clone)]
pub struct DistanceField {
    data: Array2<f64>,
}

impl DistanceField {
    /// 根据二值掩码计算距离场.
    ///
    /// # 注意
    ///
    /// 掩码两个轴都必须非空, 否则 panic.
    pub fn new(mask: &BinaryMask) -> Self {
        let (height, width) = mask.dim();
        assert!(height > 0 && width > 0, "掩码的两个轴都必须非空");

        if !mask.iter().any(|&fg| fg) {
            return Self {
                data: Array2::from_elem((height, width), f64::INFINITY),
            };
        }

        // 有限哨兵值: 严格大于任何可能的平方距离,
        // 又避免了无穷参与下包络运算时产生 NaN.
        let far = (height * height + width * width + 1) as f64;
        let mut sq = Array2::from_shape_fn((height, width), |pos| {
            if mask[pos] {
                0.0
            } else {
                far
            }
        });

        let mut buf = vec![0.0f64; height.max(width)];
        let mut out = vec![0.0f64; height.max(width)];

        // 逐列.
        for w in 0..width {
            for h in 0..height {
                buf[h] = sq[(h, w)];
            }
            lower_envelope(&buf[..height], &mut out[..height]);
            for h in 0..height {
                sq[(h, w)] = out[h];
            }
        }
        // 逐行.
        for h in 0..height {
            for w in 0..width {
                buf[w] = sq[(h, w)];
            }
            lower_envelope(&buf[..width], &mut out[..width]);
            for w in 0..width {
                sq[(h, w)] = out[w];
            }
        }

        Self {
            data: sq.mapv(f64::sqrt),
        }
    }

    /// 指定像素处的距离值.
    #[inline]
    pub fn at(&self, pos: Idx2d) -> f64 {
        self.data[pos]
    }

    /// 距离场的形状, 即 `(高, 宽)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 区域内所有像素距离值的最小值.
    ///
    /// # 注意
    ///
    /// 区域必须非空, 否则 panic.
    pub fn region_min(&self, region: &Region) -> f64 {
        assert!(!region.is_empty(), "空区域没有最小距离");
        region
            .iter()
            .map(|pos| NotNan::<f64>::new(self.at(pos)).unwrap()) // 距离场不含 NaN.
            .min()
            .unwrap() // 区域已验证非空.
            .into_inner()
    }

    /// 距离场的只读视图.
    #[inline]
    pub fn data(&self) -> ndarray::ArrayView2<'_, f64> {
        self.data.view()
    }
}

/// 一维平方距离变换: `f` 为每个栅格上的抛物线底值, 结果写入 `d`.
///
/// 维护下包络的抛物线顶点 `v` 与相邻抛物线的分界点 `z`.
fn lower_envelope(f: &[f64], d: &mut [f64]) {
    let n = f.len();
    debug_assert!(n > 0 && d.len() == n);

    let mut v = vec![0usize; n];
    let mut z = vec![0.0f64; n + 1];
    let mut k = 0usize;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    let intersect = |q: usize, p: usize| -> f64 {
        let (q, p, fq, fp) = (q as f64, p as f64, f[q], f[p]);
        ((fq + q * q) - (fp + p * p)) / (2.0 * q - 2.0 * p)
    };

    for q in 1..n {
        let mut s = intersect(q, v[k]);
        while s <= z[k] {
            k -= 1;
            s = intersect(q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, slot) in d.iter_mut().enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let dq = q as f64 - v[k] as f64;
        *slot = dq * dq + f[v[k]];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::regions;

    /// 逐像素暴力枚举的参考实现.
    fn brute_force(mask: &BinaryMask) -> Array2<f64> {
        let (height, width) = mask.dim();
        let fg: Vec<Idx2d> = mask
            .indexed_iter()
            .filter_map(|(pos, &v)| v.then_some(pos))
            .collect();
        Array2::from_shape_fn((height, width), |(h, w)| {
            fg.iter()
                .map(|&(fh, fw)| {
                    let dh = h.abs_diff(fh);
                    let dw = w.abs_diff(fw);
                    NotNan::<f64>::new(((dh * dh + dw * dw) as f64).sqrt()).unwrap()
                })
                .min()
                .map_or(f64::INFINITY, NotNan::into_inner)
        })
    }

    #[test]
    fn test_matches_brute_force() {
        let mut mask = BinaryMask::from_elem((11, 14), false);
        for pos in [(0, 0), (3, 7), (4, 8), (10, 13), (6, 1)] {
            mask[pos] = true;
        }
        let field = DistanceField::new(&mask);
        let expected = brute_force(&mask);
        for (pos, &want) in expected.indexed_iter() {
            assert_eq!(field.at(pos), want, "位置 {pos:?} 的距离不一致");
        }
    }

    #[test]
    fn test_foreground_is_zero() {
        let mut mask = BinaryMask::from_elem((5, 5), false);
        mask[(2, 3)] = true;
        let field = DistanceField::new(&mask);
        assert_eq!(field.at((2, 3)), 0.0);
        assert_eq!(field.at((2, 4)), 1.0);
        assert_eq!(field.at((3, 4)), 2.0f64.sqrt());
    }

    #[test]
    fn test_empty_mask_is_infinite() {
        let mask = BinaryMask::from_elem((4, 7), false);
        let field = DistanceField::new(&mask);
        assert!(field.data().iter().all(|v| v.is_infinite()));
    }

    #[test]
    fn test_region_min() {
        let mut anchor = BinaryMask::from_elem((9, 9), false);
        anchor[(0, 0)] = true;
        let field = DistanceField::new(&anchor);

        let mut probe = BinaryMask::from_elem((9, 9), false);
        probe[(0, 4)] = true;
        probe[(3, 4)] = true;
        let rs = regions(&probe);
        assert_eq!(rs.len(), 2);
        // 两个区域各取其像素到 (0, 0) 的距离, 最小值为 4.
        let min = rs
            .iter()
            .map(|r| NotNan::<f64>::new(field.region_min(r)).unwrap())
            .min()
            .unwrap()
            .into_inner();
        assert_eq!(min, 4.0);
    }
}
