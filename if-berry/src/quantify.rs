//! 在三值标签掩码约定下按通道统计荧光亮度.

use itertools::izip;
use ndarray::{ArrayView2, ArrayView3, Axis};

use crate::consts::gray;
use crate::data::LabelMask;

/// 单个通道在三类区域上的平均亮度.
///
/// 任一区域没有像素时, 对应均值为 NaN 而不是报错.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionMeans {
    /// 细胞核与胞质像素并集上的均值.
    pub total: f64,
    /// 细胞核像素上的均值.
    pub nucleus: f64,
    /// 胞质像素上的均值.
    pub cytoplasm: f64,
}

/// 写入结果表的单通道数值: 三个区域均值加核质比.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelStats {
    /// 并集均值.
    pub total: f64,
    /// 细胞核均值.
    pub nucleus: f64,
    /// 胞质均值.
    pub cytoplasm: f64,
    /// 核质比, 即细胞核均值除以胞质均值.
    pub ratio: f64,
}

/// 结果表中的一行: 孔位名加每个请求通道的统计量.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasurementRow {
    /// 孔位名.
    pub well: String,
    /// 每个请求通道的统计量, 顺序与请求一致.
    pub channels: Vec<ChannelStats>,
}

impl MeasurementRow {
    /// 由各通道的区域均值组装一行, 核质比在此处计算.
    ///
    /// 胞质均值为零或 NaN 时, 核质比相应为无穷或 NaN, 照常写入表格,
    /// 留给人工检查, 不视为错误.
    pub fn new(well: impl Into<String>, means: &[RegionMeans]) -> Self {
        Self {
            well: well.into(),
            channels: means
                .iter()
                .map(|m| ChannelStats {
                    total: m.total,
                    nucleus: m.nucleus,
                    cytoplasm: m.cytoplasm,
                    ratio: m.nucleus / m.cytoplasm,
                })
                .collect(),
        }
    }

    /// 定量失败的孔位占位行: 数值字段全部为 NaN, 保持与其他行对齐.
    pub fn unavailable(well: impl Into<String>, channels: usize) -> Self {
        let nan = ChannelStats {
            total: f64::NAN,
            nucleus: f64::NAN,
            cytoplasm: f64::NAN,
            ratio: f64::NAN,
        };
        Self {
            well: well.into(),
            channels: vec![nan; channels],
        }
    }
}

/// 均值累加器. 没有样本时均值自然退化为 NaN.
#[derive(Default)]
struct RunningMean {
    sum: f64,
    count: usize,
}

impl RunningMean {
    #[inline]
    fn push(&mut self, v: f32) {
        self.sum += f64::from(v);
        self.count += 1;
    }

    #[inline]
    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// 对多通道亮度栈的每个通道, 统计三类区域上的平均亮度.
///
/// 输入的轴序为 `(通道, 高, 宽)`. 输出向量按通道顺序排列.
/// 定量只读取亮度数据, 不做任何修改.
///
/// # 注意
///
/// 亮度栈的空间尺寸必须与标签掩码一致, 否则 panic.
pub fn quantify_channels(stack: ArrayView3<'_, f32>, labels: &LabelMask) -> Vec<RegionMeans> {
    let (channels, height, width) = stack.dim();
    assert_eq!(
        (height, width),
        labels.shape(),
        "亮度栈与标签掩码的空间尺寸必须一致"
    );

    (0..channels)
        .map(|c| {
            let img = stack.index_axis(Axis(0), c);
            let mut total = RunningMean::default();
            let mut nucleus = RunningMean::default();
            let mut cytoplasm = RunningMean::default();
            for (&v, &label) in izip!(img.iter(), labels.data().iter()) {
                if gray::is_background(label) {
                    continue;
                }
                total.push(v);
                if gray::is_nucleus(label) {
                    nucleus.push(v);
                } else {
                    cytoplasm.push(v);
                }
            }
            RegionMeans {
                total: total.mean(),
                nucleus: nucleus.mean(),
                cytoplasm: cytoplasm.mean(),
            }
        })
        .collect()
}

/// 单通道二维图像的定量: 提升为单通道栈后复用 [`quantify_channels`].
pub fn quantify_image(img: ArrayView2<'_, f32>, labels: &LabelMask) -> RegionMeans {
    let stack = img.insert_axis(Axis(0));
    quantify_channels(stack, labels).pop().unwrap() // 恰好一个通道.
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    /// 10 个细胞核像素 (亮度 5), 10 个胞质像素 (亮度 10).
    fn reference_scene() -> (Array2<f32>, LabelMask) {
        let mut img = Array2::zeros((5, 10));
        let mut labels = LabelMask::zeros((5, 10));
        for w in 0..10 {
            img[(1, w)] = 5.0;
            labels[(1, w)] = crate::consts::gray::IF_NUCLEUS;
            img[(3, w)] = 10.0;
            labels[(3, w)] = crate::consts::gray::IF_CYTOPLASM;
        }
        (img, labels)
    }

    #[test]
    fn test_reference_means() {
        let (img, labels) = reference_scene();
        let means = quantify_image(img.view(), &labels);
        assert_eq!(means.nucleus, 5.0);
        assert_eq!(means.cytoplasm, 10.0);
        assert_eq!(means.total, 7.5);
    }

    #[test]
    fn test_empty_regions_are_nan() {
        let img = Array2::from_elem((4, 4), 3.0f32);
        let labels = LabelMask::zeros((4, 4));
        let means = quantify_image(img.view(), &labels);
        assert!(means.total.is_nan());
        assert!(means.nucleus.is_nan());
        assert!(means.cytoplasm.is_nan());
    }

    #[test]
    fn test_channels_quantified_separately() {
        let (img, labels) = reference_scene();
        let mut stack = Array3::zeros((2, 5, 10));
        stack.index_axis_mut(Axis(0), 0).assign(&img);
        stack.index_axis_mut(Axis(0), 1).assign(&img.mapv(|v| v * 2.0));

        let means = quantify_channels(stack.view(), &labels);
        assert_eq!(means.len(), 2);
        assert_eq!(means[0].total, 7.5);
        assert_eq!(means[1].total, 15.0);
        assert_eq!(means[1].nucleus, 10.0);
    }

    #[test]
    fn test_row_ratio() {
        let (img, labels) = reference_scene();
        let means = quantify_image(img.view(), &labels);
        let row = MeasurementRow::new("B2", &[means]);
        assert_eq!(row.channels[0].ratio, 0.5);
    }

    #[test]
    fn test_unavailable_row_is_all_nan() {
        let row = MeasurementRow::unavailable("C4-2", 2);
        assert_eq!(row.well, "C4-2");
        assert_eq!(row.channels.len(), 2);
        assert!(row.channels.iter().all(|c| {
            c.total.is_nan() && c.nucleus.is_nan() && c.cytoplasm.is_nan() && c.ratio.is_nan()
        }));
    }
}
