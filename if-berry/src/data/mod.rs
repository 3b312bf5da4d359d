use std::fmt;
use std::ops::{Index, IndexMut};
use std::path::Path;

use ndarray::{Array2, Array4, Array5, ArrayView2, ArrayView3, ArrayView4, Axis};
use ndarray_npy::ReadNpyError;

use crate::consts::gray::*;
use crate::{BinaryMask, Idx2d};

mod save;

pub use save::{ImgWriteRaw, ImgWriteVis};

cfg_if::cfg_if! {
    if #[cfg(feature = "plot")] {
        mod plot;

        pub use plot::ImgDisplay;
    }
}

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 已解码的单孔位荧光显微镜 z-stack, 按 `(通道, z, 高, 宽)` 组织.
/// 强度以 `f32` 保存.
#[derive(Debug, Clone)]
pub struct IfStack {
    data: Array4<f32>,
}

impl Index<(usize, usize, usize, usize)> for IfStack {
    type Output = f32;

    #[inline]
    fn index(&self, index: (usize, usize, usize, usize)) -> &Self::Output {
        &self.data[index]
    }
}

impl IfStack {
    /// 直接从数组创建.
    ///
    /// # 注意
    ///
    /// `data` 的四个轴都必须非空, 否则程序 panic.
    pub fn new(data: Array4<f32>) -> Self {
        assert!(!data.is_empty(), "stack 的四个轴都必须非空");
        Self { data }
    }

    /// 打开 `.npy` 文件格式的已解码 stack. `path` 为 npy 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    ///
    /// # 注意
    ///
    /// 文件内容必须是按 `(通道, z, 高, 宽)` 组织的非空 4 维 `f32` 数组.
    /// 维数或元素类型不符会返回 `Err`, 空数组会导致程序 panic.
    pub fn open_npy<P: AsRef<Path>>(path: P) -> Result<Self, ReadNpyError> {
        let data: Array4<f32> = ndarray_npy::read_npy(path.as_ref())?;
        Ok(Self::new(data))
    }

    /// 从按 `(时间, 通道, z, 高, 宽)` 组织的 5 维数组中选取第 `t` 个时间点.
    ///
    /// 当 `t` 越界时 panic.
    pub fn from_tczyx(data: &Array5<f32>, t: usize) -> Self {
        Self::new(data.index_axis(Axis(0), t).to_owned())
    }

    /// 通道个数.
    #[inline]
    pub fn channels(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// z 方向切片个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// 水平切片的分辨率 (高, 宽).
    #[inline]
    pub fn shape_hw(&self) -> Idx2d {
        (self.data.len_of(Axis(2)), self.data.len_of(Axis(3)))
    }

    /// 获取第 `channel` 个通道的 z-stack 视图, 轴序 `(z, 高, 宽)`.
    ///
    /// 当 `channel` 越界时 panic.
    #[inline]
    pub fn channel(&self, channel: usize) -> ArrayView3<'_, f32> {
        self.data.index_axis(Axis(0), channel)
    }

    /// 获取第 `channel` 通道第 `z` 层的水平切片视图.
    ///
    /// 当 `channel` 或 `z` 越界时 panic.
    #[inline]
    pub fn plane(&self, channel: usize, z: usize) -> ArrayView2<'_, f32> {
        self.data
            .index_axis(Axis(0), channel)
            .index_axis_move(Axis(0), z)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array4<f32> {
        self.data
    }
}

/// 打开三值掩码光栅文件错误.
#[derive(Debug)]
pub enum OpenMaskError {
    /// 底层图像解码错误.
    Image(image::ImageError),

    /// 光栅中出现了 0, 1, 2 之外的像素值.
    InvalidLabel(u8),
}

impl fmt::Display for OpenMaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(e) => write!(f, "掩码光栅解码失败: {e}"),
            Self::InvalidLabel(v) => write!(f, "掩码只允许 0, 1, 2 像素, 但发现了 `{v}`"),
        }
    }
}

impl std::error::Error for OpenMaskError {}

/// 三值标注掩码. 像素值以 `u8` 保存, 只允许
/// [`IF_BACKGROUND`], [`IF_NUCLEUS`] 和 [`IF_CYTOPLASM`] 三种.
///
/// 每张图像的掩码由合成器一次性创建, 是分割管线的最终工件.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LabelMask {
    data: Array2<u8>,
}

impl Index<Idx2d> for LabelMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for LabelMask {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl LabelMask {
    /// 直接从数组创建.
    ///
    /// `data` 的所有像素必须为 0, 1 或 2, 否则程序行为未定义.
    pub fn new(data: Array2<u8>) -> Self {
        debug_assert!(data.iter().all(|&p| p <= IF_CYTOPLASM));
        Self { data }
    }

    /// 创建给定分辨率的全背景掩码.
    #[inline]
    pub fn zeros(shape: Idx2d) -> Self {
        Self {
            data: Array2::zeros(shape),
        }
    }

    /// 打开单通道光栅文件格式的三值掩码. `path` 为光栅文件的本地路径.
    ///
    /// 像素值必须为 0, 1 或 2, 否则返回 [`OpenMaskError::InvalidLabel`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OpenMaskError> {
        let img = image::open(path.as_ref())
            .map_err(OpenMaskError::Image)?
            .into_luma8();
        let (width, height) = img.dimensions();
        let mut data = Array2::zeros((height as usize, width as usize));
        for (x, y, pix) in img.enumerate_pixels() {
            let v = pix.0[0];
            if v > IF_CYTOPLASM {
                return Err(OpenMaskError::InvalidLabel(v));
            }
            data[(y as usize, x as usize)] = v;
        }
        Ok(Self { data })
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 获得图像的高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// 获得图像的宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (h, w) = self.shape();
        h * w
    }

    /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&u8> {
        self.data.get(pos)
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, 像素值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &u8)> {
        self.data.indexed_iter()
    }

    /// 该图是否为全背景图?
    #[inline]
    pub fn is_background(&self) -> bool {
        self.data.iter().copied().all(is_background)
    }

    /// 统计图像中值为 `label` 的像素总个数.
    #[inline]
    pub fn count(&self, label: u8) -> usize {
        self.data.iter().filter(|&p| *p == label).count()
    }

    /// 将掩码中值为 `old` 的像素全部替换为 `new`.
    ///
    /// 返回总共成功替换的个数.
    pub fn replace(&mut self, old: u8, new: u8) -> usize {
        let mut cnt = 0usize;
        self.data
            .iter_mut()
            .filter(|pix| **pix == old)
            .for_each(|p| {
                cnt += 1;
                *p = new;
            });
        cnt
    }

    /// 获取掩码的基本统计信息.
    ///
    /// 统计信息格式为: \[背景像素数, 细胞核像素数, 胞质像素数\].
    pub fn numeric_statistics(&self) -> [usize; 3] {
        let mut ans = [0; 3];
        for pixel in self.data.iter().filter(|p| **p <= IF_CYTOPLASM) {
            ans[*pixel as usize] += 1;
        }
        ans
    }

    /// 提取细胞核 ([`IF_NUCLEUS`]) 像素组成的二值掩码.
    #[inline]
    pub fn nucleus_mask(&self) -> BinaryMask {
        self.data.mapv(is_nucleus)
    }

    /// 提取胞质 ([`IF_CYTOPLASM`]) 像素组成的二值掩码.
    #[inline]
    pub fn cytoplasm_mask(&self) -> BinaryMask {
        self.data.mapv(is_cytoplasm)
    }

    /// 提取细胞核与胞质并集组成的二值掩码.
    #[inline]
    pub fn cell_mask(&self) -> BinaryMask {
        self.data.mapv(is_cell)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, u8> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_label_mask_statistics() {
        let mask = LabelMask::new(array![[0u8, 1, 2], [2, 1, 0]]);
        assert_eq!(mask.shape(), (2, 3));
        assert_eq!(mask.size(), 6);
        assert_eq!(mask.count(IF_NUCLEUS), 2);
        assert_eq!(mask.numeric_statistics(), [2, 2, 2]);
        assert!(!mask.is_background());
        assert!(LabelMask::zeros((2, 2)).is_background());
    }

    #[test]
    fn test_label_mask_region_views() {
        let mask = LabelMask::new(array![[0u8, 1], [2, 2]]);
        assert_eq!(mask.nucleus_mask(), array![[false, true], [false, false]]);
        assert_eq!(mask.cytoplasm_mask(), array![[false, false], [true, true]]);
        assert_eq!(mask.cell_mask(), array![[false, true], [true, true]]);
    }

    #[test]
    fn test_label_mask_replace() {
        let mut mask = LabelMask::new(array![[2u8, 2], [1, 0]]);
        assert_eq!(mask.replace(IF_CYTOPLASM, IF_BACKGROUND), 2);
        assert_eq!(mask.count(IF_CYTOPLASM), 0);
        assert_eq!(mask.count(IF_BACKGROUND), 3);
    }

    #[test]
    fn test_if_stack_axes() {
        let stack = IfStack::new(Array4::<f32>::zeros((4, 3, 8, 16)));
        assert_eq!(stack.channels(), 4);
        assert_eq!(stack.len_z(), 3);
        assert_eq!(stack.shape_hw(), (8, 16));
        assert_eq!(stack.channel(1).dim(), (3, 8, 16));
        assert_eq!(stack.plane(1, 2).dim(), (8, 16));
    }

    #[test]
    fn test_if_stack_from_tczyx() {
        let mut data = Array5::<f32>::zeros((2, 1, 1, 2, 2));
        data[(1, 0, 0, 0, 0)] = 7.0;
        let stack = IfStack::from_tczyx(&data, 1);
        assert_eq!(stack[(0, 0, 0, 0)], 7.0);
        assert_eq!(stack.channels(), 1);
    }
}
