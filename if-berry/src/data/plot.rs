//! 图片展示模块, 主要用于调试.
//!
//! # 注意
//!
//! 需要 `plot` feature.

use crate::{BinaryMask, Idx2d, LabelMask};
use opencv::highgui::{imshow, wait_key};
use opencv::prelude::{Mat, MatTrait, MatTraitConst};
use std::time::Duration;

/// 表明一个可以在窗口中可视化的对象.
pub trait ImgDisplay {
    /// 展示对象.
    fn show(&self);

    /// 同 `show()`, 但在之后自动等待一次用户按键输入.
    fn show_and_wait(&self) {
        self.show();
        wait_key(0).unwrap(); // never fails
    }

    /// 同 `show()`, 但在之后自动等待给定时间.
    fn show_and_wait_for(&self, d: Duration) -> opencv::Result<i32> {
        self.show();
        let ms = d.as_millis();
        assert!(ms <= i32::MAX as u128);
        wait_key(ms as i32)
    }
}

/// 将 `data` 按行优先格式, 以 `shape` 分辨率存储为矩阵.
/// 会额外进行可视化友好的像素转换.
fn gray_to_opencv_mat(data: &[u8], (h, w): Idx2d) -> Mat {
    assert_eq!(data.len(), h * w);
    let mut mat = Mat::from_slice_rows_cols(data, h, w).unwrap();

    let size = mat.size().unwrap();
    debug_assert_eq!(size.height as usize, h);
    debug_assert_eq!(size.width as usize, w);

    for i in 0..size.height {
        for j in 0..size.width {
            let slot = mat.at_2d_mut::<u8>(i, j).unwrap();
            *slot = super::save::pretty(*slot);
        }
    }
    mat
}

/// 该对象最多只允许 `0`, `1`, `2` 值, 分别代表背景、细胞核和胞质.
impl ImgDisplay for LabelMask {
    /// 为了获得更清晰的可视化对象, 该功能在展示前对颜色像素值做如下映射:
    ///
    /// 0 (背景) -> 0 (黑色);
    ///
    /// 1 (细胞核) -> 255 (白色);
    ///
    /// 2 (胞质) -> 128 (灰色).
    fn show(&self) {
        let buf;
        let data = self.data();
        let sli = if let Some(sli) = data.as_slice() {
            sli
        } else {
            buf = data.as_standard_layout().to_owned();
            buf.as_slice().unwrap()
        };
        let mat = gray_to_opencv_mat(sli, self.shape());
        imshow("Image", &mat).unwrap();
    }
}

/// 前景展示为白色, 背景展示为黑色.
impl ImgDisplay for BinaryMask {
    fn show(&self) {
        use crate::consts::gray::{BLACK, WHITE};

        let gray: Vec<u8> = self.iter().map(|&fg| if fg { WHITE } else { BLACK }).collect();
        let (h, w) = self.dim();
        let mat = Mat::from_slice_rows_cols(&gray, h, w).unwrap();
        imshow("Image", &mat).unwrap();
    }
}
