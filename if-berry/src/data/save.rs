//! 图像的持久化存储.

use crate::{BinaryMask, LabelMask};
use image::ImageResult;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// `ImgWriteVis` trait 的意图是, 图像将以 "可视化友好"
/// 的方式保存, 而不是 "as is" 的方式. 这意味着, 对于 [`LabelMask`]
/// 这类仅存在 0, 1, 2 像素值的图像, 在保存时会映射到肉眼较易区分的形式;
/// 对于二值掩码, 前景保存为白色.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 表明一个可以通过 **按原样** 模式持久化存储的图像对象.
///
/// `ImgWriteRaw` trait 的额外意图是, 图像将按原样保存. 以该模式保存的
/// [`LabelMask`] 可通过 [`LabelMask::open`] 无损读回.
pub trait ImgWriteRaw {
    /// 按原样将图片保存到 `path` 路径.
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 使像素更有利于单通道可视化.
#[inline]
pub(crate) fn pretty(label: u8) -> u8 {
    use crate::consts::gray::*;
    match label {
        // 背景为黑色
        IF_BACKGROUND => BLACK,

        // 细胞核为白色
        IF_NUCLEUS => WHITE,

        // 胞质为灰色, 与细胞核形成对比
        IF_CYTOPLASM => GRAY,

        any_else => panic!("只允许图像存在 0, 1, 2 像素, 但发现了 `{any_else}`"),
    }
}

/// 会将背景/细胞核/胞质像素分别映射为黑色/白色/灰色. 不允许其他颜色.
impl ImgWriteVis for LabelMask {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &pix) in self.indexed_iter() {
            buf.put_pixel(w as u32, h as u32, image::Luma([pretty(pix)]));
        }
        buf.save(path)
    }
}

/// 按原样存储.
impl ImgWriteRaw for LabelMask {
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &pix) in self.indexed_iter() {
            buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
        }
        buf.save(path)
    }
}

/// 前景映射为白色, 背景映射为黑色.
impl ImgWriteVis for BinaryMask {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        use crate::consts::gray::{BLACK, WHITE};

        let (height, width) = self.dim();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &fg) in self.indexed_iter() {
            let gray = if fg { WHITE } else { BLACK };
            buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
        }
        buf.save(path)
    }
}

/// 前景存储为 1, 背景存储为 0.
impl ImgWriteRaw for BinaryMask {
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.dim();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &fg) in self.indexed_iter() {
            buf.put_pixel(w as u32, h as u32, image::Luma([u8::from(fg)]));
        }
        buf.save(path)
    }
}
