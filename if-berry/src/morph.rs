//! 二值掩码上的形态学操作.
//!
//! 结构元固定为半径 1 的菱形 (十字形 5 像素). 边界约定: 膨胀时图像外视为背景,
//! 腐蚀时图像外视为前景. 因此腐蚀不会从图像边框向内啃噬,
//! 闭运算对贴边前景是保形的.

use crate::regions::{neighbour4, regions, touches_border};
use crate::BinaryMask;

/// 以半径 1 菱形为结构元, 对掩码实施 `iterations` 次膨胀.
pub fn dilate(mask: &BinaryMask, iterations: u32) -> BinaryMask {
    let (height, width) = mask.dim();
    let mut cur = mask.clone();
    for _ in 0..iterations {
        let mut next = cur.clone();
        for (pos, &fg) in cur.indexed_iter() {
            if fg {
                continue;
            }
            if neighbour4(pos)
                .into_iter()
                .any(|p| p.0 < height && p.1 < width && cur[p])
            {
                next[pos] = true;
            }
        }
        cur = next;
    }
    cur
}

/// 以半径 1 菱形为结构元, 对掩码实施 `iterations` 次腐蚀.
pub fn erode(mask: &BinaryMask, iterations: u32) -> BinaryMask {
    let (height, width) = mask.dim();
    let mut cur = mask.clone();
    for _ in 0..iterations {
        let mut next = cur.clone();
        for (pos, &fg) in cur.indexed_iter() {
            if !fg {
                continue;
            }
            if neighbour4(pos)
                .into_iter()
                .any(|p| p.0 < height && p.1 < width && !cur[p])
            {
                next[pos] = false;
            }
        }
        cur = next;
    }
    cur
}

/// 闭运算: `iterations` 次膨胀后接同样次数的腐蚀.
#[inline]
pub fn close(mask: &BinaryMask, iterations: u32) -> BinaryMask {
    erode(&dilate(mask, iterations), iterations)
}

/// 填充掩码中面积 **不超过** `max_area` 的封闭空洞.
///
/// 空洞指 8-连通的背景区域中不接触图像边缘的那些.
/// 返回被填充的空洞个数.
pub fn fill_holes(mask: &mut BinaryMask, max_area: usize) -> usize {
    let shape = mask.dim();
    let complement: BinaryMask = mask.mapv(|v| !v);
    let mut filled = 0;
    for hole in regions(&complement) {
        if touches_border(shape, &hole) || hole.len() > max_area {
            continue;
        }
        filled += 1;
        for pos in hole.iter() {
            mask[pos] = true;
        }
    }
    filled
}
