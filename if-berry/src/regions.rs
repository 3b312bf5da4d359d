//! 二值掩码上的 8-邻域连通区域提取.
//!
//! 本 crate 所有 "连通" 均指 8-邻域 (含对角线) 意义下的连通.

use crate::{Area2d, BinaryMask, Idx2d};
use std::collections::{HashSet, VecDeque};

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 获得 `(h, w)` 的 8-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour8((h, w): Idx2d) -> [Idx2d; 8] {
    [
        (h.wrapping_sub(1), w.wrapping_sub(1)),
        (h.wrapping_sub(1), w),
        (h.wrapping_sub(1), w.saturating_add(1)),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
        (h.saturating_add(1), w.wrapping_sub(1)),
        (h.saturating_add(1), w),
        (h.saturating_add(1), w.saturating_add(1)),
    ]
}

/// 一个 8-邻域连通的前景区域.
///
/// 区域是临时对象: 按需从二值掩码提取, 判定结束后即可丢弃.
#[derive(Debug, Clone)]
pub struct Region {
    pixels: Area2d,
}

impl Region {
    #[inline]
    fn new(pixels: Area2d) -> Self {
        Self { pixels }
    }

    /// 区域面积 (像素个数).
    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// 判断区域是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// 获取能迭代区域所有像素索引的迭代器.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = Idx2d> + '_ {
        self.pixels.iter().copied()
    }

    /// 区域的包围盒 `((h_min, w_min), (h_max, w_max))`, 两端均为闭区间.
    ///
    /// # 注意
    ///
    /// 区域必须非空, 否则程序 panic.
    pub fn bbox(&self) -> (Idx2d, Idx2d) {
        assert!(!self.is_empty(), "空区域没有包围盒");
        let mut min = (usize::MAX, usize::MAX);
        let mut max = (0, 0);
        for (h, w) in self.iter() {
            min = (min.0.min(h), min.1.min(w));
            max = (max.0.max(h), max.1.max(w));
        }
        (min, max)
    }

    /// 将区域像素写入形状为 `shape` 的空白掩码.
    ///
    /// # 注意
    ///
    /// 区域像素必须都在 `shape` 范围内, 否则程序 panic.
    pub fn to_mask(&self, shape: Idx2d) -> BinaryMask {
        let mut mask = BinaryMask::from_elem(shape, false);
        for pos in self.iter() {
            mask[pos] = true;
        }
        mask
    }

    /// 直接获得内部像素列表的所有权.
    #[inline]
    pub fn into_raw(self) -> Area2d {
        self.pixels
    }
}

/// 按照 8-相邻规则获取掩码中所有前景连通区域.
///
/// 两个前景像素 `p1` 和 `p2` 属于同一个区域, 当且仅当存在一条从 `p1` 到
/// `p2` 的 8-相邻路径, 且路径上的所有像素 (包括 `p1` 和 `p2`) 都是前景.
pub fn regions(mask: &BinaryMask) -> Vec<Region> {
    let (height, width) = mask.dim();
    let mut ans = Vec::with_capacity(1);
    let mut bfs_q = VecDeque::with_capacity(4);
    let mut set = HashSet::with_capacity(16);

    for (pos, &fg) in mask.indexed_iter() {
        if !fg || set.contains(&pos) {
            continue;
        }
        bfs_q.push_back(pos);
        let mut this_area = Area2d::with_capacity(1);
        while !bfs_q.is_empty() {
            let cur = bfs_q.pop_front().unwrap();
            if set.contains(&cur) {
                continue;
            }
            set.insert(cur);
            this_area.push(cur);

            // bfs
            bfs_q.extend(
                neighbour8(cur)
                    .into_iter()
                    .filter(|&p| p.0 < height && p.1 < width && mask[p] && !set.contains(&p)),
            );
        }
        ans.push(Region::new(this_area));
    }
    ans
}

/// 收集区域的外边界: 不属于区域本身、但与区域 8-相邻的所有像素.
///
/// 返回的索引保证不越界且互不重复. 由于 8-连通区域在 8-邻接下是极大的,
/// 与区域相邻的前景像素必属于区域本身, 因此外边界像素在 `mask` 上必为背景.
/// 区域内部空洞的贴边像素同样计入外边界.
pub fn outer_boundary(mask: &BinaryMask, region: &Region) -> Vec<Idx2d> {
    let (height, width) = mask.dim();
    let mut seen = HashSet::with_capacity(region.len());
    let mut ans = Vec::new();
    for pos in region.iter() {
        for p in neighbour8(pos) {
            if p.0 < height && p.1 < width && !mask[p] && seen.insert(p) {
                ans.push(p);
            }
        }
    }
    ans
}

/// 移除掩码中面积 **严格小于** `min_area` 的前景连通区域.
///
/// 返回被移除的区域个数.
pub fn remove_small(mask: &mut BinaryMask, min_area: usize) -> usize {
    let mut removed = 0;
    for region in regions(mask) {
        if region.len() < min_area {
            removed += 1;
            for pos in region.iter() {
                mask[pos] = false;
            }
        }
    }
    removed
}

/// 判断区域是否接触图像边缘. `shape` 为掩码的分辨率 (高, 宽).
pub fn touches_border(shape: Idx2d, region: &Region) -> bool {
    let (height, width) = shape;
    region.iter().any(|(h, w)| {
        h == 0 || h.saturating_add(1) == height || w == 0 || w.saturating_add(1) == width
    })
}
