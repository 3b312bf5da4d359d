#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供荧光显微镜细胞图像的胞质/细胞核分割、三值掩码合成与按通道定量功能.
//!
//! 该 crate 目前仅提供 `safe` 接口. 将来可能为部分高性能场景关键路径提供 `unsafe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 假设输入为已解码的多通道 z-stack (轴序 `(通道, z, 高, 宽)`),
//!   不负责解码厂商专有的显微镜容器格式.
//! 2. 在非期望情况下, 程序会直接 panic, 而不会导致内存错误. As what Rust promises.
//! 3. 退化统计 (空区域均值、重合百分位数) 以 NaN/inf 形式静默传播, 不视作错误.
//!
//! # 开发计划
//!
//! ### 百分位归一化与 z 投影 ✅
//!
//! 把强度图像的指定百分位区间线性映射到 \[0, 1\] (不截断),
//! 并支持 max/mean 两种 z 方向投影.
//!
//! 实现位于 `if-berry/src/normalize.rs`.
//!
//! ### 8-邻域连通区域提取 ✅
//!
//! 二值掩码上的连通区域、外边界与小区域移除.
//! 本 crate 所有 "连通" 均指 8-邻域 (含对角线) 意义下的连通.
//!
//! 实现位于 `if-berry/src/regions.rs`.
//!
//! ### 菱形结构元形态学 ✅
//!
//! 半径 1 菱形 (十字形 5 像素) 的膨胀/腐蚀/闭运算, 以及有界空洞填充.
//!
//! 实现位于 `if-berry/src/morph.rs`.
//!
//! ### 精确欧氏距离变换 ✅
//!
//! 两趟一维抛物线下包络 (Felzenszwalb & Huttenlocher) 求每个像素到参考掩码的
//! 精确欧氏距离. 距离场构建后只读, 多个区域的判定互不影响.
//!
//! 实现位于 `if-berry/src/distance.rs`.
//!
//! ### 胞质分割 ✅
//!
//! 统计阈值 (`min(0.75, μ+5σ)`) 加形态学清理.
//!
//! 实现位于 `if-berry/src/segment/cyto.rs`.
//!
//! ### 细胞核分割与距离验证 ✅
//!
//! 统计阈值 (`min(0, μ+5σ)`), 再按 "外边界多数贴合胞质" 规则逐区域验证.
//!
//! 实现位于 `if-berry/src/segment/nucleus.rs`.
//!
//! ### 胞质修剪与三值掩码合成 ✅
//!
//! 丢弃不与任何有效细胞核相连的胞质区域, 然后把两张二值掩码合成为
//! 0/1/2 三值掩码 (细胞核优先).
//!
//! 实现位于 `if-berry/src/segment/prune.rs` 和 `if-berry/src/compose.rs`.
//!
//! ### 按通道定量 ✅
//!
//! 对每个请求通道计算 总体/细胞核/胞质 三个区域的平均原始强度,
//! 核质比由调用方在行合成时计算.
//!
//! 实现位于 `if-berry/src/quantify.rs`.
//!
//! ### 数据集遍历与孔位名解析 ✅
//!
//! 迭代器风格的 stack 加载器、孔位名解析与定量结果表写出.
//!
//! 实现位于 `if-berry/src/dataset/*`.
//!
//! ### 批处理管线 ✅
//!
//! 单图五步流水线与文件夹批处理 (含 `rayon` 并行变体).
//! 批处理表格与输入文件列表保持索引对齐, 单图失败不影响其它条目.
//!
//! 实现位于 `if-berry/src/pipeline.rs`.
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档, 并视情况给 private
//! API 提供文档.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 二值掩码. `true` 代表前景像素, 形状与来源图像一致.
pub type BinaryMask = ndarray::Array2<bool>;

type Area2d = Vec<Idx2d>;

/// 多通道 z-stack 与三值标注掩码基础数据结构.
mod data;

pub use data::{IfStack, ImgWriteRaw, ImgWriteVis, LabelMask, OpenMaskError};

#[cfg(feature = "plot")]
pub use data::ImgDisplay;

pub mod consts;

pub mod normalize;

pub mod regions;

pub mod morph;

pub mod distance;

pub mod segment;

pub mod compose;

pub mod quantify;

pub mod dataset;
pub mod pipeline;
pub mod prelude;
