//! 整图与整目录的处理管线.
//!
//! 目录级批处理只是对单图管线的逐文件套用: 每个图像栈独立处理,
//! 中间数组随用随弃, 栈与栈之间没有共享可变状态.
//! 单个文件的解码或写盘失败只记录日志并在结果里留下占位,
//! 不会中断也不会错位其余文件的结果. 批处理的进度走 `log`,
//! 调用方需要自备日志实现:
//!
//! ```no_run
//! use if_berry::normalize::Projection;
//! use if_berry::pipeline;
//!
//! simple_logger::SimpleLogger::new().init().unwrap();
//!
//! let counts = pipeline::mask_folder("plate", "plate_masks", 0, 3, Projection::Max).unwrap();
//! for (well, count) in &counts {
//!     println!("{well}: {count:?}");
//! }
//! ```

use std::io;
use std::path::Path;

use log::{debug, error, info};
use ndarray::{Array2, Axis};

use crate::compose::compose_trinary;
use crate::data::{IfStack, ImgWriteRaw, LabelMask};
use crate::dataset::{save_measurements, stack_loader};
use crate::normalize::{project_z, Projection};
use crate::quantify::{quantify_channels, MeasurementRow, RegionMeans};
use crate::segment::{
    preprocess_cytoplasm, preprocess_nucleus, prune_cytoplasm, segment_cytoplasm, segment_nucleus,
};
use crate::BinaryMask;

/// 单个图像栈的胞质掩码: 预处理胞质通道后分割.
///
/// # 注意
///
/// `cyto_channel` 必须小于栈的通道数, 否则 panic.
pub fn cyto_mask_image(stack: &IfStack, cyto_channel: usize, projection: Projection) -> BinaryMask {
    let img = preprocess_cytoplasm(stack.channel(cyto_channel), projection);
    segment_cytoplasm(&img)
}

/// 单个图像栈的完整分割管线, 返回三值标签掩码与通过验证的细胞个数.
///
/// 阶段顺序固定: 先分割胞质, 再以胞质验证细胞核,
/// 然后用验证过的细胞核修剪胞质, 最后合成三值掩码.
///
/// # 注意
///
/// 两个通道号都必须小于栈的通道数, 否则 panic.
pub fn mask_image(
    stack: &IfStack,
    nuclear_channel: usize,
    cyto_channel: usize,
    projection: Projection,
) -> (LabelMask, u32) {
    let cytoplasm = cyto_mask_image(stack, cyto_channel, projection);
    let nuclear_img = preprocess_nucleus(stack.channel(nuclear_channel), projection);
    let (nuclei, count) = segment_nucleus(&nuclear_img, &cytoplasm);
    let kept = prune_cytoplasm(&cytoplasm, &nuclei);
    debug!(
        "分割细节: 胞质 {} 像素, 验证后细胞核 {count} 个, 修剪后胞质 {} 像素",
        area(&cytoplasm),
        area(&kept)
    );
    (compose_trinary(&nuclei, &kept), count)
}

/// 前景像素个数.
fn area(mask: &BinaryMask) -> usize {
    mask.iter().filter(|&&fg| fg).count()
}

/// 对栈中请求的各通道做 z 投影后, 在标签掩码约定下统计区域均值.
///
/// 定量读取的是投影后的原始亮度, 不经过裁剪或归一化.
/// 输出顺序与 `channels` 一致; `channels` 为空时输出为空.
///
/// # 注意
///
/// 请求的每个通道号都必须小于栈的通道数, 否则 panic.
pub fn quantify_stack(
    stack: &IfStack,
    labels: &LabelMask,
    channels: &[usize],
    projection: Projection,
) -> Vec<RegionMeans> {
    if channels.is_empty() {
        return Vec::new();
    }
    let planes: Vec<Array2<f32>> = channels
        .iter()
        .map(|&c| project_z(stack.channel(c), projection))
        .collect();
    let views: Vec<_> = planes.iter().map(|p| p.view()).collect();
    // 同一个栈的各通道形状一致, 组栈不会失败.
    let stacked = ndarray::stack(Axis(0), &views).unwrap();
    quantify_channels(stacked.view(), labels)
}

/// 三值掩码的保存文件名.
fn mask_file_name(well: &str) -> String {
    format!("{well}_mask.png")
}

/// 胞质掩码的保存文件名.
fn cyto_file_name(well: &str) -> String {
    format!("{well}_cyto.png")
}

/// 对目录下每个 `.npy` 图像栈生成胞质掩码, 按原样存为
/// `{output}/<孔位>_cyto.png`.
///
/// # 注意
///
/// `input` 必须是目录, 否则 panic. 输出目录不存在时自动创建.
pub fn cyto_mask_folder<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    cyto_channel: usize,
    projection: Projection,
) -> io::Result<()> {
    let output = output.as_ref();
    std::fs::create_dir_all(output)?;

    for (well, stack) in stack_loader(input)? {
        let stack = match stack {
            Ok(s) => s,
            Err(e) => {
                error!("孔位 {well}: 图像栈解码失败: {e}");
                continue;
            }
        };
        let mask = cyto_mask_image(&stack, cyto_channel, projection);
        let path = output.join(cyto_file_name(&well));
        match mask.save_raw(&path) {
            Ok(()) => info!("孔位 {well}: 胞质掩码已写入 {}", path.display()),
            Err(e) => error!("孔位 {well}: 掩码写盘失败: {e}"),
        }
    }
    Ok(())
}

/// 对目录下每个 `.npy` 图像栈运行完整分割管线, 三值掩码按原样存为
/// `{output}/<孔位>_mask.png`.
///
/// 返回值与输入文件的排序一一对应: 每项是孔位名加细胞计数,
/// 解码或写盘失败的栈计数为 `None`, 位置保留.
///
/// # 注意
///
/// `input` 必须是目录, 否则 panic. 输出目录不存在时自动创建.
pub fn mask_folder<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    nuclear_channel: usize,
    cyto_channel: usize,
    projection: Projection,
) -> io::Result<Vec<(String, Option<u32>)>> {
    let output = output.as_ref();
    std::fs::create_dir_all(output)?;

    let loader = stack_loader(input)?;
    let mut counts = Vec::with_capacity(loader.len());
    for (well, stack) in loader {
        let count = match stack {
            Ok(stack) => {
                mask_one(&well, &stack, output, nuclear_channel, cyto_channel, projection)
            }
            Err(e) => {
                error!("孔位 {well}: 图像栈解码失败: {e}");
                None
            }
        };
        counts.push((well, count));
    }
    Ok(counts)
}

/// 单个栈的分割加写盘. 写盘失败返回 `None`.
fn mask_one(
    well: &str,
    stack: &IfStack,
    output: &Path,
    nuclear_channel: usize,
    cyto_channel: usize,
    projection: Projection,
) -> Option<u32> {
    let (labels, count) = mask_image(stack, nuclear_channel, cyto_channel, projection);
    let path = output.join(mask_file_name(well));
    match labels.save_raw(&path) {
        Ok(()) => {
            info!("孔位 {well}: {count} 个细胞, 掩码已写入 {}", path.display());
            Some(count)
        }
        Err(e) => {
            error!("孔位 {well}: 掩码写盘失败: {e}");
            None
        }
    }
}

/// 对目录下每个 `.npy` 图像栈读取已保存的三值掩码并定量,
/// 结果表写入 `output_csv` 并原样返回.
///
/// 行顺序与输入文件的排序一一对应. 栈解码失败或掩码缺失的孔位
/// 以全 NaN 行占位, 保证行与文件对齐.
///
/// # 注意
///
/// 1. `input` 必须是目录, 否则 panic.
/// 2. 请求的每个通道号都必须小于栈的通道数, 掩码尺寸必须与图像一致,
///    否则 panic.
pub fn quantify_folder<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
    input: P,
    masks: Q,
    output_csv: R,
    channels: &[usize],
    projection: Projection,
) -> io::Result<Vec<MeasurementRow>> {
    let masks = masks.as_ref();
    let loader = stack_loader(input)?;
    let mut rows = Vec::with_capacity(loader.len());
    for (well, stack) in loader {
        rows.push(quantify_one(&well, stack, masks, channels, projection));
    }
    save_measurements(output_csv, channels, &rows)?;
    Ok(rows)
}

/// 单个栈的定量. 任何文件级失败都退化为全 NaN 行.
fn quantify_one(
    well: &str,
    stack: Result<IfStack, ndarray_npy::ReadNpyError>,
    masks: &Path,
    channels: &[usize],
    projection: Projection,
) -> MeasurementRow {
    let stack = match stack {
        Ok(s) => s,
        Err(e) => {
            error!("孔位 {well}: 图像栈解码失败: {e}");
            return MeasurementRow::unavailable(well, channels.len());
        }
    };
    let mask_path = masks.join(mask_file_name(well));
    let labels = match LabelMask::open(&mask_path) {
        Ok(m) => m,
        Err(e) => {
            error!("孔位 {well}: 掩码 {} 读取失败: {e}", mask_path.display());
            return MeasurementRow::unavailable(well, channels.len());
        }
    };
    let means = quantify_stack(&stack, &labels, channels, projection);
    MeasurementRow::new(well, &means)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};

        use crate::dataset::{list_stacks, well_from_path};
    }
}

/// 并发操作部分.
///
/// 栈与栈之间没有共享可变状态, 目录级批处理可以直接按文件切分;
/// 结果顺序与顺序版本一致.
#[cfg(feature = "rayon")]
mod par {
    use super::*;

    /// 借助 `rayon`, 并行地对目录下每个图像栈生成胞质掩码.
    /// 行为与 [`cyto_mask_folder`] 一致.
    pub fn par_cyto_mask_folder<P: AsRef<Path>, Q: AsRef<Path>>(
        input: P,
        output: Q,
        cyto_channel: usize,
        projection: Projection,
    ) -> io::Result<()> {
        let output = output.as_ref();
        std::fs::create_dir_all(output)?;

        list_stacks(input)?.into_par_iter().for_each(|path| {
            let well = named(&path);
            match IfStack::open_npy(&path) {
                Ok(stack) => {
                    let mask = cyto_mask_image(&stack, cyto_channel, projection);
                    let target = output.join(cyto_file_name(&well));
                    match mask.save_raw(&target) {
                        Ok(()) => info!("孔位 {well}: 胞质掩码已写入 {}", target.display()),
                        Err(e) => error!("孔位 {well}: 掩码写盘失败: {e}"),
                    }
                }
                Err(e) => error!("孔位 {well}: 图像栈解码失败: {e}"),
            }
        });
        Ok(())
    }

    /// 借助 `rayon`, 并行地对目录下每个图像栈运行完整分割管线.
    /// 行为与 [`mask_folder`] 一致, 返回的计数同样按输入文件排序对齐.
    pub fn par_mask_folder<P: AsRef<Path>, Q: AsRef<Path>>(
        input: P,
        output: Q,
        nuclear_channel: usize,
        cyto_channel: usize,
        projection: Projection,
    ) -> io::Result<Vec<(String, Option<u32>)>> {
        let output = output.as_ref();
        std::fs::create_dir_all(output)?;

        let counts = list_stacks(input)?
            .into_par_iter()
            .map(|path| {
                let well = named(&path);
                let count = match IfStack::open_npy(&path) {
                    Ok(stack) => mask_one(
                        &well,
                        &stack,
                        output,
                        nuclear_channel,
                        cyto_channel,
                        projection,
                    ),
                    Err(e) => {
                        error!("孔位 {well}: 图像栈解码失败: {e}");
                        None
                    }
                };
                (well, count)
            })
            .collect();
        Ok(counts)
    }

    /// 借助 `rayon`, 并行地对目录下每个图像栈做定量.
    /// 行为与 [`quantify_folder`] 一致, 行顺序同样与输入文件对齐.
    pub fn par_quantify_folder<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
        input: P,
        masks: Q,
        output_csv: R,
        channels: &[usize],
        projection: Projection,
    ) -> io::Result<Vec<MeasurementRow>> {
        let masks = masks.as_ref();
        let rows: Vec<MeasurementRow> = list_stacks(input)?
            .into_par_iter()
            .map(|path| {
                let well = named(&path);
                quantify_one(&well, IfStack::open_npy(&path), masks, channels, projection)
            })
            .collect();
        save_measurements(output_csv, channels, &rows)?;
        Ok(rows)
    }

    /// 并行路径下的孔位命名, 与 [`StackLoader`](crate::dataset::StackLoader) 的规则一致.
    fn named(path: &Path) -> String {
        well_from_path(path).unwrap_or_else(|| path.to_string_lossy().into_owned())
    }
}

#[cfg(feature = "rayon")]
pub use par::{par_cyto_mask_folder, par_mask_folder, par_quantify_folder};
