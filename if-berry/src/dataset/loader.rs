//! 荧光图像栈的目录加载器.
//!
//! 提供迭代器风格的数据集获取模式.

use std::io;
use std::path::{Path, PathBuf};

use ndarray_npy::ReadNpyError;

use super::well_from_path;
use crate::IfStack;

/// 从指定目录创建 [`IfStack`] 加载器, 按文件名顺序迭代目录下所有
/// `.npy` 图像栈, 同时给出每个栈的孔位名.
///
/// # 注意
///
/// 1. `path` 必须是目录, 否则程序 panic.
/// 2. 目录本身读取失败时返回 `Err`. 单个文件解码失败不会中断迭代,
///    而是体现在对应迭代项的 `Result::Err` 里.
pub fn stack_loader<P: AsRef<Path>>(path: P) -> io::Result<StackLoader> {
    let path = path.as_ref();
    assert!(path.is_dir());

    let mut files_rev = super::list_stacks(path)?;
    files_rev.reverse();
    Ok(StackLoader { files_rev })
}

/// 荧光图像栈加载器.
#[derive(Debug)]
pub struct StackLoader {
    files_rev: Vec<PathBuf>,
}

impl Iterator for StackLoader {
    type Item = (String, Result<IfStack, ReadNpyError>);

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files_rev.pop()?;
        let well = well_from_path(&path).unwrap_or_else(|| path.to_string_lossy().into_owned());
        let data = IfStack::open_npy(&path);

        Some((well, data))
    }
}

impl ExactSizeIterator for StackLoader {
    #[inline]
    fn len(&self) -> usize {
        self.files_rev.len()
    }
}
