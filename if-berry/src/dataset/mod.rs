//! 数据集操作: 目录遍历, 孔位命名与结果表输出.

use std::io;
use std::path::{Path, PathBuf};

mod loader;
mod table;

pub use loader::{stack_loader, StackLoader};
pub use table::{format_header, save_measurements, write_measurements};

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

/// 列出目录下所有 `.npy` 图像栈文件, 按路径排序保证批处理顺序稳定.
pub fn list_stacks<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
    let mut ans = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "npy") {
            ans.push(path);
        }
    }
    ans.sort();
    Ok(ans)
}

/// 从图像文件路径解析孔位名.
///
/// 取文件主干名, 并去掉结尾一个 `-<数字>` 形式的视野编号:
/// `B2-01.npy` 与 `B2.npy` 都解析为 `B2`. 结尾不是数字编号时保留完整主干名.
/// 路径没有主干名时返回 `None`.
pub fn well_from_path<P: AsRef<Path>>(path: P) -> Option<String> {
    let stem = path.as_ref().file_stem()?.to_string_lossy();
    match stem.rsplit_once('-') {
        Some((well, site))
            if !well.is_empty()
                && !site.is_empty()
                && site.bytes().all(|b| b.is_ascii_digit()) =>
        {
            Some(well.to_owned())
        }
        _ => Some(stem.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_from_path() {
        assert_eq!(well_from_path("plate/B2-01.npy").as_deref(), Some("B2"));
        assert_eq!(well_from_path("plate/B2.npy").as_deref(), Some("B2"));
        // 只去掉最后一个编号段.
        assert_eq!(
            well_from_path("day3-B2-01.npy").as_deref(),
            Some("day3-B2")
        );
        // 结尾不是纯数字时不截断.
        assert_eq!(well_from_path("B2-x1.npy").as_deref(), Some("B2-x1"));
        assert_eq!(well_from_path("-12.npy").as_deref(), Some("-12"));
    }

    #[test]
    fn test_home_dirs_agree() {
        if let Some(base) = home_dataset_dir() {
            let extended = home_dataset_dir_with(["a", "b"]).unwrap();
            assert!(extended.starts_with(base));
        }
    }
}
