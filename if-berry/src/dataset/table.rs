//! 定量结果的表格输出.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::quantify::MeasurementRow;

/// 生成表头: `Well` 后接每个请求通道的四列, 通道号照抄请求值.
pub fn format_header(channels: &[usize]) -> String {
    let mut ans = String::from("Well");
    for &c in channels {
        ans.push_str(&format!(", Ch{c}_TOT, Ch{c}_N, Ch{c}_C, Ch{c}_N/C"));
    }
    ans
}

/// 把表头与所有数据行写入 `w`.
///
/// 数值保留六位小数. NaN 与无穷不做特殊处理, 按默认格式原样写出,
/// 留给人工检查.
///
/// # 注意
///
/// 每一行的通道数必须与 `channels` 一致, 否则 panic.
pub fn write_measurements<W: Write>(
    mut w: W,
    channels: &[usize],
    rows: &[MeasurementRow],
) -> io::Result<()> {
    writeln!(w, "{}", format_header(channels))?;
    for row in rows {
        assert_eq!(
            row.channels.len(),
            channels.len(),
            "孔位 `{}` 的通道数与表头不一致",
            row.well
        );
        write!(w, "{}", row.well)?;
        for c in &row.channels {
            write!(
                w,
                ", {:.6}, {:.6}, {:.6}, {:.6}",
                c.total, c.nucleus, c.cytoplasm, c.ratio
            )?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// 把结果表保存为 `path` 处的 CSV 文件.
pub fn save_measurements<P: AsRef<Path>>(
    path: P,
    channels: &[usize],
    rows: &[MeasurementRow],
) -> io::Result<()> {
    let file = File::create(path)?;
    write_measurements(BufWriter::new(file), channels, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantify::RegionMeans;

    #[test]
    fn test_format_header() {
        assert_eq!(
            format_header(&[1, 2]),
            "Well, Ch1_TOT, Ch1_N, Ch1_C, Ch1_N/C, Ch2_TOT, Ch2_N, Ch2_C, Ch2_N/C"
        );
        assert_eq!(format_header(&[]), "Well");
    }

    #[test]
    fn test_write_rows() {
        let means = RegionMeans {
            total: 7.5,
            nucleus: 5.0,
            cytoplasm: 10.0,
        };
        let rows = vec![
            MeasurementRow::new("B2", &[means]),
            MeasurementRow::unavailable("B3", 1),
        ];
        let mut buf = Vec::new();
        write_measurements(&mut buf, &[2], &rows).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Well, Ch2_TOT, Ch2_N, Ch2_C, Ch2_N/C")
        );
        assert_eq!(
            lines.next(),
            Some("B2, 7.500000, 5.000000, 10.000000, 0.500000")
        );
        // 失败孔位照样占一行, 数值全为 NaN.
        assert_eq!(lines.next(), Some("B3, NaN, NaN, NaN, NaN"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    #[should_panic(expected = "通道数与表头不一致")]
    fn test_channel_count_mismatch_panics() {
        let rows = vec![MeasurementRow::unavailable("B4", 2)];
        let mut buf = Vec::new();
        let _ = write_measurements(&mut buf, &[1], &rows);
    }
}
