//! CSV出力（データ + レポート）

use crate::error::{AutofillError, Result};
use eyewear_autofill_common::RecordSet;
use std::path::{Path, PathBuf};

pub fn write_csv(records: &RecordSet, output_path: &Path) -> Result<()> {
    let (columns, rows) = records.to_rows();

    let mut writer = csv::Writer::from_path(output_path).map_err(|e| AutofillError::CsvWrite(e.to_string()))?;
    writer
        .write_record(&columns)
        .map_err(|e| AutofillError::CsvWrite(e.to_string()))?;
    for row in &rows {
        writer
            .write_record(row)
            .map_err(|e| AutofillError::CsvWrite(e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// レポートの出力先: `<stem>_report.csv`
pub fn report_path(output_path: &Path) -> PathBuf {
    let stem = output_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("processed_data");
    output_path.with_file_name(format!("{}_report.csv", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_path() {
        assert_eq!(
            report_path(Path::new("/tmp/out/products_filled.csv")),
            PathBuf::from("/tmp/out/products_filled_report.csv")
        );
    }
}
