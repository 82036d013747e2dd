pub mod delimited;
pub mod excel;

use crate::cli::ExportFormat;
use crate::error::Result;
use crate::pipeline::ProcessSummary;
use eyewear_autofill_common::{DerivationReport, RecordSet};
use std::path::{Path, PathBuf};

/// 対話モードの既定の出力ファイル名
pub const DEFAULT_OUTPUT_NAME: &str = "processed_data.xlsx";

/// 出力先を決める
///
/// フォルダ（または拡張子なし）なら `<入力名>_filled.<拡張子>` を付ける。
/// 未指定なら入力ファイルと同じフォルダ。
pub fn output_path_for(input: &Path, output: Option<&Path>, format: ExportFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("processed_data");
    let file_name = format!("{}_filled.{}", stem, format.extension());

    match output {
        Some(output) if output.is_dir() || output.extension().is_none() => output.join(file_name),
        Some(output) => output.to_path_buf(),
        None => input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(file_name),
    }
}

/// 出力ファイル名の拡張子から形式を決める（不明なら xlsx）
pub fn format_for_path(path: &Path) -> ExportFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
        _ => ExportFormat::Xlsx,
    }
}

/// 処理結果を書き出し、作成したファイルの一覧を返す
pub fn export_records(
    records: &RecordSet,
    report: &DerivationReport,
    format: ExportFormat,
    output_path: &Path,
) -> Result<Vec<PathBuf>> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    match format {
        ExportFormat::Xlsx => {
            excel::generate_excel(records, report, output_path)?;
            Ok(vec![output_path.to_path_buf()])
        }
        ExportFormat::Csv => {
            delimited::write_csv(records, output_path)?;
            let report_path = delimited::report_path(output_path);
            delimited::write_csv(&report.table, &report_path)?;
            Ok(vec![output_path.to_path_buf(), report_path])
        }
    }
}

/// 処理サマリーをJSONで保存
pub fn write_summary(summary: &ProcessSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)?;
    Ok(())
}
