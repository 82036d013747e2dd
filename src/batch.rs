//! フォルダ一括処理

use crate::cli::ExportFormat;
use crate::error::{AutofillError, Result};
use crate::export;
use crate::pipeline::{Pipeline, ProcessSummary};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

const INPUT_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods", "csv", "tsv", "txt"];

/// 出力ファイルとして作られる名前（再処理しない）
const OUTPUT_SUFFIXES: &[&str] = &["_filled", "_filled_report"];

/// 一括処理の結果
#[derive(Debug, Default)]
pub struct BatchResult {
    pub summaries: Vec<ProcessSummary>,
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchResult {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// 入力ファイルを探す
pub fn scan_inputs(folder: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(AutofillError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut inputs: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_input_file(p))
        .collect();

    inputs.sort();
    Ok(inputs)
}

fn is_input_file(path: &Path) -> bool {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    // Excel のロックファイル
    if file_name.starts_with("~$") {
        return false;
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if OUTPUT_SUFFIXES.iter().any(|suffix| stem.ends_with(suffix)) {
        return false;
    }

    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| INPUT_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// フォルダ内の全ファイルを処理（1ファイルの失敗で中断しない）
pub fn process_folder(
    pipeline: &Pipeline,
    inputs: &[PathBuf],
    output_dir: Option<&Path>,
    format: ExportFormat,
) -> BatchResult {
    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut result = BatchResult::default();
    for input in inputs {
        pb.set_message(
            input
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        );

        let output = export::output_path_for(input, output_dir, format);
        match pipeline.process_file(input, &output, format) {
            Ok(summary) => result.summaries.push(summary),
            Err(e) => {
                warn!(path = %input.display(), error = %e, "処理失敗");
                result.failures.push((input.clone(), e.to_string()));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    result
}
