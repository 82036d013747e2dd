//! 対話モード
//!
//! ファイル指定 → プレビュー → 処理 → 結果表示 → 保存 を繰り返す。
//! 読み込みや保存に失敗しても対話は終了せず、次の入力を待つ。

use crate::config::Config;
use crate::error::{AutofillError, Result};
use crate::export;
use crate::loader;
use crate::pipeline::{stats_lines, Pipeline};
use dialoguer::{Confirm, Input};
use eyewear_autofill_common::RecordSet;
use std::path::{Path, PathBuf};

/// プレビューの1セルの最大文字数
const PREVIEW_CELL_WIDTH: usize = 24;

pub fn run_shell(pipeline: &Pipeline, config: &Config) -> Result<()> {
    println!("👓 eyewear-autofill - 対話モード");
    println!("---");
    println!("ファイルを指定すると列を揃えて関税番号・品名を入力します。[Enter]のみで終了");
    println!("---\n");

    loop {
        let Some(input) = prompt_input_path()? else {
            break;
        };

        let records = match loader::load_records(&input) {
            Ok(records) => records,
            Err(e) => {
                println!("✗ {}\n", e);
                continue;
            }
        };

        println!("✔ {}件のレコード, {}列\n", records.len(), records.columns().len());
        for line in preview_lines(&records, config.preview_rows) {
            println!("  {}", line);
        }
        println!();

        if !confirm("処理しますか?", true)? {
            continue;
        }

        let outcome = pipeline.run(&records);
        println!("✔ 処理完了");
        for line in stats_lines(&outcome.report.stats, outcome.out_of_scope_records) {
            println!("  {}", line);
        }
        println!();

        let output = prompt_output_path(config)?;
        let format = export::format_for_path(&output);
        match export::export_records(&outcome.records, &outcome.report, format, &output) {
            Ok(paths) => {
                for path in paths {
                    println!("✔ 保存しました: {}", path.display());
                }
            }
            Err(e) => println!("✗ {}", e),
        }
        println!();

        if !confirm("続けて別のファイルを処理しますか?", true)? {
            break;
        }
    }

    println!("終了します");
    Ok(())
}

fn prompt_input_path() -> Result<Option<PathBuf>> {
    let input: String = Input::new()
        .with_prompt("入力ファイル")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| AutofillError::Prompt(e.to_string()))?;

    Ok(parse_path_input(&input))
}

fn prompt_output_path(config: &Config) -> Result<PathBuf> {
    let default = default_output_path(config.output_dir.as_deref());
    let input: String = Input::new()
        .with_prompt("保存先")
        .default(default.display().to_string())
        .interact_text()
        .map_err(|e| AutofillError::Prompt(e.to_string()))?;

    Ok(parse_path_input(&input).unwrap_or(default))
}

fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| AutofillError::Prompt(e.to_string()))
}

/// 入力されたパス（前後の空白・引用符を除去、空や q なら None）
pub fn parse_path_input(input: &str) -> Option<PathBuf> {
    let trimmed = input.trim().trim_matches(|c: char| c == '"' || c == '\'').trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("q") {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

pub fn default_output_path(output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => dir.join(export::DEFAULT_OUTPUT_NAME),
        None => PathBuf::from(export::DEFAULT_OUTPUT_NAME),
    }
}

/// 先頭 n 行のプレビュー（1行目は列名）
pub fn preview_lines(records: &RecordSet, rows: usize) -> Vec<String> {
    let (columns, values) = records.to_rows();
    let mut lines = vec![join_cells(&columns)];
    lines.extend(values.iter().take(rows).map(|row| join_cells(row)));
    if values.len() > rows {
        lines.push(format!("... 他 {}行", values.len() - rows));
    }
    lines
}

fn join_cells(cells: &[String]) -> String {
    cells
        .iter()
        .map(|cell| truncate(cell, PREVIEW_CELL_WIDTH))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let head: String = value.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}
