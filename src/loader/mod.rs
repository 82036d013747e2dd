//! 表データ読み込み
//!
//! 形式判定は行わず、読み込み方法を順番に試して最初に成功したものを採用する:
//! 1. ワークブック（xlsx / xlsm / xls / ods）
//! 2. 区切りテキスト（文字コード × 区切り文字の組み合わせ）
//!
//! すべて失敗した場合は各試行の失敗理由をまとめて返す。

pub mod delimited;
pub mod workbook;

use crate::error::{AutofillError, Result};
use eyewear_autofill_common::RecordSet;
use std::path::Path;
use tracing::debug;

/// 読み込み結果（ヘッダー未整形）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// 読み込み方法
struct Attempt {
    name: &'static str,
    read: fn(&Path) -> std::result::Result<RawTable, String>,
}

const ATTEMPTS: &[Attempt] = &[
    Attempt {
        name: "workbook",
        read: workbook::read_first_sheet,
    },
    Attempt {
        name: "delimited",
        read: delimited::read_delimited,
    },
];

/// ファイルを読み込んでレコードセットにする
pub fn load_records(path: &Path) -> Result<RecordSet> {
    load_table(path).map(into_record_set)
}

/// ヘッダー行のみ読み込む（テンプレートからのスキーマ作成用）
pub fn load_headers(path: &Path) -> Result<Vec<String>> {
    load_table(path).map(|table| dedupe_headers(&table.headers))
}

fn load_table(path: &Path) -> Result<RawTable> {
    if !path.is_file() {
        return Err(AutofillError::FileNotFound(path.display().to_string()));
    }

    let mut failures = Vec::new();
    for attempt in ATTEMPTS {
        match (attempt.read)(path) {
            Ok(table) => {
                debug!(
                    path = %path.display(),
                    method = attempt.name,
                    columns = table.headers.len(),
                    rows = table.rows.len(),
                    "読み込み成功"
                );
                return Ok(table);
            }
            Err(reason) => {
                debug!(path = %path.display(), method = attempt.name, %reason, "読み込み失敗");
                failures.push(format!("- {}: {}", attempt.name, reason));
            }
        }
    }

    Err(AutofillError::LoadFailed {
        path: path.display().to_string(),
        reason: failures.join("\n"),
    })
}

/// ヘッダーを整形し、空行を除いてレコードセットにする
pub fn into_record_set(table: RawTable) -> RecordSet {
    let headers = dedupe_headers(&table.headers);
    let rows: Vec<Vec<String>> = table
        .rows
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();
    RecordSet::from_rows(&headers, rows)
}

/// 空のヘッダーは `Unnamed: N`、重複は ` (2)` ` (3)` を付けて一意にする
pub fn dedupe_headers(headers: &[String]) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(headers.len());
    for (index, header) in headers.iter().enumerate() {
        let base = header.trim().trim_start_matches('\u{feff}').trim();
        let base = if base.is_empty() {
            format!("Unnamed: {}", index)
        } else {
            base.to_string()
        };

        let mut name = base.clone();
        let mut n = 2;
        while result.contains(&name) {
            name = format!("{} ({})", base, n);
            n += 1;
        }
        result.push(name);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_dedupe_headers() {
        let headers = strings(&["Type", "", "Type", " Material ", "Type"]);
        assert_eq!(
            dedupe_headers(&headers),
            strings(&["Type", "Unnamed: 1", "Type (2)", "Material", "Type (3)"])
        );
    }

    #[test]
    fn test_into_record_set_skips_blank_rows() {
        let table = RawTable {
            headers: strings(&["A", "B"]),
            rows: vec![strings(&["1", "2"]), strings(&["", "  "]), strings(&["3"])],
        };
        let records = into_record_set(table);
        assert_eq!(records.len(), 2);
        assert_eq!(records.records()[1].get("B"), Some(""));
    }

    #[test]
    fn test_missing_file() {
        let result = load_records(Path::new("/nonexistent/products.csv"));
        assert!(matches!(result, Err(AutofillError::FileNotFound(_))));
    }
}
