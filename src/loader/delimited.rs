//! 区切りテキスト読み込み
//!
//! 文字コード（BOM → UTF-8 → Windows-1252）と区切り文字（`,` `;` タブ）の組み合わせを
//! 順に試し、ヘッダーが2列以上かつ全行の列数が揃った最初の解釈を採用する。
//! どれも当てはまらない場合は、ヘッダーの列数が最も多い区切り文字で行の列数を
//! ヘッダーに合わせて読み、それも2列未満なら1列のファイルとして読む。

use super::RawTable;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, trace};

pub const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

pub fn read_delimited(path: &Path) -> Result<RawTable, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err("ファイルが空です".into());
    }

    let texts = decode_candidates(&bytes);
    let mut last_error = String::new();

    for (encoding, text) in &texts {
        for &delimiter in &DELIMITERS {
            match parse(text, delimiter, false) {
                Ok(table) if table.headers.len() >= 2 => return Ok(table),
                Ok(_) => {
                    last_error = "ヘッダーが1列のみ".into();
                }
                Err(e) => {
                    last_error = e;
                }
            }
            let shown = (delimiter as char).escape_default().to_string();
            trace!(encoding = *encoding, delimiter = %shown, "区切り候補を棄却");
        }
    }

    if let Some((_, text)) = texts.first() {
        // 列数の揃わない行を含むファイル（同数なら先の区切り文字を優先）
        let widest = DELIMITERS
            .iter()
            .rev()
            .filter_map(|&delimiter| parse(text, delimiter, true).ok())
            .filter(|table| table.headers.len() >= 2)
            .max_by_key(|table| table.headers.len());
        if let Some(table) = widest {
            return Ok(table);
        }

        // 1列のみのファイル
        if let Ok(table) = parse(text, DELIMITERS[0], false) {
            if !table.headers.is_empty() {
                return Ok(table);
            }
        }
    }

    Err(format!("区切り文字を判定できません（{}）", last_error))
}

/// 試行する文字コードと復号結果
///
/// BOMがあればその文字コードのみ。UTF-8として不正なバイト列は UTF-8 候補から外す。
pub fn decode_candidates(bytes: &[u8]) -> Vec<(&'static str, Cow<'_, str>)> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        let (text, _, _) = encoding.decode(bytes);
        return vec![(encoding.name(), text)];
    }

    let mut candidates = Vec::new();
    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        candidates.push((UTF_8.name(), text));
    }
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    candidates.push((WINDOWS_1252.name(), text));
    candidates
}

/// `flexible` なら列数の違う行を許し、ヘッダーの列数に切り詰め・補完する
fn parse(text: &str, delimiter: u8, flexible: bool) -> Result<RawTable, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(flexible)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(record) => record
            .map_err(|e| e.to_string())?
            .iter()
            .map(|s| s.to_string())
            .collect(),
        None => return Err("ヘッダー行がありません".into()),
    };

    let mut rows = Vec::new();
    let mut adjusted = 0;
    for record in records {
        let record = record.map_err(|e| e.to_string())?;
        let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        if row.len() != headers.len() {
            if row[headers.len().min(row.len())..].iter().any(|c| !c.trim().is_empty()) {
                debug!(row = rows.len() + 2, "ヘッダーより多い列の値を破棄");
            }
            row.resize(headers.len(), String::new());
            adjusted += 1;
        }
        rows.push(row);
    }
    if adjusted > 0 {
        let shown = (delimiter as char).escape_default().to_string();
        debug!(rows = adjusted, delimiter = %shown, "列数をヘッダーに合わせた行");
    }

    Ok(RawTable { headers, rows })
}
