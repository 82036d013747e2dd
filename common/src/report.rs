//! 導出レポート
//!
//! 導出が1件以上あった行だけを抜き出した表と、集計値。エクスポート前の確認用。

use crate::types::RecordSet;
use serde::Serialize;
use std::collections::BTreeMap;

/// 元データの行番号（1始まり）
pub const REPORT_ROW: &str = "Row";
pub const REPORT_CODE_RATIONALE: &str = "Code rationale";
pub const REPORT_DESCRIPTION_RATIONALE: &str = "Description rationale";

/// 導出の統計情報
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivationStats {
    /// 処理したレコード数
    pub total_records: usize,
    /// 導出値が1つ以上あったレコード数
    pub derived_records: usize,
    /// 関税番号の値が変わった数
    pub codes_written: usize,
    /// 品名の値が変わった数
    pub descriptions_written: usize,
    /// 関税番号ルールの理由ごとの件数
    pub rationale_counts: BTreeMap<String, usize>,
}

impl DerivationStats {
    /// 導出できなかったレコード数
    pub fn unmatched_records(&self) -> usize {
        self.total_records - self.derived_records
    }
}

/// 導出レポート
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivationReport {
    /// 導出のあった行（識別列 + 入力3値 + 導出値 + 理由）
    pub table: RecordSet,
    pub stats: DerivationStats,
    /// 役割 → 解決された列名
    pub resolved_fields: BTreeMap<String, String>,
}

impl DerivationReport {
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_records() {
        let stats = DerivationStats {
            total_records: 10,
            derived_records: 7,
            ..Default::default()
        };
        assert_eq!(stats.unmatched_records(), 3);
    }

    #[test]
    fn test_report_serialize() {
        let mut report = DerivationReport::default();
        report.stats.total_records = 1;
        report.resolved_fields.insert("type".into(), "Product type".into());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stats"]["total_records"], 1);
        assert_eq!(json["resolved_fields"]["type"], "Product type");
        assert!(json["table"].as_array().unwrap().is_empty());
    }
}
