//! 列スキーマの正規化
//!
//! 入力レコードを固定の列順（ターゲットスキーマ）に揃える。
//! - スキーマ列は必ず存在（なければ空文字）
//! - スキーマ列を先頭にスキーマ順で配置
//! - スキーマ外の列は元の順序のまま末尾に残す（データは落とさない）

use crate::error::{Error, Result};
use crate::types::{Record, RecordSet};
use serde::{Deserialize, Serialize};

/// 標準の列名
pub mod fields {
    pub const ARTICLE_NUMBER: &str = "Article number";
    pub const PRODUCT_NAME: &str = "Product name";
    pub const BRAND: &str = "Brand";
    pub const PRODUCT_TYPE: &str = "Product type";
    pub const FRAME_MATERIAL: &str = "Frame material";
    pub const SPORT_TYPE: &str = "Sport type";
    pub const TARIFF_CODE: &str = "Customs tariff number";
    pub const CUSTOMS_DESCRIPTION: &str = "Customs description";
    pub const COUNTRY_OF_ORIGIN: &str = "Country of origin";
    pub const EAN: &str = "EAN";
}

/// ターゲットスキーマ（順序付きの列名リスト）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SchemaFile", into = "SchemaFile")]
pub struct TargetSchema {
    fields: Vec<String>,
}

/// JSON上の表現: 配列 または {"fields": [...]}
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SchemaFile {
    List(Vec<String>),
    Object { fields: Vec<String> },
}

impl From<SchemaFile> for TargetSchema {
    fn from(file: SchemaFile) -> Self {
        match file {
            SchemaFile::List(fields) | SchemaFile::Object { fields } => Self::new(fields),
        }
    }
}

impl From<TargetSchema> for SchemaFile {
    fn from(schema: TargetSchema) -> Self {
        SchemaFile::Object {
            fields: schema.fields,
        }
    }
}

impl Default for TargetSchema {
    fn default() -> Self {
        Self::eyewear()
    }
}

impl TargetSchema {
    /// 列名リストから作成（空白除去・空名と重複は除外）
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into().trim().to_string();
            if !field.is_empty() && !unique.contains(&field) {
                unique.push(field);
            }
        }
        Self { fields: unique }
    }

    /// 眼鏡製品シートの標準スキーマ
    pub fn eyewear() -> Self {
        Self::new([
            fields::ARTICLE_NUMBER,
            fields::PRODUCT_NAME,
            fields::BRAND,
            fields::PRODUCT_TYPE,
            fields::FRAME_MATERIAL,
            fields::SPORT_TYPE,
            fields::TARIFF_CODE,
            fields::CUSTOMS_DESCRIPTION,
            fields::COUNTRY_OF_ORIGIN,
            fields::EAN,
        ])
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let schema: Self = serde_json::from_str(json)?;
        if schema.is_empty() {
            return Err(Error::InvalidSchema("スキーマに列がありません".into()));
        }
        Ok(schema)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// 1レコードをスキーマに揃える
pub fn normalize_record(record: &Record, schema: &TargetSchema) -> Record {
    let mut normalized = Record::new();

    for field in schema.fields() {
        normalized.set(field.as_str(), record.value(field));
    }

    for (name, value) in record.iter() {
        if !schema.contains(name) {
            normalized.set(name, value);
        }
    }

    normalized
}

/// レコード集合をスキーマに揃える
///
/// 入力は借用のみで変更しない。失敗しない（列の過不足はどちらも正常）。
pub fn normalize(records: &RecordSet, schema: &TargetSchema) -> RecordSet {
    records
        .records()
        .iter()
        .map(|r| normalize_record(r, schema))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> TargetSchema {
        TargetSchema::new(["A", "B", "C"])
    }

    fn names(record: &Record) -> Vec<&str> {
        record.field_names().collect()
    }

    #[test]
    fn test_normalize_inserts_missing_fields() {
        let input = RecordSet::new(vec![Record::from_pairs([("B", "b")])]);
        let output = normalize(&input, &schema());

        let record = &output.records()[0];
        assert_eq!(names(record), vec!["A", "B", "C"]);
        assert_eq!(record.get("A"), Some(""));
        assert_eq!(record.get("B"), Some("b"));
    }

    #[test]
    fn test_normalize_appends_extra_fields_in_original_order() {
        let input = RecordSet::new(vec![Record::from_pairs([
            ("X", "x"),
            ("C", "c"),
            ("W", "w"),
            ("A", "a"),
        ])]);
        let output = normalize(&input, &schema());

        assert_eq!(names(&output.records()[0]), vec!["A", "B", "C", "X", "W"]);
        assert_eq!(output.records()[0].get("W"), Some("w"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let input = RecordSet::new(vec![
            Record::from_pairs([("Z", "1"), ("B", "2")]),
            Record::from_pairs([("C", "3")]),
        ]);
        let once = normalize(&input, &schema());
        let twice = normalize(&once, &schema());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_does_not_touch_input() {
        let input = RecordSet::new(vec![Record::from_pairs([("Z", "1")])]);
        let snapshot = input.clone();
        let _ = normalize(&input, &schema());
        assert_eq!(input, snapshot);
    }

    #[test]
    fn test_normalize_keeps_every_input_field() {
        let input = RecordSet::new(vec![Record::from_pairs([
            ("Q", "1"),
            ("A", "2"),
            ("R", ""),
        ])]);
        let output = normalize(&input, &schema());
        for name in input.records()[0].field_names() {
            assert!(output.records()[0].contains(name), "{} が消えた", name);
        }
    }

    #[test]
    fn test_normalize_empty_input() {
        let output = normalize(&RecordSet::default(), &schema());
        assert!(output.is_empty());
    }

    #[test]
    fn test_schema_from_json_variants() {
        let list = TargetSchema::from_json(r#"["A", "B", "A", " "]"#).unwrap();
        assert_eq!(list.fields(), &["A".to_string(), "B".to_string()]);

        let object = TargetSchema::from_json(r#"{"fields": ["X"]}"#).unwrap();
        assert_eq!(object.fields(), &["X".to_string()]);

        assert!(TargetSchema::from_json("[]").is_err());
    }

    #[test]
    fn test_default_schema_has_derived_fields() {
        let schema = TargetSchema::default();
        assert!(schema.contains(fields::TARIFF_CODE));
        assert!(schema.contains(fields::CUSTOMS_DESCRIPTION));
    }
}
