//! エイリアス変換モジュール
//!
//! 製品種別・素材の表記ゆれをルール評価前に正規化する。
//! レコードに保存された値そのものは変更しない。

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// エイリアス定義
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasConfig {
    /// 製品種別のエイリアス
    #[serde(default, rename = "type")]
    pub product_type: BTreeMap<String, String>,
    /// 素材のエイリアス
    #[serde(default)]
    pub material: BTreeMap<String, String>,
}

impl AliasConfig {
    /// 組み込みプリセットを取得
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "none" => Some(Self::default()),
            "common" => Some(Self::common_preset()),
            _ => None,
        }
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    pub fn is_empty(&self) -> bool {
        self.product_type.is_empty() && self.material.is_empty()
    }

    /// よくある表記ゆれのプリセット
    fn common_preset() -> Self {
        let mut config = Self::default();

        config.product_type.insert("Sun glasses".into(), "Sunglasses".into());
        config.product_type.insert("Sunglass".into(), "Sunglasses".into());
        config.product_type.insert("Sports glasses".into(), "Sport glasses".into());
        config.product_type.insert("Frame".into(), "Frames".into());
        config.product_type.insert("Optical frames".into(), "Frames".into());
        config.product_type.insert("Readers".into(), "Reading glasses".into());
        config.product_type.insert("Reading glass".into(), "Reading glasses".into());

        config.material.insert("Acetate".into(), "Plastic (acetate)".into());
        config.material.insert("TR90".into(), "Plastic (TR90)".into());
        config.material.insert("Nylon".into(), "Plastic (nylon)".into());
        config.material.insert("Titanium".into(), "Metal (titanium)".into());
        config.material.insert("Stainless steel".into(), "Metal (stainless steel)".into());

        config
    }

    /// 製品種別を変換（完全一致のみ）
    pub fn product_type<'a>(&'a self, value: &'a str) -> &'a str {
        self.product_type
            .get(value)
            .map(String::as_str)
            .unwrap_or(value)
    }

    /// 素材を変換（完全一致優先、なければ部分一致で最長マッチ。同じ長さなら辞書順で先の候補）
    pub fn material<'a>(&'a self, value: &'a str) -> &'a str {
        transform_field(value, &self.material)
    }

    /// 設定をマージ（後から追加した設定が優先）
    pub fn merge(&mut self, other: &AliasConfig) {
        self.product_type.extend(other.product_type.clone());
        self.material.extend(other.material.clone());
    }
}

fn transform_field<'a>(value: &'a str, aliases: &'a BTreeMap<String, String>) -> &'a str {
    if value.is_empty() {
        return value;
    }

    if let Some(replacement) = aliases.get(value) {
        return replacement;
    }

    let mut best_match: Option<(&str, &str)> = None;
    for (pattern, replacement) in aliases {
        if !pattern.is_empty()
            && value.contains(pattern.as_str())
            && best_match.map_or(true, |(p, _)| pattern.len() > p.len())
        {
            best_match = Some((pattern.as_str(), replacement.as_str()));
        }
    }

    best_match.map(|(_, replacement)| replacement).unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_preset() {
        let config = AliasConfig::from_preset("common").unwrap();
        assert_eq!(config.product_type("Sun glasses"), "Sunglasses");
        assert_eq!(config.product_type("Frames"), "Frames");
        assert!(AliasConfig::from_preset("unknown").is_none());
    }

    #[test]
    fn test_product_type_exact_only() {
        let config = AliasConfig::from_preset("common").unwrap();
        assert_eq!(config.product_type("Frame set"), "Frame set");
    }

    #[test]
    fn test_material_partial_longest_match() {
        let mut config = AliasConfig::default();
        config.material.insert("steel".into(), "Metal".into());
        config.material.insert("Stainless steel".into(), "Metal (stainless)".into());

        assert_eq!(config.material("Stainless steel, matte"), "Metal (stainless)");
        assert_eq!(config.material("Carbon steel"), "Metal");
        assert_eq!(config.material("Wood"), "Wood");
        assert_eq!(config.material(""), "");
    }

    #[test]
    fn test_from_json_and_merge() {
        let mut config = AliasConfig::from_preset("common").unwrap();
        let custom = AliasConfig::from_json(r#"{"type": {"Sun glasses": "Sport glasses"}}"#).unwrap();
        config.merge(&custom);
        assert_eq!(config.product_type("Sun glasses"), "Sport glasses");
    }
}
