//! 列ロケータ
//!
//! 論理的な役割（製品種別・フレーム素材など）を、入力ファイル上の実際の列名に
//! 対応付ける。入力ファイルごとに列名の表記が揺れるため、実行ごとに1回だけ解決する。
//!
//! ## 解決順序
//! 1. 候補名との完全一致
//! 2. 列名に埋め込まれたID（例: `Frame material (ID: 13)`）
//! 3. 表記揺れを吸収したあいまい一致（英数字のみ・小文字化して比較、編集距離）
//!
//! 解決できなかった役割は常に空値として扱い、エラーにはしない。

use crate::error::{Error, Result};
use crate::schema::fields;
use crate::types::Record;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// 列の役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    Type,
    Material,
    SubType,
    Code,
    Description,
    Category,
}

impl FieldRole {
    /// レポート列に使う表示名
    pub fn label(&self) -> &'static str {
        match self {
            FieldRole::Type => "Type",
            FieldRole::Material => "Material",
            FieldRole::SubType => "Sub-type",
            FieldRole::Code => "Code",
            FieldRole::Description => "Description",
            FieldRole::Category => "Category",
        }
    }
}

impl std::fmt::Display for FieldRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldRole::Type => write!(f, "type"),
            FieldRole::Material => write!(f, "material"),
            FieldRole::SubType => write!(f, "sub_type"),
            FieldRole::Code => write!(f, "code"),
            FieldRole::Description => write!(f, "description"),
            FieldRole::Category => write!(f, "category"),
        }
    }
}

impl std::str::FromStr for FieldRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "type" => Ok(FieldRole::Type),
            "material" => Ok(FieldRole::Material),
            "sub_type" | "subtype" => Ok(FieldRole::SubType),
            "code" => Ok(FieldRole::Code),
            "description" => Ok(FieldRole::Description),
            "category" => Ok(FieldRole::Category),
            other => Err(Error::InvalidLocator(format!("不明な役割: {}", other))),
        }
    }
}

/// 役割ごとの探索設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub role: FieldRole,
    /// 候補の列名（優先順）
    #[serde(default)]
    pub names: Vec<String>,
    /// 列名に埋め込まれたID
    #[serde(default)]
    pub id_token: Option<String>,
}

impl RoleSpec {
    pub fn new<I, S>(role: FieldRole, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role,
            names: names.into_iter().map(Into::into).collect(),
            id_token: None,
        }
    }

    pub fn with_id_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }
}

/// ロケータ設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    pub roles: Vec<RoleSpec>,
    /// あいまい一致の閾値（0.0-1.0）
    pub fuzzy_threshold: f64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            roles: vec![
                RoleSpec::new(FieldRole::Type, [fields::PRODUCT_TYPE, "Type", "Product category"]),
                RoleSpec::new(FieldRole::Material, [fields::FRAME_MATERIAL, "Material"]),
                RoleSpec::new(
                    FieldRole::SubType,
                    [fields::SPORT_TYPE, "Sport sub-type", "Sub-type", "Subtype"],
                ),
                RoleSpec::new(
                    FieldRole::Code,
                    [fields::TARIFF_CODE, "Tariff code", "HS code", "Customs code"],
                ),
                RoleSpec::new(
                    FieldRole::Description,
                    [fields::CUSTOMS_DESCRIPTION, "Customs text", "Tariff description"],
                ),
                RoleSpec::new(FieldRole::Category, ["Category", fields::PRODUCT_TYPE, "Type"]),
            ],
            fuzzy_threshold: 0.85,
        }
    }
}

impl LocatorConfig {
    /// JSONファイルから読み込み（省略した項目は組み込みの既定値）
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        if !(0.0..=1.0).contains(&config.fuzzy_threshold) {
            return Err(Error::InvalidLocator(format!(
                "fuzzy_threshold は0.0-1.0で指定してください: {}",
                config.fuzzy_threshold
            )));
        }
        Ok(config)
    }

    pub fn role_spec(&self, role: FieldRole) -> Option<&RoleSpec> {
        self.roles.iter().find(|s| s.role == role)
    }

    /// 役割のIDを設定（既存の役割がなければ追加）
    pub fn set_id_token(&mut self, role: FieldRole, token: impl Into<String>) {
        let token = token.into();
        match self.roles.iter_mut().find(|s| s.role == role) {
            Some(role_spec) => role_spec.id_token = Some(token),
            None => self
                .roles
                .push(RoleSpec::new(role, Vec::<String>::new()).with_id_token(token)),
        }
    }
}

/// 解決済みの役割 → 列名マッピング
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldLocator {
    resolved: BTreeMap<FieldRole, String>,
}

impl FieldLocator {
    /// 列名リストに対して全役割を解決
    pub fn resolve(columns: &[String], config: &LocatorConfig) -> Self {
        let mut resolved = BTreeMap::new();

        for role_spec in &config.roles {
            match resolve_role(columns, role_spec, config.fuzzy_threshold) {
                Some(column) => {
                    debug!(role = %role_spec.role, column = %column, "列を解決");
                    resolved.insert(role_spec.role, column);
                }
                None => debug!(role = %role_spec.role, "列が見つかりません"),
            }
        }

        Self { resolved }
    }

    /// 明示的に列を割り当てる
    pub fn with_field(mut self, role: FieldRole, column: impl Into<String>) -> Self {
        self.resolved.insert(role, column.into());
        self
    }

    pub fn field(&self, role: FieldRole) -> Option<&str> {
        self.resolved.get(&role).map(String::as_str)
    }

    pub fn is_resolved(&self, role: FieldRole) -> bool {
        self.resolved.contains_key(&role)
    }

    /// レコードから役割の値を取得（未解決・列なしは空文字、前後の空白は除去）
    pub fn value<'a>(&self, record: &'a Record, role: FieldRole) -> &'a str {
        self.field(role)
            .and_then(|name| record.get(name))
            .map(str::trim)
            .unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldRole, &str)> {
        self.resolved.iter().map(|(role, name)| (*role, name.as_str()))
    }
}

/// 1つの役割を解決する
pub fn resolve_role(columns: &[String], role_spec: &RoleSpec, threshold: f64) -> Option<String> {
    // 完全一致
    for name in &role_spec.names {
        if let Some(column) = columns.iter().find(|c| *c == name) {
            return Some(column.clone());
        }
    }

    // 埋め込みID
    if let Some(token) = &role_spec.id_token {
        if let Some(column) = find_by_id_token(columns, token) {
            return Some(column.to_string());
        }
    }

    // 正規化後の一致
    for name in &role_spec.names {
        let wanted = normalize_header(name);
        if wanted.is_empty() {
            continue;
        }
        if let Some(column) = columns.iter().find(|c| normalize_header(c) == wanted) {
            return Some(column.clone());
        }
    }

    // 編集距離による近似
    let mut best: Option<(&String, f64)> = None;
    for column in columns {
        let normalized = normalize_header(column);
        for name in &role_spec.names {
            let score = similarity(&normalized, &normalize_header(name));
            if score >= threshold && best.map_or(true, |(_, s)| score > s) {
                best = Some((column, score));
            }
        }
    }

    best.map(|(column, _)| column.clone())
}

/// 列名に `ID` + 空白/コロン + トークン（単語単位）を含む最初の列を返す
pub fn find_by_id_token<'a>(columns: &'a [String], token: &str) -> Option<&'a str> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let pattern = format!(r"\bID[\s:]+{}\b", regex::escape(token));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!(token, error = %e, "IDパターンを構築できません");
            return None;
        }
    };

    columns.iter().map(String::as_str).find(|c| re.is_match(c))
}

/// 列名を比較用に正規化（小文字化・英数字以外を除去）
pub fn normalize_header(name: &str) -> String {
    lazy_static! {
        static ref NON_ALNUM: Regex = Regex::new(r"[^\p{L}\p{N}]+").unwrap();
    }
    NON_ALNUM.replace_all(&name.to_lowercase(), "").into_owned()
}

/// 類似度を計算（編集距離ベース）
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let distance = levenshtein_distance(a, b);
    let max_len = a.chars().count().max(b.chars().count());

    1.0 - (distance as f64 / max_len as f64)
}

/// レーベンシュタイン距離を計算
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, ca) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (prev[j + 1] + 1).min(current[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_by_id_token() {
        let cols = columns(&["Name", "Material ID: 13", "Type ID 130", "Other ID:13x"]);
        assert_eq!(find_by_id_token(&cols, "13"), Some("Material ID: 13"));
        assert_eq!(find_by_id_token(&cols, "130"), Some("Type ID 130"));
        assert_eq!(find_by_id_token(&cols, "99"), None);
        assert_eq!(find_by_id_token(&cols, ""), None);
    }

    #[test]
    fn test_find_by_id_token_requires_whole_word() {
        let cols = columns(&["Frame ID: 131"]);
        assert_eq!(find_by_id_token(&cols, "13"), None);
    }

    #[test]
    fn test_resolve_exact_before_id_token() {
        let role_spec = RoleSpec::new(FieldRole::Material, ["Frame material"]).with_id_token("13");
        let cols = columns(&["Material (ID: 13)", "Frame material"]);
        assert_eq!(resolve_role(&cols, &role_spec, 0.85), Some("Frame material".to_string()));
    }

    #[test]
    fn test_resolve_by_id_token() {
        let role_spec = RoleSpec::new(FieldRole::Material, ["Frame material"]).with_id_token("13");
        let cols = columns(&["Werkstoff (ID: 13)", "Brand"]);
        assert_eq!(resolve_role(&cols, &role_spec, 0.85), Some("Werkstoff (ID: 13)".to_string()));
    }

    #[test]
    fn test_resolve_normalized_and_fuzzy() {
        let role_spec = RoleSpec::new(FieldRole::Type, ["Product type"]);
        assert_eq!(
            resolve_role(&columns(&["PRODUCT_TYPE "]), &role_spec, 0.85),
            Some("PRODUCT_TYPE ".to_string())
        );
        assert_eq!(
            resolve_role(&columns(&["Prodct type"]), &role_spec, 0.85),
            Some("Prodct type".to_string())
        );
        assert_eq!(resolve_role(&columns(&["Brand"]), &role_spec, 0.85), None);
    }

    #[test]
    fn test_locator_unresolved_role_reads_empty() {
        let locator = FieldLocator::resolve(&columns(&["Brand"]), &LocatorConfig::default());
        let record = Record::from_pairs([("Brand", "Acme")]);
        assert!(!locator.is_resolved(FieldRole::Type));
        assert_eq!(locator.value(&record, FieldRole::Type), "");
    }

    #[test]
    fn test_locator_value_trims() {
        let locator = FieldLocator::default().with_field(FieldRole::Type, "T");
        let record = Record::from_pairs([("T", "  Frames ")]);
        assert_eq!(locator.value(&record, FieldRole::Type), "Frames");
    }

    #[test]
    fn test_sport_type_does_not_resolve_as_product_type() {
        let locator = FieldLocator::resolve(&columns(&["Sport type"]), &LocatorConfig::default());
        assert_eq!(locator.field(FieldRole::SubType), Some("Sport type"));
        assert_eq!(locator.field(FieldRole::Type), None);
    }

    #[test]
    fn test_set_id_token() {
        let mut config = LocatorConfig::default();
        config.set_id_token(FieldRole::Material, "13");
        assert_eq!(
            config.role_spec(FieldRole::Material).and_then(|s| s.id_token.as_deref()),
            Some("13")
        );
    }

    #[test]
    fn test_field_role_from_str() {
        assert_eq!("type".parse::<FieldRole>().unwrap(), FieldRole::Type);
        assert_eq!("Sub-type".parse::<FieldRole>().unwrap(), FieldRole::SubType);
        assert!(matches!("brand".parse::<FieldRole>(), Err(Error::InvalidLocator(_))));
    }

    #[test]
    fn test_locator_config_from_json() {
        let json = r#"{
            "roles": [
                {"role": "type", "names": ["Warengruppe"]},
                {"role": "material", "names": ["Frame material"], "id_token": "13"}
            ]
        }"#;
        let config = LocatorConfig::from_json(json).unwrap();
        assert_eq!(config.roles.len(), 2);
        assert_eq!(config.fuzzy_threshold, 0.85);

        let locator = FieldLocator::resolve(&columns(&["Warengruppe", "Material (ID: 13)"]), &config);
        assert_eq!(locator.field(FieldRole::Type), Some("Warengruppe"));
        assert_eq!(locator.field(FieldRole::Material), Some("Material (ID: 13)"));

        assert!(LocatorConfig::from_json(r#"{"fuzzy_threshold": 1.5}"#).is_err());
    }

    #[test]
    fn test_similarity() {
        assert!((similarity("frames", "frames") - 1.0).abs() < 0.01);
        assert!(similarity("producttype", "prodcttype") > 0.85);
        assert!(similarity("brand", "material") < 0.5);
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }
}
