//! 分類ルール表
//!
//! 製品種別・フレーム素材・スポーツ種別の3値から、関税番号と品名を導出する。
//! ルールは優先順に評価し、最初に一致したものを採用する（組み合わせ・スコアリングなし）。
//! カテゴリの組み分けは版によって揺れるため、ルール表はJSONで差し替え可能なデータとして持つ。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const GROUP_PROTECTION: &[&str] = &["Sunglasses", "Sport glasses"];
pub const GROUP_EYEGLASSES: &[&str] = &[
    "Frames",
    "Reading glasses",
    "Driving glasses without power",
    "PC glasses without power",
];
pub const SPORT_SPECIALTY_KEYWORDS: &[&str] = &["swim", "swimm", "ski", "snowboard"];

pub const RATIONALE_NO_MATCH: &str = "no match";
pub const RATIONALE_MISSING_MATERIAL: &str = "missing material";

/// ルール評価の入力（前後の空白は除去済みの想定）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleInput<'a> {
    pub product_type: &'a str,
    pub material: &'a str,
    pub sub_type: &'a str,
}

impl<'a> RuleInput<'a> {
    pub fn new(product_type: &'a str, material: &'a str, sub_type: &'a str) -> Self {
        Self {
            product_type,
            material,
            sub_type,
        }
    }
}

/// ルールの条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum Condition {
    /// 常に一致
    Always,
    /// 製品種別がいずれかに完全一致（大文字小文字を区別）
    TypeIn(Vec<String>),
    /// 素材（小文字化）がいずれかを含む
    MaterialContains(Vec<String>),
    /// スポーツ種別（小文字化）がいずれかを含む
    SubTypeContains(Vec<String>),
    /// すべて一致
    All(Vec<Condition>),
    /// いずれか一致
    Any(Vec<Condition>),
}

impl Condition {
    pub fn type_in(values: &[&str]) -> Self {
        Condition::TypeIn(to_strings(values))
    }

    pub fn material_contains(values: &[&str]) -> Self {
        Condition::MaterialContains(to_strings(values))
    }

    pub fn sub_type_contains(values: &[&str]) -> Self {
        Condition::SubTypeContains(to_strings(values))
    }

    pub fn matches(&self, input: &RuleInput<'_>) -> bool {
        match self {
            Condition::Always => true,
            Condition::TypeIn(types) => types.iter().any(|t| t == input.product_type),
            Condition::MaterialContains(words) => contains_any(input.material, words),
            Condition::SubTypeContains(words) => contains_any(input.sub_type, words),
            Condition::All(conditions) => conditions.iter().all(|c| c.matches(input)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.matches(input)),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn contains_any(value: &str, words: &[String]) -> bool {
    if value.is_empty() {
        return false;
    }
    let value = value.to_lowercase();
    words
        .iter()
        .any(|w| !w.is_empty() && value.contains(&w.to_lowercase()))
}

/// 1件の分類ルール
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub when: Condition,
    /// 導出値（空文字は「一致したが値なし」）
    #[serde(default)]
    pub value: String,
    /// 理由ラベル（`{type}` `{material}` `{sub_type}` を置換）
    pub rationale: String,
}

impl Rule {
    pub fn new(when: Condition, value: &str, rationale: &str) -> Self {
        Self {
            when,
            value: value.to_string(),
            rationale: rationale.to_string(),
        }
    }
}

/// ルール評価の結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    pub value: String,
    pub rationale: String,
}

/// 関税番号・品名のルール表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    pub code_rules: Vec<Rule>,
    pub description_rules: Vec<Rule>,
    /// どのルールにも一致しない場合の理由
    #[serde(default = "default_fallback")]
    pub fallback_rationale: String,
}

fn default_fallback() -> String {
    RATIONALE_NO_MATCH.to_string()
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::eyewear()
    }
}

impl RuleTable {
    /// 眼鏡製品の標準ルール表
    pub fn eyewear() -> Self {
        let protection = Condition::type_in(GROUP_PROTECTION);
        let eyeglasses = Condition::type_in(GROUP_EYEGLASSES);
        let sunglasses = Condition::type_in(&["Sunglasses"]);

        let code_rules = vec![
            Rule::new(
                Condition::All(vec![
                    protection.clone(),
                    Condition::sub_type_contains(SPORT_SPECIALTY_KEYWORDS),
                ]),
                "90049090",
                "sport specialty",
            ),
            Rule::new(protection, "90041091", "protection group: {type}"),
            Rule::new(
                Condition::All(vec![eyeglasses.clone(), Condition::material_contains(&["plastic"])]),
                "90031100",
                "frame material: plastic",
            ),
            Rule::new(
                Condition::All(vec![eyeglasses.clone(), Condition::material_contains(&["metal"])]),
                "90031900",
                "frame material: metal",
            ),
            Rule::new(eyeglasses.clone(), "", RATIONALE_MISSING_MATERIAL),
        ];

        let description_rules = vec![
            Rule::new(eyeglasses, "Eyeglasses", "eyeglasses group: {type}"),
            Rule::new(
                Condition::All(vec![sunglasses.clone(), Condition::material_contains(&["plastic"])]),
                "Sunglasses, plastic frame",
                "sunglasses: plastic frame",
            ),
            Rule::new(
                Condition::All(vec![sunglasses.clone(), Condition::material_contains(&["metal"])]),
                "Sunglasses, metal frame",
                "sunglasses: metal frame",
            ),
            Rule::new(sunglasses, "Sunglasses", "sunglasses: frame material unknown"),
            Rule::new(Condition::type_in(&["Sport glasses"]), "Sport glasses", "sport glasses"),
        ];

        Self {
            code_rules,
            description_rules,
            fallback_rationale: default_fallback(),
        }
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<()> {
        if self.fallback_rationale.trim().is_empty() {
            return Err(Error::InvalidRule("fallback_rationale が空です".into()));
        }
        let all_rules = self.code_rules.iter().chain(self.description_rules.iter());
        for (index, rule) in all_rules.enumerate() {
            if rule.rationale.trim().is_empty() {
                return Err(Error::InvalidRule(format!("ルール{}の rationale が空です", index + 1)));
            }
        }
        Ok(())
    }

    /// 関税番号を導出
    pub fn classify_code(&self, input: &RuleInput<'_>) -> RuleOutcome {
        self.first_match(&self.code_rules, input)
    }

    /// 品名を導出
    pub fn classify_description(&self, input: &RuleInput<'_>) -> RuleOutcome {
        self.first_match(&self.description_rules, input)
    }

    fn first_match(&self, rules: &[Rule], input: &RuleInput<'_>) -> RuleOutcome {
        rules
            .iter()
            .find(|rule| rule.when.matches(input))
            .map(|rule| RuleOutcome {
                value: rule.value.clone(),
                rationale: render_rationale(&rule.rationale, input),
            })
            .unwrap_or_else(|| RuleOutcome {
                value: String::new(),
                rationale: self.fallback_rationale.clone(),
            })
    }
}

fn render_rationale(template: &str, input: &RuleInput<'_>) -> String {
    template
        .replace("{type}", input.product_type)
        .replace("{material}", input.material)
        .replace("{sub_type}", input.sub_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(t: &str, m: &str, s: &str) -> RuleOutcome {
        RuleTable::eyewear().classify_code(&RuleInput::new(t, m, s))
    }

    fn description(t: &str, m: &str) -> RuleOutcome {
        RuleTable::eyewear().classify_description(&RuleInput::new(t, m, ""))
    }

    #[test]
    fn test_sport_specialty_wins_over_protection_group() {
        let outcome = code("Sunglasses", "Metal", "Alpine ski");
        assert_eq!(outcome.value, "90049090");
        assert_eq!(outcome.rationale, "sport specialty");

        assert_eq!(code("Sport glasses", "", "SWIMMING").value, "90049090");
        assert_eq!(code("Sport glasses", "", "Snowboard").value, "90049090");
    }

    #[test]
    fn test_protection_group() {
        let outcome = code("Sunglasses", "Metal", "");
        assert_eq!(outcome.value, "90041091");
        assert_eq!(outcome.rationale, "protection group: Sunglasses");

        let outcome = code("Sport glasses", "", "Cycling");
        assert_eq!(outcome.rationale, "protection group: Sport glasses");
    }

    #[test]
    fn test_eyeglasses_by_material() {
        assert_eq!(code("Frames", "Plastic frame", "").value, "90031100");
        assert_eq!(code("Reading glasses", "METAL", "").value, "90031900");
        assert_eq!(code("PC glasses without power", "metal/plastic", "").value, "90031100");
    }

    #[test]
    fn test_eyeglasses_missing_material() {
        let outcome = code("Frames", "", "");
        assert_eq!(outcome.value, "");
        assert_eq!(outcome.rationale, "missing material");

        assert_eq!(code("Frames", "Titanium", "").rationale, "missing material");
    }

    #[test]
    fn test_no_match() {
        let outcome = code("Unknown Category", "Plastic", "ski");
        assert_eq!(outcome, RuleOutcome { value: String::new(), rationale: "no match".into() });
    }

    #[test]
    fn test_type_is_case_sensitive() {
        assert_eq!(code("sunglasses", "", "").rationale, "no match");
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(description("Frames", "").value, "Eyeglasses");
        assert_eq!(description("Driving glasses without power", "").value, "Eyeglasses");
        assert_eq!(description("Sunglasses", "Plastic").value, "Sunglasses, plastic frame");
        assert_eq!(description("Sunglasses", "Metal").value, "Sunglasses, metal frame");
        assert_eq!(description("Sunglasses", "Wood").value, "Sunglasses");
        assert_eq!(description("Sport glasses", "Metal").value, "Sport glasses");

        let none = description("Contact lenses", "");
        assert_eq!(none.value, "");
        assert_eq!(none.rationale, "no match");
    }

    #[test]
    fn test_rule_table_json_roundtrip_preserves_behavior() {
        let json = RuleTable::eyewear().to_json().unwrap();
        let table = RuleTable::from_json(&json).unwrap();
        assert_eq!(table, RuleTable::eyewear());
    }

    #[test]
    fn test_custom_rule_table() {
        let json = r#"{
            "code_rules": [
                {"when": {"kind": "type_in", "values": ["Goggles"]}, "value": "90049010", "rationale": "goggles"}
            ],
            "description_rules": [
                {"when": {"kind": "always"}, "value": "Other", "rationale": "catch-all"}
            ]
        }"#;
        let table = RuleTable::from_json(json).unwrap();
        let input = RuleInput::new("Goggles", "", "");
        assert_eq!(table.classify_code(&input).value, "90049010");
        assert_eq!(table.classify_description(&input).value, "Other");
        assert_eq!(table.fallback_rationale, "no match");
    }

    #[test]
    fn test_empty_rationale_rejected() {
        let json = r#"{
            "code_rules": [{"when": {"kind": "always"}, "value": "1", "rationale": " "}],
            "description_rules": []
        }"#;
        assert!(RuleTable::from_json(json).is_err());
    }
}
