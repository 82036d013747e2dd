//! 導出エンジン
//!
//! 列スキーマの正規化 → ルール評価 → 導出値の書き込みを1回の純粋関数として行う。
//!
//! ## 処理フロー
//! 1. 入力の列名から役割（種別・素材・スポーツ種別など）を解決（1回のみ）
//! 2. ターゲットスキーマに列を揃える
//! 3. レコードごとに関税番号・品名を導出（レコード間の依存なし）
//! 4. 導出値を書き込み、導出のあった行だけをレポートにまとめる

use crate::alias::AliasConfig;
use crate::locator::{FieldLocator, FieldRole, LocatorConfig};
use crate::report::{
    DerivationReport, DerivationStats, REPORT_CODE_RATIONALE, REPORT_DESCRIPTION_RATIONALE, REPORT_ROW,
};
use crate::rules::{RuleInput, RuleTable};
use crate::schema::{self, fields, TargetSchema};
use crate::types::{Record, RecordSet};
use serde::Serialize;
use tracing::debug;

/// 1レコード分の導出結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Derivation {
    /// 関税番号（一致なしは空）
    pub code: String,
    /// 品名（一致なしは空）
    pub description: String,
    /// 関税番号ルールの理由（常に非空）
    pub rationale: String,
    /// 品名ルールの理由（常に非空）
    pub description_rationale: String,
}

impl Derivation {
    /// 導出値が1つもないか
    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.description.is_empty()
    }
}

/// エンジンオプション
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub locator: LocatorConfig,
    /// ルール評価前に適用する表記ゆれ変換
    pub aliases: AliasConfig,
    /// 関税番号の書き込み先（入力に該当列がない場合）
    pub code_field: String,
    /// 品名の書き込み先（入力に該当列がない場合）
    pub description_field: String,
    /// 理由を書き込む列（None なら書き込まない）
    pub rationale_field: Option<String>,
    /// レポートに含める識別用の列
    pub report_fields: Vec<String>,
    /// 既存の値を上書きする（false なら空欄のみ埋める）
    pub overwrite: bool,
    /// 並列評価
    pub parallel: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            locator: LocatorConfig::default(),
            aliases: AliasConfig::default(),
            code_field: fields::TARIFF_CODE.to_string(),
            description_field: fields::CUSTOMS_DESCRIPTION.to_string(),
            rationale_field: None,
            report_fields: vec![fields::ARTICLE_NUMBER.to_string(), fields::PRODUCT_NAME.to_string()],
            overwrite: true,
            parallel: true,
        }
    }
}

/// 3値から導出
pub fn derive(input: &RuleInput<'_>, rules: &RuleTable) -> Derivation {
    let code = rules.classify_code(input);
    let description = rules.classify_description(input);

    Derivation {
        code: code.value,
        description: description.value,
        rationale: code.rationale,
        description_rationale: description.rationale,
    }
}

/// 1レコードから導出
pub fn derive_record(
    record: &Record,
    locator: &FieldLocator,
    rules: &RuleTable,
    aliases: &AliasConfig,
) -> Derivation {
    let input = RuleInput::new(
        aliases.product_type(locator.value(record, FieldRole::Type)),
        aliases.material(locator.value(record, FieldRole::Material)),
        locator.value(record, FieldRole::SubType),
    );
    derive(&input, rules)
}

/// 正規化と導出（標準オプション）
pub fn normalize_and_derive(
    records: &RecordSet,
    schema: &TargetSchema,
    rules: &RuleTable,
) -> (RecordSet, DerivationReport) {
    normalize_and_derive_with(records, schema, rules, &EngineOptions::default())
}

/// 正規化と導出
///
/// 入力は変更しない。出力のレコード順は入力順と一致する。
pub fn normalize_and_derive_with(
    records: &RecordSet,
    schema: &TargetSchema,
    rules: &RuleTable,
    options: &EngineOptions,
) -> (RecordSet, DerivationReport) {
    let locator = FieldLocator::resolve(&records.columns(), &options.locator);
    normalize_and_derive_located(records, schema, rules, options, &locator)
}

/// 解決済みのロケータで正規化と導出
///
/// 呼び出し側でロケータを他の集計にも使う場合、解決を1回で済ませるために使う。
pub fn normalize_and_derive_located(
    records: &RecordSet,
    schema: &TargetSchema,
    rules: &RuleTable,
    options: &EngineOptions,
    locator: &FieldLocator,
) -> (RecordSet, DerivationReport) {
    let mut output = schema::normalize(records, schema);

    let derivations = evaluate_all(output.records(), locator, rules, options);

    let code_field = locator
        .field(FieldRole::Code)
        .unwrap_or(&options.code_field)
        .to_string();
    let description_field = locator
        .field(FieldRole::Description)
        .unwrap_or(&options.description_field)
        .to_string();
    debug!(code_field = %code_field, description_field = %description_field, "書き込み先");

    // 書き込み先の列は導出の有無にかかわらず全レコードに持たせる
    let target_fields = [
        Some(&code_field),
        Some(&description_field),
        options.rationale_field.as_ref(),
    ];
    for record in output.records_mut() {
        for field in target_fields.iter().flatten() {
            if !record.contains(field) {
                record.set(field.as_str(), "");
            }
        }
    }

    let mut stats = DerivationStats {
        total_records: output.len(),
        ..Default::default()
    };
    let mut report = RecordSet::default();

    for (index, (record, derivation)) in output
        .records_mut()
        .iter_mut()
        .zip(derivations.iter())
        .enumerate()
    {
        *stats
            .rationale_counts
            .entry(derivation.rationale.clone())
            .or_insert(0) += 1;

        if write_value(record, &code_field, &derivation.code, options.overwrite) {
            stats.codes_written += 1;
        }
        if write_value(record, &description_field, &derivation.description, options.overwrite) {
            stats.descriptions_written += 1;
        }
        if let Some(field) = &options.rationale_field {
            record.set(field.as_str(), derivation.rationale.as_str());
        }

        if derivation.is_empty() {
            continue;
        }
        stats.derived_records += 1;

        report.push(report_row(
            index,
            record,
            derivation,
            locator,
            options,
            &code_field,
            &description_field,
        ));
    }

    debug!(
        total = stats.total_records,
        derived = stats.derived_records,
        "導出完了"
    );

    let report = DerivationReport {
        table: report,
        stats,
        resolved_fields: locator
            .iter()
            .map(|(role, name)| (role.to_string(), name.to_string()))
            .collect(),
    };

    (output, report)
}

fn evaluate_all(
    records: &[Record],
    locator: &FieldLocator,
    rules: &RuleTable,
    options: &EngineOptions,
) -> Vec<Derivation> {
    #[cfg(feature = "parallel")]
    {
        if options.parallel {
            use rayon::prelude::*;
            return records
                .par_iter()
                .map(|r| derive_record(r, locator, rules, &options.aliases))
                .collect();
        }
    }

    records
        .iter()
        .map(|r| derive_record(r, locator, rules, &options.aliases))
        .collect()
}

/// 導出値を書き込む（空の導出は既存値を消さない）
///
/// 値が実際に変わった場合のみ true。
fn write_value(record: &mut Record, field: &str, value: &str, overwrite: bool) -> bool {
    if value.is_empty() {
        return false;
    }
    let current = record.value(field).trim();
    if current == value || (!overwrite && !current.is_empty()) {
        return false;
    }
    if !current.is_empty() {
        debug!(field, from = current, to = value, "既存値を上書き");
    }
    record.set(field, value);
    true
}

fn report_row(
    index: usize,
    record: &Record,
    derivation: &Derivation,
    locator: &FieldLocator,
    options: &EngineOptions,
    code_field: &str,
    description_field: &str,
) -> Record {
    let mut row = Record::new();
    row.set(REPORT_ROW, (index + 1).to_string());

    for field in &options.report_fields {
        if let Some(value) = record.get(field) {
            row.set(field.as_str(), value);
        }
    }

    for role in [FieldRole::Type, FieldRole::Material, FieldRole::SubType] {
        row.set(role.label(), locator.value(record, role));
    }

    row.set(code_field, record.value(code_field));
    row.set(description_field, record.value(description_field));
    row.set(REPORT_CODE_RATIONALE, derivation.rationale.as_str());
    row.set(REPORT_DESCRIPTION_RATIONALE, derivation.description_rationale.as_str());
    row
}
