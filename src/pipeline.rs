//! 処理パイプライン
//!
//! 読み込み → 列の正規化・導出 → 対象外種別の集計 → 書き出し。
//! 参照データ・ルール表・スキーマの読み込みは処理前にまとめて行い、失敗したら何も処理しない。

use crate::cli::{ExportFormat, ProcessArgs};
use crate::config::Config;
use crate::error::{AutofillError, Result};
use crate::export;
use crate::loader;
use crate::reference::ReferenceDataset;
use eyewear_autofill_common::{
    normalize_and_derive_located, AliasConfig, DerivationReport, DerivationStats, EngineOptions,
    FieldLocator, FieldRole, LocatorConfig, RecordSet, RuleTable, TargetSchema,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 1回の処理結果
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub records: RecordSet,
    pub report: DerivationReport,
    /// 参照データにない種別を持つレコード数
    pub out_of_scope_records: usize,
    pub out_of_scope_types: Vec<String>,
}

/// 処理サマリー（`--summary` で保存）
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSummary {
    pub input: String,
    pub outputs: Vec<String>,
    pub stats: DerivationStats,
    pub out_of_scope_records: usize,
    pub out_of_scope_types: Vec<String>,
    pub resolved_fields: BTreeMap<String, String>,
    pub generated_at: String,
}

impl ProcessSummary {
    pub fn new(input: &Path, outputs: &[PathBuf], outcome: &ProcessOutcome) -> Self {
        Self {
            input: input.display().to_string(),
            outputs: outputs.iter().map(|p| p.display().to_string()).collect(),
            stats: outcome.report.stats.clone(),
            out_of_scope_records: outcome.out_of_scope_records,
            out_of_scope_types: outcome.out_of_scope_types.clone(),
            resolved_fields: outcome.report.resolved_fields.clone(),
            generated_at: chrono::Local::now().to_rfc3339(),
        }
    }
}

/// 読み込み済みの定義一式
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub schema: TargetSchema,
    pub rules: RuleTable,
    pub options: EngineOptions,
    pub reference: Option<ReferenceDataset>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            schema: TargetSchema::eyewear(),
            rules: RuleTable::eyewear(),
            options: EngineOptions::default(),
            reference: None,
        }
    }
}

impl Pipeline {
    /// コマンドライン引数と設定から作成（引数が優先）
    pub fn from_args(args: &ProcessArgs, config: &Config) -> Result<Self> {
        let schema = match args.schema.as_ref().or(config.schema_path.as_ref()) {
            Some(path) => load_schema(path)?,
            None => TargetSchema::eyewear(),
        };
        let rules = load_rules(args.rules.as_deref().or(config.rules_path.as_deref()))?;

        let options = EngineOptions {
            locator: load_locator(
                args.locator.as_deref().or(config.locator_path.as_deref()),
                &args.id_tokens,
            )?,
            aliases: load_aliases(
                args.preset.as_deref(),
                args.alias.as_deref().or(config.alias_path.as_deref()),
            )?,
            rationale_field: args
                .rationale_field
                .clone()
                .or_else(|| config.rationale_field.clone()),
            overwrite: !args.no_overwrite,
            parallel: config.parallel && !args.sequential,
            ..Default::default()
        };

        let reference = match args.reference.clone().or_else(|| config.reference_path()) {
            Some(path) => Some(ReferenceDataset::load(&path, &options.locator)?),
            None => None,
        };

        Ok(Self {
            schema,
            rules,
            options,
            reference,
        })
    }

    /// レコードセットを処理（ファイル入出力なし）
    pub fn run(&self, records: &RecordSet) -> ProcessOutcome {
        let locator = FieldLocator::resolve(&records.columns(), &self.options.locator);
        let (output, report) =
            normalize_and_derive_located(records, &self.schema, &self.rules, &self.options, &locator);

        let (out_of_scope_records, out_of_scope_types) = match &self.reference {
            Some(reference) => {
                let (count, kinds) =
                    reference.out_of_scope(records.records(), &locator, &self.options.aliases);
                (count, kinds.into_iter().map(String::from).collect())
            }
            None => (0, Vec::new()),
        };

        if out_of_scope_records > 0 {
            warn!(
                count = out_of_scope_records,
                types = ?out_of_scope_types,
                "参照データにない種別のレコードがあります"
            );
        }

        ProcessOutcome {
            records: output,
            report,
            out_of_scope_records,
            out_of_scope_types,
        }
    }

    /// 1ファイルを読み込み・処理・書き出し
    pub fn process_file(&self, input: &Path, output: &Path, format: ExportFormat) -> Result<ProcessSummary> {
        let records = loader::load_records(input)?;
        info!(path = %input.display(), records = records.len(), "読み込み完了");

        let outcome = self.run(&records);
        let outputs = export::export_records(&outcome.records, &outcome.report, format, output)?;
        info!(path = %output.display(), "書き出し完了");

        Ok(ProcessSummary::new(input, &outputs, &outcome))
    }
}

/// 集計値の表示用テキスト
pub fn stats_lines(stats: &DerivationStats, out_of_scope_records: usize) -> Vec<String> {
    let mut lines = vec![
        format!("レコード数: {}", stats.total_records),
        format!(
            "導出あり: {} / 導出なし: {}",
            stats.derived_records,
            stats.unmatched_records()
        ),
        format!(
            "関税番号の書き込み: {} / 品名の書き込み: {}",
            stats.codes_written, stats.descriptions_written
        ),
    ];
    for (rationale, count) in &stats.rationale_counts {
        lines.push(format!("  {}: {}", rationale, count));
    }
    if out_of_scope_records > 0 {
        lines.push(format!("参照データにない種別: {}件", out_of_scope_records));
    }
    lines
}

/// ターゲットスキーマを読み込む（JSON 以外はテンプレートのヘッダー行）
pub fn load_schema(path: &Path) -> Result<TargetSchema> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        return Ok(TargetSchema::from_file(path)?);
    }

    let schema = TargetSchema::new(loader::load_headers(path)?);
    if schema.is_empty() {
        return Err(AutofillError::Config(format!(
            "テンプレートにヘッダーがありません: {}",
            path.display()
        )));
    }
    Ok(schema)
}

/// ルール表を読み込む（未指定なら組み込み）
pub fn load_rules(path: Option<&Path>) -> Result<RuleTable> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(AutofillError::FileNotFound(path.display().to_string()));
            }
            Ok(RuleTable::from_file(path)?)
        }
        None => Ok(RuleTable::eyewear()),
    }
}

/// プリセットとファイルのエイリアスを合成（ファイルが優先）
pub fn load_aliases(preset: Option<&str>, path: Option<&Path>) -> Result<AliasConfig> {
    let mut aliases = match preset {
        Some(name) => AliasConfig::from_preset(name)
            .ok_or_else(|| AutofillError::Config(format!("不明なプリセット: {}", name)))?,
        None => AliasConfig::default(),
    };

    if let Some(path) = path {
        if !path.exists() {
            return Err(AutofillError::FileNotFound(path.display().to_string()));
        }
        aliases.merge(&AliasConfig::from_file(path)?);
    }
    Ok(aliases)
}

/// 列ロケータ設定を読み込み、`ROLE=ID` の指定で埋め込みIDを設定
pub fn load_locator(path: Option<&Path>, id_tokens: &[String]) -> Result<LocatorConfig> {
    let mut locator = match path {
        Some(path) => {
            if !path.exists() {
                return Err(AutofillError::FileNotFound(path.display().to_string()));
            }
            LocatorConfig::from_file(path)?
        }
        None => LocatorConfig::default(),
    };

    for assignment in id_tokens {
        let (role, token) = assignment
            .split_once('=')
            .map(|(role, token)| (role.trim(), token.trim()))
            .filter(|(_, token)| !token.is_empty())
            .ok_or_else(|| {
                AutofillError::Config(format!("IDは ROLE=ID の形式で指定してください: {}", assignment))
            })?;
        let role: FieldRole = role.parse()?;
        locator.set_id_token(role, token);
    }
    Ok(locator)
}
