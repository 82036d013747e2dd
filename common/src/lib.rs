//! Eyewear Autofill Common Library
//!
//! CLIとライブラリ利用側で共有される型と導出ロジック:
//! - 列スキーマの正規化
//! - 列ロケータ（役割 → 列名の解決）
//! - 関税番号・品名の分類ルール表と導出エンジン

pub mod types;
pub mod schema;
pub mod locator;
pub mod rules;
pub mod alias;
pub mod engine;
pub mod report;
pub mod error;

pub use types::{Record, RecordSet};
pub use schema::{normalize, TargetSchema};
pub use locator::{FieldLocator, FieldRole, LocatorConfig, RoleSpec};
pub use rules::{Condition, Rule, RuleInput, RuleOutcome, RuleTable};
pub use alias::AliasConfig;
pub use engine::{
    derive, derive_record, normalize_and_derive, normalize_and_derive_located, normalize_and_derive_with,
    Derivation, EngineOptions,
};
pub use report::{DerivationReport, DerivationStats};
pub use error::{Error, Result};
