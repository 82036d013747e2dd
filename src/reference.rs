//! 参照データ（対象カテゴリ一覧）
//!
//! 処理開始前に読み込み、読めない場合やカテゴリ列がない場合は処理全体を中止する。

use crate::error::{AutofillError, Result};
use crate::loader;
use eyewear_autofill_common::{AliasConfig, FieldLocator, FieldRole, LocatorConfig, Record};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceDataset {
    /// カテゴリ列の名前
    pub category_field: String,
    categories: BTreeSet<String>,
}

impl ReferenceDataset {
    pub fn new<I, S>(category_field: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            category_field: category_field.into(),
            categories: categories
                .into_iter()
                .map(|c| c.as_ref().trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    /// ファイルから読み込み
    pub fn load(path: &Path, locator: &LocatorConfig) -> Result<Self> {
        let records = loader::load_records(path).map_err(|e| match e {
            AutofillError::FileNotFound(p) => AutofillError::ReferenceUnavailable(p),
            AutofillError::LoadFailed { path, reason } => {
                AutofillError::ReferenceUnavailable(format!("{}\n{}", path, reason))
            }
            other => other,
        })?;

        let located = FieldLocator::resolve(&records.columns(), locator);
        let category_field = located
            .field(FieldRole::Category)
            .ok_or_else(|| AutofillError::MissingCategoryField(path.display().to_string()))?
            .to_string();
        debug!(path = %path.display(), field = %category_field, "カテゴリ列");

        let dataset = Self::new(
            category_field.clone(),
            records.records().iter().map(|r| r.value(&category_field)),
        );
        info!(categories = dataset.len(), "参照データ読み込み完了");
        Ok(dataset)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains(category.trim())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// 対象外の種別を持つレコード数と、その種別一覧
    ///
    /// 種別はルール評価と同じくエイリアス変換後の値で判定する。種別が空のレコードは数えない。
    pub fn out_of_scope<'a>(
        &self,
        records: &'a [Record],
        locator: &FieldLocator,
        aliases: &'a AliasConfig,
    ) -> (usize, BTreeSet<&'a str>) {
        let mut count = 0;
        let mut kinds = BTreeSet::new();
        for record in records {
            let value = aliases.product_type(locator.value(record, FieldRole::Type));
            if value.is_empty() || self.contains(value) {
                continue;
            }
            count += 1;
            kinds.insert(value);
        }
        (count, kinds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_trims() {
        let reference = ReferenceDataset::new("Category", ["Frames", " Sunglasses ", ""]);
        assert_eq!(reference.len(), 2);
        assert!(reference.contains("Sunglasses"));
        assert!(reference.contains(" Frames"));
        assert!(!reference.contains("Lenses"));
    }

    #[test]
    fn test_out_of_scope() {
        let reference = ReferenceDataset::new("Category", ["Frames"]);
        let records = vec![
            Record::from_pairs([("Product type", "Frames")]),
            Record::from_pairs([("Product type", "Lenses")]),
            Record::from_pairs([("Product type", "Lenses")]),
            Record::from_pairs([("Product type", "")]),
        ];
        let locator = FieldLocator::default().with_field(FieldRole::Type, "Product type");
        let aliases = AliasConfig::default();
        let (count, kinds) = reference.out_of_scope(&records, &locator, &aliases);
        assert_eq!(count, 2);
        assert_eq!(kinds.into_iter().collect::<Vec<_>>(), vec!["Lenses"]);
    }

    #[test]
    fn test_out_of_scope_uses_aliased_type() {
        let reference = ReferenceDataset::new("Category", ["Sunglasses"]);
        let records = vec![
            Record::from_pairs([("Product type", "Sun glasses")]),
            Record::from_pairs([("Product type", "Goggles")]),
        ];
        let locator = FieldLocator::default().with_field(FieldRole::Type, "Product type");

        let (count, _) = reference.out_of_scope(&records, &locator, &AliasConfig::default());
        assert_eq!(count, 2);

        let aliases = AliasConfig::from_preset("common").unwrap();
        let (count, kinds) = reference.out_of_scope(&records, &locator, &aliases);
        assert_eq!(count, 1);
        assert_eq!(kinds.into_iter().collect::<Vec<_>>(), vec!["Goggles"]);
    }
}
