use crate::error::{AutofillError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const REFERENCE_ENV: &str = "EYEWEAR_AUTOFILL_REFERENCE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 参照データ（対象カテゴリ一覧）
    pub reference_path: Option<PathBuf>,
    /// ターゲットスキーマ（JSON またはテンプレートのスプレッドシート）
    pub schema_path: Option<PathBuf>,
    /// ルール表JSON
    pub rules_path: Option<PathBuf>,
    /// エイリアスJSON
    pub alias_path: Option<PathBuf>,
    /// 列ロケータ設定JSON
    pub locator_path: Option<PathBuf>,
    /// 出力先フォルダ
    pub output_dir: Option<PathBuf>,
    /// 理由を書き込む列
    pub rationale_field: Option<String>,
    /// 対話モードのプレビュー行数
    pub preview_rows: usize,
    /// 並列評価
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference_path: None,
            schema_path: None,
            rules_path: None,
            alias_path: None,
            locator_path: None,
            output_dir: None,
            rationale_field: None,
            preview_rows: 5,
            parallel: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AutofillError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("eyewear-autofill").join("config.json"))
    }

    /// 参照データのパス（環境変数を優先）
    pub fn reference_path(&self) -> Option<PathBuf> {
        match std::env::var(REFERENCE_ENV) {
            Ok(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
            _ => self.reference_path.clone(),
        }
    }

    pub fn set_reference_path(&mut self, path: PathBuf) -> Result<()> {
        self.reference_path = Some(path);
        self.save()
    }

    pub fn set_rules_path(&mut self, path: PathBuf) -> Result<()> {
        self.rules_path = Some(path);
        self.save()
    }

    pub fn set_schema_path(&mut self, path: PathBuf) -> Result<()> {
        self.schema_path = Some(path);
        self.save()
    }

    pub fn set_locator_path(&mut self, path: PathBuf) -> Result<()> {
        self.locator_path = Some(path);
        self.save()
    }

    pub fn set_output_dir(&mut self, path: PathBuf) -> Result<()> {
        self.output_dir = Some(path);
        self.save()
    }
}
