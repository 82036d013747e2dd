use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutofillError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("ファイルを読み込めません: {path}\n{reason}")]
    LoadFailed { path: String, reason: String },

    #[error("参照データを読み込めません: {0}")]
    ReferenceUnavailable(String),

    #[error("参照データにカテゴリ列がありません: {0}")]
    MissingCategoryField(String),

    #[error("ルール・スキーマ定義エラー: {0}")]
    Definition(#[from] eyewear_autofill_common::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("CSV出力エラー: {0}")]
    CsvWrite(String),

    #[error("入力ファイルが見つかりません: {0}")]
    NoInputFiles(String),

    #[error("対話入力エラー: {0}")]
    Prompt(String),
}

pub type Result<T> = std::result::Result<T, AutofillError>;
