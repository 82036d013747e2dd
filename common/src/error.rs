//! エラー型定義
//!
//! 導出そのものは失敗しない。エラーになるのはルール表・スキーマ・エイリアス・列ロケータ設定の読み込みのみ。

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("定義ファイルを読み込めません: {0}")]
    Io(#[from] std::io::Error),

    #[error("定義ファイルのJSONが不正です: {0}")]
    Json(#[from] serde_json::Error),

    #[error("スキーマ定義が不正です: {0}")]
    InvalidSchema(String),

    #[error("ルール定義が不正です: {0}")]
    InvalidRule(String),

    #[error("列ロケータの設定が不正です: {0}")]
    InvalidLocator(String),
}

pub type Result<T> = std::result::Result<T, Error>;
