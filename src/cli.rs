use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eyewear-autofill")]
#[command(about = "眼鏡製品シートの列正規化・関税番号/品名自動入力ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力（-v: info, -vv: debug, -vvv: trace）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// 処理オプション（process / batch 共通）
#[derive(clap::Args, Clone, Debug, Default)]
pub struct ProcessArgs {
    /// 出力形式 (xlsx/csv)
    #[arg(short, long, default_value = "xlsx")]
    pub format: ExportFormat,

    /// 参照データ（対象カテゴリ一覧）
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// ターゲットスキーマ（JSON またはテンプレートのスプレッドシート）
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// ルール表JSON
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// エイリアスプリセット (none/common)
    #[arg(long)]
    pub preset: Option<String>,

    /// カスタムエイリアスファイル（JSON）
    #[arg(long)]
    pub alias: Option<PathBuf>,

    /// 列ロケータ設定（JSON）
    #[arg(long)]
    pub locator: Option<PathBuf>,

    /// 列名に埋め込まれたIDで役割の列を指定（例: --id material=13）
    #[arg(long = "id", value_name = "ROLE=ID")]
    pub id_tokens: Vec<String>,

    /// 既存の関税番号・品名を上書きしない（空欄のみ埋める）
    #[arg(long)]
    pub no_overwrite: bool,

    /// 導出理由を書き込む列名
    #[arg(long)]
    pub rationale_field: Option<String>,

    /// 並列評価を無効化
    #[arg(long)]
    pub sequential: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 1ファイルを処理して出力
    Process {
        /// 入力ファイル（xlsx/xls/ods/csv）
        #[arg(required = true)]
        input: PathBuf,

        /// 出力ファイル/ディレクトリ（デフォルト: 入力と同じフォルダ）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 処理サマリーJSONの出力先
        #[arg(long)]
        summary: Option<PathBuf>,

        #[command(flatten)]
        args: ProcessArgs,
    },

    /// フォルダ内の全ファイルを処理
    Batch {
        /// 入力フォルダ
        #[arg(required = true)]
        folder: PathBuf,

        /// 出力ディレクトリ（デフォルト: 各入力と同じフォルダ）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,

        #[command(flatten)]
        args: ProcessArgs,
    },

    /// 対話モード（読み込み → プレビュー → 処理 → 保存）
    Shell {
        #[command(flatten)]
        args: ProcessArgs,
    },

    /// 1件の種別・素材・スポーツ種別を分類
    Classify {
        /// 製品種別
        #[arg(short = 't', long = "type", required = true)]
        product_type: String,

        /// フレーム素材
        #[arg(short, long, default_value = "")]
        material: String,

        /// スポーツ種別
        #[arg(short, long, default_value = "")]
        sub_type: String,

        /// ルール表JSON
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// 使用中のルール表を表示/書き出し
    Rules {
        /// ルール表JSONの書き出し先
        #[arg(long)]
        export: Option<PathBuf>,

        /// ルール表JSON（省略時は設定または組み込み）
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 参照データのパスを設定
        #[arg(long)]
        set_reference: Option<PathBuf>,

        /// ルール表JSONのパスを設定
        #[arg(long)]
        set_rules: Option<PathBuf>,

        /// ターゲットスキーマのパスを設定
        #[arg(long)]
        set_schema: Option<PathBuf>,

        /// 列ロケータ設定JSONのパスを設定
        #[arg(long)]
        set_locator: Option<PathBuf>,

        /// 出力先フォルダを設定
        #[arg(long)]
        set_output_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use xlsx or csv", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}
