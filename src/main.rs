use anyhow::Context;
use clap::Parser;
use eyewear_autofill::{batch, cli, config, error, export, logging, pipeline, shell};
use eyewear_autofill_common::{derive, RuleInput};
use cli::{Cli, Commands};
use config::Config;
use pipeline::{load_rules, stats_lines, Pipeline};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = Config::load().context("設定ファイルの読み込みに失敗しました")?;

    match cli.command {
        Commands::Process { input, output, summary, args } => {
            println!("👓 eyewear-autofill - 処理\n");

            // 1. 定義の読み込み（参照データを含む）
            println!("[1/3] ルール・スキーマを読み込み中...");
            let pipeline = Pipeline::from_args(&args, &config)?;
            if let Some(reference) = &pipeline.reference {
                println!("✔ 参照データ: {}カテゴリ", reference.len());
            }
            println!("✔ スキーマ: {}列\n", pipeline.schema.len());

            // 2. 読み込み・導出
            println!("[2/3] 処理中...");
            let output_dir = output.as_deref().or(config.output_dir.as_deref());
            let output_path = export::output_path_for(&input, output_dir, args.format);
            let result = pipeline
                .process_file(&input, &output_path, args.format)
                .with_context(|| format!("処理に失敗しました: {}", input.display()))?;
            for line in stats_lines(&result.stats, result.out_of_scope_records) {
                println!("  {}", line);
            }
            println!();

            // 3. 出力
            println!("[3/3] 出力");
            for path in &result.outputs {
                println!("✔ 出力: {}", path);
            }
            if let Some(summary_path) = summary {
                export::write_summary(&result, &summary_path)?;
                println!("✔ サマリー: {}", summary_path.display());
            }

            println!("\n✅ 完了");
        }

        Commands::Batch { folder, output, recursive, args } => {
            println!("👓 eyewear-autofill - 一括処理\n");

            println!("[1/2] ファイルをスキャン中...");
            let inputs = batch::scan_inputs(&folder, recursive)?;
            if inputs.is_empty() {
                return Err(error::AutofillError::NoInputFiles(folder.display().to_string()).into());
            }
            println!("✔ {}件のファイルを検出\n", inputs.len());

            let pipeline = Pipeline::from_args(&args, &config)?;

            println!("[2/2] 処理中...");
            let output_dir = output.as_deref().or(config.output_dir.as_deref());
            let result = batch::process_folder(&pipeline, &inputs, output_dir, args.format);

            for summary in &result.summaries {
                println!(
                    "✔ {} → {} ({}/{}件導出)",
                    summary.input,
                    summary.outputs.join(", "),
                    summary.stats.derived_records,
                    summary.stats.total_records
                );
            }
            for (path, reason) in &result.failures {
                println!("✗ {}: {}", path.display(), reason);
            }

            if result.has_failures() {
                anyhow::bail!(
                    "{}件中{}件のファイルで失敗しました",
                    inputs.len(),
                    result.failures.len()
                );
            }
            println!("\n✅ {}件の処理完了", result.summaries.len());
        }

        Commands::Shell { args } => {
            let pipeline = Pipeline::from_args(&args, &config)?;
            shell::run_shell(&pipeline, &config)?;
        }

        Commands::Classify { product_type, material, sub_type, rules } => {
            let rules = load_rules(rules.as_deref().or(config.rules_path.as_deref()))?;
            let derivation = derive(&RuleInput::new(&product_type, &material, &sub_type), &rules);

            println!("関税番号: {}", display_or_dash(&derivation.code));
            println!("  理由: {}", derivation.rationale);
            println!("品名: {}", display_or_dash(&derivation.description));
            println!("  理由: {}", derivation.description_rationale);
        }

        Commands::Rules { export: export_path, rules } => {
            let rules = load_rules(rules.as_deref().or(config.rules_path.as_deref()))?;
            let json = rules.to_json()?;

            match export_path {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("書き込みに失敗しました: {}", path.display()))?;
                    println!("✔ ルール表を書き出しました: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Config { show, set_reference, set_rules, set_schema, set_locator, set_output_dir } => {
            let mut config = config;

            if let Some(path) = set_reference {
                config.set_reference_path(path)?;
                println!("✔ 参照データを設定しました");
            }
            if let Some(path) = set_rules {
                config.set_rules_path(path)?;
                println!("✔ ルール表を設定しました");
            }
            if let Some(path) = set_schema {
                config.set_schema_path(path)?;
                println!("✔ スキーマを設定しました");
            }
            if let Some(path) = set_locator {
                config.set_locator_path(path)?;
                println!("✔ 列ロケータ設定を設定しました");
            }
            if let Some(path) = set_output_dir {
                config.set_output_dir(path)?;
                println!("✔ 出力先を設定しました");
            }

            if show {
                println!("設定: {}", Config::config_path()?.display());
                println!("  参照データ: {}", display_path(config.reference_path().as_deref()));
                println!("  スキーマ: {}", display_path(config.schema_path.as_deref()));
                println!("  ルール表: {}", display_path(config.rules_path.as_deref()));
                println!("  エイリアス: {}", display_path(config.alias_path.as_deref()));
                println!("  列ロケータ: {}", display_path(config.locator_path.as_deref()));
                println!("  出力先: {}", display_path(config.output_dir.as_deref()));
                println!("  プレビュー行数: {}", config.preview_rows);
                println!("  並列評価: {}", if config.parallel { "有効" } else { "無効" });
            }
        }
    }

    Ok(())
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn display_path(path: Option<&std::path::Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "未設定".to_string())
}
