use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fbatch_renamer_core::{
    app_paths, exif_keys, generate_preview, load_config, AppConfig, DateFormatRegistry,
    ExifField, HashAlgorithm, Id3Field, PreviewOptions, RenamePreview, Transform,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fbatch-renamer-cli")]
#[command(about = "テンプレートの変数を解決してファイル名の変更結果を表示します")]
struct Cli {
    /// 詳細ログを表示する
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Preview(PreviewArgs),
    Tokens,
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
}

#[derive(Debug, Args)]
struct PreviewArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long, overrides_with = "no_recursive")]
    recursive: bool,
    /// 設定ファイルの recursive_default を打ち消す
    #[arg(long, overrides_with = "recursive")]
    no_recursive: bool,
    #[arg(long, overrides_with = "no_include_hidden")]
    include_hidden: bool,
    /// 設定ファイルの include_hidden_default を打ち消す
    #[arg(long, overrides_with = "include_hidden")]
    no_include_hidden: bool,
    #[arg(long)]
    template: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Preview(args) => cmd_preview(args),
        Commands::Tokens => {
            print_tokens();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show().map(|_| ExitCode::SUCCESS),
        },
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn switch(on: bool, off: bool, default: bool) -> bool {
    match (on, off) {
        (true, _) => true,
        (_, true) => false,
        _ => default,
    }
}

fn preview_options(args: PreviewArgs, config: &AppConfig) -> PreviewOptions {
    PreviewOptions {
        recursive: switch(args.recursive, args.no_recursive, config.recursive_default),
        include_hidden: switch(
            args.include_hidden,
            args.no_include_hidden,
            config.include_hidden_default,
        ),
        template: args.template.unwrap_or_else(|| config.template.clone()),
        input: args.input,
    }
}

fn cmd_preview(args: PreviewArgs) -> Result<ExitCode> {
    let config = load_config()?;
    let output = args.output;
    let options = preview_options(args, &config);

    let preview = generate_preview(&options, config.providers())?;

    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        OutputFormat::Table => {
            print_table(&preview);
        }
    }

    eprintln!("dry-runモード: 実ファイルは変更していません。");

    if preview.has_failures() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn print_table(preview: &RenamePreview) {
    println!("元ファイル -> 新ファイル");
    for change in &preview.outcome.changes {
        println!(
            "{} -> {}",
            change.base_dir.join(&change.source).display(),
            change.target
        );
    }

    if !preview.outcome.failures.is_empty() {
        println!("\n失敗:");
        for failure in &preview.outcome.failures {
            println!(
                "{}: {}",
                failure.base_dir.join(&failure.source).display(),
                failure.reason
            );
        }
    }

    println!(
        "\n集計: scanned={} hidden_skip={} resolved={} failed={} unchanged={}",
        preview.stats.scanned_files,
        preview.stats.skipped_hidden,
        preview.stats.resolved,
        preview.stats.failed,
        preview.stats.unchanged
    );
}

fn print_tokens() {
    println!("ファイル名:");
    println!("  {{{{p}}}}  親ディレクトリ名");
    println!("  {{{{f}}}}  拡張子を除いたファイル名");
    println!("  {{{{ext}}}}  拡張子 (ドット付き)");

    println!("\n連番:");
    println!("  [開始]%[0][幅]d[r|b|o|h][増分][<除外範囲>]  例: %03d, 10%d2, %dr<1-5;9>");

    println!("\n日付: {{{{mtime|atime|ctime|btime|now.<書式>}}}}");
    let registry = DateFormatRegistry::standard();
    println!("  書式: {}", registry.tokens().collect::<Vec<_>>().join(" "));

    println!("\nExif: {{{{exif.<項目>}}}} / {{{{exif.dt.<書式>}}}}");
    for field in ExifField::ALL {
        let key = field
            .key()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}x{}", exif_keys::WIDTH, exif_keys::HEIGHT));
        println!("  {:<6} {}", field.alias(), key);
    }

    println!("\n音声タグ: {{{{id3.<項目>}}}}");
    let fields: Vec<_> = Id3Field::ALL.iter().map(|f| f.key()).collect();
    println!("  {}", fields.join(" "));

    println!("\nExifTool: {{{{xt.<タグ名>}}}}  例: {{{{xt.ImageWidth}}}}");

    println!("\nハッシュ: {{{{hash.<方式>}}}}");
    let algorithms: Vec<_> = HashAlgorithm::ALL.iter().map(|a| a.as_str()).collect();
    println!("  {}", algorithms.join(" "));

    println!("\nランダム: {{{{[長さ]r[_l|_d|_ld|<文字集合>]}}}}  例: {{{{8r_d}}}}");

    println!("\n変換: {{{{tr.<方式>}}}}");
    let transforms: Vec<_> = Transform::ALL.iter().map(|t| t.as_str()).collect();
    println!("  {}", transforms.join(" "));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(argv: &[&str], config: &AppConfig) -> PreviewOptions {
        let cli = Cli::try_parse_from(argv).expect("must parse");
        let Commands::Preview(args) = cli.command else {
            panic!("not preview");
        };
        preview_options(args, config)
    }

    #[test]
    fn config_defaults_apply_without_flags() {
        let config = AppConfig {
            recursive_default: true,
            include_hidden_default: true,
            ..AppConfig::default()
        };
        let got = options(&["cli", "preview", "--input", "."], &config);
        assert!(got.recursive);
        assert!(got.include_hidden);
        assert_eq!(got.template, config.template);
    }

    #[test]
    fn negative_flags_override_config() {
        let config = AppConfig {
            recursive_default: true,
            include_hidden_default: true,
            ..AppConfig::default()
        };
        let got = options(
            &["cli", "preview", "--input", ".", "--no-recursive", "--no-include-hidden"],
            &config,
        );
        assert!(!got.recursive);
        assert!(!got.include_hidden);
    }

    #[test]
    fn last_flag_wins() {
        let got = options(
            &["cli", "preview", "--input", ".", "--no-recursive", "--recursive"],
            &AppConfig::default(),
        );
        assert!(got.recursive);

        let got = options(
            &["cli", "preview", "--input", ".", "--recursive", "--no-recursive"],
            &AppConfig::default(),
        );
        assert!(!got.recursive);
    }
}
