use crate::metadata::Providers;
use crate::resolver::{BatchOutcome, FileEntry, VariableResolver};
use crate::template::parse_template;
use crate::DEFAULT_TEMPLATE;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub input: PathBuf,
    pub recursive: bool,
    pub include_hidden: bool,
    pub template: String,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            recursive: false,
            include_hidden: false,
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreviewStats {
    pub scanned_files: usize,
    pub skipped_hidden: usize,
    pub resolved: usize,
    pub failed: usize,
    pub unchanged: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenamePreview {
    pub template: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
    pub stats: PreviewStats,
}

impl RenamePreview {
    pub fn has_failures(&self) -> bool {
        !self.outcome.failures.is_empty()
    }
}

pub fn generate_preview(options: &PreviewOptions, providers: Providers) -> Result<RenamePreview> {
    if !options.input.is_dir() {
        anyhow::bail!("入力フォルダが存在しません: {}", options.input.display());
    }

    let template = parse_template(&options.template)
        .with_context(|| format!("テンプレートを解釈できません: {}", options.template))?;

    let mut stats = PreviewStats::default();
    let files = collect_files(
        &options.input,
        options.recursive,
        options.include_hidden,
        &mut stats,
    )?;
    debug!(count = files.len(), input = %options.input.display(), "collected files");

    let mut resolver = VariableResolver::new(template, providers);
    let outcome = resolver.resolve_batch(&files);

    stats.resolved = outcome.changes.len();
    stats.failed = outcome.failures.len();
    stats.unchanged = outcome
        .changes
        .iter()
        .filter(|change| change.source == change.target)
        .count();

    Ok(RenamePreview {
        template: options.template.clone(),
        outcome,
        stats,
    })
}

pub fn collect_files(
    root: &Path,
    recursive: bool,
    include_hidden: bool,
    stats: &mut PreviewStats,
) -> Result<Vec<FileEntry>> {
    let mut out = Vec::new();

    if recursive {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("フォルダ走査に失敗しました: {}", root.display()))?;
            let path = entry.path();
            if entry.file_type().is_dir() {
                continue;
            }
            stats.scanned_files += 1;
            if is_hidden(path) && !include_hidden {
                stats.skipped_hidden += 1;
                continue;
            }
            out.push(FileEntry::new(path, root));
        }
    } else {
        for entry in fs::read_dir(root)
            .with_context(|| format!("フォルダを読めませんでした: {}", root.display()))?
        {
            let entry =
                entry.with_context(|| format!("エントリ読み取り失敗: {}", root.display()))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            stats.scanned_files += 1;
            if is_hidden(&path) && !include_hidden {
                stats.skipped_hidden += 1;
                continue;
            }
            out.push(FileEntry::new(path, root));
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
    }

    Ok(out)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
