use crate::exiftool::{ExifToolProvider, DEFAULT_EXIFTOOL_TIMEOUT};
use crate::metadata::Providers;
use crate::DEFAULT_TEMPLATE;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub template: String,
    pub recursive_default: bool,
    pub include_hidden_default: bool,
    pub exiftool_path: String,
    pub exiftool_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            recursive_default: false,
            include_hidden_default: false,
            exiftool_path: "exiftool".to_string(),
            exiftool_timeout_secs: DEFAULT_EXIFTOOL_TIMEOUT.as_secs(),
        }
    }
}

impl AppConfig {
    pub fn providers(&self) -> Providers {
        Providers::default().with_exiftool(ExifToolProvider::new(
            &self.exiftool_path,
            Duration::from_secs(self.exiftool_timeout_secs.max(1)),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "kelly", "fbatch-renamer")
        .context("OS標準設定ディレクトリを取得できませんでした")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&app_paths()?.config_path)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("設定ファイルを読めませんでした: {}", path.display()))?;

    let config = toml::from_str::<AppConfig>(&raw).context("設定ファイルのパースに失敗しました")?;
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    save_config_to(config, &app_paths()?.config_path)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| {
            format!("設定ディレクトリを作成できませんでした: {}", dir.display())
        })?;
    }
    let body = toml::to_string_pretty(config).context("設定のシリアライズに失敗しました")?;
    fs::write(path, body)
        .with_context(|| format!("設定ファイルを書き込めませんでした: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let config = load_config_from(&dir.path().join("config.toml")).expect("load");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn saves_and_reloads() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested/config.toml");
        let config = AppConfig {
            template: "{{f}}_%03d{{ext}}".to_string(),
            recursive_default: true,
            exiftool_timeout_secs: 3,
            ..AppConfig::default()
        };
        save_config_to(&config, &path).expect("save");
        assert_eq!(load_config_from(&path).expect("load"), config);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "exiftool_path = \"/opt/bin/exiftool\"\n").expect("write");
        let config = load_config_from(&path).expect("load");
        assert_eq!(config.exiftool_path, "/opt/bin/exiftool");
        assert_eq!(config.template, DEFAULT_TEMPLATE);
    }

    #[test]
    fn broken_file_reports_parse_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "template = [").expect("write");
        assert!(load_config_from(&path).is_err());
    }
}
