use crate::metadata::MetadataSource;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VariableError {
    #[error("書式が不正です: {token} ({reason})")]
    Format { token: String, reason: String },
    #[error("{from} に項目がありません: {field}")]
    MissingField { from: MetadataSource, field: String },
    #[error("外部ツールを利用できません: {tool} ({reason})")]
    ToolUnavailable { tool: String, reason: String },
    #[error("未対応トークンです: {{{{{0}}}}}")]
    UnsupportedToken(String),
    #[error("ファイルを読めませんでした: {} ({message})", .path.display())]
    Io { path: PathBuf, message: String },
    #[error("メタデータを解析できませんでした: {} ({message})", .path.display())]
    Metadata { path: PathBuf, message: String },
}

impl VariableError {
    pub fn format(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            token: token.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(from: MetadataSource, field: impl Into<String>) -> Self {
        Self::MissingField {
            from,
            field: field.into(),
        }
    }

    pub fn io(path: &Path, err: impl Display) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn metadata(path: &Path, err: impl Display) -> Self {
        Self::Metadata {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}
