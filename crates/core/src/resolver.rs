use crate::context::FileContext;
use crate::date::{DateFormatRegistry, DateScope};
use crate::error::VariableError;
use crate::exif_reader::parse_exif_datetime;
use crate::metadata::{exif_keys, ExifField, ExifToken, MetadataSource, Providers};
use crate::numbering::{NumberingState, NumberingStep};
use crate::template::{FilePart, Template, TemplatePart, Token};
use chrono::{DateTime, Local};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub base_dir: PathBuf,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            base_dir: base_dir.into(),
        }
    }

    fn context(&self, index: usize) -> FileContext {
        let source = self
            .path
            .file_name()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default();
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| self.base_dir.clone());
        FileContext::new(dir, source, index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub base_dir: PathBuf,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub base_dir: PathBuf,
    pub source: String,
    pub reason: String,
    #[serde(skip)]
    pub error: VariableError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub changes: Vec<Change>,
    pub failures: Vec<FileFailure>,
}

#[derive(Debug)]
pub struct VariableResolver {
    template: Template,
    providers: Providers,
    registry: DateFormatRegistry,
    numbering: NumberingState,
    started_at: DateTime<Local>,
}

impl VariableResolver {
    pub fn new(template: Template, providers: Providers) -> Self {
        Self {
            template,
            providers,
            registry: DateFormatRegistry::standard(),
            numbering: NumberingState::new(),
            started_at: Local::now(),
        }
    }

    pub fn with_registry(mut self, registry: DateFormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_start_time(mut self, started_at: DateTime<Local>) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn numbering(&self) -> &NumberingState {
        &self.numbering
    }

    /// Resolves every token for one file. Counter advances are committed only
    /// when the whole name resolved.
    pub fn resolve(&mut self, ctx: &mut FileContext) -> Result<String, VariableError> {
        let mut rng = rand::thread_rng();
        let mut pending = Vec::<NumberingStep>::new();
        let mut out = String::with_capacity(self.template.as_str().len());

        for part in self.template.parts() {
            match part {
                TemplatePart::Literal(text) => out.push_str(text),
                TemplatePart::Token(m) => {
                    let value = self.resolve_token(&m.token, ctx, &mut pending, &mut rng)?;
                    out.push_str(&value);
                }
            }
        }

        self.numbering.commit(pending);
        debug!(source = ctx.source(), target = %out, "resolved");
        Ok(out)
    }

    fn resolve_token<R: Rng + ?Sized>(
        &self,
        token: &Token,
        ctx: &mut FileContext,
        pending: &mut Vec<NumberingStep>,
        rng: &mut R,
    ) -> Result<String, VariableError> {
        match token {
            Token::Index(spec) => {
                let signature = spec.signature();
                let value = match pending.iter().find(|s| s.signature == signature) {
                    Some(step) => step.value,
                    None => {
                        let step = self.numbering.peek(spec)?;
                        let value = step.value;
                        pending.push(step);
                        value
                    }
                };
                Ok(spec.render(value))
            }
            Token::Date { scope, format } => {
                let at = match scope {
                    DateScope::Now => self.started_at,
                    DateScope::File(time) => ctx.times()?.get(*time),
                };
                self.registry.render(format, &at)
            }
            Token::Exif(exif) => {
                let map = ctx.metadata(MetadataSource::Exif, &self.providers)?;
                let require = |key: &str| map.require(MetadataSource::Exif, key);
                match exif {
                    ExifToken::Field(ExifField::Dimensions) => Ok(format!(
                        "{}x{}",
                        require(exif_keys::WIDTH)?,
                        require(exif_keys::HEIGHT)?
                    )),
                    ExifToken::Field(field) => {
                        let key = field.key().unwrap_or(field.alias());
                        require(key).map(str::to_string)
                    }
                    ExifToken::DateTime(format) => {
                        let raw = require(exif_keys::DATE_TIME_ORIGINAL)?;
                        let at = parse_exif_datetime(raw).ok_or_else(|| {
                            VariableError::format(raw, "撮影日時を解釈できません")
                        })?;
                        self.registry.render(format, &at)
                    }
                }
            }
            Token::Id3(field) => ctx
                .metadata(MetadataSource::Id3, &self.providers)?
                .require(MetadataSource::Id3, field.key())
                .map(str::to_string),
            Token::ExifTool(name) => ctx
                .metadata(MetadataSource::ExifTool, &self.providers)?
                .require(MetadataSource::ExifTool, name)
                .map(str::to_string),
            Token::Hash(algorithm) => ctx.digest(*algorithm).map(str::to_string),
            Token::Random(spec) => Ok(spec.generate(rng)),
            Token::Transform(transform) => Ok(transform.apply(ctx.match_text())),
            Token::FilePart(FilePart::Parent) => ctx.parent_name(),
            Token::FilePart(FilePart::Stem) => Ok(ctx.stem().to_string()),
            Token::FilePart(FilePart::Extension) => Ok(ctx.extension()),
        }
    }

    pub fn resolve_batch(&mut self, files: &[FileEntry]) -> BatchOutcome {
        let mut contexts: Vec<FileContext> = files
            .iter()
            .enumerate()
            .map(|(index, entry)| entry.context(index))
            .collect();
        self.resolve_contexts(&mut contexts)
    }

    pub fn resolve_contexts(&mut self, contexts: &mut [FileContext]) -> BatchOutcome {
        let template = &self.template;
        let providers = &self.providers;
        contexts
            .par_iter_mut()
            .for_each(|ctx| ctx.prefetch(template, providers));

        let mut outcome = BatchOutcome::default();
        for ctx in contexts.iter_mut() {
            match self.resolve(ctx) {
                Ok(target) => outcome.changes.push(Change {
                    base_dir: ctx.base_dir().to_path_buf(),
                    source: ctx.source().to_string(),
                    target,
                }),
                Err(error) => {
                    warn!(source = ctx.source(), %error, "failed to resolve");
                    outcome.failures.push(FileFailure {
                        base_dir: ctx.base_dir().to_path_buf(),
                        source: ctx.source().to_string(),
                        reason: error.to_string(),
                        error,
                    });
                }
            }
        }
        outcome
    }
}
