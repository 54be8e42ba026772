use crate::date::{DateFormatRegistry, DateScope};
use crate::error::VariableError;
use crate::hash::HashAlgorithm;
use crate::metadata::{ExifField, ExifToken, Id3Field};
use crate::numbering::{find_index, parse_index_spec, IndexSpec};
use crate::random::{parse_random_spec, RandomSpec};
use crate::transform::Transform;
use serde::{Deserialize, Serialize};
use std::ops::Range;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TokenKind {
    Index,
    Date,
    Exif,
    ExifTool,
    Id3,
    Hash,
    Random,
    Transform,
    FilePart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilePart {
    Parent,
    Stem,
    Extension,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Index(IndexSpec),
    Date { scope: DateScope, format: String },
    Exif(ExifToken),
    ExifTool(String),
    Id3(Id3Field),
    Hash(HashAlgorithm),
    Random(RandomSpec),
    Transform(Transform),
    FilePart(FilePart),
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Index(_) => TokenKind::Index,
            Self::Date { .. } => TokenKind::Date,
            Self::Exif(_) => TokenKind::Exif,
            Self::ExifTool(_) => TokenKind::ExifTool,
            Self::Id3(_) => TokenKind::Id3,
            Self::Hash(_) => TokenKind::Hash,
            Self::Random(_) => TokenKind::Random,
            Self::Transform(_) => TokenKind::Transform,
            Self::FilePart(_) => TokenKind::FilePart,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    pub raw: String,
    pub span: Range<usize>,
    pub token: Token,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Token(TokenMatch),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    parts: Vec<TemplatePart>,
}

impl Template {
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TokenMatch> {
        self.parts.iter().filter_map(|part| match part {
            TemplatePart::Token(m) => Some(m),
            TemplatePart::Literal(_) => None,
        })
    }

    pub fn matches_of(&self, kind: TokenKind) -> Vec<&TokenMatch> {
        self.tokens().filter(|m| m.token.kind() == kind).collect()
    }

    pub fn contains_kind(&self, kind: TokenKind) -> bool {
        self.tokens().any(|m| m.token.kind() == kind)
    }

    pub fn kinds(&self) -> Vec<TokenKind> {
        let mut kinds: Vec<TokenKind> = self.tokens().map(|m| m.token.kind()).collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }
}

pub fn validate_template(input: &str) -> Result<(), VariableError> {
    parse_template(input).map(|_| ())
}

pub fn parse_template(input: &str) -> Result<Template, VariableError> {
    parse_template_with(input, &DateFormatRegistry::standard())
}

pub fn parse_template_with(
    input: &str,
    registry: &DateFormatRegistry,
) -> Result<Template, VariableError> {
    if input.is_empty() {
        return Err(VariableError::format(input, "テンプレートが空です"));
    }

    let mut parts = Vec::new();
    let mut literal_start = 0usize;
    let mut cursor = 0usize;

    while cursor < input.len() {
        let rest = &input[cursor..];
        if rest.starts_with(OPEN) {
            if let Some(close) = rest[OPEN.len()..].find(CLOSE) {
                let content = &rest[OPEN.len()..OPEN.len() + close];
                if !content.contains(OPEN) {
                    let end = cursor + OPEN.len() + close + CLOSE.len();
                    push_literal(&mut parts, input, literal_start..cursor)?;
                    parts.push(TemplatePart::Token(TokenMatch {
                        raw: input[cursor..end].to_string(),
                        span: cursor..end,
                        token: parse_token(content, registry)?,
                    }));
                    cursor = end;
                    literal_start = end;
                    continue;
                }
            }
        }
        cursor += rest.chars().next().map_or(1, char::len_utf8);
    }
    push_literal(&mut parts, input, literal_start..input.len())?;

    Ok(Template {
        source: input.to_string(),
        parts,
    })
}

fn push_literal(
    parts: &mut Vec<TemplatePart>,
    input: &str,
    range: Range<usize>,
) -> Result<(), VariableError> {
    let text = &input[range.clone()];
    let mut from = 0usize;
    while let Some((span, spec)) = find_index(text, from)? {
        if span.start > from {
            parts.push(TemplatePart::Literal(text[from..span.start].to_string()));
        }
        parts.push(TemplatePart::Token(TokenMatch {
            raw: text[span.clone()].to_string(),
            span: range.start + span.start..range.start + span.end,
            token: Token::Index(spec),
        }));
        from = span.end;
    }
    if from < text.len() {
        parts.push(TemplatePart::Literal(text[from..].to_string()));
    }
    Ok(())
}

fn parse_token(content: &str, registry: &DateFormatRegistry) -> Result<Token, VariableError> {
    let unsupported = || VariableError::UnsupportedToken(content.to_string());

    match content {
        "p" => return Ok(Token::FilePart(FilePart::Parent)),
        "f" => return Ok(Token::FilePart(FilePart::Stem)),
        "ext" => return Ok(Token::FilePart(FilePart::Extension)),
        _ => {}
    }

    if let Some(name) = content.strip_prefix("hash.") {
        return HashAlgorithm::parse(name)
            .map(Token::Hash)
            .ok_or_else(unsupported);
    }
    if let Some(name) = content.strip_prefix("tr.") {
        return Transform::parse(name)
            .map(Token::Transform)
            .ok_or_else(unsupported);
    }
    if let Some(name) = content.strip_prefix("xt.") {
        if is_exiftool_key(name) {
            return Ok(Token::ExifTool(name.to_string()));
        }
        return Err(unsupported());
    }
    if let Some(alias) = content.strip_prefix("exif.") {
        if let Some(format) = alias.strip_prefix("dt.") {
            return date_format(content, format, registry)
                .map(|format| Token::Exif(ExifToken::DateTime(format)));
        }
        return ExifField::parse(alias)
            .map(|field| Token::Exif(ExifToken::Field(field)))
            .ok_or_else(unsupported);
    }
    if let Some(alias) = content.strip_prefix("id3.") {
        return Id3Field::parse(alias).map(Token::Id3).ok_or_else(unsupported);
    }
    if let Some((scope, format)) = content.split_once('.') {
        if let Some(scope) = DateScope::parse(scope) {
            return date_format(content, format, registry)
                .map(|format| Token::Date { scope, format });
        }
    }
    if let Some(spec) = parse_random_spec(content) {
        return spec.map(Token::Random);
    }
    if content.contains('%') {
        return parse_index_spec(content).map(Token::Index);
    }

    Err(unsupported())
}

fn date_format(
    content: &str,
    format: &str,
    registry: &DateFormatRegistry,
) -> Result<String, VariableError> {
    if registry.contains(format) {
        Ok(format.to_string())
    } else {
        Err(VariableError::format(content, "未対応の日付トークンです"))
    }
}

fn is_exiftool_key(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':'))
}
