use crate::date::{DateScope, FileTimes};
use crate::error::VariableError;
use crate::hash::{hash_file, HashAlgorithm};
use crate::metadata::{MetadataMap, MetadataSource, Providers};
use crate::template::{Template, Token};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileContext {
    base_dir: PathBuf,
    source: String,
    index: usize,
    match_text: Option<String>,
    times: Option<Result<FileTimes, VariableError>>,
    metadata: HashMap<MetadataSource, Result<MetadataMap, VariableError>>,
    digests: HashMap<HashAlgorithm, Result<String, VariableError>>,
}

impl FileContext {
    pub fn new(base_dir: impl Into<PathBuf>, source: impl Into<String>, index: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            source: source.into(),
            index,
            match_text: None,
            times: None,
            metadata: HashMap::new(),
            digests: HashMap::new(),
        }
    }

    pub fn from_path(path: &Path, index: usize) -> Self {
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let source = path
            .file_name()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::new(base_dir, source, index)
    }

    /// Text that `tr.*` tokens operate on, e.g. the portion of the name a
    /// find pattern matched. Defaults to the whole file name.
    pub fn with_match_text(mut self, text: impl Into<String>) -> Self {
        self.match_text = Some(text.into());
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> PathBuf {
        self.base_dir.join(&self.source)
    }

    pub fn match_text(&self) -> &str {
        self.match_text.as_deref().unwrap_or(&self.source)
    }

    pub fn stem(&self) -> &str {
        Path::new(&self.source)
            .file_stem()
            .and_then(|v| v.to_str())
            .unwrap_or(&self.source)
    }

    pub fn extension(&self) -> String {
        Path::new(&self.source)
            .extension()
            .map(|v| format!(".{}", v.to_string_lossy()))
            .unwrap_or_default()
    }

    pub fn parent_name(&self) -> Result<String, VariableError> {
        if let Some(name) = self.base_dir.file_name() {
            return Ok(name.to_string_lossy().to_string());
        }
        let dir = if self.base_dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            self.base_dir.as_path()
        };
        let canonical = fs::canonicalize(dir).map_err(|err| VariableError::io(dir, err))?;
        canonical
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| VariableError::io(&canonical, "親ディレクトリ名を取得できません"))
    }

    pub fn times(&mut self) -> Result<&FileTimes, VariableError> {
        let path = self.path();
        self.times
            .get_or_insert_with(|| FileTimes::read(&path))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn metadata(
        &mut self,
        source: MetadataSource,
        providers: &Providers,
    ) -> Result<&MetadataMap, VariableError> {
        let path = self.path();
        self.metadata
            .entry(source)
            .or_insert_with(|| providers.for_source(source).extract_fields(&path))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn digest(&mut self, algorithm: HashAlgorithm) -> Result<&str, VariableError> {
        let path = self.path();
        self.digests
            .entry(algorithm)
            .or_insert_with(|| hash_file(&path, algorithm))
            .as_ref()
            .map(String::as_str)
            .map_err(Clone::clone)
    }

    pub fn prefetch(&mut self, template: &Template, providers: &Providers) {
        for m in template.tokens() {
            let _ = match &m.token {
                Token::Hash(algorithm) => self.digest(*algorithm).map(|_| ()),
                Token::Exif(_) => self.metadata(MetadataSource::Exif, providers).map(|_| ()),
                Token::Id3(_) => self.metadata(MetadataSource::Id3, providers).map(|_| ()),
                Token::ExifTool(_) => self
                    .metadata(MetadataSource::ExifTool, providers)
                    .map(|_| ()),
                Token::Date {
                    scope: DateScope::File(_),
                    ..
                } => self.times().map(|_| ()),
                _ => Ok(()),
            };
        }
    }

    pub fn is_cached(&self, source: MetadataSource) -> bool {
        self.metadata.contains_key(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MetadataProvider, StaticProvider};
    use crate::template::parse_template;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    struct CountingProvider(Arc<AtomicUsize>);

    impl MetadataProvider for CountingProvider {
        fn extract_fields(&self, _path: &Path) -> Result<MetadataMap, VariableError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok([("title", "Song")].into_iter().collect())
        }
    }

    #[test]
    fn splits_file_name_parts() {
        let ctx = FileContext::new("/photos/trip", "IMG_0001.jpeg", 0);
        assert_eq!(ctx.stem(), "IMG_0001");
        assert_eq!(ctx.extension(), ".jpeg");
        assert_eq!(ctx.parent_name().expect("parent"), "trip");
        assert_eq!(ctx.match_text(), "IMG_0001.jpeg");
        assert_eq!(ctx.path(), PathBuf::from("/photos/trip/IMG_0001.jpeg"));
    }

    #[test]
    fn file_without_extension_has_empty_extension() {
        let ctx = FileContext::new("/tmp", "Makefile", 0);
        assert_eq!(ctx.stem(), "Makefile");
        assert_eq!(ctx.extension(), "");
    }

    #[test]
    fn from_path_splits_base_dir() {
        let ctx = FileContext::from_path(Path::new("/a/b/c.md"), 2);
        assert_eq!(ctx.base_dir(), Path::new("/a/b"));
        assert_eq!(ctx.source(), "c.md");
        assert_eq!(ctx.index(), 2);
    }

    #[test]
    fn metadata_is_fetched_once_per_file() {
        let calls = Arc::new(AtomicUsize::new(0));
        let providers = Providers::default().with_id3(CountingProvider(calls.clone()));
        let mut ctx = FileContext::new("/music", "a.mp3", 0);
        for _ in 0..3 {
            let map = ctx
                .metadata(MetadataSource::Id3, &providers)
                .expect("fields");
            assert_eq!(map.get("title"), Some("Song"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn prefetch_only_touches_needed_sources() {
        let providers = Providers::default()
            .with_exif(StaticProvider::default())
            .with_id3(StaticProvider::default());
        let template = parse_template("{{exif.make}}_{{f}}").expect("must parse");
        let mut ctx = FileContext::new("/photos", "a.jpg", 0);
        ctx.prefetch(&template, &providers);
        assert!(ctx.is_cached(MetadataSource::Exif));
        assert!(!ctx.is_cached(MetadataSource::Id3));
    }

    #[test]
    fn digest_errors_are_cached() {
        let dir = tempdir().expect("tempdir");
        let mut ctx = FileContext::new(dir.path(), "missing.bin", 0);
        let first = ctx.digest(HashAlgorithm::Md5).expect_err("must fail");
        fs::write(dir.path().join("missing.bin"), b"late").expect("write");
        let second = ctx.digest(HashAlgorithm::Md5).expect_err("still cached");
        assert_eq!(first, second);
    }
}
