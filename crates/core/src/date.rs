use crate::error::VariableError;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileTime {
    Modified,
    Accessed,
    Changed,
    Birth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateScope {
    File(FileTime),
    Now,
}

impl DateScope {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mtime" => Some(Self::File(FileTime::Modified)),
            "atime" => Some(Self::File(FileTime::Accessed)),
            "ctime" => Some(Self::File(FileTime::Changed)),
            "btime" => Some(Self::File(FileTime::Birth)),
            "now" => Some(Self::Now),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::File(FileTime::Modified) => "mtime",
            Self::File(FileTime::Accessed) => "atime",
            Self::File(FileTime::Changed) => "ctime",
            Self::File(FileTime::Birth) => "btime",
            Self::Now => "now",
        }
    }
}

const STANDARD_TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("DDDD", "%A"),
    ("DDD", "%a"),
    ("DD", "%d"),
    ("D", "%-d"),
    ("H", "%H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("m", "%-M"),
    ("ss", "%S"),
    ("s", "%-S"),
    ("A", "%p"),
    ("a", "%P"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormatRegistry {
    patterns: BTreeMap<String, String>,
}

impl Default for DateFormatRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl DateFormatRegistry {
    pub fn standard() -> Self {
        Self {
            patterns: STANDARD_TOKENS
                .iter()
                .map(|(token, pattern)| (token.to_string(), pattern.to_string()))
                .collect(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.patterns.insert(token.into(), pattern.into());
        self
    }

    pub fn contains(&self, token: &str) -> bool {
        self.patterns.contains_key(token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }

    pub fn render(&self, token: &str, at: &DateTime<Local>) -> Result<String, VariableError> {
        let pattern = self
            .patterns
            .get(token)
            .ok_or_else(|| VariableError::format(token, "未対応の日付トークンです"))?;
        let mut out = String::new();
        write!(out, "{}", at.format(pattern))
            .map_err(|_| VariableError::format(token, format!("日付書式が不正です: {pattern}")))?;
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimes {
    pub modified: DateTime<Local>,
    pub accessed: DateTime<Local>,
    pub changed: Option<DateTime<Local>>,
    pub born: Option<DateTime<Local>>,
}

impl FileTimes {
    pub fn read(path: &Path) -> Result<Self, VariableError> {
        let meta = fs::metadata(path).map_err(|err| VariableError::io(path, err))?;
        let modified: DateTime<Local> = meta
            .modified()
            .map(DateTime::from)
            .map_err(|err| VariableError::io(path, err))?;
        let accessed = meta.accessed().map(DateTime::from).unwrap_or(modified);

        Ok(Self {
            modified,
            accessed,
            changed: change_time(&meta),
            born: meta.created().ok().map(DateTime::from),
        })
    }

    pub fn get(&self, time: FileTime) -> DateTime<Local> {
        match time {
            FileTime::Modified => self.modified,
            FileTime::Accessed => self.accessed,
            FileTime::Changed => self.changed.unwrap_or(self.modified),
            FileTime::Birth => self.born.unwrap_or(self.modified),
        }
    }
}

#[cfg(unix)]
fn change_time(meta: &fs::Metadata) -> Option<DateTime<Local>> {
    use std::os::unix::fs::MetadataExt;

    let nanos = u32::try_from(meta.ctime_nsec()).ok()?;
    DateTime::from_timestamp(meta.ctime(), nanos).map(|utc| utc.with_timezone(&Local))
}

#[cfg(not(unix))]
fn change_time(_meta: &fs::Metadata) -> Option<DateTime<Local>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike};
    use std::fs::File;
    use std::time::SystemTime;
    use tempfile::tempdir;

    fn sample() -> DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(2021, 3, 7)
            .and_then(|d| d.and_hms_opt(15, 4, 5))
            .expect("valid date");
        Local
            .from_local_datetime(&naive)
            .earliest()
            .expect("representable")
    }

    #[test]
    fn scope_names_parse_back() {
        for name in ["mtime", "atime", "ctime", "btime", "now"] {
            let scope = DateScope::parse(name).expect("known scope");
            assert_eq!(scope.as_str(), name);
        }
        assert_eq!(DateScope::parse("now"), Some(DateScope::Now));
        assert_eq!(
            DateScope::parse("ctime"),
            Some(DateScope::File(FileTime::Changed))
        );
        assert_eq!(DateScope::parse("mtim"), None);
    }

    #[test]
    fn renders_standard_tokens() {
        let registry = DateFormatRegistry::standard();
        let at = sample();
        let render = |token: &str| registry.render(token, &at).expect("must render");
        assert_eq!(render("YYYY"), "2021");
        assert_eq!(render("YY"), "21");
        assert_eq!(render("MMMM"), "March");
        assert_eq!(render("MMM"), "Mar");
        assert_eq!(render("MM"), "03");
        assert_eq!(render("M"), "3");
        assert_eq!(render("DDDD"), "Sunday");
        assert_eq!(render("DDD"), "Sun");
        assert_eq!(render("DD"), "07");
        assert_eq!(render("D"), "7");
        assert_eq!(render("H"), "15");
        assert_eq!(render("hh"), "03");
        assert_eq!(render("h"), "3");
        assert_eq!(render("mm"), "04");
        assert_eq!(render("m"), "4");
        assert_eq!(render("ss"), "05");
        assert_eq!(render("s"), "5");
        assert_eq!(render("A"), "PM");
        assert_eq!(render("a"), "pm");
    }

    #[test]
    fn rendered_fields_parse_back() {
        let registry = DateFormatRegistry::standard();
        let at = sample();
        let joined = ["YYYY", "MM", "DD", "H", "mm", "ss"]
            .iter()
            .map(|token| registry.render(token, &at).expect("must render"))
            .collect::<Vec<_>>()
            .join(" ");
        let parsed =
            NaiveDateTime::parse_from_str(&joined, "%Y %m %d %H %M %S").expect("must parse");
        assert_eq!(parsed, at.naive_local());
    }

    #[test]
    fn registry_can_be_extended_without_touching_the_standard_one() {
        let extended = DateFormatRegistry::standard().with_token("DOY", "%j");
        assert!(extended.contains("DOY"));
        assert!(!DateFormatRegistry::standard().contains("DOY"));
        assert_eq!(extended.render("DOY", &sample()).expect("must render"), "066");
    }

    #[test]
    fn unknown_token_is_a_format_error() {
        let err = DateFormatRegistry::standard()
            .render("QQ", &sample())
            .expect_err("must fail");
        assert!(matches!(err, VariableError::Format { .. }));
    }

    #[test]
    fn reads_modify_time_and_falls_back_for_missing_fields() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("a.txt");
        let file = File::create(&path).expect("create");
        let mtime = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_600_000_000);
        file.set_modified(mtime).expect("set mtime");

        let mut times = FileTimes::read(&path).expect("must read");
        assert_eq!(times.get(FileTime::Modified), DateTime::<Local>::from(mtime));
        times.changed = None;
        times.born = None;
        assert_eq!(times.get(FileTime::Changed), times.modified);
        assert_eq!(times.get(FileTime::Birth), times.modified);
        assert_eq!(times.get(FileTime::Modified).year(), 2020);
        assert!(times.get(FileTime::Modified).hour() < 24);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = FileTimes::read(Path::new("/definitely/not/here")).expect_err("must fail");
        assert!(matches!(err, VariableError::Io { .. }));
    }
}
