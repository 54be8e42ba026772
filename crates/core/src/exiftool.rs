use crate::error::VariableError;
use crate::metadata::{MetadataMap, MetadataProvider};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

pub const DEFAULT_EXIFTOOL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ExifToolProvider {
    program: PathBuf,
    timeout: Duration,
}

impl Default for ExifToolProvider {
    fn default() -> Self {
        Self::new("exiftool", DEFAULT_EXIFTOOL_TIMEOUT)
    }
}

impl ExifToolProvider {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn unavailable(&self, reason: impl Into<String>) -> VariableError {
        VariableError::ToolUnavailable {
            tool: self.program.display().to_string(),
            reason: reason.into(),
        }
    }

    fn run(&self, path: &Path) -> Result<Vec<u8>, VariableError> {
        debug!(program = %self.program.display(), path = %path.display(), "running exiftool");
        let mut child = Command::new(&self.program)
            .arg("-json")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| self.unavailable(err.to_string()))?;

        // stdout is read while waiting; a full pipe would otherwise stall the child.
        let stdout = child.stdout.take().map(drain);

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(self.unavailable(format!(
                    "{}秒以内に終了しませんでした",
                    self.timeout.as_secs_f32()
                )));
            }
            Err(err) => return Err(self.unavailable(err.to_string())),
        };

        let output = stdout.and_then(|h| h.join().ok()).unwrap_or_default();
        if !status.success() && output.is_empty() {
            return Err(self.unavailable(status.to_string()));
        }
        Ok(output)
    }
}

impl MetadataProvider for ExifToolProvider {
    fn extract_fields(&self, path: &Path) -> Result<MetadataMap, VariableError> {
        let output = self.run(path)?;
        parse_exiftool_json(&output).map_err(|reason| self.unavailable(reason))
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

pub(crate) fn parse_exiftool_json(output: &[u8]) -> Result<MetadataMap, String> {
    let parsed: Value =
        serde_json::from_slice(output).map_err(|err| format!("JSONを解析できません: {err}"))?;
    let object = match parsed {
        Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| "JSON出力が空です".to_string())?,
        other => other,
    };
    let Value::Object(fields) = object else {
        return Err("JSON出力がオブジェクトではありません".to_string());
    };

    Ok(fields
        .into_iter()
        .filter_map(|(key, value)| value_to_string(value).map(|v| (key, v)))
        .collect())
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(value_to_string)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_first_object_of_array() {
        let json = br#"[{"SourceFile":"proraw.dng","FOV":"69.4 deg","ISO":50,"ImageWidth":4032,"Flash":null,"Keywords":["a","b"]}]"#;
        let map = parse_exiftool_json(json).expect("must parse");
        assert_eq!(map.get("FOV"), Some("69.4 deg"));
        assert_eq!(map.get("ISO"), Some("50"));
        assert_eq!(map.get("ImageWidth"), Some("4032"));
        assert_eq!(map.get("Keywords"), Some("a, b"));
        assert_eq!(map.get("Flash"), None);
    }

    #[test]
    fn rejects_empty_output() {
        assert!(parse_exiftool_json(b"[]").is_err());
        assert!(parse_exiftool_json(b"").is_err());
    }

    #[test]
    fn missing_program_is_tool_unavailable() {
        let provider = ExifToolProvider::new(
            "fbatch-renamer-no-such-exiftool",
            Duration::from_secs(1),
        );
        let err = provider
            .extract_fields(Path::new("photo.jpg"))
            .expect_err("must fail");
        assert!(matches!(err, VariableError::ToolUnavailable { .. }));
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-exiftool");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).expect("write script");
        let mut perms = std::fs::metadata(&script).expect("stat").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).expect("chmod");
        script
    }

    #[cfg(unix)]
    #[test]
    fn reads_json_from_finished_program() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = script(
            dir.path(),
            r#"echo '[{"SourceFile":"photo.jpg","ImageWidth":4032}]'"#,
        );
        let provider = ExifToolProvider::new(&script, Duration::from_secs(5));
        let map = provider
            .extract_fields(Path::new("photo.jpg"))
            .expect("fields");
        assert_eq!(map.get("ImageWidth"), Some("4032"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_without_output_is_tool_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = script(dir.path(), "exit 3");
        let provider = ExifToolProvider::new(&script, Duration::from_secs(5));
        let err = provider
            .extract_fields(Path::new("photo.jpg"))
            .expect_err("must fail");
        assert!(matches!(err, VariableError::ToolUnavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn slow_program_times_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = script(dir.path(), "sleep 5");

        let provider = ExifToolProvider::new(&script, Duration::from_millis(200));
        let started = std::time::Instant::now();
        let err = provider
            .extract_fields(Path::new("photo.jpg"))
            .expect_err("must time out");
        assert!(matches!(err, VariableError::ToolUnavailable { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
