use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::ops::EditOp;

pub const DEFAULT_LOG_DIR: &str = ".fuzzedit";
const LOG_FILE: &str = "change_log.jsonl";
const MAX_ENTRIES: usize = 500;

// One line per file outcome: which operations the plan ran against it and
// what happened. `detail` is a line summary for applied changes and the
// error text for failures.
#[derive(Debug, Serialize)]
struct ChangeEntry<'a> {
    timestamp: String,
    path: &'a Path,
    action: &'a str,
    ops: Vec<&'static str>,
    detail: &'a str,
}

pub struct ChangeLog {
    file_path: PathBuf,
}

impl ChangeLog {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("creating log dir {}", dir.display()))?;
        Ok(ChangeLog {
            file_path: dir.join(LOG_FILE),
        })
    }

    pub fn record(&self, path: &Path, action: &str, ops: &[&EditOp], detail: &str) -> Result<()> {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".into());
        let entry = ChangeEntry {
            timestamp,
            path,
            action,
            ops: ops.iter().map(|op| op.kind()).collect(),
            detail,
        };
        let json = serde_json::to_string(&entry)?;
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.file_path)
            .with_context(|| format!("opening {}", self.file_path.display()))?;
        writeln!(file, "{json}")?;
        self.trim_to(MAX_ENTRIES)
    }

    // Keeps only the newest entries so the log never grows unbounded.
    fn trim_to(&self, max_entries: usize) -> Result<()> {
        let data = fs::read_to_string(&self.file_path)
            .with_context(|| format!("reading {}", self.file_path.display()))?;
        let lines: Vec<&str> = data.lines().collect();
        if lines.len() <= max_entries {
            return Ok(());
        }
        let keep = &lines[lines.len() - max_entries..];
        fs::write(&self.file_path, keep.join("\n") + "\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn records_carry_op_kinds_and_detail() {
        let temp = tempdir().expect("temp dir");
        let log = ChangeLog::open(temp.path()).expect("open");
        let op = EditOp::GlobalReplace {
            path: PathBuf::from("src/a.rs"),
            old_content: "x".into(),
            new_content: "y".into(),
        };
        log.record(Path::new("src/a.rs"), "applied", &[&op], "+1 -1 lines")
            .expect("record");
        let data = fs::read_to_string(temp.path().join(LOG_FILE)).expect("read");
        let entry: serde_json::Value = serde_json::from_str(data.trim()).expect("json");
        assert_eq!(entry["path"], "src/a.rs");
        assert_eq!(entry["action"], "applied");
        assert_eq!(entry["ops"][0], "global-replace");
        assert_eq!(entry["detail"], "+1 -1 lines");
    }

    #[test]
    fn log_is_trimmed_to_the_newest_entries() {
        let temp = tempdir().expect("temp dir");
        let log = ChangeLog::open(temp.path()).expect("open");
        let op = EditOp::Create {
            path: PathBuf::from("a.rs"),
            content: String::new(),
        };
        for idx in 0..5 {
            log.record(Path::new("a.rs"), "applied", &[&op], &format!("run {idx}"))
                .expect("record");
        }
        log.trim_to(2).expect("trim");
        let data = fs::read_to_string(temp.path().join(LOG_FILE)).expect("read");
        let lines: Vec<&str> = data.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("run 3"));
        assert!(lines[1].contains("run 4"));
    }
}
