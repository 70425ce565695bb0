use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ReplaceError;
use crate::replace::{apply_exact_replace, apply_global_replace};

// Edit operations as the generation side hands them over. The container
// format that carries them over the wire is someone else's concern; by the
// time they reach this crate they are plain data.
#[derive(Debug, Deserialize)]
pub struct EditPlan {
    pub edits: Vec<EditOp>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum EditOp {
    ExactReplace {
        path: PathBuf,
        #[serde(deserialize_with = "blank_trimmed")]
        old_content: String,
        #[serde(deserialize_with = "blank_trimmed")]
        new_content: String,
    },
    GlobalReplace {
        path: PathBuf,
        #[serde(deserialize_with = "blank_trimmed")]
        old_content: String,
        #[serde(deserialize_with = "blank_trimmed")]
        new_content: String,
    },
    Create {
        path: PathBuf,
        content: String,
    },
}

impl EditOp {
    pub fn path(&self) -> &Path {
        match self {
            EditOp::ExactReplace { path, .. }
            | EditOp::GlobalReplace { path, .. }
            | EditOp::Create { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EditOp::ExactReplace { .. } => "exact-replace",
            EditOp::GlobalReplace { .. } => "global-replace",
            EditOp::Create { .. } => "create",
        }
    }
}

// Generators pad replace content with blank lines around the payload;
// strip those on the way in so they never reach the matcher.
fn blank_trimmed<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(trim_blank_lines(&raw))
}

pub fn trim_blank_lines(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let first = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(lines.len());
    let last = lines.iter().rposition(|line| !line.trim().is_empty());
    match last {
        Some(last) => lines[first..=last].join("\n"),
        None => String::new(),
    }
}

pub fn load_plan(path: &Path) -> Result<EditPlan> {
    let data = fs::read(path).with_context(|| format!("reading plan {}", path.display()))?;
    if path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
    {
        Ok(serde_json::from_slice(&data)?)
    } else {
        Ok(serde_yaml::from_slice(&data)?)
    }
}

// Groups operations per target file, preserving the plan's order both
// across files (first appearance) and within each file.
pub fn group_by_path(edits: &[EditOp]) -> Vec<(&Path, Vec<&EditOp>)> {
    let mut groups: Vec<(&Path, Vec<&EditOp>)> = Vec::new();
    for op in edits {
        match groups.iter_mut().find(|(path, _)| *path == op.path()) {
            Some((_, ops)) => ops.push(op),
            None => groups.push((op.path(), vec![op])),
        }
    }
    groups
}

// Runs one file's operations strictly in order, each against the text the
// previous one produced: a replacement of different length shifts every
// later offset, so re-running against the original would patch stale
// coordinates. The first failure aborts the file's remaining operations.
pub fn apply_ops(
    file: &str,
    existing: Option<&str>,
    ops: &[&EditOp],
) -> std::result::Result<String, ReplaceError> {
    let mut text = existing.unwrap_or_default().to_string();
    let mut exists = existing.is_some();

    for op in ops {
        text = match op {
            EditOp::ExactReplace {
                old_content,
                new_content,
                ..
            } => apply_exact_replace(file, &text, old_content, new_content)?,
            EditOp::GlobalReplace {
                old_content,
                new_content,
                ..
            } => apply_global_replace(file, &text, old_content, new_content)?,
            EditOp::Create { content, .. } => {
                if exists {
                    // Creating over an existing file appends instead of
                    // clobbering what earlier operations built up.
                    format!("{text}\n{content}")
                } else {
                    content.clone()
                }
            }
        };
        exists = true;
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(path: &str, old: &str, new: &str) -> EditOp {
        EditOp::GlobalReplace {
            path: PathBuf::from(path),
            old_content: old.to_string(),
            new_content: new.to_string(),
        }
    }

    #[test]
    fn plan_parses_from_json() {
        let json = r#"{
            "edits": [
                {"op": "global-replace", "path": "src/a.rs", "old_content": "\nfoo()\n", "new_content": "bar()"},
                {"op": "create", "path": "src/b.rs", "content": "fn new() {}\n"}
            ]
        }"#;
        let plan: EditPlan = serde_json::from_str(json).expect("plan");
        assert_eq!(plan.edits.len(), 2);
        assert_eq!(plan.edits[0].kind(), "global-replace");
        // blank padding around replace content is stripped on load
        if let EditOp::GlobalReplace { old_content, .. } = &plan.edits[0] {
            assert_eq!(old_content, "foo()");
        } else {
            panic!("expected global-replace");
        }
        assert_eq!(plan.edits[1].path(), Path::new("src/b.rs"));
    }

    #[test]
    fn plan_parses_from_yaml() {
        let yaml = "edits:\n  - op: exact-replace\n    path: a.txt\n    old_content: alpha\n    new_content: beta\n";
        let plan: EditPlan = serde_yaml::from_str(yaml).expect("plan");
        assert_eq!(plan.edits.len(), 1);
        assert_eq!(plan.edits[0].kind(), "exact-replace");
    }

    #[test]
    fn trim_blank_lines_keeps_inner_blanks() {
        assert_eq!(trim_blank_lines("\n  \na\n\nb\n   \n"), "a\n\nb");
        assert_eq!(trim_blank_lines("  \n \n"), "");
        assert_eq!(trim_blank_lines("plain"), "plain");
    }

    #[test]
    fn grouping_preserves_first_appearance_order() {
        let edits = vec![
            global("b.rs", "x", "y"),
            global("a.rs", "x", "y"),
            global("b.rs", "y", "z"),
        ];
        let groups = group_by_path(&edits);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, Path::new("b.rs"));
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, Path::new("a.rs"));
    }

    #[test]
    fn operations_see_the_evolving_text() {
        let first = global("a.rs", "bravo();", "delta();");
        let second = global("a.rs", "delta();", "echo();");
        let out = apply_ops(
            "a.rs",
            Some("alpha();\nbravo();\ncharlie();\n"),
            &[&first, &second],
        )
        .expect("apply");
        assert_eq!(out, "alpha();\necho();\ncharlie();\n");
    }

    #[test]
    fn first_failure_aborts_remaining_ops() {
        let bad = global("a.rs", "absent from this file entirely", "x");
        let good = global("a.rs", "bravo();", "delta();");
        let err = apply_ops(
            "a.rs",
            Some("alpha();\nbravo();\ncharlie();\n"),
            &[&bad, &good],
        )
        .unwrap_err();
        assert!(matches!(err, ReplaceError::NoMatchFound { .. }));
    }

    #[test]
    fn create_writes_fresh_and_appends_to_existing() {
        let create = EditOp::Create {
            path: PathBuf::from("a.rs"),
            content: "tail()".to_string(),
        };
        assert_eq!(apply_ops("a.rs", None, &[&create]).expect("fresh"), "tail()");
        assert_eq!(
            apply_ops("a.rs", Some("head()"), &[&create]).expect("append"),
            "head()\ntail()"
        );
    }

    #[test]
    fn replace_against_missing_file_fails_cleanly() {
        let op = global("ghost.rs", "anything at all here", "x");
        let err = apply_ops("ghost.rs", None, &[&op]).unwrap_err();
        assert!(matches!(err, ReplaceError::NoMatchFound { .. }));
    }
}
